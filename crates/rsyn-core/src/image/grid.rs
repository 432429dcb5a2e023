//! Grid generation over sampling domains.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Generate the full grid of continuous indices for a grid size.
///
/// Returns a tensor of shape `[N, D]` where N is the number of voxels.
/// Rows enumerate voxels in tensor layout order (last dimension fastest),
/// matching the flattening order of `reshape`; columns are index coordinates
/// in spatial axis order `(x, y[, z])`.
pub fn generate_grid<B: Backend, const D: usize>(
    size: [usize; D],
    device: &B::Device,
) -> Tensor<B, 2> {
    let total: usize = size.iter().product();
    let mut data = Vec::with_capacity(total * D);

    let mut counters = [0usize; D];
    for _ in 0..total {
        for axis in 0..D {
            data.push(counters[D - 1 - axis] as f32);
        }
        for dim in (0..D).rev() {
            counters[dim] += 1;
            if counters[dim] < size[dim] {
                break;
            }
            if dim > 0 {
                counters[dim] = 0;
            }
        }
    }

    Tensor::<B, 1>::from_floats(data.as_slice(), device).reshape([total, D])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type Backend = NdArray<f32>;

    #[test]
    fn test_grid_2d_ordering() {
        let device = Default::default();
        // size [Y=2, X=3]
        let grid = generate_grid::<Backend, 2>([2, 3], &device);
        assert_eq!(grid.dims(), [6, 2]);

        let data = grid.into_data();
        let values = data.as_slice::<f32>().unwrap();
        // rows: (x, y) with x fastest
        assert_eq!(&values[0..2], &[0.0, 0.0]);
        assert_eq!(&values[2..4], &[1.0, 0.0]);
        assert_eq!(&values[4..6], &[2.0, 0.0]);
        assert_eq!(&values[6..8], &[0.0, 1.0]);
        assert_eq!(&values[10..12], &[2.0, 1.0]);
    }

    #[test]
    fn test_grid_3d_count() {
        let device = Default::default();
        let grid = generate_grid::<Backend, 3>([2, 3, 4], &device);
        assert_eq!(grid.dims(), [24, 3]);
    }
}
