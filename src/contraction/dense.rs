use std::ops::{AddAssign, Mul};

use num::Zero;

use super::ContractionPlan;

/// Contracts two dense row major operands according to `plan`.
///
/// Both operands are first transposed into contraction order, after which the left one is an
/// `m × k` matrix and the right one a `k × n` matrix, `k` being the combined dimension of the
/// common indices. The returned data has the shape of [`ContractionPlan::result`].
pub fn contract_dense<I, T>(
    plan: &ContractionPlan<I>,
    left_dims: &[usize],
    left: &[T],
    right_dims: &[usize],
    right: &[T],
) -> Vec<T>
where
    T: Copy + Zero + Mul<Output = T> + AddAssign,
{
    let left_canonical_dims = plan.left_order.apply_slice(left_dims);
    let right_canonical_dims = plan.right_order.apply_slice(right_dims);

    let (free_left, summed) = left_canonical_dims.split_at(plan.left_only.len());
    let free_right = &right_canonical_dims[plan.common.len()..];
    let m: usize = free_left.iter().product();
    let k: usize = summed.iter().product();
    let n: usize = free_right.iter().product();

    let lt = plan.left_order.transpose_data(left, left_dims);
    let rt = plan.right_order.transpose_data(right, right_dims);

    let mut out = vec![T::zero(); m * n];
    for i in 0..m {
        let row = &mut out[i * n..(i + 1) * n];
        for c in 0..k {
            let a = lt[i * k + c];
            for (o, &b) in row.iter_mut().zip(&rt[c * n..(c + 1) * n]) {
                *o += a * b;
            }
        }
    }
    out
}
