use std::fmt::Debug;

use derive_more::Display;
use log::trace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matching::{calc_permutation, contains, MatchError};
use crate::permutation::{row_major_strides, Permutation};
use crate::structure::index::Index;
use crate::structure::{IndexSet, StructureError};
use crate::tensors::storage::Storage;
use crate::tensors::ITensor;

pub mod dense;

use dense::contract_dense;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Operand {
    #[display(fmt = "left")]
    Left,
    #[display(fmt = "right")]
    Right,
}

#[derive(Error, Debug)]
pub enum ContractionError {
    #[error("index {index} appears twice in the {operand} operand")]
    DuplicateIndex { operand: Operand, index: String },
    #[error("cannot contract a tensor without storage")]
    NullTensor,
    #[error("Structure Error:{0}")]
    StructureError(#[from] StructureError),
    #[error("Match Error:{0}")]
    MatchError(#[from] MatchError),
}

pub trait Contract<T = Self> {
    type LCM;
    fn contract(&self, other: &T) -> Result<Self::LCM, ContractionError>;
}

/// What a contraction amounts to, given the shapes of its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum ContractionKind {
    /// One operand has rank zero
    #[display(fmt = "ScalarMultiply")]
    ScalarMultiply,
    /// No shared index; every index propagates
    #[display(fmt = "OuterProduct")]
    OuterProduct,
    /// Some indices are summed, some propagate
    #[display(fmt = "Partial")]
    Partial,
    /// Every index is summed and the result is a scalar
    #[display(fmt = "Full")]
    Full,
}

/// The classification of the indices of two operands, and the reorderings that bring
/// each operand's storage into contraction order.
///
/// Contraction order is `left_only ++ common` for the left operand and `common ++ right_only`
/// for the right one, so that the contraction becomes a plain matrix product. `common` follows
/// the order the shared indices have in the left operand.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractionPlan<T> {
    pub common: Vec<T>,
    pub left_only: Vec<T>,
    pub right_only: Vec<T>,
    /// `left_order.apply_slice(left) == left_only ++ common`
    pub left_order: Permutation,
    /// `right_order.apply_slice(right) == common ++ right_only`
    pub right_order: Permutation,
    pub kind: ContractionKind,
}

impl<T: Clone> ContractionPlan<T> {
    /// Indices of the result: the left-only ones in left order, then the right-only ones in right order.
    pub fn result(&self) -> Vec<T> {
        self.left_only
            .iter()
            .chain(&self.right_only)
            .cloned()
            .collect()
    }

    pub fn left_canonical(&self) -> Vec<T> {
        self.left_only.iter().chain(&self.common).cloned().collect()
    }

    pub fn right_canonical(&self) -> Vec<T> {
        self.common.iter().chain(&self.right_only).cloned().collect()
    }

    /// For every axis of the operand in contraction order, its stride in the operand's own
    /// row major storage, given the operand's declared `dims`.
    pub fn storage_strides(&self, operand: Operand, dims: &[usize]) -> Vec<usize> {
        let order = match operand {
            Operand::Left => &self.left_order,
            Operand::Right => &self.right_order,
        };
        order.apply_slice(row_major_strides(dims))
    }
}

fn check_duplicates<T: PartialEq + Debug>(
    inds: &[T],
    operand: Operand,
) -> Result<(), ContractionError> {
    for (i, ind) in inds.iter().enumerate() {
        if contains(&inds[..i], ind) {
            return Err(ContractionError::DuplicateIndex {
                operand,
                index: format!("{ind:?}"),
            });
        }
    }
    Ok(())
}

/// Classifies the indices of `left` and `right` and computes the storage reorderings
/// of a contraction between them.
///
/// # Errors
///
/// [`ContractionError::DuplicateIndex`] if an index occurs twice within one operand.
pub fn plan_contraction<T>(left: &[T], right: &[T]) -> Result<ContractionPlan<T>, ContractionError>
where
    T: PartialEq + Clone + Debug,
{
    check_duplicates(left, Operand::Left)?;
    check_duplicates(right, Operand::Right)?;

    let mut common = Vec::new();
    let mut left_only = Vec::new();
    for l in left {
        if contains(right, l) {
            common.push(l.clone());
        } else {
            left_only.push(l.clone());
        }
    }

    let right_only: Vec<T> = right.iter().filter(|r| !contains(left, *r)).cloned().collect();

    let kind = if left.is_empty() || right.is_empty() {
        ContractionKind::ScalarMultiply
    } else if common.is_empty() {
        ContractionKind::OuterProduct
    } else if left_only.is_empty() && right_only.is_empty() {
        ContractionKind::Full
    } else {
        ContractionKind::Partial
    };

    let left_canonical: Vec<T> = left_only.iter().chain(&common).cloned().collect();
    let right_canonical: Vec<T> = common.iter().chain(&right_only).cloned().collect();
    let left_order = calc_permutation(&left_canonical, left)?;
    let right_order = calc_permutation(&right_canonical, right)?;

    trace!(
        "{kind} contraction: {} common, {} left only, {} right only",
        common.len(),
        left_only.len(),
        right_only.len()
    );

    Ok(ContractionPlan {
        common,
        left_only,
        right_only,
        left_order,
        right_order,
        kind,
    })
}

impl Contract for IndexSet {
    type LCM = ContractionPlan<Index>;

    fn contract(&self, other: &IndexSet) -> Result<Self::LCM, ContractionError> {
        plan_contraction(&**self, &**other)
    }
}

impl Contract for ITensor {
    type LCM = ITensor;

    /// Sums over all shared indices. Real operands give a real result; as soon as one operand
    /// is complex, the result is complex.
    fn contract(&self, other: &ITensor) -> Result<ITensor, ContractionError> {
        let (Some(left), Some(right)) = (self.storage(), other.storage()) else {
            return Err(ContractionError::NullTensor);
        };
        let plan = self.indices().contract(other.indices())?;
        let inds = IndexSet::new(plan.result())?;

        let left_dims = self.indices().dims();
        let right_dims = other.indices().dims();
        let data = match (left, right) {
            (Storage::Real(l), Storage::Real(r)) => {
                Storage::Real(contract_dense(&plan, &left_dims, l, &right_dims, r))
            }
            (l, r) => Storage::Complex(contract_dense(
                &plan,
                &left_dims,
                &l.to_complex(),
                &right_dims,
                &r.to_complex(),
            )),
        };

        Ok(ITensor::from_parts(inds, data))
    }
}
