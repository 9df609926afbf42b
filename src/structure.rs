use std::fmt::Display;
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matching::{calc_permutation, calc_permutation_hashed, contains, MatchError};
use crate::permutation::{row_major_strides, Permutation};

pub mod index;

use index::{ConcreteIndex, Index, IndexType};

/// Above this rank, index sets are matched through a hash map rather than by linear scans
pub const HASH_MATCH_THRESHOLD: usize = 16;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("duplicate index {0} in index set")]
    DuplicateIndex(Index),
    #[error("wrong number of indices {0}, expected {1}")]
    WrongNumberOfIndices(usize, usize),
    #[error("value {val} out of bounds for index {index}")]
    IndexOutOfBounds { index: Index, val: ConcreteIndex },
    #[error("flat index {0} out of bounds for size {1}")]
    FlatIndexOutOfBounds(usize, usize),
    #[error(transparent)]
    Match(#[from] MatchError),
}

/// The ordered list of indices of a tensor. No index appears twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Index>", into = "Vec<Index>")]
pub struct IndexSet {
    inds: Vec<Index>,
}

impl IndexSet {
    /// # Errors
    ///
    /// [`StructureError::DuplicateIndex`] if the same index is given twice.
    pub fn new(inds: Vec<Index>) -> Result<Self, StructureError> {
        for (i, ind) in inds.iter().enumerate() {
            if contains(&inds[..i], ind) {
                return Err(StructureError::DuplicateIndex(ind.clone()));
            }
        }
        Ok(IndexSet { inds })
    }

    /// The index set of a rank zero tensor
    pub fn scalar() -> Self {
        IndexSet { inds: vec![] }
    }

    pub fn rank(&self) -> usize {
        self.inds.len()
    }

    pub fn is_scalar(&self) -> bool {
        self.inds.is_empty()
    }

    pub fn dims(&self) -> Vec<usize> {
        self.inds.iter().map(Index::dim).collect()
    }

    /// Number of elements of a dense tensor with these indices, 1 for a scalar.
    pub fn size(&self) -> usize {
        self.inds.iter().map(Index::dim).product()
    }

    pub fn strides(&self) -> Vec<usize> {
        row_major_strides(&self.dims())
    }

    pub fn has_index(&self, index: &Index) -> bool {
        contains(&self.inds, index)
    }

    pub fn position(&self, index: &Index) -> Option<usize> {
        self.inds.iter().position(|i| i == index)
    }

    /// The first index of `self` that also belongs to `other`, optionally restricted to one [`IndexType`].
    pub fn common_index(&self, other: &IndexSet, index_type: Option<IndexType>) -> Option<&Index> {
        self.inds.iter().find(|i| {
            index_type.map_or(true, |t| i.index_type() == t) && other.has_index(i)
        })
    }

    /// Verifies the expanded index and flattens it.
    ///
    /// # Errors
    ///
    /// [`StructureError::WrongNumberOfIndices`] or [`StructureError::IndexOutOfBounds`].
    pub fn flat_index(&self, indices: &[ConcreteIndex]) -> Result<usize, StructureError> {
        if indices.len() != self.rank() {
            return Err(StructureError::WrongNumberOfIndices(
                indices.len(),
                self.rank(),
            ));
        }

        let mut flat = 0;
        for ((ind, &val), stride) in self.inds.iter().zip(indices).zip(self.strides()) {
            if val >= ind.dim() {
                return Err(StructureError::IndexOutOfBounds {
                    index: ind.clone(),
                    val,
                });
            }
            flat += val * stride;
        }
        Ok(flat)
    }

    /// # Errors
    ///
    /// [`StructureError::FlatIndexOutOfBounds`] if `flat` is not below [`Self::size`].
    pub fn expanded_index(&self, flat: usize) -> Result<Vec<ConcreteIndex>, StructureError> {
        if flat >= self.size() {
            return Err(StructureError::FlatIndexOutOfBounds(flat, self.size()));
        }
        let mut rest = flat;
        Ok(self
            .strides()
            .into_iter()
            .map(|stride| {
                let v = rest / stride;
                rest %= stride;
                v
            })
            .collect())
    }

    /// Permutation `p` with `p.apply_slice(other) == self`.
    ///
    /// # Errors
    ///
    /// [`MatchError::SetMismatch`] if the two sets differ.
    pub fn permutation_to(&self, other: &IndexSet) -> Result<Permutation, MatchError> {
        if self.rank() > HASH_MATCH_THRESHOLD {
            calc_permutation_hashed(&self.inds, &other.inds)
        } else {
            calc_permutation(&self.inds, &other.inds)
        }
    }

    /// Whether both sets hold the same indices, in any order
    pub fn same_set(&self, other: &IndexSet) -> bool {
        self.permutation_to(other).is_ok()
    }

    #[must_use]
    pub fn prime_all(&self, inc: u32) -> Self {
        // raising every level keeps distinct indices distinct
        IndexSet {
            inds: self.inds.iter().map(|i| i.primed(inc)).collect(),
        }
    }

    /// Raises the prime level of `index` only. Indices not in the set are ignored.
    ///
    /// # Errors
    ///
    /// [`StructureError::DuplicateIndex`] if the primed index is already present.
    pub fn prime_index(&self, index: &Index, inc: u32) -> Result<Self, StructureError> {
        let Some(pos) = self.position(index) else {
            return Ok(self.clone());
        };
        let mut inds = self.inds.clone();
        inds[pos] = index.primed(inc);
        IndexSet::new(inds)
    }

    /// Resets every prime level to zero.
    ///
    /// # Errors
    ///
    /// [`StructureError::DuplicateIndex`] if two indices only differed by prime level.
    pub fn noprime(&self) -> Result<Self, StructureError> {
        IndexSet::new(self.inds.iter().map(Index::noprime).collect())
    }

    /// Exchanges prime levels `a` and `b` on all indices.
    #[must_use]
    pub fn swap_prime(&self, a: u32, b: u32) -> Self {
        IndexSet {
            inds: self
                .inds
                .iter()
                .map(|i| match i.prime_level() {
                    l if l == a => i.with_prime_level(b),
                    l if l == b => i.with_prime_level(a),
                    _ => i.clone(),
                })
                .collect(),
        }
    }
}

impl Deref for IndexSet {
    type Target = [Index];

    fn deref(&self) -> &Self::Target {
        &self.inds
    }
}

impl TryFrom<Vec<Index>> for IndexSet {
    type Error = StructureError;

    fn try_from(value: Vec<Index>) -> Result<Self, Self::Error> {
        IndexSet::new(value)
    }
}

impl From<IndexSet> for Vec<Index> {
    fn from(value: IndexSet) -> Self {
        value.inds
    }
}

impl<'a> IntoIterator for &'a IndexSet {
    type Item = &'a Index;
    type IntoIter = std::slice::Iter<'a, Index>;

    fn into_iter(self) -> Self::IntoIter {
        self.inds.iter()
    }
}

impl Display for IndexSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (n, i) in self.inds.iter().enumerate() {
            if n > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{i}")?;
        }
        write!(f, "]")
    }
}

/// Builds an [`IndexSet`], failing on duplicates.
///
/// ```
/// # use itensor::{index_set, structure::index::Index};
/// let a = Index::new("a", 2);
/// let b = Index::new("b", 3);
/// let inds = index_set![a, b].unwrap();
/// assert_eq!(inds.dims(), vec![2, 3]);
/// ```
#[macro_export]
macro_rules! index_set {
    () => {
        Ok::<_, $crate::structure::StructureError>($crate::structure::IndexSet::scalar())
    };
    ($($ind:expr),+ $(,)?) => {
        $crate::structure::IndexSet::new(vec![$($ind.clone()),+])
    };
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    fn mixed() -> (Index, Index, Index, Index) {
        (
            Index::new("a2", 1),
            Index::new("b3", 3),
            Index::new("l1", 2),
            Index::site("s1", 2),
        )
    }

    #[test]
    fn duplicates_rejected() {
        let (a, b, _, _) = mixed();
        assert_eq!(
            IndexSet::new(vec![a.clone(), b.clone(), a.clone()]),
            Err(StructureError::DuplicateIndex(a.clone()))
        );
        assert!(index_set![a, b].is_ok());
    }

    #[test]
    fn flat_and_expanded() {
        let (a, b, l, s) = mixed();
        let inds = index_set![b, l, s, a].unwrap();
        assert_eq!(inds.size(), 12);
        assert_eq!(inds.strides(), vec![4, 2, 1, 1]);
        let e = vec![2, 1, 0, 0];
        let f = inds.flat_index(&e).unwrap();
        assert_eq!(f, 10);
        assert_eq!(inds.expanded_index(f).unwrap(), e);
        assert!(matches!(
            inds.flat_index(&[3, 0, 0, 0]),
            Err(StructureError::IndexOutOfBounds { val: 3, .. })
        ));
        assert!(inds.flat_index(&[0, 0]).is_err());
        assert!(inds.expanded_index(12).is_err());
    }

    #[test]
    fn scalar_set() {
        let inds = IndexSet::scalar();
        assert!(inds.is_scalar());
        assert_eq!(inds.size(), 1);
        assert_eq!(inds.flat_index(&[]).unwrap(), 0);
        assert_eq!(inds.expanded_index(0).unwrap(), Vec::<usize>::new());
    }

    #[test]
    fn reordered_sets_match() {
        let (a, b, l, s) = mixed();
        let x = index_set![a, b, l, s].unwrap();
        let y = index_set![l, s, a, b].unwrap();
        let p = x.permutation_to(&y).unwrap();
        assert_eq!(p.apply_slice(&*y), x.to_vec());
        assert!(x.same_set(&y));
        assert!(!x.same_set(&x.prime_all(1)));
    }

    #[test]
    fn common_index() {
        let s1 = Index::site("s1", 2);
        let s2 = Index::site("s2", 2);
        let s3 = Index::site("s3", 2);
        let l1 = Index::new("l1", 2);
        let l2 = Index::new("l2", 2);
        let l3 = Index::new("l3", 2);
        let l4 = Index::new("l4", 2);
        let t1 = index_set![s1, s2, l1, l2].unwrap();
        let t2 = index_set![s1, l3].unwrap();
        let t3 = index_set![s3, l4].unwrap();

        assert_eq!(t1.common_index(&t3, None), None);
        assert_eq!(t2.common_index(&t3, None), None);
        assert_eq!(t1.common_index(&t2, None), Some(&s1));
        assert_eq!(t1.common_index(&t2, Some(IndexType::Site)), Some(&s1));
        assert_eq!(t1.common_index(&t2, Some(IndexType::Link)), None);
    }

    #[test]
    fn noprime_detects_collisions() {
        let s1 = Index::site("s1", 2);
        let inds = index_set![s1, s1.prime()].unwrap();
        assert_eq!(
            inds.noprime(),
            Err(StructureError::DuplicateIndex(s1.clone()))
        );

        let swapped = inds.swap_prime(0, 1);
        assert_eq!(&*swapped, &[s1.prime(), s1.clone()]);
        assert!(inds.prime_index(&s1, 1).is_err());
        assert_eq!(
            inds.prime_index(&s1.prime(), 1).unwrap().to_vec(),
            vec![s1.clone(), s1.primed(2)]
        );
    }

    #[test]
    fn deserializing_checks_duplicates() {
        let (a, b, _, _) = mixed();
        let inds = index_set![a, b].unwrap();
        let json = serde_json::to_string(&inds).unwrap();
        let back: IndexSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, inds);

        let twice = serde_json::to_string(&vec![a.clone(), a.clone()]).unwrap();
        let err = serde_json::from_str::<IndexSet>(&twice).unwrap_err();
        assert!(err.to_string().contains("duplicate index"));
    }

    #[test]
    fn position_and_missing_prime() {
        let (a, b, l, _) = mixed();
        let inds = index_set![a, b].unwrap();
        assert_eq!(inds.position(&b), Some(1));
        assert_eq!(inds.position(&l), None);
        assert_eq!(inds.prime_index(&l, 1).unwrap(), inds);
    }

    #[test]
    fn display() {
        let (a, b, _, s) = mixed();
        let inds = index_set![a, b.prime(), s].unwrap();
        assert_snapshot!(inds.to_string(), @"[a2(1), b3'(3), s1(2)]");
    }
}
