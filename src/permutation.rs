use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermutationError {
    #[error("{0:?} is not a permutation")]
    NotAPermutation(Vec<usize>),
}

/// A bijection of positions `0..n`, stored together with its inverse.
///
/// Applying the permutation to a slice `s` yields `[s[map[0]], s[map[1]], ...]`.
/// Only `map` is serialized; the inverse is rebuilt on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct Permutation {
    map: Vec<usize>,
    inv: Vec<usize>,
}

impl PartialOrd for Permutation {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.map.partial_cmp(&other.map)
    }
}

impl Permutation {
    /// # Panics
    ///
    /// If `map` is not a permutation of `0..map.len()`.
    pub fn from_map(map: Vec<usize>) -> Self {
        match Permutation::try_from(map) {
            Ok(p) => p,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn id(n: usize) -> Self {
        Permutation {
            map: (0..n).collect(),
            inv: (0..n).collect(),
        }
    }

    pub fn map(&self) -> &[usize] {
        &self.map
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn is_identity(&self) -> bool {
        self.map.iter().enumerate().all(|(i, &j)| i == j)
    }

    #[must_use]
    pub fn inverse(&self) -> Self {
        Permutation {
            map: self.inv.clone(),
            inv: self.map.clone(),
        }
    }

    /// The permutation that applies `self` first, then `other`.
    #[must_use]
    pub fn then(&self, other: &Permutation) -> Self {
        Permutation::from_map(other.apply_slice(&self.map))
    }

    pub fn apply_slice<T: Clone, S>(&self, slice: S) -> Vec<T>
    where
        S: AsRef<[T]>,
    {
        let s = slice.as_ref();
        self.map.iter().map(|&idx| s[idx].clone()).collect()
    }

    pub fn apply_slice_inv<T: Clone, S>(&self, slice: S) -> Vec<T>
    where
        S: AsRef<[T]>,
    {
        let s = slice.as_ref();
        self.inv.iter().map(|&idx| s[idx].clone()).collect()
    }

    /// Reorders the axes of row major data with shape `dims`.
    ///
    /// The result has shape `self.apply_slice(dims)`, and its element at expanded index `e`
    /// is the element of `data` at the expanded index `o` with `o[map[k]] = e[k]`.
    pub fn transpose_data<T: Clone>(&self, data: &[T], dims: &[usize]) -> Vec<T> {
        debug_assert_eq!(dims.len(), self.len());
        if self.is_identity() {
            return data.to_vec();
        }

        let old_strides = row_major_strides(dims);
        // stride in the old data of every new axis
        let strides_along_new = self.apply_slice(&old_strides);
        let new_dims = self.apply_slice(dims);

        let mut out = Vec::with_capacity(data.len());
        let mut counter = vec![0; new_dims.len()];
        let mut offset = 0;
        for _ in 0..data.len() {
            out.push(data[offset].clone());
            // odometer increment over the new shape, last axis fastest
            for k in (0..new_dims.len()).rev() {
                counter[k] += 1;
                offset += strides_along_new[k];
                if counter[k] < new_dims[k] {
                    break;
                }
                offset -= counter[k] * strides_along_new[k];
                counter[k] = 0;
            }
        }
        out
    }
}

impl TryFrom<Vec<usize>> for Permutation {
    type Error = PermutationError;

    fn try_from(map: Vec<usize>) -> Result<Self, Self::Error> {
        let mut inv = vec![usize::MAX; map.len()];
        for (i, &j) in map.iter().enumerate() {
            if j >= map.len() || inv[j] != usize::MAX {
                return Err(PermutationError::NotAPermutation(map));
            }
            inv[j] = i;
        }
        Ok(Permutation { map, inv })
    }
}

impl From<Permutation> for Vec<usize> {
    fn from(value: Permutation) -> Self {
        value.map
    }
}

/// Row major strides of a shape; the last axis is contiguous.
pub fn row_major_strides(dims: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; dims.len()];
    for i in (0..dims.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * dims[i + 1];
    }
    strides
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_slice() {
        let p = Permutation::from_map(vec![2, 1, 3, 0]);
        let data = vec![10, 20, 30, 40];
        let permuted = p.apply_slice(&data);
        assert_eq!(permuted, vec![30, 20, 40, 10]);
    }

    #[test]
    fn test_apply_slice_inv() {
        let p = Permutation::from_map(vec![2, 1, 3, 0]);
        let data = vec![10, 20, 30, 40];
        let permuted = p.apply_slice_inv(&data);
        assert_eq!(permuted, vec![40, 20, 10, 30]);
        assert_eq!(p.inverse().apply_slice(&p.apply_slice(&data)), data);
    }

    #[test]
    fn composition() {
        let p = Permutation::from_map(vec![2, 0, 1]);
        let q = Permutation::from_map(vec![1, 0, 2]);
        let data = vec!['a', 'b', 'c'];
        assert_eq!(
            p.then(&q).apply_slice(&data),
            q.apply_slice(p.apply_slice(&data))
        );
        assert!(p.then(&p.inverse()).is_identity());
    }

    #[test]
    #[should_panic]
    fn rejects_non_permutations() {
        let _ = Permutation::from_map(vec![0, 0, 1]);
    }

    #[test]
    fn deserializing_rebuilds_inverse() {
        let p = Permutation::from_map(vec![2, 0, 1]);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "[2,0,1]");
        let back: Permutation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
        assert_eq!(back.inverse().map(), &[1, 2, 0]);

        assert!(serde_json::from_str::<Permutation>("[0,0,1]").is_err());
        assert!(serde_json::from_str::<Permutation>("[0,3]").is_err());
        assert_eq!(
            Permutation::try_from(vec![1, 1]),
            Err(PermutationError::NotAPermutation(vec![1, 1]))
        );
    }

    #[test]
    fn strides() {
        assert_eq!(row_major_strides(&[2, 3, 4]), vec![12, 4, 1]);
        assert_eq!(row_major_strides(&[]), Vec::<usize>::new());
    }

    #[test]
    fn transpose_matrix() {
        // 2x3 matrix to its 3x2 transpose
        let data = vec![1, 2, 3, 4, 5, 6];
        let p = Permutation::from_map(vec![1, 0]);
        assert_eq!(p.transpose_data(&data, &[2, 3]), vec![1, 4, 2, 5, 3, 6]);
    }

    #[test]
    fn transpose_rank_three() {
        let dims = [2, 3, 4];
        let data: Vec<usize> = (0..24).collect();
        let p = Permutation::from_map(vec![2, 0, 1]);
        let out = p.transpose_data(&data, &dims);
        let new_dims = p.apply_slice(dims);
        assert_eq!(new_dims, vec![4, 2, 3]);

        let old_strides = row_major_strides(&dims);
        let new_strides = row_major_strides(&new_dims);
        for e0 in 0..4 {
            for e1 in 0..2 {
                for e2 in 0..3 {
                    let e = [e0, e1, e2];
                    let mut o = [0; 3];
                    for k in 0..3 {
                        o[p.map()[k]] = e[k];
                    }
                    let old: usize = o.iter().zip(&old_strides).map(|(a, b)| a * b).sum();
                    let new: usize = e.iter().zip(&new_strides).map(|(a, b)| a * b).sum();
                    assert_eq!(out[new], data[old]);
                }
            }
        }
    }
}
