//! Matching of two index sets that are equal as sets but may be stored in different orders.
//!
//! All searches are linear: tensor ranks are small, so an `O(n·m)` scan beats hashing.
//! [`calc_permutation_hashed`] exists for the rare large rank case.

use std::borrow::Borrow;
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::IndexMut;

use ahash::AHashMap;
use bitvec::vec::BitVec;
use thiserror::Error;

use crate::permutation::Permutation;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("sets are not permutations of each other: {0}")]
    SetMismatch(String),
}

/// Returns true if any element of `collection` equals `item`.
///
/// ```
/// # use itensor::matching::contains;
/// assert!(contains(&[1, 2, 3], &2));
/// assert!(!contains(Vec::<i32>::new(), &2));
/// ```
pub fn contains<C, T>(collection: C, item: &T) -> bool
where
    C: IntoIterator,
    C::Item: Borrow<T>,
    T: PartialEq + ?Sized,
{
    for c in collection {
        if c.borrow() == item {
            return true;
        }
    }
    false
}

/// Computes the permutation relating `source` to `target`.
///
/// For every element of `target` at position `i2`, the element of `source` equal to it sits at position `i1`,
/// and the returned permutation maps `i1` to `i2`. Applying it to `target` therefore reproduces `source`:
///
/// ```
/// # use itensor::matching::calc_permutation;
/// let source = ["a", "b", "c"];
/// let target = ["c", "a", "b"];
/// let p = calc_permutation(&source, &target).unwrap();
/// assert_eq!(p.map(), &[1, 2, 0]);
/// assert_eq!(p.apply_slice(&target), source);
/// ```
///
/// # Errors
///
/// [`MatchError::SetMismatch`] if the two sequences are not permutations of each other.
pub fn calc_permutation<T>(source: &[T], target: &[T]) -> Result<Permutation, MatchError>
where
    T: PartialEq + Debug,
{
    if source.len() != target.len() {
        return Err(MatchError::SetMismatch(format!(
            "{} elements vs {}",
            source.len(),
            target.len()
        )));
    }
    let mut map = vec![usize::MAX; source.len()];
    permute_map(source, target, &mut map, |(i2, _)| i2)?;
    Ok(Permutation::from_map(map))
}

/// Same result as [`calc_permutation`], looking positions up in a hash map instead of scanning.
///
/// # Errors
///
/// [`MatchError::SetMismatch`] under the same conditions as [`calc_permutation`].
pub fn calc_permutation_hashed<T>(source: &[T], target: &[T]) -> Result<Permutation, MatchError>
where
    T: Eq + Hash + Debug,
{
    if source.len() != target.len() {
        return Err(MatchError::SetMismatch(format!(
            "{} elements vs {}",
            source.len(),
            target.len()
        )));
    }
    let mut posmap = AHashMap::with_capacity(source.len());
    for (i1, v1) in source.iter().enumerate() {
        // first occurrence wins, as in the linear scan
        posmap.entry(v1).or_insert(i1);
    }

    let mut map = vec![usize::MAX; source.len()];
    for (i2, v2) in target.iter().enumerate() {
        let i1 = *posmap
            .get(v2)
            .ok_or_else(|| MatchError::SetMismatch(format!("{v2:?} not found")))?;
        if map[i1] != usize::MAX {
            return Err(MatchError::SetMismatch(format!("{v2:?} matched twice")));
        }
        map[i1] = i2;
    }
    Ok(Permutation::from_map(map))
}

/// For every element of `target`, finds the equal element of `source` at position `i1`
/// and stores `f((i2, element))` in `result[i1]`, where `i2` is the element's position in `target`.
///
/// `target` may be any sequence whose items compare equal to elements of `source`,
/// e.g. index values against the indices of a tensor.
///
/// # Errors
///
/// [`MatchError::SetMismatch`] as soon as an element of `target` has no counterpart in `source`,
/// or when two elements of `target` claim the same element of `source`.
/// `result` may have been partially written in that case.
pub fn permute_map<S, U, R, V, F>(
    source: &[S],
    target: &[U],
    result: &mut R,
    f: F,
) -> Result<(), MatchError>
where
    S: Debug,
    U: PartialEq<S> + Debug,
    R: IndexMut<usize, Output = V> + ?Sized,
    F: FnMut((usize, &U)) -> V,
{
    permute_map_iter(source, target.iter(), result, f)
}

/// Iterator form of [`permute_map`]: `target` is consumed once, in order.
///
/// # Errors
///
/// Same as [`permute_map`].
pub fn permute_map_iter<'a, S, U, I, R, V, F>(
    source: &[S],
    target: I,
    result: &mut R,
    mut f: F,
) -> Result<(), MatchError>
where
    S: Debug,
    U: PartialEq<S> + Debug + 'a,
    I: IntoIterator<Item = &'a U>,
    R: IndexMut<usize, Output = V> + ?Sized,
    F: FnMut((usize, &U)) -> V,
{
    let mut matched: BitVec = BitVec::repeat(false, source.len());
    for (i2, v2) in target.into_iter().enumerate() {
        let i1 = source
            .iter()
            .position(|v1| v2 == v1)
            .ok_or_else(|| MatchError::SetMismatch(format!("{v2:?} not found in {source:?}")))?;
        if matched[i1] {
            return Err(MatchError::SetMismatch(format!(
                "{v2:?} matched {:?} twice",
                source[i1]
            )));
        }
        matched.set(i1, true);
        result[i1] = f((i2, v2));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::index::Index;

    fn abc() -> Vec<Index> {
        vec![Index::new("a", 2), Index::new("b", 3), Index::new("c", 4)]
    }

    #[test]
    fn contains_linear() {
        let inds = abc();
        assert!(contains(&inds, &Index::new("b", 3)));
        assert!(!contains(&inds, &Index::new("b", 3).prime()));
        assert!(!contains(Vec::<Index>::new(), &Index::new("a", 2)));
        assert!(contains(inds.iter().map(|i| i.name()), "c"));
    }

    fn all_maps(n: usize) -> Vec<Vec<usize>> {
        if n == 0 {
            return vec![vec![]];
        }
        let mut out = vec![];
        for m in all_maps(n - 1) {
            for pos in 0..n {
                let mut next = m.clone();
                next.insert(pos, n - 1);
                out.push(next);
            }
        }
        out
    }

    #[test]
    fn permutation_is_inverse_of_reordering() {
        let mut s = abc();
        s.push(Index::site("d", 2));
        let maps = all_maps(s.len());
        assert_eq!(maps.len(), 24);

        for map in maps {
            let pi = Permutation::from_map(map);
            let t = pi.apply_slice(&s);
            let p = calc_permutation(&s, &t).unwrap();
            assert_eq!(p, pi.inverse());
            assert_eq!(p.apply_slice(&t), s);
            assert_eq!(calc_permutation_hashed(&s, &t).unwrap(), p);
        }
    }

    #[test]
    fn identity_on_same_order() {
        let s = abc();
        assert_eq!(calc_permutation(&s, &s).unwrap(), Permutation::id(3));
        assert_eq!(
            calc_permutation::<Index>(&[], &[]).unwrap(),
            Permutation::id(0)
        );
    }

    #[test]
    fn mismatch_fails() {
        let s = abc();
        let mut t = abc();
        t[1] = t[1].prime();
        assert!(matches!(
            calc_permutation(&s, &t),
            Err(MatchError::SetMismatch(_))
        ));
        assert!(matches!(
            calc_permutation(&s, &t[..2]),
            Err(MatchError::SetMismatch(_))
        ));
        assert!(matches!(
            calc_permutation_hashed(&s, &t),
            Err(MatchError::SetMismatch(_))
        ));
    }

    #[test]
    fn duplicates_do_not_yield_partial_permutation() {
        let a = Index::new("a", 2);
        let b = Index::new("b", 2);
        let s = vec![a.clone(), b.clone()];
        let t = vec![a.clone(), a.clone()];
        assert!(calc_permutation(&s, &t).is_err());
        assert!(calc_permutation_hashed(&s, &t).is_err());
    }

    #[test]
    fn hashed_agrees_with_linear() {
        let s: Vec<Index> = (0..20).map(|i| Index::new(format!("i{i}"), i + 1)).collect();
        let pi = Permutation::from_map((0..20).map(|i| (7 * i + 3) % 20).collect());
        let t = pi.apply_slice(&s);
        assert_eq!(
            calc_permutation(&s, &t).unwrap(),
            calc_permutation_hashed(&s, &t).unwrap()
        );
    }

    #[test]
    fn mapped_builder_colocates_values() {
        let s = abc();
        let t = vec![s[2].clone(), s[0].clone(), s[1].clone()];
        let mut dims = vec![0; 3];
        permute_map(&s, &t, &mut dims, |(_, i)| i.dim() * 10).unwrap();
        assert_eq!(dims, vec![20, 30, 40]);

        let mut positions = vec![0; 3];
        permute_map_iter(&s, t.iter(), positions.as_mut_slice(), |(j, _)| j).unwrap();
        assert_eq!(positions, vec![1, 2, 0]);
    }

    #[test]
    fn mapped_builder_across_types() {
        let s = abc();
        let vals = vec![s[1].at(2), s[2].at(3), s[0].at(1)];
        let mut expanded = vec![0; 3];
        permute_map(&s, &vals, &mut expanded, |(_, iv)| iv.val).unwrap();
        assert_eq!(expanded, vec![1, 2, 3]);

        let stray = vec![Index::new("z", 1).at(0)];
        let mut out = vec![0; 3];
        assert!(permute_map(&s, &stray, &mut out, |(_, iv)| iv.val).is_err());
    }
}
