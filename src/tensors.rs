use std::fmt::Display;

use approx::{AbsDiffEq, RelativeEq};
use log::debug;
use num::complex::Complex64;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::invoke::{invoke, invoke2, invoke_void, InvokeError, MaybeCall, MaybeCall2};
use crate::matching::{permute_map, MatchError};
use crate::structure::index::{Index, IndexType, IndexVal};
use crate::structure::{IndexSet, StructureError};

pub mod storage;

use storage::Storage;

/// Imaginary parts up to this magnitude are treated as zero when a real value is requested.
pub const REAL_TOLERANCE: f64 = 1e-14;

#[derive(Error, Debug)]
pub enum TensorError {
    #[error("tensor has no storage")]
    Null,
    #[error("element has imaginary part {0}")]
    NotReal(f64),
    #[error("{0} data elements for index set of size {1}")]
    WrongDataLength(usize, usize),
    #[error("Structure Error:{0}")]
    StructureError(#[from] StructureError),
    #[error("Match Error:{0}")]
    MatchError(#[from] MatchError),
    #[error(transparent)]
    InvokeError(#[from] InvokeError),
}

/// A tensor whose legs are identified by [`Index`]es rather than by position.
///
/// The data is stored densely in the order of [`Self::indices`], but every operation that
/// combines two tensors or addresses single elements is independent of that order.
/// A tensor without storage is *null*: it stands for "nothing yet", e.g. the start of a sum.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawITensor")]
pub struct ITensor {
    inds: IndexSet,
    store: Option<Storage>,
}

#[derive(Deserialize)]
struct RawITensor {
    inds: IndexSet,
    store: Option<Storage>,
}

impl TryFrom<RawITensor> for ITensor {
    type Error = TensorError;

    fn try_from(raw: RawITensor) -> Result<Self, Self::Error> {
        match raw.store {
            Some(store) => ITensor::from_storage(raw.inds, store),
            None => Ok(ITensor::null(raw.inds)),
        }
    }
}

impl ITensor {
    /// All elements zero.
    pub fn new(inds: IndexSet) -> Self {
        let store = Storage::zeros(inds.size());
        ITensor {
            inds,
            store: Some(store),
        }
    }

    /// # Errors
    ///
    /// If an index is repeated.
    pub fn from_indices(inds: &[Index]) -> Result<Self, TensorError> {
        Ok(ITensor::new(IndexSet::new(inds.to_vec())?))
    }

    /// A tensor with the given indices but no storage.
    pub fn null(inds: IndexSet) -> Self {
        ITensor { inds, store: None }
    }

    pub fn scalar(value: f64) -> Self {
        ITensor::from_parts(IndexSet::scalar(), Storage::Real(vec![value]))
    }

    pub fn scalar_complex(value: Complex64) -> Self {
        ITensor::from_parts(IndexSet::scalar(), Storage::Complex(vec![value]))
    }

    /// One at the given index values, zero elsewhere.
    ///
    /// # Errors
    ///
    /// If an index is repeated or a value is out of range.
    pub fn from_index_vals(vals: &[IndexVal]) -> Result<Self, TensorError> {
        let inds = IndexSet::new(vals.iter().map(|iv| iv.index.clone()).collect())?;
        let mut t = ITensor::new(inds);
        t.set(vals, 1.0)?;
        Ok(t)
    }

    /// `data` is row major in the order of `inds`.
    ///
    /// # Errors
    ///
    /// [`TensorError::WrongDataLength`] if `data` does not have one element per entry.
    pub fn from_real_data(inds: IndexSet, data: Vec<f64>) -> Result<Self, TensorError> {
        ITensor::from_storage(inds, Storage::Real(data))
    }

    /// # Errors
    ///
    /// [`TensorError::WrongDataLength`] if `data` does not have one element per entry.
    pub fn from_complex_data(inds: IndexSet, data: Vec<Complex64>) -> Result<Self, TensorError> {
        ITensor::from_storage(inds, Storage::Complex(data))
    }

    fn from_storage(inds: IndexSet, store: Storage) -> Result<Self, TensorError> {
        if store.len() != inds.size() {
            return Err(TensorError::WrongDataLength(store.len(), inds.size()));
        }
        Ok(ITensor::from_parts(inds, store))
    }

    pub(crate) fn from_parts(inds: IndexSet, store: Storage) -> Self {
        debug_assert_eq!(store.len(), inds.size());
        ITensor {
            inds,
            store: Some(store),
        }
    }

    pub fn indices(&self) -> &IndexSet {
        &self.inds
    }

    pub fn storage(&self) -> Option<&Storage> {
        self.store.as_ref()
    }

    pub(crate) fn storage_mut(&mut self) -> Result<&mut Storage, TensorError> {
        self.store.as_mut().ok_or(TensorError::Null)
    }

    pub fn rank(&self) -> usize {
        self.inds.rank()
    }

    pub fn is_null(&self) -> bool {
        self.store.is_none()
    }

    pub fn is_complex(&self) -> bool {
        self.store.as_ref().is_some_and(Storage::is_complex)
    }

    pub fn has_index(&self, index: &Index) -> bool {
        self.inds.has_index(index)
    }

    pub fn common_index(&self, other: &ITensor, index_type: Option<IndexType>) -> Option<&Index> {
        self.inds.common_index(&other.inds, index_type)
    }

    fn flat_from_vals(&self, vals: &[IndexVal]) -> Result<usize, TensorError> {
        if vals.len() != self.rank() {
            return Err(StructureError::WrongNumberOfIndices(vals.len(), self.rank()).into());
        }
        let inds: &[Index] = &self.inds;
        let mut expanded = vec![0; inds.len()];
        permute_map(inds, vals, &mut expanded, |(_, iv)| iv.val)?;
        Ok(self.inds.flat_index(&expanded)?)
    }

    /// The element at `vals`, given in any order.
    ///
    /// # Errors
    ///
    /// [`TensorError::Null`], a structure or match error for bad `vals`, or
    /// [`TensorError::NotReal`] if the element has a non-negligible imaginary part.
    pub fn real(&self, vals: &[IndexVal]) -> Result<f64, TensorError> {
        let z = self.cplx(vals)?;
        if z.im.abs() > REAL_TOLERANCE {
            return Err(TensorError::NotReal(z.im));
        }
        Ok(z.re)
    }

    /// # Errors
    ///
    /// [`TensorError::Null`], or a structure or match error for bad `vals`.
    pub fn cplx(&self, vals: &[IndexVal]) -> Result<Complex64, TensorError> {
        let store = self.store.as_ref().ok_or(TensorError::Null)?;
        let flat = self.flat_from_vals(vals)?;
        store
            .get_cplx(flat)
            .ok_or_else(|| StructureError::FlatIndexOutOfBounds(flat, store.len()).into())
    }

    /// # Errors
    ///
    /// [`TensorError::Null`], or a structure or match error for bad `vals`.
    pub fn set(&mut self, vals: &[IndexVal], value: f64) -> Result<(), TensorError> {
        let flat = self.flat_from_vals(vals)?;
        match self.storage_mut()? {
            Storage::Real(d) => d[flat] = value,
            Storage::Complex(d) => d[flat] = Complex64::new(value, 0.0),
        }
        Ok(())
    }

    /// Writes a complex element, switching real storage to complex if `value` is not real.
    ///
    /// # Errors
    ///
    /// [`TensorError::Null`], or a structure or match error for bad `vals`.
    pub fn set_cplx(&mut self, vals: &[IndexVal], value: Complex64) -> Result<(), TensorError> {
        if value.im == 0.0 {
            return self.set(vals, value.re);
        }
        let flat = self.flat_from_vals(vals)?;
        let store = self.storage_mut()?;
        if !store.is_complex() {
            debug!("promoting real storage to complex");
            store.promote();
        }
        if let Storage::Complex(d) = store {
            d[flat] = value;
        }
        Ok(())
    }

    /// Sets every element to `value`, allocating storage for a null tensor.
    /// Complex storage becomes real.
    pub fn fill(&mut self, value: f64) {
        self.store = Some(Storage::Real(vec![value; self.inds.size()]));
    }

    /// Frobenius norm
    ///
    /// # Errors
    ///
    /// [`TensorError::Null`]
    pub fn norm(&self) -> Result<f64, TensorError> {
        Ok(self.store.as_ref().ok_or(TensorError::Null)?.norm())
    }

    /// Sum of all elements.
    ///
    /// # Errors
    ///
    /// [`TensorError::Null`], or [`TensorError::NotReal`] if the sum is not real.
    pub fn sum_els(&self) -> Result<f64, TensorError> {
        let z = self.sum_els_cplx()?;
        if z.im.abs() > REAL_TOLERANCE {
            return Err(TensorError::NotReal(z.im));
        }
        Ok(z.re)
    }

    /// # Errors
    ///
    /// [`TensorError::Null`]
    pub fn sum_els_cplx(&self) -> Result<Complex64, TensorError> {
        Ok(self.store.as_ref().ok_or(TensorError::Null)?.sum())
    }

    #[must_use]
    pub fn conj(&self) -> Self {
        ITensor {
            inds: self.inds.clone(),
            store: self.store.as_ref().map(Storage::conj),
        }
    }

    /// Raises the prime level of every index by one.
    #[must_use]
    pub fn prime(&self) -> Self {
        ITensor {
            inds: self.inds.prime_all(1),
            store: self.store.clone(),
        }
    }

    /// # Errors
    ///
    /// If the primed index collides with another index of the tensor.
    pub fn prime_index(&self, index: &Index) -> Result<Self, TensorError> {
        Ok(ITensor {
            inds: self.inds.prime_index(index, 1)?,
            store: self.store.clone(),
        })
    }

    /// # Errors
    ///
    /// If two indices only differ by their prime level.
    pub fn noprime(&self) -> Result<Self, TensorError> {
        Ok(ITensor {
            inds: self.inds.noprime()?,
            store: self.store.clone(),
        })
    }

    #[must_use]
    pub fn swap_prime(&self, a: u32, b: u32) -> Self {
        ITensor {
            inds: self.inds.swap_prime(a, b),
            store: self.store.clone(),
        }
    }

    /// The data of `self`, reordered to follow `order`.
    ///
    /// # Errors
    ///
    /// [`TensorError::Null`], or [`TensorError::MatchError`] if `order` holds different indices.
    pub fn aligned_storage(&self, order: &IndexSet) -> Result<Storage, TensorError> {
        let store = self.store.as_ref().ok_or(TensorError::Null)?;
        let p = order.permutation_to(&self.inds)?;
        Ok(store.transpose(&p, &self.inds.dims()))
    }

    /// The same tensor, stored in the index order `order`.
    ///
    /// # Errors
    ///
    /// As [`Self::aligned_storage`].
    pub fn permute(&self, order: &IndexSet) -> Result<Self, TensorError> {
        Ok(ITensor::from_parts(
            order.clone(),
            self.aligned_storage(order)?,
        ))
    }

    /// Replaces every element `x` by `f(x)`.
    ///
    /// `f` is called on `f64` or on `Complex64` elements, depending on the storage.
    /// The tensor is left untouched on error.
    ///
    /// # Errors
    ///
    /// [`TensorError::Null`], or [`TensorError::InvokeError`] if `f` has no call form for the
    /// kind of data this tensor stores.
    pub fn apply<F>(&mut self, f: &mut F) -> Result<(), TensorError>
    where
        F: MaybeCall<f64, Output = f64> + MaybeCall<Complex64, Output = Complex64>,
    {
        match self.storage_mut()? {
            Storage::Real(d) => {
                let mapped = d
                    .iter()
                    .map(|&x| invoke(f, x))
                    .collect::<Result<Vec<_>, _>>()?;
                *d = mapped;
            }
            Storage::Complex(d) => {
                let mapped = d
                    .iter()
                    .map(|&z| invoke(f, z))
                    .collect::<Result<Vec<_>, _>>()?;
                *d = mapped;
            }
        }
        Ok(())
    }

    /// Hands every element to `f`, in storage order.
    ///
    /// # Errors
    ///
    /// [`TensorError::Null`], or [`TensorError::InvokeError`] if `f` has no call form for the
    /// kind of data this tensor stores.
    pub fn visit<F>(&self, f: &mut F) -> Result<(), TensorError>
    where
        F: MaybeCall<f64> + MaybeCall<Complex64>,
    {
        match self.store.as_ref().ok_or(TensorError::Null)? {
            Storage::Real(d) => d.iter().try_for_each(|&x| invoke_void(f, x))?,
            Storage::Complex(d) => d.iter().try_for_each(|&z| invoke_void(f, z))?,
        }
        Ok(())
    }

    /// Replaces every element `x` of `self` by `f(x, y)`, `y` being the element of `other`
    /// at the same index values.
    ///
    /// If either tensor is complex, both are combined as complex.
    ///
    /// # Errors
    ///
    /// [`TensorError::Null`] if either tensor has no storage, [`TensorError::MatchError`] if the
    /// index sets differ, or [`TensorError::InvokeError`] if `f` lacks the needed call form.
    pub fn apply_pairwise<F>(&mut self, other: &ITensor, f: &mut F) -> Result<(), TensorError>
    where
        F: MaybeCall2<f64, f64, Output = f64>
            + MaybeCall2<Complex64, Complex64, Output = Complex64>,
    {
        let aligned = other.aligned_storage(&self.inds)?;
        let store = self.storage_mut()?;
        match (&*store, aligned) {
            (Storage::Real(a), Storage::Real(b)) => {
                let combined = a
                    .iter()
                    .zip(b)
                    .map(|(&x, y)| invoke2(f, x, y))
                    .collect::<Result<Vec<_>, _>>()?;
                *store = Storage::Real(combined);
            }
            (a, b) => {
                let combined = a
                    .to_complex()
                    .into_iter()
                    .zip(b.to_complex())
                    .map(|(x, y)| invoke2(f, x, y))
                    .collect::<Result<Vec<_>, _>>()?;
                *store = Storage::Complex(combined);
            }
        }
        Ok(())
    }

    /// Fills the tensor with real values drawn from `f`, in storage order.
    pub fn generate(&mut self, mut f: impl FnMut() -> f64) {
        let data = (0..self.inds.size()).map(|_| f()).collect();
        self.store = Some(Storage::Real(data));
    }

    pub fn generate_complex(&mut self, mut f: impl FnMut() -> Complex64) {
        let data = (0..self.inds.size()).map(|_| f()).collect();
        self.store = Some(Storage::Complex(data));
    }

    fn elementwise_eq(&self, other: &Self, mut eq: impl FnMut(f64, f64) -> bool) -> bool {
        match (&self.store, &other.store) {
            (None, None) => self.inds.same_set(&other.inds),
            (Some(a), Some(_)) => {
                let Ok(b) = other.aligned_storage(&self.inds) else {
                    return false;
                };
                a.to_complex()
                    .into_iter()
                    .zip(b.to_complex())
                    .all(|(x, y)| eq(x.re, y.re) && eq(x.im, y.im))
            }
            _ => false,
        }
    }
}

/// The first index of `a` that `b` also carries, optionally restricted to one type.
pub fn common_index<'a>(
    a: &'a ITensor,
    b: &ITensor,
    index_type: Option<IndexType>,
) -> Option<&'a Index> {
    a.common_index(b, index_type)
}

impl AbsDiffEq for ITensor {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.elementwise_eq(other, |a, b| a.abs_diff_eq(&b, epsilon))
    }
}

impl RelativeEq for ITensor {
    fn default_max_relative() -> f64 {
        f64::EPSILON
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.elementwise_eq(other, |a, b| a.relative_eq(&b, epsilon, max_relative))
    }
}

impl Display for ITensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ITensor r={} {}", self.rank(), self.inds)?;
        match &self.store {
            None => write!(f, " {{null}}"),
            Some(Storage::Real(d)) => write!(f, " {{Real, {} elements}}", d.len()),
            Some(Storage::Complex(d)) => write!(f, " {{Complex, {} elements}}", d.len()),
        }
    }
}
