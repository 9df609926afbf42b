use derive_more::From;
use enum_try_as_inner::EnumTryAsInner;
use num::complex::Complex64;
use num::Zero;
use serde::{Deserialize, Serialize};

use crate::permutation::Permutation;

/// Dense row major data of a tensor, real or complex.
#[derive(Debug, Clone, PartialEq, EnumTryAsInner, Serialize, Deserialize, From)]
#[derive_err(Debug)]
pub enum Storage {
    Real(Vec<f64>),
    Complex(Vec<Complex64>),
}

impl Storage {
    pub fn zeros(len: usize) -> Self {
        Storage::Real(vec![0.0; len])
    }

    pub fn len(&self) -> usize {
        match self {
            Storage::Real(d) => d.len(),
            Storage::Complex(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element at `flat`, widened to a complex number
    pub fn get_cplx(&self, flat: usize) -> Option<Complex64> {
        match self {
            Storage::Real(d) => d.get(flat).map(|&r| Complex64::new(r, 0.0)),
            Storage::Complex(d) => d.get(flat).copied(),
        }
    }

    /// A complex copy of the data
    pub fn to_complex(&self) -> Vec<Complex64> {
        match self {
            Storage::Real(d) => d.iter().map(|&r| Complex64::new(r, 0.0)).collect(),
            Storage::Complex(d) => d.clone(),
        }
    }

    /// Switches real data to complex in place, keeping the values.
    pub fn promote(&mut self) {
        if let Storage::Real(d) = self {
            let data = d.iter().map(|&r| Complex64::new(r, 0.0)).collect();
            *self = Storage::Complex(data);
        }
    }

    pub fn scale(&mut self, factor: f64) {
        match self {
            Storage::Real(d) => d.iter_mut().for_each(|x| *x *= factor),
            Storage::Complex(d) => d.iter_mut().for_each(|z| *z *= factor),
        }
    }

    /// Scales by a complex factor, promoting real data unless the factor is real.
    pub fn scale_cplx(&mut self, factor: Complex64) {
        if factor.im.is_zero() {
            self.scale(factor.re);
            return;
        }
        self.promote();
        if let Storage::Complex(d) = self {
            d.iter_mut().for_each(|z| *z *= factor);
        }
    }

    #[must_use]
    pub fn conj(&self) -> Self {
        match self {
            Storage::Real(d) => Storage::Real(d.clone()),
            Storage::Complex(d) => Storage::Complex(d.iter().map(|z| z.conj()).collect()),
        }
    }

    pub fn norm(&self) -> f64 {
        match self {
            Storage::Real(d) => d.iter().map(|x| x * x).sum::<f64>().sqrt(),
            Storage::Complex(d) => d.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt(),
        }
    }

    pub fn sum(&self) -> Complex64 {
        match self {
            Storage::Real(d) => Complex64::new(d.iter().sum(), 0.0),
            Storage::Complex(d) => d.iter().sum(),
        }
    }

    /// Reorders the axes, see [`Permutation::transpose_data`].
    #[must_use]
    pub fn transpose(&self, permutation: &Permutation, dims: &[usize]) -> Self {
        match self {
            Storage::Real(d) => Storage::Real(permutation.transpose_data(d, dims)),
            Storage::Complex(d) => Storage::Complex(permutation.transpose_data(d, dims)),
        }
    }
}
