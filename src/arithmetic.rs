use std::ops::{Div, DivAssign, Mul, MulAssign, Neg};

use duplicate::duplicate;
use log::debug;
use num::complex::Complex64;

use crate::tensors::storage::Storage;
use crate::tensors::{ITensor, TensorError};

pub trait FallibleAdd<T = Self> {
    type Output;
    fn add_fallible(&self, rhs: &T) -> Result<Self::Output, TensorError>;
}

pub trait FallibleSub<T = Self> {
    type Output;
    fn sub_fallible(&self, rhs: &T) -> Result<Self::Output, TensorError>;
}

pub trait FallibleAddAssign<T = Self> {
    fn add_assign_fallible(&mut self, rhs: &T) -> Result<(), TensorError>;
}

pub trait FallibleSubAssign<T = Self> {
    fn sub_assign_fallible(&mut self, rhs: &T) -> Result<(), TensorError>;
}

/// `lhs + sign * rhs`, element by element after bringing `rhs` into the index order of `lhs`.
fn add_scaled(lhs: &ITensor, rhs: &ITensor, sign: f64) -> Result<ITensor, TensorError> {
    let Some(store) = lhs.storage() else {
        // null + T = T
        return Ok(rhs * sign);
    };
    if rhs.is_null() {
        return Ok(lhs.clone());
    }

    let aligned = rhs.aligned_storage(lhs.indices())?;
    let data = match (store, aligned) {
        (Storage::Real(a), Storage::Real(b)) => {
            Storage::Real(a.iter().zip(b).map(|(x, y)| x + sign * y).collect())
        }
        (a, b) => {
            debug!("combining real and complex data");
            Storage::Complex(
                a.to_complex()
                    .into_iter()
                    .zip(b.to_complex())
                    .map(|(x, y)| x + y * sign)
                    .collect(),
            )
        }
    };
    Ok(ITensor::from_parts(lhs.indices().clone(), data))
}

impl FallibleAdd for ITensor {
    type Output = ITensor;

    /// # Errors
    ///
    /// [`TensorError::MatchError`] if the two tensors carry different index sets.
    fn add_fallible(&self, rhs: &ITensor) -> Result<ITensor, TensorError> {
        add_scaled(self, rhs, 1.0)
    }
}

impl FallibleSub for ITensor {
    type Output = ITensor;

    fn sub_fallible(&self, rhs: &ITensor) -> Result<ITensor, TensorError> {
        add_scaled(self, rhs, -1.0)
    }
}

impl FallibleAddAssign for ITensor {
    fn add_assign_fallible(&mut self, rhs: &ITensor) -> Result<(), TensorError> {
        *self = add_scaled(self, rhs, 1.0)?;
        Ok(())
    }
}

impl FallibleSubAssign for ITensor {
    fn sub_assign_fallible(&mut self, rhs: &ITensor) -> Result<(), TensorError> {
        *self = add_scaled(self, rhs, -1.0)?;
        Ok(())
    }
}

duplicate! {
    [scalar scale;
     [f64] [scale];
     [Complex64] [scale_cplx]]

    impl MulAssign<scalar> for ITensor {
        fn mul_assign(&mut self, rhs: scalar) {
            // null stays null
            if let Ok(store) = self.storage_mut() {
                store.scale(rhs);
            }
        }
    }

    impl DivAssign<scalar> for ITensor {
        fn div_assign(&mut self, rhs: scalar) {
            *self *= 1.0 / rhs;
        }
    }

    impl Mul<scalar> for ITensor {
        type Output = ITensor;

        fn mul(mut self, rhs: scalar) -> ITensor {
            self *= rhs;
            self
        }
    }

    impl Mul<scalar> for &ITensor {
        type Output = ITensor;

        fn mul(self, rhs: scalar) -> ITensor {
            self.clone() * rhs
        }
    }

    impl Mul<ITensor> for scalar {
        type Output = ITensor;

        fn mul(self, rhs: ITensor) -> ITensor {
            rhs * self
        }
    }

    impl Mul<&ITensor> for scalar {
        type Output = ITensor;

        fn mul(self, rhs: &ITensor) -> ITensor {
            rhs * self
        }
    }

    impl Div<scalar> for ITensor {
        type Output = ITensor;

        fn div(mut self, rhs: scalar) -> ITensor {
            self /= rhs;
            self
        }
    }

    impl Div<scalar> for &ITensor {
        type Output = ITensor;

        fn div(self, rhs: scalar) -> ITensor {
            self.clone() / rhs
        }
    }
}

impl Neg for ITensor {
    type Output = ITensor;

    fn neg(self) -> ITensor {
        self * -1.0
    }
}

impl Neg for &ITensor {
    type Output = ITensor;

    fn neg(self) -> ITensor {
        self * -1.0
    }
}
