//! Handing stored elements to user functions whose accepted argument types are only known at runtime.
//!
//! A tensor's storage is either real or complex, and a user function passed to
//! [`ITensor::apply`](crate::tensors::ITensor::apply) may only make sense for one of the two.
//! Such functions implement [`MaybeCall`] for every argument type they could be handed and report,
//! per call, whether they have a call form for it. [`invoke`] and its variants turn a missing call form
//! into [`InvokeError::UnsupportedOperation`].

use std::any::type_name;

use duplicate::duplicate;
use num::complex::Complex64;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
    #[error("object does not support {signature} for argument type {arg_type}")]
    UnsupportedOperation {
        signature: &'static str,
        arg_type: String,
    },
}

impl InvokeError {
    fn unsupported<A: ?Sized>(signature: &'static str) -> Self {
        InvokeError::UnsupportedOperation {
            signature,
            arg_type: type_name::<A>().to_string(),
        }
    }
}

/// A function that may or may not accept an argument of type `A`.
pub trait MaybeCall<A> {
    type Output;

    /// `None` if there is no call form for `A`.
    fn maybe_call(&mut self, arg: A) -> Option<Self::Output>;
}

/// A function that may or may not accept the argument pair `(A, B)`.
pub trait MaybeCall2<A, B> {
    type Output;

    fn maybe_call2(&mut self, a: A, b: B) -> Option<Self::Output>;
}

/// Calls `f(arg)` if `f` supports it.
///
/// # Errors
///
/// [`InvokeError::UnsupportedOperation`] if `f` has no call form for `A`.
pub fn invoke<A, F>(f: &mut F, arg: A) -> Result<F::Output, InvokeError>
where
    F: MaybeCall<A> + ?Sized,
{
    f.maybe_call(arg)
        .ok_or_else(|| InvokeError::unsupported::<A>("operator(v)->Ret"))
}

/// Like [`invoke`], discarding the result.
///
/// # Errors
///
/// [`InvokeError::UnsupportedOperation`] if `f` has no call form for `A`.
pub fn invoke_void<A, F>(f: &mut F, arg: A) -> Result<(), InvokeError>
where
    F: MaybeCall<A> + ?Sized,
{
    f.maybe_call(arg)
        .map(|_| ())
        .ok_or_else(|| InvokeError::unsupported::<A>("operator(v)"))
}

/// Calls `f(a, b)` if `f` supports it.
///
/// # Errors
///
/// [`InvokeError::UnsupportedOperation`] if `f` has no call form for `(A, B)`.
pub fn invoke2<A, B, F>(f: &mut F, a: A, b: B) -> Result<F::Output, InvokeError>
where
    F: MaybeCall2<A, B> + ?Sized,
{
    f.maybe_call2(a, b)
        .ok_or_else(|| InvokeError::unsupported::<(A, B)>("operator(v1,v2)->Ret"))
}

/// Like [`invoke2`], discarding the result.
///
/// # Errors
///
/// [`InvokeError::UnsupportedOperation`] if `f` has no call form for `(A, B)`.
pub fn invoke2_void<A, B, F>(f: &mut F, a: A, b: B) -> Result<(), InvokeError>
where
    F: MaybeCall2<A, B> + ?Sized,
{
    f.maybe_call2(a, b)
        .map(|_| ())
        .ok_or_else(|| InvokeError::unsupported::<(A, B)>("operator(v1,v2)"))
}

type Slot<'a, A, O> = Option<Box<dyn FnMut(A) -> O + 'a>>;
type Slot2<'a, A, O> = Option<Box<dyn FnMut(A, A) -> O + 'a>>;

/// An element function with an optional real and an optional complex call form.
///
/// `R` and `C` are the results of the real and complex forms. Element-wise maps use
/// `ScalarFn<f64, Complex64>`, visitors `ScalarFn<(), ()>`.
///
/// ```
/// # use itensor::invoke::{invoke, ScalarFn, InvokeError};
/// # use num::complex::Complex64;
/// let mut double = ScalarFn::<f64, Complex64>::real(|x| 2.0 * x);
/// assert_eq!(invoke(&mut double, 1.5_f64), Ok(3.0));
/// assert!(matches!(
///     invoke(&mut double, Complex64::new(0.0, 1.0)),
///     Err(InvokeError::UnsupportedOperation { .. })
/// ));
/// ```
pub struct ScalarFn<'a, R, C> {
    real: Slot<'a, f64, R>,
    complex: Slot<'a, Complex64, C>,
}

impl<'a, R, C> ScalarFn<'a, R, C> {
    /// Supports real arguments only
    pub fn real(f: impl FnMut(f64) -> R + 'a) -> Self {
        ScalarFn {
            real: Some(Box::new(f)),
            complex: None,
        }
    }

    /// Supports complex arguments only
    pub fn complex(f: impl FnMut(Complex64) -> C + 'a) -> Self {
        ScalarFn {
            real: None,
            complex: Some(Box::new(f)),
        }
    }

    pub fn both(
        real: impl FnMut(f64) -> R + 'a,
        complex: impl FnMut(Complex64) -> C + 'a,
    ) -> Self {
        ScalarFn {
            real: Some(Box::new(real)),
            complex: Some(Box::new(complex)),
        }
    }

    pub fn supports_real(&self) -> bool {
        self.real.is_some()
    }

    pub fn supports_complex(&self) -> bool {
        self.complex.is_some()
    }
}

duplicate! {
    [scalar field output;
     [f64] [real] [R];
     [Complex64] [complex] [C]]

    impl<R, C> MaybeCall<scalar> for ScalarFn<'_, R, C> {
        type Output = output;

        fn maybe_call(&mut self, arg: scalar) -> Option<output> {
            self.field.as_mut().map(|f| f(arg))
        }
    }
}

/// Two argument counterpart of [`ScalarFn`], used to combine pairs of elements of the same kind.
pub struct ScalarFn2<'a, R, C> {
    real: Slot2<'a, f64, R>,
    complex: Slot2<'a, Complex64, C>,
}

impl<'a, R, C> ScalarFn2<'a, R, C> {
    pub fn real(f: impl FnMut(f64, f64) -> R + 'a) -> Self {
        ScalarFn2 {
            real: Some(Box::new(f)),
            complex: None,
        }
    }

    pub fn complex(f: impl FnMut(Complex64, Complex64) -> C + 'a) -> Self {
        ScalarFn2 {
            real: None,
            complex: Some(Box::new(f)),
        }
    }

    pub fn both(
        real: impl FnMut(f64, f64) -> R + 'a,
        complex: impl FnMut(Complex64, Complex64) -> C + 'a,
    ) -> Self {
        ScalarFn2 {
            real: Some(Box::new(real)),
            complex: Some(Box::new(complex)),
        }
    }
}

duplicate! {
    [scalar field output;
     [f64] [real] [R];
     [Complex64] [complex] [C]]

    impl<R, C> MaybeCall2<scalar, scalar> for ScalarFn2<'_, R, C> {
        type Output = output;

        fn maybe_call2(&mut self, a: scalar, b: scalar) -> Option<output> {
            self.field.as_mut().map(|f| f(a, b))
        }
    }
}
