//! Collection of all error types.
//!
//! All errors derive [`thiserror::Error`], making them composable when allowed
//! and compatible with application code using [`anyhow`][anyhow].
//!
//! [anyhow]: https://crates.io/crates/anyhow

use std::collections::TryReserveError;
use ndarray as nd;
use num_complex::Complex64 as C64;
use thiserror::Error;

/// Returned from every fallible routine in this crate.
///
/// The variants are coarse on purpose: they let a caller tell misuse
/// ([`InvalidArgument`][Self::InvalidArgument]) apart from numerical
/// degeneracy ([`DivByZero`][Self::DivByZero]) and resource exhaustion
/// ([`OutOfMemory`][Self::OutOfMemory]).
#[derive(Debug, Error)]
pub enum NftError {
    /// Returned when an argument is malformed.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Name of the offending argument.
        name: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// Returned when a working buffer could not be allocated.
    #[error("out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),

    /// Returned when a(λ) or a'(λ) is exactly zero where it is needed as a
    /// divisor.
    #[error("division by zero")]
    DivByZero,

    /// An error raised by an inner routine, re-surfaced unchanged.
    #[error("subroutine failed: {0}")]
    Subroutine(#[source] Box<NftError>),

    /// Anything else, e.g. an unexpected NaN.
    #[error("{0}")]
    Other(String),
}

impl NftError {
    pub(crate) fn invalid<R>(name: &'static str, reason: R) -> Self
    where R: Into<String>
    {
        Self::InvalidArgument { name, reason: reason.into() }
    }

    pub(crate) fn subroutine(err: Self) -> Self {
        Self::Subroutine(Box::new(err))
    }

    /// Return `true` if `self` is `InvalidArgument` for the named argument.
    pub fn is_invalid_argument(&self, arg: &str) -> bool {
        matches!(self, Self::InvalidArgument { name, .. } if *name == arg)
    }

    /// Return `true` if `self` is `DivByZero`, possibly wrapped in any number
    /// of `Subroutine` layers.
    pub fn is_div_by_zero(&self) -> bool {
        match self {
            Self::DivByZero => true,
            Self::Subroutine(inner) => inner.is_div_by_zero(),
            _ => false,
        }
    }

    pub(crate) fn check_num_samples(d: usize) -> Result<(), Self> {
        (d >= 2).then_some(())
            .ok_or(Self::invalid("q", format!("need at least 2 samples; got {d}")))
    }

    pub(crate) fn check_window(t: (f64, f64)) -> Result<(), Self> {
        (t.0.is_finite() && t.1.is_finite() && t.0 < t.1).then_some(())
            .ok_or(Self::invalid("t", format!("need t.0 < t.1; got {t:?}")))
    }

    pub(crate) fn check_eps_t(eps_t: f64) -> Result<(), Self> {
        (eps_t > 0.0).then_some(())
            .ok_or(Self::invalid("eps_t", format!("must be > 0; got {eps_t}")))
    }

    pub(crate) fn check_finite<S>(q: &nd::ArrayBase<S, nd::Ix1>)
        -> Result<(), Self>
    where S: nd::Data<Elem = C64>
    {
        q.iter().all(|qk| qk.is_finite()).then_some(())
            .ok_or(Self::invalid("q", "samples must be finite"))
    }

    pub(crate) fn check_xi<S>(xi: &nd::ArrayBase<S, nd::Ix1>)
        -> Result<(), Self>
    where S: nd::Data<Elem = f64>
    {
        let finite = xi.iter().all(|x| x.is_finite());
        let increasing
            = xi.iter().zip(xi.iter().skip(1)).all(|(l, r)| l < r);
        (finite && increasing).then_some(())
            .ok_or(Self::invalid("xi", "must be finite and strictly increasing"))
    }
}

/// Allocate a zero-filled buffer, reporting allocation failure instead of
/// aborting.
pub(crate) fn try_zeros(n: usize) -> Result<nd::Array1<C64>, NftError> {
    let mut buf: Vec<C64> = Vec::new();
    buf.try_reserve_exact(n)?;
    buf.resize(n, C64::new(0.0, 0.0));
    Ok(nd::Array1::from_vec(buf))
}
