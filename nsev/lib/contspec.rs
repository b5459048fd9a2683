//! Assembly of the continuous spectrum from transfer matrices on a real grid.

use ndarray as nd;
use num_complex::Complex64 as C64;
use serde::{ Deserialize, Serialize };
use crate::{
    Arr1,
    error::{ NftError, try_zeros },
    scatter::ScatterMatrix,
    utils::is_zero,
};

pub type ContSpecResult<T> = Result<T, NftError>;

/// Kind of continuous spectrum to compute.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CsType {
    /// Reflection coefficient *ρ*(*ξ*) = *b*(*ξ*) / *a*(*ξ*).
    #[default]
    ReflectionCoefficient,
    /// Scattering coefficients *a*(*ξ*) and *b*(*ξ*).
    AB,
    /// All of the above.
    Both,
}

impl CsType {
    /// Return `true` if the reflection coefficient is requested.
    pub fn wants_rho(self) -> bool { matches!(self, Self::ReflectionCoefficient | Self::Both) }

    /// Return `true` if the scattering coefficients are requested.
    pub fn wants_ab(self) -> bool { matches!(self, Self::AB | Self::Both) }
}

/// Continuous spectrum on a grid of real *ξ*.
///
/// A field is `None` exactly when the corresponding quantity was not
/// requested.
#[derive(Clone, Debug, PartialEq)]
pub struct ContSpec {
    /// Reflection coefficient.
    pub rho: Option<nd::Array1<C64>>,
    /// Scattering coefficient *a*.
    pub a: Option<nd::Array1<C64>>,
    /// Scattering coefficient *b*.
    pub b: Option<nd::Array1<C64>>,
}

/// Boundary phase factors for a window `t` with step `eps_t` and boundary
/// coefficient `bc`.
///
/// The window seen by the transfer matrix is extended by `bc * eps_t` on both
/// sides; the phases remove the free-space oscillation over the extended
/// window so that the coefficients refer to the asymptotic Jost solutions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Phases {
    pub rho: f64,
    pub a: f64,
    pub b: f64,
}

impl Phases {
    pub fn new(t: (f64, f64), eps_t: f64, bc: f64) -> Self {
        let t0 = t.0 - bc * eps_t;
        let t1 = t.1 + bc * eps_t;
        Self { rho: -2.0 * t1, a: t1 - t0, b: -t1 - t0 }
    }
}

/// Assemble the continuous spectrum of kind `kind` from the transfer matrices
/// `sm` evaluated at the real grid `xi`.
///
/// Returns [`NftError::DivByZero`] if the reflection coefficient is requested
/// and a (1,1) entry is exactly zero, and [`NftError::InvalidArgument`] if the
/// numbers of matrices and grid points differ.
pub fn assemble<S>(
    sm: &[ScatterMatrix],
    xi: &Arr1<S>,
    phases: Phases,
    kind: CsType,
) -> ContSpecResult<ContSpec>
where S: nd::Data<Elem = f64>
{
    if sm.len() != xi.len() {
        return Err(NftError::invalid(
            "xi",
            format!("got {} grid points for {} transfer matrices", xi.len(), sm.len()),
        ));
    }
    let m = xi.len();
    let phase = |x: f64, p: f64| C64::cis(x * p);

    let rho
        = if kind.wants_rho() {
            let mut rho = try_zeros(m)?;
            for ((rk, smk), &x) in rho.iter_mut().zip(sm).zip(xi) {
                if is_zero(smk.s.s11()) { return Err(NftError::DivByZero); }
                *rk = smk.s.s21() / smk.s.s11() * phase(x, phases.rho);
            }
            Some(rho)
        } else {
            None
        };
    let (a, b)
        = if kind.wants_ab() {
            let mut a = try_zeros(m)?;
            let mut b = try_zeros(m)?;
            let iter = a.iter_mut().zip(b.iter_mut()).zip(sm).zip(xi);
            for (((ak, bk), smk), &x) in iter {
                *ak = smk.s.s11() * phase(x, phases.a);
                *bk = smk.s.s21() * phase(x, phases.b);
            }
            (Some(a), Some(b))
        } else {
            (None, None)
        };
    Ok(ContSpec { rho, a, b })
}
