//! Provides functions and higher-level constructs for computing the
//! nonlinear Fourier transform (NFT) of signals governed by the nonlinear
//! Schrödinger equation with vanishing boundary conditions.
//!
//! The transform of a uniformly sampled signal *q*(*t*) is computed by direct
//! ("slow") multiplication of local transfer matrices of the Zakharov–Shabat
//! system and consists of
//! - the continuous spectrum: the reflection coefficient *ρ*(*ξ*) and/or the
//!   scattering coefficients *a*(*ξ*), *b*(*ξ*) on a real grid, and
//! - the discrete spectrum (focusing case only): bound states refined from
//!   initial guesses by Newton's method, together with their norming
//!   constants and/or residues.
//!
//! Provides implementations for the following discretizations:
//! - Boffetta–Osborne exponential midpoint (second order)
//! - Commutator-free exponential integrators CF4_2, CF4_3, CF5_3, CF6_4
//! - Fourth-order exponential schemes ES4 and TES4
//!
//! with optional Richardson extrapolation over two resolutions.
//!
//! See [`docs`] for theoretical background.

use serde::{ Deserialize, Serialize };

pub mod error;
pub mod utils;
pub mod discretization;
pub mod resample;
pub mod scatter;
pub mod contspec;
pub mod newton;
pub mod discspec;
pub mod richardson;
pub mod transform;

pub mod docs;

pub use crate::{
    discretization::Discretization,
    error::NftError,
    transform::{
        nsev,
        nsev_default_opts,
        xi_grid,
        BsLoc,
        ContSpec,
        CsType,
        DiscSpec,
        DsType,
        Filtering,
        Nft,
        NftResult,
        NsevOpts,
        Signal,
    },
};

pub(crate) const DEF_NITER: usize = 10;
pub(crate) const NEWTON_EPSILON: f64 = 100.0 * f64::EPSILON;
// bound states closer than this are merged
pub(crate) const MERGE_TOL: f64 = 1.490_116_119_384_765_6e-8; // √ε

pub type Arr1<S> = ndarray::ArrayBase<S, ndarray::Ix1>;

/// Sign convention of the nonlinearity.
///
/// The companion of the signal in the Zakharov–Shabat system is
/// *r*(*t*) = -*κ* *q*\*(*t*).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kappa {
    /// *κ* = +1 (anomalous dispersion); supports bound states.
    Focusing,
    /// *κ* = -1 (normal dispersion); no discrete spectrum.
    Defocusing,
}

impl Kappa {
    /// Numerical value of *κ*.
    pub fn sign(self) -> f64 {
        match self {
            Self::Focusing => 1.0,
            Self::Defocusing => -1.0,
        }
    }

    /// Return `true` if `self` is `Focusing`.
    pub fn is_focusing(self) -> bool { matches!(self, Self::Focusing) }
}

impl TryFrom<i32> for Kappa {
    type Error = NftError;

    fn try_from(k: i32) -> Result<Self, Self::Error> {
        match k {
            1 => Ok(Self::Focusing),
            -1 => Ok(Self::Defocusing),
            _ => Err(NftError::invalid("kappa", format!("must be +1 or -1; got {k}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kappa_from_int() {
        assert_eq!(Kappa::try_from(1).unwrap(), Kappa::Focusing);
        assert_eq!(Kappa::try_from(-1).unwrap(), Kappa::Defocusing);
        assert!(Kappa::try_from(0).unwrap_err().is_invalid_argument("kappa"));
        assert_eq!(Kappa::Defocusing.sign(), -1.0);
    }

    #[test]
    fn merge_tol_is_sqrt_epsilon() {
        assert!((MERGE_TOL - f64::EPSILON.sqrt()).abs() < 1e-22);
    }
}
