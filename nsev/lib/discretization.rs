//! Catalog of discretization schemes for the slow transform.
//!
//! Every scheme approximates the transfer matrix over one sampling step by one
//! or more exponentials of traceless 2×2 matrices. Schemes differ in how many
//! effective samples they need per original step (`d_scale`), in the
//! coefficient tables used to build those effective samples, and in their
//! formal order of accuracy.

use std::{ fmt, str::FromStr };
use num_complex::Complex64 as C64;
use serde::{ Deserialize, Serialize };
use crate::error::NftError;

/// Discretization scheme selector.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Discretization {
    /// Boffetta–Osborne exponential midpoint scheme.
    BO,
    /// Fourth-order commutator-free exponential integrator, two exponentials.
    CF4_2,
    /// Fourth-order commutator-free exponential integrator, three
    /// exponentials.
    CF4_3,
    /// Fifth-order commutator-free exponential integrator, three exponentials
    /// with complex coefficients.
    CF5_3,
    /// Sixth-order commutator-free exponential integrator, four exponentials
    /// with complex coefficients.
    CF6_4,
    /// Fourth-order exponential scheme using first and second derivatives of
    /// the signal.
    ES4,
    /// Transformed version of [`ES4`][Self::ES4] factored into three
    /// exponentials.
    TES4,
}

// quadrature nodes relative to the step midpoint, in units of the step size
pub(crate) const CF4_2_NODE: f64 = 0.288_675_134_594_812_9; // √3 / 6
pub(crate) const GAUSS3_NODE: f64 = 0.387_298_334_620_741_7; // √(3/20) = √15 / 10

const fn c(re: f64, im: f64) -> C64 { C64 { re, im } }

// rows: effective samples within one step; columns: (q(t - ch), q(t), q(t + ch))
pub(crate) const CF4_3_TABLE: [[C64; 3]; 3] = [
    [c(0.302556833188024, 0.0), c(-0.033333333333333, 0.0), c(0.005776500145310, 0.0)],
    [c(-0.030555555555556, 0.0), c(0.511111111111111, 0.0), c(-0.030555555555556, 0.0)],
    [c(0.005776500145310, 0.0), c(-0.033333333333333, 0.0), c(0.302556833188024, 0.0)],
];

pub(crate) const CF5_3_TABLE: [[C64; 3]; 3] = [
    [
        c(0.320333759788527, 0.055396500128741),
        c(-0.022222222222222, 0.066666666666667),
        c(0.001888462433695, -0.022063166795408),
    ],
    [
        c(-0.044444444444444, -0.077459666924148),
        c(0.488888888888889, 0.0),
        c(-0.044444444444444, 0.077459666924148),
    ],
    [
        c(0.001888462433695, 0.022063166795408),
        c(-0.022222222222222, -0.066666666666667),
        c(0.320333759788527, -0.055396500128741),
    ],
];

pub(crate) const CF6_4_TABLE: [[C64; 3]; 4] = [
    [
        c(0.245985577298764, 0.038734389227165),
        c(-0.046806149832549, 0.012442141491185),
        c(0.010894359342569, -0.004575808769067),
    ],
    [
        c(0.062868370946917, -0.048761268117765),
        c(0.269028372054771, -0.012442141491185),
        c(-0.041970529810473, 0.014602687659668),
    ],
    [
        c(-0.041970529810473, 0.014602687659668),
        c(0.269028372054771, -0.012442141491185),
        c(0.062868370946917, -0.048761268117765),
    ],
    [
        c(0.010894359342569, -0.004575808769067),
        c(-0.046806149832549, 0.012442141491185),
        c(0.245985577298764, 0.038734389227165),
    ],
];

// CF4_2 uses only the two outer nodes: (q(t - ch), q(t + ch))
pub(crate) const CF4_2_TABLE: [[C64; 2]; 2] = [
    [c(0.25 + CF4_2_NODE, 0.0), c(0.25 - CF4_2_NODE, 0.0)],
    [c(0.25 - CF4_2_NODE, 0.0), c(0.25 + CF4_2_NODE, 0.0)],
];

fn row_sums<const N: usize>(table: &[[C64; N]]) -> Vec<C64> {
    table.iter()
        .map(|row| row.iter().copied().fold(C64::new(0.0, 0.0), |acc, x| acc + x))
        .collect()
}

impl Discretization {
    /// All supported schemes.
    pub const ALL: [Self; 7] = [
        Self::BO,
        Self::CF4_2,
        Self::CF4_3,
        Self::CF5_3,
        Self::CF6_4,
        Self::ES4,
        Self::TES4,
    ];

    /// Number of effective samples per original sampling step.
    pub fn d_scale(self) -> usize {
        match self {
            Self::BO => 1,
            Self::CF4_2 => 2,
            Self::CF4_3 | Self::CF5_3 | Self::ES4 | Self::TES4 => 3,
            Self::CF6_4 => 4,
        }
    }

    /// Formal order of accuracy.
    pub fn order(self) -> u32 {
        match self {
            Self::BO => 2,
            Self::CF4_2 | Self::CF4_3 | Self::ES4 | Self::TES4 => 4,
            Self::CF5_3 => 5,
            Self::CF6_4 => 6,
        }
    }

    /// Offset, in units of the step size, of the effective window boundaries
    /// past the first and last sample.
    pub fn boundary_coeff(self) -> f64 { 0.5 }

    /// Return `true` if `self` is one of the commutator-free schemes.
    pub fn is_commutator_free(self) -> bool {
        matches!(self, Self::CF4_2 | Self::CF4_3 | Self::CF5_3 | Self::CF6_4)
    }

    /// Return `true` if `self` carries signal derivatives in its effective
    /// samples.
    pub fn uses_derivatives(self) -> bool {
        matches!(self, Self::ES4 | Self::TES4)
    }

    /// Weights multiplying λ in each exponential of one step.
    ///
    /// These are the row sums of the scheme's coefficient table and add up to
    /// one over a step. Schemes built from a single exponential per step have
    /// the single weight 1.
    pub fn lambda_weights(self) -> Vec<C64> {
        match self {
            Self::BO | Self::ES4 | Self::TES4 => vec![C64::new(1.0, 0.0)],
            Self::CF4_2 => row_sums(&CF4_2_TABLE[..]),
            Self::CF4_3 => row_sums(&CF4_3_TABLE[..]),
            Self::CF5_3 => row_sums(&CF5_3_TABLE[..]),
            Self::CF6_4 => row_sums(&CF6_4_TABLE[..]),
        }
    }

    /// Name used by [`FromStr`] and [`Display`][fmt::Display].
    pub fn name(self) -> &'static str {
        match self {
            Self::BO => "BO",
            Self::CF4_2 => "CF4_2",
            Self::CF4_3 => "CF4_3",
            Self::CF5_3 => "CF5_3",
            Self::CF6_4 => "CF6_4",
            Self::ES4 => "ES4",
            Self::TES4 => "TES4",
        }
    }
}

impl fmt::Display for Discretization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Discretization {
    type Err = NftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                NftError::invalid("discretization", format!("unknown scheme '{s}'"))
            })
    }
}
