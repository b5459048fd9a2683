//! Construction of the effective signal fed to the transfer-matrix recursion.
//!
//! Depending on the [`Discretization`], each (possibly downsampled) original
//! sample is replaced by one to four effective samples: plain samples, linear
//! combinations of band-limited interpolants at quadrature nodes inside the
//! step, or the sample together with finite-difference estimates of its first
//! and second derivatives.

use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{
    Arr1,
    Kappa,
    discretization::{
        Discretization,
        CF4_2_NODE,
        GAUSS3_NODE,
        CF4_2_TABLE,
        CF4_3_TABLE,
        CF5_3_TABLE,
        CF6_4_TABLE,
    },
    error::{ NftError, try_zeros },
    utils,
};

pub type ResampleResult<T> = Result<T, NftError>;

/// Effective signal and its companion sequence for one resolution level.
#[derive(Clone, Debug)]
pub struct EffectiveSignal {
    /// Effective samples of q, length `d_sub * discretization.d_scale()`.
    pub q: nd::Array1<C64>,
    /// Effective samples of the companion r = -κ q*.
    pub r: nd::Array1<C64>,
    /// Number of original samples actually used.
    pub d_sub: usize,
    /// Original indices of the first and last sample used.
    pub first_last_index: (usize, usize),
    /// Scheme the samples were built for.
    pub discretization: Discretization,
}

impl EffectiveSignal {
    /// Number of sampling steps (`d_sub`).
    pub fn num_steps(&self) -> usize { self.q.len() / self.discretization.d_scale() }

    /// Time window spanned by the samples actually used, given the original
    /// window `t` and step `eps_t`.
    pub fn window(&self, t: (f64, f64), eps_t: f64) -> (f64, f64) {
        (
            t.0 + self.first_last_index.0 as f64 * eps_t,
            t.0 + self.first_last_index.1 as f64 * eps_t,
        )
    }
}

/// Compute the downsampling stride and the achieved number of samples for a
/// desired number `d_sub` of samples out of `d`.
///
/// The desired count is clamped to `[2, d]`.
pub fn downsampling_stride(d: usize, d_sub: usize) -> (usize, usize) {
    let target = d_sub.clamp(2, d.max(2));
    let nskip = ((d as f64 / target as f64).round() as usize).max(1);
    let achieved = (d as f64 / nskip as f64).round() as usize;
    (nskip, achieved)
}

fn companion(q: C64, kappa: Kappa) -> C64 { -kappa.sign() * q.conj() }

fn combine<const N: usize>(row: &[C64; N], vals: &[C64; N]) -> C64 {
    row.iter().zip(vals).map(|(c, v)| c * v).sum()
}

/// Build the effective signal for `discretization` from `d` samples `q` with
/// step `eps_t`, keeping roughly `d_sub` of them.
///
/// Returns [`NftError::InvalidArgument`] for fewer than 2 samples, a
/// non-positive step, or (for [`ES4`][Discretization::ES4] and
/// [`TES4`][Discretization::TES4]) fewer than 3 retained samples.
pub fn effective_signal<S>(
    q: &Arr1<S>,
    eps_t: f64,
    kappa: Kappa,
    d_sub: usize,
    discretization: Discretization,
) -> ResampleResult<EffectiveSignal>
where S: nd::Data<Elem = C64>
{
    let d = q.len();
    NftError::check_num_samples(d)?;
    NftError::check_eps_t(eps_t)?;

    let (nskip, d_sub) = downsampling_stride(d, d_sub);
    if (d_sub - 1) * nskip > d - 1 {
        return Err(NftError::Other(
            format!("downsampling stride {nskip} overruns {d} samples")
        ));
    }
    // derivatives need a neighbor on either side of the interior
    if discretization.uses_derivatives() && d_sub < 3 {
        return Err(NftError::invalid(
            "d_sub",
            format!("{discretization} needs at least 3 samples; got {d_sub}"),
        ));
    }
    let d_scale = discretization.d_scale();
    let d_eff = d_sub * d_scale;
    let mut q_eff = try_zeros(d_eff)?;
    let mut r_eff = try_zeros(d_eff)?;
    let h = eps_t * nskip as f64;
    tracing::debug!(
        d, d_sub, nskip, d_eff, %discretization,
        "building effective signal"
    );

    let sub = |k: usize| k * nskip;
    match discretization {
        Discretization::BO => {
            for k in 0..d_sub {
                q_eff[k] = q[sub(k)];
                r_eff[k] = companion(q[sub(k)], kappa);
            }
        },
        Discretization::CF4_2 => {
            let q1 = utils::resample(q, eps_t, -CF4_2_NODE * h)?;
            let q2 = utils::resample(q, eps_t, CF4_2_NODE * h)?;
            for k in 0..d_sub {
                let nodes = [q1[sub(k)], q2[sub(k)]];
                for (j, row) in CF4_2_TABLE.iter().enumerate() {
                    let i = k * d_scale + j;
                    q_eff[i] = combine(row, &nodes);
                    r_eff[i] = companion(q_eff[i], kappa);
                }
            }
        },
        Discretization::CF4_3 => {
            let q1 = utils::resample(q, eps_t, -GAUSS3_NODE * h)?;
            let q3 = utils::resample(q, eps_t, GAUSS3_NODE * h)?;
            for k in 0..d_sub {
                let nodes = [q1[sub(k)], q[sub(k)], q3[sub(k)]];
                for (j, row) in CF4_3_TABLE.iter().enumerate() {
                    let i = k * d_scale + j;
                    q_eff[i] = combine(row, &nodes);
                    r_eff[i] = companion(q_eff[i], kappa);
                }
            }
        },
        Discretization::CF5_3 | Discretization::CF6_4 => {
            let table: &[[C64; 3]]
                = if discretization == Discretization::CF5_3 {
                    &CF5_3_TABLE
                } else {
                    &CF6_4_TABLE
                };
            let q1 = utils::resample(q, eps_t, -GAUSS3_NODE * h)?;
            let q3 = utils::resample(q, eps_t, GAUSS3_NODE * h)?;
            // complex coefficients: r is combined from its own nodes
            for k in 0..d_sub {
                let nodes = [q1[sub(k)], q[sub(k)], q3[sub(k)]];
                let rnodes = nodes.map(|x| companion(x, kappa));
                for (j, row) in table.iter().enumerate() {
                    let i = k * d_scale + j;
                    q_eff[i] = combine(row, &nodes);
                    r_eff[i] = combine(row, &rnodes);
                }
            }
        },
        Discretization::ES4 | Discretization::TES4 => {
            fill_derivatives(q, nskip, d_sub, h, &mut q_eff);
            q_eff.iter().zip(r_eff.iter_mut())
                .for_each(|(qk, rk)| { *rk = companion(*qk, kappa); });
        },
    }

    Ok(EffectiveSignal {
        q: q_eff,
        r: r_eff,
        d_sub,
        first_last_index: (0, (d_sub - 1) * nskip),
        discretization,
    })
}

// lay out (q, q', q'') triples; central differences in the interior, one-sided
// at both ends
fn fill_derivatives<S>(
    q: &Arr1<S>,
    nskip: usize,
    d_sub: usize,
    h: f64,
    q_eff: &mut nd::Array1<C64>,
)
where S: nd::Data<Elem = C64>
{
    let h2 = h * h;
    let x = |k: usize| q[k * nskip];
    let n = d_sub - 1;
    for k in 0..d_sub {
        let (d1, d2)
            = if k == 0 {
                ((x(1) - x(0)) / h, (x(2) - 2.0 * x(1) + x(0)) / h2)
            } else if k == n {
                ((x(n) - x(n - 1)) / h, (x(n) - 2.0 * x(n - 1) + x(n - 2)) / h2)
            } else {
                ((x(k + 1) - x(k - 1)) / (2.0 * h), (x(k + 1) - 2.0 * x(k) + x(k - 1)) / h2)
            };
        q_eff[3 * k] = x(k);
        q_eff[3 * k + 1] = d1;
        q_eff[3 * k + 2] = d2;
    }
}
