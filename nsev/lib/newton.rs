//! Newton refinement of bound-state candidates.
//!
//! Each candidate λ is refined independently by iterating
//! ```text
//! λ ← λ - a(λ) / a'(λ)
//! ```
//! until the step falls below `100 ε`, the iteration budget is spent, or the
//! estimate leaves the admissible region
//! ```text
//! |Re λ| ≤ 0.9 π / (2 eps_t)
//!  0 ≤ Im λ ≤ energy_bound
//! ```
//! Estimates that leave the region are reported as they are; removing them is
//! left to [`discspec`][crate::discspec].

use std::f64::consts::PI;
use num_complex::Complex64 as C64;
use crate::{
    NEWTON_EPSILON,
    error::NftError,
    resample::EffectiveSignal,
    scatter::scatter_bound_state,
    utils::{ BoundingBox, is_zero },
};

pub type NewtonResult<T> = Result<T, NftError>;

/// Final state of one Newton refinement.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NewtonOutcome {
    /// The last step was below the convergence threshold.
    Converged,
    /// The estimate left the admissible region.
    OutOfBounds,
    /// The iteration budget was spent (including a budget of zero).
    BudgetExhausted,
}

/// A refined bound-state candidate.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Refined {
    /// Final estimate.
    pub lambda: C64,
    /// Number of Newton steps taken.
    pub iters: usize,
    /// Why refinement stopped.
    pub outcome: NewtonOutcome,
}

/// Largest |Re λ| resolvable with step `eps_t`.
pub fn re_bound(eps_t: f64) -> f64 { 0.9 * PI / (2.0 * eps_t) }

/// Admissible region for bound states of a signal sampled with step `eps_t`
/// and with energy bound `energy_bound` on the imaginary parts.
pub fn admissible_region(eps_t: f64, energy_bound: f64) -> BoundingBox {
    let re = re_bound(eps_t);
    BoundingBox { re_min: -re, re_max: re, im_min: 0.0, im_max: energy_bound }
}

/// Refine each of `guesses` for the effective signal `eff` spanning the window
/// `t`, with at most `niter` steps each.
///
/// Returns [`NftError::DivByZero`] if a'(λ) vanishes at an iterate; failures
/// of the underlying scattering computation are wrapped in
/// [`NftError::Subroutine`].
pub fn refine_roots_newton(
    eff: &EffectiveSignal,
    t: (f64, f64),
    guesses: &[C64],
    niter: usize,
    energy_bound: f64,
) -> NewtonResult<Vec<Refined>>
{
    let mut out: Vec<Refined> = Vec::new();
    out.try_reserve_exact(guesses.len())?;
    if niter == 0 {
        out.extend(
            guesses.iter()
            .map(|&lambda| {
                Refined { lambda, iters: 0, outcome: NewtonOutcome::BudgetExhausted }
            })
        );
        return Ok(out);
    }
    let n = eff.num_steps().max(2);
    let eps_t = (t.1 - t.0) / (n - 1) as f64;
    let region = admissible_region(eps_t, energy_bound);

    for &guess in guesses.iter() {
        let mut lambda = guess;
        let mut iters: usize = 0;
        let outcome
            = loop {
                let coeffs = scatter_bound_state(eff, t, lambda, true)
                    .map_err(NftError::subroutine)?;
                if is_zero(coeffs.aprime) { return Err(NftError::DivByZero); }
                let step = coeffs.a / coeffs.aprime;
                lambda -= step;
                iters += 1;
                if !region.contains(lambda) {
                    tracing::warn!(
                        guess = %guess, estimate = %lambda, iters,
                        "newton iterate left the admissible region"
                    );
                    break NewtonOutcome::OutOfBounds;
                }
                if step.norm() <= NEWTON_EPSILON { break NewtonOutcome::Converged; }
                if iters >= niter { break NewtonOutcome::BudgetExhausted; }
            };
        tracing::debug!(guess = %guess, estimate = %lambda, iters, ?outcome, "newton");
        out.push(Refined { lambda, iters, outcome });
    }
    Ok(out)
}
