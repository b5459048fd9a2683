//! Richardson extrapolation of two transforms computed at different
//! resolutions.
//!
//! If a quantity is computed with error *O*(*h*^*p*) at step sizes *h* and
//! *h*' = *h* *D* / *D*<sub>sub</sub>, the combination
//! ```text
//!     s X(h) - X(h')
//! X = --------------,   s = (D / D_sub)^p
//!         s - 1
//! ```
//! cancels the leading error term.

use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{
    Arr1,
    contspec::ContSpec,
    discspec::BoundStateData,
};

/// Scale factor *s* for full and coarse sample counts `d` and `d_sub` and a
/// scheme of order `order`.
pub fn richardson_scale(d: usize, d_sub: usize, order: u32) -> f64 {
    (d as f64 / d_sub as f64).powi(order as i32)
}

/// Combine a full-resolution value with its coarse counterpart.
pub fn extrapolate(full: C64, coarse: C64, scale: f64) -> C64 {
    (scale * full - coarse) / (scale - 1.0)
}

/// Index of the entry of `coarse` nearest to `lambda` in relative distance
/// `|lambda - c| / |lambda|`, if that distance is below `threshold`.
///
/// The first of several equally near entries is returned.
pub fn match_bound_state(lambda: C64, coarse: &[C64], threshold: f64) -> Option<usize> {
    let mut best: Option<usize> = None;
    let mut dist_min = threshold;
    let norm = lambda.norm();
    for (j, c) in coarse.iter().enumerate() {
        let dist = (lambda - c).norm() / norm;
        if dist < dist_min {
            dist_min = dist;
            best = Some(j);
        }
    }
    best
}

fn extrapolate_array<S>(
    full: &mut nd::Array1<C64>,
    coarse: &nd::Array1<C64>,
    xi: &Arr1<S>,
    re_bound_sub: f64,
    scale: f64,
)
where S: nd::Data<Elem = f64>
{
    full.iter_mut().zip(coarse).zip(xi)
        .filter(|(_, x)| x.abs() < re_bound_sub)
        .for_each(|((f, c), _)| { *f = extrapolate(*f, *c, scale); });
}

/// Extrapolate every field present in both `full` and `coarse` in place,
/// wherever `|xi| < re_bound_sub`; elsewhere the full-resolution value is
/// kept.
pub fn extrapolate_contspec<S>(
    full: &mut ContSpec,
    coarse: &ContSpec,
    xi: &Arr1<S>,
    re_bound_sub: f64,
    scale: f64,
)
where S: nd::Data<Elem = f64>
{
    let pairs = [
        (&mut full.rho, &coarse.rho),
        (&mut full.a, &coarse.a),
        (&mut full.b, &coarse.b),
    ];
    for (f, c) in pairs {
        if let (Some(f), Some(c)) = (f.as_mut(), c.as_ref()) {
            extrapolate_array(f, c, xi, re_bound_sub, scale);
        }
    }
}

/// Extrapolate bound states in place, pairing each with its nearest coarse
/// counterpart within relative distance `threshold`. If `with_aprimes`, a'(λ)
/// is extrapolated too. Unmatched bound states keep their full-resolution
/// values.
pub(crate) fn extrapolate_bound_states(
    full: &mut BoundStateData,
    coarse: &BoundStateData,
    threshold: f64,
    scale: f64,
    with_aprimes: bool,
) {
    for (i, lambda) in full.bound_states.iter_mut().enumerate() {
        match match_bound_state(*lambda, &coarse.bound_states, threshold) {
            Some(j) => {
                tracing::debug!(full = %lambda, coarse = %coarse.bound_states[j], "matched");
                *lambda = extrapolate(*lambda, coarse.bound_states[j], scale);
                if with_aprimes {
                    full.aprimes[i]
                        = extrapolate(full.aprimes[i], coarse.aprimes[j], scale);
                }
            },
            None => {
                tracing::warn!(
                    bound_state = %lambda,
                    "no coarse counterpart; keeping unextrapolated value"
                );
            },
        }
    }
}
