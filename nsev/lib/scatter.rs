//! Slow direct scattering: transfer matrices of the Zakharov–Shabat system and
//! their derivatives with respect to the spectral parameter.
//!
//! Over one sampling step of size *h* every scheme applies one or more local
//! propagators of the form exp(Ω), where
//! ```text
//!     [ α   β ]
//! Ω = [ γ  -α ]
//! ```
//! is traceless. Since Ω² = *z* I with *z* = α² + βγ,
//! ```text
//! exp(Ω) = cosh(√z) I + (sinh(√z) / √z) Ω
//! ```
//! and the λ-derivative follows by the chain rule through *z*. The transfer
//! matrix is the ordered product of the local propagators, the first sample
//! being applied first; the derivative is carried alongside it as
//! ```text
//! dS ← dU S + U dS
//! S  ← U S
//! ```

use std::ops::{ Add, Mul, Range };
use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{
    Arr1,
    discretization::Discretization,
    error::NftError,
    resample::EffectiveSignal,
    utils::is_zero,
};

pub type ScatterResult<T> = Result<T, NftError>;

const I: C64 = C64 { re: 0.0, im: 1.0 };
const ZERO: C64 = C64 { re: 0.0, im: 0.0 };
const ONE: C64 = C64 { re: 1.0, im: 0.0 };

/// A 2×2 complex matrix, row-major.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Mat2(pub [[C64; 2]; 2]);

impl Mat2 {
    pub fn identity() -> Self { Self([[ONE, ZERO], [ZERO, ONE]]) }

    pub fn zeros() -> Self { Self([[ZERO, ZERO], [ZERO, ZERO]]) }

    pub fn det(&self) -> C64 {
        let m = &self.0;
        m[0][0] * m[1][1] - m[0][1] * m[1][0]
    }

    pub fn scale(&self, c: C64) -> Self {
        let m = &self.0;
        Self([[c * m[0][0], c * m[0][1]], [c * m[1][0], c * m[1][1]]])
    }

    pub fn s11(&self) -> C64 { self.0[0][0] }
    pub fn s12(&self) -> C64 { self.0[0][1] }
    pub fn s21(&self) -> C64 { self.0[1][0] }
    pub fn s22(&self) -> C64 { self.0[1][1] }
}

impl Mul for Mat2 {
    type Output = Mat2;

    fn mul(self, rhs: Mat2) -> Mat2 {
        let (a, b) = (&self.0, &rhs.0);
        Mat2([
            [
                a[0][0] * b[0][0] + a[0][1] * b[1][0],
                a[0][0] * b[0][1] + a[0][1] * b[1][1],
            ],
            [
                a[1][0] * b[0][0] + a[1][1] * b[1][0],
                a[1][0] * b[0][1] + a[1][1] * b[1][1],
            ],
        ])
    }
}

impl Add for Mat2 {
    type Output = Mat2;

    fn add(self, rhs: Mat2) -> Mat2 {
        let (a, b) = (&self.0, &rhs.0);
        Mat2([
            [a[0][0] + b[0][0], a[0][1] + b[0][1]],
            [a[1][0] + b[1][0], a[1][1] + b[1][1]],
        ])
    }
}

/// Transfer matrix at one value of the spectral parameter, with its
/// λ-derivative if requested.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScatterMatrix {
    pub s: Mat2,
    pub ds: Option<Mat2>,
}

// traceless generator [[α, β], [γ, -α]]
#[derive(Copy, Clone, Debug)]
struct Traceless {
    alpha: C64,
    beta: C64,
    gamma: C64,
}

impl Traceless {
    fn off_diagonal(beta: C64, gamma: C64) -> Self {
        Self { alpha: ZERO, beta, gamma }
    }

    fn z(&self) -> C64 { self.alpha * self.alpha + self.beta * self.gamma }

    fn matrix(&self) -> Mat2 {
        Mat2([[self.alpha, self.beta], [self.gamma, -self.alpha]])
    }
}

// below this |z|, cosh/sinh ratios are evaluated by their Taylor series
const SERIES_THRESHOLD: f64 = 1e-2;

// sinh(√z) / √z
fn sinhc(z: C64) -> C64 {
    if z.norm() < SERIES_THRESHOLD {
        // Σ z^n / (2n + 1)!
        ONE + z / 6.0 * (ONE + z / 20.0 * (ONE + z / 42.0 * (ONE + z / 72.0)))
    } else {
        let k = z.sqrt();
        k.sinh() / k
    }
}

// d/dz [sinh(√z) / √z] = (cosh(√z) - sinh(√z)/√z) / (2 z)
fn dsinhc(z: C64, cosh: C64, sinhc: C64) -> C64 {
    if z.norm() < SERIES_THRESHOLD {
        // Σ (n + 1) z^n / (2n + 3)!
        ONE / 6.0 + z / 60.0 + z * z / 1680.0 + z * z * z / 90720.0
            + z * z * z * z / 7983360.0
    } else {
        (cosh - sinhc) / (2.0 * z)
    }
}

fn expm(om: &Traceless) -> Mat2 {
    let z = om.z();
    let ch = z.sqrt().cosh();
    Mat2::identity().scale(ch) + om.matrix().scale(sinhc(z))
}

fn expm_with_derivative(om: &Traceless, dom: &Traceless) -> (Mat2, Mat2) {
    let z = om.z();
    let ch = z.sqrt().cosh();
    let g = sinhc(z);
    let dz = 2.0 * om.alpha * dom.alpha + dom.beta * om.gamma + om.beta * dom.gamma;
    let u = Mat2::identity().scale(ch) + om.matrix().scale(g);
    let du
        = Mat2::identity().scale(g / 2.0 * dz)
        + om.matrix().scale(dsinhc(z, ch, g) * dz)
        + dom.matrix().scale(g);
    (u, du)
}

// local propagator over one step, and optionally its λ-derivative; `q` and
// `r` hold the `d_scale` effective samples of the step
fn step(
    discretization: Discretization,
    weights: &[C64],
    h: f64,
    lambda: C64,
    q: &[C64],
    r: &[C64],
    derivative: bool,
) -> (Mat2, Mat2) {
    let apply = |om: Traceless, dom: Traceless| -> (Mat2, Mat2) {
        if derivative {
            expm_with_derivative(&om, &dom)
        } else {
            (expm(&om), Mat2::zeros())
        }
    };
    match discretization {
        Discretization::BO
        | Discretization::CF4_2
        | Discretization::CF4_3
        | Discretization::CF5_3
        | Discretization::CF6_4
        => {
            let mut u = Mat2::identity();
            let mut du = Mat2::zeros();
            let samples
                = q.iter().copied()
                .zip(r.iter().copied())
                .zip(weights.iter().copied());
            for ((qj, rj), wj) in samples {
                let om = Traceless {
                    alpha: -I * wj * lambda * h,
                    beta: h * qj,
                    gamma: h * rj,
                };
                let dom = Traceless {
                    alpha: -I * wj * h,
                    beta: ZERO,
                    gamma: ZERO,
                };
                let (uj, duj) = apply(om, dom);
                if derivative { du = duj * u + uj * du; }
                u = uj * u;
            }
            (u, du)
        },
        Discretization::ES4 => {
            let h3 = h * h * h;
            let om = Traceless {
                alpha: -I * lambda * h - h3 / 12.0 * (q[0] * r[1] - q[1] * r[0]),
                beta: h * q[0] + h3 / 24.0 * q[2] + I * lambda * h3 / 6.0 * q[1],
                gamma: h * r[0] + h3 / 24.0 * r[2] - I * lambda * h3 / 6.0 * r[1],
            };
            let dom = Traceless {
                alpha: -I * h,
                beta: I * h3 / 6.0 * q[1],
                gamma: -I * h3 / 6.0 * r[1],
            };
            apply(om, dom)
        },
        Discretization::TES4 => {
            let h2 = h * h;
            let h3 = h2 * h;
            let outer = |sign: f64| {
                expm(&Traceless::off_diagonal(
                    sign * h2 / 12.0 * q[1] + h3 / 48.0 * q[2],
                    sign * h2 / 12.0 * r[1] + h3 / 48.0 * r[2],
                ))
            };
            let om = Traceless {
                alpha: -I * lambda * h,
                beta: h * q[0],
                gamma: h * r[0],
            };
            let dom = Traceless { alpha: -I * h, beta: ZERO, gamma: ZERO };
            let (um, dum) = apply(om, dom);
            let ul = outer(1.0);
            let ur = outer(-1.0);
            (ul * um * ur, ul * dum * ur)
        },
    }
}

fn check_effective(eff: &EffectiveSignal) -> ScatterResult<()> {
    let d_scale = eff.discretization.d_scale();
    if eff.q.is_empty() || eff.q.len() % d_scale != 0 {
        return Err(NftError::invalid(
            "q",
            format!(
                "need a nonzero multiple of {d_scale} effective samples; got {}",
                eff.q.len(),
            ),
        ));
    }
    (eff.r.len() == eff.q.len()).then_some(())
        .ok_or(NftError::invalid("r", "length must match q"))
}

// product of the local propagators over a range of steps
fn propagate(
    eff: &EffectiveSignal,
    weights: &[C64],
    h: f64,
    lambda: C64,
    steps: Range<usize>,
    derivative: bool,
) -> (Mat2, Mat2) {
    let d_scale = eff.discretization.d_scale();
    let q = eff.q.as_slice();
    let r = eff.r.as_slice();
    let mut s = Mat2::identity();
    let mut ds = Mat2::zeros();
    for n in steps {
        let span = n * d_scale..(n + 1) * d_scale;
        let (u, du) = match (q, r) {
            (Some(q), Some(r)) => step(
                eff.discretization, weights, h, lambda,
                &q[span.clone()], &r[span], derivative,
            ),
            _ => {
                let qn: Vec<C64> = span.clone().map(|i| eff.q[i]).collect();
                let rn: Vec<C64> = span.map(|i| eff.r[i]).collect();
                step(eff.discretization, weights, h, lambda, &qn, &rn, derivative)
            },
        };
        if derivative { ds = du * s + u * ds; }
        s = u * s;
    }
    (s, ds)
}

/// Compute the transfer matrix of an effective signal with step size `eps_t`
/// for each of the spectral parameters `lambdas`, optionally with its
/// derivative with respect to λ.
pub fn scatter_matrix<S>(
    eff: &EffectiveSignal,
    eps_t: f64,
    lambdas: &Arr1<S>,
    derivative: bool,
) -> ScatterResult<Vec<ScatterMatrix>>
where S: nd::Data<Elem = C64>
{
    check_effective(eff)?;
    NftError::check_eps_t(eps_t)?;
    let weights = eff.discretization.lambda_weights();
    let n = eff.num_steps();
    let mut out: Vec<ScatterMatrix> = Vec::new();
    out.try_reserve_exact(lambdas.len())?;
    out.extend(
        lambdas.iter()
        .map(|&lambda| {
            let (s, ds) = propagate(eff, &weights, eps_t, lambda, 0..n, derivative);
            ScatterMatrix { s, ds: derivative.then_some(ds) }
        })
    );
    Ok(out)
}

/// Scattering data at a (candidate) bound state.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundStateCoeffs {
    /// a(λ).
    pub a: C64,
    /// a'(λ) = ∂a/∂λ.
    pub aprime: C64,
    /// b(λ); `None` if it was not requested.
    pub b: Option<C64>,
}

// index of the step at which the cumulative energy of the effective signal
// first reaches half its total
fn energy_midpoint(eff: &EffectiveSignal) -> usize {
    let d_scale = eff.discretization.d_scale();
    let n = eff.num_steps();
    let energy: Vec<f64>
        = (0..n)
        .map(|k| (0..d_scale).map(|j| eff.q[k * d_scale + j].norm_sqr()).sum::<f64>())
        .collect();
    let total: f64 = energy.iter().sum();
    if total == 0.0 { return n / 2; }
    let mut acc = 0.0;
    for (k, ek) in energy.iter().enumerate() {
        acc += ek;
        if acc >= total / 2.0 { return k; }
    }
    n / 2
}

/// Compute a(λ), a'(λ) and, unless `skip_b` is set, b(λ) for values of λ
/// close to bound states, for an effective signal spanning the window `t`.
///
/// The transfer matrix is split at the energy midpoint of the signal. The
/// left Jost solution is propagated forward to the split and the right one
/// backward, and b(λ) is taken as the ratio of the better-conditioned pair of
/// components. This avoids dividing by an a(λ) that is nearly zero at a
/// bound state.
pub fn scatter_bound_states(
    eff: &EffectiveSignal,
    t: (f64, f64),
    lambdas: &[C64],
    skip_b: bool,
) -> ScatterResult<Vec<BoundStateCoeffs>>
{
    let mut out: Vec<BoundStateCoeffs> = Vec::new();
    out.try_reserve_exact(lambdas.len())?;
    for &lambda in lambdas.iter() {
        out.push(scatter_bound_state(eff, t, lambda, skip_b)?);
    }
    Ok(out)
}

/// Like [`scatter_bound_states`], but for a single value of λ.
pub fn scatter_bound_state(
    eff: &EffectiveSignal,
    t: (f64, f64),
    lambda: C64,
    skip_b: bool,
) -> ScatterResult<BoundStateCoeffs>
{
    check_effective(eff)?;
    NftError::check_window(t)?;
    let n = eff.num_steps();
    NftError::check_num_samples(n)?;
    let eps_t = (t.1 - t.0) / (n - 1) as f64;
    let bc = eff.discretization.boundary_coeff();
    let t0 = t.0 - bc * eps_t;
    let t1 = t.1 + bc * eps_t;
    let len = t1 - t0;
    let split = energy_midpoint(eff);
    let weights = eff.discretization.lambda_weights();

    let (sl, dsl) = propagate(eff, &weights, eps_t, lambda, 0..split, true);
    let (sr, dsr) = propagate(eff, &weights, eps_t, lambda, split..n, true);
    let s = sr * sl;
    let ds = dsr * sl + sr * dsl;
    let phase_a = (I * lambda * len).exp();
    let a = s.s11() * phase_a;
    let aprime = (ds.s11() + I * len * s.s11()) * phase_a;
    let b
        = if skip_b {
            None
        } else {
            let (num, den)
                = if sr.s12().norm() > sr.s11().norm() {
                    (-sl.s11(), sr.s12())
                } else {
                    (sl.s21(), sr.s11())
                };
            if is_zero(den) { return Err(NftError::DivByZero); }
            Some(num / den * (-I * lambda * (t0 + t1)).exp())
        };
    Ok(BoundStateCoeffs { a, aprime, b })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ Kappa, resample::effective_signal };

    fn wavy(d: usize) -> nd::Array1<C64> {
        (0..d)
            .map(|k| 0.6 * C64::cis(k as f64 / 5.0) * (-(k as f64 - 8.0).powi(2) / 30.0).exp())
            .collect()
    }

    fn close(a: &Mat2, b: &Mat2, tol: f64) -> bool {
        a.0.iter().flatten().zip(b.0.iter().flatten())
            .all(|(x, y)| (x - y).norm() < tol)
    }

    #[test]
    fn zero_signal_is_free_propagation() {
        let q = nd::Array1::<C64>::zeros(8);
        let h = 0.1;
        let lam = C64::new(0.7, 0.0);
        for disc in Discretization::ALL {
            let eff = effective_signal(&q, h, Kappa::Focusing, 8, disc).unwrap();
            let sm = scatter_matrix(&eff, h, &nd::array![lam], true).unwrap();
            let l = 8.0 * h;
            let expected = Mat2([
                [(-I * lam * l).exp(), ZERO],
                [ZERO, (I * lam * l).exp()],
            ]);
            let dexpected = Mat2([
                [-I * l * (-I * lam * l).exp(), ZERO],
                [ZERO, I * l * (I * lam * l).exp()],
            ]);
            assert!(close(&sm[0].s, &expected, 1e-12), "{disc}");
            assert!(close(&sm[0].ds.unwrap(), &dexpected, 1e-12), "{disc}");
        }
    }

    #[test]
    fn transfer_matrix_is_unimodular() {
        let q = wavy(16);
        let lams = nd::array![C64::new(-1.3, 0.0), C64::new(0.4, 0.6)];
        for disc in Discretization::ALL {
            let eff = effective_signal(&q, 0.2, Kappa::Focusing, 16, disc).unwrap();
            for sm in scatter_matrix(&eff, 0.2, &lams, false).unwrap() {
                assert!((sm.s.det() - ONE).norm() < 1e-12, "{disc}");
                assert!(sm.ds.is_none());
            }
        }
    }

    #[test]
    fn derivative_matches_finite_difference() {
        let q = wavy(16);
        let delta = 1e-5;
        for disc in Discretization::ALL {
            let eff = effective_signal(&q, 0.2, Kappa::Focusing, 16, disc).unwrap();
            for lam in [C64::new(0.9, 0.0), C64::new(-0.2, 0.45)] {
                let lams = nd::array![lam, lam + delta, lam - delta];
                let sm = scatter_matrix(&eff, 0.2, &lams, true).unwrap();
                let fd = (sm[1].s + sm[2].s.scale(-ONE)).scale(C64::from(0.5 / delta));
                assert!(close(&sm[0].ds.unwrap(), &fd, 1e-6), "{disc}");
            }
        }
    }

    #[test]
    fn small_and_large_z_branches_agree() {
        let z = C64::new(SERIES_THRESHOLD * 0.999, 0.0);
        let k = z.sqrt();
        assert!((sinhc(z) - k.sinh() / k).norm() < 1e-15);
        let ch = k.cosh();
        let exact = (ch - k.sinh() / k) / (2.0 * z);
        assert!((dsinhc(z, ch, sinhc(z)) - exact).norm() < 1e-12);
    }

    #[test]
    fn bound_state_coeffs_of_zero_signal() {
        let q = nd::Array1::<C64>::zeros(10);
        let eff = effective_signal(&q, 0.5, Kappa::Focusing, 10, Discretization::BO)
            .unwrap();
        let lam = C64::new(0.3, 0.5);
        let coeffs = scatter_bound_states(&eff, (0.0, 4.5), &[lam], false).unwrap();
        assert!((coeffs[0].a - ONE).norm() < 1e-12);
        assert!(coeffs[0].aprime.norm() < 1e-10);
        assert_eq!(coeffs[0].b, Some(ZERO));
        let coeffs = scatter_bound_states(&eff, (0.0, 4.5), &[lam], true).unwrap();
        assert!(coeffs[0].b.is_none());
    }

    #[test]
    fn bound_state_coeffs_agree_with_transfer_matrix() {
        let q = wavy(16);
        let t = (-1.5, 1.5);
        let eps_t = 0.2;
        let lam = C64::new(0.1, 0.3);
        let eff = effective_signal(&q, eps_t, Kappa::Focusing, 16, Discretization::BO)
            .unwrap();
        let sm = scatter_matrix(&eff, eps_t, &nd::array![lam], true).unwrap();
        let coeffs = scatter_bound_states(&eff, t, &[lam], true).unwrap();
        let len = t.1 - t.0 + eps_t;
        let phase = (I * lam * len).exp();
        let a = sm[0].s.s11() * phase;
        let aprime = (sm[0].ds.unwrap().s11() + I * len * sm[0].s.s11()) * phase;
        assert!((coeffs[0].a - a).norm() < 1e-12);
        assert!((coeffs[0].aprime - aprime).norm() < 1e-12);
    }

    #[test]
    fn rejects_malformed_effective_signal() {
        let q = wavy(6);
        let mut eff = effective_signal(&q, 0.2, Kappa::Focusing, 6, Discretization::CF4_2)
            .unwrap();
        eff.q = eff.q.slice(nd::s![..11]).to_owned();
        let err = scatter_matrix(&eff, 0.2, &nd::array![ONE], false).unwrap_err();
        assert!(err.is_invalid_argument("q"));
    }
}
