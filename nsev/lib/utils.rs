//! Miscellaneous tools: quadrature, FFTs, band-limited resampling, and the
//! filter/merge utilities used on bound states.

use std::f64::consts::TAU;
use ndarray::{ self as nd, Ix1, concatenate };
use num_complex::Complex64 as C64;
use num_traits::Zero;
use rustfft as fft;
use crate::{
    Arr1,
    error::{ NftError, try_zeros },
};

/// Integrate using the trapezoidal rule.
///
/// *Panics if `y` has length less than 2*.
pub fn trapz<S>(y: &nd::ArrayBase<S, Ix1>, dx: f64) -> f64
where S: nd::Data<Elem = f64>
{
    let n: usize = y.len();
    (dx / 2.0) * (y[0] + 2.0 * y.slice(nd::s![1..n - 1]).sum() + y[n - 1])
}

/// Squared L² norm of a signal sampled uniformly over the window `t`,
/// computed with the trapezoidal rule.
///
/// *Panics if `q` has length less than 2*.
pub fn l2norm2<S>(q: &Arr1<S>, t: (f64, f64)) -> f64
where S: nd::Data<Elem = C64>
{
    let dt = (t.1 - t.0) / (q.len() - 1) as f64;
    trapz(&q.mapv(|qk| qk.norm_sqr()), dt)
}

/// Generate an array of frequency-space coordinates to accompany a FFT of `n`
/// points for sampling time `dt`.
pub fn fft_freq(n: usize, dt: f64) -> nd::Array1<f64> {
    let fp: nd::Array1<f64>
        = (0..(n + 1) / 2)
        .map(|k| k as f64 / (n as f64 * dt))
        .collect();
    let fm: nd::Array1<f64>
        = (1..n / 2 + 1).rev()
        .map(|k| -(k as f64) / (n as f64 * dt))
        .collect();
    concatenate!(nd::Axis(0), fp, fm)
}

fn to_buffer<S>(x: &Arr1<S>) -> Result<Vec<C64>, NftError>
where S: nd::Data<Elem = C64>
{
    let mut buf: Vec<C64> = Vec::new();
    buf.try_reserve_exact(x.len())?;
    buf.extend(x.iter().copied());
    Ok(buf)
}

/// Perform the one-dimensional, complex-valued FFT.
pub fn fft<S>(x: &Arr1<S>) -> Result<nd::Array1<C64>, NftError>
where S: nd::Data<Elem = C64>
{
    let mut f = to_buffer(x)?;
    let mut plan = fft::FftPlanner::new();
    plan.plan_fft_forward(f.len()).process(&mut f);
    Ok(nd::Array1::from_vec(f))
}

/// Perform the one-dimensional, complex-valued inverse FFT.
pub fn ifft<S>(f: &Arr1<S>) -> Result<nd::Array1<C64>, NftError>
where S: nd::Data<Elem = C64>
{
    let mut x = to_buffer(f)?;
    let n = x.len() as f64;
    let mut plan = fft::FftPlanner::new();
    plan.plan_fft_inverse(x.len()).process(&mut x);
    x.iter_mut().for_each(|xk| { *xk /= n; });
    Ok(nd::Array1::from_vec(x))
}

/// Shift a uniformly sampled signal in time by band-limited (trigonometric)
/// interpolation, returning samples of `q(t + delta)` on the original grid.
///
/// The signal is treated as one period of a periodic function, so it should
/// have decayed at both ends of the window. For an even number of samples the
/// Nyquist component is shifted by a real factor so that real signals stay
/// real.
pub fn resample<S>(q: &Arr1<S>, eps_t: f64, delta: f64)
    -> Result<nd::Array1<C64>, NftError>
where S: nd::Data<Elem = C64>
{
    NftError::check_eps_t(eps_t)?;
    let n = q.len();
    if n == 0 { return try_zeros(0); }
    let freq = fft_freq(n, eps_t);
    let mut spec = fft(q)?;
    spec.iter_mut().zip(&freq).enumerate()
        .for_each(|(k, (sk, fk))| {
            if n % 2 == 0 && k == n / 2 {
                *sk *= (TAU * fk * delta).cos();
            } else {
                *sk *= C64::cis(TAU * fk * delta);
            }
        });
    ifft(&spec)
}

/// Rectangular admissible region for bound states.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub re_min: f64,
    pub re_max: f64,
    pub im_min: f64,
    pub im_max: f64,
}

impl BoundingBox {
    /// The closed upper half-plane.
    pub fn upper_half_plane() -> Self {
        Self {
            re_min: f64::NEG_INFINITY,
            re_max: f64::INFINITY,
            im_min: 0.0,
            im_max: f64::INFINITY,
        }
    }

    /// Return `true` if `z` lies in the (closed) box.
    pub fn contains(&self, z: C64) -> bool {
        (self.re_min..=self.re_max).contains(&z.re)
            && (self.im_min..=self.im_max).contains(&z.im)
    }
}

/// Return the values lying inside `bbox`, in their original order.
///
/// Values outside the box are dropped, never moved into it. Returns
/// [`NftError::Other`] if a value is NaN.
pub fn filter_bounding_box(vals: &[C64], bbox: &BoundingBox)
    -> Result<Vec<C64>, NftError>
{
    if vals.iter().any(|z| z.is_nan()) {
        return Err(NftError::Other("encountered NaN while filtering".into()));
    }
    Ok(vals.iter().copied().filter(|z| bbox.contains(*z)).collect())
}

/// Remove near-duplicates: scanning in index order, every value closer than
/// `tol` to an earlier surviving value is dropped, so the first of each
/// cluster is kept.
pub fn merge(vals: &[C64], tol: f64) -> Vec<C64> {
    let mut kept: Vec<C64> = Vec::with_capacity(vals.len());
    for z in vals.iter().copied() {
        if kept.iter().all(|k| (z - *k).norm() >= tol) { kept.push(z); }
    }
    kept
}

/// Complex number that is exactly zero.
pub(crate) fn is_zero(z: C64) -> bool { z.is_zero() }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trapz_integrates_linear_exactly() {
        let x: nd::Array1<f64> = nd::Array1::linspace(0.0, 2.0, 11);
        assert!((trapz(&x, 0.2) - 2.0).abs() < 1e-14);
    }

    #[test]
    fn fft_freq_layout() {
        let f = fft_freq(4, 0.5);
        assert_eq!(f.to_vec(), vec![0.0, 0.5, -1.0, -0.5]);
        let f = fft_freq(5, 1.0);
        assert_eq!(f.to_vec(), vec![0.0, 0.2, 0.4, -0.4, -0.2]);
    }

    #[test]
    fn resample_shifts_band_limited_tone() {
        let n = 32;
        let dt = 0.5;
        let f0 = 3.0 / (n as f64 * dt);
        let delta = 0.3 * dt;
        let q: nd::Array1<C64>
            = (0..n).map(|k| C64::cis(TAU * f0 * k as f64 * dt)).collect();
        let shifted = resample(&q, dt, delta).unwrap();
        shifted.iter().enumerate()
            .for_each(|(k, sk)| {
                let exact = C64::cis(TAU * f0 * (k as f64 * dt + delta));
                assert!((sk - exact).norm() < 1e-12);
            });
    }

    #[test]
    fn resample_keeps_constants() {
        let q = nd::Array1::from_elem(9, C64::new(0.7, -0.2));
        let shifted = resample(&q, 0.1, 0.037).unwrap();
        assert!(shifted.iter().all(|s| (s - q[0]).norm() < 1e-14));
    }

    #[test]
    fn filter_drops_instead_of_clipping() {
        let bbox = BoundingBox { re_min: -1.0, re_max: 1.0, im_min: 0.0, im_max: 2.0 };
        let vals = [
            C64::new(0.0, 0.5),
            C64::new(1.5, 0.5),
            C64::new(0.2, -0.1),
            C64::new(-1.0, 2.0),
        ];
        let kept = filter_bounding_box(&vals, &bbox).unwrap();
        assert_eq!(kept, vec![C64::new(0.0, 0.5), C64::new(-1.0, 2.0)]);
        let nan = [C64::new(f64::NAN, 0.0)];
        assert!(filter_bounding_box(&nan, &bbox).is_err());
    }

    #[test]
    fn merge_keeps_first_of_cluster() {
        let vals = [
            C64::new(0.0, 0.5),
            C64::new(1.0, 1.0),
            C64::new(1e-10, 0.5),
            C64::new(0.0, 0.5 + 1e-9),
        ];
        let merged = merge(&vals, 1e-8);
        assert_eq!(merged, vec![C64::new(0.0, 0.5), C64::new(1.0, 1.0)]);
    }
}
