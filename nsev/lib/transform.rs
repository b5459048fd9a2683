//! Options, validation, and the main entry point of the transform.

use ndarray as nd;
use num_complex::Complex64 as C64;
use serde::{ Deserialize, Serialize };
use crate::{
    Arr1,
    DEF_NITER,
    Kappa,
    contspec::{ self, Phases },
    discretization::Discretization,
    discspec::{ BoundStateData, bound_state_data, filter_bound_states },
    error::NftError,
    newton::{ admissible_region, re_bound, refine_roots_newton },
    resample::{ downsampling_stride, effective_signal },
    richardson::{ extrapolate_bound_states, extrapolate_contspec, richardson_scale },
    scatter::scatter_matrix,
    utils,
};

pub use crate::{
    contspec::{ ContSpec, CsType },
    discspec::{ DiscSpec, DsType, Filtering },
};

pub type NftResult<T> = Result<T, NftError>;

/// Method used to locate bound states.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BsLoc {
    /// Refine user-supplied guesses with Newton's method.
    #[default]
    Newton,
}

/// Options for [`nsev`].
///
/// Build from [`Default`] (or [`nsev_default_opts`]) and adjust with the
/// `with_*` methods:
/// ```
/// use nsev::{ CsType, Discretization, NsevOpts };
///
/// let opts = NsevOpts::default()
///     .with_discretization(Discretization::CF4_2)
///     .with_contspec_type(CsType::Both)
///     .with_richardson_extrapolation(true);
/// assert_eq!(opts.niter, 10);
/// ```
/// Missing fields take their default values when deserializing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NsevOpts {
    /// Filtering applied to refined bound states (default: `Full`).
    pub bound_state_filtering: Filtering,
    /// Bound-state localization method (default: `Newton`).
    pub bound_state_localization: BsLoc,
    /// Newton iteration budget per bound state (default: `10`).
    pub niter: usize,
    /// Discrete spectrum to compute (default: `NormingConstants`).
    pub discspec_type: DsType,
    /// Continuous spectrum to compute (default: `ReflectionCoefficient`).
    pub contspec_type: CsType,
    /// Discretization scheme (default: `BO`).
    pub discretization: Discretization,
    /// Combine with a half-resolution transform by Richardson extrapolation
    /// (default: `false`).
    pub richardson_extrapolation: bool,
}

impl Default for NsevOpts {
    fn default() -> Self {
        Self {
            bound_state_filtering: Filtering::Full,
            bound_state_localization: BsLoc::Newton,
            niter: DEF_NITER,
            discspec_type: DsType::NormingConstants,
            contspec_type: CsType::ReflectionCoefficient,
            discretization: Discretization::BO,
            richardson_extrapolation: false,
        }
    }
}

impl NsevOpts {
    pub fn with_bound_state_filtering(mut self, filtering: Filtering) -> Self {
        self.bound_state_filtering = filtering;
        self
    }

    pub fn with_bound_state_localization(mut self, bsloc: BsLoc) -> Self {
        self.bound_state_localization = bsloc;
        self
    }

    pub fn with_niter(mut self, niter: usize) -> Self {
        self.niter = niter;
        self
    }

    pub fn with_discspec_type(mut self, kind: DsType) -> Self {
        self.discspec_type = kind;
        self
    }

    pub fn with_contspec_type(mut self, kind: CsType) -> Self {
        self.contspec_type = kind;
        self
    }

    pub fn with_discretization(mut self, discretization: Discretization) -> Self {
        self.discretization = discretization;
        self
    }

    pub fn with_richardson_extrapolation(mut self, onoff: bool) -> Self {
        self.richardson_extrapolation = onoff;
        self
    }
}

/// Default options for [`nsev`].
pub fn nsev_default_opts() -> NsevOpts { NsevOpts::default() }

/// Uniform grid of `m` points over the closed interval `xi`.
pub fn xi_grid(xi: (f64, f64), m: usize) -> nd::Array1<f64> {
    nd::Array1::linspace(xi.0, xi.1, m)
}

/// Output of [`nsev`].
#[derive(Clone, Debug, PartialEq)]
pub struct Nft {
    /// Continuous spectrum on the requested grid.
    pub contspec: ContSpec,
    /// Discrete spectrum; `None` for a defocusing nonlinearity, which has no
    /// bound states.
    pub discspec: Option<DiscSpec>,
}

// one resolution level
struct BaseRun {
    contspec: ContSpec,
    bound_states: Option<BoundStateData>,
    d_sub: usize,
    eps_t: f64,
}

#[allow(clippy::too_many_arguments)]
fn nsev_base<S, T>(
    q: &Arr1<S>,
    t: (f64, f64),
    xi: &Arr1<T>,
    guesses: &[C64],
    kappa: Kappa,
    d_sub: usize,
    energy_bound: f64,
    opts: &NsevOpts,
) -> NftResult<BaseRun>
where
    S: nd::Data<Elem = C64>,
    T: nd::Data<Elem = f64>,
{
    let eps_t_given = (t.1 - t.0) / (q.len() - 1) as f64;
    let eff = effective_signal(q, eps_t_given, kappa, d_sub, opts.discretization)?;
    let window = eff.window(t, eps_t_given);
    let eps_t = (window.1 - window.0) / (eff.d_sub - 1) as f64;
    tracing::debug!(
        d_sub = eff.d_sub, eps_t, t0 = window.0, t1 = window.1,
        "running base transform"
    );

    let lambdas = xi.mapv(C64::from);
    let sm = scatter_matrix(&eff, eps_t, &lambdas, false)
        .map_err(NftError::subroutine)?;
    let bc = opts.discretization.boundary_coeff();
    let contspec
        = contspec::assemble(&sm, xi, Phases::new(window, eps_t, bc), opts.contspec_type)?;

    let bound_states
        = if kappa.is_focusing() {
            let refined = refine_roots_newton(&eff, window, guesses, opts.niter, energy_bound)?;
            let lambdas: Vec<C64> = refined.iter().map(|r| r.lambda).collect();
            let region = admissible_region(eps_t, energy_bound);
            let kept = filter_bound_states(&lambdas, opts.bound_state_filtering, &region)?;
            Some(bound_state_data(&eff, window, kept)?)
        } else {
            None
        };
    Ok(BaseRun { contspec, bound_states, d_sub: eff.d_sub, eps_t })
}

/// Compute the nonlinear Fourier transform of the `D` samples `q` taken
/// uniformly over the closed window `t`.
///
/// The continuous spectrum is evaluated on the real grid `xi` (which must be
/// strictly increasing; see [`xi_grid`]). In the focusing case the discrete
/// spectrum is found by refining `guesses`, then filtering and merging the
/// results according to `opts`; in the defocusing case `guesses` are ignored
/// and no discrete spectrum is returned.
///
/// With Richardson extrapolation enabled, a second transform of roughly half
/// the samples is computed (starting from the bound states of the first) and
/// combined with the first to cancel the leading error term. Signals too short
/// to be downsampled any further are returned without extrapolation.
///
/// Returns [`NftError::InvalidArgument`] for fewer than 2 samples, non-finite
/// samples, a window with `t.0 >= t.1`, or a malformed grid;
/// [`NftError::DivByZero`] if a(λ) or a'(λ) vanishes where it is a divisor.
///
/// ```
/// use ndarray as nd;
/// use num_complex::Complex64 as C64;
/// use nsev::{ Kappa, NftError, nsev, nsev_default_opts, xi_grid };
///
/// let t = (-16.0, 16.0);
/// let q: nd::Array1<C64>
///     = nd::Array1::linspace(t.0, t.1, 512).mapv(|tk: f64| C64::from(1.0 / tk.cosh()));
/// let xi = xi_grid((-2.0, 2.0), 9);
/// let opts = nsev_default_opts();
/// let nft = nsev(&q, t, &xi, &[C64::new(0.1, 0.4)], Kappa::Focusing, &opts)?;
/// assert_eq!(nft.contspec.rho.unwrap().len(), 9);
/// let ds = nft.discspec.unwrap();
/// assert_eq!(ds.bound_states.len(), 1);
/// assert!((ds.bound_states[0] - C64::new(0.0, 0.5)).norm() < 2e-2);
/// # Ok::<(), NftError>(())
/// ```
pub fn nsev<S, T>(
    q: &Arr1<S>,
    t: (f64, f64),
    xi: &Arr1<T>,
    guesses: &[C64],
    kappa: Kappa,
    opts: &NsevOpts,
) -> NftResult<Nft>
where
    S: nd::Data<Elem = C64>,
    T: nd::Data<Elem = f64>,
{
    let d = q.len();
    NftError::check_num_samples(d)?;
    NftError::check_window(t)?;
    NftError::check_xi(xi)?;
    NftError::check_finite(q)?;

    // by the nonlinear Parseval relation, ‖q‖² ≥ 4 Σ Im λₖ
    let energy_bound = 1.5 * 0.25 * utils::l2norm2(q, t);
    let eps_t = (t.1 - t.0) / (d - 1) as f64;
    let mut full = nsev_base(q, t, xi, guesses, kappa, d, energy_bound, opts)?;

    let d_half = d.div_ceil(2);
    let (_, d_coarse) = downsampling_stride(d, d_half);
    let can_extrapolate
        = d_coarse < d
        && !(opts.discretization.uses_derivatives() && d_coarse < 3);
    if opts.richardson_extrapolation && !can_extrapolate {
        tracing::warn!(
            d, d_coarse, discretization = %opts.discretization,
            "too few samples for richardson extrapolation; keeping full-resolution result"
        );
    } else if opts.richardson_extrapolation {
        let coarse_guesses: Vec<C64>
            = full.bound_states.as_ref()
            .map(|bs| bs.bound_states.clone())
            .unwrap_or_default();
        let coarse = nsev_base(
            q, t, xi, &coarse_guesses, kappa, d_half, energy_bound, opts)?;
        let scale = richardson_scale(d, coarse.d_sub, opts.discretization.order());
        tracing::debug!(d, d_sub = coarse.d_sub, scale, "richardson extrapolation");
        extrapolate_contspec(
            &mut full.contspec, &coarse.contspec, xi, re_bound(coarse.eps_t), scale);
        if let (Some(f), Some(c)) = (full.bound_states.as_mut(), coarse.bound_states.as_ref()) {
            extrapolate_bound_states(
                f, c, eps_t, scale, opts.discspec_type.wants_residues());
        }
    }

    let discspec
        = full.bound_states
        .map(|bs| bs.into_discspec(opts.discspec_type))
        .transpose()?;
    Ok(Nft { contspec: full.contspec, discspec })
}

/// Simple record to keep track of a sampled signal and its time window.
///
/// The samples are taken uniformly over the closed window, first and last
/// samples included.
#[derive(Clone, Debug)]
pub struct Signal {
    // time coordinates
    t: nd::Array1<f64>,
    // time coordinate spacing
    eps_t: f64,
    // samples
    q: nd::Array1<C64>,
}

impl Signal {
    /// Create a new `Signal`, generating the time coordinates from
    /// "linspace-style" arguments (start, inclusive end, and a number of
    /// samples).
    ///
    /// *Panics if the number of samples is less than 2 or if `t0 >= t1`*; see
    /// [`Signal::new_arrays`] for a checked constructor.
    pub fn new_linspace<F>(targs: (f64, f64, usize), q: F) -> Self
    where F: FnMut(f64) -> C64
    {
        assert!(targs.2 >= 2, "Signal::new_linspace: need at least 2 samples; got {}", targs.2);
        assert!(
            targs.0 < targs.1,
            "Signal::new_linspace: window must satisfy t0 < t1; got ({}, {})", targs.0, targs.1,
        );
        let t: nd::Array1<f64> = nd::Array1::linspace(targs.0, targs.1, targs.2);
        let eps_t = t[1] - t[0];
        let q: nd::Array1<C64> = t.mapv(q);
        Self { t, eps_t, q }
    }

    /// Create a new `Signal` from samples taken over the window `t`.
    pub fn new_arrays(t: (f64, f64), q: nd::Array1<C64>) -> NftResult<Self> {
        NftError::check_num_samples(q.len())?;
        NftError::check_window(t)?;
        let eps_t = (t.1 - t.0) / (q.len() - 1) as f64;
        let t = nd::Array1::linspace(t.0, t.1, q.len());
        Ok(Self { t, eps_t, q })
    }

    /// Get a reference to the time coordinates.
    pub fn get_t(&self) -> &nd::Array1<f64> { &self.t }

    /// Get a reference to the samples.
    pub fn get_q(&self) -> &nd::Array1<C64> { &self.q }

    /// Get the time coordinate spacing.
    pub fn get_eps_t(&self) -> f64 { self.eps_t }

    /// Get the window `(t[0], t[D - 1])`.
    pub fn get_window(&self) -> (f64, f64) {
        (
            self.t.first().copied().unwrap_or(0.0),
            self.t.last().copied().unwrap_or(0.0),
        )
    }

    /// Get the number of samples.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize { self.q.len() }

    /// Squared L² norm of the samples.
    pub fn l2norm2(&self) -> f64 {
        if self.len() < 2 { return 0.0; }
        utils::l2norm2(&self.q, self.get_window())
    }

    /// Thin interface to [`nsev`].
    pub fn nsev<T>(&self, xi: &Arr1<T>, guesses: &[C64], kappa: Kappa, opts: &NsevOpts)
        -> NftResult<Nft>
    where T: nd::Data<Elem = f64>
    {
        nsev(&self.q, self.get_window(), xi, guesses, kappa, opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sech(d: usize) -> Signal {
        Signal::new_linspace((-16.0, 16.0, d), |t| C64::from(1.0 / t.cosh()))
    }

    #[test]
    fn default_opts() {
        let opts = nsev_default_opts();
        assert_eq!(opts.bound_state_filtering, Filtering::Full);
        assert_eq!(opts.bound_state_localization, BsLoc::Newton);
        assert_eq!(opts.niter, 10);
        assert_eq!(opts.discspec_type, DsType::NormingConstants);
        assert_eq!(opts.contspec_type, CsType::ReflectionCoefficient);
        assert_eq!(opts.discretization, Discretization::BO);
        assert!(!opts.richardson_extrapolation);
    }

    #[test]
    fn signal_record() {
        let sig = sech(5);
        assert_eq!(sig.len(), 5);
        assert_eq!(sig.get_window(), (-16.0, 16.0));
        assert_eq!(sig.get_eps_t(), 8.0);
        let sig = Signal::new_arrays((0.0, 1.0), nd::Array1::zeros(3)).unwrap();
        assert_eq!(sig.get_t().to_vec(), vec![0.0, 0.5, 1.0]);
        assert!(Signal::new_arrays((1.0, 0.0), nd::Array1::zeros(3)).is_err());
    }

    #[test]
    fn empty_grid_is_a_no_op() {
        let sig = sech(64);
        let xi = xi_grid((-1.0, 1.0), 0);
        let opts = NsevOpts::default().with_contspec_type(CsType::Both);
        let nft = sig.nsev(&xi, &[], Kappa::Focusing, &opts).unwrap();
        assert_eq!(nft.contspec.rho.unwrap().len(), 0);
        assert_eq!(nft.contspec.a.unwrap().len(), 0);
        assert_eq!(nft.contspec.b.unwrap().len(), 0);
        assert!(nft.discspec.unwrap().bound_states.is_empty());
    }

    #[test]
    fn defocusing_has_no_discrete_spectrum() {
        let sig = sech(64);
        let xi = xi_grid((-1.0, 1.0), 4);
        let nft = sig.nsev(&xi, &[C64::new(0.0, 0.5)], Kappa::Defocusing, &nsev_default_opts())
            .unwrap();
        assert!(nft.discspec.is_none());
        assert_eq!(nft.contspec.rho.unwrap().len(), 4);
    }

    #[test]
    fn invalid_arguments() {
        let opts = nsev_default_opts();
        let xi = xi_grid((-1.0, 1.0), 4);
        let q = nd::array![C64::from(1.0)];
        let err = nsev(&q, (0.0, 1.0), &xi, &[], Kappa::Focusing, &opts).unwrap_err();
        assert!(err.is_invalid_argument("q"));
        let q = nd::Array1::<C64>::zeros(8);
        let err = nsev(&q, (1.0, 0.0), &xi, &[], Kappa::Focusing, &opts).unwrap_err();
        assert!(err.is_invalid_argument("t"));
        let bad_xi = nd::array![0.0, -1.0];
        let err = nsev(&q, (0.0, 1.0), &bad_xi, &[], Kappa::Focusing, &opts).unwrap_err();
        assert!(err.is_invalid_argument("xi"));
        let mut q = q;
        q[3] = C64::new(f64::NAN, 0.0);
        let err = nsev(&q, (0.0, 1.0), &xi, &[], Kappa::Focusing, &opts).unwrap_err();
        assert!(err.is_invalid_argument("q"));
    }

    #[test]
    #[should_panic]
    fn linspace_needs_two_samples() {
        let _ = Signal::new_linspace((0.0, 1.0, 1), |_| C64::from(1.0));
    }

    #[test]
    #[should_panic]
    fn linspace_needs_forward_window() {
        let _ = Signal::new_linspace((1.0, 0.0, 8), |_| C64::from(1.0));
    }

    #[test]
    fn richardson_is_skipped_without_a_coarser_level() {
        let q = nd::array![C64::from(0.5), C64::from(0.5)];
        let xi = xi_grid((-0.5, 0.5), 3);
        let plain_opts = nsev_default_opts().with_contspec_type(CsType::AB);
        let rich_opts = plain_opts.clone().with_richardson_extrapolation(true);
        let plain = nsev(&q, (0.0, 1.0), &xi, &[], Kappa::Focusing, &plain_opts).unwrap();
        let rich = nsev(&q, (0.0, 1.0), &xi, &[], Kappa::Focusing, &rich_opts).unwrap();
        let a = rich.contspec.a.as_ref().unwrap();
        let b = rich.contspec.b.as_ref().unwrap();
        assert!(a.iter().chain(b).all(|v| v.re.is_finite() && v.im.is_finite()));
        assert_eq!(rich, plain);

        // ES4 cannot go below 3 samples
        let q = nd::Array1::from_elem(4, C64::from(0.5));
        let es4 = plain_opts.with_discretization(Discretization::ES4);
        let plain = nsev(&q, (0.0, 1.0), &xi, &[], Kappa::Focusing, &es4).unwrap();
        let rich = nsev(
            &q, (0.0, 1.0), &xi, &[], Kappa::Focusing,
            &es4.clone().with_richardson_extrapolation(true),
        ).unwrap();
        assert_eq!(rich, plain);
    }

    #[test]
    fn es4_on_tiny_signal_is_rejected() {
        let q = nd::Array1::<C64>::zeros(2);
        let xi = xi_grid((-1.0, 1.0), 2);
        let opts = nsev_default_opts().with_discretization(Discretization::ES4);
        let err = nsev(&q, (0.0, 1.0), &xi, &[], Kappa::Focusing, &opts).unwrap_err();
        assert!(err.is_invalid_argument("d_sub"));
    }
}
