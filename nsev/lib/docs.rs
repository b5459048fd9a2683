//! Theoretical background.
//!
//! # Contents
//! - [Background](#background)
//! - [Scattering data](#scattering-data)
//! - [Discretization](#discretization)
//! - [Bound states](#bound-states)
//! - [Richardson extrapolation](#richardson-extrapolation)
//!
//! # Background
//! The nonlinear Schrödinger equation (NSE)
//! ```text
//!   ∂q     ∂²q
//! i -- + ---- + 2 κ |q|² q = 0
//!   ∂x    ∂t²
//! ```
//! describes, among other things, the propagation of the slowly varying
//! envelope *q*(*x*, *t*) of light in an optical fiber, with *κ* = +1 for
//! anomalous (focusing) and *κ* = -1 for normal (defocusing) dispersion. It is
//! integrable: its evolution is linearized by the nonlinear Fourier transform
//! (NFT), the spectrum of the Zakharov–Shabat eigenproblem[^1]
//! ```text
//! ∂v   [ -i λ    q(t) ]
//! -- = [              ] v,     r(t) = -κ q*(t)
//! ∂t   [ r(t)    i λ  ]
//! ```
//! where *λ* is a complex spectral parameter. For signals vanishing as
//! |*t*| → ∞, the spectrum evolves trivially in *x*, which is what makes the
//! NFT useful for signal processing and optical communication[^2].
//!
//! # Scattering data
//! For real *λ* = *ξ* and a signal vanishing outside a window
//! [*T*₀, *T*₁], the Jost solution fixed at the left,
//! ```text
//! v(t) = [ exp(-i ξ t) ]    t ≤ T₀
//!        [      0      ]
//! ```
//! becomes, at the right,
//! ```text
//! v(t) = [ a(ξ) exp(-i ξ t) ]    t ≥ T₁
//!        [ b(ξ) exp(+i ξ t) ]
//! ```
//! which defines the scattering coefficients *a* and *b*. The continuous
//! spectrum is usually reported as the reflection coefficient
//! *ρ*(*ξ*) = *b*(*ξ*) / *a*(*ξ*). For *κ* = -1, |*a*|² - |*b*|² = 1 on the
//! real line; for *κ* = +1, |*a*|² + |*b*|² = 1.
//!
//! Writing *S* for the transfer matrix carrying *v*(*T*₀) to *v*(*T*₁), the
//! coefficients follow from its first column after removing the free-space
//! phases accumulated over the window:
//! ```text
//! a(ξ) = S₁₁ exp(+i ξ (T₁ - T₀))
//! b(ξ) = S₂₁ exp(-i ξ (T₁ + T₀))
//! ```
//!
//! # Discretization
//! With samples *q*[*n*] = *q*(*T*₀ + *n* *ε*) the transfer matrix is
//! approximated by a product of one-step propagators. Each sample is taken to
//! represent the interval [*t*ₙ - *ε*/2, *t*ₙ + *ε*/2], so the effective
//! window extends half a step beyond the first and last samples.
//!
//! The simplest propagator, due to Boffetta and Osborne[^3], is the exact
//! solution for a signal held constant over the step,
//! ```text
//!        ( [ -i λ ε   q[n] ε ] )
//! U[n] = exp( [                ] )
//!        ( [ r[n] ε   i λ ε  ] )
//! ```
//! and is second-order accurate. Higher orders are obtained either from
//! commutator-free exponential integrators, which replace the single
//! exponential by a product of two to four whose arguments combine the signal
//! at quadrature nodes inside the step (found by band-limited interpolation),
//! or from a fourth-order Magnus expansion using the first and second
//! derivatives of the signal[^4]. The latter can be factored into three
//! exponentials of which only the middle one depends on *λ*.
//!
//! Every factor is the exponential of a traceless 2×2 matrix *Ω*, for which
//! *Ω*² = *z* I with *z* = -det *Ω*, so that
//! ```text
//! exp(Ω) = cosh(√z) I + sinh(√z) / √z Ω
//! ```
//! which, together with its derivative with respect to *λ*, is evaluated in
//! closed form.
//!
//! # Bound states
//! In the focusing case *a*(*λ*) may have zeros *λₖ* in the upper half-plane.
//! These bound states correspond to solitons in the signal. Associated with
//! each is a norming constant *b*(*λₖ*), defined through the Jost solutions
//! at the bound state, and the residue *b*(*λₖ*) / *a*'(*λₖ*).
//!
//! Bound states are refined from initial guesses with Newton's method on
//! *a*(*λ*), using the *λ*-derivative of the transfer matrix. Since *a*(*λₖ*)
//! vanishes, *b*(*λₖ*) is not computed from *S*₂₁ directly but by matching the
//! left Jost solution, propagated forward, and the right one, propagated
//! backward, at a point near the center of mass of the signal.
//!
//! Spurious results are removed by requiring
//! ```text
//! |Re λₖ| ≤ 0.9 π / (2 ε)
//!  0 ≤ Im λₖ ≤ 1.5 ‖q‖² / 4
//! ```
//! the first because a sampled signal cannot resolve larger frequencies, the
//! second following from the nonlinear Parseval relation
//! ‖*q*‖² ≥ 4 Σ Im *λₖ*.
//!
//! # Richardson extrapolation
//! If a quantity is computed with an error *c* *ε*^*p* + *O*(*ε*^(*p* + 1)) for
//! a scheme of order *p*, computing it again at step *ε*' ≈ 2 *ε* and forming
//! ```text
//!     s X(ε) - X(ε')
//! X = --------------,   s = (ε' / ε)^p
//!         s - 1
//! ```
//! cancels the leading error term[^5].
//!
//! [^1]: V. E. Zakharov and A. B. Shabat, "Exact theory of two-dimensional
//! self-focusing and one-dimensional self-modulation of waves in nonlinear
//! media." Soviet Physics JETP **34** 1 62-69 (1972).
//!
//! [^2]: M. I. Yousefi and F. R. Kschischang, "Information transmission using
//! the nonlinear Fourier transform, Part II: Numerical methods." IEEE Trans.
//! Inf. Theory **60** 7 4329-4345 (2014).
//!
//! [^3]: G. Boffetta and A. R. Osborne, "Computation of the direct scattering
//! transform for the nonlinear Schroedinger equation." J. Comput. Phys.
//! **102** 2 252-264 (1992).
//!
//! [^4]: S. Medvedev, I. Vaseva, I. Chekhovskoy, and M. Fedoruk, "Exponential
//! fourth order schemes for direct Zakharov-Shabat problem." Optics Express
//! **28** 1 20-39 (2020).
//!
//! [^5]: S. Chimmalgi, P. J. Prins, and S. Wahls, "Fast nonlinear Fourier
//! transform algorithms using higher order exponential integrators." IEEE
//! Access **7** 145161-145176 (2019).
