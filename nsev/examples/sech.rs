use num_complex::Complex64 as C64;
use nsev::{ CsType, Discretization, DsType, Kappa, NsevOpts, Signal, xi_grid };
use tracing_subscriber::{ fmt, prelude::*, EnvFilter };

// nonlinear Fourier transform of a fundamental soliton, q(t) = sech(t)
//
// exact values:
// * a(ξ) = (ξ - i/2) / (ξ + i/2), b(ξ) = 0
// * one bound state at i/2 with norming constant -1 and residue -i

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    const D: usize = 1024;
    const M: usize = 9;
    let signal = Signal::new_linspace((-16.0, 16.0, D), |t| C64::from(1.0 / t.cosh()));
    let xi = xi_grid((-2.0, 2.0), M);
    let guesses = [C64::new(0.1, 0.4), C64::new(-1.0, 3.0)];
    let a_exact = |x: f64| {
        (C64::from(x) - C64::new(0.0, 0.5)) / (C64::from(x) + C64::new(0.0, 0.5))
    };

    for discretization in [Discretization::BO, Discretization::CF4_2, Discretization::ES4] {
        for richardson in [false, true] {
            let opts = NsevOpts::default()
                .with_discretization(discretization)
                .with_contspec_type(CsType::AB)
                .with_discspec_type(DsType::Both)
                .with_richardson_extrapolation(richardson);
            let nft = signal.nsev(&xi, &guesses, Kappa::Focusing, &opts)?;

            let a = nft.contspec.a.unwrap_or_default();
            let a_err
                = a.iter().zip(&xi)
                .map(|(ak, &x)| (ak - a_exact(x)).norm())
                .fold(0.0, f64::max);
            println!("{}", serde_json::to_string(&opts)?);
            println!("  max |a - a_exact| = {:.3e}", a_err);
            if let Some(ds) = nft.discspec {
                for (k, lam) in ds.bound_states.iter().enumerate() {
                    let nc = ds.norming_constants.as_ref().map(|n| n[k]);
                    let res = ds.residues.as_ref().map(|r| r[k]);
                    println!(
                        "  λ = {:.6}; |λ - i/2| = {:.3e}; b = {:.4?}; b/a' = {:.4?}",
                        lam, (lam - C64::new(0.0, 0.5)).norm(), nc, res,
                    );
                }
            }
        }
    }
    Ok(())
}
