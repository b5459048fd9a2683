//! Post-processing of refined bound states: filtering, merging, and norming
//! constants or residues.

use num_complex::Complex64 as C64;
use serde::{ Deserialize, Serialize };
use crate::{
    MERGE_TOL,
    error::NftError,
    resample::EffectiveSignal,
    scatter::scatter_bound_states,
    utils::{ self, BoundingBox, is_zero },
};

pub type DiscSpecResult<T> = Result<T, NftError>;

/// Level of bound-state filtering.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Filtering {
    /// Keep everything.
    None,
    /// Drop bound states in the lower half-plane.
    Basic,
    /// Additionally drop bound states outside the region resolvable by the
    /// sampling step and allowed by the signal energy.
    #[default]
    Full,
}

/// Kind of discrete spectrum to compute alongside the bound states.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DsType {
    /// Norming constants *b*(*λₖ*).
    #[default]
    NormingConstants,
    /// Residues *b*(*λₖ*) / *a*'(*λₖ*).
    Residues,
    /// All of the above.
    Both,
}

impl DsType {
    /// Return `true` if norming constants are requested.
    pub fn wants_norming_constants(self) -> bool {
        matches!(self, Self::NormingConstants | Self::Both)
    }

    /// Return `true` if residues are requested.
    pub fn wants_residues(self) -> bool { matches!(self, Self::Residues | Self::Both) }
}

/// Discrete spectrum.
///
/// `norming_constants` and `residues` are `None` exactly when not requested;
/// otherwise they have the same length as `bound_states`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiscSpec {
    /// Bound states (eigenvalues in the upper half-plane).
    pub bound_states: Vec<C64>,
    /// Norming constants.
    pub norming_constants: Option<Vec<C64>>,
    /// Residues.
    pub residues: Option<Vec<C64>>,
}

/// Bound states with everything needed to build a [`DiscSpec`] of any kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct BoundStateData {
    pub bound_states: Vec<C64>,
    pub norming_constants: Vec<C64>,
    pub aprimes: Vec<C64>,
}

/// Apply `filtering` to `vals`, then merge near-duplicates.
///
/// With [`Filtering::Full`], `region` is the admissible box. Merging always
/// happens; of two bound states closer than √ε the one with the lower index
/// is kept.
pub fn filter_bound_states(
    vals: &[C64],
    filtering: Filtering,
    region: &BoundingBox,
) -> DiscSpecResult<Vec<C64>>
{
    let kept
        = match filtering {
            Filtering::None => vals.to_vec(),
            Filtering::Basic => {
                utils::filter_bounding_box(vals, &BoundingBox::upper_half_plane())?
            },
            Filtering::Full => {
                let upper
                    = utils::filter_bounding_box(vals, &BoundingBox::upper_half_plane())?;
                utils::filter_bounding_box(&upper, region)?
            },
        };
    let merged = utils::merge(&kept, MERGE_TOL);
    if merged.len() < vals.len() {
        tracing::debug!(
            given = vals.len(), kept = merged.len(), ?filtering,
            "filtered bound states"
        );
    }
    Ok(merged)
}

/// Compute b(λ) and a'(λ) at each bound state.
pub(crate) fn bound_state_data(
    eff: &EffectiveSignal,
    t: (f64, f64),
    bound_states: Vec<C64>,
) -> DiscSpecResult<BoundStateData>
{
    let coeffs = scatter_bound_states(eff, t, &bound_states, false)
        .map_err(NftError::subroutine)?;
    let mut norming_constants: Vec<C64> = Vec::new();
    norming_constants.try_reserve_exact(coeffs.len())?;
    let mut aprimes: Vec<C64> = Vec::new();
    aprimes.try_reserve_exact(coeffs.len())?;
    for c in coeffs.into_iter() {
        let b = c.b.ok_or_else(|| NftError::Other("missing norming constant".into()))?;
        norming_constants.push(b);
        aprimes.push(c.aprime);
    }
    Ok(BoundStateData { bound_states, norming_constants, aprimes })
}

/// Residues b(λₖ) / a'(λₖ).
///
/// Returns [`NftError::DivByZero`] if any a'(λₖ) is exactly zero.
pub fn residues(norming_constants: &[C64], aprimes: &[C64]) -> DiscSpecResult<Vec<C64>> {
    norming_constants.iter().zip(aprimes)
        .map(|(b, ap)| {
            if is_zero(*ap) { Err(NftError::DivByZero) } else { Ok(b / ap) }
        })
        .collect()
}

impl BoundStateData {
    pub(crate) fn into_discspec(self, kind: DsType) -> DiscSpecResult<DiscSpec> {
        let residues
            = if kind.wants_residues() {
                Some(residues(&self.norming_constants, &self.aprimes)?)
            } else {
                None
            };
        let norming_constants
            = kind.wants_norming_constants().then_some(self.norming_constants);
        Ok(DiscSpec { bound_states: self.bound_states, norming_constants, residues })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newton::admissible_region;

    fn guesses() -> Vec<C64> {
        vec![
            C64::new(0.0, 0.5),
            C64::new(60.0, 0.1),
            C64::new(0.2, -0.3),
            C64::new(0.0, 3.0),
        ]
    }

    #[test]
    fn filtering_levels() {
        let region = admissible_region(32.0 / 1023.0, 0.75);
        let vals = guesses();
        let none = filter_bound_states(&vals, Filtering::None, &region).unwrap();
        assert_eq!(none, vals);
        let basic = filter_bound_states(&vals, Filtering::Basic, &region).unwrap();
        assert_eq!(basic, vec![vals[0], vals[1], vals[3]]);
        let full = filter_bound_states(&vals, Filtering::Full, &region).unwrap();
        assert_eq!(full, vec![vals[0]]);
    }

    #[test]
    fn merging_keeps_lower_index() {
        let region = BoundingBox::upper_half_plane();
        let vals = [
            C64::new(0.0, 0.45),
            C64::new(1e-9, 0.45),
            C64::new(0.0, 0.46),
        ];
        let kept = filter_bound_states(&vals, Filtering::None, &region).unwrap();
        assert_eq!(kept, vec![vals[0], vals[2]]);
    }

    #[test]
    fn residues_divide_by_aprime() {
        let b = [C64::new(-1.0, 0.0), C64::new(2.0, 0.0)];
        let ap = [C64::new(0.0, -1.0), C64::new(0.0, 2.0)];
        let res = residues(&b, &ap).unwrap();
        assert!((res[0] - C64::new(0.0, -1.0)).norm() < 1e-15);
        assert!((res[1] - C64::new(0.0, -1.0)).norm() < 1e-15);
        let err = residues(&b, &[ap[0], C64::new(0.0, 0.0)]).unwrap_err();
        assert!(err.is_div_by_zero());
    }

    #[test]
    fn discspec_kinds() {
        let data = BoundStateData {
            bound_states: vec![C64::new(0.0, 0.5)],
            norming_constants: vec![C64::new(-1.0, 0.0)],
            aprimes: vec![C64::new(0.0, -1.0)],
        };
        let ds = data.clone().into_discspec(DsType::NormingConstants).unwrap();
        assert!(ds.norming_constants.is_some() && ds.residues.is_none());
        let ds = data.clone().into_discspec(DsType::Residues).unwrap();
        assert!(ds.norming_constants.is_none());
        assert!((ds.residues.unwrap()[0] - C64::new(0.0, -1.0)).norm() < 1e-15);
        let ds = data.into_discspec(DsType::Both).unwrap();
        assert_eq!(ds.bound_states.len(), 1);
        assert!(ds.norming_constants.is_some() && ds.residues.is_some());
    }
}
