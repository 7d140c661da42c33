//! Candidate catalogs and weighted selection

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, Result};

/// Weight substituted for candidates configured with exactly zero.
pub const ZERO_WEIGHT_SUBSTITUTE: f32 = 0.5;

/// A validated, selectable platform kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnCandidate {
    pub id: String,
    /// Relative weight in [0, 1]
    pub weight: f32,
}

impl SpawnCandidate {
    pub fn new(id: impl Into<String>, weight: f32) -> Self {
        Self {
            id: id.into(),
            weight,
        }
    }

    /// Weight used at selection time.
    pub fn effective_weight(&self) -> f32 {
        if self.weight == 0.0 {
            ZERO_WEIGHT_SUBSTITUTE
        } else {
            self.weight
        }
    }
}

/// One configured slot; the id may be left unassigned in a config file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogSlot {
    pub id: Option<String>,
    #[serde(default)]
    pub weight: f32,
}

impl CatalogSlot {
    pub fn new(id: &str, weight: f32) -> Self {
        Self {
            id: Some(id.to_string()),
            weight,
        }
    }
}

/// Ordered list of candidate slots for one layer kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateCatalog {
    pub slots: Vec<CatalogSlot>,
}

impl CandidateCatalog {
    pub fn new(slots: Vec<CatalogSlot>) -> Self {
        Self { slots }
    }

    pub fn default_ground() -> Self {
        Self::new(vec![
            CatalogSlot::new("ground_platform", 0.6),
            CatalogSlot::new("ground_platform_wide", 0.3),
            CatalogSlot::new("spring_platform", 0.1),
        ])
    }

    pub fn default_sky() -> Self {
        Self::new(vec![
            CatalogSlot::new("sky_platform", 0.5),
            CatalogSlot::new("moving_platform", 0.3),
            CatalogSlot::new("resizing_platform", 0.2),
        ])
    }

    /// Resolve every slot, failing on the first unusable one.
    pub fn validate(&self, name: &str) -> Result<Vec<SpawnCandidate>> {
        if self.slots.is_empty() {
            return Err(ArenaError::invalid(format!("{} catalog is empty", name)));
        }
        self.slots
            .iter()
            .enumerate()
            .map(|(idx, slot)| {
                let id = slot
                    .id
                    .as_deref()
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| ArenaError::invalid(format!("{} catalog slot {} has no candidate", name, idx)))?;
                if !(0.0..=1.0).contains(&slot.weight) {
                    return Err(ArenaError::invalid(format!(
                        "{} catalog slot {} ({}) has weight {} outside [0, 1]",
                        name, idx, id, slot.weight
                    )));
                }
                Ok(SpawnCandidate::new(id, slot.weight))
            })
            .collect()
    }
}

/// Pick one candidate with probability proportional to its effective weight.
///
/// One draw over the cumulative weights; returns `None` only when
/// `candidates` is empty.
pub fn weighted_pick<'a, R: Rng + ?Sized>(candidates: &'a [SpawnCandidate], rng: &mut R) -> Option<&'a SpawnCandidate> {
    let total: f32 = candidates.iter().map(SpawnCandidate::effective_weight).sum();
    if candidates.is_empty() || total <= 0.0 {
        return None;
    }

    let draw = rng.gen_range(0.0..total);
    let mut cumulative = 0.0;
    for candidate in candidates {
        cumulative += candidate.effective_weight();
        if draw < cumulative {
            return Some(candidate);
        }
    }
    // Float rounding can leave the draw a hair above the last bucket.
    candidates.last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_unassigned_slot_is_fatal() {
        let catalog = CandidateCatalog::new(vec![
            CatalogSlot::new("sky_platform", 0.5),
            CatalogSlot { id: None, weight: 0.5 },
        ]);
        let err = catalog.validate("sky").unwrap_err();
        assert!(err.to_string().contains("slot 1"));
    }

    #[test]
    fn test_empty_catalog_is_fatal() {
        assert!(CandidateCatalog::new(Vec::new()).validate("ground").is_err());
    }

    #[test]
    fn test_weight_out_of_range_is_fatal() {
        let catalog = CandidateCatalog::new(vec![CatalogSlot::new("ground_platform", 1.5)]);
        assert!(catalog.validate("ground").is_err());
    }

    #[test]
    fn test_zero_weight_substituted() {
        assert_eq!(SpawnCandidate::new("a", 0.0).effective_weight(), 0.5);
        assert_eq!(SpawnCandidate::new("a", 0.2).effective_weight(), 0.2);
    }

    #[test]
    fn test_empty_pick_is_none() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(weighted_pick(&[], &mut rng).is_none());
    }

    #[test]
    fn test_ninety_ten_split_within_three_sigma() {
        let candidates = [SpawnCandidate::new("common", 0.9), SpawnCandidate::new("rare", 0.1)];
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let trials = 10_000;
        let hits = (0..trials)
            .filter(|_| weighted_pick(&candidates, &mut rng).unwrap().id == "common")
            .count();

        let p = 0.9f64;
        let sigma = (trials as f64 * p * (1.0 - p)).sqrt();
        let expected = trials as f64 * p;
        assert!(
            (hits as f64 - expected).abs() <= 3.0 * sigma,
            "{} hits, expected {:.0} +/- {:.0}",
            hits,
            expected,
            3.0 * sigma
        );
    }

    #[test]
    fn test_zero_weights_split_evenly() {
        let candidates = [SpawnCandidate::new("a", 0.0), SpawnCandidate::new("b", 0.0)];
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let a = (0..4000)
            .filter(|_| weighted_pick(&candidates, &mut rng).unwrap().id == "a")
            .count();
        assert!((1800..=2200).contains(&a), "a picked {} times", a);
    }

    proptest! {
        #[test]
        fn prop_pick_always_returns_member(
            weights in prop::collection::vec(0.0f32..=1.0, 1..12),
            seed in any::<u64>(),
        ) {
            let candidates: Vec<SpawnCandidate> = weights
                .iter()
                .enumerate()
                .map(|(i, &w)| SpawnCandidate::new(format!("c{}", i), w))
                .collect();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let picked = weighted_pick(&candidates, &mut rng);
            prop_assert!(picked.is_some());
            prop_assert!(candidates.contains(picked.unwrap()));
        }
    }
}
