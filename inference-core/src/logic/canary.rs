//! Canary Strategy - per-request variant selection
//!
//! Weighted coin flip between the baseline and canary models.
//! The RNG is seeded once and shared; draws are serialized behind a mutex.

use std::fmt;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::config::ConfigError;

/// Model identity serving a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Baseline,
    Canary,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Baseline, Variant::Canary];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Baseline => "baseline",
            Variant::Canary => "canary",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one draw
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariantDecision {
    pub variant: Variant,
    /// Nominal weight of the chosen branch, not the drawn value
    pub probability: f64,
}

/// Chooses which model variant serves a request
pub trait VariantSelector: Send + Sync {
    fn choose(&self) -> VariantDecision;
}

struct SelectorState {
    rng: StdRng,
    split: f64,
}

/// Seeded weighted selector
pub struct CanarySelector {
    state: Mutex<SelectorState>,
}

impl CanarySelector {
    pub fn new(split: f64, seed: u64) -> Result<Self, ConfigError> {
        if !split.is_finite() || !(0.0..=1.0).contains(&split) {
            return Err(ConfigError::InvalidSplit(split));
        }

        Ok(Self {
            state: Mutex::new(SelectorState {
                rng: StdRng::seed_from_u64(seed),
                split,
            }),
        })
    }

    /// Effective canary share
    pub fn split(&self) -> f64 {
        self.state.lock().split
    }

    /// Route all further traffic to the baseline
    pub fn demote(&self) {
        let mut state = self.state.lock();
        if state.split > 0.0 {
            log::warn!("Canary demoted: split {:.2} -> 0.00", state.split);
            state.split = 0.0;
        }
    }
}

impl VariantSelector for CanarySelector {
    fn choose(&self) -> VariantDecision {
        let mut state = self.state.lock();
        let value: f64 = state.rng.gen();

        if value < state.split {
            VariantDecision { variant: Variant::Canary, probability: state.split }
        } else {
            VariantDecision { variant: Variant::Baseline, probability: 1.0 - state.split }
        }
    }
}

/// Always returns the same decision
pub struct FixedSelector(pub VariantDecision);

impl FixedSelector {
    pub fn baseline() -> Self {
        Self(VariantDecision { variant: Variant::Baseline, probability: 1.0 })
    }

    pub fn canary() -> Self {
        Self(VariantDecision { variant: Variant::Canary, probability: 1.0 })
    }
}

impl VariantSelector for FixedSelector {
    fn choose(&self) -> VariantDecision {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_canary_probability_bounds() {
        let selector = CanarySelector::new(0.3, 42).unwrap();
        for _ in 0..10 {
            let decision = selector.choose();
            assert!((0.0..=1.0).contains(&decision.probability));
            match decision.variant {
                Variant::Canary => assert_eq!(decision.probability, 0.3),
                Variant::Baseline => assert!((decision.probability - 0.7).abs() < 1e-12),
            }
        }
    }

    #[test]
    fn test_full_split_always_canary() {
        let selector = CanarySelector::new(1.0, 7).unwrap();
        for _ in 0..1000 {
            let decision = selector.choose();
            assert_eq!(decision.variant, Variant::Canary);
            assert_eq!(decision.probability, 1.0);
        }
    }

    #[test]
    fn test_zero_split_always_baseline() {
        let selector = CanarySelector::new(0.0, 7).unwrap();
        for _ in 0..1000 {
            let decision = selector.choose();
            assert_eq!(decision.variant, Variant::Baseline);
            assert_eq!(decision.probability, 1.0);
        }
    }

    #[test]
    fn test_split_converges() {
        for &split in &[0.1, 0.3, 0.5, 0.8] {
            let selector = CanarySelector::new(split, 42).unwrap();
            let draws = 20_000;
            let canary = (0..draws)
                .filter(|_| selector.choose().variant == Variant::Canary)
                .count();
            let observed = canary as f64 / draws as f64;
            assert!((observed - split).abs() < 0.02, "split {split} observed {observed}");
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a = CanarySelector::new(0.5, 99).unwrap();
        let b = CanarySelector::new(0.5, 99).unwrap();
        for _ in 0..100 {
            assert_eq!(a.choose(), b.choose());
        }
    }

    #[test]
    fn test_invalid_split_rejected() {
        assert!(matches!(CanarySelector::new(1.5, 0), Err(ConfigError::InvalidSplit(_))));
        assert!(CanarySelector::new(-0.1, 0).is_err());
        assert!(CanarySelector::new(f64::NAN, 0).is_err());
    }

    #[test]
    fn test_demote_routes_to_baseline() {
        let selector = CanarySelector::new(1.0, 1).unwrap();
        selector.demote();
        assert_eq!(selector.split(), 0.0);
        assert_eq!(selector.choose().variant, Variant::Baseline);
    }

    #[test]
    fn test_concurrent_draws() {
        let selector = Arc::new(CanarySelector::new(0.5, 3).unwrap());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let selector = selector.clone();
                std::thread::spawn(move || {
                    (0..1000).filter(|_| selector.choose().variant == Variant::Canary).count()
                })
            })
            .collect();

        let canary: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        let observed = canary as f64 / 8000.0;
        assert!((observed - 0.5).abs() < 0.05);
    }

    #[test]
    fn test_variant_wire_names() {
        assert_eq!(serde_json::to_string(&Variant::Canary).unwrap(), "\"canary\"");
        assert_eq!(Variant::Baseline.to_string(), "baseline");
    }
}
