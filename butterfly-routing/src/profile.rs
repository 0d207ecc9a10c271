//! Cost profiles - mapping from an edge's profile id to a traversal factor
//!
//! The graph only stores an opaque `u16` profile id per edge. A [`Profile`]
//! turns it into a [`Factor`]: which directions may be travelled and how much
//! one meter costs. Profiles are passed explicitly into every build and query
//! call; there is no process-wide registry.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Directions in which an edge may be travelled, relative to its stored orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorDirection {
    None,
    Forward,
    Backward,
    Both,
}

impl FactorDirection {
    /// Same access seen from the other end of the edge.
    pub fn reversed(self) -> Self {
        match self {
            FactorDirection::Forward => FactorDirection::Backward,
            FactorDirection::Backward => FactorDirection::Forward,
            other => other,
        }
    }
}

/// Traversal rule for one profile id
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    pub direction: FactorDirection,
    /// Cost per meter
    pub value: f32,
}

impl Factor {
    /// Impassable edge. Never treated as a free edge.
    pub const NO_ACCESS: Factor = Factor {
        direction: FactorDirection::None,
        value: 0.0,
    };

    pub fn new(direction: FactorDirection, value: f32) -> Self {
        Self { direction, value }
    }

    /// Travel time in seconds per meter at `speed_kmh`, both directions.
    pub fn from_speed_kmh(speed_kmh: f32) -> Self {
        if speed_kmh <= 0.0 || !speed_kmh.is_finite() {
            return Self::NO_ACCESS;
        }
        Self {
            direction: FactorDirection::Both,
            value: 3.6 / speed_kmh,
        }
    }

    pub fn with_direction(self, direction: FactorDirection) -> Self {
        Self { direction, ..self }
    }

    pub fn is_passable(&self) -> bool {
        self.direction != FactorDirection::None && self.value.is_finite() && self.value > 0.0
    }

    /// Cost of travelling `distance` meters.
    #[inline]
    pub fn cost(&self, distance: f32) -> f32 {
        distance * self.value
    }

    /// Whether an arc may be expanded.
    ///
    /// `inverted` is set when the arc is seen from the edge's `to` end. A
    /// backward search walks arcs against the travel direction, which flips
    /// the mask.
    #[inline]
    pub fn allows(&self, inverted: bool, backward: bool) -> bool {
        if !self.is_passable() {
            return false;
        }
        match self.direction {
            FactorDirection::Both => true,
            FactorDirection::Forward => inverted == backward,
            FactorDirection::Backward => inverted != backward,
            FactorDirection::None => false,
        }
    }
}

/// Pure function from profile id to factor
pub trait Profile {
    fn factor(&self, profile: u16) -> Factor;
}

impl<F> Profile for F
where
    F: Fn(u16) -> Factor,
{
    fn factor(&self, profile: u16) -> Factor {
        self(profile)
    }
}

/// Explicit profile table, usually loaded as part of [`crate::RoutingConfig`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorTable {
    #[serde(default)]
    factors: FxHashMap<u16, Factor>,
    /// Returned for ids missing from the table
    #[serde(default = "default_missing")]
    missing: Factor,
}

fn default_missing() -> Factor {
    Factor::NO_ACCESS
}

impl Default for FactorTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FactorTable {
    pub fn new() -> Self {
        Self {
            factors: FxHashMap::default(),
            missing: Factor::NO_ACCESS,
        }
    }

    /// Table where every unknown id maps to `factor`.
    pub fn uniform(factor: Factor) -> Self {
        Self {
            factors: FxHashMap::default(),
            missing: factor,
        }
    }

    pub fn insert(&mut self, profile: u16, factor: Factor) -> Option<Factor> {
        self.factors.insert(profile, factor)
    }

    pub fn with(mut self, profile: u16, factor: Factor) -> Self {
        self.insert(profile, factor);
        self
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}

impl Profile for FactorTable {
    fn factor(&self, profile: u16) -> Factor {
        self.factors.get(&profile).copied().unwrap_or(self.missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_converts_to_seconds_per_meter() {
        let factor = Factor::from_speed_kmh(100.0);
        assert!((factor.value - 0.036).abs() < 1e-6);
        assert!((factor.cost(100.0) - 3.6).abs() < 1e-5);
        assert_eq!(factor.direction, FactorDirection::Both);
    }

    #[test]
    fn zero_value_is_never_free() {
        let zero = Factor::new(FactorDirection::Both, 0.0);
        assert!(!zero.is_passable());
        assert!(!zero.allows(false, false));
        assert!(!Factor::NO_ACCESS.allows(false, false));
        assert!(!Factor::from_speed_kmh(0.0).is_passable());
    }

    #[test]
    fn backward_search_flips_direction_mask() {
        let oneway = Factor::from_speed_kmh(50.0).with_direction(FactorDirection::Forward);
        // forward search: only along the stored orientation
        assert!(oneway.allows(false, false));
        assert!(!oneway.allows(true, false));
        // backward search: only when the arc is seen from its head
        assert!(!oneway.allows(false, true));
        assert!(oneway.allows(true, true));

        let contra = oneway.with_direction(FactorDirection::Backward);
        assert!(!contra.allows(false, false));
        assert!(contra.allows(true, false));
        assert!(contra.allows(false, true));
    }

    #[test]
    fn table_falls_back_to_missing() {
        let table = FactorTable::new().with(1, Factor::from_speed_kmh(30.0));
        assert!(table.factor(1).is_passable());
        assert_eq!(table.factor(2), Factor::NO_ACCESS);

        let uniform = FactorTable::uniform(Factor::from_speed_kmh(30.0));
        assert!(uniform.factor(7).is_passable());
    }

    #[test]
    fn closures_are_profiles() {
        let profile = |id: u16| {
            if id == 0 {
                Factor::NO_ACCESS
            } else {
                Factor::from_speed_kmh(10.0)
            }
        };
        assert!(!profile.factor(0).is_passable());
        assert!(profile.factor(5).is_passable());
    }
}
