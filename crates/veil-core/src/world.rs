//! World-state enums driving the ambient beds and masking curves
//!
//! The masking curves are evaluated over an enum's normalized ordinal,
//! so variant order is meaningful: weather orders by how much noise it
//! makes, time-of-day by how lively the world is.

use serde::{Deserialize, Serialize};

/// Kind of space the listener is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Indoor,
    #[default]
    Outdoor,
    Urban,
    Cave,
    Forest,
    Underwater,
}

impl Environment {
    pub const COUNT: usize = 6;

    /// All variants, in ordinal order
    pub const ALL: [Environment; Self::COUNT] = [
        Environment::Indoor,
        Environment::Outdoor,
        Environment::Urban,
        Environment::Cave,
        Environment::Forest,
        Environment::Underwater,
    ];
}

/// Current weather
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    #[default]
    Clear,
    Rain,
    Storm,
    Fog,
}

impl Weather {
    pub const COUNT: usize = 4;

    /// Ordinal position normalized to [0, 1] for curve evaluation
    pub fn normalized(self) -> f32 {
        self as usize as f32 / (Self::COUNT - 1) as f32
    }
}

/// Time-of-day band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    #[default]
    Day,
    Evening,
    Night,
    Dawn,
}

impl TimeOfDay {
    pub const COUNT: usize = 4;

    /// Ordinal position normalized to [0, 1] for curve evaluation
    pub fn normalized(self) -> f32 {
        self as usize as f32 / (Self::COUNT - 1) as f32
    }
}

/// Combined world state as reported by the environment collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WorldState {
    pub environment: Environment,
    pub weather: Weather,
    pub time_of_day: TimeOfDay,
}

impl WorldState {
    pub fn new(environment: Environment, weather: Weather, time_of_day: TimeOfDay) -> Self {
        Self {
            environment,
            weather,
            time_of_day,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_endpoints() {
        assert_eq!(Weather::Clear.normalized(), 0.0);
        assert_eq!(Weather::Fog.normalized(), 1.0);
        assert_eq!(TimeOfDay::Day.normalized(), 0.0);
        assert_eq!(TimeOfDay::Dawn.normalized(), 1.0);
    }

    #[test]
    fn test_serde_round_trip() {
        let state = WorldState::new(Environment::Cave, Weather::Storm, TimeOfDay::Night);
        let json = serde_json::to_string(&state).unwrap();
        let back: WorldState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
    }
}
