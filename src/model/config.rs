//! Router tuning knobs, carried as ambient configuration the way
//! `ferrobus_core::loading::TransitModelConfig` carries loader tuning:
//! a plain `serde`-derived struct with a `Default` impl, format-agnostic
//! (the embedder decides whether it comes from TOML, JSON, or env vars).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// `R` in spec.md §4.3 — the maximum number of RAPTOR rounds
    /// (one more than the maximum number of transfers).
    pub max_rounds: usize,
    /// Walking speed used when a request does not override it, in
    /// meters/second.
    pub default_walk_speed_mps: f64,
    /// Fixed per-transfer slack added on top of walking time, in seconds.
    pub default_walk_slack_sec: u32,
    /// Cap on how many stops a single [`crate::spatial::HashGrid`] query
    /// returns, protecting dense urban cores from pathological fan-out.
    pub max_candidate_stops: usize,
    /// Edge length of a [`crate::spatial::HashGrid`] cell, in meters.
    pub hash_grid_cell_size_m: f64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            max_rounds: 8,
            default_walk_speed_mps: 1.3,
            default_walk_slack_sec: 60,
            max_candidate_stops: 8,
            hash_grid_cell_size_m: 500.0,
        }
    }
}
