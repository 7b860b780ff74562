use serde::{Deserialize, Serialize};

use crate::net::EcmpMode;

/// A complete simulation input: fabric shape, scheduling method and flows.
///
/// Applied through the same calls an embedding harness would make, so a
/// scenario file gets exactly the same validation as programmatic use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub topology: TopologySpec,
    pub method: String,
    #[serde(default)]
    pub ecmp: Option<EcmpMode>,
    #[serde(default)]
    pub record_rates: bool,
    #[serde(default)]
    pub flows: Vec<FlowSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologySpec {
    pub num_leaves: usize,
    pub num_spines: usize,
    pub ports_per_leaf: usize,
    /// Bytes per second of a single leaf port.
    #[serde(default)]
    pub port_capacity: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSpec {
    pub id: u64,
    pub src: usize,
    pub dst: usize,
    pub size_bytes: u64,
    /// Arrival time in seconds.
    pub arrival: f64,
    #[serde(default)]
    pub weight: Option<f64>,
    /// Defaults to the flow id when absent.
    #[serde(default)]
    pub ecmp_hash: Option<u64>,
}
