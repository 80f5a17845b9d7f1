//! Topology Configuration
//!
//! Wire-level records for the declarative topology format. A document names
//! its parameter templates, its nodes, its directed quantum and classical
//! channels, and the global simulation scalars:
//!
//! ```yaml
//! templates:
//!   perfect_memo:
//!     MemoryArray:
//!       fidelity: 1.0
//!       efficiency: 1.0
//! nodes:
//!   - name: router_0
//!     type: QuantumRouter
//!     seed: 0
//!     memo_size: 10
//!     template: perfect_memo
//!     gate_fidelity: 0.99
//!     measurement_fidelity: 0.99
//! qchannels: []
//! cchannels: []
//! stop_time: 1.0e13
//! is_parallel: false
//! ```
//!
//! Unknown top-level keys are ignored: partitioned-run drivers attach their
//! own keys (process counts, server addresses, lookahead) that the loader
//! must pass over. Unknown keys inside a record are rejected so field typos
//! fail at parse time instead of silently resolving to defaults.
//!
//! Records deliberately keep the node `type` tag as a raw string and integer
//! fields signed, so that unsupported tags and out-of-domain values surface
//! as builder diagnostics carrying the offending record's identity rather
//! than as parse errors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{Result, TopologyError};
use crate::nodes::EncodingType;

/// Top-level topology document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Named parameter templates, in declaration order
    #[serde(default)]
    pub templates: IndexMap<String, TemplateRecord>,
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub qchannels: Vec<QuantumChannelRecord>,
    #[serde(default)]
    pub cchannels: Vec<ClassicalChannelRecord>,
    /// Simulation horizon in picoseconds
    pub stop_time: f64,
    /// Whether the simulator partitions the run across processes
    #[serde(default)]
    pub is_parallel: bool,
}

impl TopologyConfig {
    /// Load a config from a JSON or YAML file, dispatching on the extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if !matches!(extension.as_str(), "json" | "yaml" | "yml") {
            return Err(TopologyError::UnsupportedFormat { extension });
        }
        let content = std::fs::read_to_string(path)?;
        let config = match extension.as_str() {
            "json" => Self::from_json(&content)?,
            _ => Self::from_yaml(&content)?,
        };
        debug!(
            "loaded topology config from {}: {} templates, {} nodes, {} qchannels, {} cchannels",
            path.display(),
            config.templates.len(),
            config.nodes.len(),
            config.qchannels.len(),
            config.cchannels.len()
        );
        Ok(config)
    }

    /// Parse a config from a JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse a config from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parameter template: an optional memory bundle plus scalar knobs.
///
/// Stored verbatim by the registry; content is validated when a node
/// resolves it, so a violation always names the consuming node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateRecord {
    /// Memory array parameter bundle, applied to a node in full
    #[serde(rename = "MemoryArray", skip_serializing_if = "Option::is_none")]
    pub memory_array: Option<MemoryArrayRecord>,
    /// Memories the adaptive-continuous protocol may commit per node
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adaptive_max_memory: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding_type: Option<EncodingType>,
}

/// Memory array parameter bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryArrayRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fidelity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<f64>,
    /// Coherence window in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coherence_time: Option<f64>,
    /// Per-channel depolarizing error weights, one per Pauli channel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoherence_errors: Option<Vec<f64>>,
}

/// Node record as declared on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    /// Per-node RNG seed
    pub seed: i64,
    /// Memories on the node's array; required for routers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo_size: Option<i64>,
    /// Partition group for parallel runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate_fidelity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement_fidelity: Option<f64>,
    /// Node-level override of the template's value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adaptive_max_memory: Option<i64>,
    /// Node-level override of the template's value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding_type: Option<EncodingType>,
}

/// Directed quantum channel record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuantumChannelRecord {
    pub source: String,
    pub destination: String,
    /// Fiber length in meters
    pub distance: f64,
    /// Loss coefficient in dB per meter
    pub attenuation: f64,
}

/// Directed classical channel record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassicalChannelRecord {
    pub source: String,
    pub destination: String,
    /// One-way latency in picoseconds
    pub delay: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "templates": {
            "perfect_memo": {
                "MemoryArray": {"fidelity": 1.0, "efficiency": 1.0}
            }
        },
        "nodes": [
            {"name": "router_0", "type": "QuantumRouter", "seed": 0,
             "memo_size": 10, "template": "perfect_memo",
             "gate_fidelity": 0.99, "measurement_fidelity": 0.99}
        ],
        "qchannels": [],
        "cchannels": [],
        "stop_time": 1e13,
        "is_parallel": false
    }"#;

    #[test]
    fn test_parse_minimal_json() {
        let config = TopologyConfig::from_json(MINIMAL).unwrap();
        assert_eq!(config.templates.len(), 1);
        assert_eq!(config.nodes.len(), 1);
        assert_eq!(config.nodes[0].name, "router_0");
        assert_eq!(config.nodes[0].node_type, "QuantumRouter");
        assert_eq!(config.nodes[0].memo_size, Some(10));
        assert_eq!(config.stop_time, 1e13);
        assert!(!config.is_parallel);

        let memory = config.templates["perfect_memo"].memory_array.as_ref().unwrap();
        assert_eq!(memory.fidelity, Some(1.0));
        assert_eq!(memory.coherence_time, None);
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
templates:
  adaptive_protocol:
    MemoryArray:
      fidelity: 0.95
      efficiency: 0.5
      coherence_time: 1
      decoherence_errors: [0.3333333333333333, 0.3333333333333333, 0.3333333333333333]
    adaptive_max_memory: 0
    encoding_type: single_heralded
nodes: []
qchannels: []
cchannels: []
stop_time: 6.0e13
"#;
        let config = TopologyConfig::from_yaml(yaml).unwrap();
        let template = &config.templates["adaptive_protocol"];
        assert_eq!(template.adaptive_max_memory, Some(0));
        assert_eq!(template.encoding_type, Some(EncodingType::SingleHeralded));
        let memory = template.memory_array.as_ref().unwrap();
        assert_eq!(memory.coherence_time, Some(1.0));
        assert_eq!(memory.decoherence_errors.as_ref().unwrap().len(), 3);
        assert_eq!(config.stop_time, 6e13);
    }

    #[test]
    fn test_unknown_top_level_keys_ignored() {
        let json = r#"{
            "nodes": [], "qchannels": [], "cchannels": [],
            "stop_time": 1e13, "is_parallel": true,
            "proc_num": 4, "ip": "127.0.0.1", "port": 6789, "lookahead": 200
        }"#;
        let config = TopologyConfig::from_json(json).unwrap();
        assert!(config.is_parallel);
        assert!(config.templates.is_empty());
    }

    #[test]
    fn test_unknown_record_key_rejected() {
        let json = r#"{
            "nodes": [
                {"name": "router_0", "type": "QuantumRouter", "seed": 0, "memo_sized": 10}
            ],
            "stop_time": 1e13
        }"#;
        let err = TopologyConfig::from_json(json).unwrap_err();
        assert_eq!(err.category(), "schema");
        assert!(err.to_string().contains("memo_sized"));
    }

    #[test]
    fn test_unknown_template_section_rejected() {
        let json = r#"{
            "templates": {"odd": {"DetectorArray": {"efficiency": 0.9}}},
            "stop_time": 1e13
        }"#;
        let err = TopologyConfig::from_json(json).unwrap_err();
        assert_eq!(err.category(), "schema");
    }

    #[test]
    fn test_missing_stop_time_rejected() {
        let err = TopologyConfig::from_json(r#"{"nodes": []}"#).unwrap_err();
        assert_eq!(err.category(), "schema");
        assert!(err.to_string().contains("stop_time"));
    }

    #[test]
    fn test_json_round_trip_preserves_order() {
        let config = TopologyConfig::from_json(MINIMAL).unwrap();
        let reparsed = TopologyConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(config, reparsed);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = TopologyConfig::from_file("topology.toml").unwrap_err();
        assert_eq!(err.category(), "io");
    }
}
