//! Node Model and Entity Builder
//!
//! Turns raw node records into fully resolved, immutable nodes. Resolution
//! is single-level and statically analyzable: built-in defaults first, then
//! the referenced template, then the record's own fields. The memory bundle
//! is taken from the template in full; only the scalar knobs
//! (`adaptive_max_memory`, `encoding_type`) can be overridden per node.
//!
//! Builders fail fast with the first problem found in a record, checked in
//! field order: name, type, template, seed, type-specific fields, adaptive
//! memory limit, encoding, memory bundle. Graph-wide concerns (duplicate
//! names, group domains) belong to the validator.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::config::{NodeRecord, TemplateRecord};
use crate::error::{Result, TopologyError};
use crate::templates::TemplateRegistry;
use crate::DECOHERENCE_CHANNELS;

static NODE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("node name pattern"));

/// Absorbs accumulation error in thirds-style error distributions
const DECOHERENCE_SUM_EPSILON: f64 = 1e-9;

/// Node type tags the loader supports.
///
/// The tag drives which record fields are mandatory, so it is a closed
/// enumeration rather than free-form text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    QuantumRouter,
    BsmNode,
}

impl NodeType {
    /// Wire tag as it appears in a record's `type` field
    pub fn as_tag(&self) -> &'static str {
        match self {
            NodeType::QuantumRouter => "QuantumRouter",
            NodeType::BsmNode => "BSMNode",
        }
    }

    /// Parse a wire tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "QuantumRouter" => Some(NodeType::QuantumRouter),
            "BSMNode" => Some(NodeType::BsmNode),
            _ => None,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Photon encoding schemes the entanglement generation protocol supports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingType {
    #[default]
    SingleAtom,
    SingleHeralded,
}

impl EncodingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EncodingType::SingleAtom => "single_atom",
            EncodingType::SingleHeralded => "single_heralded",
        }
    }
}

impl fmt::Display for EncodingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved memory array parameters
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryParams {
    pub fidelity: f64,
    pub efficiency: f64,
    /// Coherence window in seconds; `None` models an unlimited memory
    pub coherence_time: Option<f64>,
    /// Per-channel depolarizing error weights
    pub decoherence_errors: Option<[f64; DECOHERENCE_CHANNELS]>,
}

impl Default for MemoryParams {
    fn default() -> Self {
        Self {
            fidelity: 1.0,
            efficiency: 1.0,
            coherence_time: None,
            decoherence_errors: None,
        }
    }
}

/// Router-only parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RouterParams {
    /// Memories on the router's array
    pub memo_size: u32,
    pub gate_fidelity: f64,
    pub measurement_fidelity: f64,
}

/// Type-specific node payload
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Router(RouterParams),
    Bsm,
}

/// Fully resolved topology node
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    /// Per-node RNG seed
    pub seed: u64,
    /// Partition group for parallel runs; the validator enforces the domain
    pub group: i64,
    /// Template the node resolved, if any
    pub template: Option<String>,
    pub memory: MemoryParams,
    /// Memories the adaptive-continuous protocol may commit on this node
    pub adaptive_max_memory: u32,
    pub encoding: EncodingType,
    pub kind: NodeKind,
}

impl Node {
    pub fn node_type(&self) -> NodeType {
        match self.kind {
            NodeKind::Router(_) => NodeType::QuantumRouter,
            NodeKind::Bsm => NodeType::BsmNode,
        }
    }

    pub fn is_router(&self) -> bool {
        matches!(self.kind, NodeKind::Router(_))
    }

    pub fn is_bsm(&self) -> bool {
        matches!(self.kind, NodeKind::Bsm)
    }

    /// Router parameters, when this node is a router
    pub fn router_params(&self) -> Option<&RouterParams> {
        match &self.kind {
            NodeKind::Router(params) => Some(params),
            NodeKind::Bsm => None,
        }
    }
}

/// Builds resolved nodes from raw records
pub struct EntityBuilder;

impl EntityBuilder {
    /// Resolve one raw record against the registry.
    ///
    /// Fails with the first problem found; the record is otherwise untouched,
    /// so a failed build has no side effects.
    pub fn build(record: &NodeRecord, registry: &TemplateRegistry) -> Result<Node> {
        let name = record.name.as_str();
        if !NODE_NAME.is_match(name) {
            return Err(TopologyError::InvalidNodeName {
                name: record.name.clone(),
            });
        }

        let node_type = NodeType::from_tag(&record.node_type).ok_or_else(|| {
            TopologyError::unsupported_node_type(name, record.node_type.clone())
        })?;

        let template = match &record.template {
            Some(reference) => Some(registry.get(reference).ok_or_else(|| {
                TopologyError::unknown_template_reference(name, reference.clone())
            })?),
            None => None,
        };

        let seed = u64::try_from(record.seed).map_err(|_| {
            TopologyError::invalid_range(
                name,
                "seed",
                format!("must be non-negative, got {}", record.seed),
            )
        })?;

        let kind = match node_type {
            NodeType::QuantumRouter => NodeKind::Router(Self::router_params(name, record)?),
            NodeType::BsmNode => {
                if record.memo_size.is_some()
                    || record.gate_fidelity.is_some()
                    || record.measurement_fidelity.is_some()
                {
                    warn!(
                        "node '{}': memo_size and fidelity fields are ignored for BSM nodes",
                        name
                    );
                }
                NodeKind::Bsm
            }
        };

        let adaptive_max_memory = Self::resolve_adaptive_max_memory(name, record, template)?;
        let encoding = record
            .encoding_type
            .or_else(|| template.and_then(|t| t.encoding_type))
            .unwrap_or_default();
        let memory = Self::resolve_memory(name, template)?;

        Ok(Node {
            name: record.name.clone(),
            seed,
            group: record.group.unwrap_or(0),
            template: record.template.clone(),
            memory,
            adaptive_max_memory,
            encoding,
            kind,
        })
    }

    fn router_params(name: &str, record: &NodeRecord) -> Result<RouterParams> {
        let memo_size = match record.memo_size {
            Some(value) if value > 0 => u32::try_from(value).map_err(|_| {
                TopologyError::invalid_range(
                    name,
                    "memo_size",
                    format!("must be within [1, {}], got {}", u32::MAX, value),
                )
            })?,
            Some(value) => {
                return Err(TopologyError::invalid_range(
                    name,
                    "memo_size",
                    format!("must be positive, got {}", value),
                ))
            }
            None => return Err(TopologyError::missing_required_field(name, "memo_size")),
        };

        let gate_fidelity = record
            .gate_fidelity
            .ok_or_else(|| TopologyError::missing_required_field(name, "gate_fidelity"))?;
        check_unit_interval(name, "gate_fidelity", gate_fidelity)?;

        let measurement_fidelity = record
            .measurement_fidelity
            .ok_or_else(|| TopologyError::missing_required_field(name, "measurement_fidelity"))?;
        check_unit_interval(name, "measurement_fidelity", measurement_fidelity)?;

        Ok(RouterParams {
            memo_size,
            gate_fidelity,
            measurement_fidelity,
        })
    }

    fn resolve_adaptive_max_memory(
        name: &str,
        record: &NodeRecord,
        template: Option<&TemplateRecord>,
    ) -> Result<u32> {
        let value = record
            .adaptive_max_memory
            .or_else(|| template.and_then(|t| t.adaptive_max_memory))
            .unwrap_or(0);
        u32::try_from(value).map_err(|_| {
            TopologyError::invalid_range(
                name,
                "adaptive_max_memory",
                format!("must be within [0, {}], got {}", u32::MAX, value),
            )
        })
    }

    fn resolve_memory(name: &str, template: Option<&TemplateRecord>) -> Result<MemoryParams> {
        let bundle = match template.and_then(|t| t.memory_array.as_ref()) {
            Some(bundle) => bundle,
            None => return Ok(MemoryParams::default()),
        };

        let memory = MemoryParams {
            fidelity: bundle.fidelity.unwrap_or(1.0),
            efficiency: bundle.efficiency.unwrap_or(1.0),
            coherence_time: bundle.coherence_time,
            decoherence_errors: match &bundle.decoherence_errors {
                Some(values) => {
                    let errors: [f64; DECOHERENCE_CHANNELS] =
                        values.as_slice().try_into().map_err(|_| {
                            TopologyError::invalid_range(
                                name,
                                "decoherence_errors",
                                format!(
                                    "expected exactly {} entries, got {}",
                                    DECOHERENCE_CHANNELS,
                                    values.len()
                                ),
                            )
                        })?;
                    Some(errors)
                }
                None => None,
            },
        };

        check_unit_interval(name, "fidelity", memory.fidelity)?;
        check_unit_interval(name, "efficiency", memory.efficiency)?;
        if let Some(coherence_time) = memory.coherence_time {
            if !(coherence_time >= 0.0) {
                return Err(TopologyError::invalid_range(
                    name,
                    "coherence_time",
                    format!("must be non-negative, got {}", coherence_time),
                ));
            }
        }
        if let Some(errors) = &memory.decoherence_errors {
            for &weight in errors {
                if !(weight >= 0.0) {
                    return Err(TopologyError::invalid_range(
                        name,
                        "decoherence_errors",
                        format!("entries must be non-negative, got {}", weight),
                    ));
                }
            }
            let total: f64 = errors.iter().sum();
            if total > 1.0 + DECOHERENCE_SUM_EPSILON {
                return Err(TopologyError::invalid_range(
                    name,
                    "decoherence_errors",
                    format!("entries must sum to at most 1, got {}", total),
                ));
            }
        }

        Ok(memory)
    }
}

fn check_unit_interval(subject: &str, field: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(TopologyError::invalid_range(
            subject,
            field,
            format!("must be within [0.0, 1.0], got {}", value),
        ));
    }
    Ok(())
}
