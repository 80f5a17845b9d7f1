//! Topology Model
//!
//! The immutable, validated network graph, plus the load pipeline that
//! builds it from a raw config. Loading either returns a complete model or
//! fails with every violation found; there is no partially built state.

use indexmap::{IndexMap, IndexSet};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::channels::{ChannelBuilder, ClassicalChannel, QuantumChannel};
use crate::config::{
    ClassicalChannelRecord, NodeRecord, QuantumChannelRecord, TemplateRecord, TopologyConfig,
};
use crate::error::{Result, ValidationReport};
use crate::nodes::{EntityBuilder, Node, NodeKind, NodeType};
use crate::templates::TemplateRegistry;
use crate::validation::{relay_peer_map, TopologyValidator};

/// Entity counts of a built model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopologySummary {
    pub node_count: usize,
    pub router_count: usize,
    pub bsm_count: usize,
    pub quantum_channel_count: usize,
    pub classical_channel_count: usize,
}

/// Immutable topology graph
///
/// Nodes are indexed by name for O(1) lookup and iterate in declaration
/// order. There is no mutation API: a different topology is a different
/// load.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyModel {
    templates: IndexMap<String, TemplateRecord>,
    nodes: IndexMap<String, Node>,
    qchannels: Vec<QuantumChannel>,
    cchannels: Vec<ClassicalChannel>,
    /// BSM node name -> router peers attached via quantum channels
    relay_peers: IndexMap<String, Vec<String>>,
    stop_time: f64,
    is_parallel: bool,
}

impl TopologyModel {
    /// Build and validate a model from a raw config.
    ///
    /// Entity-builder failures and graph-level violations are aggregated
    /// into a single `TopologyError::Validation`. The config is not
    /// consumed, so building is repeatable and produces equal models.
    pub fn build(config: &TopologyConfig) -> Result<Self> {
        let mut violations = ValidationReport::new();

        let mut registry = TemplateRegistry::new();
        for (name, record) in &config.templates {
            if let Err(error) = registry.register(name, record.clone()) {
                violations.push_error(&error);
            }
        }

        let mut nodes = Vec::with_capacity(config.nodes.len());
        for record in &config.nodes {
            match EntityBuilder::build(record, &registry) {
                Ok(node) => {
                    debug!("built node '{}' ({})", node.name, node.node_type());
                    nodes.push(node);
                }
                Err(error) => violations.push_error(&error),
            }
        }

        let known: IndexSet<String> = nodes.iter().map(|n| n.name.clone()).collect();

        let mut qchannels = Vec::with_capacity(config.qchannels.len());
        for record in &config.qchannels {
            match ChannelBuilder::build_quantum(record, &known) {
                Ok(channel) => qchannels.push(channel),
                Err(error) => violations.push_error(&error),
            }
        }

        let mut cchannels = Vec::with_capacity(config.cchannels.len());
        for record in &config.cchannels {
            match ChannelBuilder::build_classical(record, &known) {
                Ok(channel) => cchannels.push(channel),
                Err(error) => violations.push_error(&error),
            }
        }

        violations.extend(TopologyValidator::check(
            &nodes,
            &qchannels,
            &cchannels,
            config.stop_time,
        ));
        violations.into_result()?;

        warn_duplicate_seeds(&nodes);

        let relay_peers = relay_peer_map(&nodes, &qchannels)
            .into_iter()
            .map(|(bsm, peers)| {
                (
                    bsm.to_string(),
                    peers.into_iter().map(str::to_string).collect(),
                )
            })
            .collect();

        let model = Self {
            templates: config.templates.clone(),
            nodes: nodes.into_iter().map(|n| (n.name.clone(), n)).collect(),
            qchannels,
            cchannels,
            relay_peers,
            stop_time: config.stop_time,
            is_parallel: config.is_parallel,
        };

        let summary = model.summary();
        info!(
            "topology loaded: {} nodes ({} routers, {} BSM relays), {} quantum channels, {} classical channels",
            summary.node_count,
            summary.router_count,
            summary.bsm_count,
            summary.quantum_channel_count,
            summary.classical_channel_count
        );
        Ok(model)
    }

    /// Load a config file and build the model
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = TopologyConfig::from_file(path)?;
        Self::build(&config)
    }

    /// Look up a node by name
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// Nodes in declaration order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes of one type, in declaration order
    pub fn nodes_by_type(&self, node_type: NodeType) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|n| n.node_type() == node_type)
            .collect()
    }

    pub fn routers(&self) -> Vec<&Node> {
        self.nodes_by_type(NodeType::QuantumRouter)
    }

    pub fn bsm_nodes(&self) -> Vec<&Node> {
        self.nodes_by_type(NodeType::BsmNode)
    }

    pub fn quantum_channels(&self) -> &[QuantumChannel] {
        &self.qchannels
    }

    pub fn classical_channels(&self) -> &[ClassicalChannel] {
        &self.cchannels
    }

    /// Router peers a BSM relay serves, in quantum-channel order
    pub fn relay_peers(&self, bsm: &str) -> Option<&[String]> {
        self.relay_peers.get(bsm).map(|peers| peers.as_slice())
    }

    /// Template records as declared, verbatim
    pub fn templates(&self) -> &IndexMap<String, TemplateRecord> {
        &self.templates
    }

    pub fn template(&self, name: &str) -> Option<&TemplateRecord> {
        self.templates.get(name)
    }

    /// Simulation horizon in picoseconds
    pub fn stop_time(&self) -> f64 {
        self.stop_time
    }

    pub fn is_parallel(&self) -> bool {
        self.is_parallel
    }

    pub fn summary(&self) -> TopologySummary {
        let router_count = self.nodes.values().filter(|n| n.is_router()).count();
        TopologySummary {
            node_count: self.nodes.len(),
            router_count,
            bsm_count: self.nodes.len() - router_count,
            quantum_channel_count: self.qchannels.len(),
            classical_channel_count: self.cchannels.len(),
        }
    }

    /// Serialize back to the wire shape.
    ///
    /// Fields a record left implicit are written out resolved (a router's
    /// group, for instance), except where the node's template supplies the
    /// value; rebuilding the result yields a model equal to this one.
    pub fn to_config(&self) -> TopologyConfig {
        TopologyConfig {
            templates: self.templates.clone(),
            nodes: self.nodes.values().map(|n| self.node_record(n)).collect(),
            qchannels: self
                .qchannels
                .iter()
                .map(|c| QuantumChannelRecord {
                    source: c.source.clone(),
                    destination: c.destination.clone(),
                    distance: c.distance,
                    attenuation: c.attenuation,
                })
                .collect(),
            cchannels: self
                .cchannels
                .iter()
                .map(|c| ClassicalChannelRecord {
                    source: c.source.clone(),
                    destination: c.destination.clone(),
                    delay: c.delay,
                })
                .collect(),
            stop_time: self.stop_time,
            is_parallel: self.is_parallel,
        }
    }

    fn node_record(&self, node: &Node) -> NodeRecord {
        let template = node
            .template
            .as_ref()
            .and_then(|name| self.templates.get(name));

        // emit the scalar overrides only where the resolved value differs
        // from what the template (or the built-in default) supplies
        let template_max = template.and_then(|t| t.adaptive_max_memory).unwrap_or(0);
        let adaptive_max_memory = if i64::from(node.adaptive_max_memory) != template_max {
            Some(i64::from(node.adaptive_max_memory))
        } else {
            None
        };
        let template_encoding = template.and_then(|t| t.encoding_type).unwrap_or_default();
        let encoding_type = if node.encoding != template_encoding {
            Some(node.encoding)
        } else {
            None
        };

        let (memo_size, gate_fidelity, measurement_fidelity) = match &node.kind {
            NodeKind::Router(params) => (
                Some(i64::from(params.memo_size)),
                Some(params.gate_fidelity),
                Some(params.measurement_fidelity),
            ),
            NodeKind::Bsm => (None, None, None),
        };

        NodeRecord {
            name: node.name.clone(),
            node_type: node.node_type().as_tag().to_string(),
            seed: node.seed as i64,
            memo_size,
            group: Some(node.group),
            template: node.template.clone(),
            gate_fidelity,
            measurement_fidelity,
            adaptive_max_memory,
            encoding_type,
        }
    }
}

fn warn_duplicate_seeds(nodes: &[Node]) {
    let mut by_seed: IndexMap<u64, Vec<&str>> = IndexMap::new();
    for node in nodes {
        by_seed.entry(node.seed).or_default().push(&node.name);
    }
    for (seed, names) in by_seed {
        if names.len() > 1 {
            warn!("seed {} is shared by nodes {:?}", seed, names);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{TopologyError, ViolationKind};
    use crate::generator::LineTopology;

    fn line(size: usize) -> TopologyConfig {
        LineTopology {
            size,
            ..LineTopology::default()
        }
        .build()
    }

    #[test]
    fn test_build_line() {
        let config = line(3);
        let model = TopologyModel::build(&config).unwrap();

        let summary = model.summary();
        assert_eq!(summary.node_count, 5);
        assert_eq!(summary.router_count, 3);
        assert_eq!(summary.bsm_count, 2);
        assert_eq!(summary.quantum_channel_count, 4);
        // 4 per BSM relay plus the full router mesh
        assert_eq!(summary.classical_channel_count, 4 * 2 + 3 * 2);

        assert!(model.node("router_0").unwrap().is_router());
        assert!(model.node("BSM_1_2").unwrap().is_bsm());
        assert!(model.node("router_9").is_none());
        assert_eq!(model.routers().len(), 3);
        assert_eq!(model.bsm_nodes().len(), 2);
    }

    #[test]
    fn test_nodes_iterate_in_declaration_order() {
        let model = TopologyModel::build(&line(3)).unwrap();
        let names: Vec<&str> = model.nodes().map(|n| n.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["router_0", "router_1", "router_2", "BSM_0_1", "BSM_1_2"]
        );
    }

    #[test]
    fn test_relay_peers() {
        let model = TopologyModel::build(&line(3)).unwrap();
        assert_eq!(
            model.relay_peers("BSM_0_1").unwrap(),
            &["router_0".to_string(), "router_1".to_string()]
        );
        assert!(model.relay_peers("router_0").is_none());
    }

    #[test]
    fn test_build_is_idempotent() {
        let config = line(4);
        let first = TopologyModel::build(&config).unwrap();
        let second = TopologyModel::build(&config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_round_trip() {
        let model = TopologyModel::build(&line(4)).unwrap();
        let rebuilt = TopologyModel::build(&model.to_config()).unwrap();
        assert_eq!(model, rebuilt);
    }

    #[test]
    fn test_failed_load_reports_all_violations() {
        let mut config = line(3);
        config.nodes[0].seed = -1;
        config.nodes[1].memo_size = None;
        config.stop_time = 0.0;

        let err = TopologyModel::build(&config).unwrap_err();
        let report = match err {
            TopologyError::Validation(report) => report,
            other => panic!("expected validation error, got {}", other),
        };
        assert!(!report.of_kind(ViolationKind::InvalidRange).is_empty());
        assert!(!report.of_kind(ViolationKind::MissingRequiredField).is_empty());
        assert!(!report.of_kind(ViolationKind::InvalidStopTime).is_empty());
        // the failed routers' channels surface as unknown endpoints
        assert!(!report.of_kind(ViolationKind::UnknownEndpoint).is_empty());
    }

    #[test]
    fn test_failed_node_cascades_to_endpoints() {
        let mut config = line(2);
        config.nodes[0].node_type = "Repeater".to_string();

        let err = TopologyModel::build(&config).unwrap_err();
        let report = match err {
            TopologyError::Validation(report) => report,
            other => panic!("expected validation error, got {}", other),
        };
        assert_eq!(
            report.of_kind(ViolationKind::UnsupportedNodeType).len(),
            1
        );
        // router_0's quantum and classical channels all dangle
        assert!(!report.of_kind(ViolationKind::UnknownEndpoint).is_empty());
    }

    #[test]
    fn test_template_content_fails_on_consuming_node() {
        let mut config = line(2);
        let memory = config
            .templates
            .get_mut("adaptive_protocol")
            .unwrap()
            .memory_array
            .as_mut()
            .unwrap();
        memory.fidelity = Some(1.0001);

        let err = TopologyModel::build(&config).unwrap_err();
        let report = match err {
            TopologyError::Validation(report) => report,
            other => panic!("expected validation error, got {}", other),
        };
        let ranges = report.of_kind(ViolationKind::InvalidRange);
        // every node resolving the template reports it
        assert!(!ranges.is_empty());
        assert!(ranges[0].message.contains("fidelity"));
    }

    #[test]
    fn test_model_survives_config_mutation() {
        let mut config = line(3);
        let model = TopologyModel::build(&config).unwrap();
        config.nodes.clear();
        assert_eq!(model.node_count(), 5);
    }
}
