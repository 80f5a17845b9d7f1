//! Topology Generators
//!
//! Programmatic builders for the standard simulation shapes: a chain of
//! routers with a BSM relay between each adjacent pair, and a star of leaf
//! routers around a center. Both emit plain configs, so generated topologies
//! go through the same load-and-validate pipeline as hand-written ones.

use indexmap::IndexMap;

use crate::config::{
    ClassicalChannelRecord, MemoryArrayRecord, NodeRecord, QuantumChannelRecord, TemplateRecord,
    TopologyConfig,
};
use crate::nodes::{EncodingType, NodeType};
use crate::DECOHERENCE_CHANNELS;

/// Picoseconds per second
pub const PS_PER_SECOND: f64 = 1e12;
/// Picoseconds per millisecond
pub const PS_PER_MILLISECOND: f64 = 1e9;
/// Meters per kilometer
pub const METERS_PER_KM: f64 = 1000.0;

const PERFECT_MEMO_TEMPLATE: &str = "perfect_memo";
const ADAPTIVE_TEMPLATE: &str = "adaptive_protocol";

/// Name of the i-th router
pub fn router_name(index: usize) -> String {
    format!("router_{}", index)
}

/// Name of the BSM relay between two routers of a chain
pub fn bsm_name(left: usize, right: usize) -> String {
    format!("BSM_{}_{}", left, right)
}

fn perfect_memo_template() -> TemplateRecord {
    TemplateRecord {
        memory_array: Some(MemoryArrayRecord {
            fidelity: Some(1.0),
            efficiency: Some(1.0),
            coherence_time: None,
            decoherence_errors: None,
        }),
        adaptive_max_memory: None,
        encoding_type: None,
    }
}

/// All ordered router pairs, one classical channel each
fn router_mesh(router_names: &[String], delay_ps: f64) -> Vec<ClassicalChannelRecord> {
    let mut cchannels = Vec::new();
    for source in router_names {
        for destination in router_names {
            if source == destination {
                continue;
            }
            cchannels.push(ClassicalChannelRecord {
                source: source.clone(),
                destination: destination.clone(),
                delay: delay_ps,
            });
        }
    }
    cchannels
}

/// Both classical directions between a BSM relay and one router
fn bsm_loop(bsm: &str, router: &str, delay_ps: f64) -> [ClassicalChannelRecord; 2] {
    [
        ClassicalChannelRecord {
            source: bsm.to_string(),
            destination: router.to_string(),
            delay: delay_ps,
        },
        ClassicalChannelRecord {
            source: router.to_string(),
            destination: bsm.to_string(),
            delay: delay_ps,
        },
    ]
}

/// Chain of routers joined by BSM relays.
///
/// Adjacent routers share a relay; every router carries the adaptive
/// protocol template and the routers form a full classical mesh. Defaults
/// mirror the shipped five-router example.
#[derive(Debug, Clone)]
pub struct LineTopology {
    /// Routers in the chain
    pub size: usize,
    /// Memories per router
    pub memo_size: u32,
    /// Router-to-router link length in km; a router-relay hop is half
    pub qc_length_km: f64,
    /// Quantum channel loss in dB per meter
    pub qc_attenuation: f64,
    /// Classical one-way delay in ms
    pub cc_delay_ms: f64,
    /// Simulation horizon in seconds
    pub stop_time_s: f64,
    pub gate_fidelity: f64,
    pub measurement_fidelity: f64,
}

impl Default for LineTopology {
    fn default() -> Self {
        Self {
            size: 5,
            memo_size: 10,
            qc_length_km: 1.0,
            qc_attenuation: 0.0002,
            cc_delay_ms: 1.0,
            stop_time_s: 10.0,
            gate_fidelity: 0.99,
            measurement_fidelity: 0.99,
        }
    }
}

impl LineTopology {
    pub fn build(&self) -> TopologyConfig {
        let mut templates = IndexMap::new();
        templates.insert(PERFECT_MEMO_TEMPLATE.to_string(), perfect_memo_template());
        templates.insert(
            ADAPTIVE_TEMPLATE.to_string(),
            TemplateRecord {
                memory_array: Some(MemoryArrayRecord {
                    fidelity: Some(0.95),
                    efficiency: Some(0.5),
                    coherence_time: Some(1.0),
                    decoherence_errors: Some(vec![1.0 / 3.0; DECOHERENCE_CHANNELS]),
                }),
                adaptive_max_memory: Some(0),
                encoding_type: Some(EncodingType::SingleHeralded),
            },
        );

        let router_names: Vec<String> = (0..self.size).map(router_name).collect();
        let mut nodes: Vec<NodeRecord> = router_names
            .iter()
            .enumerate()
            .map(|(i, name)| NodeRecord {
                name: name.clone(),
                node_type: NodeType::QuantumRouter.as_tag().to_string(),
                seed: i as i64,
                memo_size: Some(i64::from(self.memo_size)),
                group: Some(0),
                template: Some(ADAPTIVE_TEMPLATE.to_string()),
                gate_fidelity: Some(self.gate_fidelity),
                measurement_fidelity: Some(self.measurement_fidelity),
                adaptive_max_memory: None,
                encoding_type: None,
            })
            .collect();

        let hop_distance = self.qc_length_km * METERS_PER_KM / 2.0;
        let delay_ps = self.cc_delay_ms * PS_PER_MILLISECOND;
        let mut qchannels = Vec::new();
        let mut cchannels = Vec::new();

        for i in 0..self.size.saturating_sub(1) {
            let bsm = bsm_name(i, i + 1);
            nodes.push(NodeRecord {
                name: bsm.clone(),
                node_type: NodeType::BsmNode.as_tag().to_string(),
                seed: i as i64,
                memo_size: None,
                group: None,
                template: Some(ADAPTIVE_TEMPLATE.to_string()),
                gate_fidelity: None,
                measurement_fidelity: None,
                adaptive_max_memory: None,
                encoding_type: None,
            });
            for router in [&router_names[i], &router_names[i + 1]] {
                qchannels.push(QuantumChannelRecord {
                    source: router.clone(),
                    destination: bsm.clone(),
                    distance: hop_distance,
                    attenuation: self.qc_attenuation,
                });
                cchannels.extend(bsm_loop(&bsm, router, delay_ps));
            }
        }
        cchannels.extend(router_mesh(&router_names, delay_ps));

        TopologyConfig {
            templates,
            nodes,
            qchannels,
            cchannels,
            stop_time: self.stop_time_s * PS_PER_SECOND,
            is_parallel: false,
        }
    }
}

/// Star of leaf routers around a center router.
///
/// Each leaf reaches the center through its own BSM relay. The adaptive
/// template here trades a little fidelity for committed memories and leaves
/// the encoding at its default.
#[derive(Debug, Clone)]
pub struct StarTopology {
    /// Leaf routers (total routers is `leaves + 1`)
    pub leaves: usize,
    /// Memories per leaf router
    pub memo_size: u32,
    /// Memories on the center router
    pub center_memo_size: u32,
    /// Leaf-to-center link length in km; a router-relay hop is half
    pub qc_length_km: f64,
    /// Quantum channel loss in dB per meter
    pub qc_attenuation: f64,
    /// Classical one-way delay in ms
    pub cc_delay_ms: f64,
    /// Simulation horizon in seconds
    pub stop_time_s: f64,
    pub gate_fidelity: f64,
    pub measurement_fidelity: f64,
}

impl Default for StarTopology {
    fn default() -> Self {
        Self {
            leaves: 5,
            memo_size: 10,
            center_memo_size: 20,
            qc_length_km: 1.0,
            qc_attenuation: 0.0002,
            cc_delay_ms: 1.0,
            stop_time_s: 10.0,
            gate_fidelity: 0.99,
            measurement_fidelity: 0.99,
        }
    }
}

impl StarTopology {
    /// Name of the center router
    pub fn center_name() -> &'static str {
        "router_center"
    }

    pub fn build(&self) -> TopologyConfig {
        let mut templates = IndexMap::new();
        templates.insert(PERFECT_MEMO_TEMPLATE.to_string(), perfect_memo_template());
        templates.insert(
            ADAPTIVE_TEMPLATE.to_string(),
            TemplateRecord {
                memory_array: Some(MemoryArrayRecord {
                    fidelity: Some(0.98),
                    efficiency: Some(0.5),
                    coherence_time: None,
                    decoherence_errors: None,
                }),
                adaptive_max_memory: Some(2),
                encoding_type: None,
            },
        );

        let mut router_names: Vec<String> = (0..self.leaves).map(router_name).collect();
        router_names.push(Self::center_name().to_string());

        let mut nodes: Vec<NodeRecord> = router_names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let is_center = name == Self::center_name();
                NodeRecord {
                    name: name.clone(),
                    node_type: NodeType::QuantumRouter.as_tag().to_string(),
                    seed: i as i64,
                    memo_size: Some(i64::from(if is_center {
                        self.center_memo_size
                    } else {
                        self.memo_size
                    })),
                    group: Some(0),
                    template: Some(ADAPTIVE_TEMPLATE.to_string()),
                    gate_fidelity: Some(self.gate_fidelity),
                    measurement_fidelity: Some(self.measurement_fidelity),
                    adaptive_max_memory: None,
                    encoding_type: None,
                }
            })
            .collect();

        let hop_distance = self.qc_length_km * METERS_PER_KM / 2.0;
        let delay_ps = self.cc_delay_ms * PS_PER_MILLISECOND;
        let mut qchannels = Vec::new();
        let mut cchannels = Vec::new();

        for i in 0..self.leaves {
            let bsm = format!("BSM_{}", i);
            nodes.push(NodeRecord {
                name: bsm.clone(),
                node_type: NodeType::BsmNode.as_tag().to_string(),
                seed: i as i64,
                memo_size: None,
                group: None,
                template: None,
                gate_fidelity: None,
                measurement_fidelity: None,
                adaptive_max_memory: None,
                encoding_type: None,
            });
            for router in [&router_names[i], &router_names[self.leaves]] {
                qchannels.push(QuantumChannelRecord {
                    source: router.clone(),
                    destination: bsm.clone(),
                    distance: hop_distance,
                    attenuation: self.qc_attenuation,
                });
                cchannels.extend(bsm_loop(&bsm, router, delay_ps));
            }
        }
        cchannels.extend(router_mesh(&router_names, delay_ps));

        TopologyConfig {
            templates,
            nodes,
            qchannels,
            cchannels,
            stop_time: self.stop_time_s * PS_PER_SECOND,
            is_parallel: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TopologyModel;

    #[test]
    fn test_line_shape() {
        let config = LineTopology::default().build();
        assert_eq!(config.nodes.len(), 9);
        assert_eq!(config.qchannels.len(), 8);
        // 4 classical channels per relay plus the full router mesh
        assert_eq!(config.cchannels.len(), 4 * 4 + 5 * 4);
        assert_eq!(config.stop_time, 1e13);
        assert!(!config.is_parallel);

        // half-link hops, symmetric delays
        assert!(config.qchannels.iter().all(|c| c.distance == 500.0));
        assert!(config.cchannels.iter().all(|c| c.delay == 1e9));
    }

    #[test]
    fn test_line_validates() {
        for size in [2, 3, 5, 8] {
            let config = LineTopology {
                size,
                ..LineTopology::default()
            }
            .build();
            let model = TopologyModel::build(&config).unwrap();
            assert_eq!(model.node_count(), 2 * size - 1);
            assert_eq!(model.quantum_channels().len(), 2 * (size - 1));
            assert_eq!(
                model.classical_channels().len(),
                4 * (size - 1) + size * (size - 1)
            );
        }
    }

    #[test]
    fn test_line_template_flavor() {
        let config = LineTopology::default().build();
        let model = TopologyModel::build(&config).unwrap();

        let router = model.node("router_2").unwrap();
        assert_eq!(router.memory.fidelity, 0.95);
        assert_eq!(router.memory.coherence_time, Some(1.0));
        assert_eq!(
            router.memory.decoherence_errors,
            Some([1.0 / 3.0; DECOHERENCE_CHANNELS])
        );
        assert_eq!(router.encoding, EncodingType::SingleHeralded);
        assert_eq!(router.adaptive_max_memory, 0);

        // relays resolve the same template
        let relay = model.node("BSM_0_1").unwrap();
        assert_eq!(relay.memory.fidelity, 0.95);
    }

    #[test]
    fn test_star_shape() {
        let config = StarTopology::default().build();
        // 5 leaves + center + 5 relays
        assert_eq!(config.nodes.len(), 11);
        assert_eq!(config.qchannels.len(), 10);
        assert_eq!(config.cchannels.len(), 4 * 5 + 6 * 5);

        let model = TopologyModel::build(&config).unwrap();
        let center = model.node(StarTopology::center_name()).unwrap();
        assert_eq!(center.router_params().unwrap().memo_size, 20);
        assert_eq!(center.memory.fidelity, 0.98);
        assert_eq!(center.adaptive_max_memory, 2);
        assert_eq!(center.encoding, EncodingType::SingleAtom);

        // every relay joins one leaf with the center
        for i in 0..5 {
            let peers = model.relay_peers(&format!("BSM_{}", i)).unwrap();
            assert_eq!(
                peers,
                &[router_name(i), StarTopology::center_name().to_string()]
            );
        }
    }

    #[test]
    fn test_star_relays_use_defaults() {
        let config = StarTopology::default().build();
        let model = TopologyModel::build(&config).unwrap();
        let relay = model.node("BSM_0").unwrap();
        assert_eq!(relay.memory.fidelity, 1.0);
        assert_eq!(relay.template, None);
    }

    #[test]
    fn test_minimal_line() {
        let config = LineTopology {
            size: 2,
            ..LineTopology::default()
        }
        .build();
        let model = TopologyModel::build(&config).unwrap();
        assert_eq!(model.node_count(), 3);
        assert_eq!(model.relay_peers("BSM_0_1").unwrap().len(), 2);
    }
}
