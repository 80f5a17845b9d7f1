//! QNetSim Declarative Topology System
//!
//! Turns a declarative description of a quantum network (parameter
//! templates, router and BSM relay nodes, directed quantum and classical
//! channels, global simulation scalars) into a validated, immutable graph
//! ready for the simulator.
//!
//! ## Pipeline
//!
//! 1. Parse a [`TopologyConfig`] from JSON or YAML (strict inside records,
//!    lenient at the top level)
//! 2. Register templates in a [`TemplateRegistry`]
//! 3. Resolve each node record through the [`EntityBuilder`] (defaults,
//!    then template, then explicit fields)
//! 4. Build channels against the set of resolved nodes
//! 5. Run the [`TopologyValidator`] aggregate checks
//! 6. Hand out a [`TopologyModel`], or every violation at once
//!
//! The simulator proper (event scheduler, entanglement physics, routing)
//! consumes the built model; none of it lives here.

pub mod channels;
pub mod config;
pub mod error;
pub mod generator;
pub mod model;
pub mod nodes;
pub mod templates;
pub mod validation;

pub use channels::{ChannelBuilder, ClassicalChannel, QuantumChannel};
pub use config::{
    ClassicalChannelRecord, MemoryArrayRecord, NodeRecord, QuantumChannelRecord, TemplateRecord,
    TopologyConfig,
};
pub use error::{Result, TopologyError, ValidationReport, Violation, ViolationKind};
pub use model::{TopologyModel, TopologySummary};
pub use nodes::{
    EncodingType, EntityBuilder, MemoryParams, Node, NodeKind, NodeType, RouterParams,
};
pub use templates::TemplateRegistry;
pub use validation::TopologyValidator;

/// Channels in a decoherence error distribution (one per Pauli axis)
pub const DECOHERENCE_CHANNELS: usize = 3;
