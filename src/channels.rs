//! Channel Model and Builders
//!
//! Directed quantum and classical channels. A record declares exactly one
//! direction; nothing is auto-mirrored, so reciprocal classical links must
//! both appear in the input (the validator enforces that for pairs that need
//! an acknowledgement path). Endpoint names are checked against the set of
//! nodes that already built successfully.

use indexmap::IndexSet;
use std::fmt;

use crate::config::{ClassicalChannelRecord, QuantumChannelRecord};
use crate::error::{Result, TopologyError};

/// Directed quantum channel
#[derive(Debug, Clone, PartialEq)]
pub struct QuantumChannel {
    pub source: String,
    pub destination: String,
    /// Fiber length in meters
    pub distance: f64,
    /// Loss coefficient in dB per meter
    pub attenuation: f64,
}

impl QuantumChannel {
    pub fn endpoints(&self) -> (&str, &str) {
        (&self.source, &self.destination)
    }
}

impl fmt::Display for QuantumChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "quantum channel {} -> {}", self.source, self.destination)
    }
}

/// Directed classical channel
#[derive(Debug, Clone, PartialEq)]
pub struct ClassicalChannel {
    pub source: String,
    pub destination: String,
    /// One-way latency in picoseconds
    pub delay: f64,
}

impl ClassicalChannel {
    pub fn endpoints(&self) -> (&str, &str) {
        (&self.source, &self.destination)
    }
}

impl fmt::Display for ClassicalChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "classical channel {} -> {}",
            self.source, self.destination
        )
    }
}

/// Builds channels from raw records
pub struct ChannelBuilder;

impl ChannelBuilder {
    /// Build a quantum channel, checking endpoints against the built nodes
    pub fn build_quantum(
        record: &QuantumChannelRecord,
        known_nodes: &IndexSet<String>,
    ) -> Result<QuantumChannel> {
        let label = format!(
            "quantum channel {} -> {}",
            record.source, record.destination
        );
        check_endpoints(&label, &record.source, &record.destination, known_nodes)?;
        if !(record.distance > 0.0) {
            return Err(TopologyError::invalid_range(
                &label,
                "distance",
                format!("must be positive, got {}", record.distance),
            ));
        }
        if !(record.attenuation >= 0.0) {
            return Err(TopologyError::invalid_range(
                &label,
                "attenuation",
                format!("must be non-negative, got {}", record.attenuation),
            ));
        }
        Ok(QuantumChannel {
            source: record.source.clone(),
            destination: record.destination.clone(),
            distance: record.distance,
            attenuation: record.attenuation,
        })
    }

    /// Build a classical channel, checking endpoints against the built nodes
    pub fn build_classical(
        record: &ClassicalChannelRecord,
        known_nodes: &IndexSet<String>,
    ) -> Result<ClassicalChannel> {
        let label = format!(
            "classical channel {} -> {}",
            record.source, record.destination
        );
        check_endpoints(&label, &record.source, &record.destination, known_nodes)?;
        if !(record.delay >= 0.0) {
            return Err(TopologyError::invalid_range(
                &label,
                "delay",
                format!("must be non-negative, got {}", record.delay),
            ));
        }
        Ok(ClassicalChannel {
            source: record.source.clone(),
            destination: record.destination.clone(),
            delay: record.delay,
        })
    }
}

fn check_endpoints(
    label: &str,
    source: &str,
    destination: &str,
    known_nodes: &IndexSet<String>,
) -> Result<()> {
    if !known_nodes.contains(source) {
        return Err(TopologyError::unknown_endpoint(label, source));
    }
    if !known_nodes.contains(destination) {
        return Err(TopologyError::unknown_endpoint(label, destination));
    }
    if source == destination {
        return Err(TopologyError::self_loop(label, source));
    }
    Ok(())
}
