//! Topology Validator
//!
//! Pure graph-level checks over built entities. Unlike the per-record
//! builders, which fail fast, the validator gathers every violation it finds
//! into one report, so a single edit cycle can fix them all. The checks are
//! deterministic functions of their inputs and run in a fixed order:
//! duplicate names, group domains, endpoint references, reciprocal classical
//! coverage, stop time.

use indexmap::{IndexMap, IndexSet};

use crate::channels::{ClassicalChannel, QuantumChannel};
use crate::error::{Result, ValidationReport, Violation, ViolationKind};
use crate::nodes::Node;

/// Aggregate topology checks
pub struct TopologyValidator;

impl TopologyValidator {
    /// Run every check and return the full report (possibly empty)
    pub fn check(
        nodes: &[Node],
        qchannels: &[QuantumChannel],
        cchannels: &[ClassicalChannel],
        stop_time: f64,
    ) -> ValidationReport {
        let mut report = ValidationReport::new();
        check_node_names(nodes, &mut report);
        check_groups(nodes, &mut report);
        check_endpoints(nodes, qchannels, cchannels, &mut report);
        check_classical_acks(nodes, qchannels, cchannels, &mut report);
        check_stop_time(stop_time, &mut report);
        report
    }

    /// `check`, with a non-empty report converted into the aggregate error
    pub fn validate(
        nodes: &[Node],
        qchannels: &[QuantumChannel],
        cchannels: &[ClassicalChannel],
        stop_time: f64,
    ) -> Result<()> {
        Self::check(nodes, qchannels, cchannels, stop_time).into_result()
    }
}

/// BSM node -> router peers attached via quantum channels, both in
/// declaration order. Non-router peers and unknown endpoints are skipped.
pub(crate) fn relay_peer_map<'a>(
    nodes: &'a [Node],
    qchannels: &'a [QuantumChannel],
) -> IndexMap<&'a str, Vec<&'a str>> {
    let routers: IndexSet<&str> = nodes
        .iter()
        .filter(|n| n.is_router())
        .map(|n| n.name.as_str())
        .collect();
    let mut map: IndexMap<&str, Vec<&str>> = nodes
        .iter()
        .filter(|n| n.is_bsm())
        .map(|n| (n.name.as_str(), Vec::new()))
        .collect();

    for channel in qchannels {
        let (source, destination) = channel.endpoints();
        if let Some(peers) = map.get_mut(source) {
            if routers.contains(destination) && !peers.contains(&destination) {
                peers.push(destination);
            }
        }
        if let Some(peers) = map.get_mut(destination) {
            if routers.contains(source) && !peers.contains(&source) {
                peers.push(source);
            }
        }
    }
    map
}

fn check_node_names(nodes: &[Node], report: &mut ValidationReport) {
    let mut seen = IndexSet::new();
    for node in nodes {
        if !seen.insert(node.name.as_str()) {
            report.push(Violation::new(
                ViolationKind::DuplicateNodeName,
                node.name.clone(),
                "node name declared more than once",
            ));
        }
    }
}

fn check_groups(nodes: &[Node], report: &mut ValidationReport) {
    for node in nodes {
        if node.group < 0 {
            report.push(Violation::new(
                ViolationKind::InvalidGroup,
                node.name.clone(),
                format!("group must be non-negative, got {}", node.group),
            ));
        }
    }
}

fn check_endpoints(
    nodes: &[Node],
    qchannels: &[QuantumChannel],
    cchannels: &[ClassicalChannel],
    report: &mut ValidationReport,
) {
    let known: IndexSet<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
    let mut verify = |label: String, endpoint: &str| {
        if !known.contains(endpoint) {
            report.push(Violation::new(
                ViolationKind::UnknownEndpoint,
                label,
                format!("endpoint '{}' is not a declared node", endpoint),
            ));
        }
    };
    for channel in qchannels {
        verify(channel.to_string(), &channel.source);
        verify(channel.to_string(), &channel.destination);
    }
    for channel in cchannels {
        verify(channel.to_string(), &channel.source);
        verify(channel.to_string(), &channel.destination);
    }
}

/// Reciprocal classical coverage.
///
/// Acknowledgement paths are required between every quantum-channel endpoint
/// pair and between every pair of routers that jointly operate a BSM relay.
/// One violation per pair, naming the missing direction(s).
fn check_classical_acks(
    nodes: &[Node],
    qchannels: &[QuantumChannel],
    cchannels: &[ClassicalChannel],
    report: &mut ValidationReport,
) {
    let known: IndexSet<&str> = nodes.iter().map(|n| n.name.as_str()).collect();

    let mut required: IndexSet<(&str, &str)> = IndexSet::new();
    for channel in qchannels {
        let (source, destination) = channel.endpoints();
        if known.contains(source) && known.contains(destination) && source != destination {
            required.insert(ordered_pair(source, destination));
        }
    }
    for peers in relay_peer_map(nodes, qchannels).values() {
        for (i, left) in peers.iter().enumerate() {
            for right in &peers[i + 1..] {
                required.insert(ordered_pair(left, right));
            }
        }
    }

    let directions: IndexSet<(&str, &str)> = cchannels
        .iter()
        .map(|c| (c.source.as_str(), c.destination.as_str()))
        .collect();

    for (a, b) in required {
        let forward = directions.contains(&(a, b));
        let backward = directions.contains(&(b, a));
        if forward && backward {
            continue;
        }
        let message = match (forward, backward) {
            (false, false) => format!(
                "no classical channel in either direction between '{}' and '{}'",
                a, b
            ),
            (false, true) => format!("missing classical channel {} -> {}", a, b),
            (true, false) => format!("missing classical channel {} -> {}", b, a),
            (true, true) => unreachable!(),
        };
        report.push(Violation::new(
            ViolationKind::MissingClassicalAck,
            format!("{} <-> {}", a, b),
            message,
        ));
    }
}

fn check_stop_time(stop_time: f64, report: &mut ValidationReport) {
    if !(stop_time > 0.0) {
        report.push(Violation::new(
            ViolationKind::InvalidStopTime,
            "stop_time",
            format!("must be positive, got {}", stop_time),
        ));
    }
}

fn ordered_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
