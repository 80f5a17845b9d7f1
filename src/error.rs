//! Topology Error Types
//!
//! Error taxonomy for topology loading: reference failures (names that do not
//! resolve), range failures (numeric fields outside their domain), structural
//! failures (graph shape), and schema failures (malformed input). Entity
//! builders fail fast with a single `TopologyError`; the load pipeline folds
//! those and the graph-level checks into one `ValidationReport` so a single
//! edit cycle can fix everything.

use std::fmt;
use thiserror::Error;

/// Result type alias for topology operations
pub type Result<T> = std::result::Result<T, TopologyError>;

/// Main topology error type
#[derive(Error, Debug)]
pub enum TopologyError {
    /// Template name registered more than once
    #[error("duplicate template '{name}'")]
    DuplicateTemplate { name: String },

    /// Registry lookup for a name that was never registered
    #[error("unknown template '{name}'")]
    UnknownTemplate { name: String },

    /// Node record referencing a template the registry does not hold
    #[error("node '{node}' references unknown template '{template}'")]
    UnknownTemplateReference { node: String, template: String },

    /// Field mandatory for the node's type is absent
    #[error("node '{node}' missing required field '{field}'")]
    MissingRequiredField { node: String, field: String },

    /// Numeric field outside its legal domain
    #[error("invalid {field} for {subject}: {message}")]
    InvalidRange {
        subject: String,
        field: String,
        message: String,
    },

    /// Node type tag outside the supported set
    #[error("node '{node}' has unsupported type '{node_type}'")]
    UnsupportedNodeType { node: String, node_type: String },

    /// Node name that fails the identifier pattern
    #[error("invalid node name '{name}'")]
    InvalidNodeName { name: String },

    /// Channel endpoint naming no built node
    #[error("unknown endpoint '{endpoint}' in {channel}")]
    UnknownEndpoint { channel: String, endpoint: String },

    /// Channel connecting a node to itself
    #[error("{channel} connects '{node}' to itself")]
    SelfLoop { channel: String, node: String },

    /// Aggregated graph-level validation failure
    #[error("{0}")]
    Validation(ValidationReport),

    /// Config file extension outside the supported set
    #[error("unsupported config format '{extension}' (expected .json, .yaml, or .yml)")]
    UnsupportedFormat { extension: String },

    /// Malformed JSON input
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed YAML input
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Config file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TopologyError {
    /// Create a duplicate template error
    pub fn duplicate_template(name: impl Into<String>) -> Self {
        Self::DuplicateTemplate { name: name.into() }
    }

    /// Create an unknown template error
    pub fn unknown_template(name: impl Into<String>) -> Self {
        Self::UnknownTemplate { name: name.into() }
    }

    /// Create an unknown template reference error
    pub fn unknown_template_reference(
        node: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self::UnknownTemplateReference {
            node: node.into(),
            template: template.into(),
        }
    }

    /// Create a missing required field error
    pub fn missing_required_field(node: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            node: node.into(),
            field: field.into(),
        }
    }

    /// Create an invalid range error
    pub fn invalid_range(
        subject: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidRange {
            subject: subject.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported node type error
    pub fn unsupported_node_type(node: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self::UnsupportedNodeType {
            node: node.into(),
            node_type: node_type.into(),
        }
    }

    /// Create an unknown endpoint error
    pub fn unknown_endpoint(channel: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::UnknownEndpoint {
            channel: channel.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Create a self-loop error
    pub fn self_loop(channel: impl Into<String>, node: impl Into<String>) -> Self {
        Self::SelfLoop {
            channel: channel.into(),
            node: node.into(),
        }
    }

    /// Get error category for diagnostics and metrics
    pub fn category(&self) -> &'static str {
        match self {
            TopologyError::DuplicateTemplate { .. } => "structural",
            TopologyError::UnknownTemplate { .. } => "reference",
            TopologyError::UnknownTemplateReference { .. } => "reference",
            TopologyError::MissingRequiredField { .. } => "structural",
            TopologyError::InvalidRange { .. } => "range",
            TopologyError::UnsupportedNodeType { .. } => "structural",
            TopologyError::InvalidNodeName { .. } => "schema",
            TopologyError::UnknownEndpoint { .. } => "reference",
            TopologyError::SelfLoop { .. } => "structural",
            TopologyError::Validation(_) => "validation",
            TopologyError::UnsupportedFormat { .. } => "io",
            TopologyError::Json(_) => "schema",
            TopologyError::Yaml(_) => "schema",
            TopologyError::Io(_) => "io",
        }
    }

    /// Violation form of this error, for aggregation into a report.
    ///
    /// Transport-level errors (I/O, parse failures, the aggregate itself)
    /// have no violation form and return `None`.
    pub fn to_violation(&self) -> Option<Violation> {
        let (kind, subject) = match self {
            TopologyError::DuplicateTemplate { name } => {
                (ViolationKind::DuplicateTemplate, name.clone())
            }
            TopologyError::UnknownTemplate { name } => {
                (ViolationKind::UnknownTemplateReference, name.clone())
            }
            TopologyError::UnknownTemplateReference { node, .. } => {
                (ViolationKind::UnknownTemplateReference, node.clone())
            }
            TopologyError::MissingRequiredField { node, .. } => {
                (ViolationKind::MissingRequiredField, node.clone())
            }
            TopologyError::InvalidRange { subject, .. } => {
                (ViolationKind::InvalidRange, subject.clone())
            }
            TopologyError::UnsupportedNodeType { node, .. } => {
                (ViolationKind::UnsupportedNodeType, node.clone())
            }
            TopologyError::InvalidNodeName { name } => {
                (ViolationKind::InvalidNodeName, name.clone())
            }
            TopologyError::UnknownEndpoint { channel, .. } => {
                (ViolationKind::UnknownEndpoint, channel.clone())
            }
            TopologyError::SelfLoop { channel, .. } => (ViolationKind::SelfLoop, channel.clone()),
            _ => return None,
        };
        Some(Violation::new(kind, subject, self.to_string()))
    }
}

/// Kinds of violations a validation report can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    DuplicateTemplate,
    UnknownTemplateReference,
    MissingRequiredField,
    InvalidRange,
    UnsupportedNodeType,
    InvalidNodeName,
    UnknownEndpoint,
    SelfLoop,
    DuplicateNodeName,
    MissingClassicalAck,
    InvalidGroup,
    InvalidStopTime,
}

impl ViolationKind {
    /// Stable tag for logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::DuplicateTemplate => "duplicate_template",
            ViolationKind::UnknownTemplateReference => "unknown_template_reference",
            ViolationKind::MissingRequiredField => "missing_required_field",
            ViolationKind::InvalidRange => "invalid_range",
            ViolationKind::UnsupportedNodeType => "unsupported_node_type",
            ViolationKind::InvalidNodeName => "invalid_node_name",
            ViolationKind::UnknownEndpoint => "unknown_endpoint",
            ViolationKind::SelfLoop => "self_loop",
            ViolationKind::DuplicateNodeName => "duplicate_node_name",
            ViolationKind::MissingClassicalAck => "missing_classical_ack",
            ViolationKind::InvalidGroup => "invalid_group",
            ViolationKind::InvalidStopTime => "invalid_stop_time",
        }
    }

    /// Taxonomy class the kind belongs to
    pub fn category(&self) -> &'static str {
        match self {
            ViolationKind::UnknownTemplateReference | ViolationKind::UnknownEndpoint => "reference",
            ViolationKind::InvalidRange
            | ViolationKind::InvalidGroup
            | ViolationKind::InvalidStopTime => "range",
            ViolationKind::DuplicateTemplate
            | ViolationKind::MissingRequiredField
            | ViolationKind::UnsupportedNodeType
            | ViolationKind::SelfLoop
            | ViolationKind::DuplicateNodeName
            | ViolationKind::MissingClassicalAck => "structural",
            ViolationKind::InvalidNodeName => "schema",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation finding: what went wrong, on which entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    /// Identity of the offending record (node name, channel endpoints, pair)
    pub subject: String,
    pub message: String,
}

impl Violation {
    /// Create a new violation
    pub fn new(kind: ViolationKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.subject, self.message)
    }
}

/// Ordered collection of every violation found in one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a violation
    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Append the violation form of a builder error, if it has one
    pub fn push_error(&mut self, error: &TopologyError) {
        if let Some(violation) = error.to_violation() {
            self.violations.push(violation);
        }
    }

    /// Merge another report into this one, preserving order
    pub fn extend(&mut self, other: ValidationReport) {
        self.violations.extend(other.violations);
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// All violations in discovery order
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Violations of one kind, in discovery order
    pub fn of_kind(&self, kind: ViolationKind) -> Vec<&Violation> {
        self.violations.iter().filter(|v| v.kind == kind).collect()
    }

    /// Ok when empty, otherwise the aggregate error carrying this report
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(TopologyError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "topology validation failed with {} violation(s):",
            self.violations.len()
        )?;
        for violation in &self.violations {
            writeln!(f, "  {}", violation)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let err = TopologyError::unknown_template_reference("router_0", "missing_template");
        assert_eq!(err.category(), "reference");
        assert!(err.to_string().contains("router_0"));
        assert!(err.to_string().contains("missing_template"));
    }

    #[test]
    fn test_error_categorization() {
        assert_eq!(
            TopologyError::duplicate_template("perfect_memo").category(),
            "structural"
        );
        assert_eq!(
            TopologyError::invalid_range("router_0", "fidelity", "out of range").category(),
            "range"
        );
        assert_eq!(
            TopologyError::missing_required_field("router_0", "memo_size").category(),
            "structural"
        );
        assert_eq!(
            TopologyError::unknown_endpoint("quantum channel a -> b", "b").category(),
            "reference"
        );
    }

    #[test]
    fn test_violation_from_error() {
        let err = TopologyError::self_loop("classical channel a -> a", "a");
        let violation = err.to_violation().unwrap();
        assert_eq!(violation.kind, ViolationKind::SelfLoop);
        assert_eq!(violation.subject, "classical channel a -> a");
        assert_eq!(violation.kind.category(), "structural");
    }

    #[test]
    fn test_transport_errors_have_no_violation_form() {
        let io_err = TopologyError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing file",
        ));
        assert!(io_err.to_violation().is_none());
        assert_eq!(io_err.category(), "io");
    }

    #[test]
    fn test_report_aggregation() {
        let mut report = ValidationReport::new();
        report.push(Violation::new(
            ViolationKind::DuplicateNodeName,
            "router_0",
            "node name declared more than once",
        ));
        report.push_error(&TopologyError::invalid_range(
            "router_1",
            "seed",
            "must be non-negative, got -1",
        ));
        assert_eq!(report.len(), 2);
        assert_eq!(report.of_kind(ViolationKind::DuplicateNodeName).len(), 1);

        let rendered = report.to_string();
        assert!(rendered.contains("2 violation(s)"));
        assert!(rendered.contains("duplicate_node_name"));

        let err = report.into_result().unwrap_err();
        assert_eq!(err.category(), "validation");
    }

    #[test]
    fn test_empty_report_is_ok() {
        assert!(ValidationReport::new().into_result().is_ok());
    }
}
