//! Error types for the obfuscation pipeline.

use miette::Diagnostic;
use thiserror::Error;

use crate::ast::Program;

/// Non-fatal diagnostic raised by a pass.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum ObfuscationWarning {
    /// assignment target is not an identifier
    #[error("assignment target is not an identifier{}", at_line(.line))]
    #[diagnostic(
        code(minic::invalid_assignment_target),
        severity(Warning),
        help("only a variable can be assigned to; the assignment was renamed as is")
    )]
    InvalidAssignmentTarget {
        /// Line of the assignment, if known.
        line: Option<u32>,
    },
}

fn at_line(line: &Option<u32>) -> String {
    match line {
        Some(line) => format!(" (line {line})"),
        None => String::new(),
    }
}

/// Failure of a single pass.
#[derive(Error, Debug, Diagnostic)]
pub enum PassError {
    /// assignment target is not an identifier
    #[error("assignment target is not an identifier{}", at_line(.line))]
    #[diagnostic(code(minic::invalid_assignment_target))]
    InvalidAssignmentTarget {
        /// Line of the first offending assignment, if known.
        line: Option<u32>,
    },

    /// pass-specific failure
    #[error("{0}")]
    #[diagnostic(code(minic::pass_failed))]
    Other(String),
}

/// A pass failed and the pipeline stopped.
///
/// Carries the tree produced by the last pass that succeeded, or the input
/// tree if the first pass failed.
#[derive(Error, Debug, Diagnostic)]
#[error("obfuscation pass `{pass}` failed")]
#[diagnostic(code(minic::pipeline_failed))]
pub struct PipelineError {
    /// Name of the failing pass.
    pub pass: &'static str,
    /// Why it failed.
    #[source]
    #[diagnostic_source]
    pub source: PassError,
    /// Output of the last successful pass.
    pub last_good: Box<Program>,
    /// Warnings raised before the failure.
    pub warnings: Vec<ObfuscationWarning>,
}

/// Invalid pipeline configuration.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum ConfigError {
    /// probability out of range
    #[error("probability {0} is not within [0, 1]")]
    #[diagnostic(code(minic::invalid_probability))]
    InvalidProbability(f64),

    /// unknown technique
    #[error("unknown obfuscation technique `{0}`")]
    #[diagnostic(
        code(minic::unknown_technique),
        help("available techniques: rename_identifiers, dead_code")
    )]
    UnknownTechnique(String),
}
