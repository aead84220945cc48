//! Obfuscation passes and the pipeline that runs them.

use std::str::FromStr;

use nolog::*;

use crate::ast::Program;

pub mod dead_code;
pub mod error;
pub mod names;
pub mod rename;
pub mod rewrite;
pub mod symtable;

pub use dead_code::DeadCodeInsertion;
pub use error::{ConfigError, ObfuscationWarning, PassError, PipelineError};
pub use rename::RenameIdentifiers;

/// A tree-to-tree transformation.
pub trait Pass {
    /// Identifier of the pass, used in diagnostics.
    fn name(&self) -> &'static str;

    /// Transform `program`, appending non-fatal diagnostics to `warnings`.
    fn apply(
        &self,
        program: Program,
        warnings: &mut Vec<ObfuscationWarning>,
    ) -> Result<Program, PassError>;
}

/// Output of a successful pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct Obfuscated {
    /// The transformed tree.
    pub program: Program,
    /// Diagnostics raised by the passes, in order.
    pub warnings: Vec<ObfuscationWarning>,
}

/// Runs passes in order, feeding each the output of the previous one.
#[derive(Default)]
pub struct Obfuscator {
    passes: Vec<Box<dyn Pass>>,
}

impl Obfuscator {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the pipeline described by `config`.
    pub fn from_config(config: &ObfuscatorConfig) -> Self {
        let mut obfuscator = Self::new();
        for technique in &config.techniques {
            match technique {
                Technique::RenameIdentifiers => obfuscator.add_pass(config.rename),
                Technique::DeadCode => obfuscator.add_pass(config.dead_code),
            }
        }
        obfuscator
    }

    /// Append a pass.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Names of the passes, in order.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    /// Run every pass.
    ///
    /// Stops at the first failing pass; the error carries the tree produced
    /// by the pass before it.
    pub fn run(&self, program: Program) -> Result<Obfuscated, PipelineError> {
        let mut program = program;
        let mut warnings = Vec::new();
        for pass in &self.passes {
            trace!("PIPELINE " => "running `{}`", pass.name());
            let last_good = program.clone();
            program = match pass.apply(program, &mut warnings) {
                Ok(program) => program,
                Err(source) => {
                    warn!("PIPELINE " => "`{}` failed: {}", pass.name(), source);
                    return Err(PipelineError {
                        pass: pass.name(),
                        source,
                        last_good: Box::new(last_good),
                        warnings,
                    });
                }
            };
        }
        Ok(Obfuscated { program, warnings })
    }
}

/// Obfuscation technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Technique {
    /// `rename_identifiers`
    RenameIdentifiers,
    /// `dead_code`
    DeadCode,
}

impl Technique {
    /// Identifier of the technique.
    pub fn as_str(&self) -> &'static str {
        match self {
            Technique::RenameIdentifiers => "rename_identifiers",
            Technique::DeadCode => "dead_code",
        }
    }
}

impl FromStr for Technique {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rename_identifiers" => Ok(Technique::RenameIdentifiers),
            "dead_code" => Ok(Technique::DeadCode),
            _ => Err(ConfigError::UnknownTechnique(s.to_string())),
        }
    }
}

impl std::fmt::Display for Technique {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which techniques run, in which order, with which options.
#[derive(Debug, Clone, PartialEq)]
pub struct ObfuscatorConfig {
    techniques: Vec<Technique>,
    /// Options of the renaming pass.
    pub rename: RenameIdentifiers,
    /// Options of the dead code pass.
    pub dead_code: DeadCodeInsertion,
}

impl Default for ObfuscatorConfig {
    fn default() -> Self {
        Self::with_techniques([Technique::RenameIdentifiers, Technique::DeadCode])
    }
}

impl ObfuscatorConfig {
    /// Run the given techniques with default options. Repeated techniques
    /// run once, at their first position.
    pub fn with_techniques(techniques: impl IntoIterator<Item = Technique>) -> Self {
        let mut unique = Vec::new();
        for technique in techniques {
            if !unique.contains(&technique) {
                unique.push(technique);
            }
        }
        Self {
            techniques: unique,
            rename: RenameIdentifiers::default(),
            dead_code: DeadCodeInsertion::default(),
        }
    }

    /// Parse technique identifiers.
    pub fn parse_techniques<'a>(
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ConfigError> {
        let techniques = names
            .into_iter()
            .map(Technique::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::with_techniques(techniques))
    }

    /// Techniques to run, in order.
    pub fn techniques(&self) -> &[Technique] {
        &self.techniques
    }
}
