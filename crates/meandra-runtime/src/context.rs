//! Run-time context supplied by the configuration layer.

use std::collections::BTreeMap;

use meandra_catalog::TemplateVars;
use meandra_core::RunId;

/// Per-run inputs the core does not compute itself: the run ID, resolved
/// condition-flag values, and extra placeholder values for catalog path
/// templates.
///
/// The core never parses configuration files; whoever builds the workflow
/// also resolves these values and hands them over.
#[derive(Debug, Clone)]
pub struct RunContext {
    run_id: RunId,
    flags: BTreeMap<String, bool>,
    vars: TemplateVars,
}

impl RunContext {
    /// Creates a context for a run ID.
    pub fn new(run_id: impl Into<RunId>) -> Self {
        let run_id = run_id.into();
        let vars = TemplateVars::for_run(&run_id);
        Self {
            run_id,
            flags: BTreeMap::new(),
            vars,
        }
    }

    /// Sets a condition-flag value.
    pub fn with_flag(mut self, name: impl Into<String>, value: bool) -> Self {
        self.flags.insert(name.into(), value);
        self
    }

    /// Adds a template placeholder value.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name, value);
        self
    }

    /// Returns the run ID.
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Evaluates a condition flag; an unset flag is false.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    /// Returns the template placeholder values.
    pub fn vars(&self) -> &TemplateVars {
        &self.vars
    }
}
