//! Rendering and submitting parameterized resource descriptors.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use shipyard_core::ResourceScope;
use tracing::{debug, error};

use crate::error::Result;
use crate::runner::CommandRunner;

pub const DEFAULT_APPLY_SCRIPT: &str = "/scripts/apply-template.sh";
pub const DEFAULT_APPLY_TIMEOUT: Duration = Duration::from_secs(30);

/// Substitution variables passed to the apply script, ordered by key.
pub type Substitutions = BTreeMap<String, String>;

/// Hands a template, a target scope and `KEY=VALUE` pairs to the apply
/// script, which renders the descriptor and submits it to the cluster.
#[derive(Clone)]
pub struct TemplateApplier {
    runner: Arc<dyn CommandRunner>,
    script: PathBuf,
    timeout: Duration,
}

impl TemplateApplier {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            script: PathBuf::from(DEFAULT_APPLY_SCRIPT),
            timeout: DEFAULT_APPLY_TIMEOUT,
        }
    }

    pub fn with_script(mut self, script: impl Into<PathBuf>) -> Self {
        self.script = script.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    /// Arguments for the apply script: `<template> <scope> KEY=VALUE...`.
    pub fn build_args(
        template: &Path,
        scope: &ResourceScope,
        substitutions: &Substitutions,
    ) -> Vec<String> {
        let mut args = Vec::with_capacity(substitutions.len() + 2);
        args.push(template.to_string_lossy().into_owned());
        args.push(scope.to_string());
        args.extend(
            substitutions
                .iter()
                .map(|(key, value)| format!("{}={}", key, value)),
        );
        args
    }

    pub async fn apply(
        &self,
        template: &Path,
        scope: &ResourceScope,
        substitutions: &Substitutions,
    ) -> Result<()> {
        let args = Self::build_args(template, scope, substitutions);
        debug!(template = %template.display(), scope = %scope, "Applying template");

        let program = self.script.to_string_lossy();
        if let Err(e) = self.runner.run(self.timeout, &program, &args).await {
            error!(
                template = %template.display(),
                scope = %scope,
                error = %e,
                "Error applying template"
            );
            return Err(e);
        }

        Ok(())
    }
}
