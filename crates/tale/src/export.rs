// Project Export - Renders every dialog and state machine of a loaded project
//
// One export run shares a single orchestrator, so function counters and
// object lookups are shared across all objects of the project. Each object
// is written to its own file; the collected language keys go to one
// language file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tale_export::text::sanitize_identifier;
use tale_export::{
    DialogExportRequest, ExportError, ExportOrchestrator, ExportServices, FunctionCounterStore, InMemoryObjectStore,
    RuleSplitPolicy, StateMachineExportRequest,
};
use tale_types::{LanguageKeyEntry, StateMachineTemplates, TemplateError};
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wildmatch::WildMatch;

use crate::project::Project;
use crate::store::{RedbCounterStore, StoreError};

/// Error type of an export run
#[derive(Debug, thiserror::Error)]
pub enum ExportRunError {
    #[error("Counter store error: {0}")]
    Store(#[from] StoreError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// What to export and where
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Directory receiving the generated files
    pub out_dir: PathBuf,
    /// Glob on object names; `None` exports everything
    pub only: Option<String>,
}

/// Outcome of an export run
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    /// Written files in export order
    pub files: Vec<PathBuf>,
    /// Template errors of all exports
    pub errors: Vec<TemplateError>,
    /// Number of distinct language keys
    pub language_keys: usize,
    /// Dialogs and state machines whose owner is unknown
    pub skipped: usize,
}

impl ExportSummary {
    pub fn has_fatal_error(&self) -> bool {
        self.errors.iter().any(TemplateError::is_fatal)
    }
}

/// Exports a loaded project to disk
pub struct ProjectExporter {
    orchestrator: ExportOrchestrator,
}

impl ProjectExporter {
    /// Create an exporter with the project's persistent counter store
    pub fn open(project: &Project) -> Result<Self, ExportRunError> {
        let counters = RedbCounterStore::open(project.path.join(&project.manifest.store.path))?;
        Ok(Self::with_counters(project, Arc::new(counters)))
    }

    /// Create an exporter with the given counter store
    pub fn with_counters(project: &Project, counters: Arc<dyn FunctionCounterStore>) -> Self {
        let manifest = &project.manifest;
        let objects: InMemoryObjectStore = project.objects.iter().cloned().collect();

        let mut services = ExportServices::new(Arc::new(objects));
        services.counters = counters;
        services.split_policy = Arc::new(RuleSplitPolicy::new(manifest.functions.rules.clone()));
        services.naming = manifest.functions.naming();
        services.key_generator = Arc::new(manifest.language_keys.key_generator());
        services.condition_syntax = manifest.conditions.clone();

        Self {
            orchestrator: ExportOrchestrator::new(services),
        }
    }

    /// Export all matching dialogs and state machines, then the language file
    pub async fn export(
        &self,
        project: &Project,
        options: &ExportOptions,
        cancel: CancellationToken,
    ) -> Result<ExportSummary, ExportRunError> {
        let matcher = options.only.as_deref().map(WildMatch::new);
        let matches = |name: &str| matcher.as_ref().is_none_or(|m| m.matches(name));
        let extension = &project.manifest.output.extension;
        let settings = &project.manifest.export;

        fs::create_dir_all(&options.out_dir).await?;

        let mut summary = ExportSummary::default();
        let mut keys = LanguageKeys::default();

        for dialog in &project.dialogs {
            let Some(owner) = project.object(&dialog.object_id) else {
                warn!(object_id = %dialog.object_id, "Dialog owner not found, skipping");
                summary.skipped += 1;
                continue;
            };
            if !matches(&owner.name) {
                continue;
            }

            let request = DialogExportRequest {
                project_id: project.id().to_string(),
                owner: owner.clone(),
                snippet: dialog.snippet.clone(),
                templates: project.templates.dialog.clone(),
                settings: settings.clone(),
            };
            let result = self.orchestrator.export_dialog(&request, cancel.clone()).await?;

            let path = output_path(&options.out_dir, &[&owner.name, &owner.id], extension);
            fs::write(&path, &result.code).await?;
            info!(object = %owner.name, file = %path.display(), "Wrote dialog");

            summary.files.push(path);
            summary.errors.extend(result.errors);
            keys.extend(result.language_keys);
        }

        if !project.state_machines.is_empty() {
            match &project.templates.state_machine {
                Some(template) => {
                    let templates = StateMachineTemplates {
                        state_machine: template.clone(),
                        dialog: project.templates.dialog.clone(),
                    };
                    for machine in &project.state_machines {
                        let Some(owner) = project.object(&machine.object_id) else {
                            warn!(object_id = %machine.object_id, "State machine owner not found, skipping");
                            summary.skipped += 1;
                            continue;
                        };
                        if !matches(&owner.name) {
                            continue;
                        }

                        let request = StateMachineExportRequest {
                            project_id: project.id().to_string(),
                            owner: owner.clone(),
                            state_machine: machine.clone(),
                            templates: templates.clone(),
                            settings: settings.clone(),
                        };
                        let result = self.orchestrator.export_state_machine(&request, cancel.clone()).await?;

                        let path =
                            output_path(&options.out_dir, &[&owner.name, &owner.id, &machine.id], extension);
                        fs::write(&path, &result.code).await?;
                        info!(object = %owner.name, file = %path.display(), "Wrote state machine");

                        summary.files.push(path);
                        summary.errors.extend(result.errors);
                        keys.extend(result.language_keys);
                    }
                }
                None => warn!(
                    count = project.state_machines.len(),
                    "No state_machine template, skipping state machines"
                ),
            }
        }

        summary.language_keys = keys.entries.len();

        match &project.templates.language_file {
            Some(template) => {
                let file = self.orchestrator.render_language_file(
                    project.id(),
                    project.name(),
                    template,
                    &keys.entries,
                    settings,
                );
                let path = options.out_dir.join(&project.manifest.output.language_file);
                fs::write(&path, &file.code).await?;
                info!(keys = keys.entries.len(), file = %path.display(), "Wrote language file");

                summary.files.push(path);
                summary.errors.extend(file.errors);
            }
            None => debug!("No language_file template, skipping language file"),
        }

        Ok(summary)
    }
}

/// Language keys of all exports, first occurrence wins
#[derive(Default)]
struct LanguageKeys {
    seen: HashSet<String>,
    entries: Vec<LanguageKeyEntry>,
}

impl LanguageKeys {
    fn extend(&mut self, entries: Vec<LanguageKeyEntry>) {
        for entry in entries {
            if self.seen.insert(entry.key.clone()) {
                self.entries.push(entry);
            }
        }
    }
}

/// `<parts>.<extension>`, parts sanitized and joined by `_`
///
/// Parts that sanitize to nothing are left out.
fn output_path(dir: &Path, parts: &[&str], extension: &str) -> PathBuf {
    let stem = parts
        .iter()
        .map(|part| sanitize_identifier(part))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    dir.join(format!("{}.{}", stem, extension))
}
