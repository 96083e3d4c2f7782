//! Project Loader
//!
//! Loads a tale project from disk: the manifest layered with `TALE_`
//! environment overrides, export objects, dialogs, state machines and
//! templates.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::de::DeserializeOwned;
use tale_types::{DialogTemplates, ExportObject, ExportTemplate, StateMachine, TemplateEngineKind};
use tokio::fs;
use tracing::{debug, info, warn};

use super::config::*;

/// Error type for project loading
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Project path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("Project manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    #[error("Template not found: {0}")]
    TemplateNotFound(PathBuf),

    #[error("Failed to read file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to load configuration: {0}")]
    ConfigError(#[from] figment::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),
}

/// Templates of a project
#[derive(Debug, Clone)]
pub struct ProjectTemplates {
    pub dialog: DialogTemplates,
    pub state_machine: Option<ExportTemplate>,
    pub language_file: Option<ExportTemplate>,
}

impl ProjectTemplates {
    /// Render every template with one engine
    pub fn set_engine(&mut self, engine: TemplateEngineKind) {
        let dialog = &mut self.dialog;
        for template in [
            &mut dialog.dialog,
            &mut dialog.function,
            &mut dialog.npc_text_line,
            &mut dialog.player_text_line,
            &mut dialog.choice,
            &mut dialog.condition,
            &mut dialog.action,
            &mut dialog.reference,
        ] {
            template.engine = engine;
        }
        for template in [self.state_machine.as_mut(), self.language_file.as_mut()].into_iter().flatten() {
            template.engine = engine;
        }
    }
}

/// A loaded project
#[derive(Debug, Clone)]
pub struct Project {
    pub path: PathBuf,
    pub manifest: ProjectManifest,
    pub objects: Vec<ExportObject>,
    pub dialogs: Vec<DialogConfig>,
    pub state_machines: Vec<StateMachine>,
    pub templates: ProjectTemplates,
}

impl Project {
    pub fn id(&self) -> &str {
        &self.manifest.project.id
    }

    pub fn name(&self) -> &str {
        &self.manifest.project.name
    }

    /// Get an export object by id
    pub fn object(&self, id: &str) -> Option<&ExportObject> {
        self.objects.iter().find(|o| o.id == id)
    }
}

/// Project loader
pub struct ProjectLoader;

impl ProjectLoader {
    /// Load a project from the given path
    pub async fn load(path: impl AsRef<Path>) -> Result<Project, LoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(LoadError::PathNotFound(path.to_path_buf()));
        }

        info!("Loading project from: {}", path.display());

        let manifest_path = path.join("project.toml");
        if !manifest_path.exists() {
            return Err(LoadError::ManifestNotFound(manifest_path));
        }

        let manifest: ProjectManifest = Figment::new()
            .merge(Toml::file(&manifest_path))
            .merge(Env::prefixed("TALE_").split("__"))
            .extract()?;
        info!("Loaded project manifest: {} ({})", manifest.project.name, manifest.project.id);

        let objects = Self::load_objects(path).await?;
        info!("Loaded {} export objects", objects.len());

        let dialogs: Vec<DialogConfig> = Self::load_json_dir(&path.join("dialogs")).await?;
        info!("Loaded {} dialogs", dialogs.len());

        let state_machines: Vec<StateMachine> = Self::load_json_dir(&path.join("state_machines")).await?;
        info!("Loaded {} state machines", state_machines.len());

        let templates = Self::load_templates(path, &manifest.templates).await?;

        Ok(Project {
            path: path.to_path_buf(),
            manifest,
            objects,
            dialogs,
            state_machines,
            templates,
        })
    }

    /// Load export objects from objects.json
    async fn load_objects(project_path: &Path) -> Result<Vec<ExportObject>, LoadError> {
        let objects_path = project_path.join("objects.json");
        if !objects_path.exists() {
            debug!("No objects.json found");
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&objects_path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load every .json file of a directory, in file name order
    ///
    /// Files that fail to parse are skipped.
    async fn load_json_dir<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>, LoadError> {
        if !dir.exists() {
            debug!("No {} directory found", dir.display());
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut items = Vec::with_capacity(paths.len());
        for path in paths {
            match Self::load_json(&path).await {
                Ok(item) => {
                    debug!("Loaded {}", path.display());
                    items.push(item);
                }
                Err(e) => {
                    warn!("Failed to load {}: {}", path.display(), e);
                }
            }
        }

        Ok(items)
    }

    async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
        let content = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load all templates from the templates directory
    async fn load_templates(project_path: &Path, config: &TemplatesConfig) -> Result<ProjectTemplates, LoadError> {
        let dir = project_path.join(&config.directory);

        let dialog = DialogTemplates {
            dialog: Self::load_template(&dir, "dialog", config).await?,
            function: Self::load_template(&dir, "function", config).await?,
            npc_text_line: Self::load_template(&dir, "npc_text_line", config).await?,
            player_text_line: Self::load_template(&dir, "player_text_line", config).await?,
            choice: Self::load_template(&dir, "choice", config).await?,
            condition: Self::load_template(&dir, "condition", config).await?,
            action: Self::load_template(&dir, "action", config).await?,
            reference: Self::load_template(&dir, "reference", config).await?,
        };

        Ok(ProjectTemplates {
            dialog,
            state_machine: Self::load_optional_template(&dir, "state_machine", config).await?,
            language_file: Self::load_optional_template(&dir, "language_file", config).await?,
        })
    }

    async fn load_template(dir: &Path, name: &str, config: &TemplatesConfig) -> Result<ExportTemplate, LoadError> {
        Self::load_optional_template(dir, name, config)
            .await?
            .ok_or_else(|| LoadError::TemplateNotFound(Self::template_path(dir, name, config)))
    }

    async fn load_optional_template(
        dir: &Path,
        name: &str,
        config: &TemplatesConfig,
    ) -> Result<Option<ExportTemplate>, LoadError> {
        let path = Self::template_path(dir, name, config);
        if !path.exists() {
            debug!("No {} template found", name);
            return Ok(None);
        }

        let code = fs::read_to_string(&path).await?;
        Ok(Some(ExportTemplate {
            name: name.to_string(),
            engine: config.engine_for(name),
            code,
        }))
    }

    fn template_path(dir: &Path, name: &str, config: &TemplatesConfig) -> PathBuf {
        dir.join(format!("{}.{}", name, config.extension))
    }
}
