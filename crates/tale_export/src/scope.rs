// Render Scope - Everything one export shares between its renders

use std::future::Future;
use std::sync::Arc;

use tale_types::{ExportObject, ExportSettings, TemplateErrorCollection, TemplateErrorKind};
use tokio_util::sync::CancellationToken;

use crate::error::{ExportError, Result};
use crate::language_key::LanguageKeyRegistry;
use crate::resolver::ObjectResolver;

/// Shared state of one export
///
/// Cheap to clone. Clones share the owner, settings, key registry and
/// cancellation token; [`with_errors`](Self::with_errors) gives a concurrent
/// render its own error collection.
#[derive(Clone)]
pub struct RenderScope {
    pub project_id: String,
    /// Object owning the exported dialog or state machine
    pub owner: Arc<ExportObject>,
    pub settings: Arc<ExportSettings>,
    pub resolver: Arc<dyn ObjectResolver>,
    pub language_keys: Arc<LanguageKeyRegistry>,
    pub errors: TemplateErrorCollection,
    pub cancel: CancellationToken,
    location: String,
}

impl RenderScope {
    pub fn new(
        project_id: impl Into<String>,
        owner: ExportObject,
        settings: ExportSettings,
        resolver: Arc<dyn ObjectResolver>,
        language_keys: Arc<LanguageKeyRegistry>,
        cancel: CancellationToken,
    ) -> Self {
        let location = format!("{} '{}'", owner.object_type, owner.name);
        Self {
            project_id: project_id.into(),
            owner: Arc::new(owner),
            settings: Arc::new(settings),
            resolver,
            language_keys,
            errors: TemplateErrorCollection::new(),
            cancel,
            location,
        }
    }

    /// Formatted location used for error entries
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Scope with a more specific location
    pub fn at(&self, segment: impl AsRef<str>) -> Self {
        let mut scope = self.clone();
        scope.location = format!("{} > {}", self.location, segment.as_ref());
        scope
    }

    /// Scope with a replaced location
    pub fn with_location(&self, location: impl Into<String>) -> Self {
        let mut scope = self.clone();
        scope.location = location.into();
        scope
    }

    /// Scope recording into a separate error collection
    pub fn with_errors(&self, errors: TemplateErrorCollection) -> Self {
        let mut scope = self.clone();
        scope.errors = errors;
        scope
    }

    /// Record an error at this scope's location
    pub fn report(&self, kind: TemplateErrorKind, message: impl Into<String>) {
        self.errors.add(kind, message, self.location.clone());
    }

    /// Fail fast if the export was cancelled
    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(ExportError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Await a future unless the export is cancelled first
    pub async fn cancellable<T, F>(&self, future: F) -> Result<T>
    where
        F: Future<Output = T>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ExportError::Cancelled),
            value = future => Ok(value),
        }
    }

    /// Look up an export object through the per-export resolver
    pub async fn object(&self, object_id: &str) -> Result<Option<ExportObject>> {
        Ok(self.cancellable(self.resolver.get_object(object_id)).await??)
    }
}
