// Legacy Engine - `{{Name}}` placeholders and `_Start`/`_End` ranges

use tale_types::{ExportTemplate, TemplateEngineKind, TemplateErrorKind};
use tracing::debug;

use super::{TemplateData, TemplateEngine};
use crate::placeholder::unbalanced_ranges;
use crate::scope::RenderScope;

/// Substitutes placeholders; unknown placeholders stay in the output verbatim
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyEngine;

impl TemplateEngine for LegacyEngine {
    fn kind(&self) -> TemplateEngineKind {
        TemplateEngineKind::Legacy
    }

    fn render(&self, template: &ExportTemplate, data: TemplateData<'_>, scope: &RenderScope) -> String {
        let scope = scope.at(format!("template '{}'", template.name));

        let broken = unbalanced_ranges(&template.code);
        if !broken.is_empty() {
            debug!(template = %template.name, ranges = ?broken, "Unbalanced range markers");
            scope.report(
                TemplateErrorKind::TemplateParseError,
                format!("Unbalanced range markers: {}", broken.join(", ")),
            );
            return String::new();
        }

        data.fill_legacy(&template.code, &scope)
    }
}
