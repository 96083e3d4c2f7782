// Export Orchestrator - Runs dialog, state machine and language file exports
//
// One export parses the graph, splits it into functions, renders every step
// through the engine its template selects and assembles the document. Content
// problems end up in the result's error list; only infrastructure failures
// and cancellation abort with `Err`.

use std::sync::Arc;

use futures::future::join_all;
use tale_types::{
    DialogTemplates, ExportObject, ExportResult, ExportSettings, ExportTemplate, ExportedFunction, ExportedState,
    LanguageKeyEntry, NodeGraphSnippet, ObjectType, StateMachine, StateMachineExportResult, StateMachineTemplates,
    StateScript, TemplateError, TemplateErrorCollection,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::condition::{ConditionRenderer, ConditionSyntax};
use crate::context::ObjectData;
use crate::document::{
    DialogData, FUNCTION_SEPARATOR, FunctionData, LanguageFileData, StateData, StateMachineData, TransitionData,
};
use crate::engine::{EngineSet, TemplateData};
use crate::error::Result;
use crate::function::{
    DefaultSplitPolicy, FunctionCounterStore, FunctionGenerator, FunctionNameGenerator, FunctionNaming, FunctionPlan,
    FunctionSplitPolicy, InMemoryCounterStore, PlannedFunction, STATE_MACHINE_CATEGORY,
};
use crate::language_key::{DeterministicKeyGenerator, LanguageKeyGenerator, LanguageKeyRegistry};
use crate::parser::{NodeGraphParser, ParsedGraph};
use crate::resolver::{CachedObjectResolver, ObjectResolver};
use crate::scope::RenderScope;
use crate::steps::{StepContext, StepData};
use crate::text::trim_empty_lines;

// ─────────────────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────────────────

/// Collaborators shared by all exports of a project
pub struct ExportServices {
    pub resolver: Arc<dyn ObjectResolver>,
    pub counters: Arc<dyn FunctionCounterStore>,
    pub key_generator: Arc<dyn LanguageKeyGenerator>,
    pub split_policy: Arc<dyn FunctionSplitPolicy>,
    pub naming: FunctionNaming,
    pub condition_syntax: ConditionSyntax,
}

impl ExportServices {
    /// Default configuration with in-memory counters
    pub fn new(resolver: Arc<dyn ObjectResolver>) -> Self {
        Self {
            resolver,
            counters: Arc::new(InMemoryCounterStore::new()),
            key_generator: Arc::new(DeterministicKeyGenerator::new()),
            split_policy: Arc::new(DefaultSplitPolicy),
            naming: FunctionNaming::default(),
            condition_syntax: ConditionSyntax::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DialogExportRequest {
    pub project_id: String,
    /// Object owning the dialog
    pub owner: ExportObject,
    pub snippet: NodeGraphSnippet,
    pub templates: DialogTemplates,
    pub settings: ExportSettings,
}

#[derive(Debug, Clone)]
pub struct StateMachineExportRequest {
    pub project_id: String,
    /// Object owning the state machine
    pub owner: ExportObject,
    pub state_machine: StateMachine,
    pub templates: StateMachineTemplates,
    pub settings: ExportSettings,
}

/// Rendered language file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LanguageFileExport {
    pub code: String,
    pub errors: Vec<TemplateError>,
}

/// Functions of one rendered graph
struct RenderedGraph {
    primary: Option<ExportedFunction>,
    functions: Vec<ExportedFunction>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ─────────────────────────────────────────────────────────────────────────────

pub struct ExportOrchestrator {
    resolver: Arc<dyn ObjectResolver>,
    key_generator: Arc<dyn LanguageKeyGenerator>,
    functions: FunctionGenerator,
    conditions: ConditionRenderer,
    engines: EngineSet,
}

impl ExportOrchestrator {
    pub fn new(services: ExportServices) -> Self {
        let names = FunctionNameGenerator::new(services.counters, services.naming);
        Self {
            resolver: services.resolver,
            key_generator: services.key_generator,
            functions: FunctionGenerator::new(services.split_policy, names),
            conditions: ConditionRenderer::new(services.condition_syntax),
            engines: EngineSet::new(),
        }
    }

    /// Scope of one export with its own object cache and key registry
    fn scope(&self, project_id: &str, owner: ExportObject, settings: ExportSettings, cancel: CancellationToken) -> RenderScope {
        RenderScope::new(
            project_id,
            owner,
            settings,
            Arc::new(CachedObjectResolver::new(self.resolver.clone())),
            Arc::new(LanguageKeyRegistry::new(self.key_generator.clone())),
            cancel,
        )
    }

    /// Export a dialog
    ///
    /// An invalid graph yields an empty result carrying the graph errors.
    pub async fn export_dialog(&self, request: &DialogExportRequest, cancel: CancellationToken) -> Result<ExportResult> {
        let owner_id = request.owner.id.clone();
        info!(object_id = %owner_id, "Exporting dialog");

        let scope = self.scope(&request.project_id, request.owner.clone(), request.settings.clone(), cancel);
        let category = self.functions.names().naming().category_prefix.clone();
        let rendered = self
            .render_graph(&request.snippet, &request.templates, &category, &scope)
            .await
            .inspect_err(|err| error!(object_id = %owner_id, error = %err, "Dialog export aborted"))?;

        let Some(rendered) = rendered else {
            error!(object_id = %owner_id, "Dialog graph is invalid");
            return Ok(ExportResult {
                errors: scope.errors.entries(),
                ..ExportResult::default()
            });
        };

        let functions: Vec<FunctionData> = rendered.functions.iter().map(FunctionData::from).collect();
        let dialog = DialogData {
            kind: "dialog",
            start: rendered.primary.as_ref().map(|f| f.code.clone()).unwrap_or_default(),
            start_function: rendered.primary.as_ref().map(|f| f.name.clone()).unwrap_or_default(),
            additional_functions: self.wrap_functions(&functions, &request.templates.function, &scope),
            functions,
            object: ObjectData::from(scope.owner.as_ref()),
        };
        let code = self.engines.render(&request.templates.dialog, TemplateData::Dialog(&dialog), &scope);

        let result = ExportResult {
            code,
            primary: rendered.primary,
            functions: rendered.functions,
            errors: scope.errors.entries(),
            language_keys: scope.language_keys.entries(),
        };
        if result.has_fatal_error() {
            error!(object_id = %owner_id, errors = result.errors.len(), "Dialog exported with fatal errors");
        }
        Ok(result)
    }

    /// Export a state machine
    ///
    /// Node graph scripts go through the dialog pipeline, code scripts are
    /// passed through. States are exported in authored order.
    pub async fn export_state_machine(
        &self,
        request: &StateMachineExportRequest,
        cancel: CancellationToken,
    ) -> Result<StateMachineExportResult> {
        let machine = &request.state_machine;
        info!(object_id = %request.owner.id, state_machine = %machine.id, "Exporting state machine");

        let scope = self.scope(&request.project_id, request.owner.clone(), request.settings.clone(), cancel);
        let function_template = &request.templates.dialog.function;

        let mut states = Vec::with_capacity(machine.states.len());
        let mut exported = Vec::with_capacity(machine.states.len());
        let mut additional_functions = Vec::new();

        for state in &machine.states {
            scope.check_cancelled()?;
            let state_scope = scope.at(format!("state '{}'", state.name));

            let (primary, functions) = match &state.script {
                StateScript::None => (None, Vec::new()),
                StateScript::Code { code } => (
                    Some(ExportedFunction {
                        name: String::new(),
                        preview: None,
                        code: code.clone(),
                    }),
                    Vec::new(),
                ),
                StateScript::NodeGraph { graph } => {
                    let rendered = self
                        .render_graph(graph, &request.templates.dialog, STATE_MACHINE_CATEGORY, &state_scope)
                        .await
                        .inspect_err(|err| error!(state = %state.id, error = %err, "State machine export aborted"))?;
                    match rendered {
                        Some(rendered) => (rendered.primary, rendered.functions),
                        None => (None, Vec::new()),
                    }
                }
            };

            let function = primary.as_ref().map(|f| f.name.clone()).filter(|name| !name.is_empty());
            let code = primary.as_ref().map(|f| f.code.clone()).unwrap_or_default();

            let wrapped: Vec<FunctionData> = primary
                .iter()
                .filter(|f| !f.name.is_empty())
                .chain(functions.iter())
                .map(FunctionData::from)
                .collect();
            if !wrapped.is_empty() {
                additional_functions.push(self.wrap_functions(&wrapped, function_template, &state_scope));
            }

            let transitions = machine
                .transitions_from(&state.id)
                .into_iter()
                .map(|transition| {
                    let target_name = match machine.get_state(&transition.target) {
                        Some(target) => target.name.clone(),
                        None => {
                            warn!(state = %state.id, target = %transition.target, "Transition to unknown state");
                            String::new()
                        }
                    };
                    TransitionData {
                        kind: "transition",
                        target: transition.target.clone(),
                        target_name,
                        label: transition.label.clone().unwrap_or_default(),
                    }
                })
                .collect();

            debug!(state = %state.id, function = ?function, "Exported state");
            states.push(StateData {
                kind: "state",
                id: state.id.clone(),
                name: state.name.clone(),
                has_function: function.is_some(),
                function: function.clone().unwrap_or_default(),
                code: code.clone(),
                functions: functions.iter().map(FunctionData::from).collect(),
                transitions,
            });
            exported.push(ExportedState {
                id: state.id.clone(),
                name: state.name.clone(),
                function,
                code,
                functions,
            });
        }

        let data = StateMachineData {
            kind: "state_machine",
            id: machine.id.clone(),
            states,
            additional_functions: additional_functions.join(FUNCTION_SEPARATOR),
            object: ObjectData::from(scope.owner.as_ref()),
        };
        let code = self
            .engines
            .render(&request.templates.state_machine, TemplateData::StateMachine(&data), &scope);

        Ok(StateMachineExportResult {
            code,
            states: exported,
            errors: scope.errors.entries(),
            language_keys: scope.language_keys.entries(),
        })
    }

    /// Render collected language keys into a language file
    pub fn render_language_file(
        &self,
        project_id: &str,
        project_name: &str,
        template: &ExportTemplate,
        entries: &[LanguageKeyEntry],
        settings: &ExportSettings,
    ) -> LanguageFileExport {
        let project = ExportObject::new(project_id, project_name, ObjectType::default());
        let scope = self
            .scope(project_id, project, settings.clone(), CancellationToken::new())
            .with_location(format!("language file '{}'", project_name));

        let data = LanguageFileData::new(project_id, project_name, entries, settings);
        let code = self.engines.render(template, TemplateData::LanguageFile(&data), &scope);
        debug!(keys = entries.len(), "Rendered language file");

        LanguageFileExport {
            code,
            errors: scope.errors.entries(),
        }
    }

    /// Wrap functions with the `function` template
    fn wrap_functions(&self, functions: &[FunctionData], template: &ExportTemplate, scope: &RenderScope) -> String {
        functions
            .iter()
            .map(|function| self.engines.render(template, TemplateData::Function(function), scope))
            .collect::<Vec<_>>()
            .join(FUNCTION_SEPARATOR)
    }

    /// Parse, split and render a graph; `None` if the graph is invalid
    async fn render_graph(
        &self,
        snippet: &NodeGraphSnippet,
        templates: &DialogTemplates,
        category: &str,
        scope: &RenderScope,
    ) -> Result<Option<RenderedGraph>> {
        let location = scope.location().to_string();
        let Some(graph) = NodeGraphParser::parse(snippet, &scope.errors, &location) else {
            return Ok(None);
        };
        let plan = self.functions.split(&graph, category, scope).await?;

        let primary = match plan.primary() {
            Some(function) => Some(self.render_function(&graph, &plan, function, templates, scope).await?),
            None => None,
        };

        // Each auxiliary function records into its own collection so the
        // merged errors follow function order, not completion order
        let (graph, plan) = (&graph, &plan);
        let renders = plan.auxiliary().iter().map(|function| {
            let errors = TemplateErrorCollection::new();
            let function_scope = scope.with_errors(errors.clone());
            async move {
                let rendered = self.render_function(graph, plan, function, templates, &function_scope).await;
                (rendered, errors)
            }
        });

        let mut functions = Vec::with_capacity(plan.auxiliary().len());
        for (rendered, errors) in join_all(renders).await {
            scope.errors.extend_from(&errors);
            functions.push(rendered?);
        }

        Ok(Some(RenderedGraph { primary, functions }))
    }

    /// Render the steps of one function, one block per step
    async fn render_function(
        &self,
        graph: &ParsedGraph,
        plan: &FunctionPlan,
        function: &PlannedFunction,
        templates: &DialogTemplates,
        scope: &RenderScope,
    ) -> Result<ExportedFunction> {
        let scope = scope.at(format!("function {}", function.name));
        let mut blocks = Vec::with_capacity(function.steps.len());

        for &index in &function.steps {
            scope.check_cancelled()?;
            let step = graph.step(index);
            let step_scope = scope.at(format!("{} {}", step.kind(), step.id()));
            let ctx = StepContext {
                graph,
                plan,
                conditions: &self.conditions,
                scope: &step_scope,
            };

            let data = StepData::build(step, &ctx).await?;
            let code = self
                .engines
                .render(data.template(templates), TemplateData::Step(&data), &step_scope);
            debug!(function = %function.name, step_id = %step.id(), kind = %step.kind(), "Rendered step");

            let code = trim_empty_lines(&code);
            if !code.is_empty() {
                blocks.push(code);
            }
        }

        Ok(ExportedFunction {
            name: function.name.clone(),
            preview: function.preview.clone(),
            code: blocks.join("\n"),
        })
    }
}
