// State Machine Document - States, their scripts and transitions

use serde::Serialize;

use super::FunctionData;
use crate::catalog::PlaceholderDescription;
use crate::context::ObjectData;
use crate::placeholder::{render_conditional_range, render_list_range, replace_block_placeholders};

#[derive(Debug, Clone, Serialize)]
pub struct TransitionData {
    pub kind: &'static str,
    pub target: String,
    /// Name of the target state, empty if it does not exist
    pub target_name: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateData {
    pub kind: &'static str,
    pub id: String,
    pub name: String,
    /// Whether the state script was exported as a function
    pub has_function: bool,
    pub function: String,
    /// Code of the state script
    pub code: String,
    pub functions: Vec<FunctionData>,
    pub transitions: Vec<TransitionData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateMachineData {
    pub kind: &'static str,
    pub id: String,
    pub states: Vec<StateData>,
    /// Auxiliary functions of all state scripts, rendered with the `function` template
    pub additional_functions: String,
    pub object: ObjectData,
}

fn fill_transition(code: &str, transition: &TransitionData) -> String {
    replace_block_placeholders(code, |name| match name {
        "Transition_Target" => Some(transition.target.clone()),
        "Transition_TargetName" => Some(transition.target_name.clone()),
        "Transition_Label" => Some(transition.label.clone()),
        _ => None,
    })
}

fn fill_state(code: &str, state: &StateData) -> String {
    let code = render_conditional_range(code, "State_HasFunction", state.has_function);
    let code = render_conditional_range(&code, "State_HasNoFunction", !state.has_function);
    let code = render_list_range(&code, "State_Transitions", &state.transitions, |inner, transition, _| {
        fill_transition(inner, transition)
    });

    replace_block_placeholders(&code, |name| match name {
        "State_Id" => Some(state.id.clone()),
        "State_Name" => Some(state.name.clone()),
        "State_Function" => Some(state.function.clone()),
        "State_Code" => Some(state.code.clone()),
        _ => None,
    })
}

pub fn fill(code: &str, data: &StateMachineData) -> String {
    let code = render_list_range(code, "StateMachine_States", &data.states, |inner, state, _| {
        fill_state(inner, state)
    });

    replace_block_placeholders(&code, |name| match name {
        "StateMachine_Id" => Some(data.id.clone()),
        "StateMachine_Additional_Functions" => Some(data.additional_functions.clone()),
        "StateMachine_ObjectName" => Some(data.object.name.clone()),
        _ => None,
    })
}

pub const LEGACY_PLACEHOLDERS: &[PlaceholderDescription] = &[
    PlaceholderDescription::new("StateMachine_Id", "Id of the state machine"),
    PlaceholderDescription::new("StateMachine_ObjectName", "Name of the object owning the state machine"),
    PlaceholderDescription::new(
        "StateMachine_Additional_Functions",
        "Auxiliary functions of all state scripts, rendered with the function template",
    ),
    PlaceholderDescription::new("StateMachine_States_Start", "Content rendered once per state"),
    PlaceholderDescription::new("StateMachine_States_End", "Ends StateMachine_States_Start"),
    PlaceholderDescription::new("State_Id", "Id of the state"),
    PlaceholderDescription::new("State_Name", "Name of the state"),
    PlaceholderDescription::new("State_Function", "Entry function of a node graph state script"),
    PlaceholderDescription::new("State_Code", "Code of the state script"),
    PlaceholderDescription::new("State_HasFunction_Start", "Content rendered only if the script is a function"),
    PlaceholderDescription::new("State_HasFunction_End", "Ends State_HasFunction_Start"),
    PlaceholderDescription::new("State_HasNoFunction_Start", "Content rendered only if the script is plain code"),
    PlaceholderDescription::new("State_HasNoFunction_End", "Ends State_HasNoFunction_Start"),
    PlaceholderDescription::new("State_Transitions_Start", "Content rendered once per outgoing transition"),
    PlaceholderDescription::new("State_Transitions_End", "Ends State_Transitions_Start"),
    PlaceholderDescription::new("Transition_Target", "Id of the target state"),
    PlaceholderDescription::new("Transition_TargetName", "Name of the target state"),
    PlaceholderDescription::new("Transition_Label", "Label of the transition"),
];

pub const SCRIPTING_PLACEHOLDERS: &[PlaceholderDescription] = &[
    PlaceholderDescription::new("state_machine.id", "Id of the state machine"),
    PlaceholderDescription::new("state_machine.object", "Object owning the state machine"),
    PlaceholderDescription::new("state_machine.additional_functions", "Auxiliary functions of all state scripts"),
    PlaceholderDescription::new("state_machine.states", "States in authored order"),
    PlaceholderDescription::new("state_machine.states[i].name", "Name of the state"),
    PlaceholderDescription::new("state_machine.states[i].has_function", "Whether the script is a function"),
    PlaceholderDescription::new("state_machine.states[i].function", "Entry function of the state script"),
    PlaceholderDescription::new("state_machine.states[i].code", "Code of the state script"),
    PlaceholderDescription::new("state_machine.states[i].transitions", "Outgoing transitions"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use tale_types::{ExportObject, ObjectType};

    fn state(id: &str, name: &str, function: Option<&str>, code: &str, targets: &[(&str, &str)]) -> StateData {
        StateData {
            kind: "state",
            id: id.into(),
            name: name.into(),
            has_function: function.is_some(),
            function: function.unwrap_or_default().into(),
            code: code.into(),
            functions: Vec::new(),
            transitions: targets
                .iter()
                .map(|(target, label)| TransitionData {
                    kind: "transition",
                    target: target.to_string(),
                    target_name: target.to_uppercase(),
                    label: label.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_fill_states_and_transitions() {
        let data = StateMachineData {
            kind: "state_machine",
            id: "sm".into(),
            states: vec![
                state("idle", "Idle", None, "wait()\nlook()", &[("talk", "greeted")]),
                state("talk", "Talk", Some("StateMachine_Bob_Step1"), "", &[]),
            ],
            additional_functions: String::new(),
            object: ObjectData::from(&ExportObject::new("n1", "Bob", ObjectType::Npc)),
        };
        let code = "machine(\"{{StateMachine_ObjectName}}\", {
    {{StateMachine_States_Start}}
    {{State_Name}} = {
        {{State_HasFunction_Start}}
        run = {{State_Function}},
        {{State_HasFunction_End}}
        {{State_HasNoFunction_Start}}
        run = function()
            {{State_Code}}
        end,
        {{State_HasNoFunction_End}}
        {{State_Transitions_Start}}
        on_{{Transition_Label}} = \"{{Transition_TargetName}}\",
        {{State_Transitions_End}}
    },
    {{StateMachine_States_End}}
})";

        assert_eq!(
            fill(code, &data),
            "machine(\"Bob\", {
    Idle = {
        run = function()
            wait()
            look()
        end,
        on_greeted = \"TALK\",
    },
    Talk = {
        run = StateMachine_Bob_Step1,
    },
})"
        );
    }
}
