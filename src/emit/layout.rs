//! Index pre-pass.
//!
//! Every index is assigned here, before a single byte is written, so connection lines and
//! widget references can point forward to components that are emitted later.

use log::debug;

use super::BuildContext;
use crate::diagnostics::{Section, Severity};
use crate::error::BuildError;
use crate::project::{ComponentDefinition, FlowDefinition, VariableDefinition};
use crate::registry::{Collection, component_input_key};

/// Project contents in emission order.
pub(super) struct ProjectLayout<'p> {
    pub flows: Vec<FlowLayout<'p>>,
    pub globals: Vec<&'p VariableDefinition>,
}

pub(super) struct FlowLayout<'p> {
    pub flow: &'p FlowDefinition,
    pub index: usize,
    /// Emitted components, ordered by index.
    pub components: Vec<&'p ComponentDefinition>,
    /// User properties followed by local variables.
    pub locals: Vec<&'p VariableDefinition>,
}

impl<'p> BuildContext<'_, 'p> {
    pub(super) fn assign_indexes(&mut self) -> Result<ProjectLayout<'p>, BuildError> {
        let project = self.project;

        let mut flows = Vec::with_capacity(project.flows.len());
        for flow in &project.flows {
            if self.registry.find(Collection::Flow, &flow.id).is_some() {
                return Err(BuildError::DuplicateFlow(flow.id.clone()));
            }
            let index = self.registry.index_of(Collection::Flow, &flow.id);
            flows.push((index, flow));
        }

        let mut globals = Vec::new();
        for variable in &project.global_variables {
            if self.asset_bundle && variable.native {
                debug!("Leaving native global '{}' out of the bundle", variable.name);
                continue;
            }
            if self.register_variable(Collection::GlobalVariable, variable, "globalVariables") {
                globals.push(variable);
            }
        }

        let flows = flows
            .into_iter()
            .map(|(index, flow)| self.assign_flow_indexes(index, flow))
            .collect();

        Ok(ProjectLayout { flows, globals })
    }

    fn assign_flow_indexes(&mut self, flow_index: usize, flow: &'p FlowDefinition) -> FlowLayout<'p> {
        let mut components = Vec::with_capacity(flow.components.len());
        for component in &flow.components {
            if !self.emitter.classes.emits(&component.class_name) {
                continue;
            }
            let collection = Collection::Component(flow_index);
            if self.registry.find(collection, &component.id).is_some() {
                self.report(
                    Section::Checks,
                    Severity::Error,
                    &format!("Duplicate component id '{}'", component.id),
                    &format!("flows/{}/components/{}", flow.id, component.id),
                );
                continue;
            }
            let component_index = self.registry.index_of(collection, &component.id);

            for input in &component.inputs {
                self.registry.index_of(
                    Collection::ComponentInput(flow_index),
                    &component_input_key(&component.id, &input.name),
                );
            }
            for property in component.properties.iter().filter(|p| p.kind.is_flow_property()) {
                self.registry.index_of(
                    Collection::ComponentProperty {
                        flow: flow_index,
                        component: component_index,
                    },
                    &property.name,
                );
            }
            for output in &component.outputs {
                self.registry.index_of(
                    Collection::ComponentOutput {
                        flow: flow_index,
                        component: component_index,
                    },
                    &output.name,
                );
            }
            components.push(component);
        }

        let mut locals = Vec::new();
        let collection = Collection::LocalVariable(flow_index);
        let path = format!("flows/{}/localVariables", flow.id);
        for variable in flow.user_properties.iter().chain(&flow.local_variables) {
            if self.register_variable(collection, variable, &path) {
                locals.push(variable);
            }
        }

        debug!(
            "Flow '{}' is #{} with {} component(s)",
            flow.id,
            flow_index,
            components.len()
        );

        FlowLayout {
            flow,
            index: flow_index,
            components,
            locals,
        }
    }

    // The first of several variables with the same name wins.
    fn register_variable(&mut self, collection: Collection, variable: &VariableDefinition, path: &str) -> bool {
        if self.registry.find(collection, &variable.name).is_some() {
            self.report(
                Section::Checks,
                Severity::Error,
                &format!("Duplicate variable '{}'", variable.name),
                &format!("{}/{}", path, variable.name),
            );
            return false;
        }
        self.registry.index_of(collection, &variable.name);
        true
    }
}
