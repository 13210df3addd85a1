use std::collections::BTreeMap;

use log::debug;

use super::layout::FlowLayout;
use super::map::{ComponentMap, ConnectionLineMap, OutputMap, PropertyMap};
use super::{BuildContext, ERROR_OUTPUT_NAME, SEQOUT_OUTPUT_NAME};
use crate::component_types::HookContext;
use crate::diagnostics::{Section, Severity};
use crate::error::{BuildError, WriterError};
use crate::expression::ExpressionContext;
use crate::expression::instruction::write_end_instruction;
use crate::project::{
    ComponentDefinition, ConnectionLineDefinition, OutputDefinition, OutputKind, PropertyDefinition,
};
use crate::registry::{Collection, component_input_key};
use crate::writer::AssetWriter;

/// Type id of components whose class cannot be resolved.
pub const COMPONENT_TYPE_NONE: u16 = 0;

impl<'p> BuildContext<'_, 'p> {
    /// Component record:
    ///
    /// ```text
    /// u16 type id, u16 breakpoint flag
    /// u16 input indexes
    /// property instruction streams
    /// outputs: each a list of (u16 component, u16 input) targets + u32 seqout flag
    /// i16 @error output index, u16 reserved
    /// class-specific tail
    /// ```
    pub(super) fn write_component(
        &mut self,
        writer: &mut AssetWriter,
        layout: &FlowLayout<'p>,
        component: &'p ComponentDefinition,
        component_index: usize,
    ) -> Result<ComponentMap, BuildError> {
        let flow = layout.flow;
        let flow_index = layout.index;
        let path = format!("flows/{}/components/{}", flow.id, component.id);

        writer.align(4)?;
        let offset = writer.offset();

        let type_id = self.component_type_id(component, &path);
        debug!(
            "Component '{}' ({}, type {}) at offset {}",
            component.id, component.class_name, type_id, offset
        );
        writer.write_u16(type_id);
        writer.write_u16(u16::from(self.emitter.options.is_breakpoint(&component.id)));

        // Inputs
        let input_collection = Collection::ComponentInput(flow_index);
        let mut input_indexes = BTreeMap::new();
        let mut inputs = Vec::with_capacity(component.inputs.len());
        for input in &component.inputs {
            let index = self
                .registry
                .index_of(input_collection, &component_input_key(&component.id, &input.name));
            input_indexes.insert(input.name.clone(), index);
            inputs.push(index_u16(index)?);
        }
        writer.write_number_array(&inputs, |w, &index, _| -> Result<(), WriterError> {
            w.write_u16(index);
            Ok(())
        })?;

        // Properties
        let flow_properties: Vec<&PropertyDefinition> = component
            .properties
            .iter()
            .filter(|property| property.kind.is_flow_property())
            .collect();
        let property_collection = Collection::ComponentProperty {
            flow: flow_index,
            component: component_index,
        };
        let mut properties = Vec::with_capacity(flow_properties.len());
        let mut property_indexes = BTreeMap::new();
        writer.write_array(&flow_properties, 4, |w, property, _| -> Result<(), BuildError> {
            let index = self.registry.index_of(property_collection, &property.name);
            property_indexes.insert(property.name.clone(), index);
            properties.push(self.write_property(w, layout, component, component_index, property, &path)?);
            Ok(())
        })?;

        // Outputs
        let output_collection = Collection::ComponentOutput {
            flow: flow_index,
            component: component_index,
        };
        let mut outputs = Vec::with_capacity(component.outputs.len());
        let mut output_indexes = BTreeMap::new();
        writer.write_array(&component.outputs, 4, |w, output, _| -> Result<(), BuildError> {
            let index = self.registry.index_of(output_collection, &output.name);
            output_indexes.insert(output.name.clone(), index);
            outputs.push(self.write_output(w, layout, component, output, &path)?);
            Ok(())
        })?;

        let error_output = component
            .outputs
            .iter()
            .any(|output| output.name == ERROR_OUTPUT_NAME)
            .then(|| self.registry.find(output_collection, ERROR_OUTPUT_NAME))
            .flatten()
            .and_then(|index| i16::try_from(index).ok())
            .unwrap_or(-1);
        writer.write_i16(error_output);
        writer.write_u16(0);

        self.write_type_specific(writer, layout, component, component_index, &path)?;

        Ok(ComponentMap {
            id: component.id.clone(),
            class_name: component.class_name.clone(),
            path,
            index: component_index,
            offset,
            type_id,
            input_indexes,
            properties,
            property_indexes,
            outputs,
            output_indexes,
        })
    }

    fn component_type_id(&mut self, component: &ComponentDefinition, path: &str) -> u16 {
        let fixed = self
            .emitter
            .classes
            .get(&component.class_name)
            .and_then(|class| class.type_id);
        match fixed.or_else(|| self.registry.dashboard_component_type(&component.class_name)) {
            Some(type_id) => type_id,
            None => {
                self.report(
                    Section::Output,
                    Severity::Error,
                    "Component is not supported for the build target",
                    path,
                );
                COMPONENT_TYPE_NONE
            }
        }
    }

    /// Writes one instruction stream. Hidden properties and properties that fail to compile
    /// get a lone `End`.
    fn write_property(
        &mut self,
        writer: &mut AssetWriter,
        layout: &FlowLayout<'p>,
        component: &'p ComponentDefinition,
        component_index: usize,
        property: &PropertyDefinition,
        component_path: &str,
    ) -> Result<PropertyMap, BuildError> {
        let emitter = self.emitter;
        let offset = writer.offset();
        let value_type_index = self.registry.type_index(&property.value_type);

        if property.hidden {
            write_end_instruction(writer);
        } else {
            let mut ctx = ExpressionContext {
                registry: &mut self.registry,
                project: self.project,
                flow: layout.flow,
                flow_index: layout.index,
                component,
                component_index,
            };
            let compiled = emitter.expression_compiler.compile(
                &mut ctx,
                writer,
                &property.expression,
                property.kind,
            );
            if let Err(e) = compiled {
                writer.rollback(offset)?;
                write_end_instruction(writer);
                self.report(
                    Section::Output,
                    Severity::Error,
                    &e.to_string(),
                    &format!("{}/properties/{}", component_path, property.name),
                );
            }
        }

        #[cfg(feature = "debug-tools")]
        debug!(
            "{}/properties/{}:\n{}",
            component_path,
            property.name,
            crate::expression::disassemble(writer.as_bytes(), offset, self.registry.constants())
        );

        Ok(PropertyMap {
            name: property.name.clone(),
            value_type_index,
            offset,
        })
    }

    fn write_output(
        &mut self,
        writer: &mut AssetWriter,
        layout: &FlowLayout<'p>,
        component: &ComponentDefinition,
        output: &OutputDefinition,
        component_path: &str,
    ) -> Result<OutputMap, BuildError> {
        let output_path = format!("{}/outputs/{}", component_path, output.name);
        let lines: Vec<&ConnectionLineDefinition> = layout
            .flow
            .connection_lines
            .iter()
            .filter(|line| line.source == component.id && line.output == output.name)
            .collect();

        let mut connection_lines = Vec::with_capacity(lines.len());
        writer.write_array(&lines, 4, |w, line, _| -> Result<(), BuildError> {
            let target = self.resolve_connection_target(layout.index, line);
            match target {
                Some((component_index, input_index)) => {
                    w.write_u16(component_index);
                    w.write_u16(input_index);
                    connection_lines.push(ConnectionLineMap {
                        target_component_index: i32::from(component_index),
                        target_input_index: i32::from(input_index),
                    });
                }
                None => {
                    self.report(
                        Section::Output,
                        Severity::Error,
                        &format!("Connection line target '{}.{}' not found", line.target, line.input),
                        &output_path,
                    );
                    w.write_i16(-1);
                    w.write_i16(-1);
                    connection_lines.push(ConnectionLineMap {
                        target_component_index: -1,
                        target_input_index: -1,
                    });
                }
            }
            Ok(())
        })?;
        writer.write_u32(u32::from(output.name == SEQOUT_OUTPUT_NAME));

        let action_flow_index = match (output.kind, &output.handler) {
            (OutputKind::Property, Some(handler)) => {
                let flow_index = self
                    .project
                    .flows
                    .iter()
                    .find(|flow| &flow.name == handler)
                    .and_then(|flow| self.registry.find(Collection::Flow, &flow.id));
                match flow_index.and_then(|index| i32::try_from(index).ok()) {
                    Some(index) => index,
                    None => {
                        self.report(
                            Section::Output,
                            Severity::Error,
                            &format!("Action flow '{}' not found", handler),
                            &output_path,
                        );
                        -1
                    }
                }
            }
            _ => -1,
        };

        Ok(OutputMap {
            name: output.name.clone(),
            value_type_index: self.registry.type_index(&output.value_type),
            action_flow_index,
            connection_lines,
        })
    }

    fn resolve_connection_target(
        &self,
        flow_index: usize,
        line: &ConnectionLineDefinition,
    ) -> Option<(u16, u16)> {
        let component = self
            .registry
            .find(Collection::Component(flow_index), &line.target)?;
        let input = self.registry.find(
            Collection::ComponentInput(flow_index),
            &component_input_key(&line.target, &line.input),
        )?;
        Some((u16::try_from(component).ok()?, u16::try_from(input).ok()?))
    }

    fn write_type_specific(
        &mut self,
        writer: &mut AssetWriter,
        layout: &FlowLayout<'p>,
        component: &'p ComponentDefinition,
        component_index: usize,
        component_path: &str,
    ) -> Result<(), BuildError> {
        let emitter = self.emitter;
        let Some(hook) = emitter.hooks.get(&component.class_name) else {
            return Ok(());
        };
        let mark = writer.offset();
        let mut ctx = HookContext {
            registry: &mut self.registry,
            project: self.project,
            flow: layout.flow,
            flow_index: layout.index,
            component,
            component_index,
        };
        if let Err(e) = hook.write(&mut ctx, writer) {
            writer.rollback(mark)?;
            self.report(Section::Output, Severity::Error, &e.to_string(), component_path);
        }
        Ok(())
    }
}

fn index_u16(index: usize) -> Result<u16, BuildError> {
    u16::try_from(index).map_err(|_| BuildError::Writer(WriterError::OffsetOverflow(index)))
}
