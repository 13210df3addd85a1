use log::debug;

use super::BuildContext;
use super::layout::FlowLayout;
use super::map::{ComponentInputMap, FlowMap, WidgetMap};
use crate::diagnostics::{Section, Severity};
use crate::error::{BuildError, WriterError};
use crate::project::WidgetBindingDefinition;
use crate::registry::{Collection, component_input_key};
use crate::value::write_value_table;
use crate::writer::AssetWriter;

const INPUT_FLAG_SEQUENCE: u8 = 1 << 0;
const INPUT_FLAG_OPTIONAL: u8 = 1 << 1;

impl<'p> BuildContext<'_, 'p> {
    pub(super) fn write_flows(
        &mut self,
        writer: &mut AssetWriter,
        flows: &[FlowLayout<'p>],
    ) -> Result<Vec<FlowMap>, BuildError> {
        let mut maps = Vec::with_capacity(flows.len());
        writer.write_array(flows, 4, |w, layout, _| -> Result<(), BuildError> {
            maps.push(self.write_flow(w, layout)?);
            Ok(())
        })?;
        Ok(maps)
    }

    /// Flow record:
    ///
    /// ```text
    /// components array
    /// local variables table (8-aligned)
    /// u32 -> u8 input flags, one per component input
    /// widget data items: (i16 component, i16 property) pairs
    /// widget actions: (i16 component, i16 output) pairs
    /// u8 "user property is assignable" flags
    /// ```
    fn write_flow(&mut self, writer: &mut AssetWriter, layout: &FlowLayout<'p>) -> Result<FlowMap, BuildError> {
        let flow = layout.flow;
        let path = format!("flows/{}", flow.id);
        debug!("Emitting flow '{}' at offset {}", flow.id, writer.offset());

        let mut components = Vec::with_capacity(layout.components.len());
        writer.write_array(&layout.components, 4, |w, component, index| -> Result<(), BuildError> {
            components.push(self.write_component(w, layout, component, index)?);
            Ok(())
        })?;

        let mut local_variables = Vec::with_capacity(layout.locals.len());
        let mut values = Vec::with_capacity(layout.locals.len());
        for (index, variable) in layout.locals.iter().enumerate() {
            let value = self.resolve_variable(variable, &format!("{}/localVariables/{}", path, variable.name));
            local_variables.push(super::variable_map(variable, index, &value));
            values.push(value);
        }
        write_value_table(writer, &values)?;

        let component_inputs = self.component_inputs(layout);
        let input_flags = self.input_flags(layout);
        writer.write_future_array(|w| {
            w.write_number_array(&input_flags, |w, &flags, _| -> Result<(), WriterError> {
                w.write_u8(flags);
                Ok(())
            })
        })?;

        let mut widget_data_items = Vec::with_capacity(flow.widget_data_items.len());
        writer.write_array(&flow.widget_data_items, 4, |w, item, i| -> Result<(), BuildError> {
            let resolved = self.resolve_widget_data_item(layout.index, item);
            if resolved.component_index < 0 {
                self.report(
                    Section::Output,
                    Severity::Error,
                    "Widget data item not found",
                    &format!("{}/widgetDataItems/{}", path, i),
                );
            }
            write_widget_map(w, resolved);
            widget_data_items.push(resolved);
            Ok(())
        })?;

        let mut widget_actions = Vec::with_capacity(flow.widget_actions.len());
        writer.write_array(&flow.widget_actions, 4, |w, item, i| -> Result<(), BuildError> {
            let resolved = self.resolve_widget_action(layout.index, item);
            if resolved.component_index < 0 {
                self.report(
                    Section::Output,
                    Severity::Error,
                    "Widget action output not found",
                    &format!("{}/widgetActions/{}", path, i),
                );
            }
            write_widget_map(w, resolved);
            widget_actions.push(resolved);
            Ok(())
        })?;

        let assignable: Vec<u8> = flow
            .user_properties
            .iter()
            .map(|property| u8::from(property.assignable))
            .collect();
        writer.write_number_array(&assignable, |w, &flag, _| -> Result<(), WriterError> {
            w.write_u8(flag);
            Ok(())
        })?;

        Ok(FlowMap {
            id: flow.id.clone(),
            name: flow.name.clone(),
            index: layout.index,
            path,
            components,
            component_inputs,
            local_variables,
            widget_data_items,
            widget_actions,
        })
    }

    fn component_inputs(&self, layout: &FlowLayout<'p>) -> Vec<ComponentInputMap> {
        let collection = Collection::ComponentInput(layout.index);
        let mut inputs: Vec<ComponentInputMap> = layout
            .components
            .iter()
            .enumerate()
            .flat_map(|(component_index, component)| {
                component.inputs.iter().filter_map(move |input| {
                    let key = component_input_key(&component.id, &input.name);
                    Some(ComponentInputMap {
                        input_index: self.registry.find(collection, &key)?,
                        component_index,
                        input_name: input.name.clone(),
                        input_type: input.value_type.clone(),
                    })
                })
            })
            .collect();
        inputs.sort_by_key(|input| input.input_index);
        inputs
    }

    /// One flag byte per component input, in input index order.
    fn input_flags(&self, layout: &FlowLayout<'p>) -> Vec<u8> {
        let collection = Collection::ComponentInput(layout.index);
        let mut flags = vec![0u8; self.registry.len(collection)];
        for component in &layout.components {
            for input in &component.inputs {
                let key = component_input_key(&component.id, &input.name);
                if let Some(slot) = self.registry.find(collection, &key).and_then(|i| flags.get_mut(i)) {
                    if input.is_sequence_input {
                        *slot |= INPUT_FLAG_SEQUENCE;
                    }
                    if input.is_optional {
                        *slot |= INPUT_FLAG_OPTIONAL;
                    }
                }
            }
        }
        flags
    }

    fn resolve_widget_data_item(&self, flow_index: usize, item: &WidgetBindingDefinition) -> WidgetMap {
        let resolved = self
            .registry
            .find(Collection::Component(flow_index), &item.component)
            .and_then(|component| {
                let property = self.registry.find(
                    Collection::ComponentProperty {
                        flow: flow_index,
                        component,
                    },
                    &item.name,
                )?;
                Some((component, property))
            });
        widget_map(resolved)
    }

    fn resolve_widget_action(&self, flow_index: usize, item: &WidgetBindingDefinition) -> WidgetMap {
        let resolved = self
            .registry
            .find(Collection::Component(flow_index), &item.component)
            .and_then(|component| {
                let output = self.registry.find(
                    Collection::ComponentOutput {
                        flow: flow_index,
                        component,
                    },
                    &item.name,
                )?;
                Some((component, output))
            });
        widget_map(resolved)
    }
}

fn widget_map(resolved: Option<(usize, usize)>) -> WidgetMap {
    match resolved.and_then(|(c, t)| Some((i16::try_from(c).ok()?, i16::try_from(t).ok()?))) {
        Some((component_index, target_index)) => WidgetMap {
            component_index: i32::from(component_index),
            target_index: i32::from(target_index),
        },
        None => WidgetMap {
            component_index: -1,
            target_index: -1,
        },
    }
}

fn write_widget_map(writer: &mut AssetWriter, resolved: WidgetMap) {
    // Both fields come from i16 values or the -1 sentinel.
    writer.write_i16(resolved.component_index as i16);
    writer.write_i16(resolved.target_index as i16);
}
