//! The diagnostic map: a JSON-friendly mirror of the blob that ties indices and offsets back
//! to the objects they came from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMap {
    pub flows: Vec<FlowMap>,
    /// The constants table, rendered as text.
    pub constants: Vec<String>,
    pub global_variables: Vec<VariableMap>,
    /// The value-type table; property and output type indices point into it.
    pub types: Vec<String>,
    /// Type ids handed out to dashboard-only classes during the build.
    pub dashboard_component_types: BTreeMap<u16, String>,
}

impl AssetMap {
    pub fn flow(&self, id: &str) -> Option<&FlowMap> {
        self.flows.iter().find(|flow| flow.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowMap {
    pub id: String,
    pub name: String,
    pub index: usize,
    pub path: String,
    pub components: Vec<ComponentMap>,
    /// Every component input of the flow, in input index order.
    pub component_inputs: Vec<ComponentInputMap>,
    pub local_variables: Vec<VariableMap>,
    pub widget_data_items: Vec<WidgetMap>,
    pub widget_actions: Vec<WidgetMap>,
}

impl FlowMap {
    pub fn component(&self, id: &str) -> Option<&ComponentMap> {
        self.components.iter().find(|component| component.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInputMap {
    pub input_index: usize,
    pub component_index: usize,
    pub input_name: String,
    pub input_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMap {
    pub id: String,
    pub class_name: String,
    pub path: String,
    pub index: usize,
    /// Absolute offset of the component record in the blob.
    pub offset: usize,
    pub type_id: u16,
    pub input_indexes: BTreeMap<String, usize>,
    pub properties: Vec<PropertyMap>,
    pub property_indexes: BTreeMap<String, usize>,
    pub outputs: Vec<OutputMap>,
    pub output_indexes: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyMap {
    pub name: String,
    pub value_type_index: usize,
    /// Absolute offset of the property's instruction stream.
    pub offset: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputMap {
    pub name: String,
    pub value_type_index: usize,
    /// Flow handling a property output, -1 for regular outputs.
    pub action_flow_index: i32,
    pub connection_lines: Vec<ConnectionLineMap>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionLineMap {
    pub target_component_index: i32,
    pub target_input_index: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableMap {
    pub name: String,
    pub index: usize,
    pub value_type: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetMap {
    /// -1 when the reference could not be resolved.
    pub component_index: i32,
    /// Property index for data items, output index for actions.
    pub target_index: i32,
}
