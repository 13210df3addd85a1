use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// The complete, canonical definition of a project, ready for emission.
/// This is the target structure for any custom project format conversion.
#[derive(Debug, Clone, Default)]
pub struct ProjectDefinition {
    pub kind: ProjectKind,
    pub flows: Vec<FlowDefinition>,
    pub global_variables: Vec<VariableDefinition>,
    pub structures: Vec<StructureDefinition>,
}

/// The build target. Only flow-capable kinds carry flow data in the blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectKind {
    #[default]
    Dashboard,
    Applet,
    FirmwareWithFlow,
    Firmware,
}

impl ProjectKind {
    pub fn has_flow_support(self) -> bool {
        !matches!(self, ProjectKind::Firmware)
    }

    /// Dashboard projects may use component classes without a fixed type id.
    pub fn is_dashboard(self) -> bool {
        matches!(self, ProjectKind::Dashboard)
    }
}

/// A flow: components, the lines between them and the flow's own variables.
#[derive(Debug, Clone, Default)]
pub struct FlowDefinition {
    /// Unique within the project. Flow indices are keyed by it.
    pub id: String,
    /// Name used by components that call this flow.
    pub name: String,
    pub components: Vec<ComponentDefinition>,
    pub connection_lines: Vec<ConnectionLineDefinition>,
    pub user_properties: Vec<VariableDefinition>,
    pub local_variables: Vec<VariableDefinition>,
    /// Widget data references, in the order the UI numbers them.
    pub widget_data_items: Vec<WidgetBindingDefinition>,
    /// Widget action references, in the order the UI numbers them.
    pub widget_actions: Vec<WidgetBindingDefinition>,
}

/// A single graph node.
#[derive(Debug, Clone, Default)]
pub struct ComponentDefinition {
    /// Unique within its flow.
    pub id: String,
    pub class_name: String,
    pub inputs: Vec<InputDefinition>,
    pub outputs: Vec<OutputDefinition>,
    pub properties: Vec<PropertyDefinition>,
    /// Class-specific configuration that is not an expression (e.g. the flow a `CallAction`
    /// calls).
    pub settings: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default)]
pub struct InputDefinition {
    pub name: String,
    /// Declared value type; empty when the input accepts anything.
    pub value_type: String,
    pub is_sequence_input: bool,
    pub is_optional: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputKind {
    /// A regular output wired with connection lines.
    #[default]
    Output,
    /// An output that hands control to an action flow (widget event handlers).
    Property,
}

#[derive(Debug, Clone, Default)]
pub struct OutputDefinition {
    pub name: String,
    pub value_type: String,
    pub kind: OutputKind,
    /// Name of the action flow handling a `Property` output.
    pub handler: Option<String>,
}

/// How a property value reaches the VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropertyKind {
    /// Evaluated expression.
    #[default]
    Input,
    /// Text with `{expr}` placeholders, compiled to a string concatenation.
    TemplateLiteral,
    /// Expression that must denote a storage location.
    Assignable,
    /// Build-time configuration; never encoded.
    Static,
}

impl PropertyKind {
    pub fn is_flow_property(self) -> bool {
        !matches!(self, PropertyKind::Static)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PropertyDefinition {
    pub name: String,
    pub kind: PropertyKind,
    pub expression: String,
    pub value_type: String,
    /// Disabled in the current configuration; encoded as an empty instruction stream.
    pub hidden: bool,
}

/// `(source, output) -> (target, input)`. `target` may name a component that no longer exists.
#[derive(Debug, Clone, Default)]
pub struct ConnectionLineDefinition {
    pub source: String,
    pub output: String,
    pub target: String,
    pub input: String,
}

/// A global variable, local variable or flow user property.
#[derive(Debug, Clone, Default)]
pub struct VariableDefinition {
    pub name: String,
    pub value_type: Option<String>,
    /// Constant expression; empty means the default for the type.
    pub default_value: String,
    /// Lives in host code; excluded from asset bundles.
    pub native: bool,
    /// For user properties: whether the caller may assign to it.
    pub assignable: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StructureDefinition {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
    /// Structures the VM itself defines. Listed separately in the generated defs.
    pub system: bool,
}

impl StructureDefinition {
    /// Position of a field in the encoded struct. Struct values are laid out in field-name
    /// order, so this is the rank of `name` among the sorted field names.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .map(|field| field.name.as_str())
            .sorted()
            .position(|field| field == name)
    }

    /// Field names in encoded order.
    pub fn sorted_field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).sorted().collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FieldDefinition {
    pub name: String,
    pub value_type: String,
}

/// A UI-facing reference to a component property (data) or output (action).
#[derive(Debug, Clone, Default)]
pub struct WidgetBindingDefinition {
    pub component: String,
    pub name: String,
}
