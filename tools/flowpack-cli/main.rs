use clap::{Parser, ValueEnum};
use flowpack::error::ProjectConversionError;
use flowpack::expression::disassemble;
use flowpack::prelude::*;
use serde::Deserialize;
use std::fs;
use std::result::Result;
use std::time::Instant;

// --- JSON Deserialization Structs (Input Format Specific) ---
// These structs match the `project.json` format and are only used here for conversion.

#[derive(Deserialize)]
struct RawProject {
    #[serde(default)]
    kind: Option<ProjectKind>,
    #[serde(default)]
    flows: Vec<RawFlow>,
    #[serde(default, alias = "globalVariables")]
    global_variables: Vec<RawVariable>,
    #[serde(default)]
    structures: Vec<RawStructure>,
}

#[derive(Deserialize)]
struct RawFlow {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    components: Vec<RawComponent>,
    #[serde(default, alias = "connectionLines")]
    connection_lines: Vec<RawConnectionLine>,
    #[serde(default, alias = "userProperties")]
    user_properties: Vec<RawVariable>,
    #[serde(default, alias = "localVariables")]
    local_variables: Vec<RawVariable>,
    #[serde(default, alias = "widgetDataItems")]
    widget_data_items: Vec<RawWidgetBinding>,
    #[serde(default, alias = "widgetActions")]
    widget_actions: Vec<RawWidgetBinding>,
}

#[derive(Deserialize)]
struct RawComponent {
    id: String,
    #[serde(alias = "type", alias = "className")]
    class_name: String,
    #[serde(default)]
    inputs: Vec<RawInput>,
    #[serde(default)]
    outputs: Vec<RawOutput>,
    #[serde(default)]
    properties: Vec<RawProperty>,
    #[serde(default)]
    settings: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct RawInput {
    name: String,
    #[serde(default, alias = "type")]
    value_type: String,
    #[serde(default, alias = "isSequenceInput")]
    is_sequence_input: bool,
    #[serde(default, alias = "isOptionalInput")]
    is_optional: bool,
}

#[derive(Deserialize)]
struct RawOutput {
    name: String,
    #[serde(default, alias = "type")]
    value_type: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    handler: Option<String>,
}

#[derive(Deserialize)]
struct RawProperty {
    name: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default, alias = "value")]
    expression: String,
    #[serde(default, alias = "type")]
    value_type: String,
    #[serde(default)]
    hidden: bool,
}

#[derive(Deserialize)]
struct RawConnectionLine {
    source: String,
    output: String,
    target: String,
    input: String,
}

#[derive(Deserialize)]
struct RawVariable {
    name: String,
    #[serde(default, alias = "type")]
    value_type: Option<String>,
    #[serde(default, alias = "defaultValue")]
    default_value: String,
    #[serde(default)]
    native: bool,
    #[serde(default)]
    assignable: bool,
}

#[derive(Deserialize)]
struct RawStructure {
    name: String,
    #[serde(default)]
    fields: Vec<RawField>,
    #[serde(default)]
    system: bool,
}

#[derive(Deserialize)]
struct RawField {
    name: String,
    #[serde(alias = "type")]
    value_type: String,
}

#[derive(Deserialize)]
struct RawWidgetBinding {
    component: String,
    name: String,
}

/// CLI-specific project kind for clap to parse.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindCli {
    Dashboard,
    Applet,
    FirmwareWithFlow,
    Firmware,
}

impl From<KindCli> for ProjectKind {
    fn from(kind: KindCli) -> Self {
        match kind {
            KindCli::Dashboard => ProjectKind::Dashboard,
            KindCli::Applet => ProjectKind::Applet,
            KindCli::FirmwareWithFlow => ProjectKind::FirmwareWithFlow,
            KindCli::Firmware => ProjectKind::Firmware,
        }
    }
}

// --- Converter Implementation ---
// This implements the conversion from the raw JSON model to the canonical ProjectDefinition.

impl IntoProject for RawProject {
    fn into_project(self) -> Result<ProjectDefinition, ProjectConversionError> {
        let flows = self
            .flows
            .into_iter()
            .map(RawFlow::into_flow)
            .collect::<Result<Vec<_>, _>>()?;

        let structures = self
            .structures
            .into_iter()
            .map(|raw| StructureDefinition {
                name: raw.name,
                fields: raw
                    .fields
                    .into_iter()
                    .map(|f| FieldDefinition {
                        name: f.name,
                        value_type: f.value_type,
                    })
                    .collect(),
                system: raw.system,
            })
            .collect();

        Ok(ProjectDefinition {
            kind: self.kind.unwrap_or_default(),
            flows,
            global_variables: self.global_variables.into_iter().map(RawVariable::into_variable).collect(),
            structures,
        })
    }
}

impl RawFlow {
    fn into_flow(self) -> Result<FlowDefinition, ProjectConversionError> {
        let components = self
            .components
            .into_iter()
            .map(RawComponent::into_component)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FlowDefinition {
            name: self.name.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            components,
            connection_lines: self
                .connection_lines
                .into_iter()
                .map(|line| ConnectionLineDefinition {
                    source: line.source,
                    output: line.output,
                    target: line.target,
                    input: line.input,
                })
                .collect(),
            user_properties: self.user_properties.into_iter().map(RawVariable::into_variable).collect(),
            local_variables: self.local_variables.into_iter().map(RawVariable::into_variable).collect(),
            widget_data_items: self.widget_data_items.into_iter().map(RawWidgetBinding::into_binding).collect(),
            widget_actions: self.widget_actions.into_iter().map(RawWidgetBinding::into_binding).collect(),
        })
    }
}

impl RawComponent {
    fn into_component(self) -> Result<ComponentDefinition, ProjectConversionError> {
        let properties = self
            .properties
            .into_iter()
            .map(|p| {
                let kind = match p.kind.as_deref() {
                    None | Some("input") | Some("expression") => PropertyKind::Input,
                    Some("template-literal") => PropertyKind::TemplateLiteral,
                    Some("assignable") => PropertyKind::Assignable,
                    Some("static") => PropertyKind::Static,
                    Some(other) => {
                        return Err(ProjectConversionError::ValidationError(format!(
                            "Property '{}' of component '{}' has unknown kind '{}'",
                            p.name, self.id, other
                        )));
                    }
                };
                Ok(PropertyDefinition {
                    name: p.name,
                    kind,
                    expression: p.expression,
                    value_type: p.value_type,
                    hidden: p.hidden,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let outputs = self
            .outputs
            .into_iter()
            .map(|o| {
                let kind = match o.kind.as_deref() {
                    None | Some("output") => OutputKind::Output,
                    Some("property") => OutputKind::Property,
                    Some(other) => {
                        return Err(ProjectConversionError::ValidationError(format!(
                            "Output '{}' of component '{}' has unknown kind '{}'",
                            o.name, self.id, other
                        )));
                    }
                };
                Ok(OutputDefinition {
                    name: o.name,
                    value_type: o.value_type,
                    kind,
                    handler: o.handler,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ComponentDefinition {
            id: self.id,
            class_name: self.class_name,
            inputs: self
                .inputs
                .into_iter()
                .map(|i| InputDefinition {
                    name: i.name,
                    value_type: i.value_type,
                    is_sequence_input: i.is_sequence_input,
                    is_optional: i.is_optional,
                })
                .collect(),
            outputs,
            properties,
            settings: self.settings,
        })
    }
}

impl RawVariable {
    fn into_variable(self) -> VariableDefinition {
        VariableDefinition {
            name: self.name,
            value_type: self.value_type,
            default_value: self.default_value,
            native: self.native,
            assignable: self.assignable,
        }
    }
}

impl RawWidgetBinding {
    fn into_binding(self) -> WidgetBindingDefinition {
        WidgetBindingDefinition {
            component: self.component,
            name: self.name,
        }
    }
}

/// Compiles a flow project into a binary asset blob
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the project JSON file
    project_path: String,

    /// Output path prefix; writes <prefix>.bin, <prefix>.map.json and <prefix>.h
    #[arg(short, long, default_value = "out")]
    output: String,

    /// Optional build options JSON file; flags below override it
    #[arg(long)]
    options: Option<String>,

    /// Overrides the project kind
    #[arg(short, long, value_enum)]
    kind: Option<KindCli>,

    /// Leave native global variables out of the blob
    #[arg(long)]
    asset_bundle: bool,

    /// Component ids to set the breakpoint flag on
    #[arg(short, long = "breakpoint")]
    breakpoints: Vec<String>,

    /// Also save all artifacts to <prefix>.artifacts
    #[arg(long)]
    artifacts: bool,

    /// Print the instruction stream of every property
    #[arg(short, long)]
    disassemble: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let total_start = Instant::now();

    // --- 1. Options ---
    let mut options = match &cli.options {
        Some(path) => BuildOptions::from_file(path).unwrap_or_else(|e| exit_with_error(&e.to_string())),
        None => BuildOptions::default(),
    };
    if let Some(kind) = cli.kind {
        options = options.with_kind(kind.into());
    }
    if cli.asset_bundle {
        options = options.with_asset_bundle(true);
    }
    for breakpoint in &cli.breakpoints {
        options = options.with_breakpoint(breakpoint);
    }

    // --- 2. Loading and Conversion ---
    let project_json = fs::read_to_string(&cli.project_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read project file '{}': {}",
            &cli.project_path, e
        ))
    });
    let raw_project: RawProject = serde_json::from_str(&project_json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse project JSON: {}", e)));
    let project = raw_project
        .into_project()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to convert project: {}", e)));

    // --- 3. Build ---
    println!("Building '{}'...", cli.project_path);
    let build_start = Instant::now();
    let emitter = ProjectAssetsEmitter::builder(options).build();
    let artifacts = emitter
        .build_artifacts(&project)
        .unwrap_or_else(|e| exit_with_error(&format!("Build failed: {}", e)));
    let build_duration = build_start.elapsed();

    for diagnostic in &artifacts.diagnostics {
        println!("  {}", diagnostic);
    }

    // --- 4. Outputs ---
    let blob_path = format!("{}.bin", cli.output);
    artifacts
        .write_blob(&blob_path)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));

    let map_path = format!("{}.map.json", cli.output);
    let map_json = serde_json::to_string_pretty(&artifacts.map)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize map: {}", e)));
    fs::write(&map_path, map_json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to write '{}': {}", map_path, e)));

    let defs_path = format!("{}.h", cli.output);
    fs::write(&defs_path, &artifacts.defs)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to write '{}': {}", defs_path, e)));

    if cli.artifacts {
        let artifacts_path = format!("{}.artifacts", cli.output);
        artifacts
            .save(&artifacts_path)
            .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    }

    // --- 5. Disassembly ---
    if cli.disassemble {
        for flow in &artifacts.map.flows {
            for component in &flow.components {
                for property in &component.properties {
                    println!("\n--- {}/properties/{} ---", component.path, property.name);
                    print!(
                        "{}",
                        disassemble(&artifacts.blob, property.offset, &artifacts.map.constants)
                    );
                }
            }
        }
    }

    // --- 6. Summary ---
    let errors = artifacts.diagnostics.iter().filter(|d| d.is_error()).count();
    println!("\n--- Build Summary ---");
    println!("Flows:        {}", artifacts.map.flows.len());
    println!("Constants:    {}", artifacts.map.constants.len());
    println!("Blob size:    {} bytes", artifacts.blob.len());
    println!("Errors:       {}", errors);
    println!("Build time:   {:?}", build_duration);
    println!("Total time:   {:?}", total_start.elapsed());

    if errors > 0 {
        std::process::exit(1);
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
