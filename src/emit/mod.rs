//! The asset emitter: walks a project and writes the blob, the diagnostic map and the defs.
//!
//! A build runs in two passes. The first assigns every index (flows, components, inputs,
//! properties, outputs, variables), the second writes records in index order and resolves
//! references through the indices from the first pass.
//!
//! Blob layout of a flow-capable project:
//!
//! ```text
//! u32 -> flows array
//! u32 -> constants table
//! globals table
//! ```
//!
//! Other project kinds write a single `u32 0`.

use ahash::AHashMap;
use log::{debug, info};

use crate::component_types::{
    ComponentClass, ComponentClassTable, ComponentSpecificWriter, default_hooks,
};
use crate::diagnostics::{CollectingSink, DiagnosticSink, Section, Severity};
use crate::error::BuildError;
use crate::expression::{ExpressionCompiler, StandardExpressionCompiler};
use crate::project::{BuildArtifacts, BuildOptions, ProjectDefinition, VariableDefinition};
use crate::registry::{AssetIndexRegistry, BASIC_TYPE_NAMES};
use crate::value::{FlowValue, ValueType, default_value_for_type, value_from_literal, write_value_table};
use crate::writer::AssetWriter;

mod component;
pub mod defs;
mod flow;
mod layout;
pub mod map;

use map::{AssetMap, VariableMap};

/// Names of outputs with a fixed meaning.
pub const SEQOUT_OUTPUT_NAME: &str = "@seqout";
pub const ERROR_OUTPUT_NAME: &str = "@error";

/// What `ProjectAssetsEmitter::build` produces.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub blob: Vec<u8>,
    pub map: AssetMap,
    pub defs: String,
}

/// Compiles projects into blobs.
///
/// The emitter itself holds only configuration and can run any number of builds; every
/// build gets its own registry and writer.
pub struct ProjectAssetsEmitter {
    options: BuildOptions,
    expression_compiler: Box<dyn ExpressionCompiler>,
    hooks: AHashMap<String, Box<dyn ComponentSpecificWriter>>,
    classes: ComponentClassTable,
}

pub struct ProjectAssetsEmitterBuilder {
    options: BuildOptions,
    expression_compiler: Box<dyn ExpressionCompiler>,
    hooks: AHashMap<String, Box<dyn ComponentSpecificWriter>>,
    classes: ComponentClassTable,
}

impl ProjectAssetsEmitterBuilder {
    pub fn new(options: BuildOptions) -> Self {
        let mut hooks: AHashMap<String, Box<dyn ComponentSpecificWriter>> = AHashMap::new();
        for hook in default_hooks() {
            hooks.insert(hook.class_name().to_string(), hook);
        }
        Self {
            options,
            expression_compiler: Box::new(StandardExpressionCompiler),
            hooks,
            classes: ComponentClassTable::new(),
        }
    }

    pub fn with_expression_compiler(mut self, compiler: Box<dyn ExpressionCompiler>) -> Self {
        self.expression_compiler = compiler;
        self
    }

    /// Registers a class-specific hook, replacing any hook for the same class.
    pub fn with_component_hook(mut self, hook: Box<dyn ComponentSpecificWriter>) -> Self {
        self.hooks.insert(hook.class_name().to_string(), hook);
        self
    }

    pub fn with_component_class(mut self, class: ComponentClass) -> Self {
        self.classes.insert(class);
        self
    }

    pub fn build(self) -> ProjectAssetsEmitter {
        ProjectAssetsEmitter {
            options: self.options,
            expression_compiler: self.expression_compiler,
            hooks: self.hooks,
            classes: self.classes,
        }
    }
}

impl ProjectAssetsEmitter {
    pub fn builder(options: BuildOptions) -> ProjectAssetsEmitterBuilder {
        ProjectAssetsEmitterBuilder::new(options)
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Builds `project`, reporting authoring problems to `sink`.
    ///
    /// Only writer misuse and duplicate flow ids fail the build; everything else is
    /// reported and replaced by a placeholder.
    pub fn build(
        &self,
        project: &ProjectDefinition,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<BuildOutput, BuildError> {
        let kind = self.options.kind.unwrap_or(project.kind);
        info!(
            "Building {:?} project: {} flow(s), {} global variable(s)",
            kind,
            project.flows.len(),
            project.global_variables.len()
        );

        let mut ctx = BuildContext {
            emitter: self,
            project,
            registry: AssetIndexRegistry::new(kind.is_dashboard()),
            sink,
            asset_bundle: self.options.asset_bundle,
            errors: 0,
        };
        ctx.register_types();
        let layout = ctx.assign_indexes()?;

        let mut writer = AssetWriter::new();
        let mut map = AssetMap::default();

        if kind.has_flow_support() {
            map.flows = writer.write_object_offset(4, |w| ctx.write_flows(w, &layout.flows))?;
            writer.write_future_array(|w| write_value_table(w, ctx.registry.constants()))?;

            let mut values = Vec::with_capacity(layout.globals.len());
            for (index, variable) in layout.globals.iter().enumerate() {
                let path = format!("globalVariables/{}", variable.name);
                let value = ctx.resolve_variable(variable, &path);
                map.global_variables.push(variable_map(variable, index, &value));
                values.push(value);
            }
            write_value_table(&mut writer, &values)?;
        } else {
            debug!("{:?} projects carry no flow data", kind);
            writer.write_u32(0);
        }

        let blob = writer.finish()?;
        let defs = defs::generate_defs(
            &self.classes,
            &self.expression_compiler.operations(),
            &project.structures,
            &ctx.registry,
        );

        map.constants = ctx.registry.constants().iter().map(|c| c.to_string()).collect();
        map.types = ctx.registry.types().names().to_vec();
        map.dashboard_component_types = ctx.registry.dashboard_component_types().clone();

        info!(
            "Build finished: {} bytes, {} constant(s), {} error(s)",
            blob.len(),
            map.constants.len(),
            ctx.errors
        );
        Ok(BuildOutput { blob, map, defs })
    }

    /// Builds `project` and bundles the results with every reported diagnostic.
    pub fn build_artifacts(&self, project: &ProjectDefinition) -> Result<BuildArtifacts, BuildError> {
        let mut sink = CollectingSink::new();
        let output = self.build(project, &mut sink)?;
        Ok(BuildArtifacts {
            blob: output.blob,
            map: output.map,
            defs: output.defs,
            diagnostics: sink.into_entries(),
        })
    }
}

impl Default for ProjectAssetsEmitter {
    fn default() -> Self {
        Self::builder(BuildOptions::default()).build()
    }
}

/// State of one build.
struct BuildContext<'e, 'p> {
    emitter: &'e ProjectAssetsEmitter,
    project: &'p ProjectDefinition,
    registry: AssetIndexRegistry,
    sink: &'e mut dyn DiagnosticSink,
    asset_bundle: bool,
    errors: usize,
}

impl BuildContext<'_, '_> {
    fn report(&mut self, section: Section, severity: Severity, message: &str, object: &str) {
        if severity == Severity::Error {
            self.errors += 1;
        }
        self.sink.write(section, severity, message, object);
    }

    // Structure and array types get their indices before anything else, so the defs do
    // not depend on which types the flows happen to use.
    fn register_types(&mut self) {
        let project = self.project;
        for structure in project.structures.iter().filter(|s| s.system) {
            self.registry.type_index(&format!("struct:{}", structure.name));
        }
        for structure in project.structures.iter().filter(|s| !s.system) {
            self.registry.type_index(&format!("struct:{}", structure.name));
        }
        for name in array_element_types() {
            self.registry.type_index(&format!("array:{}", name));
        }
    }

    /// The initial value of a variable.
    ///
    /// A missing type is reported and yields `undefined`; a default that is not a valid
    /// constant of the type is reported and yields `null`.
    fn resolve_variable(&mut self, variable: &VariableDefinition, path: &str) -> FlowValue {
        let declared = variable.value_type.as_deref().map(str::trim).unwrap_or("");
        if declared.is_empty() {
            self.report(Section::Checks, Severity::Error, "Variable type not set", path);
            return FlowValue::Undefined;
        }
        let Some(value_type) = ValueType::parse(declared) else {
            self.report(
                Section::Checks,
                Severity::Error,
                &format!("Unknown variable type '{}'", declared),
                path,
            );
            return FlowValue::Undefined;
        };
        self.registry.type_index(declared);

        if variable.default_value.trim().is_empty() {
            return default_value_for_type(&value_type);
        }

        let value = self
            .emitter
            .expression_compiler
            .evaluate_constant(&variable.default_value)
            .map_err(|e| e.to_string())
            .and_then(|literal| {
                value_from_literal(&value_type, &literal, &self.project.structures)
                    .map_err(|e| e.to_string())
            });
        match value {
            Ok(value) => value,
            Err(message) => {
                self.report(
                    Section::Checks,
                    Severity::Error,
                    &format!("Invalid default value: {}", message),
                    path,
                );
                FlowValue::Null
            }
        }
    }
}

fn array_element_types() -> impl Iterator<Item = &'static str> {
    BASIC_TYPE_NAMES
        .into_iter()
        .filter(|name| !matches!(*name, "undefined" | "null"))
}

fn variable_map(variable: &VariableDefinition, index: usize, value: &FlowValue) -> VariableMap {
    VariableMap {
        name: variable.name.clone(),
        index,
        value_type: variable.value_type.clone().unwrap_or_default(),
        value: value.to_string(),
    }
}
