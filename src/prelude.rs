//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the flowpack crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use flowpack::prelude::*;
//!
//! # fn run_example(project: ProjectDefinition) -> Result<()> {
//! let options = BuildOptions::from_file("path/to/options.json")?;
//! let emitter = ProjectAssetsEmitter::builder(options).build();
//!
//! let mut sink = CollectingSink::new();
//! let output = emitter.build(&project, &mut sink)?;
//! println!("{} bytes, {} error(s)", output.blob.len(), sink.error_count());
//! # Ok(())
//! # }
//! ```

// Emitter
pub use crate::emit::map::AssetMap;
pub use crate::emit::{BuildOutput, ProjectAssetsEmitter};

// Project model and configuration
pub use crate::project::{
    BuildArtifacts, BuildOptions, ComponentDefinition, ConnectionLineDefinition, FieldDefinition,
    FlowDefinition, InputDefinition, IntoProject, OutputDefinition, OutputKind, ProjectDefinition,
    ProjectKind, PropertyDefinition, PropertyKind, StructureDefinition, VariableDefinition,
    WidgetBindingDefinition,
};

// Extension points
pub use crate::component_types::{ComponentClass, ComponentSpecificWriter, HookContext};
pub use crate::diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, Section, Severity};
pub use crate::expression::{ExpressionCompiler, ExpressionContext, StandardExpressionCompiler};

// Values
pub use crate::value::{FlowValue, ValueType};

// Error types
pub use crate::error::{BuildError, ExpressionError, HookError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
