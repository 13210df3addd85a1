//! # flowpack - Flow Asset Emitter
//!
//! **flowpack** compiles flow programs (graphs of typed components joined by connection
//! lines) into a relocation-free binary blob that a flow VM can run straight from memory.
//! Along with the blob, every build produces a diagnostic map that ties indices and offsets
//! back to the objects they came from, plus C enumerations for host code.
//!
//! ## Core Workflow
//!
//! The emitter is format-agnostic. It works on a canonical project model, and the
//! workflow is:
//!
//! 1.  **Load Your Project**: Parse your project format (JSON, YAML, ...) into your own Rust structs.
//! 2.  **Convert**: Implement [`project::IntoProject`] to translate them into a [`project::ProjectDefinition`].
//! 3.  **Configure**: Create an emitter with `ProjectAssetsEmitter::builder`, optionally plugging in your own
//!     expression compiler, class-specific hooks or component classes.
//! 4.  **Build**: Run `build` with a diagnostic sink, or `build_artifacts` to collect everything in one value.
//!
//! Authoring errors (unknown classes, dangling connection lines, bad expressions) never
//! abort a build. They are reported and replaced by placeholders, so one build shows every
//! problem and still yields a well-formed blob.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowpack::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let project = ProjectDefinition {
//!         kind: ProjectKind::FirmwareWithFlow,
//!         flows: vec![FlowDefinition {
//!             id: "main".to_string(),
//!             name: "main".to_string(),
//!             components: vec![
//!                 ComponentDefinition {
//!                     id: "start".to_string(),
//!                     class_name: "Start".to_string(),
//!                     outputs: vec![OutputDefinition {
//!                         name: "@seqout".to_string(),
//!                         ..Default::default()
//!                     }],
//!                     ..Default::default()
//!                 },
//!                 ComponentDefinition {
//!                     id: "log".to_string(),
//!                     class_name: "Log".to_string(),
//!                     inputs: vec![InputDefinition {
//!                         name: "@seqin".to_string(),
//!                         is_sequence_input: true,
//!                         ..Default::default()
//!                     }],
//!                     properties: vec![PropertyDefinition {
//!                         name: "value".to_string(),
//!                         expression: "\"Hello\"".to_string(),
//!                         value_type: "string".to_string(),
//!                         ..Default::default()
//!                     }],
//!                     ..Default::default()
//!                 },
//!             ],
//!             connection_lines: vec![ConnectionLineDefinition {
//!                 source: "start".to_string(),
//!                 output: "@seqout".to_string(),
//!                 target: "log".to_string(),
//!                 input: "@seqin".to_string(),
//!             }],
//!             ..Default::default()
//!         }],
//!         ..Default::default()
//!     };
//!
//!     let emitter = ProjectAssetsEmitter::builder(BuildOptions::default()).build();
//!     let artifacts = emitter.build_artifacts(&project)?;
//!
//!     for diagnostic in &artifacts.diagnostics {
//!         println!("{}", diagnostic);
//!     }
//!     artifacts.write_blob("main.bin")?;
//!     Ok(())
//! }
//! ```

pub mod component_types;
pub mod diagnostics;
pub mod emit;
pub mod error;
pub mod expression;
pub mod prelude;
pub mod project;
pub mod registry;
pub mod value;
pub mod writer;
