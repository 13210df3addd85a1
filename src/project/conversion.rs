use super::definition::ProjectDefinition;
use crate::error::ProjectConversionError;

/// A trait for custom project formats that can be converted into a `ProjectDefinition`.
///
/// The emitter never reads files itself. Implement this trait on the structs your project
/// format deserializes into to provide the translation layer.
///
/// # Example
///
/// ```rust,no_run
/// use flowpack::prelude::*;
/// use flowpack::error::ProjectConversionError;
///
/// struct MyNode { id: String, kind: String }
/// struct MyProject { nodes: Vec<MyNode> }
///
/// impl IntoProject for MyProject {
///     fn into_project(self) -> std::result::Result<ProjectDefinition, ProjectConversionError> {
///         let components = self
///             .nodes
///             .into_iter()
///             .map(|node| ComponentDefinition {
///                 id: node.id,
///                 class_name: node.kind,
///                 ..Default::default()
///             })
///             .collect();
///
///         Ok(ProjectDefinition {
///             flows: vec![FlowDefinition {
///                 id: "main".to_string(),
///                 name: "main".to_string(),
///                 components,
///                 ..Default::default()
///             }],
///             ..Default::default()
///         })
///     }
/// }
/// ```
pub trait IntoProject {
    /// Consumes the object and converts it into an emitter-ready project.
    fn into_project(self) -> Result<ProjectDefinition, ProjectConversionError>;
}

impl IntoProject for ProjectDefinition {
    fn into_project(self) -> Result<ProjectDefinition, ProjectConversionError> {
        Ok(self)
    }
}
