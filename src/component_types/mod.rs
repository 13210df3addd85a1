//! Component classes the emitter knows about, and the hooks that append class-specific data
//! to a component record.

use crate::error::HookError;
use crate::project::{ComponentDefinition, FlowDefinition, ProjectDefinition};
use crate::registry::AssetIndexRegistry;
use crate::writer::AssetWriter;
use ahash::AHashMap;
use itertools::Itertools;

mod builtin;
mod call_action;

pub use call_action::CallActionHook;

/// Static metadata of a component class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentClass {
    pub name: String,
    /// Fixed type id. Classes without one only exist in dashboard projects, where ids are
    /// handed out during the build.
    pub type_id: Option<u16>,
    /// Flow property names in declaration order, for the generated defs.
    pub properties: Vec<String>,
    /// Whether components of this class end up in the blob at all. Comments don't.
    pub emits: bool,
}

impl ComponentClass {
    pub fn new(name: &str, type_id: Option<u16>, properties: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            type_id,
            properties: properties.iter().map(|p| p.to_string()).collect(),
            emits: true,
        }
    }

    /// A class that only exists in the editor.
    pub fn non_emitting(name: &str) -> Self {
        Self {
            emits: false,
            ..Self::new(name, None, &[])
        }
    }
}

/// Lookup table of component classes, pre-filled with the built-in classes.
#[derive(Debug, Clone)]
pub struct ComponentClassTable {
    classes: AHashMap<String, ComponentClass>,
}

impl ComponentClassTable {
    pub fn new() -> Self {
        let mut table = Self {
            classes: AHashMap::new(),
        };
        for class in builtin::builtin_classes() {
            table.insert(class);
        }
        table
    }

    /// Adds a class, replacing a built-in one of the same name.
    pub fn insert(&mut self, class: ComponentClass) {
        self.classes.insert(class.name.clone(), class);
    }

    pub fn get(&self, name: &str) -> Option<&ComponentClass> {
        self.classes.get(name)
    }

    /// Whether components of `name` are emitted. Unknown classes are.
    pub fn emits(&self, name: &str) -> bool {
        self.get(name).is_none_or(|class| class.emits)
    }

    /// Classes with a fixed type id, ordered by id.
    pub fn fixed_classes(&self) -> Vec<&ComponentClass> {
        self.classes
            .values()
            .filter(|class| class.type_id.is_some())
            .sorted_by_key(|class| class.type_id)
            .collect()
    }
}

impl Default for ComponentClassTable {
    fn default() -> Self {
        Self::new()
    }
}

/// What a class-specific hook can see.
pub struct HookContext<'a> {
    pub registry: &'a mut AssetIndexRegistry,
    pub project: &'a ProjectDefinition,
    pub flow: &'a FlowDefinition,
    pub flow_index: usize,
    pub component: &'a ComponentDefinition,
    pub component_index: usize,
}

/// Appends the class-specific tail of a component record.
///
/// Runs once per component of `class_name`, right after the generic part of the record. If
/// it fails, whatever it wrote is discarded and the failure is reported against the
/// component.
pub trait ComponentSpecificWriter: Send + Sync {
    fn class_name(&self) -> &str;
    fn write(&self, ctx: &mut HookContext<'_>, writer: &mut AssetWriter) -> Result<(), HookError>;
}

/// The hooks every emitter starts with.
pub fn default_hooks() -> Vec<Box<dyn ComponentSpecificWriter>> {
    vec![Box::new(CallActionHook)]
}
