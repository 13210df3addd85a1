//! Index assignment for everything the VM addresses by number.
//!
//! A fresh [`AssetIndexRegistry`] backs exactly one build. Indices are handed out on first
//! request, starting at 0 per collection, and never change afterwards.

use crate::value::FlowValue;
use ahash::AHashMap;
use std::collections::BTreeMap;

mod types;

pub use types::{BASIC_TYPE_NAMES, TypeTable};

/// First type id handed to component classes that have no fixed id (dashboard projects only).
pub const FIRST_DASHBOARD_COMPONENT_TYPE: u16 = 1000;

/// Constant index of `undefined`, always present.
pub const UNDEFINED_CONSTANT_INDEX: usize = 0;
/// Constant index of `null`, always present.
pub const NULL_CONSTANT_INDEX: usize = 1;

/// An index namespace. Flow-scoped collections carry the index of their flow, so component
/// indices restart at 0 in every flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Flow,
    GlobalVariable,
    /// Components of a flow, keyed by component id.
    Component(usize),
    /// Inputs of all components of a flow, keyed by `"{component_id}/{input}"`.
    ComponentInput(usize),
    /// User properties and local variables of a flow, keyed by name.
    LocalVariable(usize),
    /// Flow properties of one component, keyed by property name.
    ComponentProperty { flow: usize, component: usize },
    /// Outputs of one component, keyed by output name.
    ComponentOutput { flow: usize, component: usize },
}

/// Key of a component input in `Collection::ComponentInput`.
pub fn component_input_key(component_id: &str, input: &str) -> String {
    format!("{}/{}", component_id, input)
}

#[derive(Debug)]
pub struct AssetIndexRegistry {
    indices: AHashMap<Collection, AHashMap<String, usize>>,
    constants: Vec<FlowValue>,
    constant_indices: AHashMap<FlowValue, usize>,
    types: TypeTable,
    dashboard: bool,
    dashboard_class_ids: AHashMap<String, u16>,
    dashboard_class_names: BTreeMap<u16, String>,
    /// `None` once every id up to `u16::MAX` is handed out.
    next_dashboard_class_id: Option<u16>,
}

impl AssetIndexRegistry {
    /// `dashboard` enables lazy type ids for classes without a fixed id.
    pub fn new(dashboard: bool) -> Self {
        let mut registry = Self {
            indices: AHashMap::new(),
            constants: Vec::new(),
            constant_indices: AHashMap::new(),
            types: TypeTable::new(),
            dashboard,
            dashboard_class_ids: AHashMap::new(),
            dashboard_class_names: BTreeMap::new(),
            next_dashboard_class_id: Some(FIRST_DASHBOARD_COMPONENT_TYPE),
        };
        registry.constant_index(FlowValue::Undefined);
        registry.constant_index(FlowValue::Null);
        registry
    }

    /// Returns the index of `key`, allocating the next one on first use.
    pub fn index_of(&mut self, collection: Collection, key: &str) -> usize {
        let map = self.indices.entry(collection).or_default();
        if let Some(&index) = map.get(key) {
            return index;
        }
        let index = map.len();
        map.insert(key.to_string(), index);
        index
    }

    /// Looks up an index without allocating one.
    pub fn find(&self, collection: Collection, key: &str) -> Option<usize> {
        self.indices.get(&collection)?.get(key).copied()
    }

    /// Number of indices handed out in `collection`.
    pub fn len(&self, collection: Collection) -> usize {
        self.indices.get(&collection).map_or(0, |map| map.len())
    }

    /// Keys of `collection` ordered by index.
    pub fn keys(&self, collection: Collection) -> Vec<&str> {
        let Some(map) = self.indices.get(&collection) else {
            return Vec::new();
        };
        let mut keys: Vec<(&str, usize)> = map.iter().map(|(k, &i)| (k.as_str(), i)).collect();
        keys.sort_by_key(|&(_, index)| index);
        keys.into_iter().map(|(key, _)| key).collect()
    }

    // --- Constants ---

    /// Index of `value` in the project-wide constants table. Equal values share one entry.
    pub fn constant_index(&mut self, value: FlowValue) -> usize {
        if let Some(&index) = self.constant_indices.get(&value) {
            return index;
        }
        let index = self.constants.len();
        self.constants.push(value.clone());
        self.constant_indices.insert(value, index);
        index
    }

    pub fn constants(&self) -> &[FlowValue] {
        &self.constants
    }

    // --- Value types ---

    /// Index of a declared type in the value-type table.
    pub fn type_index(&mut self, value_type: &str) -> usize {
        self.types.index_of(value_type)
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    // --- Component classes ---

    pub fn is_dashboard(&self) -> bool {
        self.dashboard
    }

    /// Type id for a class without a fixed id.
    ///
    /// Only dashboard projects allocate such ids; the same class name always gets the same id.
    /// Returns `None` outside dashboard mode and once the id space is exhausted.
    pub fn dashboard_component_type(&mut self, class_name: &str) -> Option<u16> {
        if !self.dashboard {
            return None;
        }
        if let Some(&id) = self.dashboard_class_ids.get(class_name) {
            return Some(id);
        }
        let id = self.next_dashboard_class_id?;
        self.next_dashboard_class_id = id.checked_add(1);
        self.dashboard_class_ids.insert(class_name.to_string(), id);
        self.dashboard_class_names.insert(id, class_name.to_string());
        Some(id)
    }

    /// Lazily allocated class ids, id -> class name.
    pub fn dashboard_component_types(&self) -> &BTreeMap<u16, String> {
        &self.dashboard_class_names
    }
}

impl Default for AssetIndexRegistry {
    fn default() -> Self {
        Self::new(false)
    }
}
