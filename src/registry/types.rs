use crate::value::ValueType;
use ahash::AHashMap;

/// Types every value-type table starts with, in index order.
pub const BASIC_TYPE_NAMES: [&str; 14] = [
    "undefined", "null", "boolean", "integer", "float", "double", "string", "date", "blob",
    "stream", "widget", "json", "event", "any",
];

/// Project-wide table of value types. Struct, array and enum types are appended the first
/// time something refers to them.
#[derive(Debug, Clone)]
pub struct TypeTable {
    names: Vec<String>,
    indices: AHashMap<String, usize>,
}

impl TypeTable {
    pub fn new() -> Self {
        let mut table = Self {
            names: Vec::with_capacity(BASIC_TYPE_NAMES.len()),
            indices: AHashMap::new(),
        };
        for name in BASIC_TYPE_NAMES {
            table.index_of(name);
        }
        table
    }

    pub fn index_of(&mut self, value_type: &str) -> usize {
        let name = canonical_name(value_type);
        if let Some(&index) = self.indices.get(&name) {
            return index;
        }
        let index = self.names.len();
        self.names.push(name.clone());
        self.indices.insert(name, index);
        index
    }

    pub fn find(&self, value_type: &str) -> Option<usize> {
        self.indices.get(&canonical_name(value_type)).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

// "int32" and "integer" are the same type; an empty type is "any".
fn canonical_name(value_type: &str) -> String {
    let trimmed = value_type.trim();
    if trimmed.is_empty() {
        return "any".to_string();
    }
    match ValueType::parse(trimmed) {
        Some(parsed) => parsed.to_string(),
        None => trimmed.to_string(),
    }
}
