//! C enumerations for host code: component types, per-class properties, operations, system
//! structures and array types.

use itertools::Itertools;

use crate::component_types::ComponentClassTable;
use crate::project::StructureDefinition;
use crate::registry::{AssetIndexRegistry, FIRST_DASHBOARD_COMPONENT_TYPE};

const TAB: &str = "    ";

/// Renders all enumerations. Entries are ordered by value, so the output only changes when
/// an id does.
pub fn generate_defs(
    classes: &ComponentClassTable,
    operations: &[(String, u16)],
    structures: &[StructureDefinition],
    registry: &AssetIndexRegistry,
) -> String {
    let mut defs = String::new();

    let fixed = classes.fixed_classes();
    let mut component_types = vec![("COMPONENT_TYPE_NONE".to_string(), 0usize)];
    component_types.extend(fixed.iter().filter_map(|class| {
        let id = class.type_id?;
        Some((format!("COMPONENT_TYPE_{}", upper_snake(&class.name)), usize::from(id)))
    }));
    component_types.push((
        "FIRST_DASHBOARD_COMPONENT_TYPE".to_string(),
        usize::from(FIRST_DASHBOARD_COMPONENT_TYPE),
    ));
    defs.push_str(&build_enum("ComponentTypes", &component_types));

    for class in &fixed {
        if class.properties.is_empty() {
            continue;
        }
        let class_name = upper_snake(&class.name);
        let members = class
            .properties
            .iter()
            .enumerate()
            .map(|(i, property)| (format!("{}_PROPERTY_{}", class_name, upper_snake(property)), i))
            .collect::<Vec<_>>();
        defs.push_str(&build_enum(&format!("Component_{}_Properties", class_name), &members));
    }

    let operation_members = operations
        .iter()
        .sorted_by_key(|(_, index)| *index)
        .map(|(name, index)| (format!("OPERATION_TYPE_{}", upper_snake(name)), usize::from(*index)))
        .collect::<Vec<_>>();
    defs.push_str(&build_enum("OperationTypes", &operation_members));

    let system_structures = structures
        .iter()
        .filter(|structure| structure.system)
        .filter_map(|structure| {
            let index = registry.types().find(&format!("struct:{}", structure.name))?;
            Some((structure, index))
        })
        .sorted_by_key(|(_, index)| *index)
        .collect::<Vec<_>>();
    let structure_members = system_structures
        .iter()
        .map(|(structure, index)| (format!("SYSTEM_STRUCTURE_{}", upper_snake(&structure.name)), *index))
        .collect::<Vec<_>>();
    defs.push_str(&build_enum("SystemStructures", &structure_members));

    for (structure, _) in &system_structures {
        let name = upper_snake(&structure.name);
        let field_names = structure.sorted_field_names();
        let mut members = field_names
            .iter()
            .enumerate()
            .map(|(i, field)| (format!("{}_SYSTEM_STRUCTURE_FIELD_{}", name, upper_snake(field)), i))
            .collect::<Vec<_>>();
        members.push((format!("{}_SYSTEM_STRUCTURE_NUM_FIELDS", name), field_names.len()));
        defs.push_str(&build_enum(&format!("{}_SystemStructureFields", name), &members));
    }

    let array_members = registry
        .types()
        .names()
        .iter()
        .enumerate()
        .filter_map(|(index, name)| {
            let element = name.strip_prefix("array:")?;
            // Arrays of structs and enums are project-specific.
            (!element.contains(':')).then(|| (format!("ARRAY_TYPE_{}", upper_snake(element)), index))
        })
        .collect::<Vec<_>>();
    defs.push_str(&build_enum("ArrayTypes", &array_members));

    defs
}

fn build_enum(name: &str, members: &[(String, usize)]) -> String {
    let body = members
        .iter()
        .map(|(member, value)| format!("{}{} = {}", TAB, member, value))
        .join(",\n");
    if body.is_empty() {
        format!("enum {} {{\n}};\n\n", name)
    } else {
        format!("enum {} {{\n{}\n}};\n\n", name, body)
    }
}

/// `WatchVariable` -> `WATCH_VARIABLE`, `Flow.makeArrayValue` -> `FLOW_MAKE_ARRAY_VALUE`.
pub fn upper_snake(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 4);
    let mut previous: Option<char> = None;
    for c in name.chars() {
        if !c.is_alphanumeric() {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
            previous = None;
            continue;
        }
        if c.is_uppercase()
            && previous.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit())
            && !result.ends_with('_')
        {
            result.push('_');
        }
        result.extend(c.to_uppercase());
        previous = Some(c);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upper_snake() {
        assert_eq!(upper_snake("WatchVariable"), "WATCH_VARIABLE");
        assert_eq!(upper_snake("Flow.makeArrayValue"), "FLOW_MAKE_ARRAY_VALUE");
        assert_eq!(upper_snake("JSON.get"), "JSON_GET");
        assert_eq!(upper_snake("greater_or_equal"), "GREATER_OR_EQUAL");
        assert_eq!(upper_snake("Math.log10"), "MATH_LOG10");
        assert_eq!(upper_snake("A"), "A");
    }

    #[test]
    fn test_build_enum() {
        let members = vec![("A".to_string(), 0), ("B".to_string(), 5)];
        assert_eq!(build_enum("Letters", &members), "enum Letters {\n    A = 0,\n    B = 5\n};\n\n");
    }
}
