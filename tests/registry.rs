use flowpack::registry::{
    AssetIndexRegistry, BASIC_TYPE_NAMES, Collection, FIRST_DASHBOARD_COMPONENT_TYPE,
    NULL_CONSTANT_INDEX, UNDEFINED_CONSTANT_INDEX,
};
use flowpack::value::FlowValue;

#[test]
fn test_indices_are_stable_and_dense() {
    let mut registry = AssetIndexRegistry::new(false);
    let a = registry.index_of(Collection::Component(0), "a");
    let b = registry.index_of(Collection::Component(0), "b");
    assert_eq!((a, b), (0, 1));

    for _ in 0..3 {
        assert_eq!(registry.index_of(Collection::Component(0), "a"), 0);
        assert_eq!(registry.index_of(Collection::Component(0), "b"), 1);
    }
    assert_eq!(registry.len(Collection::Component(0)), 2);
    assert_eq!(registry.keys(Collection::Component(0)), vec!["a", "b"]);
}

#[test]
fn test_collections_are_independent() {
    let mut registry = AssetIndexRegistry::new(false);
    registry.index_of(Collection::Flow, "main");
    registry.index_of(Collection::Flow, "other");

    assert_eq!(registry.index_of(Collection::Component(0), "x"), 0);
    assert_eq!(registry.index_of(Collection::Component(1), "y"), 0);
    assert_eq!(registry.index_of(Collection::GlobalVariable, "main"), 0);
    assert_eq!(registry.find(Collection::Component(0), "y"), None);
    assert_eq!(registry.find(Collection::Flow, "other"), Some(1));
}

#[test]
fn test_constants_are_seeded_and_deduplicated() {
    let mut registry = AssetIndexRegistry::default();
    assert_eq!(registry.constants(), &[FlowValue::Undefined, FlowValue::Null]);
    assert_eq!(registry.constant_index(FlowValue::Undefined), UNDEFINED_CONSTANT_INDEX);
    assert_eq!(registry.constant_index(FlowValue::Null), NULL_CONSTANT_INDEX);

    let first = registry.constant_index(FlowValue::Double(42.5));
    let second = registry.constant_index(FlowValue::Double(42.5));
    assert_eq!(first, 2);
    assert_eq!(second, 2);

    // Same number, different type: a separate constant.
    assert_eq!(registry.constant_index(FlowValue::Int32(42)), 3);
    assert_eq!(registry.constants().len(), 4);
}

#[test]
fn test_dashboard_component_types_are_idempotent() {
    let mut registry = AssetIndexRegistry::new(true);
    let first = registry.dashboard_component_type("MyWidget");
    let again = registry.dashboard_component_type("MyWidget");
    let other = registry.dashboard_component_type("OtherWidget");

    assert_eq!(first, Some(FIRST_DASHBOARD_COMPONENT_TYPE));
    assert_eq!(again, first);
    assert_eq!(other, Some(FIRST_DASHBOARD_COMPONENT_TYPE + 1));
    assert_eq!(
        registry.dashboard_component_types().get(&FIRST_DASHBOARD_COMPONENT_TYPE),
        Some(&"MyWidget".to_string())
    );
}

#[test]
fn test_dashboard_ids_run_up_to_the_last_u16() {
    let mut registry = AssetIndexRegistry::new(true);
    let mut last = None;
    for id in FIRST_DASHBOARD_COMPONENT_TYPE..=u16::MAX {
        last = registry.dashboard_component_type(&format!("Widget{}", id));
        assert_eq!(last, Some(id));
    }
    assert_eq!(last, Some(u16::MAX));

    // The id space is used up, but known classes keep their ids.
    assert_eq!(registry.dashboard_component_type("OneTooMany"), None);
    assert_eq!(
        registry.dashboard_component_type(&format!("Widget{}", u16::MAX)),
        Some(u16::MAX)
    );
    assert_eq!(registry.dashboard_component_type("OneTooMany"), None);
}

#[test]
fn test_no_dashboard_types_outside_dashboard_mode() {
    let mut registry = AssetIndexRegistry::new(false);
    assert!(!registry.is_dashboard());
    assert_eq!(registry.dashboard_component_type("MyWidget"), None);
    assert!(registry.dashboard_component_types().is_empty());
}

#[test]
fn test_type_table() {
    let mut registry = AssetIndexRegistry::default();
    assert_eq!(registry.types().names().len(), BASIC_TYPE_NAMES.len());
    assert_eq!(registry.type_index("undefined"), 0);
    assert_eq!(registry.type_index("integer"), 3);
    assert_eq!(registry.type_index("int32"), 3);
    assert_eq!(registry.type_index(""), registry.type_index("any"));

    let point = registry.type_index("struct:Point");
    assert_eq!(point, BASIC_TYPE_NAMES.len());
    assert_eq!(registry.type_index("struct:Point"), point);
    assert_eq!(registry.type_index("array:int32"), point + 1);
    assert_eq!(registry.types().find("array:integer"), Some(point + 1));
}
