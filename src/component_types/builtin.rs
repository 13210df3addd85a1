use super::ComponentClass;

/// Defines the built-in class table: emitting classes with their fixed type id and flow
/// properties, then the editor-only classes.
macro_rules! define_component_classes {
    ( $( ($name:expr, $type_id:expr, [ $( $property:expr ),* $(,)? ]) ),* $(,)? ; $( $editor_only:expr ),* $(,)? ) => {
        pub(super) fn builtin_classes() -> Vec<ComponentClass> {
            vec![
                $( ComponentClass::new($name, Some($type_id), &[ $( $property ),* ]), )*
                $( ComponentClass::non_emitting($editor_only), )*
            ]
        }
    };
}

define_component_classes! {
    // Actions
    ("Start", 1, []),
    ("End", 2, []),
    ("Input", 3, []),
    ("Output", 4, []),
    ("WatchVariable", 5, ["variable"]),
    ("EvalExpr", 6, ["expression"]),
    ("SetVariable", 7, ["variable", "value"]),
    ("Compare", 8, ["A", "B", "C"]),
    ("IsTrue", 9, ["value"]),
    ("Constant", 10, ["value"]),
    ("Log", 11, ["value"]),
    ("CallAction", 12, []),
    ("Delay", 13, ["milliseconds"]),
    ("Error", 14, ["message"]),
    ("CatchError", 15, []),
    ("Counter", 16, ["countValue"]),
    ("Loop", 17, ["variable", "from", "to", "step"]),
    ("Noop", 18, []),

    // Widgets
    ("Container", 100, ["visible"]),
    ("Text", 101, ["data", "visible"]),
    ("Button", 102, ["data", "enabled", "visible"]),

    ; // Editor-only classes

    "Comment",
}
