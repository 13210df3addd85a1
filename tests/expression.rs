use flowpack::error::ExpressionError;
use flowpack::expression::{
    END_INSTRUCTION, ExpressionCompiler, ExpressionContext, Instruction, MAX_INSTRUCTION_PARAM,
    StandardExpressionCompiler, decode_stream, disassemble,
};
use flowpack::project::{
    ComponentDefinition, FieldDefinition, FlowDefinition, InputDefinition, OutputDefinition,
    ProjectDefinition, PropertyKind, StructureDefinition, VariableDefinition,
};
use flowpack::registry::{AssetIndexRegistry, Collection, component_input_key};
use flowpack::writer::AssetWriter;
use serde_json::json;

use Instruction::*;

fn typed_variable(name: &str, value_type: &str) -> VariableDefinition {
    VariableDefinition {
        name: name.to_string(),
        value_type: Some(value_type.to_string()),
        ..Default::default()
    }
}

/// One flow with a `Log` component `B` (input `in`, output `out`), a local `counter` and
/// globals `pos: struct:Point` and `total: integer`.
fn fixture() -> ProjectDefinition {
    let component = ComponentDefinition {
        id: "B".to_string(),
        class_name: "Log".to_string(),
        inputs: vec![InputDefinition {
            name: "in".to_string(),
            ..Default::default()
        }],
        outputs: vec![OutputDefinition {
            name: "out".to_string(),
            value_type: "integer".to_string(),
            ..Default::default()
        }],
        ..Default::default()
    };
    let flow = FlowDefinition {
        id: "main".to_string(),
        name: "main".to_string(),
        components: vec![component],
        local_variables: vec![typed_variable("counter", "integer")],
        ..Default::default()
    };
    ProjectDefinition {
        flows: vec![flow],
        global_variables: vec![
            typed_variable("pos", "struct:Point"),
            typed_variable("total", "integer"),
        ],
        structures: vec![StructureDefinition {
            name: "Point".to_string(),
            fields: vec![
                FieldDefinition {
                    name: "y".to_string(),
                    value_type: "integer".to_string(),
                },
                FieldDefinition {
                    name: "x".to_string(),
                    value_type: "integer".to_string(),
                },
            ],
            system: false,
        }],
        ..Default::default()
    }
}

/// A registry with the fixture's indices assigned the way the emitter's pre-pass does.
fn registry_for(project: &ProjectDefinition) -> AssetIndexRegistry {
    let mut registry = AssetIndexRegistry::default();
    let flow = &project.flows[0];
    for component in &flow.components {
        for input in &component.inputs {
            registry.index_of(
                Collection::ComponentInput(0),
                &component_input_key(&component.id, &input.name),
            );
        }
        for output in &component.outputs {
            registry.index_of(
                Collection::ComponentOutput {
                    flow: 0,
                    component: 0,
                },
                &output.name,
            );
        }
    }
    for variable in &flow.local_variables {
        registry.index_of(Collection::LocalVariable(0), &variable.name);
    }
    for variable in &project.global_variables {
        registry.index_of(Collection::GlobalVariable, &variable.name);
    }
    registry
}

fn compile_with(
    project: &ProjectDefinition,
    registry: &mut AssetIndexRegistry,
    expression: &str,
    kind: PropertyKind,
) -> Result<Vec<Instruction>, ExpressionError> {
    let flow = &project.flows[0];
    let mut ctx = ExpressionContext {
        registry,
        project,
        flow,
        flow_index: 0,
        component: &flow.components[0],
        component_index: 0,
    };
    StandardExpressionCompiler::new().compile_to_instructions(&mut ctx, expression, kind)
}

fn compile(expression: &str, kind: PropertyKind) -> Result<Vec<Instruction>, ExpressionError> {
    let project = fixture();
    let mut registry = registry_for(&project);
    compile_with(&project, &mut registry, expression, kind)
}

#[test]
fn test_input_plus_constant() {
    let project = fixture();
    let mut registry = registry_for(&project);
    let code = compile_with(&project, &mut registry, "in + 1", PropertyKind::Input).unwrap();
    assert_eq!(code, vec![PushInput(0), PushConstant(2), Operation(0), End]);
    assert_eq!(registry.constants()[2], flowpack::value::FlowValue::Int32(1));
}

#[test]
fn test_empty_expression_pushes_undefined() {
    assert_eq!(compile("", PropertyKind::Input).unwrap(), vec![PushConstant(0), End]);
    assert_eq!(compile("   ", PropertyKind::Input).unwrap(), vec![PushConstant(0), End]);
}

#[test]
fn test_variable_resolution() {
    assert_eq!(
        compile("counter * total", PropertyKind::Input).unwrap(),
        vec![PushLocalVar(0), PushGlobalVar(1), Operation(2), End]
    );
    assert_eq!(
        compile("in ? 1 : 2", PropertyKind::Input).unwrap(),
        vec![PushInput(0), PushConstant(2), PushConstant(3), Operation(22), End]
    );
}

#[test]
fn test_assignable_targets() {
    assert_eq!(compile("out", PropertyKind::Assignable).unwrap(), vec![PushOutput(0), End]);
    assert_eq!(compile("counter", PropertyKind::Assignable).unwrap(), vec![PushLocalVar(0), End]);

    assert!(matches!(
        compile("counter + 1", PropertyKind::Assignable),
        Err(ExpressionError::NotAssignable)
    ));
    // Outputs are only visible to assignable properties.
    assert!(matches!(
        compile("out", PropertyKind::Input),
        Err(ExpressionError::UnknownIdentifier(name)) if name == "out"
    ));
}

#[test]
fn test_unknown_identifiers_and_functions() {
    assert!(matches!(
        compile("missing + 1", PropertyKind::Input),
        Err(ExpressionError::UnknownIdentifier(name)) if name == "missing"
    ));
    assert!(matches!(
        compile("Math.nope(1)", PropertyKind::Input),
        Err(ExpressionError::UnknownIdentifier(_))
    ));
    assert!(matches!(
        compile("Math.sin(1, 2)", PropertyKind::Input),
        Err(ExpressionError::Syntax(_))
    ));
    assert!(matches!(
        compile("1 +", PropertyKind::Input),
        Err(ExpressionError::Syntax(_))
    ));
}

#[test]
fn test_variadic_call_pushes_argument_count() {
    // Arguments are pushed last to first; the count 3 reuses the constant of the literal 3.
    assert_eq!(
        compile("Math.max(1, 2, 3)", PropertyKind::Input).unwrap(),
        vec![PushConstant(2), PushConstant(3), PushConstant(4), PushConstant(2), Operation(46), End]
    );
    assert_eq!(
        compile("Math.abs(in)", PropertyKind::Input).unwrap(),
        vec![PushInput(0), Operation(41), End]
    );
}

#[test]
fn test_array_literal() {
    let project = fixture();
    let mut registry = registry_for(&project);
    let code = compile_with(&project, &mut registry, "[1, 2]", PropertyKind::Input).unwrap();
    // "array:any" is the first type after the basic ones.
    assert_eq!(registry.types().find("array:any"), Some(14));
    assert_eq!(
        code,
        vec![PushConstant(2), PushConstant(3), PushConstant(2), PushConstant(4), Operation(28), End]
    );
}

#[test]
fn test_struct_member_access() {
    // Fields are addressed by their rank in name order: x = 0, y = 1.
    assert_eq!(
        compile("pos.y", PropertyKind::Input).unwrap(),
        vec![PushGlobalVar(0), PushConstant(2), ArrayElement, End]
    );
    assert!(matches!(
        compile("pos.z", PropertyKind::Input),
        Err(ExpressionError::UnknownIdentifier(name)) if name == "Point.z"
    ));
    assert!(matches!(
        compile("total.x", PropertyKind::Input),
        Err(ExpressionError::Unsupported(_))
    ));
}

#[test]
fn test_template_literal() {
    let project = fixture();
    let mut registry = registry_for(&project);
    let code = compile_with(&project, &mut registry, "Value: {in}", PropertyKind::TemplateLiteral)
        .unwrap();
    assert_eq!(code, vec![PushConstant(2), PushInput(0), Operation(0), End]);
    assert_eq!(
        registry.constants()[2],
        flowpack::value::FlowValue::String("Value: ".to_string())
    );

    assert!(compile("Broken {in", PropertyKind::TemplateLiteral).is_err());
}

#[test]
fn test_compile_writes_the_stream() {
    let project = fixture();
    let mut registry = registry_for(&project);
    let flow = &project.flows[0];
    let mut ctx = ExpressionContext {
        registry: &mut registry,
        project: &project,
        flow,
        flow_index: 0,
        component: &flow.components[0],
        component_index: 0,
    };
    let mut writer = AssetWriter::new();
    StandardExpressionCompiler::new()
        .compile(&mut ctx, &mut writer, "in", PropertyKind::Input)
        .unwrap();
    let bytes = writer.finish().unwrap();
    assert_eq!(bytes, vec![0x00, 0x20, 0x00, 0xE0]);
    assert_eq!(decode_stream(&bytes, 0), vec![PushInput(0), End]);
}

#[test]
fn test_constant_evaluation() {
    let compiler = StandardExpressionCompiler::new();
    assert_eq!(compiler.evaluate_constant("").unwrap(), json!(null));
    assert_eq!(compiler.evaluate_constant("1 + 2 * 3").unwrap(), json!(7));
    assert_eq!(compiler.evaluate_constant("7 / 2").unwrap(), json!(3.5));
    assert_eq!(compiler.evaluate_constant("\"a\" + \"b\"").unwrap(), json!("ab"));
    assert_eq!(compiler.evaluate_constant("[1, -2]").unwrap(), json!([1, -2]));
    assert!(matches!(
        compiler.evaluate_constant("counter + 1"),
        Err(ExpressionError::NotConstant(_))
    ));
}

#[test]
fn test_operations_table() {
    let operations = StandardExpressionCompiler::new().operations();
    let index_of = |name: &str| {
        operations
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, index)| index)
    };
    assert_eq!(index_of("add"), Some(0));
    assert_eq!(index_of("not"), Some(21));
    assert_eq!(index_of("conditional"), Some(22));
    assert_eq!(index_of("Math.max"), Some(46));
    assert!(operations.windows(2).all(|w| w[0].1 < w[1].1));
}

#[test]
fn test_instruction_encoding() {
    assert_eq!(End.encode(), 0xE000);
    assert_eq!(End.encode(), END_INSTRUCTION);
    assert_eq!(PushInput(5).encode(), 0x2005);
    assert_eq!(Operation(46).encode(), 0xC02E);
    assert_eq!(Instruction::decode(0x2005), PushInput(5));
    assert_eq!(Instruction::decode(0xA000), ArrayElement);

    assert_eq!(Instruction::param(8191).unwrap(), MAX_INSTRUCTION_PARAM);
    assert!(matches!(
        Instruction::param(8192),
        Err(ExpressionError::ParamOutOfRange { param: 8192, max: 8191 })
    ));
}

#[test]
fn test_decode_stream_stops_at_end_or_buffer() {
    let bytes = [0x01, 0x00, 0x00, 0xE0, 0x02, 0x00];
    assert_eq!(decode_stream(&bytes, 0), vec![PushConstant(1), End]);
    assert_eq!(decode_stream(&bytes, 4), vec![PushConstant(2)]);
}

#[test]
fn test_disassembly() {
    let project = fixture();
    let mut registry = registry_for(&project);
    let code = compile_with(&project, &mut registry, "in + 1", PropertyKind::Input).unwrap();
    let mut writer = AssetWriter::new();
    writer.write_u16(0);
    for instruction in code {
        instruction.write(&mut writer);
    }
    let bytes = writer.finish().unwrap();

    let text = disassemble(&bytes, 2, registry.constants());
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("0002: PUSH_INPUT"));
    assert!(lines[0].ends_with("#0"));
    assert!(lines[1].starts_with("0004: PUSH_CONSTANT"));
    assert!(lines[1].ends_with("#2 (1)"));
    assert!(lines[2].starts_with("0006: OPERATION"));
    assert!(lines[2].ends_with("add"));
    assert_eq!(lines[3], "0008: END");
}
