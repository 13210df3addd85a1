use serde_json::{Number, Value};

use super::instruction::Instruction;
use super::operations::{
    BinaryOp, CONDITIONAL_OPERATION, MAKE_ARRAY_VALUE_OPERATION, UnaryOp, built_in_function,
    operation_indexes,
};
use super::parser::{Expr, Literal, parse, template_literal_to_expression};
use super::{ExpressionCompiler, ExpressionContext};
use crate::error::ExpressionError;
use crate::project::{PropertyKind, VariableDefinition};
use crate::registry::{Collection, UNDEFINED_CONSTANT_INDEX, component_input_key};
use crate::value::{FlowValue, ValueType};
use crate::writer::AssetWriter;

/// The compiler used when none is configured.
///
/// Identifiers resolve, in order, to the component's own outputs (assignable properties
/// only), its inputs, the flow's local variables and the project's global variables.
/// Literal operands become entries of the project-wide constants table.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardExpressionCompiler;

impl StandardExpressionCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Compiles to an instruction list without writing anything.
    pub fn compile_to_instructions(
        &self,
        ctx: &mut ExpressionContext<'_>,
        expression: &str,
        kind: PropertyKind,
    ) -> Result<Vec<Instruction>, ExpressionError> {
        let source = match kind {
            PropertyKind::TemplateLiteral => template_literal_to_expression(expression)?,
            _ => expression.trim().to_string(),
        };

        if source.is_empty() {
            return Ok(vec![
                Instruction::PushConstant(Instruction::param(UNDEFINED_CONSTANT_INDEX)?),
                Instruction::End,
            ]);
        }

        let expr = parse(&source)?;
        let assignable = kind == PropertyKind::Assignable;
        if assignable && !expr.is_assignable() {
            return Err(ExpressionError::NotAssignable);
        }

        let mut builder = CodeBuilder {
            ctx,
            code: Vec::new(),
            assignable,
        };
        builder.expr(&expr)?;
        builder.code.push(Instruction::End);
        Ok(builder.code)
    }
}

impl ExpressionCompiler for StandardExpressionCompiler {
    fn compile(
        &self,
        ctx: &mut ExpressionContext<'_>,
        writer: &mut AssetWriter,
        expression: &str,
        kind: PropertyKind,
    ) -> Result<(), ExpressionError> {
        for instruction in self.compile_to_instructions(ctx, expression, kind)? {
            instruction.write(writer);
        }
        Ok(())
    }

    fn evaluate_constant(&self, expression: &str) -> Result<Value, ExpressionError> {
        let source = expression.trim();
        if source.is_empty() {
            return Ok(Value::Null);
        }
        evaluate(&parse(source)?)
    }

    fn operations(&self) -> Vec<(String, u16)> {
        operation_indexes()
            .into_iter()
            .map(|(name, index)| (name.to_string(), index))
            .collect()
    }
}

struct CodeBuilder<'c, 'a> {
    ctx: &'c mut ExpressionContext<'a>,
    code: Vec<Instruction>,
    assignable: bool,
}

impl CodeBuilder<'_, '_> {
    fn expr(&mut self, expr: &Expr) -> Result<(), ExpressionError> {
        match expr {
            Expr::Literal(literal) => self.push_constant(literal_value(literal)),
            Expr::Identifier(name) => self.identifier(name),
            Expr::Unary(op, argument) => {
                self.expr(argument)?;
                self.code.push(Instruction::Operation(op.operation_index()));
                Ok(())
            }
            Expr::Binary(op, left, right) => {
                self.expr(left)?;
                self.expr(right)?;
                self.code.push(Instruction::Operation(op.operation_index()));
                Ok(())
            }
            Expr::Conditional(test, consequent, alternate) => {
                self.expr(test)?;
                self.expr(consequent)?;
                self.expr(alternate)?;
                self.code.push(Instruction::Operation(CONDITIONAL_OPERATION));
                Ok(())
            }
            Expr::Member(object, field) => self.member(object, field),
            Expr::Index(object, index) => {
                self.expr(object)?;
                self.expr(index)?;
                self.code.push(Instruction::ArrayElement);
                Ok(())
            }
            Expr::Call(name, arguments) => self.call(name, arguments),
            Expr::Array(elements) => {
                for element in elements.iter().rev() {
                    self.expr(element)?;
                }
                self.push_constant(FlowValue::Int32(count(elements.len())?))?;
                let array_type = self.ctx.registry.type_index("array:any");
                self.push_constant(FlowValue::Int32(count(array_type)?))?;
                self.code
                    .push(Instruction::Operation(MAKE_ARRAY_VALUE_OPERATION));
                Ok(())
            }
            Expr::Object(_) => Err(ExpressionError::Unsupported(
                "object literal outside a constant".to_string(),
            )),
        }
    }

    fn push_constant(&mut self, value: FlowValue) -> Result<(), ExpressionError> {
        let index = self.ctx.registry.constant_index(value);
        self.code
            .push(Instruction::PushConstant(Instruction::param(index)?));
        Ok(())
    }

    fn identifier(&mut self, name: &str) -> Result<(), ExpressionError> {
        let flow = self.ctx.flow_index;
        let component = self.ctx.component_index;
        let registry = &self.ctx.registry;

        let instruction = if let Some(index) = self
            .assignable
            .then(|| registry.find(Collection::ComponentOutput { flow, component }, name))
            .flatten()
        {
            Instruction::PushOutput(Instruction::param(index)?)
        } else if let Some(index) = registry.find(
            Collection::ComponentInput(flow),
            &component_input_key(&self.ctx.component.id, name),
        ) {
            Instruction::PushInput(Instruction::param(index)?)
        } else if let Some(index) = registry.find(Collection::LocalVariable(flow), name) {
            Instruction::PushLocalVar(Instruction::param(index)?)
        } else if let Some(index) = registry.find(Collection::GlobalVariable, name) {
            Instruction::PushGlobalVar(Instruction::param(index)?)
        } else {
            return Err(ExpressionError::UnknownIdentifier(name.to_string()));
        };
        self.code.push(instruction);
        Ok(())
    }

    // Struct values are arrays of their fields in name order.
    fn member(&mut self, object: &Expr, field: &str) -> Result<(), ExpressionError> {
        let Some(ValueType::Struct(structure_name)) = self.type_of(object) else {
            return Err(ExpressionError::Unsupported(format!(
                "member '{}' of a value that is not a struct",
                field
            )));
        };
        let field_index = self
            .ctx
            .project
            .structures
            .iter()
            .find(|s| s.name == structure_name)
            .and_then(|s| s.field_index(field))
            .ok_or_else(|| {
                ExpressionError::UnknownIdentifier(format!("{}.{}", structure_name, field))
            })?;

        self.expr(object)?;
        self.push_constant(FlowValue::Int32(count(field_index)?))?;
        self.code.push(Instruction::ArrayElement);
        Ok(())
    }

    fn call(&mut self, name: &str, arguments: &[Expr]) -> Result<(), ExpressionError> {
        let function = built_in_function(name)
            .ok_or_else(|| ExpressionError::UnknownIdentifier(name.to_string()))?;
        if !function.arity.accepts(arguments.len()) {
            return Err(ExpressionError::Syntax(format!(
                "Wrong number of arguments ({}) for {}",
                arguments.len(),
                name
            )));
        }
        for argument in arguments.iter().rev() {
            self.expr(argument)?;
        }
        if function.arity.is_variadic() {
            self.push_constant(FlowValue::Int32(count(arguments.len())?))?;
        }
        self.code
            .push(Instruction::Operation(function.operation_index));
        Ok(())
    }

    /// Declared type of an expression, as far as it can be known at build time.
    fn type_of(&self, expr: &Expr) -> Option<ValueType> {
        match expr {
            Expr::Identifier(name) => self.identifier_type(name),
            Expr::Member(object, field) => {
                let ValueType::Struct(structure_name) = self.type_of(object)? else {
                    return None;
                };
                let structure = self
                    .ctx
                    .project
                    .structures
                    .iter()
                    .find(|s| s.name == structure_name)?;
                let field = structure.fields.iter().find(|f| f.name == *field)?;
                ValueType::parse(&field.value_type)
            }
            Expr::Index(object, _) => match self.type_of(object)? {
                ValueType::Array(element) => Some(*element),
                _ => None,
            },
            Expr::Conditional(_, consequent, alternate) => {
                let consequent = self.type_of(consequent)?;
                (self.type_of(alternate)? == consequent).then_some(consequent)
            }
            _ => None,
        }
    }

    // Mirrors the resolution order of `identifier`.
    fn identifier_type(&self, name: &str) -> Option<ValueType> {
        let ctx = &self.ctx;
        if self.assignable {
            if let Some(output) = ctx.component.outputs.iter().find(|o| o.name == name) {
                return ValueType::parse(&output.value_type);
            }
        }
        if ctx.component.inputs.iter().any(|i| i.name == name) {
            return None;
        }
        let declared = |variables: &[VariableDefinition]| {
            variables
                .iter()
                .find(|v| v.name == name)
                .and_then(|v| v.value_type.as_deref())
                .and_then(ValueType::parse)
        };
        let flow = ctx.flow;
        if flow
            .user_properties
            .iter()
            .chain(&flow.local_variables)
            .any(|v| v.name == name)
        {
            return declared(&flow.user_properties).or_else(|| declared(&flow.local_variables));
        }
        declared(&ctx.project.global_variables)
    }
}

fn count(value: usize) -> Result<i32, ExpressionError> {
    i32::try_from(value).map_err(|_| ExpressionError::ParamOutOfRange {
        param: u32::try_from(value).unwrap_or(u32::MAX),
        max: i32::MAX as u32,
    })
}

/// Integral literals inside (-2^31, 2^31 - 1) are `int32`, all other numbers `double`.
fn literal_value(literal: &Literal) -> FlowValue {
    match literal {
        Literal::Integer(i) => match i32::try_from(*i) {
            Ok(v) if v != i32::MIN && v != i32::MAX => FlowValue::Int32(v),
            _ => FlowValue::Double(*i as f64),
        },
        Literal::Number(f) => {
            if f.fract() == 0.0 && *f > i32::MIN as f64 && *f < i32::MAX as f64 {
                FlowValue::Int32(*f as i32)
            } else {
                FlowValue::Double(*f)
            }
        }
        Literal::String(s) => FlowValue::String(s.clone()),
        Literal::Boolean(b) => FlowValue::Boolean(*b),
        Literal::Null => FlowValue::Null,
        Literal::Undefined => FlowValue::Undefined,
    }
}

// --- Constant evaluation ---

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn of(value: &Value) -> Option<Num> {
        let number = value.as_number()?;
        match number.as_i64() {
            Some(i) => Some(Num::Int(i)),
            None => number.as_f64().map(Num::Float),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    fn into_value(self) -> Result<Value, ExpressionError> {
        match self {
            Num::Int(i) => Ok(Value::from(i)),
            Num::Float(f) => Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| ExpressionError::NotConstant(format!("{} is not a finite number", f))),
        }
    }
}

fn evaluate(expr: &Expr) -> Result<Value, ExpressionError> {
    match expr {
        Expr::Literal(literal) => match literal {
            Literal::Integer(i) => Ok(Value::from(*i)),
            Literal::Number(f) => Num::Float(*f).into_value(),
            Literal::String(s) => Ok(Value::String(s.clone())),
            Literal::Boolean(b) => Ok(Value::Bool(*b)),
            Literal::Null | Literal::Undefined => Ok(Value::Null),
        },
        Expr::Identifier(name) => Err(ExpressionError::NotConstant(name.clone())),
        Expr::Call(name, _) => Err(ExpressionError::NotConstant(format!("{}()", name))),
        Expr::Member(_, field) => Err(ExpressionError::NotConstant(format!(".{}", field))),
        Expr::Index(..) => Err(ExpressionError::NotConstant("element access".to_string())),
        Expr::Unary(op, argument) => evaluate_unary(*op, evaluate(argument)?),
        Expr::Binary(op, left, right) => evaluate_binary(*op, evaluate(left)?, evaluate(right)?),
        Expr::Conditional(test, consequent, alternate) => {
            if is_truthy(&evaluate(test)?) {
                evaluate(consequent)
            } else {
                evaluate(alternate)
            }
        }
        Expr::Array(elements) => elements
            .iter()
            .map(evaluate)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expr::Object(fields) => fields
            .iter()
            .map(|(key, value)| Ok((key.clone(), evaluate(value)?)))
            .collect::<Result<serde_json::Map<_, _>, ExpressionError>>()
            .map(Value::Object),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn evaluate_unary(op: UnaryOp, value: Value) -> Result<Value, ExpressionError> {
    match (op, Num::of(&value)) {
        (UnaryOp::Not, _) => Ok(Value::Bool(!is_truthy(&value))),
        (UnaryOp::Plus, Some(n)) => n.into_value(),
        (UnaryOp::Minus, Some(Num::Int(i))) => Ok(i
            .checked_neg()
            .map(Value::from)
            .unwrap_or_else(|| Value::from(-(i as f64)))),
        (UnaryOp::Minus, Some(Num::Float(f))) => Num::Float(-f).into_value(),
        (UnaryOp::Complement, Some(Num::Int(i))) => Ok(Value::from(!i)),
        _ => Err(ExpressionError::Unsupported(format!(
            "{} of {}",
            op.name(),
            value
        ))),
    }
}

fn evaluate_binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, ExpressionError> {
    match op {
        BinaryOp::LogicalAnd => return Ok(if is_truthy(&left) { right } else { left }),
        BinaryOp::LogicalOr => return Ok(if is_truthy(&left) { left } else { right }),
        BinaryOp::Add if left.is_string() || right.is_string() => {
            return Ok(Value::String(format!("{}{}", plain(&left), plain(&right))));
        }
        _ => {}
    }

    let unsupported = || {
        ExpressionError::Unsupported(format!("{} {} {}", left, op.symbol(), right))
    };

    if matches!(op, BinaryOp::Equal | BinaryOp::NotEqual) {
        let equal = match (Num::of(&left), Num::of(&right)) {
            (Some(a), Some(b)) => a.as_f64() == b.as_f64(),
            _ => left == right,
        };
        return Ok(Value::Bool(equal == (op == BinaryOp::Equal)));
    }

    if let (Value::String(a), Value::String(b)) = (&left, &right) {
        let ordering = a.cmp(b);
        return match op {
            BinaryOp::Less => Ok(Value::Bool(ordering.is_lt())),
            BinaryOp::Greater => Ok(Value::Bool(ordering.is_gt())),
            BinaryOp::LessOrEqual => Ok(Value::Bool(ordering.is_le())),
            BinaryOp::GreaterOrEqual => Ok(Value::Bool(ordering.is_ge())),
            _ => Err(unsupported()),
        };
    }

    let (Some(a), Some(b)) = (Num::of(&left), Num::of(&right)) else {
        return Err(unsupported());
    };

    let result = match (op, a, b) {
        (BinaryOp::Less, ..) => return Ok(Value::Bool(a.as_f64() < b.as_f64())),
        (BinaryOp::Greater, ..) => return Ok(Value::Bool(a.as_f64() > b.as_f64())),
        (BinaryOp::LessOrEqual, ..) => return Ok(Value::Bool(a.as_f64() <= b.as_f64())),
        (BinaryOp::GreaterOrEqual, ..) => return Ok(Value::Bool(a.as_f64() >= b.as_f64())),

        (BinaryOp::Add, Num::Int(x), Num::Int(y)) => x.checked_add(y).map(Num::Int),
        (BinaryOp::Sub, Num::Int(x), Num::Int(y)) => x.checked_sub(y).map(Num::Int),
        (BinaryOp::Mul, Num::Int(x), Num::Int(y)) => x.checked_mul(y).map(Num::Int),
        (BinaryOp::Div, Num::Int(x), Num::Int(y)) if y != 0 && x % y == 0 => Some(Num::Int(x / y)),
        (BinaryOp::Mod, Num::Int(x), Num::Int(y)) if y != 0 => Some(Num::Int(x % y)),

        (BinaryOp::LeftShift, Num::Int(x), Num::Int(y)) => u32::try_from(y)
            .ok()
            .and_then(|y| x.checked_shl(y))
            .map(Num::Int),
        (BinaryOp::RightShift, Num::Int(x), Num::Int(y)) => u32::try_from(y)
            .ok()
            .and_then(|y| x.checked_shr(y))
            .map(Num::Int),
        (BinaryOp::BitAnd, Num::Int(x), Num::Int(y)) => Some(Num::Int(x & y)),
        (BinaryOp::BitOr, Num::Int(x), Num::Int(y)) => Some(Num::Int(x | y)),
        (BinaryOp::BitXor, Num::Int(x), Num::Int(y)) => Some(Num::Int(x ^ y)),
        (
            BinaryOp::LeftShift
            | BinaryOp::RightShift
            | BinaryOp::BitAnd
            | BinaryOp::BitOr
            | BinaryOp::BitXor,
            ..,
        ) => return Err(unsupported()),

        _ => None,
    };

    // Everything else, and integer overflow, falls back to floating point.
    let result = match result {
        Some(n) => n,
        None => {
            let (x, y) = (a.as_f64(), b.as_f64());
            Num::Float(match op {
                BinaryOp::Add => x + y,
                BinaryOp::Sub => x - y,
                BinaryOp::Mul => x * y,
                BinaryOp::Div => x / y,
                BinaryOp::Mod => x % y,
                _ => return Err(unsupported()),
            })
        }
    };
    result.into_value()
}

// String concatenation shows strings without quotes.
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval(source: &str) -> Result<Value, ExpressionError> {
        StandardExpressionCompiler.evaluate_constant(source)
    }

    #[test]
    fn test_constant_arithmetic() {
        assert_eq!(eval("1 + 2 * 3").unwrap(), json!(7));
        assert_eq!(eval("7 / 2").unwrap(), json!(3.5));
        assert_eq!(eval("8 / 2").unwrap(), json!(4));
        assert_eq!(eval("-(2 - 5)").unwrap(), json!(3));
        assert_eq!(eval("1 << 4 | 1").unwrap(), json!(17));
    }

    #[test]
    fn test_constant_strings_and_logic() {
        assert_eq!(eval("'a' + 1").unwrap(), json!("a1"));
        assert_eq!(eval("1 < 2 && 'x'").unwrap(), json!("x"));
        assert_eq!(eval("0 || null").unwrap(), json!(null));
        assert_eq!(eval("true ? [1, 2] : 3").unwrap(), json!([1, 2]));
        assert_eq!(eval("{ b: 2, a: 'x' }").unwrap(), json!({"a": "x", "b": 2}));
    }

    #[test]
    fn test_non_constants() {
        assert!(matches!(eval("counter + 1"), Err(ExpressionError::NotConstant(_))));
        assert!(matches!(eval("Math.abs(1)"), Err(ExpressionError::NotConstant(_))));
        assert!(matches!(eval("'a' - 1"), Err(ExpressionError::Unsupported(_))));
    }

    #[test]
    fn test_literal_typing() {
        assert_eq!(literal_value(&Literal::Integer(42)), FlowValue::Int32(42));
        assert_eq!(literal_value(&Literal::Number(3.0)), FlowValue::Int32(3));
        assert_eq!(literal_value(&Literal::Number(42.5)), FlowValue::Double(42.5));
        assert_eq!(
            literal_value(&Literal::Integer(i32::MAX as i64)),
            FlowValue::Double(i32::MAX as f64)
        );
        assert_eq!(
            literal_value(&Literal::Integer(1 << 40)),
            FlowValue::Double((1u64 << 40) as f64)
        );
    }
}
