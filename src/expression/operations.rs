/// Operation index of the `?:` operator.
pub const CONDITIONAL_OPERATION: u16 = 22;
/// Operation index of `Flow.makeArrayValue`, used for array literals.
pub const MAKE_ARRAY_VALUE_OPERATION: u16 = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    /// `min..=max` arguments (no upper bound when `max` is `None`). The VM cannot tell how
    /// many were passed, so the count is pushed right before the operation.
    Range(usize, Option<usize>),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Fixed(n) => count == n,
            Arity::Range(min, max) => count >= min && max.is_none_or(|max| count <= max),
        }
    }

    pub fn is_variadic(self) -> bool {
        matches!(self, Arity::Range(..))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    LeftShift,
    RightShift,
    BitAnd,
    BitOr,
    BitXor,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
    LogicalAnd,
    LogicalOr,
}

impl BinaryOp {
    pub fn operation_index(self) -> u16 {
        self as u16
    }

    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Mod => "mod",
            BinaryOp::LeftShift => "left_shift",
            BinaryOp::RightShift => "right_shift",
            BinaryOp::BitAnd => "binary_and",
            BinaryOp::BitOr => "binary_or",
            BinaryOp::BitXor => "binary_xor",
            BinaryOp::Equal => "equal",
            BinaryOp::NotEqual => "not_equal",
            BinaryOp::Less => "less",
            BinaryOp::Greater => "greater",
            BinaryOp::LessOrEqual => "less_or_equal",
            BinaryOp::GreaterOrEqual => "greater_or_equal",
            BinaryOp::LogicalAnd => "logical_and",
            BinaryOp::LogicalOr => "logical_or",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::LeftShift => "<<",
            BinaryOp::RightShift => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessOrEqual => "<=",
            BinaryOp::GreaterOrEqual => ">=",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
        }
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::LogicalOr => 1,
            BinaryOp::LogicalAnd => 2,
            BinaryOp::BitOr => 3,
            BinaryOp::BitXor => 4,
            BinaryOp::BitAnd => 5,
            BinaryOp::Equal | BinaryOp::NotEqual => 6,
            BinaryOp::Less | BinaryOp::Greater | BinaryOp::LessOrEqual | BinaryOp::GreaterOrEqual => 7,
            BinaryOp::LeftShift | BinaryOp::RightShift => 8,
            BinaryOp::Add | BinaryOp::Sub => 9,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 10,
        }
    }

    const ALL: [BinaryOp; 18] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Mod,
        BinaryOp::LeftShift,
        BinaryOp::RightShift,
        BinaryOp::BitAnd,
        BinaryOp::BitOr,
        BinaryOp::BitXor,
        BinaryOp::Equal,
        BinaryOp::NotEqual,
        BinaryOp::Less,
        BinaryOp::Greater,
        BinaryOp::LessOrEqual,
        BinaryOp::GreaterOrEqual,
        BinaryOp::LogicalAnd,
        BinaryOp::LogicalOr,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Complement,
    Not,
}

impl UnaryOp {
    pub fn operation_index(self) -> u16 {
        18 + self as u16
    }

    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Plus => "unary_plus",
            UnaryOp::Minus => "unary_minus",
            UnaryOp::Complement => "binary_one_complement",
            UnaryOp::Not => "not",
        }
    }

    const ALL: [UnaryOp; 4] = [UnaryOp::Plus, UnaryOp::Minus, UnaryOp::Complement, UnaryOp::Not];
}

/// A built-in function callable as `Namespace.name(...)`.
#[derive(Debug, Clone, Copy)]
pub struct BuiltInFunction {
    pub name: &'static str,
    pub operation_index: u16,
    pub arity: Arity,
}

const BUILT_IN_FUNCTIONS: &[BuiltInFunction] = &[
    builtin("System.getTick", 23, Arity::Fixed(0)),
    builtin("Flow.index", 24, Arity::Fixed(1)),
    builtin("Flow.isPageActive", 25, Arity::Fixed(0)),
    builtin("Flow.pageTimelinePosition", 26, Arity::Fixed(0)),
    builtin("Flow.makeValue", 27, Arity::Fixed(2)),
    builtin("Flow.makeArrayValue", MAKE_ARRAY_VALUE_OPERATION, Arity::Fixed(2)),
    builtin("Flow.languages", 29, Arity::Fixed(0)),
    builtin("Flow.translate", 30, Arity::Fixed(1)),
    builtin("Flow.parseInteger", 31, Arity::Fixed(1)),
    builtin("Flow.parseFloat", 32, Arity::Fixed(1)),
    builtin("Flow.parseDouble", 33, Arity::Fixed(1)),
    builtin("Date.now", 34, Arity::Fixed(0)),
    builtin("Date.toString", 35, Arity::Fixed(1)),
    builtin("Date.fromString", 36, Arity::Fixed(1)),
    builtin("Math.sin", 37, Arity::Fixed(1)),
    builtin("Math.cos", 38, Arity::Fixed(1)),
    builtin("Math.log", 39, Arity::Fixed(1)),
    builtin("Math.log10", 40, Arity::Fixed(1)),
    builtin("Math.abs", 41, Arity::Fixed(1)),
    builtin("Math.floor", 42, Arity::Fixed(1)),
    builtin("Math.ceil", 43, Arity::Fixed(1)),
    builtin("Math.round", 44, Arity::Range(1, Some(2))),
    builtin("Math.min", 45, Arity::Range(2, None)),
    builtin("Math.max", 46, Arity::Range(2, None)),
    builtin("String.length", 47, Arity::Fixed(1)),
    builtin("String.substring", 48, Arity::Range(2, None)),
    builtin("String.find", 49, Arity::Fixed(2)),
    builtin("String.padStart", 50, Arity::Fixed(3)),
    builtin("String.split", 51, Arity::Fixed(2)),
    builtin("Array.length", 52, Arity::Fixed(1)),
    builtin("Array.slice", 53, Arity::Range(1, Some(3))),
    builtin("Array.allocate", 54, Arity::Fixed(1)),
    builtin("Array.append", 55, Arity::Fixed(2)),
    builtin("Array.insert", 56, Arity::Fixed(3)),
    builtin("Array.remove", 57, Arity::Fixed(2)),
    builtin("Array.clone", 58, Arity::Fixed(1)),
    builtin("Date.toLocaleString", 59, Arity::Fixed(1)),
    builtin("Date.getYear", 60, Arity::Fixed(1)),
    builtin("Date.getMonth", 61, Arity::Fixed(1)),
    builtin("Date.getDay", 62, Arity::Fixed(1)),
    builtin("Date.getHours", 63, Arity::Fixed(1)),
    builtin("Date.getMinutes", 64, Arity::Fixed(1)),
    builtin("Date.getSeconds", 65, Arity::Fixed(1)),
    builtin("Date.getMilliseconds", 66, Arity::Fixed(1)),
    builtin("Date.make", 67, Arity::Fixed(7)),
    builtin("Math.pow", 68, Arity::Fixed(2)),
    builtin("Flow.toInteger", 71, Arity::Fixed(1)),
    builtin("String.fromCodePoint", 72, Arity::Fixed(1)),
    builtin("String.codePointAt", 73, Arity::Fixed(2)),
    builtin("Blob.allocate", 75, Arity::Fixed(1)),
    builtin("JSON.get", 76, Arity::Fixed(2)),
    builtin("JSON.clone", 77, Arity::Fixed(1)),
    builtin("String.format", 79, Arity::Fixed(2)),
    builtin("String.formatPrefix", 80, Arity::Fixed(3)),
    builtin("Blob.toString", 88, Arity::Fixed(1)),
];

const fn builtin(name: &'static str, operation_index: u16, arity: Arity) -> BuiltInFunction {
    BuiltInFunction {
        name,
        operation_index,
        arity,
    }
}

pub fn built_in_function(name: &str) -> Option<&'static BuiltInFunction> {
    BUILT_IN_FUNCTIONS.iter().find(|f| f.name == name)
}

/// Every operation the VM knows, ordered by index.
pub fn operation_indexes() -> Vec<(&'static str, u16)> {
    let mut operations: Vec<(&'static str, u16)> = BinaryOp::ALL
        .iter()
        .map(|op| (op.name(), op.operation_index()))
        .chain(UnaryOp::ALL.iter().map(|op| (op.name(), op.operation_index())))
        .chain(std::iter::once(("conditional", CONDITIONAL_OPERATION)))
        .chain(BUILT_IN_FUNCTIONS.iter().map(|f| (f.name, f.operation_index)))
        .collect();
    operations.sort_by_key(|&(_, index)| index);
    operations
}

/// Name of the operation with `index`, for disassembly.
pub fn operation_name(index: u16) -> Option<&'static str> {
    operation_indexes()
        .into_iter()
        .find(|&(_, i)| i == index)
        .map(|(name, _)| name)
}
