use thiserror::Error;

/// Misuse of the binary writer. These indicate a bug in the emitter and abort the build.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WriterError {
    #[error("Alignment {0} is not a power of two")]
    InvalidAlignment(usize),

    #[error("No pending offset slot at position {0}")]
    UnknownPatch(usize),

    #[error("Offset slot at {position} lies outside the buffer (length {len})")]
    PatchOutOfRange { position: usize, len: usize },

    #[error("Target offset {target} lies outside the buffer (length {len})")]
    TargetOutOfRange { target: usize, len: usize },

    #[error("Offset {0} does not fit into a 32-bit slot")]
    OffsetOverflow(usize),

    #[error("Length {0} does not fit into a 32-bit length prefix")]
    LengthOverflow(usize),

    #[error("{0} offset slot(s) were never resolved")]
    UnresolvedPatches(usize),
}

/// Errors reported by an expression compiler. They never abort a build: the emitter writes a
/// placeholder instruction stream and reports the message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Expression error: {0}")]
    Syntax(String),

    #[error("Unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("Expression is not assignable")]
    NotAssignable,

    #[error("Instruction parameter {param} exceeds the {max} limit")]
    ParamOutOfRange { param: u32, max: u32 },

    #[error("Unsupported expression: {0}")]
    Unsupported(String),

    #[error("Not a constant: {0}")]
    NotConstant(String),

    #[error(transparent)]
    Writer(#[from] WriterError),
}

/// Failure of a component-type-specific binary hook.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HookError {
    #[error("{0}")]
    Failed(String),

    #[error("Missing setting '{0}'")]
    MissingSetting(String),

    #[error(transparent)]
    Writer(#[from] WriterError),
}

/// Errors while turning a literal into a typed `FlowValue`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("Unknown value type '{0}'")]
    UnknownType(String),

    #[error("Value '{found}' is not a valid {expected}")]
    Mismatch { expected: String, found: String },

    #[error("Unknown structure '{0}'")]
    UnknownStructure(String),
}

/// Fatal build failures. Everything recoverable goes through the diagnostic sink instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Internal writer error: {0}")]
    Writer(#[from] WriterError),

    #[error("Flow '{0}' appears twice in the project")]
    DuplicateFlow(String),
}

/// Errors that can occur when converting a custom user format into a `ProjectDefinition`.
#[derive(Error, Debug, Clone)]
pub enum ProjectConversionError {
    #[error("Invalid custom data: {0}")]
    ValidationError(String),
}

/// Errors while saving or loading persisted build artifacts.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Serialization failed: {0}")]
    Encode(String),

    #[error("Deserialization failed: {0}")]
    Decode(String),

    #[error("Could not access '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors while loading `BuildOptions`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read options file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid options file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
