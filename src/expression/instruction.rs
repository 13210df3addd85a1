use crate::error::ExpressionError;
use crate::writer::AssetWriter;

const KIND_SHIFT: u32 = 13;

/// Largest parameter an instruction can carry.
pub const MAX_INSTRUCTION_PARAM: u16 = (1 << KIND_SHIFT) - 1;

const PUSH_CONSTANT: u16 = 0;
const PUSH_INPUT: u16 = 1;
const PUSH_LOCAL_VAR: u16 = 2;
const PUSH_GLOBAL_VAR: u16 = 3;
const PUSH_OUTPUT: u16 = 4;
const ARRAY_ELEMENT: u16 = 5;
const OPERATION: u16 = 6;
const END: u16 = 7;

/// The encoded `End` instruction, used as the placeholder for properties that are hidden or
/// failed to compile.
pub const END_INSTRUCTION: u16 = END << KIND_SHIFT;

/// A single VM instruction: a 3-bit kind and a 13-bit parameter packed into a `u16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    PushConstant(u16),
    PushInput(u16),
    PushLocalVar(u16),
    PushGlobalVar(u16),
    PushOutput(u16),
    ArrayElement,
    Operation(u16),
    End,
}

impl Instruction {
    /// Checks that `index` fits into the parameter bits.
    pub fn param(index: usize) -> Result<u16, ExpressionError> {
        u16::try_from(index)
            .ok()
            .filter(|&p| p <= MAX_INSTRUCTION_PARAM)
            .ok_or(ExpressionError::ParamOutOfRange {
                param: u32::try_from(index).unwrap_or(u32::MAX),
                max: u32::from(MAX_INSTRUCTION_PARAM),
            })
    }

    pub fn encode(self) -> u16 {
        let (kind, param) = match self {
            Instruction::PushConstant(p) => (PUSH_CONSTANT, p),
            Instruction::PushInput(p) => (PUSH_INPUT, p),
            Instruction::PushLocalVar(p) => (PUSH_LOCAL_VAR, p),
            Instruction::PushGlobalVar(p) => (PUSH_GLOBAL_VAR, p),
            Instruction::PushOutput(p) => (PUSH_OUTPUT, p),
            Instruction::ArrayElement => (ARRAY_ELEMENT, 0),
            Instruction::Operation(p) => (OPERATION, p),
            Instruction::End => (END, 0),
        };
        (kind << KIND_SHIFT) | (param & MAX_INSTRUCTION_PARAM)
    }

    pub fn decode(word: u16) -> Self {
        let param = word & MAX_INSTRUCTION_PARAM;
        match word >> KIND_SHIFT {
            PUSH_CONSTANT => Instruction::PushConstant(param),
            PUSH_INPUT => Instruction::PushInput(param),
            PUSH_LOCAL_VAR => Instruction::PushLocalVar(param),
            PUSH_GLOBAL_VAR => Instruction::PushGlobalVar(param),
            PUSH_OUTPUT => Instruction::PushOutput(param),
            ARRAY_ELEMENT => Instruction::ArrayElement,
            OPERATION => Instruction::Operation(param),
            _ => Instruction::End,
        }
    }

    /// Instruction streams are not aligned: each word goes right at the cursor.
    pub fn write(self, writer: &mut AssetWriter) {
        writer.write_u16(self.encode());
    }
}

/// Writes the placeholder stream: a lone `End`.
pub fn write_end_instruction(writer: &mut AssetWriter) {
    Instruction::End.write(writer);
}

/// Decodes one instruction stream starting at `offset`, up to and including its `End`.
///
/// A stream that runs off the end of `bytes` is returned as far as it could be read.
pub fn decode_stream(bytes: &[u8], offset: usize) -> Vec<Instruction> {
    let mut instructions = Vec::new();
    let mut position = offset;
    while let Some(word) = bytes.get(position..position + 2) {
        let instruction = Instruction::decode(u16::from_le_bytes([word[0], word[1]]));
        instructions.push(instruction);
        if instruction == Instruction::End {
            break;
        }
        position += 2;
    }
    instructions
}
