use super::instruction::{Instruction, decode_stream};
use super::operations::operation_name;
use std::fmt::Display;

/// Renders the instruction stream at `offset` as one line per instruction.
///
/// `constants` is the project constants table, used to show the value behind
/// `PushConstant`.
pub fn disassemble<C: Display>(bytes: &[u8], offset: usize, constants: &[C]) -> String {
    let mut output = String::new();
    for (i, instruction) in decode_stream(bytes, offset).into_iter().enumerate() {
        let text = match instruction {
            Instruction::PushConstant(index) => {
                let value = constants
                    .get(usize::from(index))
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "?".to_string());
                format!("{:<20} #{} ({})", "PUSH_CONSTANT", index, value)
            }
            Instruction::PushInput(index) => format!("{:<20} #{}", "PUSH_INPUT", index),
            Instruction::PushLocalVar(index) => format!("{:<20} #{}", "PUSH_LOCAL_VAR", index),
            Instruction::PushGlobalVar(index) => format!("{:<20} #{}", "PUSH_GLOBAL_VAR", index),
            Instruction::PushOutput(index) => format!("{:<20} #{}", "PUSH_OUTPUT", index),
            Instruction::ArrayElement => "ARRAY_ELEMENT".to_string(),
            Instruction::Operation(index) => format!(
                "{:<20} {}",
                "OPERATION",
                operation_name(index).unwrap_or("<unknown>")
            ),
            Instruction::End => "END".to_string(),
        };
        output.push_str(&format!("{:04}: {}\n", offset + i * 2, text));
    }
    output
}
