//! Common test utilities for building projects and reading blobs.
#![allow(dead_code)]

use flowpack::prelude::*;

// --- Little-endian readers ---

pub fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

pub fn read_i16(bytes: &[u8], at: usize) -> i16 {
    i16::from_le_bytes([bytes[at], bytes[at + 1]])
}

pub fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
}

pub fn read_i32(bytes: &[u8], at: usize) -> i32 {
    i32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
}

pub fn read_f64(bytes: &[u8], at: usize) -> f64 {
    f64::from_le_bytes(bytes[at..at + 8].try_into().unwrap())
}

/// Walks a blob the way the VM does: a cursor plus the same alignment rules as the writer.
pub struct Reader<'a> {
    pub bytes: &'a [u8],
    pub pos: usize,
}

impl<'a> Reader<'a> {
    pub fn at(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    pub fn align(&mut self, alignment: usize) {
        self.pos = self.pos.div_ceil(alignment) * alignment;
    }

    pub fn u16(&mut self) -> u16 {
        let value = read_u16(self.bytes, self.pos);
        self.pos += 2;
        value
    }

    pub fn i16(&mut self) -> i16 {
        let value = read_i16(self.bytes, self.pos);
        self.pos += 2;
        value
    }

    pub fn u32(&mut self) -> u32 {
        let value = read_u32(self.bytes, self.pos);
        self.pos += 4;
        value
    }

    /// Header of `write_array` / `write_number_array`.
    pub fn array_len(&mut self, alignment: usize) -> usize {
        self.align(4);
        let len = self.u32() as usize;
        self.align(alignment);
        len
    }

    /// Reads instruction words up to and including `End`.
    pub fn instruction_stream(&mut self) -> Vec<u16> {
        let mut words = Vec::new();
        loop {
            let word = self.u16();
            words.push(word);
            if word == 0xE000 {
                return words;
            }
        }
    }
}

/// A decoded component record, minus the class-specific tail.
#[derive(Debug)]
pub struct ComponentRecord {
    pub type_id: u16,
    pub breakpoint: u16,
    pub inputs: Vec<u16>,
    pub properties: Vec<Vec<u16>>,
    /// Per output: connection targets and the seqout flag.
    pub outputs: Vec<(Vec<(u16, u16)>, u32)>,
    pub error_output: i16,
    /// Offset right after the generic record, where a class-specific tail starts.
    pub end: usize,
}

pub fn read_component(blob: &[u8], offset: usize) -> ComponentRecord {
    let mut reader = Reader::at(blob, offset);
    let type_id = reader.u16();
    let breakpoint = reader.u16();

    let input_count = reader.array_len(4);
    let inputs = (0..input_count).map(|_| reader.u16()).collect();

    let property_count = reader.array_len(4);
    let properties = (0..property_count)
        .map(|_| reader.instruction_stream())
        .collect();

    let output_count = reader.array_len(4);
    let mut outputs = Vec::with_capacity(output_count);
    for _ in 0..output_count {
        let line_count = reader.array_len(4);
        let lines = (0..line_count).map(|_| (reader.u16(), reader.u16())).collect();
        let seqout = reader.u32();
        outputs.push((lines, seqout));
    }

    let error_output = reader.i16();
    let _reserved = reader.u16();

    ComponentRecord {
        type_id,
        breakpoint,
        inputs,
        properties,
        outputs,
        error_output,
        end: reader.pos,
    }
}

// --- Project builders ---

pub fn component(id: &str, class_name: &str) -> ComponentDefinition {
    ComponentDefinition {
        id: id.to_string(),
        class_name: class_name.to_string(),
        ..Default::default()
    }
}

pub fn input(name: &str) -> InputDefinition {
    InputDefinition {
        name: name.to_string(),
        ..Default::default()
    }
}

pub fn sequence_input(name: &str) -> InputDefinition {
    InputDefinition {
        name: name.to_string(),
        is_sequence_input: true,
        ..Default::default()
    }
}

pub fn output(name: &str) -> OutputDefinition {
    OutputDefinition {
        name: name.to_string(),
        value_type: "any".to_string(),
        ..Default::default()
    }
}

pub fn property(name: &str, expression: &str) -> PropertyDefinition {
    PropertyDefinition {
        name: name.to_string(),
        expression: expression.to_string(),
        value_type: "any".to_string(),
        ..Default::default()
    }
}

pub fn line(source: &str, output: &str, target: &str, input: &str) -> ConnectionLineDefinition {
    ConnectionLineDefinition {
        source: source.to_string(),
        output: output.to_string(),
        target: target.to_string(),
        input: input.to_string(),
    }
}

pub fn variable(name: &str, value_type: &str, default_value: &str) -> VariableDefinition {
    VariableDefinition {
        name: name.to_string(),
        value_type: Some(value_type.to_string()),
        default_value: default_value.to_string(),
        ..Default::default()
    }
}

pub fn flow(id: &str, components: Vec<ComponentDefinition>, lines: Vec<ConnectionLineDefinition>) -> FlowDefinition {
    FlowDefinition {
        id: id.to_string(),
        name: id.to_string(),
        components,
        connection_lines: lines,
        ..Default::default()
    }
}

pub fn project(kind: ProjectKind, flows: Vec<FlowDefinition>) -> ProjectDefinition {
    ProjectDefinition {
        kind,
        flows,
        ..Default::default()
    }
}

/// `A --@seqout--> B.@seqin` and `A --data--> B.in`; B logs its `in` input.
pub fn create_two_component_flow() -> FlowDefinition {
    let mut a = component("A", "Start");
    a.outputs = vec![output("@seqout"), output("data")];

    let mut b = component("B", "Log");
    b.inputs = vec![sequence_input("@seqin"), input("in")];
    b.properties = vec![property("value", "in")];

    flow(
        "main",
        vec![a, b],
        vec![line("A", "@seqout", "B", "@seqin"), line("A", "data", "B", "in")],
    )
}

/// Builds with default options and collects the diagnostics.
pub fn build(project: &ProjectDefinition) -> (BuildOutput, Vec<Diagnostic>) {
    build_with(ProjectAssetsEmitter::default(), project)
}

pub fn build_with(emitter: ProjectAssetsEmitter, project: &ProjectDefinition) -> (BuildOutput, Vec<Diagnostic>) {
    let mut sink = CollectingSink::new();
    let output = emitter.build(project, &mut sink).unwrap();
    (output, sink.into_entries())
}

/// Scratch directory for tests that touch the filesystem.
pub fn setup_test_dir() -> std::path::PathBuf {
    std::env::temp_dir().join("flowpack_tests")
}
