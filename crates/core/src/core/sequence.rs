//! Instruction sequences.
//!
//! A [`Sequence`] is the unit a process executes: the top-level trace or one program
//! body. It is immutable once built and shared behind an `Arc` by every process that
//! runs it; each process only owns its own cursor.

use std::sync::Arc;

use crate::common::error::DecodeError;
use crate::core::control::ConditionalMap;
use crate::isa::decode::decode_source;
use crate::isa::instruction::Instruction;

/// A named, preparsed instruction sequence.
#[derive(Debug)]
pub struct Sequence {
    name: Arc<str>,
    instructions: Vec<Instruction>,
    conditionals: ConditionalMap,
}

impl Sequence {
    /// Builds a sequence from decoded instructions, validating conditional nesting.
    ///
    /// # Returns
    ///
    /// The sequence, or every `UnterminatedConditional` error found.
    pub fn new(name: &str, instructions: Vec<Instruction>) -> Result<Self, Vec<DecodeError>> {
        let conditionals = ConditionalMap::build(&instructions)?;
        Ok(Self {
            name: Arc::from(name),
            instructions,
            conditionals,
        })
    }

    /// Decodes and preparses source text in one go.
    pub fn compile(name: &str, text: &str) -> Result<Self, Vec<DecodeError>> {
        Self::new(name, decode_source(text)?)
    }

    /// An empty sequence; a process running it exits on its next step.
    pub fn empty(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            instructions: Vec::new(),
            conditionals: ConditionalMap::default(),
        }
    }

    /// Returns the sequence name (program name, or `init` for the trace).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a shared handle to the sequence name.
    pub fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// Returns the instruction at `idx`.
    pub fn get(&self, idx: usize) -> Option<&Instruction> {
        self.instructions.get(idx)
    }

    /// Returns the preparsed conditional blocks.
    pub const fn conditionals(&self) -> &ConditionalMap {
        &self.conditionals
    }

    /// Number of instructions, markers included.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns `true` if the sequence has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}
