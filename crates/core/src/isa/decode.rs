//! Trace and Program Line Decoder.
//!
//! Each non-blank line is `OPCODE[,operand]`: the line is split on the first comma
//! into an opcode token and a raw operand token, both trimmed. Operands are then typed
//! per opcode:
//! 1. **Counts:** `FORK`, `CPU`, `SYSCALL`, and `END_IO` take a non-negative integer.
//! 2. **Programs:** `EXEC` takes `name[,cost]`; the name must be non-empty.
//! 3. **Markers:** `IF_CHILD`, `IF_PARENT`, and `ENDIF` read their operand but ignore it.
//!
//! The older `EXEC name, cost` spelling (whitespace between opcode and name) is
//! accepted as well. Lines starting with `#` are comments.

use std::sync::Arc;

use crate::common::constants::{COMMENT_PREFIX, FIELD_SEPARATOR};
use crate::common::error::DecodeError;
use crate::isa::instruction::{Instruction, Opcode, Operand};

/// Decodes a single source line.
///
/// # Arguments
///
/// * `line_no` - 1-based line number, recorded on the instruction and on errors.
/// * `text` - The raw line, without its terminator.
///
/// # Returns
///
/// `Ok(None)` for blank and comment lines, `Ok(Some(_))` for an instruction.
pub fn decode_line(line_no: usize, text: &str) -> Result<Option<Instruction>, DecodeError> {
    let text = text.trim();
    if text.is_empty() || text.starts_with(COMMENT_PREFIX) {
        return Ok(None);
    }

    let (head, tail) = match text.split_once(FIELD_SEPARATOR) {
        Some((head, tail)) => (head.trim(), Some(tail.trim())),
        None => (text, None),
    };

    // `EXEC program1, 50`: the program name rides on the opcode token.
    let (token, operand) = match head.split_once(char::is_whitespace) {
        Some((token, rest)) => {
            let rest = rest.trim();
            let joined = match tail {
                Some(tail) => format!("{rest}{FIELD_SEPARATOR}{tail}"),
                None => rest.to_string(),
            };
            (token, joined)
        }
        None => (head, tail.unwrap_or_default().to_string()),
    };

    let Some(opcode) = Opcode::from_mnemonic(token) else {
        return Err(DecodeError::UnknownOpcode {
            line: line_no,
            opcode: token.to_string(),
        });
    };

    let malformed = |reason: &'static str| DecodeError::MalformedOperand {
        line: line_no,
        opcode,
        operand: operand.clone(),
        reason,
    };

    let operand = if opcode.takes_cycles() {
        Operand::Count(parse_count(&operand).map_err(malformed)?)
    } else if opcode.is_marker() {
        Operand::None
    } else {
        let (name, cost) = match operand.split_once(FIELD_SEPARATOR) {
            Some((name, cost)) => (name.trim(), Some(cost.trim())),
            None => (operand.trim(), None),
        };
        if name.is_empty() {
            return Err(malformed("program name is empty"));
        }
        let cost = cost.map(parse_count).transpose().map_err(malformed)?;
        Operand::Program {
            name: Arc::from(name),
            cost,
        }
    };

    Ok(Some(Instruction {
        opcode,
        operand,
        line: line_no,
    }))
}

/// Decodes a whole trace or program body.
///
/// Decoding does not stop at the first bad line: every error is collected so the
/// caller can report all of them and decide whether to abort.
///
/// # Returns
///
/// The instructions in source order, or every `DecodeError` found in line order.
pub fn decode_source(text: &str) -> Result<Vec<Instruction>, Vec<DecodeError>> {
    let mut instructions = Vec::new();
    let mut errors = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        match decode_line(idx + 1, line) {
            Ok(Some(inst)) => instructions.push(inst),
            Ok(None) => {}
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(instructions)
    } else {
        Err(errors)
    }
}

/// Parses a non-negative integer operand. Only ASCII digits are accepted, so `+5`
/// is rejected like any other non-integer.
fn parse_count(raw: &str) -> Result<u64, &'static str> {
    if raw.is_empty() {
        return Err("missing operand");
    }
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err("not an integer");
    }
    if digits.len() != raw.len() {
        return Err("value must be non-negative");
    }
    raw.parse::<u64>().map_err(|_| "value out of range")
}
