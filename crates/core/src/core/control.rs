//! Conditional Control Flow.
//!
//! Traces and program bodies contain blocks of the form
//! `IF_CHILD ... [IF_PARENT ...] ENDIF` (either region may come first). This module
//! provides:
//! 1. **Preparse:** [`ConditionalMap::build`] locates every block's markers before
//!    anything executes and rejects stray or missing `ENDIF`s.
//! 2. **Evaluation:** [`fetch_live`] walks a frame past the markers, entering the region
//!    that matches the process's side and jumping over the other one.
//!
//! Marker classification: an `IF_*` right after a `FORK` always opens a new block.
//! Otherwise it is the second region marker of the innermost open block when that
//! block has no marker of its kind yet, and opens a nested block in every other case.
//!
//! A FORK arms the block opening on its very next instruction: the parent takes the
//! parent region and the child the child region. Blocks nobody armed fall back to the
//! process's lineage tag. Open regions are kept per frame, outermost first, so a
//! grandchild forked inside an outer parent region still skips that block's child
//! region on its way to the outer `ENDIF`.

use tracing::trace;

use crate::common::error::DecodeError;
use crate::core::process::{Branch, Frame, OpenRegion, Side};
use crate::isa::instruction::{Instruction, Opcode};

/// Marker positions of one conditional block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    /// Index of the marker that opens the block.
    pub opener: usize,
    /// Index of the `IF_CHILD` marker, if the block has a child region.
    pub child: Option<usize>,
    /// Index of the `IF_PARENT` marker, if the block has a parent region.
    pub parent: Option<usize>,
    /// Index of the closing `ENDIF`.
    pub endif: usize,
}

impl Block {
    /// Returns the marker index of the region for `side`.
    pub const fn region(&self, side: Side) -> Option<usize> {
        match side {
            Side::Child => self.child,
            Side::Parent => self.parent,
        }
    }

    /// Returns the first marker strictly after `idx` (the other region or the `ENDIF`).
    pub fn next_marker_after(&self, idx: usize) -> usize {
        [self.child, self.parent]
            .into_iter()
            .flatten()
            .filter(|&marker| marker > idx)
            .min()
            .unwrap_or(self.endif)
    }
}

/// Preparsed conditional structure of one sequence.
#[derive(Clone, Debug, Default)]
pub struct ConditionalMap {
    blocks: Vec<Block>,
    /// Block id owning each marker instruction, indexed like the sequence.
    owner: Vec<Option<usize>>,
}

/// Block under construction.
struct PendingBlock {
    opener: usize,
    child: Option<usize>,
    parent: Option<usize>,
}

impl PendingBlock {
    fn slot(&mut self, side: Side) -> &mut Option<usize> {
        match side {
            Side::Child => &mut self.child,
            Side::Parent => &mut self.parent,
        }
    }
}

impl ConditionalMap {
    /// Locates every conditional block of `instructions`.
    ///
    /// # Returns
    ///
    /// The map, or one `UnterminatedConditional` per stray `ENDIF` and per unclosed
    /// block, in line order.
    pub fn build(instructions: &[Instruction]) -> Result<Self, Vec<DecodeError>> {
        let mut owner = vec![None; instructions.len()];
        let mut pending: Vec<PendingBlock> = Vec::new();
        let mut ids: Vec<usize> = Vec::new();
        let mut blocks: Vec<Option<Block>> = Vec::new();
        let mut errors = Vec::new();

        for (idx, inst) in instructions.iter().enumerate() {
            let side = match inst.opcode {
                Opcode::IfChild => Side::Child,
                Opcode::IfParent => Side::Parent,
                Opcode::EndIf => {
                    match (pending.pop(), ids.pop()) {
                        (Some(open), Some(id)) => {
                            owner[idx] = Some(id);
                            blocks[id] = Some(Block {
                                opener: open.opener,
                                child: open.child,
                                parent: open.parent,
                                endif: idx,
                            });
                        }
                        _ => errors.push(DecodeError::UnterminatedConditional {
                            line: inst.line,
                            reason: "ENDIF without an open IF_CHILD or IF_PARENT",
                        }),
                    }
                    continue;
                }
                _ => continue,
            };

            let after_fork = idx > 0 && instructions[idx - 1].opcode == Opcode::Fork;
            let second_marker = !after_fork
                && pending
                    .last_mut()
                    .is_some_and(|open| open.slot(side).is_none());

            if second_marker {
                if let (Some(open), Some(&id)) = (pending.last_mut(), ids.last()) {
                    *open.slot(side) = Some(idx);
                    owner[idx] = Some(id);
                }
            } else {
                let mut open = PendingBlock {
                    opener: idx,
                    child: None,
                    parent: None,
                };
                *open.slot(side) = Some(idx);
                owner[idx] = Some(blocks.len());
                ids.push(blocks.len());
                blocks.push(None);
                pending.push(open);
            }
        }

        for open in pending {
            errors.push(DecodeError::UnterminatedConditional {
                line: instructions[open.opener].line,
                reason: "block is never closed by ENDIF",
            });
        }

        if !errors.is_empty() {
            errors.sort_by_key(DecodeError::line);
            return Err(errors);
        }

        Ok(Self {
            blocks: blocks.into_iter().flatten().collect(),
            owner,
        })
    }

    /// Returns every block, in opener order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Returns the block owning the marker at `idx`.
    pub fn block_of(&self, idx: usize) -> Option<(usize, &Block)> {
        let id = (*self.owner.get(idx)?)?;
        self.blocks.get(id).map(|block| (id, block))
    }

    /// Returns the block that opens at `idx`, if any.
    pub fn block_opening_at(&self, idx: usize) -> Option<(usize, &Block)> {
        self.block_of(idx).filter(|(_, block)| block.opener == idx)
    }
}

/// Advances `frame` to its next live instruction and fetches it.
///
/// Conditional markers are consumed here and never reach the dispatcher: entering a
/// block pushes an [`OpenRegion`], a marker for the other side jumps to the block's
/// next marker, and `ENDIF` pops the region. On return the cursor already points past
/// the fetched instruction.
///
/// # Arguments
///
/// * `frame` - The frame to advance.
/// * `lineage` - The process's lineage tag, used for blocks no FORK armed.
///
/// # Returns
///
/// The live instruction, or `None` once the frame's sequence is exhausted.
pub fn fetch_live(frame: &mut Frame, lineage: Branch) -> Option<Instruction> {
    loop {
        let idx = frame.cursor;
        let inst = frame.sequence.get(idx)?;

        match inst.opcode {
            Opcode::IfChild | Opcode::IfParent => {
                let Some((id, block)) = frame.sequence.conditionals().block_of(idx) else {
                    frame.cursor += 1;
                    continue;
                };
                let block = *block;

                if block.opener == idx {
                    let side = frame.armed.take().unwrap_or_else(|| lineage.default_side());
                    frame.open.push(OpenRegion { block: id, side });
                }

                let marker_side = if inst.opcode == Opcode::IfChild {
                    Side::Child
                } else {
                    Side::Parent
                };
                let taken = frame.open.last().map_or(marker_side, |region| region.side);

                if taken == marker_side {
                    frame.cursor = idx + 1;
                } else {
                    let target = block.next_marker_after(idx);
                    trace!(from = idx, to = target, "skipping {:?} region", marker_side);
                    frame.cursor = target;
                }
            }
            Opcode::EndIf => {
                let _ = frame.open.pop();
                frame.cursor = idx + 1;
            }
            _ => {
                let inst = inst.clone();
                frame.cursor = idx + 1;
                return Some(inst);
            }
        }
    }
}
