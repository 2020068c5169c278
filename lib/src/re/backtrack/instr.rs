/*!
This module defines the instructions executed by the backtracking VM, and
the [`Program`] type that holds a compiled regexp.

Instructions reference other instructions by their index within the
program, never by pointer, so a [`Program`] is a flat value that can be
cloned, moved, and shared between threads once compiled. For instance, the
regexp `a(b|c)*` produces the following program:

```text
00000: SAVE 0
00001: CHAR 0x61
00002: SPLIT(0) 00003 0000a
00003: SAVE 2
00004: SPLIT(1) 00005 00007
00005: CHAR 0x62
00006: JUMP 00008
00007: CHAR 0x63
00008: SAVE 3
00009: JUMP 00002
0000a: SAVE 1
0000b: MATCH
```
*/

use std::fmt::{Display, Formatter};

use crate::re::ast::ByteClass;

/// Each split instruction in a program has a unique ID, starting at 0. IDs
/// are dense, so they can be used as indexes in the VM's visited set.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct SplitId(pub(crate) u32);

impl From<SplitId> for usize {
    fn from(value: SplitId) -> Self {
        value.0 as Self
    }
}

impl Display for SplitId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Each loop whose body can match the empty string has a unique ID,
/// starting at 0. The VM uses it for tracking the offset where the current
/// iteration of the loop started.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LoopId(pub(crate) u32);

impl From<LoopId> for usize {
    fn from(value: LoopId) -> Self {
        value.0 as Self
    }
}

impl Display for LoopId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Location of an instruction within a [`Program`].
pub type InstrLoc = usize;

/// Instructions supported by the backtracking VM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// Match for the regexp has been found.
    Match,

    /// Matches a specific byte and advances to the next one.
    Char(u8),

    /// Matches any byte.
    AnyByte,

    /// Matches any byte in the class.
    Class(ByteClass),

    /// Continues executing at `first`. If that path fails, the VM resumes
    /// at `second` with the subject offset it had when the split was
    /// executed. The name comes from the fact that this instruction splits
    /// the execution flow in two.
    Split {
        /// Unique ID of this split within the program.
        id: SplitId,
        /// Location tried first.
        first: InstrLoc,
        /// Location tried when the path starting at `first` fails.
        second: InstrLoc,
    },

    /// Unconditional jump.
    Jump(InstrLoc),

    /// Records the current subject offset in the given capture slot.
    Save(usize),

    /// Matches the start of the subject (^). Zero-width.
    Start,

    /// Matches the end of the subject ($). Zero-width.
    End,

    /// Records the current subject offset as the start of an iteration of
    /// the given loop.
    IterStart(LoopId),

    /// Closes an iteration of the given loop. If the iteration didn't
    /// advance the subject offset, execution continues at `exit`, leaving
    /// the loop with the captures made by the empty iteration. Otherwise
    /// it continues with the next instruction, which goes back to the
    /// loop's split.
    IterEnd {
        /// The loop this instruction belongs to.
        id: LoopId,
        /// Location right after the loop.
        exit: InstrLoc,
    },
}

/// A compiled regexp, ready to be executed by the VM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub(crate) instrs: Vec<Instr>,
    /// Number of capture groups, not counting group 0.
    pub(crate) captures: u32,
    /// Innermost loop with an empty-matching body that encloses each
    /// split, indexed by [`SplitId`].
    pub(crate) split_scopes: Vec<Option<LoopId>>,
    /// Loop that encloses each loop, indexed by [`LoopId`].
    pub(crate) loop_parents: Vec<Option<LoopId>>,
    /// Index of the first cell used by each split in a row of the VM's
    /// visited set. A split enclosed by `n` loops uses `n + 1` cells, one
    /// per number of enclosing iterations that haven't consumed input.
    pub(crate) memo_bases: Vec<usize>,
    /// Number of cells in each row of the VM's visited set.
    pub(crate) memo_cells: usize,
}

impl Program {
    pub(crate) fn new(
        instrs: Vec<Instr>,
        captures: u32,
        split_scopes: Vec<Option<LoopId>>,
        loop_parents: Vec<Option<LoopId>>,
    ) -> Self {
        let mut memo_bases = Vec::with_capacity(split_scopes.len());
        let mut memo_cells = 0;

        for scope in split_scopes.iter() {
            memo_bases.push(memo_cells);
            let mut cells = 1;
            let mut scope = *scope;
            while let Some(id) = scope {
                cells += 1;
                scope = loop_parents[usize::from(id)];
            }
            memo_cells += cells;
        }

        Self {
            instrs,
            captures,
            split_scopes,
            loop_parents,
            memo_bases,
            memo_cells,
        }
    }

    /// Returns the program's instructions.
    #[inline]
    pub fn instrs(&self) -> &[Instr] {
        self.instrs.as_slice()
    }

    /// Number of instructions in the program.
    #[inline]
    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    /// Returns true if the program doesn't have any instruction. Programs
    /// produced by the compiler are never empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    /// Number of capture groups, not counting group 0 (the whole match).
    #[inline]
    pub fn captures(&self) -> u32 {
        self.captures
    }

    /// Number of capture slots used by the program. There are two slots
    /// per group, including group 0.
    #[inline]
    pub fn num_slots(&self) -> usize {
        2 * (self.captures as usize + 1)
    }

    /// Number of split instructions in the program.
    #[inline]
    pub fn splits(&self) -> u32 {
        self.split_scopes.len() as u32
    }

    /// Number of loops whose body can match the empty string. Each of them
    /// has its own [`Instr::IterStart`] and [`Instr::IterEnd`].
    #[inline]
    pub fn loops(&self) -> u32 {
        self.loop_parents.len() as u32
    }

    /// Number of bits per subject offset in the VM's visited set.
    #[inline]
    pub(crate) fn memo_cells(&self) -> usize {
        self.memo_cells
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;

        for (addr, instr) in self.instrs.iter().enumerate() {
            match instr {
                Instr::Match => {
                    writeln!(f, "{:05x}: MATCH", addr)?;
                }
                Instr::Char(byte) => {
                    writeln!(f, "{:05x}: CHAR {:#04x}", addr, byte)?;
                }
                Instr::AnyByte => {
                    writeln!(f, "{:05x}: ANY_BYTE", addr)?;
                }
                Instr::Class(class) => {
                    writeln!(f, "{:05x}: CLASS {}", addr, class)?;
                }
                Instr::Split { id, first, second } => {
                    writeln!(
                        f,
                        "{:05x}: SPLIT({}) {:05x} {:05x}",
                        addr, id, first, second
                    )?;
                }
                Instr::Jump(target) => {
                    writeln!(f, "{:05x}: JUMP {:05x}", addr, target)?;
                }
                Instr::Save(slot) => {
                    writeln!(f, "{:05x}: SAVE {}", addr, slot)?;
                }
                Instr::Start => {
                    writeln!(f, "{:05x}: START", addr)?;
                }
                Instr::End => {
                    writeln!(f, "{:05x}: END", addr)?;
                }
                Instr::IterStart(id) => {
                    writeln!(f, "{:05x}: ITER_START({})", addr, id)?;
                }
                Instr::IterEnd { id, exit } => {
                    writeln!(
                        f,
                        "{:05x}: ITER_END({}) {:05x}",
                        addr, id, exit
                    )?;
                }
            }
        }

        Ok(())
    }
}
