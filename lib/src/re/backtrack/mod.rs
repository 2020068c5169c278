/*! A regexp engine based on backtracking.

Regexps are compiled into a linear program, where alternation and
repetition are expressed with `SPLIT` and `JUMP` instructions, and capture
groups with `SAVE` instructions that record subject offsets in numbered
slots. Group `n` uses slots `2n` and `2n+1`, group 0 being the whole match.

The program is executed by a backtracking VM that explores alternatives in
priority order, so the match found is the leftmost-first one: the one that
a Perl-style engine would find. Loops whose body can match the empty string
check that each iteration consumes some input, and leave the loop after an
iteration that doesn't, which guarantees termination for patterns like
`(a*)*`. The VM also remembers the states that failed, so it doesn't explore
them twice.
*/

pub use compiler::Compiler;
pub use instr::{Instr, InstrLoc, LoopId, Program, SplitId};
pub(crate) use vm::BacktrackVM;

mod compiler;
mod instr;
mod vm;
