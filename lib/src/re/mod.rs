/*! This module parses, compiles, and executes regular expressions.

A pattern in text form is first turned into an abstract syntax tree (see
[`ast::Regexp`]) by the hand-written recursive descent parser in [`parser`].
The tree can be rendered as an ASCII tree for inspection (see
[`ascii_tree`]).

Then, given a [`ast::Regexp`], the compiler in [`backtrack`] produces a flat
[`backtrack::Program`]: a sequence of instructions for a backtracking virtual
machine in the spirit of the recursive backtracker described in
[Regular Expression Matching: the Virtual Machine Approach][1]. The VM explores
alternatives depth-first using an explicit stack, which gives the conventional
leftmost-first semantics where the first alternative that matches wins.

[1]: https://swtch.com/~rsc/regexp/regexp2.html
*/

pub mod ascii_tree;
pub mod ast;
pub mod backtrack;
pub mod parser;

/// Maximum number of times a single `{n,m}` repetition can repeat its
/// operand. Larger bounds are rejected by the parser because the compiler
/// expands bounded repetitions into copies of the operand's code.
pub const DEFAULT_MAX_REPETITIONS: u32 = 1000;

/// Maximum number of nested groups accepted by the parser.
pub const DEFAULT_MAX_NESTING: u32 = 128;

/// Maximum number of instructions in a compiled program.
pub const DEFAULT_MAX_PROGRAM_SIZE: usize = 100_000;

/// Maximum number of bits in the set of visited states kept by the VM.
/// Searches that would need more run without it, which yields the same
/// results but can take longer.
pub const DEFAULT_MAX_VISITED_BITS: usize = 1 << 28;
