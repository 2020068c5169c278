/*! A backtracking regular expression engine written in Rust.

Patterns are parsed into a syntax tree, compiled into a flat program for a
backtracking virtual machine, and executed against byte strings. Matches
follow the leftmost-first semantics of Perl-style engines: among the
matches that start at the leftmost position, the one preferred by the
order of alternatives and the greediness of quantifiers wins.

The main type in this crate is [`Machine`], which bundles a compiled
regexp with its configuration. A machine can be shared by any number of
threads, and used for finding matches, enumerating them, or replacing them
with a template.

The supported syntax includes literal bytes, `.` (any byte), character
classes like `[a-z]` or `[^0-9]`, the `\d`, `\w` and `\s` shorthands and
their negations, the `^` and `$` anchors, capturing `(...)` and
non-capturing `(?:...)` groups, alternation with `|`, and the `*`, `+`,
`?`, `{n}`, `{n,}` and `{n,m}` quantifiers, each of them with a lazy
variant when followed by `?`.

# Example

```rust
# use retrack;
// Create a machine for the pattern.
let machine = retrack::Machine::new("(a+)b").unwrap();

// Enumerate the matches.
let matches: Vec<_> = machine
    .find_iter("aabcdabe")
    .map(|m| m.unwrap().range)
    .collect();

assert_eq!(matches, vec![0..3, 5..7]);

// Replace them.
assert_eq!(
    machine.replace("aabcdabe", "[$1]", true).unwrap(),
    "[aa]cd[a]e"
);
```

The intermediate representations can be inspected too:

```rust
# use retrack;
let re = retrack::parse("a|b").unwrap();
let program = retrack::compile(&re).unwrap();

// Prints the syntax tree.
println!("{}", re);
// Prints the program, one instruction per line.
println!("{}", program);
```
*/

#![deny(missing_docs)]

pub use errors::Error;

pub use machine::Machine;
pub use machine::Match;
pub use machine::MatchResult;
pub use machine::Matches;

pub use re::ast::ByteClass;
pub use re::ast::Node;
pub use re::ast::Regexp;
pub use re::backtrack::Compiler;
pub use re::backtrack::Instr;
pub use re::backtrack::InstrLoc;
pub use re::backtrack::LoopId;
pub use re::backtrack::Program;
pub use re::backtrack::SplitId;
pub use re::parser::Parser;
pub use re::parser::SyntaxError;

pub use replace::TemplateError;

pub mod config;

mod errors;
mod machine;
mod re;
mod replace;

#[cfg(test)]
mod tests;

/// Parses a pattern with the default limits and returns its syntax tree.
///
/// Use [`Parser`] for parsing with custom limits.
pub fn parse(pattern: &str) -> Result<Regexp, SyntaxError> {
    Parser::new().parse(pattern)
}

/// Compiles a syntax tree into a program for the backtracking VM.
///
/// Fails with [`Error::TooLarge`] if the program would exceed the default
/// size limit. Use [`Compiler`] for a custom limit.
pub fn compile(re: &Regexp) -> Result<Program, Error> {
    re::backtrack::Compiler::new().compile(re)
}
