use thiserror::Error;

use crate::re::ast::{ByteClass, Node, Regexp};
use crate::re::{DEFAULT_MAX_NESTING, DEFAULT_MAX_REPETITIONS};

/// Error returned by [`Parser::parse`] when the pattern is malformed.
///
/// Every variant carries the byte offset within the pattern where the
/// problem was detected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// An opening parenthesis without its closing counterpart.
    #[error("unclosed parenthesis at offset {pos}")]
    UnclosedParenthesis {
        /// Offset of the opening parenthesis.
        pos: usize,
    },

    /// A closing parenthesis without its opening counterpart.
    #[error("unexpected closing parenthesis at offset {pos}")]
    UnexpectedParenthesis {
        /// Offset of the closing parenthesis.
        pos: usize,
    },

    /// A quantifier that doesn't follow anything it can apply to, as in
    /// `*a`, `a|+b` or `a**`.
    #[error("quantifier without operand at offset {pos}")]
    DanglingQuantifier {
        /// Offset of the quantifier.
        pos: usize,
    },

    /// An empty pattern, group or alternative, as in `()` or `a|`.
    #[error("empty sub-expression at offset {pos}")]
    EmptyExpression {
        /// Offset where the sub-expression was expected.
        pos: usize,
    },

    /// The pattern ends with a backslash.
    #[error("pattern ends with an escape character at offset {pos}")]
    TrailingEscape {
        /// Offset of the backslash.
        pos: usize,
    },

    /// A backslash followed by a byte that can't be escaped.
    #[error(
        "invalid escape sequence `\\{}` at offset {pos}",
        char::from(*.byte)
    )]
    InvalidEscape {
        /// Offset of the backslash.
        pos: usize,
        /// The byte following the backslash.
        byte: u8,
    },

    /// A group starting with `(?` that is not a non-capturing group.
    #[error("unsupported group syntax at offset {pos}")]
    UnsupportedGroup {
        /// Offset of the opening parenthesis.
        pos: usize,
    },

    /// A character class without its closing bracket.
    #[error("unclosed character class at offset {pos}")]
    UnclosedClass {
        /// Offset of the opening bracket.
        pos: usize,
    },

    /// A range like `z-a` in a character class.
    #[error("invalid range in character class at offset {pos}")]
    InvalidClassRange {
        /// Offset of the range's lower end.
        pos: usize,
    },

    /// Malformed bounds in a repetition, or `{n,m}` with `n > m`.
    #[error("invalid repetition at offset {pos}")]
    InvalidRepetition {
        /// Offset of the opening brace.
        pos: usize,
    },

    /// Repetition bounds above the configured maximum.
    #[error("repetition count exceeds {max} at offset {pos}")]
    RepetitionTooLarge {
        /// Offset of the bound that exceeds the maximum.
        pos: usize,
        /// The maximum allowed.
        max: u32,
    },

    /// Groups nested deeper than the configured maximum.
    #[error("groups nested more than {max} levels deep at offset {pos}")]
    NestingTooDeep {
        /// Offset of the opening parenthesis that exceeds the maximum.
        pos: usize,
        /// The maximum allowed.
        max: u32,
    },
}

/// A regular expression parser.
///
/// Takes a pattern in text form and produces its [`Regexp`]. The parser is
/// a single-pass recursive descent parser with one byte of lookahead. The
/// grammar, from lowest to highest precedence, is:
///
/// ```text
/// alternation := concat ( '|' concat )*
/// concat      := repeat+
/// repeat      := atom ( quantifier '?'? )?
/// quantifier  := '*' | '+' | '?' | '{' n '}' | '{' n ',}' | '{' n ',' m '}'
/// atom        := '(' ( '?:' )? alternation ')' | '[' class ']'
///              | '.' | '^' | '$' | '\' escape | byte
/// ```
pub struct Parser {
    max_repetitions: u32,
    max_nesting: u32,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Creates a new parser with the default limits.
    pub fn new() -> Self {
        Self {
            max_repetitions: DEFAULT_MAX_REPETITIONS,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }

    /// Sets the largest bound accepted in `{n,m}` repetitions.
    pub fn max_repetitions(mut self, max: u32) -> Self {
        self.max_repetitions = max;
        self
    }

    /// Sets the maximum number of nested groups, patterns with deeper
    /// nesting are rejected with [`SyntaxError::NestingTooDeep`].
    pub fn max_nesting(mut self, max: u32) -> Self {
        self.max_nesting = max;
        self
    }

    /// Parses the pattern and returns its syntax tree.
    pub fn parse(&self, pattern: &str) -> Result<Regexp, SyntaxError> {
        let mut state = State {
            input: pattern.as_bytes(),
            pos: 0,
            next_capture: 1,
            depth: 0,
            max_repetitions: self.max_repetitions,
            max_nesting: self.max_nesting,
        };

        let root = state.alternation()?;

        // `alternation` only stops at the end of the input or at a closing
        // parenthesis. Being at the top level, the latter is unbalanced.
        if state.peek().is_some() {
            return Err(SyntaxError::UnexpectedParenthesis { pos: state.pos });
        }

        Ok(Regexp { root, captures: state.next_capture - 1 })
    }
}

struct State<'a> {
    input: &'a [u8],
    pos: usize,
    next_capture: u32,
    /// Number of groups enclosing the current position.
    depth: u32,
    max_repetitions: u32,
    max_nesting: u32,
}

impl<'a> State<'a> {
    #[inline]
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline]
    fn peek_at(&self, n: usize) -> Option<u8> {
        self.input.get(self.pos + n).copied()
    }

    #[inline]
    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    fn alternation(&mut self) -> Result<Node, SyntaxError> {
        let mut alternatives = vec![self.concat()?];

        while self.peek() == Some(b'|') {
            self.pos += 1;
            alternatives.push(self.concat()?);
        }

        if alternatives.len() == 1 {
            Ok(alternatives.swap_remove(0))
        } else {
            Ok(Node::Alternate(alternatives))
        }
    }

    fn concat(&mut self) -> Result<Node, SyntaxError> {
        let start = self.pos;
        let mut items = Vec::new();

        loop {
            match self.peek() {
                None | Some(b'|') | Some(b')') => break,
                Some(_) => items.push(self.repeat()?),
            }
        }

        match items.len() {
            0 => Err(SyntaxError::EmptyExpression { pos: start }),
            1 => Ok(items.swap_remove(0)),
            _ => Ok(Node::Concat(items)),
        }
    }

    fn repeat(&mut self) -> Result<Node, SyntaxError> {
        let node = self.atom()?;

        let node = match self.peek() {
            Some(b'*') => {
                self.pos += 1;
                Node::Star { node: Box::new(node), greedy: self.greedy() }
            }
            Some(b'+') => {
                self.pos += 1;
                Node::Plus { node: Box::new(node), greedy: self.greedy() }
            }
            Some(b'?') => {
                self.pos += 1;
                Node::Optional { node: Box::new(node), greedy: self.greedy() }
            }
            Some(b'{') => {
                let (min, max) = self.bounds()?;
                Node::Repeat {
                    node: Box::new(node),
                    min,
                    max,
                    greedy: self.greedy(),
                }
            }
            _ => return Ok(node),
        };

        // A quantifier applied to another quantifier, like in `a**`, is
        // not accepted.
        if matches!(self.peek(), Some(b'*' | b'+' | b'?' | b'{')) {
            return Err(SyntaxError::DanglingQuantifier { pos: self.pos });
        }

        Ok(node)
    }

    /// Consumes the lazy marker that can follow a quantifier, returns false
    /// if it was present.
    fn greedy(&mut self) -> bool {
        if self.peek() == Some(b'?') {
            self.pos += 1;
            false
        } else {
            true
        }
    }

    /// Parses `{n}`, `{n,}` or `{n,m}`. The current byte is the opening
    /// brace.
    fn bounds(&mut self) -> Result<(u32, Option<u32>), SyntaxError> {
        let start = self.pos;
        self.pos += 1;

        let min = self
            .number()?
            .ok_or(SyntaxError::InvalidRepetition { pos: start })?;

        let max = match self.bump() {
            Some(b'}') => return Ok((min, Some(min))),
            Some(b',') => self.number()?,
            _ => return Err(SyntaxError::InvalidRepetition { pos: start }),
        };

        if self.bump() != Some(b'}') {
            return Err(SyntaxError::InvalidRepetition { pos: start });
        }

        match max {
            Some(max) if max < min => {
                Err(SyntaxError::InvalidRepetition { pos: start })
            }
            max => Ok((min, max)),
        }
    }

    /// Parses a decimal number, returns `None` if there are no digits at
    /// the current position.
    fn number(&mut self) -> Result<Option<u32>, SyntaxError> {
        let start = self.pos;
        let mut value: u32 = 0;

        while let Some(digit @ b'0'..=b'9') = self.peek() {
            self.pos += 1;
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add((digit - b'0') as u32))
                .filter(|v| *v <= self.max_repetitions)
                .ok_or(SyntaxError::RepetitionTooLarge {
                    pos: start,
                    max: self.max_repetitions,
                })?;
        }

        Ok(if self.pos == start { None } else { Some(value) })
    }

    fn atom(&mut self) -> Result<Node, SyntaxError> {
        let pos = self.pos;
        let Some(byte) = self.bump() else {
            return Err(SyntaxError::EmptyExpression { pos });
        };

        match byte {
            b'(' => self.group(pos),
            b')' => Err(SyntaxError::UnexpectedParenthesis { pos }),
            b'[' => self.class(pos).map(Node::Class),
            b'*' | b'+' | b'?' | b'{' => {
                Err(SyntaxError::DanglingQuantifier { pos })
            }
            b'.' => Ok(Node::AnyByte),
            b'^' => Ok(Node::Start),
            b'$' => Ok(Node::End),
            b'\\' => match self.escape(pos)? {
                Escaped::Byte(b) => Ok(Node::Literal(b)),
                Escaped::Class(class) => Ok(Node::Class(class)),
            },
            b => Ok(Node::Literal(b)),
        }
    }

    /// Parses a group. The opening parenthesis at `open` was already
    /// consumed.
    fn group(&mut self, open: usize) -> Result<Node, SyntaxError> {
        if self.depth >= self.max_nesting {
            return Err(SyntaxError::NestingTooDeep {
                pos: open,
                max: self.max_nesting,
            });
        }

        let index = if self.peek() == Some(b'?') {
            if self.peek_at(1) != Some(b':') {
                return Err(SyntaxError::UnsupportedGroup { pos: open });
            }
            self.pos += 2;
            None
        } else {
            // The index is taken before parsing the group's content, so
            // that groups are numbered by their opening parenthesis.
            let index = self.next_capture;
            self.next_capture += 1;
            Some(index)
        };

        self.depth += 1;
        let node = self.alternation()?;
        self.depth -= 1;

        if self.bump() != Some(b')') {
            return Err(SyntaxError::UnclosedParenthesis { pos: open });
        }

        Ok(Node::Group { node: Box::new(node), index })
    }

    /// Parses an escape sequence. The backslash at `pos` was already
    /// consumed.
    fn escape(&mut self, pos: usize) -> Result<Escaped, SyntaxError> {
        let byte =
            self.bump().ok_or(SyntaxError::TrailingEscape { pos })?;

        Ok(match byte {
            b'd' => Escaped::Class(ByteClass::digit()),
            b'D' => Escaped::Class(ByteClass::digit().negated()),
            b'w' => Escaped::Class(ByteClass::word()),
            b'W' => Escaped::Class(ByteClass::word().negated()),
            b's' => Escaped::Class(ByteClass::space()),
            b'S' => Escaped::Class(ByteClass::space().negated()),
            b'n' => Escaped::Byte(b'\n'),
            b'r' => Escaped::Byte(b'\r'),
            b't' => Escaped::Byte(b'\t'),
            b'.' | b'+' | b'*' | b'?' | b'|' | b'\\' | b'(' | b')' | b'['
            | b']' | b'{' | b'}' | b'^' | b'$' | b'-' | b'/' => {
                Escaped::Byte(byte)
            }
            _ => return Err(SyntaxError::InvalidEscape { pos, byte }),
        })
    }

    /// Parses a bracketed class. The opening bracket at `open` was already
    /// consumed.
    fn class(&mut self, open: usize) -> Result<ByteClass, SyntaxError> {
        let negated = if self.peek() == Some(b'^') {
            self.pos += 1;
            true
        } else {
            false
        };

        let mut class = ByteClass::empty();
        let mut first = true;

        loop {
            let pos = self.pos;
            let low = match self.bump() {
                None => return Err(SyntaxError::UnclosedClass { pos: open }),
                // A `]` right after the opening bracket is a literal.
                Some(b']') if !first => break,
                Some(b'\\') => match self.escape(pos)? {
                    Escaped::Byte(b) => b,
                    Escaped::Class(c) => {
                        class.union(&c);
                        first = false;
                        continue;
                    }
                },
                Some(b) => b,
            };

            first = false;

            // A `-` that is followed by `]` is a literal, as in `[a-]`.
            if self.peek() == Some(b'-')
                && !matches!(self.peek_at(1), None | Some(b']'))
            {
                self.pos += 1;
                let high_pos = self.pos;
                let high = match self.bump() {
                    Some(b'\\') => match self.escape(high_pos)? {
                        Escaped::Byte(b) => b,
                        Escaped::Class(_) => {
                            return Err(SyntaxError::InvalidClassRange {
                                pos,
                            })
                        }
                    },
                    Some(b) => b,
                    None => {
                        return Err(SyntaxError::UnclosedClass { pos: open })
                    }
                };
                if low > high {
                    return Err(SyntaxError::InvalidClassRange { pos });
                }
                class.push_range(low, high);
            } else {
                class.push(low);
            }
        }

        Ok(if negated { class.negated() } else { class })
    }
}

enum Escaped {
    Byte(u8),
    Class(ByteClass),
}
