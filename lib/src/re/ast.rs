use std::fmt::{Debug, Display, Formatter};

use bitvec::array::BitArray;
use bitvec::order::Lsb0;

/// A set of bytes matched by a single position in the subject.
///
/// The set is a 256-bits bitmap, one bit per byte. If the N-th bit is set,
/// the byte N is part of the class.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteClass(BitArray<[u8; 32], Lsb0>);

impl ByteClass {
    /// Creates an empty class.
    pub fn empty() -> Self {
        Self(BitArray::ZERO)
    }

    /// Creates a class with the bytes in the `low..=high` range.
    pub fn range(low: u8, high: u8) -> Self {
        let mut class = Self::empty();
        class.push_range(low, high);
        class
    }

    /// `\d`: ASCII digits.
    pub fn digit() -> Self {
        Self::range(b'0', b'9')
    }

    /// `\w`: ASCII letters, digits and the underscore.
    pub fn word() -> Self {
        let mut class = Self::range(b'a', b'z');
        class.push_range(b'A', b'Z');
        class.push_range(b'0', b'9');
        class.push(b'_');
        class
    }

    /// `\s`: space, `\t`, `\n`, `\v`, `\f` and `\r`.
    pub fn space() -> Self {
        let mut class = Self::range(b'\t', b'\r');
        class.push(b' ');
        class
    }

    /// Adds a single byte to the class.
    pub fn push(&mut self, byte: u8) {
        self.0.set(byte as usize, true);
    }

    /// Adds every byte in `low..=high` to the class.
    pub fn push_range(&mut self, low: u8, high: u8) {
        for byte in low..=high {
            self.push(byte);
        }
    }

    /// Adds every byte in `other` to this class.
    pub fn union(&mut self, other: &ByteClass) {
        for byte in other.0.iter_ones() {
            self.0.set(byte, true);
        }
    }

    /// Returns the complement of this class.
    pub fn negated(self) -> Self {
        Self(!self.0)
    }

    /// Returns true if the class contains the given byte.
    #[inline]
    pub fn contains(&self, byte: u8) -> bool {
        self.0[byte as usize]
    }

    /// Returns the ranges of contiguous bytes in the class, in ascending
    /// order. Both ends of each range are inclusive.
    pub fn ranges(&self) -> Vec<(u8, u8)> {
        let mut ranges: Vec<(u8, u8)> = Vec::new();
        for byte in self.0.iter_ones() {
            let byte = byte as u8;
            match ranges.last_mut() {
                Some((_, high)) if *high as usize + 1 == byte as usize => {
                    *high = byte
                }
                _ => ranges.push((byte, byte)),
            }
        }
        ranges
    }
}

impl Display for ByteClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, (low, high)) in self.ranges().into_iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            if low == high {
                write!(f, "{:#04x}", low)?;
            } else {
                write!(f, "{:#04x}-{:#04x}", low, high)?;
            }
        }
        write!(f, "]")
    }
}

impl Debug for ByteClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ByteClass{}", self)
    }
}

/// A node in the abstract syntax tree of a regular expression.
///
/// Composite nodes own their children. Capture indices in [`Node::Group`]
/// are assigned by the parser in the order in which the opening parenthesis
/// appear in the pattern, starting at 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// Matches a specific byte.
    Literal(u8),
    /// Matches any byte (`.`).
    AnyByte,
    /// Matches any byte in the class (`[a-z]`, `\d`, ...).
    Class(ByteClass),
    /// Matches at the start of the subject (`^`). Zero-width.
    Start,
    /// Matches at the end of the subject (`$`). Zero-width.
    End,
    /// A sequence of nodes that must match one after the other.
    Concat(Vec<Node>),
    /// A list of alternatives, the leftmost one is preferred.
    Alternate(Vec<Node>),
    /// Zero or more repetitions (`e*`, `e*?`).
    Star {
        /// The repeated node.
        node: Box<Node>,
        /// False for the lazy form.
        greedy: bool,
    },
    /// One or more repetitions (`e+`, `e+?`).
    Plus {
        /// The repeated node.
        node: Box<Node>,
        /// False for the lazy form.
        greedy: bool,
    },
    /// Zero or one occurrence (`e?`, `e??`).
    Optional {
        /// The optional node.
        node: Box<Node>,
        /// False for the lazy form.
        greedy: bool,
    },
    /// Bounded or unbounded counted repetition (`e{n}`, `e{n,}`, `e{n,m}`).
    Repeat {
        /// The repeated node.
        node: Box<Node>,
        /// Minimum number of repetitions.
        min: u32,
        /// Maximum number of repetitions, `None` if unbounded.
        max: Option<u32>,
        /// False for the lazy form.
        greedy: bool,
    },
    /// A parenthesized sub-expression.
    Group {
        /// The node inside the parenthesis.
        node: Box<Node>,
        /// Capture index, `None` for non-capturing groups (`(?:e)`).
        index: Option<u32>,
    },
}

impl Node {
    /// Returns the node's direct children.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Literal(_)
            | Node::AnyByte
            | Node::Class(_)
            | Node::Start
            | Node::End => &[],
            Node::Concat(nodes) | Node::Alternate(nodes) => nodes.as_slice(),
            Node::Star { node, .. }
            | Node::Plus { node, .. }
            | Node::Optional { node, .. }
            | Node::Repeat { node, .. }
            | Node::Group { node, .. } => std::slice::from_ref(node.as_ref()),
        }
    }

    /// Returns the largest capture index used in this subtree, or 0 if
    /// the subtree doesn't contain capturing groups.
    pub fn max_capture_index(&self) -> u32 {
        let mut max = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let Node::Group { index: Some(index), .. } = node {
                max = max.max(*index);
            }
            stack.extend(node.children());
        }
        max
    }

    /// Returns true if the node can match without consuming any byte, as
    /// in `a*`, `(?:a|b?)` or `^`.
    pub fn can_match_empty(&self) -> bool {
        match self {
            Node::Literal(_) | Node::AnyByte | Node::Class(_) => false,
            Node::Start | Node::End => true,
            Node::Star { .. } | Node::Optional { .. } => true,
            Node::Concat(nodes) => nodes.iter().all(Node::can_match_empty),
            Node::Alternate(nodes) => nodes.iter().any(Node::can_match_empty),
            Node::Plus { node, .. } | Node::Group { node, .. } => {
                node.can_match_empty()
            }
            Node::Repeat { node, min, .. } => {
                *min == 0 || node.can_match_empty()
            }
        }
    }
}

/// A parsed regular expression.
///
/// This is the value returned by [`crate::re::parser::Parser::parse`]. It
/// owns the root of the syntax tree together with the number of capture
/// groups in the pattern (not counting the implicit group 0 that spans the
/// whole match).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Regexp {
    pub(crate) root: Node,
    pub(crate) captures: u32,
}

impl Regexp {
    /// Creates a [`Regexp`] from a syntax tree built by hand. The number of
    /// capture groups is derived from the largest capture index in the tree.
    pub fn new(root: Node) -> Self {
        let captures = root.max_capture_index();
        Self { root, captures }
    }

    /// Root node of the syntax tree.
    #[inline]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Number of capture groups, not counting group 0.
    #[inline]
    pub fn captures(&self) -> u32 {
        self.captures
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{ByteClass, Node, Regexp};

    #[test]
    fn byte_class_ranges() {
        assert_eq!(ByteClass::digit().ranges(), vec![(b'0', b'9')]);
        assert_eq!(
            ByteClass::word().ranges(),
            vec![(b'0', b'9'), (b'A', b'Z'), (b'_', b'_'), (b'a', b'z')]
        );
        assert_eq!(
            ByteClass::space().ranges(),
            vec![(b'\t', b'\r'), (b' ', b' ')]
        );
        assert_eq!(
            ByteClass::digit().negated().ranges(),
            vec![(0x00, b'0' - 1), (b'9' + 1, 0xff)]
        );
    }

    #[test]
    fn byte_class_display() {
        let mut class = ByteClass::range(b'a', b'c');
        class.push(b'x');
        assert_eq!(class.to_string(), "[0x61-0x63 0x78]");
        assert!(class.contains(b'b'));
        assert!(!class.contains(b'd'));
    }

    #[test]
    fn captures_from_tree() {
        let re = Regexp::new(Node::Concat(vec![
            Node::Group {
                node: Box::new(Node::Literal(b'a')),
                index: Some(1),
            },
            Node::Group {
                node: Box::new(Node::Group {
                    node: Box::new(Node::Literal(b'b')),
                    index: Some(3),
                }),
                index: None,
            },
        ]));
        assert_eq!(re.captures(), 3);
    }

    #[test]
    fn can_match_empty() {
        let lit = |b| Box::new(Node::Literal(b));
        let repeat = |min, max| Node::Repeat {
            node: lit(b'a'),
            min,
            max,
            greedy: true,
        };

        assert!(!Node::Literal(b'a').can_match_empty());
        assert!(Node::End.can_match_empty());
        assert!(Node::Star { node: lit(b'a'), greedy: true }
            .can_match_empty());
        assert!(!Node::Plus { node: lit(b'a'), greedy: true }
            .can_match_empty());
        assert!(repeat(0, None).can_match_empty());
        assert!(!repeat(1, Some(3)).can_match_empty());
        assert!(Node::Alternate(vec![
            Node::Literal(b'a'),
            Node::Optional { node: lit(b'b'), greedy: false },
        ])
        .can_match_empty());
        assert!(!Node::Concat(vec![Node::Start, Node::Literal(b'a')])
            .can_match_empty());
    }
}
