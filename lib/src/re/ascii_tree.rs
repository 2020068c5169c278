/*! Functions that return an ASCII representation of regexp syntax trees.*/

use std::fmt::{Display, Formatter};

use ::ascii_tree::Tree;
use ::ascii_tree::Tree::{Leaf, Node as TreeNode};

use crate::re::ast::{Node, Regexp};

/// Returns a representation of the node as an ASCII tree.
pub(crate) fn node_ascii_tree(node: &Node) -> Tree {
    match node {
        Node::Literal(byte) => Leaf(vec![literal_label(*byte)]),
        Node::AnyByte => Leaf(vec!["any_byte".to_string()]),
        Node::Class(class) => Leaf(vec![format!("class {}", class)]),
        Node::Start => Leaf(vec!["start".to_string()]),
        Node::End => Leaf(vec!["end".to_string()]),
        Node::Concat(nodes) => TreeNode(
            "concat".to_string(),
            nodes.iter().map(node_ascii_tree).collect(),
        ),
        Node::Alternate(nodes) => TreeNode(
            "alternate".to_string(),
            nodes.iter().map(node_ascii_tree).collect(),
        ),
        Node::Star { node, greedy } => TreeNode(
            quantifier_label("star", *greedy),
            vec![node_ascii_tree(node)],
        ),
        Node::Plus { node, greedy } => TreeNode(
            quantifier_label("plus", *greedy),
            vec![node_ascii_tree(node)],
        ),
        Node::Optional { node, greedy } => TreeNode(
            quantifier_label("optional", *greedy),
            vec![node_ascii_tree(node)],
        ),
        Node::Repeat { node, min, max, greedy } => {
            let bounds = match max {
                Some(max) if max == min => format!("repeat {{{}}}", min),
                Some(max) => format!("repeat {{{},{}}}", min, max),
                None => format!("repeat {{{},}}", min),
            };
            TreeNode(
                quantifier_label(&bounds, *greedy),
                vec![node_ascii_tree(node)],
            )
        }
        Node::Group { node, index: Some(index) } => {
            TreeNode(format!("group {}", index), vec![node_ascii_tree(node)])
        }
        Node::Group { node, index: None } => TreeNode(
            "group (non-capturing)".to_string(),
            vec![node_ascii_tree(node)],
        ),
    }
}

fn literal_label(byte: u8) -> String {
    if byte.is_ascii_graphic() {
        format!("literal {:#04x} '{}'", byte, byte as char)
    } else {
        format!("literal {:#04x}", byte)
    }
}

fn quantifier_label(name: &str, greedy: bool) -> String {
    if greedy {
        name.to_string()
    } else {
        format!("{} (lazy)", name)
    }
}

impl Regexp {
    /// Returns a printable ASCII tree representing the syntax tree.
    pub fn ascii_tree(&self) -> Tree {
        TreeNode(
            format!("regexp ({} captures)", self.captures),
            vec![node_ascii_tree(&self.root)],
        )
    }
}

impl Display for Regexp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        ::ascii_tree::write_tree(f, &self.ascii_tree())
    }
}
