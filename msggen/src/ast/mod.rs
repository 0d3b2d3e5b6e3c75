//! Source IR for generated C++.
//!
//! Emitters build trees of [`Node`]s and hand them to a [`Formatter`], which
//! owns indentation, preprocessor placement and line endings. Guards,
//! namespaces and include blocks are expressed once here instead of being
//! spelled out by every emitter.

mod format;

pub use format::{Formatter, IndentStyle, LineEnding};

use crate::resolver::Header;

/// One piece of generated source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A statement or declaration line at the current depth.
    Line(String),

    /// A line written at column zero regardless of depth.
    Raw(String),

    /// An empty line.
    Blank,

    /// An access specifier or `case` label, one level left of its siblings.
    Label(String),

    /// Children one level deeper, without braces.
    Indented(Vec<Node>),

    /// `head {` children `}` followed by `terminator` (`;` for classes and enums).
    Braced {
        head: String,
        body: Vec<Node>,
        terminator: &'static str,
    },

    /// A function definition with the opening brace on its own line.
    Function {
        signature: String,
        initializer: Option<String>,
        body: Vec<Node>,
    },

    /// `namespace name {` children `} // namespace name`, not indented.
    Namespace { name: String, body: Vec<Node> },

    /// `#if condition` children `#endif`. No condition means no guard.
    Guarded {
        condition: Option<String>,
        body: Vec<Node>,
        /// Repeat the condition after `#endif`.
        annotate_end: bool,
    },

    /// `#include` of a header.
    Include(Header),
}

impl Node {
    pub fn line(text: impl Into<String>) -> Self {
        Node::Line(text.into())
    }

    pub fn raw(text: impl Into<String>) -> Self {
        Node::Raw(text.into())
    }

    pub fn label(text: impl Into<String>) -> Self {
        Node::Label(text.into())
    }

    /// A braced block with no terminator, such as an `if` or `switch`.
    pub fn block(head: impl Into<String>, body: Vec<Node>) -> Self {
        Node::Braced {
            head: head.into(),
            body,
            terminator: "",
        }
    }

    /// A braced type body ending in `};`.
    pub fn type_body(head: impl Into<String>, body: Vec<Node>) -> Self {
        Node::Braced {
            head: head.into(),
            body,
            terminator: ";",
        }
    }

    pub fn function(signature: impl Into<String>, body: Vec<Node>) -> Self {
        Node::Function {
            signature: signature.into(),
            initializer: None,
            body,
        }
    }

    pub fn namespace(name: impl Into<String>, body: Vec<Node>) -> Self {
        Node::Namespace {
            name: name.into(),
            body,
        }
    }

    /// Wrap `body` in `condition` when present.
    pub fn guarded(condition: Option<&str>, body: Vec<Node>) -> Self {
        Node::Guarded {
            condition: condition.map(str::to_string),
            body,
            annotate_end: false,
        }
    }

    /// Wrap `body` in each present condition, outermost first.
    pub fn nested_guards(conditions: &[Option<&str>], body: Vec<Node>) -> Vec<Node> {
        let mut nodes = body;
        for condition in conditions.iter().rev().flatten() {
            nodes = vec![Node::guarded(Some(*condition), nodes)];
        }
        nodes
    }

    /// `#include` lines, each under its own guard.
    pub fn includes(headers: Vec<(Header, Option<String>)>) -> Vec<Node> {
        headers
            .into_iter()
            .map(|(header, condition)| Node::Guarded {
                condition,
                body: vec![Node::Include(header)],
                annotate_end: false,
            })
            .collect()
    }
}

/// Join blocks with a blank line between each pair.
pub fn separated(blocks: impl IntoIterator<Item = Node>) -> Vec<Node> {
    let mut out = Vec::new();
    for (i, block) in blocks.into_iter().enumerate() {
        if i > 0 {
            out.push(Node::Blank);
        }
        out.push(block);
    }
    out
}
