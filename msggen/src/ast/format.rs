//! Rendering of [`Node`] trees to text.

use serde::Deserialize;

use super::Node;

/// Indentation style for generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndentStyle {
    /// Use 2 spaces for indentation
    Spaces2,

    /// Use 4 spaces for indentation (default)
    #[default]
    Spaces4,

    /// Use tabs for indentation
    Tabs,
}

impl IndentStyle {
    /// Get the indentation string.
    pub fn as_str(&self) -> &str {
        match self {
            IndentStyle::Spaces2 => "  ",
            IndentStyle::Spaces4 => "    ",
            IndentStyle::Tabs => "\t",
        }
    }

    /// Create an indentation string for the given depth.
    pub fn indent(&self, depth: usize) -> String {
        self.as_str().repeat(depth)
    }
}

/// Line ending style for generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// Unix-style line endings (LF)
    #[default]
    Lf,

    /// Windows-style line endings (CRLF)
    CrLf,
}

impl LineEnding {
    /// Get the line ending string.
    pub fn as_str(&self) -> &str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Single formatting pass over a node tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct Formatter {
    indent: IndentStyle,
    line_ending: LineEnding,
}

impl Formatter {
    pub fn new(indent: IndentStyle, line_ending: LineEnding) -> Self {
        Self {
            indent,
            line_ending,
        }
    }

    /// Render nodes into a string, each line terminated by the line ending.
    pub fn render(&self, nodes: &[Node]) -> String {
        let mut lines = Vec::new();
        self.render_nodes(nodes, 0, &mut lines);

        let ending = self.line_ending.as_str();
        let mut out = String::with_capacity(lines.iter().map(|l| l.len() + ending.len()).sum());
        for line in lines {
            out.push_str(&line);
            out.push_str(ending);
        }
        out
    }

    fn render_nodes(&self, nodes: &[Node], depth: usize, out: &mut Vec<String>) {
        for node in nodes {
            self.render_node(node, depth, out);
        }
    }

    fn render_node(&self, node: &Node, depth: usize, out: &mut Vec<String>) {
        match node {
            Node::Line(text) => out.push(self.indented(depth, text)),
            Node::Raw(text) => out.extend(text.lines().map(str::to_string)),
            Node::Blank => out.push(String::new()),
            Node::Label(text) => out.push(self.indented(depth.saturating_sub(1), text)),
            Node::Indented(body) => self.render_nodes(body, depth + 1, out),
            Node::Braced {
                head,
                body,
                terminator,
            } => {
                out.push(self.indented(depth, &format!("{} {{", head)));
                self.render_nodes(body, depth + 1, out);
                out.push(self.indented(depth, &format!("}}{}", terminator)));
            }
            Node::Function {
                signature,
                initializer,
                body,
            } => {
                out.push(self.indented(depth, signature));
                if let Some(initializer) = initializer {
                    out.push(self.indented(depth + 1, initializer));
                }
                out.push(self.indented(depth, "{"));
                self.render_nodes(body, depth + 1, out);
                out.push(self.indented(depth, "}"));
            }
            Node::Namespace { name, body } => {
                out.push(self.indented(depth, &format!("namespace {} {{", name)));
                self.render_nodes(body, depth, out);
                out.push(self.indented(depth, &format!("}} // namespace {}", name)));
            }
            Node::Guarded {
                condition: None,
                body,
                ..
            } => self.render_nodes(body, depth, out),
            Node::Guarded {
                condition: Some(condition),
                body,
                annotate_end,
            } => {
                out.push(format!("#if {}", condition));
                self.render_nodes(body, depth, out);
                if *annotate_end {
                    out.push(format!("#endif // {}", condition));
                } else {
                    out.push("#endif".to_string());
                }
            }
            Node::Include(header) => out.push(format!("#include {}", header)),
        }
    }

    fn indented(&self, depth: usize, text: &str) -> String {
        if text.is_empty() {
            String::new()
        } else {
            format!("{}{}", self.indent.indent(depth), text)
        }
    }
}
