//! Type expression decomposition.
//!
//! `HashMap<String, Vector<uint8_t>>` parses into a template node named
//! `HashMap` with two arguments. Displaying a parsed expression joins the
//! arguments back with `", "`, so parse and display round-trip modulo
//! whitespace.

use std::fmt;

use crate::error::{GenerateError, GenerateResult};

/// A parsed, possibly templated, type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// A non-templated type such as `int32_t` or `PurcFetcher::Color`.
    Leaf(String),

    /// `name<arguments...>`.
    Template {
        name: String,
        arguments: Vec<TypeExpr>,
    },
}

impl TypeExpr {
    /// Parse a type expression.
    pub fn parse(expr: &str) -> GenerateResult<Self> {
        let trimmed = expr.trim();
        if trimmed.is_empty() {
            return Err(GenerateError::malformed_type(expr, "empty type"));
        }

        let Some(open) = trimmed.find('<') else {
            if trimmed.contains('>') {
                return Err(GenerateError::malformed_type(expr, "unbalanced '>'"));
            }
            return Ok(TypeExpr::Leaf(trimmed.to_string()));
        };

        let name = trimmed[..open].trim();
        if name.is_empty() {
            return Err(GenerateError::malformed_type(expr, "missing template name"));
        }
        let Some(inner) = trimmed[open + 1..].strip_suffix('>') else {
            return Err(GenerateError::malformed_type(
                expr,
                "template arguments must close the expression",
            ));
        };

        let arguments = split_arguments(inner)
            .ok_or_else(|| GenerateError::malformed_type(expr, "unbalanced brackets"))?
            .into_iter()
            .map(|argument| {
                if argument.trim().is_empty() {
                    Err(GenerateError::malformed_type(expr, "empty template argument"))
                } else {
                    TypeExpr::parse(argument)
                }
            })
            .collect::<GenerateResult<Vec<_>>>()?;

        Ok(TypeExpr::Template {
            name: name.to_string(),
            arguments,
        })
    }

    pub fn is_template(&self) -> bool {
        matches!(self, TypeExpr::Template { .. })
    }

    /// Leaf types in left-to-right order.
    pub fn leaves(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeExpr::Leaf(name) => out.push(name),
            TypeExpr::Template { arguments, .. } => {
                for argument in arguments {
                    argument.collect_leaves(out);
                }
            }
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Leaf(name) => write!(f, "{}", name),
            TypeExpr::Template { name, arguments } => {
                write!(f, "{}<", name)?;
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", argument)?;
                }
                write!(f, ">")
            }
        }
    }
}

/// Split on commas outside of `<>` and `()`. Returns `None` when unbalanced.
fn split_arguments(inner: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth: i32 = 0;
    let mut start = 0;

    for (i, c) in inner.char_indices() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            ',' if depth == 0 => {
                parts.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return None;
    }
    parts.push(&inner[start..]);
    Some(parts)
}

/// Remove all whitespace, for comparing expressions that differ only in spacing.
pub fn squash_whitespace(expr: &str) -> String {
    expr.chars().filter(|c| !c.is_whitespace()).collect()
}
