//! Include and forward-declaration sets.

use std::collections::{BTreeMap, BTreeSet};

use super::table::{Header, TypeTable};
use crate::model::ParameterKind;

/// Headers together with the guards of everything that required them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionalHeaders {
    entries: BTreeMap<Header, Contributors>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Contributors {
    /// At least one contributor was unconditional.
    Always,
    Guarded(BTreeSet<String>),
}

impl ConditionalHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `header` is needed under `condition` (`None` means always).
    pub fn add(&mut self, header: Header, condition: Option<&str>) {
        let entry = self
            .entries
            .entry(header)
            .or_insert_with(|| Contributors::Guarded(BTreeSet::new()));
        match condition {
            None => *entry = Contributors::Always,
            Some(condition) => {
                if let Contributors::Guarded(conditions) = entry {
                    conditions.insert(condition.to_string());
                }
            }
        }
    }

    pub fn add_all(&mut self, headers: impl IntoIterator<Item = Header>, condition: Option<&str>) {
        for header in headers {
            self.add(header, condition);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Headers in include order with the guard each one gets in a
    /// generated header.
    ///
    /// A header with fixed platform conditions in the table uses those.
    /// Otherwise it is guarded as in [`ConditionalHeaders::resolve_parameter_guards`].
    pub fn resolve(&self, table: &TypeTable) -> Vec<(Header, Option<String>)> {
        self.entries
            .iter()
            .map(|(header, contributors)| {
                let guard = match table.header_conditions.get(header) {
                    Some(fixed) if !fixed.is_empty() => {
                        let fixed: BTreeSet<&str> = fixed.iter().map(String::as_str).collect();
                        Some(join_conditions(fixed))
                    }
                    _ => contributors.guard(),
                };
                (header.clone(), guard)
            })
            .collect()
    }

    /// Headers in include order, guarded only by the parameters that
    /// required them.
    ///
    /// A header is unguarded if any contributor was unconditional, and
    /// guarded by the OR of the distinct contributor conditions if not.
    /// Implementation files include this way.
    pub fn resolve_parameter_guards(&self) -> Vec<(Header, Option<String>)> {
        self.entries
            .iter()
            .map(|(header, contributors)| (header.clone(), contributors.guard()))
            .collect()
    }
}

impl Contributors {
    fn guard(&self) -> Option<String> {
        match self {
            Contributors::Always => None,
            Contributors::Guarded(conditions) if conditions.is_empty() => None,
            Contributors::Guarded(conditions) => {
                Some(join_conditions(conditions.iter().map(String::as_str)))
            }
        }
    }
}

fn join_conditions<'a>(conditions: impl IntoIterator<Item = &'a str>) -> String {
    conditions.into_iter().collect::<Vec<_>>().join(" || ")
}

/// A namespace-scoped forward declaration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ForwardDeclaration {
    pub namespace: String,
    pub name: String,
    pub kind: ParameterKind,
}

impl ForwardDeclaration {
    /// The declaration without its trailing semicolon.
    pub fn render(&self) -> String {
        match &self.kind {
            ParameterKind::Class => format!("class {}", self.name),
            ParameterKind::Struct => format!("struct {}", self.name),
            ParameterKind::Enum { underlying } => {
                format!("enum class {} : {}", self.name, underlying)
            }
        }
    }
}

/// Forward declarations grouped by namespace, sorted by namespace then name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardDeclarations {
    by_namespace: BTreeMap<String, BTreeSet<(String, ParameterKind)>>,
}

impl ForwardDeclarations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, declaration: ForwardDeclaration) {
        self.by_namespace
            .entry(declaration.namespace)
            .or_default()
            .insert((declaration.name, declaration.kind));
    }

    pub fn is_empty(&self) -> bool {
        self.by_namespace.is_empty()
    }

    /// Each namespace with its declarations, both in sorted order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, Vec<ForwardDeclaration>)> + '_ {
        self.by_namespace.iter().map(|(namespace, entries)| {
            let declarations = entries
                .iter()
                .map(|(name, kind)| ForwardDeclaration {
                    namespace: namespace.clone(),
                    name: name.clone(),
                    kind: kind.clone(),
                })
                .collect();
            (namespace.as_str(), declarations)
        })
    }
}
