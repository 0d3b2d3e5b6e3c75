//! Type resolver.
//!
//! Decides, for each parameter type, whether generated headers can get away
//! with a forward declaration or need a full include, which headers declare
//! the type and its argument coders, and how the type is passed in
//! generated signatures. All type-specific knowledge lives in the
//! [`TypeTable`]; this module only applies it.

pub mod headers;
pub mod table;
pub mod type_expr;

pub use headers::{ConditionalHeaders, ForwardDeclaration, ForwardDeclarations};
pub use table::{Header, TemplateEntry, TemplateInfo, TypeTable, TypeTableExtension};
pub use type_expr::TypeExpr;

use std::borrow::Cow;

use tracing::trace;

use crate::error::{GenerateError, GenerateResult};
use crate::model::{Parameter, ParameterKind};

/// Flattened decomposition of a type expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Table entries of every template in the expression, outermost first.
    pub templates: Vec<TemplateInfo>,

    /// Non-templated types, left to right.
    pub leaf_types: Vec<String>,
}

/// How a header makes a parameter type available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationStrategy {
    /// A namespace-scoped forward declaration is enough.
    Forward(ForwardDeclaration),

    /// The type's headers must be included.
    Include,

    /// Unqualified type assumed to be visible already.
    Visible,
}

/// Applies a [`TypeTable`] to type expressions.
#[derive(Debug, Clone, Default)]
pub struct TypeResolver {
    table: TypeTable,
}

impl TypeResolver {
    /// Create a resolver over the given table.
    pub fn new(table: TypeTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &TypeTable {
        &self.table
    }

    /// Decompose a type expression into template entries and leaf types.
    ///
    /// Fails with [`GenerateError::UnknownTemplate`] when any template in
    /// the expression is missing from the table.
    pub fn classify(&self, type_expr: &str) -> GenerateResult<Classification> {
        let parsed = TypeExpr::parse(type_expr)?;
        let mut classification = Classification::default();
        self.classify_into(&parsed, &mut classification)?;
        trace!(
            type_expr,
            templates = classification.templates.len(),
            leaves = ?classification.leaf_types,
            "classified type"
        );
        Ok(classification)
    }

    fn classify_into(&self, expr: &TypeExpr, out: &mut Classification) -> GenerateResult<()> {
        match expr {
            TypeExpr::Leaf(name) => out.leaf_types.push(name.clone()),
            TypeExpr::Template { name, arguments } => {
                let info = self
                    .table
                    .template(name)
                    .ok_or_else(|| GenerateError::unknown_template(expr.to_string()))?;
                out.templates.push(info.clone());
                for argument in arguments {
                    self.classify_into(argument, out)?;
                }
            }
        }
        Ok(())
    }

    /// Whether a type can be forward-declared instead of included.
    ///
    /// Templates, types listed as needing a full definition, and nested
    /// names (`A::B::C`) cannot be.
    pub fn is_forward_declarable(&self, type_name: &str) -> bool {
        !type_name.contains('<')
            && !self.table.no_forward_declaration.contains(type_name)
            && self.qualified(type_name).split("::").count() <= 2
    }

    /// The forward declaration for a `Namespace::Type`, if it can have one.
    ///
    /// Known `WTF` types count as `WTF::Type` when written bare.
    pub fn forward_declaration(
        &self,
        type_name: &str,
        kind: &ParameterKind,
    ) -> Option<ForwardDeclaration> {
        if !self.is_forward_declarable(type_name) {
            return None;
        }
        let qualified = self.qualified(type_name);
        let (namespace, name) = qualified.split_once("::")?;
        Some(ForwardDeclaration {
            namespace: namespace.to_string(),
            name: name.to_string(),
            kind: kind.clone(),
        })
    }

    fn qualified<'t>(&self, type_name: &'t str) -> Cow<'t, str> {
        let outer = type_name.split("::").next().unwrap_or(type_name);
        if self.table.wtf_types.contains(outer) {
            Cow::Owned(format!("WTF::{}", type_name))
        } else {
            Cow::Borrowed(type_name)
        }
    }

    /// How a declaration header should make `type_name` available.
    pub fn declaration_strategy(&self, type_name: &str, kind: &ParameterKind) -> DeclarationStrategy {
        if !self.is_forward_declarable(type_name) {
            return DeclarationStrategy::Include;
        }
        match self.forward_declaration(type_name, kind) {
            Some(declaration) => DeclarationStrategy::Forward(declaration),
            None => DeclarationStrategy::Visible,
        }
    }

    /// Headers declaring every template and leaf type of an expression.
    ///
    /// Leaf lookup tries the table first. Otherwise a qualified name
    /// `Ns::Type[::Inner]` maps to `Type.h`, quoted for the table's quoted
    /// namespaces and angle-bracketed for the rest. Unqualified names need
    /// nothing.
    pub fn headers_for(&self, type_expr: &str) -> GenerateResult<Vec<Header>> {
        let classification = self.classify(type_expr)?;
        let mut headers: Vec<Header> = classification
            .templates
            .iter()
            .flat_map(|info| info.headers.iter().cloned())
            .collect();

        for leaf in &classification.leaf_types {
            if let Some(special) = self.table.type_headers.get(leaf) {
                headers.extend(special.iter().cloned());
                continue;
            }
            let parts: Vec<&str> = leaf.split("::").collect();
            if parts.len() < 2 {
                continue;
            }
            let file = format!("{}.h", parts[1]);
            if self.table.quoted_namespaces.contains(parts[0]) {
                headers.push(Header::quoted(file));
            } else {
                headers.push(Header::system(file));
            }
        }
        Ok(headers)
    }

    /// Headers providing argument coders for an expression.
    pub fn coder_headers_for(&self, type_expr: &str) -> GenerateResult<Vec<Header>> {
        let classification = self.classify(type_expr)?;
        let mut headers: Vec<Header> = classification
            .templates
            .iter()
            .flat_map(|info| info.coder_headers.iter().cloned())
            .collect();

        for leaf in &classification.leaf_types {
            if let Some(special) = self.table.coder_headers.get(leaf) {
                headers.push(special.clone());
                continue;
            }
            if let Some((namespace, _)) = leaf.split_once("::") {
                if let Some(header) = self.table.namespace_coder_headers.get(namespace) {
                    headers.push(header.clone());
                }
            }
        }
        Ok(headers)
    }

    /// The parameter's type as written in a generated signature.
    ///
    /// Scalars and enums go by value, everything else by `const&`.
    pub fn function_parameter_type(&self, parameter: &Parameter) -> String {
        if parameter.kind.is_enum() || self.table.is_by_value(&parameter.type_name) {
            parameter.type_name.clone()
        } else {
            format!("const {}&", parameter.type_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> TypeResolver {
        TypeResolver::new(TypeTable::builtin())
    }

    #[test]
    fn test_classify_leaf() {
        let classification = resolver().classify("PurcFetcher::Color").unwrap();
        assert!(classification.templates.is_empty());
        assert_eq!(classification.leaf_types, vec!["PurcFetcher::Color"]);
    }

    #[test]
    fn test_classify_flattens_nested_templates() {
        let classification = resolver()
            .classify("HashMap<String, Vector<PurcFetcher::Color>>")
            .unwrap();
        assert_eq!(classification.templates.len(), 2);
        assert_eq!(
            classification.leaf_types,
            vec!["String", "PurcFetcher::Color"]
        );
    }

    #[test]
    fn test_unknown_template_is_fatal() {
        let err = resolver().classify("Frobnicator<int>").unwrap_err();
        match err {
            GenerateError::UnknownTemplate { type_expr } => assert_eq!(type_expr, "Frobnicator<int>"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_nested_template_names_inner_expression() {
        let err = resolver().classify("Vector<Frobnicator<int>>").unwrap_err();
        assert!(err.to_string().contains("'Frobnicator<int>'"));
    }

    #[test]
    fn test_forward_declarable() {
        let resolver = resolver();
        assert!(resolver.is_forward_declarable("PurcFetcher::Color"));
        assert!(resolver.is_forward_declarable("int32_t"));
        assert!(!resolver.is_forward_declarable("Vector<int32_t>"));
        assert!(!resolver.is_forward_declarable("String"));
        assert!(!resolver.is_forward_declarable("PurcFetcher::PageIdentifier"));
        assert!(!resolver.is_forward_declarable("PurcFetcher::Outer::Inner"));
    }

    #[test]
    fn test_declaration_strategy() {
        let resolver = resolver();
        assert_eq!(
            resolver.declaration_strategy("PurcFetcher::Rect", &ParameterKind::Struct),
            DeclarationStrategy::Forward(ForwardDeclaration {
                namespace: "PurcFetcher".to_string(),
                name: "Rect".to_string(),
                kind: ParameterKind::Struct,
            })
        );
        assert_eq!(
            resolver.declaration_strategy("int32_t", &ParameterKind::Class),
            DeclarationStrategy::Visible
        );
        assert_eq!(
            resolver.declaration_strategy("Vector<int32_t>", &ParameterKind::Class),
            DeclarationStrategy::Include
        );
    }

    #[test]
    fn test_bare_wtf_types() {
        let resolver = resolver();
        assert_eq!(
            resolver.declaration_strategy("MediaType", &ParameterKind::Class),
            DeclarationStrategy::Forward(ForwardDeclaration {
                namespace: "WTF".to_string(),
                name: "MediaType".to_string(),
                kind: ParameterKind::Class,
            })
        );
        assert_eq!(
            resolver.declaration_strategy("String", &ParameterKind::Class),
            DeclarationStrategy::Include
        );
        assert!(!resolver.is_forward_declarable("MediaType::Inner"));
        assert_eq!(
            resolver.declaration_strategy("Widget", &ParameterKind::Class),
            DeclarationStrategy::Visible
        );
    }

    #[test]
    fn test_headers_for_conventions() {
        let resolver = resolver();
        assert_eq!(
            resolver.headers_for("PurcFetcher::Color").unwrap(),
            vec![Header::quoted("Color.h")]
        );
        assert_eq!(
            resolver.headers_for("IPC::Attachment").unwrap(),
            vec![Header::quoted("Attachment.h")]
        );
        assert_eq!(
            resolver.headers_for("WTF::URL").unwrap(),
            vec![Header::system("URL.h")]
        );
        assert!(resolver.headers_for("int32_t").unwrap().is_empty());
    }

    #[test]
    fn test_headers_for_special_cases_and_templates() {
        let headers = resolver()
            .headers_for("Vector<std::pair<String, IPC::SharedBufferDataReference>>")
            .unwrap();
        assert_eq!(
            headers,
            vec![
                Header::system("wtf/Vector.h"),
                Header::system("utility"),
                Header::system("wtf/text/WTFString.h"),
                Header::quoted("SharedBufferDataReference.h"),
                Header::quoted("DataReference.h"),
            ]
        );
    }

    #[test]
    fn test_nested_type_header_uses_first_component() {
        assert_eq!(
            resolver().headers_for("PurcFetcher::Outer::Inner").unwrap(),
            vec![Header::quoted("Outer.h")]
        );
    }

    #[test]
    fn test_coder_headers() {
        let resolver = resolver();
        assert_eq!(
            resolver.coder_headers_for("Optional<String>").unwrap(),
            vec![Header::quoted("ArgumentCoders.h"), Header::quoted("ArgumentCoders.h")]
        );
        assert_eq!(
            resolver.coder_headers_for("PurcFetcher::Color").unwrap(),
            vec![Header::quoted("WebCoreArgumentCoders.h")]
        );
        assert!(resolver.coder_headers_for("IPC::Attachment").unwrap().is_empty());
    }

    #[test]
    fn test_function_parameter_type() {
        let resolver = resolver();
        assert_eq!(
            resolver.function_parameter_type(&Parameter::new("x", "int32_t")),
            "int32_t"
        );
        assert_eq!(
            resolver.function_parameter_type(&Parameter::new("s", "String")),
            "const String&"
        );
        assert_eq!(
            resolver.function_parameter_type(
                &Parameter::new("m", "PurcFetcher::Mode").with_kind(ParameterKind::enumeration("uint8_t"))
            ),
            "PurcFetcher::Mode"
        );
    }

    #[test]
    fn test_extension_makes_template_known() {
        let mut extension = TypeTableExtension::default();
        extension.templates.insert(
            "Frobnicator".to_string(),
            TemplateEntry {
                headers: vec!["<Frobnicator.h>".to_string()],
                coder_headers: Vec::new(),
            },
        );
        let resolver = TypeResolver::new(TypeTable::builtin().with_extension(extension).unwrap());
        assert_eq!(
            resolver.headers_for("Frobnicator<int>").unwrap(),
            vec![Header::system("Frobnicator.h")]
        );
    }
}

#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_known_template() -> impl Strategy<Value = &'static str> {
        prop_oneof![
            Just("Vector"),
            Just("Optional"),
            Just("HashSet"),
            Just("OptionSet"),
        ]
    }

    proptest! {
        /// Wrapping a leaf in a known template adds exactly one template
        /// entry and keeps the leaf.
        #[test]
        fn prop_known_template_preserves_leaf(
            template in arb_known_template(),
            leaf in "[A-Z][a-zA-Z0-9]{0,9}::[A-Z][a-zA-Z0-9]{0,9}",
        ) {
            let resolver = TypeResolver::new(TypeTable::builtin());
            let classification = resolver.classify(&format!("{}<{}>", template, leaf)).unwrap();
            prop_assert_eq!(classification.templates.len(), 1);
            prop_assert_eq!(classification.leaf_types, vec![leaf]);
        }

        /// Any template name missing from the table aborts classification.
        #[test]
        fn prop_unknown_template_rejected(name in "Zz[a-zA-Z0-9]{0,9}") {
            let resolver = TypeResolver::new(TypeTable::builtin());
            let expr = format!("{}<int32_t>", name);
            let is_unknown_template = matches!(
                resolver.classify(&expr),
                Err(GenerateError::UnknownTemplate { .. })
            );
            prop_assert!(is_unknown_template);
        }

        /// Templated types are never forward-declarable.
        #[test]
        fn prop_templates_not_forward_declarable(leaf in "[A-Z][a-zA-Z0-9]{0,9}") {
            let resolver = TypeResolver::new(TypeTable::builtin());
            let templated = format!("Vector<{}>", leaf);
            prop_assert!(!resolver.is_forward_declarable(&templated));
        }
    }
}
