//! Whole-run generation: every receiver's artifacts plus the registry.

use tracing::{debug, warn};

use crate::ast::{Formatter, IndentStyle, LineEnding, Node};
use crate::emit::dispatch::{DispatchEmitter, DEFAULT_APPLICATION_NAMESPACE};
use crate::emit::header::{messages_header, replies_header};
use crate::emit::{
    messages_header_name, receiver_implementation_name, replies_header_name, MessageRegistry,
    MESSAGE_NAMES_HEADER, MESSAGE_NAMES_IMPLEMENTATION,
};
use crate::error::GenerateResult;
use crate::model::Receiver;
use crate::resolver::{TypeResolver, TypeTable};

/// Output options for a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Text placed verbatim at the top of every artifact.
    pub license_header: Option<String>,

    pub indent: IndentStyle,

    pub line_ending: LineEnding,

    /// Namespace the receiver classes and their dispatch functions live in.
    pub application_namespace: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            license_header: None,
            indent: IndentStyle::default(),
            line_ending: LineEnding::default(),
            application_namespace: DEFAULT_APPLICATION_NAMESPACE.to_string(),
        }
    }
}

impl GeneratorConfig {
    pub fn with_license_header(mut self, header: impl Into<String>) -> Self {
        self.license_header = Some(header.into());
        self
    }

    pub fn with_indent(mut self, indent: IndentStyle) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    pub fn with_application_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.application_namespace = namespace.into();
        self
    }
}

/// What a generated file contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    MessagesHeader,
    RepliesHeader,
    MessageReceiver,
    MessageNamesHeader,
    MessageNamesImplementation,
}

/// One rendered artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub file_name: String,
    pub kind: ArtifactKind,
    pub content: String,
}

/// Every artifact of a run, receivers in input order followed by the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedOutput {
    pub files: Vec<GeneratedFile>,
}

impl GeneratedOutput {
    /// Find an artifact by file name.
    pub fn get(&self, file_name: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.file_name == file_name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Turns a set of receivers into source artifacts.
///
/// Generation is all-or-nothing: the registry is validated and every
/// artifact rendered in memory before anything is returned.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: GeneratorConfig,
    resolver: TypeResolver,
}

impl Generator {
    /// Create a generator with the built-in type table.
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            resolver: TypeResolver::default(),
        }
    }

    /// Replace the type table.
    pub fn with_type_table(mut self, table: TypeTable) -> Self {
        self.resolver = TypeResolver::new(table);
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate every artifact for `receivers`.
    pub fn generate(&self, receivers: &[Receiver]) -> GenerateResult<GeneratedOutput> {
        let registry = MessageRegistry::build(receivers)?;
        let dispatch = DispatchEmitter::new(&self.resolver)
            .with_application_namespace(self.config.application_namespace.clone());

        let mut output = GeneratedOutput::default();
        for receiver in receivers {
            debug!(receiver = %receiver.name, messages = receiver.messages.len(), "generating receiver");
            if receiver.messages.is_empty() {
                warn!(receiver = %receiver.name, "receiver declares no messages");
            }

            output.files.push(self.render(
                messages_header_name(receiver),
                ArtifactKind::MessagesHeader,
                messages_header(&self.resolver, receiver)?,
            ));
            output.files.push(self.render(
                replies_header_name(receiver),
                ArtifactKind::RepliesHeader,
                replies_header(&self.resolver, receiver)?,
            ));
            output.files.push(self.render(
                receiver_implementation_name(receiver),
                ArtifactKind::MessageReceiver,
                dispatch.receiver_implementation(receiver)?,
            ));
        }

        output.files.push(self.render(
            MESSAGE_NAMES_HEADER.to_string(),
            ArtifactKind::MessageNamesHeader,
            registry.header(),
        ));
        output.files.push(self.render(
            MESSAGE_NAMES_IMPLEMENTATION.to_string(),
            ArtifactKind::MessageNamesImplementation,
            registry.implementation(),
        ));

        debug!(
            files = output.files.len(),
            messages = registry.max_message_id(),
            "generation complete"
        );
        Ok(output)
    }

    fn render(&self, file_name: String, kind: ArtifactKind, body: Vec<Node>) -> GeneratedFile {
        let mut nodes = Vec::with_capacity(body.len() + 2);
        if let Some(license) = &self.config.license_header {
            nodes.push(Node::raw(license.trim_end()));
            nodes.push(Node::Blank);
        }
        nodes.extend(body);

        let formatter = Formatter::new(self.config.indent, self.config.line_ending);
        GeneratedFile {
            file_name,
            kind,
            content: formatter.render(&nodes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Message, Parameter};

    #[test]
    fn test_artifact_names_and_order() {
        let receivers = vec![
            Receiver::new("Foo").with_message(Message::new("Bar")),
            Receiver::new("Qux").with_message(Message::new("One")),
        ];
        let output = Generator::default().generate(&receivers).unwrap();
        let names: Vec<&str> = output.files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "FooMessages.h",
                "FooMessagesReplies.h",
                "FooMessageReceiver.cpp",
                "QuxMessages.h",
                "QuxMessagesReplies.h",
                "QuxMessageReceiver.cpp",
                "MessageNames.h",
                "MessageNames.cpp",
            ]
        );
        assert_eq!(
            output.get("MessageNames.cpp").map(|f| f.kind),
            Some(ArtifactKind::MessageNamesImplementation)
        );
    }

    #[test]
    fn test_unknown_template_produces_nothing() {
        let receivers = vec![Receiver::new("Foo")
            .with_message(Message::new("Bar").with_parameter(Parameter::new("x", "Frob<int>")))];
        let err = Generator::default().generate(&receivers).unwrap_err();
        assert_eq!(err.to_string(), "no class template type is defined for 'Frob<int>'");
    }

    #[test]
    fn test_license_header_and_line_endings() {
        let config = GeneratorConfig::default()
            .with_license_header("// Copyright Example\n")
            .with_line_ending(LineEnding::CrLf)
            .with_indent(IndentStyle::Tabs);
        let receivers = vec![Receiver::new("Foo").with_message(Message::new("Bar"))];
        let output = Generator::new(config).generate(&receivers).unwrap();

        for file in &output.files {
            assert!(file.content.starts_with("// Copyright Example\r\n\r\n"), "{}", file.file_name);
            assert!(!file.content.replace("\r\n", "").contains('\n'), "{}", file.file_name);
        }
        let header = output.get("FooMessages.h").unwrap();
        assert!(header.content.contains("\r\n\treturn IPC::ReceiverName::Foo;\r\n"));
    }
}
