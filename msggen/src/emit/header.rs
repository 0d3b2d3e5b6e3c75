//! Primary (`<R>Messages.h`) and reply (`<R>MessagesReplies.h`) headers.

use tracing::trace;

use super::declaration::{message_declaration, reply_declaration};
use super::{messages_namespace, receiver_guard, replies_header_name, MESSAGE_NAMES_HEADER};
use crate::ast::{separated, Node};
use crate::error::GenerateResult;
use crate::model::{Parameter, Receiver};
use crate::resolver::{
    ConditionalHeaders, DeclarationStrategy, ForwardDeclarations, Header, TypeResolver,
};

/// Includes and forward declarations a header needs for its parameters.
#[derive(Debug, Default)]
struct Dependencies {
    headers: ConditionalHeaders,
    declarations: ForwardDeclarations,
}

impl Dependencies {
    fn collect<'a>(
        resolver: &TypeResolver,
        base: Vec<Header>,
        parameters: impl Iterator<Item = (&'a Parameter, Option<&'a str>)>,
    ) -> GenerateResult<Self> {
        let mut dependencies = Self::default();
        dependencies.headers.add_all(base, None);

        for (parameter, condition) in parameters {
            match resolver.declaration_strategy(&parameter.type_name, &parameter.kind) {
                DeclarationStrategy::Forward(declaration) => {
                    dependencies.declarations.insert(declaration)
                }
                DeclarationStrategy::Include => {
                    let headers = resolver.headers_for(&parameter.type_name)?;
                    dependencies.headers.add_all(headers, condition);
                }
                DeclarationStrategy::Visible => {}
            }
        }
        Ok(dependencies)
    }

    /// Guarded includes, then one namespace block per group of forward
    /// declarations.
    fn into_nodes(self, resolver: &TypeResolver) -> Vec<Node> {
        let mut nodes = Node::includes(self.headers.resolve(resolver.table()));
        nodes.push(Node::Blank);

        if !self.declarations.is_empty() {
            let blocks = self.declarations.groups().map(|(namespace, declarations)| {
                Node::namespace(
                    namespace,
                    declarations
                        .iter()
                        .map(|d| Node::line(format!("{};", d.render())))
                        .collect(),
                )
            });
            nodes.extend(separated(blocks));
            nodes.push(Node::Blank);
        }
        nodes
    }
}

fn header_file(receiver: &Receiver, dependencies: Vec<Node>, namespace_body: Vec<Node>) -> Vec<Node> {
    let mut body = dependencies;
    body.push(messages_namespace(receiver, namespace_body));

    let mut nodes = vec![Node::raw("#pragma once"), Node::Blank];
    nodes.extend(receiver_guard(receiver, body));
    nodes
}

/// The primary header: every message wrapper class of a receiver.
pub fn messages_header(resolver: &TypeResolver, receiver: &Receiver) -> GenerateResult<Vec<Node>> {
    let base = vec![
        Header::quoted("ArgumentCoders.h"),
        Header::quoted("Connection.h"),
        Header::quoted(MESSAGE_NAMES_HEADER),
        Header::system("wtf/Forward.h"),
        Header::system("wtf/ThreadSafeRefCounted.h"),
        Header::quoted(replies_header_name(receiver)),
    ];
    let dependencies = Dependencies::collect(resolver, base, receiver.iter_parameters())?;
    trace!(
        receiver = %receiver.name,
        includes = dependencies.headers.len(),
        "collected primary header dependencies"
    );

    let mut body = vec![
        Node::Blank,
        Node::function(
            "static inline IPC::ReceiverName messageReceiverName()",
            vec![Node::line(format!(
                "return IPC::ReceiverName::{};",
                receiver.name
            ))],
        ),
        Node::Blank,
    ];
    if !receiver.messages.is_empty() {
        body.extend(separated(
            receiver
                .messages
                .iter()
                .map(|message| message_declaration(resolver, receiver, message)),
        ));
        body.push(Node::Blank);
    }

    Ok(header_file(receiver, dependencies.into_nodes(resolver), body))
}

/// The reply header: completion-handler aliases for delayed and async
/// messages, with only the dependencies of their reply parameters.
pub fn replies_header(resolver: &TypeResolver, receiver: &Receiver) -> GenerateResult<Vec<Node>> {
    let base = vec![
        Header::system("wtf/Forward.h"),
        Header::quoted(MESSAGE_NAMES_HEADER),
    ];
    let reply_parameters = receiver
        .messages
        .iter()
        .filter(|message| message.reply.has_completion_handler())
        .flat_map(|message| {
            message
                .reply
                .parameters()
                .unwrap_or(&[])
                .iter()
                .map(move |p| (p, message.effective_condition(p)))
        });
    let dependencies = Dependencies::collect(resolver, base, reply_parameters)?;

    let aliases: Vec<Node> = receiver
        .messages
        .iter()
        .filter_map(|message| reply_declaration(resolver, message))
        .collect();

    let mut body = vec![Node::Blank];
    if !aliases.is_empty() {
        body.extend(separated(aliases));
        body.push(Node::Blank);
    }

    Ok(header_file(receiver, dependencies.into_nodes(resolver), body))
}
