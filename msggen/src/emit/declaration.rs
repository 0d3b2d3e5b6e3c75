//! Per-message wrapper class declarations.

use super::{move_types, parameter_list, wire_name};
use crate::ast::Node;
use crate::model::{Message, Parameter, Receiver, Reply};
use crate::resolver::TypeResolver;

/// The wrapper class for one message, inside the message's guard.
pub fn message_declaration(resolver: &TypeResolver, receiver: &Receiver, message: &Message) -> Node {
    let arguments = message
        .parameters
        .iter()
        .map(|p| resolver.function_parameter_type(p))
        .collect::<Vec<_>>()
        .join(", ");

    let mut body = vec![
        Node::label("public:"),
        Node::line(format!("using Arguments = std::tuple<{}>;", arguments)),
        Node::Blank,
        Node::line(format!(
            "static IPC::MessageName name() {{ return IPC::MessageName::{}; }}",
            wire_name(receiver, message)
        )),
        Node::line(format!("static const bool isSync = {};", message.is_sync())),
        Node::Blank,
    ];

    if let Some(reply_parameters) = message.reply.parameters() {
        body.extend(reply_members(resolver, receiver, message, reply_parameters));
        body.push(Node::Blank);
    }

    if !message.parameters.is_empty() {
        let explicit = if message.parameters.len() == 1 {
            "explicit "
        } else {
            ""
        };
        let names = message
            .parameters
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        body.push(Node::Function {
            signature: format!(
                "{}{}({})",
                explicit,
                message.name,
                parameter_list(resolver, &message.parameters)
            ),
            initializer: Some(format!(": m_arguments({})", names)),
            body: Vec::new(),
        });
        body.push(Node::Blank);
    }

    body.extend([
        Node::function(
            "const Arguments& arguments() const",
            vec![Node::line("return m_arguments;")],
        ),
        Node::Blank,
        Node::label("private:"),
        Node::line("Arguments m_arguments;"),
    ]);

    Node::guarded(
        message.condition.as_deref(),
        vec![Node::type_body(format!("class {}", message.name), body)],
    )
}

fn reply_members(
    resolver: &TypeResolver,
    receiver: &Receiver,
    message: &Message,
    reply_parameters: &[Parameter],
) -> Vec<Node> {
    let mut members = Vec::new();

    match &message.reply {
        Reply::Async(_) => {
            let moved = move_types(reply_parameters);
            members.push(Node::line(format!(
                "static void callReply(IPC::Decoder&, CompletionHandler<void({})>&&);",
                moved
            )));
            members.push(Node::line(format!(
                "static void cancelReply(CompletionHandler<void({})>&&);",
                moved
            )));
            members.push(Node::line(format!(
                "static IPC::MessageName asyncMessageReplyName() {{ return IPC::MessageName::{}Reply; }}",
                wire_name(receiver, message)
            )));
            members.push(Node::line(format!(
                "using AsyncReply = {}AsyncReply;",
                message.name
            )));
        }
        Reply::Delayed(_) => {
            members.push(Node::line(format!(
                "using DelayedReply = {}DelayedReply;",
                message.name
            )));
        }
        Reply::Immediate(_) | Reply::None => {}
    }

    if message.reply.has_completion_handler() {
        let mut send = "static void send(std::unique_ptr<IPC::Encoder>&&, IPC::Connection&".to_string();
        if !reply_parameters.is_empty() {
            send.push_str(", ");
            send.push_str(&parameter_list(resolver, reply_parameters));
        }
        send.push_str(");");
        members.push(Node::Line(send));
    }

    let references = reply_parameters
        .iter()
        .map(|p| format!("{}&", p.type_name))
        .collect::<Vec<_>>()
        .join(", ");
    let values = reply_parameters
        .iter()
        .map(|p| p.type_name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    members.push(Node::line(format!("using Reply = std::tuple<{}>;", references)));
    members.push(Node::line(format!(
        "using ReplyArguments = std::tuple<{}>;",
        values
    )));
    members
}

/// The completion handler alias for a message answered through one.
///
/// `None` for fire-and-forget and immediate-reply messages.
pub fn reply_declaration(resolver: &TypeResolver, message: &Message) -> Option<Node> {
    let suffix = message.reply.handler_alias_suffix()?;
    let parameters = message.reply.parameters().unwrap_or(&[]);
    Some(Node::guarded(
        message.condition.as_deref(),
        vec![Node::line(format!(
            "using {}{} = CompletionHandler<void({})>;",
            message.name,
            suffix,
            parameter_list(resolver, parameters)
        ))],
    ))
}
