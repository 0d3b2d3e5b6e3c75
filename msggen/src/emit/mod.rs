//! Emitters turning the interface model into source IR.
//!
//! - [`declaration`] - per-message wrapper classes and reply handler aliases
//! - [`header`] - the primary and reply headers of a receiver
//! - [`dispatch`] - the receiver implementation file
//! - [`registry`] - the process-wide message-name registry
//!
//! Every emitter is a pure function of the model and returns [`Node`]s; the
//! generator renders them.

pub mod declaration;
pub mod dispatch;
pub mod header;
pub mod registry;

pub use registry::{EntryCategory, MessageEntry, MessageRegistry, ReceiverEntry};

use crate::ast::Node;
use crate::model::{Message, Parameter, Receiver};
use crate::resolver::{Header, TypeResolver};

/// Registry header file name.
pub const MESSAGE_NAMES_HEADER: &str = "MessageNames.h";

/// Registry implementation file name.
pub const MESSAGE_NAMES_IMPLEMENTATION: &str = "MessageNames.cpp";

pub fn messages_header_name(receiver: &Receiver) -> String {
    format!("{}Messages.h", receiver.name)
}

pub fn replies_header_name(receiver: &Receiver) -> String {
    format!("{}MessagesReplies.h", receiver.name)
}

pub fn receiver_implementation_name(receiver: &Receiver) -> String {
    format!("{}MessageReceiver.cpp", receiver.name)
}

/// Wire name of a message: `Receiver_Message`.
pub fn wire_name(receiver: &Receiver, message: &Message) -> String {
    format!("{}_{}", receiver.name, message.name)
}

/// Qualified handler method, `Receiver::message`.
pub(crate) fn handler_function(receiver: &Receiver, message: &Message) -> String {
    format!("{}::{}", receiver.name, message.handler_name())
}

/// `Messages::Receiver::Message`
pub(crate) fn message_path(receiver: &Receiver, message: &Message) -> String {
    format!("Messages::{}::{}", receiver.name, message.name)
}

/// Wrap a whole artifact body in the receiver's guard.
pub(crate) fn receiver_guard(receiver: &Receiver, body: Vec<Node>) -> Vec<Node> {
    match &receiver.condition {
        None => body,
        Some(condition) => {
            let mut guarded = Vec::with_capacity(body.len() + 2);
            guarded.push(Node::Blank);
            guarded.extend(body);
            guarded.push(Node::Blank);
            vec![Node::Guarded {
                condition: Some(condition.clone()),
                body: guarded,
                annotate_end: true,
            }]
        }
    }
}

/// `namespace Messages { namespace Receiver { ... } }`
pub(crate) fn messages_namespace(receiver: &Receiver, body: Vec<Node>) -> Node {
    Node::namespace(
        "Messages",
        vec![Node::namespace(receiver.name.clone(), body)],
    )
}

/// `const String& result, int32_t x`
pub(crate) fn parameter_list(resolver: &TypeResolver, parameters: &[Parameter]) -> String {
    parameters
        .iter()
        .map(|p| format!("{} {}", resolver.function_parameter_type(p), p.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `String&&, bool&&`
pub(crate) fn move_types(parameters: &[Parameter]) -> String {
    parameters
        .iter()
        .map(|p| format!("{}&&", p.type_name))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn receiver_header(receiver: &Receiver) -> Header {
    Header::quoted(format!("{}.h", receiver.name))
}
