//! Receiver implementation file (`<R>MessageReceiver.cpp`).
//!
//! Holds the out-of-line reply helpers of delayed and async messages and the
//! two dispatch functions that route a decoded message name to the typed
//! handler on the receiver.

use tracing::debug;

use super::{
    handler_function, message_path, messages_header_name, messages_namespace, move_types,
    parameter_list, receiver_guard, receiver_header,
};
use crate::ast::{separated, Node};
use crate::error::GenerateResult;
use crate::model::{Message, Parameter, Receiver};
use crate::resolver::{ConditionalHeaders, Header, TypeResolver};

/// Default namespace the receiver classes live in.
pub const DEFAULT_APPLICATION_NAMESPACE: &str = "PurcFetcher";

/// IPC helper and argument list for a message routed by `didReceiveMessage`.
pub fn async_dispatch_helper(message: &Message, wants_connection: bool) -> (&'static str, Vec<&'static str>) {
    let mut arguments = vec!["decoder", "this"];
    let helper = match (message.reply.is_async(), wants_connection) {
        (false, _) => "handleMessage",
        (true, false) => "handleMessageAsync",
        (true, true) => "handleMessageAsyncWantsConnection",
    };
    if message.reply.is_async() || wants_connection {
        arguments.insert(0, "connection");
    }
    (helper, arguments)
}

/// IPC helper and argument list for a message routed by `didReceiveSyncMessage`.
pub fn sync_dispatch_helper(message: &Message, wants_connection: bool) -> (&'static str, Vec<&'static str>) {
    if message.reply.is_delayed() {
        let helper = if wants_connection {
            "handleMessageSynchronousWantsConnection"
        } else {
            "handleMessageSynchronous"
        };
        return (helper, vec!["connection", "decoder", "replyEncoder", "this"]);
    }

    let mut arguments = vec!["decoder", "*replyEncoder", "this"];
    if wants_connection {
        arguments.insert(0, "connection");
    }
    ("handleMessage", arguments)
}

/// Emits the implementation file of a receiver.
#[derive(Debug, Clone)]
pub struct DispatchEmitter<'a> {
    resolver: &'a TypeResolver,
    application_namespace: String,
}

impl<'a> DispatchEmitter<'a> {
    pub fn new(resolver: &'a TypeResolver) -> Self {
        Self {
            resolver,
            application_namespace: DEFAULT_APPLICATION_NAMESPACE.to_string(),
        }
    }

    /// Set the namespace the dispatch functions are defined in.
    pub fn with_application_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.application_namespace = namespace.into();
        self
    }

    pub fn receiver_implementation(&self, receiver: &Receiver) -> GenerateResult<Vec<Node>> {
        let mut body = vec![Node::Include(receiver_header(receiver)), Node::Blank];
        body.extend(Node::includes(self.includes(receiver)?));
        body.push(Node::Blank);

        let reply_blocks: Vec<Node> = receiver
            .messages
            .iter()
            .filter(|message| message.reply.has_completion_handler())
            .map(|message| self.reply_helpers(message))
            .collect();
        let reply_helpers = reply_blocks.len();
        if !reply_blocks.is_empty() {
            let mut namespace_body = vec![Node::Blank];
            namespace_body.extend(separated(reply_blocks));
            namespace_body.push(Node::Blank);
            body.push(messages_namespace(receiver, namespace_body));
            body.push(Node::Blank);
        }

        let functions: Vec<Node> = [
            self.did_receive_message(receiver),
            self.did_receive_sync_message(receiver),
        ]
        .into_iter()
        .flatten()
        .collect();
        debug!(
            receiver = %receiver.name,
            reply_helpers,
            dispatch_functions = functions.len(),
            "emitting receiver implementation"
        );

        let mut namespace_body = vec![Node::Blank];
        if !functions.is_empty() {
            namespace_body.extend(separated(functions));
            namespace_body.push(Node::Blank);
        }
        body.push(Node::namespace(
            self.application_namespace.clone(),
            namespace_body,
        ));

        let mut nodes = vec![Node::raw("#include \"config.h\""), Node::Blank];
        nodes.extend(receiver_guard(receiver, body));
        Ok(nodes)
    }

    /// Type and argument-coder headers of every parameter, plus the
    /// receiver's own messages header and the dispatch helpers.
    fn includes(&self, receiver: &Receiver) -> GenerateResult<Vec<(Header, Option<String>)>> {
        let mut headers = ConditionalHeaders::new();
        headers.add_all(
            [
                Header::quoted(messages_header_name(receiver)),
                Header::quoted("HandleMessage.h"),
                Header::quoted("Decoder.h"),
            ],
            None,
        );
        for (parameter, condition) in receiver.iter_parameters() {
            headers.add_all(self.resolver.coder_headers_for(&parameter.type_name)?, condition);
            headers.add_all(self.resolver.headers_for(&parameter.type_name)?, condition);
        }
        Ok(headers.resolve_parameter_guards())
    }

    fn reply_helpers(&self, message: &Message) -> Node {
        let parameters = message.reply.parameters().unwrap_or(&[]);
        let mut functions = Vec::new();
        if message.reply.is_async() {
            functions.push(call_reply(message, parameters));
            functions.push(cancel_reply(message, parameters));
        }
        functions.push(self.send_reply(message, parameters));
        Node::guarded(message.condition.as_deref(), separated(functions))
    }

    fn send_reply(&self, message: &Message, parameters: &[Parameter]) -> Node {
        let mut signature = format!(
            "void {}::send(std::unique_ptr<IPC::Encoder>&& encoder, IPC::Connection& connection",
            message.name
        );
        if !parameters.is_empty() {
            signature.push_str(", ");
            signature.push_str(&parameter_list(self.resolver, parameters));
        }
        signature.push(')');

        let mut body: Vec<Node> = parameters
            .iter()
            .map(|p| Node::line(format!("*encoder << {};", p.name)))
            .collect();
        body.push(Node::line("connection.sendSyncReply(WTFMove(encoder));"));
        Node::function(signature, body)
    }

    fn did_receive_message(&self, receiver: &Receiver) -> Option<Node> {
        let messages: Vec<&Message> = receiver
            .messages
            .iter()
            .filter(|message| !message.is_sync())
            .collect();
        if messages.is_empty() && !receiver.wants_dispatch_hook() {
            return None;
        }

        let mut body = protect_this(receiver);
        for message in messages {
            let (helper, arguments) =
                async_dispatch_helper(message, receiver.message_wants_connection(message));
            body.push(dispatch_statement(receiver, message, helper, arguments));
        }
        if receiver.wants_dispatch_hook() {
            body.push(Node::line("if (dispatchMessage(connection, decoder))"));
            body.push(Node::Indented(vec![Node::line("return;")]));
        }
        match &receiver.superclass {
            Some(superclass) => body.push(Node::line(format!(
                "{}::didReceiveMessage(connection, decoder);",
                superclass
            ))),
            None => body.extend(unreachable_tail(&["connection", "decoder"])),
        }

        Some(Node::function(
            format!(
                "void {}::didReceive{}Message(IPC::Connection& connection, IPC::Decoder& decoder)",
                receiver.name,
                legacy_infix(receiver)
            ),
            body,
        ))
    }

    fn did_receive_sync_message(&self, receiver: &Receiver) -> Option<Node> {
        let messages: Vec<&Message> = receiver
            .messages
            .iter()
            .filter(|message| message.is_sync())
            .collect();
        if messages.is_empty() && !receiver.wants_dispatch_hook() {
            return None;
        }

        let mut body = protect_this(receiver);
        for message in messages {
            let (helper, arguments) =
                sync_dispatch_helper(message, receiver.message_wants_connection(message));
            body.push(dispatch_statement(receiver, message, helper, arguments));
        }
        if receiver.wants_dispatch_hook() {
            body.push(Node::line(
                "if (dispatchSyncMessage(connection, decoder, replyEncoder))",
            ));
            body.push(Node::Indented(vec![Node::line("return;")]));
        }
        match &receiver.superclass {
            Some(superclass) => body.push(Node::line(format!(
                "{}::didReceiveSyncMessage(connection, decoder, replyEncoder);",
                superclass
            ))),
            None => body.extend(unreachable_tail(&["connection", "decoder", "replyEncoder"])),
        }

        Some(Node::function(
            format!(
                "void {}::didReceiveSync{}Message(IPC::Connection& connection, IPC::Decoder& decoder, std::unique_ptr<IPC::Encoder>& replyEncoder)",
                receiver.name,
                legacy_infix(receiver)
            ),
            body,
        ))
    }
}

fn legacy_infix(receiver: &Receiver) -> &str {
    if receiver.flags.legacy_naming {
        &receiver.name
    } else {
        ""
    }
}

fn protect_this(receiver: &Receiver) -> Vec<Node> {
    if receiver.flags.not_ref_counted {
        Vec::new()
    } else {
        vec![Node::line("auto protectedThis = makeRef(*this);")]
    }
}

fn unreachable_tail(parameters: &[&str]) -> Vec<Node> {
    let mut nodes: Vec<Node> = parameters
        .iter()
        .map(|p| Node::line(format!("UNUSED_PARAM({});", p)))
        .collect();
    nodes.push(Node::line("ASSERT_NOT_REACHED();"));
    nodes
}

fn dispatch_statement(
    receiver: &Receiver,
    message: &Message,
    helper: &str,
    arguments: Vec<&str>,
) -> Node {
    let mut arguments: Vec<String> = arguments.into_iter().map(str::to_string).collect();
    arguments.push(format!("&{}", handler_function(receiver, message)));
    Node::guarded(
        message.condition.as_deref(),
        vec![Node::block(
            format!(
                "if (decoder.messageName() == {}::name())",
                message_path(receiver, message)
            ),
            vec![
                Node::line(format!(
                    "IPC::{}<{}>({});",
                    helper,
                    message_path(receiver, message),
                    arguments.join(", ")
                )),
                Node::line("return;"),
            ],
        )],
    )
}

/// Decode each reply value in order, cancelling on the first failure.
fn call_reply(message: &Message, parameters: &[Parameter]) -> Node {
    let mut body = Vec::new();
    for parameter in parameters {
        body.push(Node::line(format!(
            "Optional<{}> {};",
            parameter.type_name, parameter.name
        )));
        body.push(Node::line(format!("decoder >> {};", parameter.name)));
        body.push(Node::block(
            format!("if (!{})", parameter.name),
            vec![
                Node::line("ASSERT_NOT_REACHED();"),
                Node::line("cancelReply(WTFMove(completionHandler));"),
                Node::line("return;"),
            ],
        ));
    }
    let values = parameters
        .iter()
        .map(|p| format!("WTFMove(*{})", p.name))
        .collect::<Vec<_>>()
        .join(", ");
    body.push(Node::line(format!("completionHandler({});", values)));

    Node::function(
        format!(
            "void {}::callReply(IPC::Decoder& decoder, CompletionHandler<void({})>&& completionHandler)",
            message.name,
            move_types(parameters)
        ),
        body,
    )
}

fn cancel_reply(message: &Message, parameters: &[Parameter]) -> Node {
    let errors = parameters
        .iter()
        .map(|p| format!("IPC::AsyncReplyError<{}>::create()", p.type_name))
        .collect::<Vec<_>>()
        .join(", ");
    Node::function(
        format!(
            "void {}::cancelReply(CompletionHandler<void({})>&& completionHandler)",
            message.name,
            move_types(parameters)
        ),
        vec![Node::line(format!("completionHandler({});", errors))],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Formatter;
    use crate::model::{ReceiverFlags, Reply};
    use crate::resolver::TypeTable;

    fn render(receiver: &Receiver) -> String {
        let resolver = TypeResolver::new(TypeTable::builtin());
        let nodes = DispatchEmitter::new(&resolver)
            .receiver_implementation(receiver)
            .unwrap();
        Formatter::default().render(&nodes)
    }

    #[test]
    fn test_async_helper_table() {
        let plain = Message::new("A");
        let async_message = Message::new("B").with_reply(Reply::Async(Vec::new()));

        assert_eq!(
            async_dispatch_helper(&plain, false),
            ("handleMessage", vec!["decoder", "this"])
        );
        assert_eq!(
            async_dispatch_helper(&plain, true),
            ("handleMessage", vec!["connection", "decoder", "this"])
        );
        assert_eq!(
            async_dispatch_helper(&async_message, false),
            ("handleMessageAsync", vec!["connection", "decoder", "this"])
        );
        assert_eq!(
            async_dispatch_helper(&async_message, true),
            (
                "handleMessageAsyncWantsConnection",
                vec!["connection", "decoder", "this"]
            )
        );
    }

    #[test]
    fn test_sync_helper_table() {
        let immediate = Message::new("A").with_reply(Reply::Immediate(Vec::new()));
        let delayed = Message::new("B").with_reply(Reply::Delayed(Vec::new()));

        assert_eq!(
            sync_dispatch_helper(&immediate, false),
            ("handleMessage", vec!["decoder", "*replyEncoder", "this"])
        );
        assert_eq!(
            sync_dispatch_helper(&immediate, true),
            (
                "handleMessage",
                vec!["connection", "decoder", "*replyEncoder", "this"]
            )
        );
        assert_eq!(
            sync_dispatch_helper(&delayed, false),
            (
                "handleMessageSynchronous",
                vec!["connection", "decoder", "replyEncoder", "this"]
            )
        );
        assert_eq!(
            sync_dispatch_helper(&delayed, true).0,
            "handleMessageSynchronousWantsConnection"
        );
    }

    #[test]
    fn test_fire_and_forget_dispatch() {
        let receiver = Receiver::new("Foo")
            .with_message(Message::new("Bar").with_parameter(Parameter::new("x", "int32_t")));
        let out = render(&receiver);

        assert!(out.starts_with(
            "#include \"config.h\"

#include \"Foo.h\"

#include \"Decoder.h\"
#include \"FooMessages.h\"
#include \"HandleMessage.h\"

namespace PurcFetcher {

void Foo::didReceiveMessage(IPC::Connection& connection, IPC::Decoder& decoder)
{
    auto protectedThis = makeRef(*this);
    if (decoder.messageName() == Messages::Foo::Bar::name()) {
        IPC::handleMessage<Messages::Foo::Bar>(decoder, this, &Foo::bar);
        return;
    }
    UNUSED_PARAM(connection);
    UNUSED_PARAM(decoder);
    ASSERT_NOT_REACHED();
}

} // namespace PurcFetcher
"
        ));
        assert!(!out.contains("didReceiveSyncMessage"));
        assert!(!out.contains("namespace Messages"));
    }

    #[test]
    fn test_async_reply_helpers() {
        let receiver = Receiver::new("Foo").with_message(
            Message::new("Baz").with_reply(Reply::Async(vec![Parameter::new("result", "String")])),
        );
        let out = render(&receiver);

        assert!(out.contains(
            "namespace Messages {
namespace Foo {

void Baz::callReply(IPC::Decoder& decoder, CompletionHandler<void(String&&)>&& completionHandler)
{
    Optional<String> result;
    decoder >> result;
    if (!result) {
        ASSERT_NOT_REACHED();
        cancelReply(WTFMove(completionHandler));
        return;
    }
    completionHandler(WTFMove(*result));
}

void Baz::cancelReply(CompletionHandler<void(String&&)>&& completionHandler)
{
    completionHandler(IPC::AsyncReplyError<String>::create());
}

void Baz::send(std::unique_ptr<IPC::Encoder>&& encoder, IPC::Connection& connection, const String& result)
{
    *encoder << result;
    connection.sendSyncReply(WTFMove(encoder));
}

} // namespace Foo
} // namespace Messages
"
        ));
        assert!(out.contains(
            "IPC::handleMessageAsync<Messages::Foo::Baz>(connection, decoder, this, &Foo::baz);"
        ));
        assert!(out.contains("#include \"ArgumentCoders.h\"\n"));
        assert!(out.contains("#include <wtf/text/WTFString.h>\n"));
    }

    #[test]
    fn test_empty_async_reply_cancels_with_no_arguments() {
        let receiver =
            Receiver::new("Foo").with_message(Message::new("Done").with_reply(Reply::Async(Vec::new())));
        let out = render(&receiver);
        assert!(out.contains(
            "void Done::cancelReply(CompletionHandler<void()>&& completionHandler)\n{\n    completionHandler();\n}\n"
        ));
        assert!(out.contains(
            "void Done::send(std::unique_ptr<IPC::Encoder>&& encoder, IPC::Connection& connection)\n"
        ));
    }

    #[test]
    fn test_sync_dispatch_and_superclass() {
        let receiver = Receiver::new("Foo")
            .with_superclass("Base")
            .with_message(
                Message::new("Get").with_reply(Reply::Immediate(vec![Parameter::new("v", "uint64_t")])),
            )
            .with_message(
                Message::new("Wait")
                    .with_condition("ENABLE(WAIT)")
                    .with_reply(Reply::Delayed(Vec::new())),
            );
        let out = render(&receiver);

        assert!(!out.contains("void Foo::didReceiveMessage("));
        assert!(out.contains(
            "void Foo::didReceiveSyncMessage(IPC::Connection& connection, IPC::Decoder& decoder, std::unique_ptr<IPC::Encoder>& replyEncoder)\n"
        ));
        assert!(out.contains(
            "        IPC::handleMessage<Messages::Foo::Get>(decoder, *replyEncoder, this, &Foo::get);\n"
        ));
        assert!(out.contains(
            "#if ENABLE(WAIT)
    if (decoder.messageName() == Messages::Foo::Wait::name()) {
        IPC::handleMessageSynchronous<Messages::Foo::Wait>(connection, decoder, replyEncoder, this, &Foo::wait);
        return;
    }
#endif
"
        ));
        assert!(out.contains("    Base::didReceiveSyncMessage(connection, decoder, replyEncoder);\n"));
        assert!(!out.contains("UNUSED_PARAM"));
    }

    #[test]
    fn test_hook_legacy_and_not_ref_counted() {
        let receiver = Receiver::new("Foo")
            .with_flags(ReceiverFlags {
                wants_dispatch_hook: true,
                legacy_naming: true,
                not_ref_counted: true,
                ..ReceiverFlags::default()
            })
            .with_message(Message::new("URLChanged"));
        let out = render(&receiver);

        assert!(out.contains("void Foo::didReceiveFooMessage(IPC::Connection& connection, IPC::Decoder& decoder)\n"));
        assert!(out.contains("void Foo::didReceiveSyncFooMessage("));
        assert!(out.contains("&Foo::urlChanged);"));
        assert!(out.contains("    if (dispatchMessage(connection, decoder))\n        return;\n"));
        assert!(out.contains(
            "    if (dispatchSyncMessage(connection, decoder, replyEncoder))\n        return;\n"
        ));
        assert!(!out.contains("protectedThis"));
    }

    #[test]
    fn test_custom_application_namespace() {
        let resolver = TypeResolver::new(TypeTable::builtin());
        let receiver = Receiver::new("Foo").with_message(Message::new("Bar"));
        let nodes = DispatchEmitter::new(&resolver)
            .with_application_namespace("WebKit")
            .receiver_implementation(&receiver)
            .unwrap();
        let out = Formatter::default().render(&nodes);
        assert!(out.contains("namespace WebKit {\n"));
        assert!(out.contains("} // namespace WebKit\n"));
    }

    #[test]
    fn test_conditional_coder_headers() {
        let receiver = Receiver::new("Foo").with_message(
            Message::new("Paint")
                .with_condition("ENABLE(PAINT)")
                .with_parameter(Parameter::new("color", "PurcFetcher::Color")),
        );
        let out = render(&receiver);
        assert!(out.contains("#if ENABLE(PAINT)\n#include \"Color.h\"\n#endif\n"));
        assert!(out.contains("#if ENABLE(PAINT)\n#include \"WebCoreArgumentCoders.h\"\n#endif\n"));
    }

    #[test]
    fn test_includes_guarded_by_parameter_condition_not_platform() {
        let receiver = Receiver::new("Foo").with_message(
            Message::new("Tap")
                .with_condition("ENABLE(TOUCH)")
                .with_parameter(Parameter::new("type", "PurcFetcher::GestureType")),
        );
        let out = render(&receiver);
        assert!(out.contains("#if ENABLE(TOUCH)\n#include \"GestureTypes.h\"\n#endif\n"));
        assert!(!out.contains("PLATFORM(IOS_FAMILY)"));
    }
}
