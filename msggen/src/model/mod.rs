//! Interface model.
//!
//! A [`Receiver`] owns an ordered list of [`Message`]s, each with ordered
//! [`Parameter`]s and a [`Reply`] describing whether and how it is answered.
//! The model is built once (by hand, or from a [`ReceiverDocument`]) and is
//! read-only during generation.

pub mod document;

pub use document::{MessageDocument, ParameterDocument, ReceiverDocument};

use std::fmt;
use std::str::FromStr;

// =============================================================================
// Receiver
// =============================================================================

/// A named endpoint owning the messages it can receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receiver {
    /// Receiver name, unique across a generation run.
    pub name: String,

    /// Feature guard for everything generated for this receiver.
    pub condition: Option<String>,

    /// Class to delegate to when no message matches.
    pub superclass: Option<String>,

    /// Capability flags.
    pub flags: ReceiverFlags,

    /// Messages in declaration order.
    pub messages: Vec<Message>,
}

/// Receiver-level capability flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverFlags {
    /// Every message receives the connection unless it says otherwise.
    pub wants_connection: bool,

    /// Dispatch falls back to a hand-written `dispatchMessage` hook.
    pub wants_dispatch_hook: bool,

    /// Dispatch functions carry the receiver name (`didReceive<Name>Message`).
    pub legacy_naming: bool,

    /// The receiver is not reference counted, so dispatch does not protect `this`.
    pub not_ref_counted: bool,
}

impl Receiver {
    /// Create a receiver with no messages.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            condition: None,
            superclass: None,
            flags: ReceiverFlags::default(),
            messages: Vec::new(),
        }
    }

    /// Set the feature guard.
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Set the superclass used for delegation.
    pub fn with_superclass(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    /// Replace the capability flags.
    pub fn with_flags(mut self, flags: ReceiverFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Append a message.
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Whether the dispatch functions should try the catch-all hook.
    pub fn wants_dispatch_hook(&self) -> bool {
        self.flags.wants_dispatch_hook || self.messages.iter().any(|m| m.wants_dispatch_hook)
    }

    /// Whether `message` is dispatched with an explicit connection argument.
    pub fn message_wants_connection(&self, message: &Message) -> bool {
        self.flags.wants_connection || message.wants_connection
    }

    /// Every call and reply parameter with the condition it contributes.
    pub fn iter_parameters(&self) -> impl Iterator<Item = (&Parameter, Option<&str>)> + '_ {
        let calls = self.messages.iter().flat_map(|message| {
            message
                .parameters
                .iter()
                .map(move |p| (p, message.effective_condition(p)))
        });
        let replies = self.messages.iter().flat_map(|message| {
            message
                .reply
                .parameters()
                .unwrap_or(&[])
                .iter()
                .map(move |p| (p, message.effective_condition(p)))
        });
        calls.chain(replies)
    }
}

// =============================================================================
// Message
// =============================================================================

/// One named operation exposed by a receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message name, unique within its receiver.
    pub name: String,

    /// Call arguments in declaration order.
    pub parameters: Vec<Parameter>,

    /// Reply shape and mechanism.
    pub reply: Reply,

    /// Dispatch passes the connection to the handler.
    pub wants_connection: bool,

    /// Requests the receiver's catch-all dispatch hook.
    pub wants_dispatch_hook: bool,

    /// Feature guard for this message.
    pub condition: Option<String>,
}

impl Message {
    /// Create a fire-and-forget message with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            reply: Reply::None,
            wants_connection: false,
            wants_dispatch_hook: false,
            condition: None,
        }
    }

    /// Append a call parameter.
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Set the reply.
    pub fn with_reply(mut self, reply: Reply) -> Self {
        self.reply = reply;
        self
    }

    /// Set the feature guard.
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Request connection injection.
    pub fn with_connection(mut self) -> Self {
        self.wants_connection = true;
        self
    }

    /// Request the catch-all dispatch hook.
    pub fn with_dispatch_hook(mut self) -> Self {
        self.wants_dispatch_hook = true;
        self
    }

    /// True when the caller blocks for the reply.
    pub fn is_sync(&self) -> bool {
        matches!(self.reply, Reply::Immediate(_) | Reply::Delayed(_))
    }

    /// The guard a parameter of this message contributes.
    pub fn effective_condition<'a>(&'a self, parameter: &'a Parameter) -> Option<&'a str> {
        parameter.condition.as_deref().or(self.condition.as_deref())
    }

    /// Name of the handler method on the receiver class.
    ///
    /// `URLChanged` becomes `urlChanged`, `DoThing` becomes `doThing`.
    pub fn handler_name(&self) -> String {
        if let Some(rest) = self.name.strip_prefix("URL") {
            return format!("url{}", rest);
        }
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// How, if at all, a message is answered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Reply {
    /// Fire-and-forget.
    #[default]
    None,

    /// The reply is encoded inline while the message is dispatched.
    Immediate(Vec<Parameter>),

    /// The handler receives a move-only `DelayedReply` completion handler.
    Delayed(Vec<Parameter>),

    /// The caller registers an `AsyncReply` completion handler resolved later.
    Async(Vec<Parameter>),
}

impl Reply {
    /// Reply parameters, or `None` for fire-and-forget messages.
    pub fn parameters(&self) -> Option<&[Parameter]> {
        match self {
            Reply::None => None,
            Reply::Immediate(p) | Reply::Delayed(p) | Reply::Async(p) => Some(p),
        }
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Reply::Async(_))
    }

    pub fn is_delayed(&self) -> bool {
        matches!(self, Reply::Delayed(_))
    }

    /// True for replies resolved through a completion handler.
    pub fn has_completion_handler(&self) -> bool {
        matches!(self, Reply::Delayed(_) | Reply::Async(_))
    }

    /// Suffix of the completion handler alias (`AsyncReply` or `DelayedReply`).
    pub fn handler_alias_suffix(&self) -> Option<&'static str> {
        match self {
            Reply::Async(_) => Some("AsyncReply"),
            Reply::Delayed(_) => Some("DelayedReply"),
            _ => None,
        }
    }
}

// =============================================================================
// Parameter
// =============================================================================

/// A typed, named argument of a message or its reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,

    /// Type expression, possibly templated (`Vector<String>`).
    pub type_name: String,

    pub kind: ParameterKind,

    /// Feature guard; falls back to the owning message's guard.
    pub condition: Option<String>,
}

impl Parameter {
    /// Create a class-kind parameter.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            kind: ParameterKind::Class,
            condition: None,
        }
    }

    pub fn with_kind(mut self, kind: ParameterKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

/// What a parameter type is, for forward declaration and passing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ParameterKind {
    #[default]
    Class,
    Struct,
    /// `enum class` with the given underlying integer type.
    Enum { underlying: String },
}

impl ParameterKind {
    /// Create an enum kind.
    pub fn enumeration(underlying: impl Into<String>) -> Self {
        Self::Enum {
            underlying: underlying.into(),
        }
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, ParameterKind::Enum { .. })
    }
}

impl FromStr for ParameterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "class" => Ok(ParameterKind::Class),
            "struct" => Ok(ParameterKind::Struct),
            other => match other.strip_prefix("enum:") {
                Some(underlying) if !underlying.trim().is_empty() => {
                    Ok(ParameterKind::enumeration(underlying.trim()))
                }
                Some(_) => Err("enum kind needs an underlying type".to_string()),
                None => Err(format!("expected class, struct or enum:<type>, got '{}'", other)),
            },
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterKind::Class => write!(f, "class"),
            ParameterKind::Struct => write!(f, "struct"),
            ParameterKind::Enum { underlying } => write!(f, "enum:{}", underlying),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_name_lowercases_first_letter() {
        assert_eq!(Message::new("DoThing").handler_name(), "doThing");
        assert_eq!(Message::new("URLChanged").handler_name(), "urlChanged");
        assert_eq!(Message::new("X").handler_name(), "x");
    }

    #[test]
    fn test_is_sync_excludes_async_and_fire_and_forget() {
        let p = || vec![Parameter::new("r", "bool")];
        assert!(!Message::new("A").is_sync());
        assert!(Message::new("B").with_reply(Reply::Immediate(p())).is_sync());
        assert!(Message::new("C").with_reply(Reply::Delayed(p())).is_sync());
        assert!(!Message::new("D").with_reply(Reply::Async(p())).is_sync());
    }

    #[test]
    fn test_parameter_condition_falls_back_to_message() {
        let message = Message::new("M")
            .with_condition("ENABLE(M)")
            .with_parameter(Parameter::new("a", "bool"))
            .with_parameter(Parameter::new("b", "bool").with_condition("ENABLE(B)"));

        assert_eq!(
            message.effective_condition(&message.parameters[0]),
            Some("ENABLE(M)")
        );
        assert_eq!(
            message.effective_condition(&message.parameters[1]),
            Some("ENABLE(B)")
        );
    }

    #[test]
    fn test_iter_parameters_yields_calls_then_replies() {
        let receiver = Receiver::new("R")
            .with_message(
                Message::new("A")
                    .with_parameter(Parameter::new("x", "int32_t"))
                    .with_reply(Reply::Async(vec![Parameter::new("y", "String")])),
            )
            .with_message(Message::new("B").with_parameter(Parameter::new("z", "bool")));

        let names: Vec<_> = receiver
            .iter_parameters()
            .map(|(p, _)| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["x", "z", "y"]);
    }

    #[test]
    fn test_receiver_hook_from_message_flag() {
        let receiver = Receiver::new("R").with_message(Message::new("A").with_dispatch_hook());
        assert!(receiver.wants_dispatch_hook());
        assert!(!Receiver::new("S").wants_dispatch_hook());
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("class".parse::<ParameterKind>(), Ok(ParameterKind::Class));
        assert_eq!("struct".parse::<ParameterKind>(), Ok(ParameterKind::Struct));
        assert_eq!(
            "enum:uint8_t".parse::<ParameterKind>(),
            Ok(ParameterKind::enumeration("uint8_t"))
        );
        assert!("enum:".parse::<ParameterKind>().is_err());
        assert!("union".parse::<ParameterKind>().is_err());
    }

    #[test]
    fn test_kind_display_round_trips() {
        for kind in [
            ParameterKind::Class,
            ParameterKind::Struct,
            ParameterKind::enumeration("uint16_t"),
        ] {
            assert_eq!(kind.to_string().parse::<ParameterKind>(), Ok(kind));
        }
    }
}
