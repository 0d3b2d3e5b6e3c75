//! Serialized receiver documents.
//!
//! The message-definition parser hands its result over as one JSON document
//! per receiver. Attributes arrive as strings here; converting a document
//! into a [`Receiver`] validates them and folds them into the typed model.

use serde::Deserialize;
use std::collections::HashSet;

use super::{Message, Parameter, ParameterKind, Receiver, ReceiverFlags, Reply};
use crate::error::ModelError;

pub const WANTS_CONNECTION_ATTRIBUTE: &str = "WantsConnection";
pub const WANTS_DISPATCH_MESSAGE_ATTRIBUTE: &str = "WantsDispatchMessage";
pub const LEGACY_RECEIVER_ATTRIBUTE: &str = "LegacyReceiver";
pub const NOT_REFCOUNTED_RECEIVER_ATTRIBUTE: &str = "NotRefCounted";
pub const SYNCHRONOUS_ATTRIBUTE: &str = "Synchronous";
pub const ASYNC_ATTRIBUTE: &str = "Async";

/// A receiver as written by the message-definition parser.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReceiverDocument {
    pub name: String,

    #[serde(default)]
    pub condition: Option<String>,

    #[serde(default)]
    pub superclass: Option<String>,

    #[serde(default)]
    pub attributes: Vec<String>,

    #[serde(default)]
    pub messages: Vec<MessageDocument>,
}

/// A message as written by the message-definition parser.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageDocument {
    pub name: String,

    #[serde(default)]
    pub condition: Option<String>,

    #[serde(default)]
    pub attributes: Vec<String>,

    #[serde(default)]
    pub parameters: Vec<ParameterDocument>,

    /// Absent for fire-and-forget messages. An empty list is a reply with no values.
    #[serde(default)]
    pub reply_parameters: Option<Vec<ParameterDocument>>,
}

/// A parameter as written by the message-definition parser.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterDocument {
    pub name: String,

    #[serde(rename = "type")]
    pub type_name: String,

    /// `class` (default), `struct` or `enum:<underlying>`.
    #[serde(default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub condition: Option<String>,
}

impl ReceiverDocument {
    /// Parse a document from JSON text.
    pub fn from_json(content: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Validate the document and build the typed receiver.
    pub fn into_receiver(self) -> Result<Receiver, ModelError> {
        if self.name.trim().is_empty() {
            return Err(ModelError::empty_name("receiver", "document"));
        }

        let mut flags = ReceiverFlags::default();
        for attribute in &self.attributes {
            match attribute.as_str() {
                WANTS_CONNECTION_ATTRIBUTE => flags.wants_connection = true,
                WANTS_DISPATCH_MESSAGE_ATTRIBUTE => flags.wants_dispatch_hook = true,
                LEGACY_RECEIVER_ATTRIBUTE => flags.legacy_naming = true,
                NOT_REFCOUNTED_RECEIVER_ATTRIBUTE => flags.not_ref_counted = true,
                other => {
                    return Err(ModelError::unknown_attribute(
                        format!("receiver '{}'", self.name),
                        other,
                    ))
                }
            }
        }

        let mut seen = HashSet::new();
        let mut messages = Vec::with_capacity(self.messages.len());
        for message in self.messages {
            if !seen.insert(message.name.clone()) {
                return Err(ModelError::DuplicateMessage {
                    receiver: self.name,
                    message: message.name,
                });
            }
            messages.push(message.into_message(&self.name)?);
        }

        Ok(Receiver {
            name: self.name,
            condition: non_empty(self.condition),
            superclass: non_empty(self.superclass),
            flags,
            messages,
        })
    }
}

impl TryFrom<ReceiverDocument> for Receiver {
    type Error = ModelError;

    fn try_from(document: ReceiverDocument) -> Result<Self, Self::Error> {
        document.into_receiver()
    }
}

impl MessageDocument {
    fn into_message(self, receiver: &str) -> Result<Message, ModelError> {
        if self.name.trim().is_empty() {
            return Err(ModelError::empty_name(
                "message",
                format!("receiver '{}'", receiver),
            ));
        }

        let mut synchronous = false;
        let mut asynchronous = false;
        let mut wants_connection = false;
        let mut wants_dispatch_hook = false;
        for attribute in &self.attributes {
            match attribute.as_str() {
                SYNCHRONOUS_ATTRIBUTE => synchronous = true,
                ASYNC_ATTRIBUTE => asynchronous = true,
                WANTS_CONNECTION_ATTRIBUTE => wants_connection = true,
                WANTS_DISPATCH_MESSAGE_ATTRIBUTE => wants_dispatch_hook = true,
                other => {
                    return Err(ModelError::unknown_attribute(
                        format!("message '{}::{}'", receiver, self.name),
                        other,
                    ))
                }
            }
        }

        if synchronous && asynchronous {
            return Err(ModelError::ConflictingMechanisms {
                receiver: receiver.to_string(),
                message: self.name,
            });
        }

        let context = format!("message '{}::{}'", receiver, self.name);
        let parameters = convert_parameters(self.parameters, &context)?;
        let reply = match self.reply_parameters {
            None => {
                let attribute = if synchronous {
                    Some(SYNCHRONOUS_ATTRIBUTE)
                } else if asynchronous {
                    Some(ASYNC_ATTRIBUTE)
                } else {
                    None
                };
                if let Some(attribute) = attribute {
                    return Err(ModelError::MechanismWithoutReply {
                        receiver: receiver.to_string(),
                        message: self.name,
                        attribute,
                    });
                }
                Reply::None
            }
            Some(reply_parameters) => {
                let reply_parameters = convert_parameters(reply_parameters, &context)?;
                if asynchronous {
                    Reply::Async(reply_parameters)
                } else if synchronous {
                    Reply::Delayed(reply_parameters)
                } else {
                    Reply::Immediate(reply_parameters)
                }
            }
        };

        Ok(Message {
            name: self.name,
            parameters,
            reply,
            wants_connection,
            wants_dispatch_hook,
            condition: non_empty(self.condition),
        })
    }
}

impl ParameterDocument {
    fn into_parameter(self, context: &str) -> Result<Parameter, ModelError> {
        if self.name.trim().is_empty() {
            return Err(ModelError::empty_name("parameter", context));
        }
        if self.type_name.trim().is_empty() {
            return Err(ModelError::empty_name(
                "type",
                format!("parameter '{}' of {}", self.name, context),
            ));
        }

        let kind = match self.kind.as_deref() {
            None => ParameterKind::Class,
            Some(kind) => kind.parse().map_err(|_| ModelError::InvalidKind {
                parameter: self.name.clone(),
                kind: kind.to_string(),
            })?,
        };

        Ok(Parameter {
            name: self.name,
            type_name: self.type_name.trim().to_string(),
            kind,
            condition: non_empty(self.condition),
        })
    }
}

fn convert_parameters(
    parameters: Vec<ParameterDocument>,
    context: &str,
) -> Result<Vec<Parameter>, ModelError> {
    parameters
        .into_iter()
        .map(|p| p.into_parameter(context))
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
