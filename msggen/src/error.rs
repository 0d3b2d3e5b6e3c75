//! Error types for the generator.
//!
//! Generation is all-or-nothing: any error returned from here means no
//! artifact was produced for the run.

use thiserror::Error;

/// Result type alias for generation.
pub type GenerateResult<T> = Result<T, GenerateError>;

/// Main error type for code generation.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// A templated type uses an outer template missing from the type table.
    #[error("no class template type is defined for '{type_expr}'")]
    UnknownTemplate { type_expr: String },

    /// A type expression could not be decomposed.
    #[error("malformed type expression '{type_expr}': {message}")]
    MalformedType { type_expr: String, message: String },

    /// Two receivers share a name, or a receiver uses a reserved name.
    #[error("receiver name '{name}' is used more than once")]
    DuplicateReceiver { name: String },

    /// Two registry entries would share the same wire name.
    #[error("wire name '{wire_name}' is produced more than once")]
    DuplicateWireName { wire_name: String },

    /// The registry holds more entries than its underlying integer can number.
    #[error("too many {what} for the registry: {count} exceeds {max}")]
    RegistryOverflow {
        what: &'static str,
        count: usize,
        max: usize,
    },

    /// A header written in a type table extension is not `"x.h"` or `<x.h>`.
    #[error("invalid header '{header}': expected \"name\" or <name>")]
    InvalidHeader { header: String },

    /// The interface model failed validation.
    #[error("invalid interface model: {0}")]
    Model(#[from] ModelError),
}

/// Error raised while turning an interface document into the typed model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The document is not valid JSON or does not have the expected shape.
    #[error("malformed receiver document: {0}")]
    Json(#[from] serde_json::Error),

    /// A receiver, message or parameter has an empty name.
    #[error("{entity} name must not be empty (in {context})")]
    EmptyName {
        entity: &'static str,
        context: String,
    },

    /// A receiver declares the same message twice.
    #[error("message '{message}' is declared more than once in receiver '{receiver}'")]
    DuplicateMessage { receiver: String, message: String },

    /// An attribute string is not one of the known attributes.
    #[error("unknown attribute '{attribute}' on {owner}")]
    UnknownAttribute { owner: String, attribute: String },

    /// `Synchronous` or `Async` on a message that declares no reply.
    #[error("message '{receiver}::{message}' is marked {attribute} but declares no reply parameters")]
    MechanismWithoutReply {
        receiver: String,
        message: String,
        attribute: &'static str,
    },

    /// `Synchronous` and `Async` on the same message.
    #[error("message '{receiver}::{message}' cannot be both Synchronous and Async")]
    ConflictingMechanisms { receiver: String, message: String },

    /// A parameter kind other than `class`, `struct` or `enum:<type>`.
    #[error("invalid kind '{kind}' for parameter '{parameter}'")]
    InvalidKind { parameter: String, kind: String },
}

impl GenerateError {
    /// Create an unknown template error.
    pub fn unknown_template(type_expr: impl Into<String>) -> Self {
        Self::UnknownTemplate {
            type_expr: type_expr.into(),
        }
    }

    /// Create a malformed type error.
    pub fn malformed_type(type_expr: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedType {
            type_expr: type_expr.into(),
            message: message.into(),
        }
    }
}

impl ModelError {
    /// Create an empty name error.
    pub fn empty_name(entity: &'static str, context: impl Into<String>) -> Self {
        Self::EmptyName {
            entity,
            context: context.into(),
        }
    }

    /// Create an unknown attribute error.
    pub fn unknown_attribute(owner: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::UnknownAttribute {
            owner: owner.into(),
            attribute: attribute.into(),
        }
    }
}
