//! # msggen
//!
//! Generates the C++ side of an IPC message layer from receiver interface
//! descriptions.
//!
//! ## Overview
//!
//! A [`Receiver`] declares the messages it accepts. Each message has typed
//! parameters and an optional [`Reply`] that is answered immediately, later
//! through a completion handler (delayed), or asynchronously. From a set of
//! receivers the [`Generator`] produces:
//!
//! | File | Contents |
//! |------|----------|
//! | `<R>Messages.h` | One wrapper class per message |
//! | `<R>MessagesReplies.h` | Completion-handler aliases for delayed and async replies |
//! | `<R>MessageReceiver.cpp` | Reply helpers and the `didReceiveMessage` dispatchers |
//! | `MessageNames.h` | `ReceiverName` / `MessageName` enums and lookups |
//! | `MessageNames.cpp` | `description`, `receiverName`, `isValidMessageName` |
//!
//! ## Quick Start
//!
//! ```rust
//! use msggen::{Generator, Message, Parameter, Receiver, Reply};
//!
//! let receiver = Receiver::new("Foo")
//!     .with_message(Message::new("Bar").with_parameter(Parameter::new("x", "int32_t")))
//!     .with_message(
//!         Message::new("Baz").with_reply(Reply::Async(vec![Parameter::new("result", "String")])),
//!     );
//!
//! let output = Generator::default().generate(&[receiver]).unwrap();
//! assert!(output.get("FooMessages.h").is_some());
//! assert!(output.get("MessageNames.cpp").is_some());
//! ```
//!
//! ## Type knowledge
//!
//! Which headers declare a type, which templates exist and which types must
//! not be forward-declared all live in a [`TypeTable`]. Start from
//! [`TypeTable::builtin`] and merge a [`TypeTableExtension`] to teach the
//! generator about new types; an unknown template is a fatal error.

pub mod ast;
pub mod emit;
pub mod error;
pub mod generator;
pub mod model;
pub mod resolver;

pub use ast::{IndentStyle, LineEnding};
pub use emit::MessageRegistry;
pub use error::{GenerateError, GenerateResult, ModelError};
pub use generator::{ArtifactKind, GeneratedFile, GeneratedOutput, Generator, GeneratorConfig};
pub use model::{
    Message, Parameter, ParameterKind, Receiver, ReceiverDocument, ReceiverFlags, Reply,
};
pub use resolver::{Header, TypeResolver, TypeTable, TypeTableExtension};
