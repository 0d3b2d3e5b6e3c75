//! Process-wide message-name registry (`MessageNames.h` / `MessageNames.cpp`).
//!
//! Built in two passes: [`MessageRegistry::build`] first enumerates every
//! receiver and message entry in emission order, then numbers them by
//! position. Both generated files are rendered from the same entry lists,
//! so the enums and the lookup switches cannot disagree.

use std::collections::BTreeSet;

use tracing::debug;

use super::wire_name;
use crate::ast::{separated, Node};
use crate::error::{GenerateError, GenerateResult};
use crate::model::Receiver;

/// Receiver names the runtime reserves, in enumeration order after user receivers.
pub const RESERVED_RECEIVERS: [&str; 3] = ["IPC", "AsyncReply", "Invalid"];

/// Infrastructure messages appended after every user message.
pub const INFRASTRUCTURE_MESSAGES: [&str; 4] = [
    "WrappedAsyncMessageForTesting",
    "SyncMessageReply",
    "InitializeConnection",
    "LegacySessionState",
];

/// Which receiver a message identifier resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryCategory {
    /// A message declared by this receiver.
    Receiver(String),
    /// The reply half of an async message.
    AsyncReply,
    /// A message owned by the IPC runtime itself.
    Infrastructure,
}

impl EntryCategory {
    /// The `ReceiverName` enumerator this category maps to.
    pub fn receiver_name(&self) -> &str {
        match self {
            EntryCategory::Receiver(name) => name,
            EntryCategory::AsyncReply => "AsyncReply",
            EntryCategory::Infrastructure => "IPC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverEntry {
    pub name: String,
    pub id: u32,
    pub condition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEntry {
    /// Enumerator name, `Receiver_Message[Reply]`.
    pub wire_name: String,
    pub id: u32,
    /// Human-readable name returned by `description()`.
    pub description: String,
    pub category: EntryCategory,
    pub receiver_condition: Option<String>,
    pub message_condition: Option<String>,
}

/// Numbered receiver and message entries for one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageRegistry {
    receivers: Vec<ReceiverEntry>,
    messages: Vec<MessageEntry>,
}

impl MessageRegistry {
    /// Enumerate and number every entry for `receivers`.
    ///
    /// Fails on duplicate or reserved receiver names, on wire-name
    /// collisions, and when either enum would overflow its underlying type.
    pub fn build(receivers: &[Receiver]) -> GenerateResult<Self> {
        // Pass 1: enumerate.
        let mut receiver_names: BTreeSet<&str> = RESERVED_RECEIVERS.iter().copied().collect();
        let mut receiver_entries = Vec::with_capacity(receivers.len() + RESERVED_RECEIVERS.len());
        for receiver in receivers {
            if !receiver_names.insert(&receiver.name) {
                return Err(GenerateError::DuplicateReceiver {
                    name: receiver.name.clone(),
                });
            }
            receiver_entries.push((receiver.name.clone(), receiver.condition.clone()));
        }
        receiver_entries.extend(RESERVED_RECEIVERS.iter().map(|name| (name.to_string(), None)));

        let mut wire_names = BTreeSet::new();
        let mut message_entries = Vec::new();
        let mut push = |entry: MessageEntry| -> GenerateResult<()> {
            if !wire_names.insert(entry.wire_name.clone()) {
                return Err(GenerateError::DuplicateWireName {
                    wire_name: entry.wire_name,
                });
            }
            message_entries.push(entry);
            Ok(())
        };

        for receiver in receivers {
            for message in &receiver.messages {
                let name = wire_name(receiver, message);
                push(MessageEntry {
                    wire_name: name.clone(),
                    id: 0,
                    description: format!("{}::{}", receiver.name, message.name),
                    category: EntryCategory::Receiver(receiver.name.clone()),
                    receiver_condition: receiver.condition.clone(),
                    message_condition: message.condition.clone(),
                })?;
                if message.reply.is_async() {
                    push(MessageEntry {
                        wire_name: format!("{}Reply", name),
                        id: 0,
                        description: format!("{}::{}Reply", receiver.name, message.name),
                        category: EntryCategory::AsyncReply,
                        receiver_condition: receiver.condition.clone(),
                        message_condition: message.condition.clone(),
                    })?;
                }
            }
        }
        for name in INFRASTRUCTURE_MESSAGES {
            push(MessageEntry {
                wire_name: name.to_string(),
                id: 0,
                description: format!("IPC::{}", name),
                category: EntryCategory::Infrastructure,
                receiver_condition: None,
                message_condition: None,
            })?;
        }

        check_capacity("receivers", receiver_entries.len(), u8::MAX as usize)?;
        check_capacity("messages", message_entries.len(), u16::MAX as usize)?;

        // Pass 2: number by position, starting at 1.
        let receivers = receiver_entries
            .into_iter()
            .zip(1u32..)
            .map(|((name, condition), id)| ReceiverEntry {
                name,
                id,
                condition,
            })
            .collect();
        let messages = message_entries
            .into_iter()
            .zip(1u32..)
            .map(|(entry, id)| MessageEntry { id, ..entry })
            .collect::<Vec<_>>();

        debug!(count = messages.len(), "numbered message registry");
        Ok(Self {
            receivers,
            messages,
        })
    }

    pub fn receivers(&self) -> &[ReceiverEntry] {
        &self.receivers
    }

    pub fn messages(&self) -> &[MessageEntry] {
        &self.messages
    }

    /// Look up an entry by wire name.
    pub fn message(&self, wire_name: &str) -> Option<&MessageEntry> {
        self.messages.iter().find(|m| m.wire_name == wire_name)
    }

    pub fn max_message_id(&self) -> u32 {
        self.messages.last().map_or(0, |m| m.id)
    }

    /// Mirrors the generated `isValidMessageName`.
    pub fn is_valid_message_id(&self, id: u32) -> bool {
        self.message_by_id(id).is_some()
    }

    /// Mirrors the generated `receiverName`.
    pub fn receiver_name_of(&self, id: u32) -> Option<&str> {
        self.message_by_id(id).map(|m| m.category.receiver_name())
    }

    /// Mirrors the generated `description`.
    pub fn description_of(&self, id: u32) -> Option<&str> {
        self.message_by_id(id).map(|m| m.description.as_str())
    }

    fn message_by_id(&self, id: u32) -> Option<&MessageEntry> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.messages.get(index)
    }

    /// `MessageNames.h`
    pub fn header(&self) -> Vec<Node> {
        let receiver_enumerators = self
            .receivers
            .iter()
            .map(|r| {
                Node::guarded(
                    r.condition.as_deref(),
                    vec![Node::line(format!("{} = {},", r.name, r.id))],
                )
            })
            .collect();
        let message_enumerators = guarded_runs(&self.all_messages(), |m| {
            vec![Node::line(format!("{} = {},", m.wire_name, m.id))]
        });

        let ipc = vec![
            Node::Blank,
            Node::type_body("enum class ReceiverName : uint8_t", receiver_enumerators),
            Node::Blank,
            Node::type_body("enum class MessageName : uint16_t", message_enumerators),
            Node::Blank,
            Node::line("ReceiverName receiverName(MessageName);"),
            Node::line("const char* description(MessageName);"),
            Node::line("bool isValidMessageName(MessageName);"),
            Node::Blank,
        ];
        let wtf = vec![
            Node::Blank,
            Node::line("template<>"),
            Node::line("class HasCustomIsValidEnum<IPC::MessageName> : public std::true_type { };"),
            Node::line(
                "template<typename E, typename T, std::enable_if_t<std::is_same_v<E, IPC::MessageName>>* = nullptr>",
            ),
            Node::function(
                "bool isValidEnum(T messageName)",
                vec![
                    Node::line(
                        "static_assert(sizeof(T) == sizeof(E), \"isValidEnum<IPC::MessageName> should only be called with 16-bit types\");",
                    ),
                    Node::line("return IPC::isValidMessageName(static_cast<E>(messageName));"),
                ],
            ),
            Node::Blank,
        ];

        vec![
            Node::raw("#pragma once"),
            Node::Blank,
            Node::raw("#include <wtf/EnumTraits.h>"),
            Node::Blank,
            Node::namespace("IPC", ipc),
            Node::Blank,
            Node::namespace("WTF", wtf),
        ]
    }

    /// `MessageNames.cpp`
    pub fn implementation(&self) -> Vec<Node> {
        let all = self.all_messages();

        let description = Node::function(
            "const char* description(MessageName name)",
            vec![
                Node::block(
                    "switch (name)",
                    guarded_runs(&all, |m| {
                        vec![
                            case_label(m),
                            Node::line(format!("return \"{}\";", m.description)),
                        ]
                    }),
                ),
                Node::line("ASSERT_NOT_REACHED();"),
                Node::line("return \"<invalid message name>\";"),
            ],
        );

        let receiver_name = Node::function(
            "ReceiverName receiverName(MessageName messageName)",
            vec![
                Node::block("switch (messageName)", self.receiver_name_cases()),
                Node::line("ASSERT_NOT_REACHED();"),
                Node::line("return ReceiverName::Invalid;"),
            ],
        );

        let mut valid_cases = guarded_runs(&all, |m| vec![case_label(m)]);
        valid_cases.push(Node::line("return true;"));
        let is_valid = Node::function(
            "bool isValidMessageName(MessageName messageName)",
            vec![
                Node::block("switch (messageName)", valid_cases),
                Node::line("return false;"),
            ],
        );

        let mut ipc = vec![Node::Blank];
        ipc.extend(separated([description, receiver_name, is_valid]));
        ipc.push(Node::Blank);

        vec![
            Node::raw("#include \"config.h\""),
            Node::raw("#include \"MessageNames.h\""),
            Node::Blank,
            Node::namespace("IPC", ipc),
        ]
    }

    fn all_messages(&self) -> Vec<&MessageEntry> {
        self.messages.iter().collect()
    }

    /// Cases grouped by the receiver they resolve to: user receivers in
    /// order, then async replies, then runtime messages.
    fn receiver_name_cases(&self) -> Vec<Node> {
        let mut cases = Vec::new();
        for receiver in &self.receivers {
            let owned: Vec<&MessageEntry> = self
                .messages
                .iter()
                .filter(|m| matches!(&m.category, EntryCategory::Receiver(name) if *name == receiver.name))
                .collect();
            if owned.is_empty() {
                continue;
            }
            let mut body = message_runs(&owned, |m| vec![case_label(m)]);
            body.push(return_receiver(&receiver.name));
            cases.push(Node::guarded(receiver.condition.as_deref(), body));
        }

        for category in [EntryCategory::AsyncReply, EntryCategory::Infrastructure] {
            let entries: Vec<&MessageEntry> = self
                .messages
                .iter()
                .filter(|m| m.category == category)
                .collect();
            if entries.is_empty() {
                continue;
            }
            cases.extend(guarded_runs(&entries, |m| vec![case_label(m)]));
            cases.push(return_receiver(category.receiver_name()));
        }
        cases
    }
}

fn case_label(entry: &MessageEntry) -> Node {
    Node::label(format!("case MessageName::{}:", entry.wire_name))
}

fn return_receiver(name: &str) -> Node {
    Node::line(format!("return ReceiverName::{};", name))
}

/// Render entries under their receiver and message guards, with consecutive
/// entries sharing a guard sharing one `#if`.
fn guarded_runs(entries: &[&MessageEntry], render: impl Fn(&MessageEntry) -> Vec<Node>) -> Vec<Node> {
    runs(entries, |m| &m.receiver_condition)
        .into_iter()
        .map(|run| {
            Node::guarded(
                run[0].receiver_condition.as_deref(),
                message_runs(run, &render),
            )
        })
        .collect()
}

/// Like [`guarded_runs`] for entries already inside their receiver guard.
fn message_runs(entries: &[&MessageEntry], render: impl Fn(&MessageEntry) -> Vec<Node>) -> Vec<Node> {
    runs(entries, |m| &m.message_condition)
        .into_iter()
        .map(|run| {
            Node::guarded(
                run[0].message_condition.as_deref(),
                run.iter().flat_map(|m| render(*m)).collect(),
            )
        })
        .collect()
}

/// Split into maximal runs of consecutive entries with equal keys.
fn runs<'e, 'm, K: PartialEq>(
    entries: &'e [&'m MessageEntry],
    key: impl Fn(&'m MessageEntry) -> K,
) -> Vec<&'e [&'m MessageEntry]> {
    let mut runs = Vec::new();
    let mut start = 0;
    for index in 1..=entries.len() {
        if index == entries.len() || key(entries[index]) != key(entries[start]) {
            runs.push(&entries[start..index]);
            start = index;
        }
    }
    runs
}

fn check_capacity(what: &'static str, count: usize, max: usize) -> GenerateResult<()> {
    if count > max {
        return Err(GenerateError::RegistryOverflow { what, count, max });
    }
    Ok(())
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use crate::ast::Formatter;
    use crate::model::{Message, Reply};
    use proptest::prelude::*;

    fn arb_receivers() -> impl Strategy<Value = Vec<Receiver>> {
        prop::collection::vec(prop::collection::vec(any::<bool>(), 0..6), 0..5).prop_map(|shapes| {
            shapes
                .into_iter()
                .enumerate()
                .map(|(r, messages)| {
                    messages.into_iter().enumerate().fold(
                        Receiver::new(format!("Receiver{}", r)),
                        |receiver, (m, is_async)| {
                            let message = Message::new(format!("Message{}", m));
                            let message = if is_async {
                                message.with_reply(Reply::Async(Vec::new()))
                            } else {
                                message
                            };
                            receiver.with_message(message)
                        },
                    )
                })
                .collect()
        })
    }

    fn arb_guarded_receivers() -> impl Strategy<Value = Vec<Receiver>> {
        let message = (any::<bool>(), any::<bool>());
        let receiver = (any::<bool>(), prop::collection::vec(message, 0..5));
        prop::collection::vec(receiver, 0..4).prop_map(|shapes| {
            shapes
                .into_iter()
                .enumerate()
                .map(|(r, (guarded, messages))| {
                    let mut receiver = Receiver::new(format!("Receiver{}", r));
                    if guarded {
                        receiver = receiver.with_condition(format!("ENABLE(R{})", r));
                    }
                    messages
                        .into_iter()
                        .enumerate()
                        .fold(receiver, |receiver, (m, (is_async, guarded))| {
                            let mut message = Message::new(format!("Message{}", m));
                            if is_async {
                                message = message.with_reply(Reply::Async(Vec::new()));
                            }
                            if guarded {
                                message = message.with_condition(format!("ENABLE(R{}M{})", r, m));
                            }
                            receiver.with_message(message)
                        })
                })
                .collect()
        })
    }

    /// Each named line in `section` with the `#if` conditions open around it.
    fn guards_at<'s>(
        section: &'s str,
        name_of: impl Fn(&'s str) -> Option<&'s str>,
    ) -> Vec<(String, Vec<String>)> {
        let mut open: Vec<String> = Vec::new();
        let mut found = Vec::new();
        for line in section.lines().map(str::trim) {
            if let Some(condition) = line.strip_prefix("#if ") {
                open.push(condition.to_string());
            } else if line.starts_with("#endif") {
                open.pop();
            } else if let Some(name) = name_of(line) {
                found.push((name.to_string(), open.clone()));
            }
        }
        found
    }

    fn case_name(line: &str) -> Option<&str> {
        line.strip_prefix("case MessageName::")?.strip_suffix(':')
    }

    fn enumerator_name(line: &str) -> Option<&str> {
        line.strip_suffix(',')?.split_once(" = ").map(|(name, _)| name)
    }

    fn expected_guards(entry: &MessageEntry) -> Vec<String> {
        entry
            .receiver_condition
            .iter()
            .chain(&entry.message_condition)
            .cloned()
            .collect()
    }

    proptest! {
        /// Every `MessageName` enumerator has exactly one case in each lookup
        /// switch, under the same guards it is declared with.
        #[test]
        fn prop_rendered_switches_cover_every_enumerator(receivers in arb_guarded_receivers()) {
            let registry = MessageRegistry::build(&receivers).unwrap();
            let formatter = Formatter::default();
            let header = formatter.render(&registry.header());
            let implementation = formatter.render(&registry.implementation());

            let enum_start = header.find("enum class MessageName : uint16_t").unwrap();
            let enum_end = enum_start + header[enum_start..].find("};").unwrap();
            let enumerators = guards_at(&header[enum_start..enum_end], enumerator_name);
            let expected: Vec<(String, Vec<String>)> = registry
                .messages()
                .iter()
                .map(|m| (m.wire_name.clone(), expected_guards(m)))
                .collect();
            prop_assert_eq!(&enumerators, &expected);

            let description = implementation.find("const char* description(MessageName name)").unwrap();
            let receiver_name = implementation.find("ReceiverName receiverName(MessageName messageName)").unwrap();
            let is_valid = implementation.find("bool isValidMessageName(MessageName messageName)").unwrap();
            prop_assert!(description < receiver_name && receiver_name < is_valid);

            let sections = [
                &implementation[description..receiver_name],
                &implementation[receiver_name..is_valid],
                &implementation[is_valid..],
            ];
            for section in sections {
                prop_assert_eq!(section.matches("#if ").count(), section.matches("#endif").count());

                let mut cases = guards_at(section, case_name);
                cases.sort();
                let mut wanted = expected.clone();
                wanted.sort();
                prop_assert_eq!(cases, wanted);
            }

            let valid = sections[2];
            let last_case = valid.rfind("case MessageName::").unwrap();
            let accept = valid.find("        return true;\n    }\n").unwrap();
            let reject = valid.find("    return false;\n}").unwrap();
            prop_assert!(last_case < accept && accept < reject);
            prop_assert_eq!(valid.matches("return true;").count(), 1);
        }

        /// One entry per message, one more per async message, plus the
        /// runtime messages; identifiers are 1..=n without gaps.
        #[test]
        fn prop_identifiers_dense_and_unique(receivers in arb_receivers()) {
            let registry = MessageRegistry::build(&receivers).unwrap();
            let messages: usize = receivers.iter().map(|r| r.messages.len()).sum();
            let replies = receivers
                .iter()
                .flat_map(|r| &r.messages)
                .filter(|m| m.reply.is_async())
                .count();
            let expected = messages + replies + INFRASTRUCTURE_MESSAGES.len();

            prop_assert_eq!(registry.messages().len(), expected);
            prop_assert_eq!(registry.max_message_id() as usize, expected);
            for (index, entry) in registry.messages().iter().enumerate() {
                prop_assert_eq!(entry.id as usize, index + 1);
            }
        }

        /// Every identifier resolves to exactly one receiver and a description;
        /// the one past the end does not.
        #[test]
        fn prop_membership(receivers in arb_receivers()) {
            let registry = MessageRegistry::build(&receivers).unwrap();
            for id in 1..=registry.max_message_id() {
                prop_assert!(registry.is_valid_message_id(id));
                prop_assert!(registry.receiver_name_of(id).is_some());
                prop_assert!(registry.description_of(id).is_some());
            }
            prop_assert!(!registry.is_valid_message_id(registry.max_message_id() + 1));
        }
    }
}
