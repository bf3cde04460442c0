//! Database model (SlotMap-backed).
//!
//! One [`Database`] is the in-memory object graph of a decoded bus-definition file.
//! Storage uses **SlotMap** arenas with **stable keys**: [`NodeKey`], [`MessageKey`], [`SignalKey`].
//! Public iteration follows the **order vectors** via `iter_nodes()`, `iter_messages()`, `iter_signals()`,
//! which keep the order in which the decoder added the entries.
//!
//! **Lookups** are normalized: `get_message_by_id/_hex/_name`, `get_node_by_name`.
//! Names are case-insensitive; hexadecimal IDs use the uppercase `0x...` form.
//!
//! A `Database` is built once (by a decoder or a test fixture) and never edited afterwards:
//! the catalog hands it out behind an `Rc`.

use slotmap::{SlotMap, new_key_type};
use std::collections::HashMap;

use crate::types::{message::Message, node::Node, signal::Signal};

// --- Stable keys (SlotMap) ---
new_key_type! { pub struct NodeKey; }
new_key_type! { pub struct MessageKey; }
new_key_type! { pub struct SignalKey; }

/// In-memory representation of one loaded CAN database.
#[derive(Default, Clone, Debug)]
pub struct Database {
    // --- General information ---
    /// Logical database name (`BA_ "DBName"`), empty if not declared.
    pub name: String,
    /// Version string (`VERSION`).
    pub version: String,

    // --- Main storage (stable-key maps) ---
    pub nodes: SlotMap<NodeKey, Node>,
    pub messages: SlotMap<MessageKey, Message>,
    pub signals: SlotMap<SignalKey, Signal>,

    // --- Order "views" ---
    pub nodes_order: Vec<NodeKey>,
    pub messages_order: Vec<MessageKey>,
    pub signals_order: Vec<SignalKey>,

    // --- Lookups (case-normalized) ---
    pub(crate) node_key_by_name: HashMap<String, NodeKey>, // lower(name) → NodeKey
    pub(crate) msg_key_by_id: HashMap<(u32, bool), MessageKey>, // (id, extended) → MessageKey
    pub(crate) msg_key_by_hex: HashMap<String, MessageKey>, // "0x...." uppercase → MessageKey
    pub(crate) msg_key_by_name: HashMap<String, MessageKey>, // lower(name) → MessageKey
}

impl Database {
    // --------- Nodes --------
    /// Adds a node if not already present and returns the corresponding `NodeKey`.
    pub fn add_node_if_absent(&mut self, name: &str) -> NodeKey {
        if let Some(key) = self.get_node_key_by_name(name) {
            return key;
        }
        let key: NodeKey = self.nodes.insert(Node {
            name: name.to_string(),
            comment: None,
        });
        self.nodes_order.push(key);
        self.node_key_by_name.insert(name.to_lowercase(), key);
        key
    }

    pub fn get_node_key_by_name(&self, name: &str) -> Option<NodeKey> {
        self.node_key_by_name.get(&name.to_lowercase()).copied()
    }

    pub fn get_node_by_key(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Returns a `&Node` given the name (case-insensitive).
    pub fn get_node_by_name(&self, name: &str) -> Option<&Node> {
        let key: NodeKey = self.get_node_key_by_name(name)?;
        self.nodes.get(key)
    }

    /// Returns a `&mut Node` given the name (case-insensitive).
    pub fn get_node_by_name_mut(&mut self, name: &str) -> Option<&mut Node> {
        let key: NodeKey = self.get_node_key_by_name(name)?;
        self.nodes.get_mut(key)
    }

    // ------------- Messages ------------
    /// Adds a message and indexes its id/hex/name.
    ///
    /// `id_hex` is recomputed from `id`, and `signals` is reset: signals are attached
    /// afterwards through [`Database::add_signal`]. Sender names that are not yet known
    /// nodes are registered as nodes, like the DBC `BU_` list would.
    pub fn add_message(&mut self, mut msg: Message) -> MessageKey {
        msg.id_hex = format_id_hex(msg.id);
        msg.signals.clear();

        for sender in msg.senders.clone() {
            self.add_node_if_absent(&sender);
        }

        let id_key = (msg.id, msg.is_extended());
        let hex: String = msg.id_hex.clone();
        let name: String = msg.name.to_lowercase();

        let msg_key: MessageKey = self.messages.insert(msg);
        self.messages_order.push(msg_key);

        self.msg_key_by_id.insert(id_key, msg_key);
        self.msg_key_by_hex.insert(hex, msg_key);
        self.msg_key_by_name.insert(name, msg_key);
        msg_key
    }

    pub fn get_msg_key_by_name(&self, name: &str) -> Option<MessageKey> {
        self.msg_key_by_name.get(&name.to_lowercase()).copied()
    }

    /// Standard ids are preferred over extended ones sharing the same number.
    pub fn get_msg_key_by_id(&self, id: u32) -> Option<MessageKey> {
        self.msg_key_by_id
            .get(&(id, false))
            .or_else(|| self.msg_key_by_id.get(&(id, true)))
            .copied()
    }

    /// The argument may come in various forms, e.g. `"12dd54e3"`, `"0x12dd54e3"`, `"12DD54E3x"`.
    pub fn get_msg_key_by_id_hex(&self, id_hex: &str) -> Option<MessageKey> {
        self.msg_key_by_hex.get(&normalize_id_hex(id_hex)).copied()
    }

    pub fn get_message_by_key(&self, key: MessageKey) -> Option<&Message> {
        self.messages.get(key)
    }

    pub(crate) fn get_message_by_key_mut(&mut self, key: MessageKey) -> Option<&mut Message> {
        self.messages.get_mut(key)
    }

    /// Returns a `&Message` given the numeric CAN ID.
    pub fn get_message_by_id(&self, id: u32) -> Option<&Message> {
        self.get_message_by_key(self.get_msg_key_by_id(id)?)
    }

    /// Returns a `&Message` given a hexadecimal ID (case-insensitive).
    pub fn get_message_by_id_hex(&self, id_hex: &str) -> Option<&Message> {
        self.get_message_by_key(self.get_msg_key_by_id_hex(id_hex)?)
    }

    /// Returns a `&Message` given the name (case-insensitive).
    pub fn get_message_by_name(&self, name: &str) -> Option<&Message> {
        self.get_message_by_key(self.get_msg_key_by_name(name)?)
    }

    // -------------- Signals ------------
    /// Adds a signal to the message `msg_key` and returns its key.
    ///
    /// Returns `None` if the message does not exist. A signal whose name already exists
    /// inside the same message is not added twice; the existing key is returned.
    pub fn add_signal(&mut self, msg_key: MessageKey, mut sig: Signal) -> Option<SignalKey> {
        let msg: &Message = self.messages.get(msg_key)?;
        if let Some(existing) = msg
            .signals
            .iter()
            .copied()
            .find(|&sk| self.signals.get(sk).is_some_and(|s| s.name == sig.name))
        {
            return Some(existing);
        }

        sig.message = msg_key;
        let sig_key: SignalKey = self.signals.insert(sig);
        self.signals_order.push(sig_key);
        if let Some(m) = self.messages.get_mut(msg_key) {
            m.signals.push(sig_key);
        }
        Some(sig_key)
    }

    pub fn get_sig_by_key(&self, key: SignalKey) -> Option<&Signal> {
        self.signals.get(key)
    }

    pub(crate) fn get_sig_by_key_mut(&mut self, key: SignalKey) -> Option<&mut Signal> {
        self.signals.get_mut(key)
    }

    /// Returns the signal called `name` inside the message `msg_key`.
    ///
    /// An exact match wins; otherwise the first case-insensitive match is returned,
    /// since names may differ only by case inside one message.
    pub fn get_signal_in_message(&self, msg_key: MessageKey, name: &str) -> Option<SignalKey> {
        let msg: &Message = self.get_message_by_key(msg_key)?;
        let named = |pred: &dyn Fn(&str) -> bool| {
            msg.signals
                .iter()
                .copied()
                .find(|&sk| self.get_sig_by_key(sk).is_some_and(|s| pred(&s.name)))
        };
        named(&|n: &str| n == name).or_else(|| named(&|n: &str| n.eq_ignore_ascii_case(name)))
    }

    // -------------- Iteration ------------
    /// Iterate nodes following `nodes_order`.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes_order.iter().filter_map(|&k| self.nodes.get(k))
    }

    /// Iterate messages following `messages_order`, yielding their keys too.
    pub fn iter_messages(&self) -> impl Iterator<Item = (MessageKey, &Message)> + '_ {
        self.messages_order
            .iter()
            .filter_map(|&k| self.messages.get(k).map(|m| (k, m)))
    }

    /// Iterate signals in message order, then in the order they appear inside each message.
    pub fn iter_signals(&self) -> impl Iterator<Item = (SignalKey, &Signal)> + '_ {
        self.iter_messages().flat_map(move |(_, msg)| {
            msg.signals
                .iter()
                .filter_map(move |&sk| self.signals.get(sk).map(|s| (sk, s)))
        })
    }

    /// Total number of signals across all messages.
    pub fn signal_count(&self) -> usize {
        self.iter_messages().map(|(_, m)| m.signals.len()).sum()
    }

    // -------------- Node cross references ------------
    /// Messages listing `node` among their senders (case-insensitive), in message order.
    pub fn messages_sent_by<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a Message> + 'a {
        self.iter_messages()
            .map(|(_, m)| m)
            .filter(move |m| m.senders.iter().any(|s| s.eq_ignore_ascii_case(node)))
    }

    /// Signals listing `node` among their receivers (case-insensitive), in signal order.
    pub fn signals_received_by<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a Signal> + 'a {
        self.iter_signals()
            .map(|(_, s)| s)
            .filter(move |s| s.receivers.iter().any(|r| r.eq_ignore_ascii_case(node)))
    }
}

// --- helpers ---

/// Formats a frame id the way every view shows it: `0x` prefix, uppercase, no leading zeros.
pub fn format_id_hex(id: u32) -> String {
    format!("0x{:X}", id)
}

/// Normalizes a hexadecimal ID string.
///
/// Converts variants such as `"12DD54E3x"`, `"0x12dd54e3"`, `"0x0012dd54e3"`
/// into the canonical form `"0x12DD54E3"`.
pub fn normalize_id_hex(s: &str) -> String {
    let t: &str = s.trim();
    let t: &str = t
        .strip_suffix('x')
        .or_else(|| t.strip_suffix('X'))
        .unwrap_or(t);
    let t: &str = t
        .strip_prefix("0x")
        .or_else(|| t.strip_prefix("0X"))
        .unwrap_or(t);
    match u64::from_str_radix(t, 16) {
        Ok(v) => format!("0x{:X}", v),
        Err(_) => format!("0x{}", t.to_uppercase()),
    }
}
