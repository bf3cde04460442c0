//! Hierarchical outline of a database: nodes, messages with their signals, and a
//! name-ordered index of every signal.

use serde::Serialize;
use tracing::debug;

use crate::config::ViewConfig;
use crate::types::{
    database::{Database, MessageKey, SignalKey},
    message::Message,
    node::Node,
    signal::Signal,
};
use crate::view::signals_by_name;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize)]
pub enum TreeNodeKind {
    Root,
    Group,
    Node,
    Message(MessageKey),
    Signal {
        message: MessageKey,
        signal: SignalKey,
    },
    /// Descriptive leaf line.
    Detail,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct TreeNode {
    pub label: String,
    pub kind: TreeNodeKind,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn new(label: impl Into<String>, kind: TreeNodeKind) -> Self {
        TreeNode {
            label: label.into(),
            kind,
            children: Vec::new(),
        }
    }

    fn detail(label: impl Into<String>) -> Self {
        TreeNode::new(label, TreeNodeKind::Detail)
    }

    /// First direct child labelled `label`.
    pub fn child(&self, label: &str) -> Option<&TreeNode> {
        self.children.iter().find(|c| c.label == label)
    }

    /// Number of nodes in this subtree, itself included.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }
}

/// Builds the outline of `db`, rooted at `key`.
///
/// - `Nodes` (omitted when the database has none)
/// - `Messages`, each `name (0xHEX)` with a `Signals (n)` child when it has signals
/// - `All Signals (total)`, entries `signal - name (0xHEX)` ordered by signal name
pub fn build_tree(key: &str, db: &Database, config: &ViewConfig) -> TreeNode {
    let mut root: TreeNode = TreeNode::new(key, TreeNodeKind::Root);

    let nodes: Vec<TreeNode> = db.iter_nodes().map(|n| node_entry(db, n)).collect();
    if !nodes.is_empty() {
        let mut group: TreeNode = TreeNode::new("Nodes", TreeNodeKind::Group);
        group.children = nodes;
        root.children.push(group);
    }

    let mut messages: TreeNode = TreeNode::new("Messages", TreeNodeKind::Group);
    messages.children = db
        .iter_messages()
        .map(|(mk, msg)| message_entry(db, mk, msg))
        .collect();
    root.children.push(messages);

    let index: Vec<TreeNode> = signals_by_name(db, config.collation)
        .into_iter()
        .filter_map(|(sk, sig)| {
            let msg: &Message = db.get_message_by_key(sig.message)?;
            Some(TreeNode::new(
                format!("{} - {}", sig.name, msg.label()),
                TreeNodeKind::Signal {
                    message: sig.message,
                    signal: sk,
                },
            ))
        })
        .collect();
    let mut all: TreeNode = TreeNode::new(
        format!("All Signals ({})", index.len()),
        TreeNodeKind::Group,
    );
    all.children = index;
    root.children.push(all);

    debug!(key, nodes = root.size(), "tree projected");
    root
}

fn node_entry(db: &Database, node: &Node) -> TreeNode {
    let mut entry: TreeNode = TreeNode::new(node.name.as_str(), TreeNodeKind::Node);
    if let Some(comment) = &node.comment {
        entry.children.push(TreeNode::detail(format!("Comment: {}", comment)));
    }
    let sent: usize = db.messages_sent_by(&node.name).count();
    if sent > 0 {
        entry.children.push(TreeNode::detail(format!("Sends: {} messages", sent)));
    }
    let received: usize = db.signals_received_by(&node.name).count();
    if received > 0 {
        entry
            .children
            .push(TreeNode::detail(format!("Receives: {} signals", received)));
    }
    entry
}

fn message_entry(db: &Database, key: MessageKey, msg: &Message) -> TreeNode {
    let mut entry: TreeNode = TreeNode::new(msg.label(), TreeNodeKind::Message(key));
    if msg.signals.is_empty() {
        return entry;
    }

    let mut group: TreeNode = TreeNode::new(
        format!("Signals ({})", msg.signals.len()),
        TreeNodeKind::Group,
    );
    group.children = msg
        .signals
        .iter()
        .filter_map(|&sk| db.get_sig_by_key(sk).map(|sig| signal_entry(key, sk, sig)))
        .collect();
    entry.children.push(group);
    entry
}

fn signal_entry(message: MessageKey, key: SignalKey, sig: &Signal) -> TreeNode {
    let mut entry: TreeNode = TreeNode::new(
        sig.name.as_str(),
        TreeNodeKind::Signal {
            message,
            signal: key,
        },
    );
    entry.children = vec![
        TreeNode::detail(format!("Bits: {}", sig.bit_range())),
        TreeNode::detail(format!("Byte order: {}", sig.byte_order)),
        TreeNode::detail(if sig.is_signed { "Signed" } else { "Unsigned" }),
    ];
    if let Some(comment) = &sig.comment {
        entry.children.push(TreeNode::detail(format!("Comment: {}", comment)));
    }
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::engine_brake_db;

    fn labels(node: &TreeNode) -> Vec<&str> {
        node.children.iter().map(|c| c.label.as_str()).collect()
    }

    #[test]
    fn test_build_tree() {
        let db: Database = engine_brake_db();
        let tree: TreeNode = build_tree("car.dbc", &db, &ViewConfig::default());

        assert_eq!(tree.label, "car.dbc");
        assert_eq!(tree.kind, TreeNodeKind::Root);
        assert_eq!(labels(&tree), vec!["Nodes", "Messages", "All Signals (2)"]);

        let nodes: &TreeNode = tree.child("Nodes").unwrap();
        assert_eq!(labels(nodes), vec!["ECU", "Dash"]);
        assert_eq!(
            labels(nodes.child("ECU").unwrap()),
            vec!["Comment: Engine control unit", "Sends: 1 messages"]
        );
        assert_eq!(labels(nodes.child("Dash").unwrap()), vec!["Receives: 1 signals"]);

        let messages: &TreeNode = tree.child("Messages").unwrap();
        assert_eq!(labels(messages), vec!["Engine (0x100)", "Brake (0x200)"]);
        assert!(messages.child("Brake (0x200)").unwrap().children.is_empty());

        let signals: &TreeNode = messages
            .child("Engine (0x100)")
            .unwrap()
            .child("Signals (2)")
            .unwrap();
        assert_eq!(labels(signals), vec!["A", "B"]);
        assert_eq!(
            labels(signals.child("A").unwrap()),
            vec!["Bits: 0|8", "Byte order: little_endian", "Unsigned", "Comment: Engine speed"]
        );
        assert_eq!(
            labels(signals.child("B").unwrap()),
            vec!["Bits: 8|4", "Byte order: big_endian", "Signed"]
        );

        let all: &TreeNode = tree.child("All Signals (2)").unwrap();
        assert_eq!(labels(all), vec!["A - Engine (0x100)", "B - Engine (0x100)"]);
    }

    #[test]
    fn test_empty_database() {
        let tree: TreeNode = build_tree("empty.dbc", &Database::default(), &ViewConfig::default());
        assert_eq!(labels(&tree), vec!["Messages", "All Signals (0)"]);
        assert_eq!(tree.size(), 3);
    }

    #[test]
    fn test_tree_is_a_pure_function() {
        let db: Database = engine_brake_db();
        let config: ViewConfig = ViewConfig::default();
        assert_eq!(build_tree("k", &db, &config), build_tree("k", &db, &config));
    }
}
