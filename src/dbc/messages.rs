use crate::dbc::{ParseState, message_key_by_raw_id, split_raw_id, strings};
use crate::types::{
    database::{Database, MessageKey},
    errors::DecodeError,
    message::{IdFormat, Message},
};

use tracing::warn;

/// Placeholder used by DBC editors when a message or signal has no sender/receiver.
pub(crate) const NO_NODE: &str = "Vector__XXX";

/// Pseudo message collecting signals that belong to no frame.
const INDEPENDENT_SIG_MSG: &str = "VECTOR__INDEPENDENT_SIG_MSG";

/// `BO_ <ID> <MESSAGE_NAME>: <BYTES_LENGTH> <SENDER_NODE>`
pub(crate) fn decode(
    db: &mut Database,
    state: &mut ParseState,
    line: &str,
    line_no: usize,
) -> Result<(), DecodeError> {
    let mut parts = line
        .split_ascii_whitespace()
        .skip(1) // BO_
        .filter(|p| *p != ":");

    let raw_id: Option<u32> = parts.next().and_then(|s| s.parse().ok());
    let name: &str = parts.next().unwrap_or("").trim_end_matches(':');
    let byte_length: Option<u16> = parts.next().and_then(|s| s.parse().ok());
    let sender: &str = parts.next().unwrap_or("");

    let (Some(raw_id), Some(byte_length)) = (raw_id, byte_length) else {
        return Err(DecodeError::Malformed {
            line: line_no,
            reason: format!("unreadable message definition '{}'", line),
        });
    };
    if name.is_empty() {
        return Err(DecodeError::Malformed {
            line: line_no,
            reason: "message without a name".to_string(),
        });
    }

    state.current_mux = None;
    if name == INDEPENDENT_SIG_MSG {
        state.current_msg = None;
        state.skip_signals = true;
        return Ok(());
    }
    state.skip_signals = false;

    let (id, extended) = split_raw_id(raw_id);
    let senders: Vec<String> = if sender.is_empty() || sender == NO_NODE {
        Vec::new()
    } else {
        vec![sender.to_string()]
    };

    if db.get_msg_key_by_name(name).is_some() {
        warn!(line = line_no, name, "duplicate message name, later definition wins the lookup");
    }

    let msg_key: MessageKey = db.add_message(Message {
        id_format: if extended {
            IdFormat::Extended
        } else {
            IdFormat::Standard
        },
        id,
        name: name.to_string(),
        byte_length,
        senders,
        ..Default::default()
    });
    state.current_msg = Some(msg_key);
    Ok(())
}

/// `BO_TX_BU_ <ID> : <NODE1>,<NODE2>;`
pub(crate) fn decode_tx_nodes(db: &mut Database, line: &str) {
    let mut halves = line.splitn(2, ':');
    let left: &str = halves.next().unwrap_or("");
    let right: &str = halves.next().unwrap_or("");

    let Some(raw_id) = left.split_ascii_whitespace().nth(1) else {
        return;
    };
    let Some(msg_key) = message_key_by_raw_id(db, raw_id) else {
        return;
    };

    let names: Vec<String> = right
        .split([',', ' ', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != NO_NODE)
        .map(str::to_string)
        .collect();

    for name in &names {
        db.add_node_if_absent(name);
    }
    if let Some(msg) = db.get_message_by_key_mut(msg_key) {
        for name in names {
            if !msg.senders.iter().any(|s| s.eq_ignore_ascii_case(&name)) {
                msg.senders.push(name);
            }
        }
    }
}

/// `CM_ BO_ <ID> "Comment...";`
pub(crate) fn comments(db: &mut Database, line: &str) {
    let Some((head, comment, _)) = strings::split_quoted(line) else {
        return;
    };
    let Some(raw_id) = head.split_ascii_whitespace().nth(2) else {
        return;
    };
    let Some(msg_key) = message_key_by_raw_id(db, raw_id) else {
        return;
    };
    if let Some(msg) = db.get_message_by_key_mut(msg_key) {
        msg.comment = Some(comment);
    }
}
