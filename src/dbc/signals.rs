use crate::dbc::{ParseState, message_key_by_raw_id, messages::NO_NODE, strings};
use crate::types::{
    database::{Database, MessageKey, SignalKey},
    errors::DecodeError,
    signal::{ByteOrder, Signal},
};

use tracing::warn;

/// Decode a `SG_` line belonging to the **current message** (the last parsed BO_).
/// Format (typical):
/// SG_ <name> [M|mX|mXM]: <bit_start>|<bit_length>@<endian><sign> (<factor>,<offset>) [<min>|<max>] "<unit>" <receivers...>
pub(crate) fn decode(
    db: &mut Database,
    state: &mut ParseState,
    line: &str,
    line_no: usize,
) -> Result<(), DecodeError> {
    let Some(msg_key) = state.current_msg else {
        if state.skip_signals {
            return Ok(());
        }
        return Err(DecodeError::Malformed {
            line: line_no,
            reason: "signal defined outside of a message".to_string(),
        });
    };

    let Some((left, right)) = line.split_once(':') else {
        warn!(line = line_no, "signal line without ':' skipped");
        return Ok(());
    };

    // Left part analysis SG_ NAME [M|mX]
    let mut left_it = left.split_ascii_whitespace().skip(1);
    let name: &str = left_it.next().unwrap_or("");
    if name.is_empty() {
        warn!(line = line_no, "signal without a name skipped");
        return Ok(());
    }
    let mut sig: Signal = Signal {
        name: name.to_string(),
        ..Default::default()
    };
    if let Some(tag) = left_it.next() {
        decode_mux_tag(&mut sig, tag, state);
    }

    // 1) bit info: "63|1@1+"
    let right: &str = right.trim_start();
    let bit_info: &str = right.split_ascii_whitespace().next().unwrap_or("");
    let Some((pos_len, order_sign)) = bit_info.split_once('@') else {
        warn!(line = line_no, signal = name, "signal without bit layout skipped");
        return Ok(());
    };
    let (start, length) = pos_len.split_once('|').unwrap_or((pos_len, ""));
    let (Ok(bit_start), Ok(bit_length)) = (start.parse::<u16>(), length.parse::<u16>()) else {
        warn!(line = line_no, signal = name, "signal with unreadable bit layout skipped");
        return Ok(());
    };
    sig.bit_start = bit_start;
    sig.bit_length = bit_length;
    sig.byte_order = if order_sign.starts_with('0') {
        ByteOrder::BigEndian
    } else {
        ByteOrder::LittleEndian
    };
    sig.is_signed = order_sign.ends_with('-');

    // 2) "(factor,offset)"
    let mut rest: &str = &right[bit_info.len()..];
    if let Some((inner, after)) = enclosed(rest, '(', ')') {
        let mut nums = inner.split(',').map(str::trim);
        sig.factor = nums.next().and_then(|s| s.parse().ok()).unwrap_or(1.0);
        sig.offset = nums.next().and_then(|s| s.parse().ok()).unwrap_or(0.0);
        rest = after;
    }

    // 3) "[min|max]", [0|0] means "not specified"
    if let Some((inner, after)) = enclosed(rest, '[', ']') {
        let mut nums = inner.split('|').map(str::trim);
        let min: Option<f64> = nums.next().and_then(|s| s.parse().ok());
        let max: Option<f64> = nums.next().and_then(|s| s.parse().ok());
        if !(min == Some(0.0) && max == Some(0.0)) {
            sig.minimum = min;
            sig.maximum = max;
        }
        rest = after;
    }

    // 4) "unit"
    if let Some((_, unit, after)) = strings::split_quoted(rest) {
        if !unit.is_empty() {
            sig.unit = Some(unit);
        }
        rest = after;
    }

    // 5) receivers (comma or space separated)
    sig.receivers = rest
        .split([',', ' ', '\t', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != NO_NODE)
        .map(str::to_string)
        .collect();
    for receiver in sig.receivers.clone() {
        db.add_node_if_absent(&receiver);
    }

    db.add_signal(msg_key, sig);
    Ok(())
}

/// `M`: multiplexer switch; `m3`: present when the switch is 3; `m3M`: both.
fn decode_mux_tag(sig: &mut Signal, tag: &str, state: &mut ParseState) {
    if tag == "M" {
        sig.is_multiplexer = true;
        state.current_mux = Some(sig.name.clone());
        return;
    }
    let Some(body) = tag.strip_prefix('m') else {
        return;
    };
    let (digits, switch) = match body.strip_suffix('M') {
        Some(d) => (d, true),
        None => (body, false),
    };
    if let Ok(id) = digits.parse::<u32>() {
        sig.multiplexer_ids = Some(vec![id]);
        sig.multiplexer_signal = state.current_mux.clone();
    }
    if switch {
        sig.is_multiplexer = true;
        state.current_mux = Some(sig.name.clone());
    }
}

/// Returns the text between the first `open` and the next `close`, and what follows.
fn enclosed(s: &str, open: char, close: char) -> Option<(&str, &str)> {
    let start: usize = s.find(open)?;
    let end: usize = start + s[start..].find(close)?;
    Some((&s[start + open.len_utf8()..end], &s[end + close.len_utf8()..]))
}

/// Skips `n` whitespace-separated tokens.
fn skip_tokens(mut s: &str, n: usize) -> &str {
    for _ in 0..n {
        s = s.trim_start();
        let end: usize = s.find(char::is_whitespace).unwrap_or(s.len());
        s = &s[end..];
    }
    s.trim_start()
}

fn signal_key(db: &Database, raw_id: &str, name: &str) -> Option<SignalKey> {
    let msg_key: MessageKey = message_key_by_raw_id(db, raw_id)?;
    db.get_signal_in_message(msg_key, name)
}

/// `CM_ SG_ <ID> <SIGNAL> "Comment...";`
pub(crate) fn comments(db: &mut Database, line: &str) {
    let Some((head, comment, _)) = strings::split_quoted(line) else {
        return;
    };
    let mut head_it = head.split_ascii_whitespace().skip(2);
    let (Some(raw_id), Some(name)) = (head_it.next(), head_it.next()) else {
        return;
    };
    if let Some(sk) = signal_key(db, raw_id, name)
        && let Some(sig) = db.get_sig_by_key_mut(sk)
    {
        sig.comment = Some(comment);
    }
}

/// `VAL_ <ID> <SIGNAL> 1 "On" 0 "Off" ;`
pub(crate) fn decode_choices(db: &mut Database, line: &str) {
    let mut parts = line.split_ascii_whitespace().skip(1);
    let (Some(raw_id), Some(name)) = (parts.next(), parts.next()) else {
        return;
    };
    // environment variable tables (`VAL_ EnvVar 0 "x";`) have no message id
    let Some(sk) = signal_key(db, raw_id, name) else {
        return;
    };

    let mut rest: &str = skip_tokens(line, 3);
    let mut choices: Vec<(i64, String)> = Vec::new();
    while let Some((value, label, after)) = strings::split_quoted(rest) {
        let value: &str = value.trim();
        let parsed: Option<i64> = value
            .parse::<i64>()
            .ok()
            .or_else(|| value.parse::<f64>().ok().map(|v| v as i64));
        if let Some(v) = parsed {
            choices.push((v, label));
        }
        rest = after;
    }

    if let Some(sig) = db.get_sig_by_key_mut(sk) {
        sig.choices.extend(choices);
    }
}

/// Gated signals parsed before their switch get it assigned when the message
/// has exactly one multiplexer.
pub(crate) fn link_multiplexers(db: &mut Database) {
    let mut plans: Vec<(SignalKey, String)> = Vec::new();
    for (_, msg) in db.iter_messages() {
        let switches: Vec<&Signal> = msg.signals(db).filter(|s| s.is_multiplexer).collect();
        let [switch] = switches.as_slice() else {
            continue;
        };
        for &sk in &msg.signals {
            if db.get_sig_by_key(sk).is_some_and(|s| {
                s.multiplexer_ids.is_some() && s.multiplexer_signal.is_none() && s.name != switch.name
            }) {
                plans.push((sk, switch.name.clone()));
            }
        }
    }

    for (sk, switch) in plans {
        if let Some(sig) = db.get_sig_by_key_mut(sk) {
            sig.multiplexer_signal = Some(switch);
        }
    }
}
