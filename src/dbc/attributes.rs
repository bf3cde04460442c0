use crate::dbc::{message_key_by_raw_id, strings};
use crate::types::database::{Database, MessageKey};

/// Attribute assignments (`BA_`) the catalog cares about:
/// - `BA_ "DBName" "TestCAN";`
/// - `BA_ "GenMsgCycleTime" BO_ <ID> 100;`
/// - `BA_ "GenSigStartValue" SG_ <ID> <SIGNAL> 1;`
///
/// Other attributes are ignored.
pub(crate) fn decode(db: &mut Database, line: &str) {
    // Trim ending ';' and split by ASCII whitespace.
    let line: &str = line.trim().trim_end_matches(';');
    let mut parts = line.split_ascii_whitespace().skip(1); // BA_

    // Attribute name (e.g., "\"DBName\"")
    let attr_name: &str = match parts.next() {
        Some(a) => a.trim_matches('"'),
        None => return,
    };

    match attr_name {
        "DBName" => {
            if let Some((_, value, _)) = strings::split_quoted(skip_name(line)) {
                db.name = value;
            }
        }
        "GenMsgCycleTime" => {
            let (Some("BO_"), Some(raw_id), Some(value)) = (parts.next(), parts.next(), parts.next())
            else {
                return;
            };
            let Some(msg_key) = message_key_by_raw_id(db, raw_id) else {
                return;
            };
            let Some(cycle) = parse_number(value) else {
                return;
            };
            if let Some(msg) = db.get_message_by_key_mut(msg_key) {
                // 0 is the conventional "not cyclic"
                msg.cycle_time = (cycle > 0.0).then_some(cycle as u32);
            }
        }
        "GenSigStartValue" => {
            let (Some("SG_"), Some(raw_id), Some(name), Some(value)) =
                (parts.next(), parts.next(), parts.next(), parts.next())
            else {
                return;
            };
            let Some(msg_key) = message_key_by_raw_id(db, raw_id) else {
                return;
            };
            let Some(sig_key) = db.get_signal_in_message(msg_key, name) else {
                return;
            };
            let Some(initial) = parse_number(value) else {
                return;
            };
            if let Some(sig) = db.get_sig_by_key_mut(sig_key) {
                sig.initial = Some(initial);
            }
        }
        _ => {}
    }
}

/// Everything after the quoted attribute name.
fn skip_name(line: &str) -> &str {
    strings::split_quoted(line).map_or("", |(_, _, after)| after)
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim_matches('"').parse::<f64>().ok()
}

/// Messages without an explicit bus take the database name.
pub(crate) fn apply_bus_name(db: &mut Database) {
    if db.name.is_empty() {
        return;
    }
    let name: String = db.name.clone();
    let keys: Vec<MessageKey> = db.messages_order.clone();
    for key in keys {
        if let Some(msg) = db.get_message_by_key_mut(key)
            && msg.bus_name.is_none()
        {
            msg.bus_name = Some(name.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{message::Message, signal::Signal};

    fn build_test_db() -> Database {
        let mut db: Database = Database::default();
        let key: MessageKey = db.add_message(Message {
            id: 0x100,
            name: "Engine".into(),
            byte_length: 8,
            ..Default::default()
        });
        db.add_signal(
            key,
            Signal {
                name: "Rpm".into(),
                ..Default::default()
            },
        );
        db.add_message(Message {
            id: 0x200,
            name: "Brake".into(),
            bus_name: Some("Chassis".into()),
            ..Default::default()
        });
        db
    }

    #[test]
    fn test_db_name_and_bus() {
        let mut db: Database = build_test_db();
        decode(&mut db, r#"BA_ "DBName" "Power Train";"#);
        assert_eq!(db.name, "Power Train");

        apply_bus_name(&mut db);
        assert_eq!(
            db.get_message_by_name("Engine").unwrap().bus_name.as_deref(),
            Some("Power Train")
        );
        // explicit bus is kept
        assert_eq!(
            db.get_message_by_name("Brake").unwrap().bus_name.as_deref(),
            Some("Chassis")
        );
    }

    #[test]
    fn test_cycle_time() {
        let mut db: Database = build_test_db();
        decode(&mut db, r#"BA_ "GenMsgCycleTime" BO_ 256 20;"#);
        assert_eq!(db.get_message_by_id(0x100).unwrap().cycle_time, Some(20));

        decode(&mut db, r#"BA_ "GenMsgCycleTime" BO_ 256 0;"#);
        assert_eq!(db.get_message_by_id(0x100).unwrap().cycle_time, None);

        // unknown message and unrelated attributes are ignored
        decode(&mut db, r#"BA_ "GenMsgCycleTime" BO_ 999 10;"#);
        decode(&mut db, r#"BA_ "BusType" "CAN FD";"#);
        assert_eq!(db.get_message_by_id(0x200).unwrap().cycle_time, None);
    }

    #[test]
    fn test_signal_start_value() {
        let mut db: Database = build_test_db();
        decode(&mut db, r#"BA_ "GenSigStartValue" SG_ 256 Rpm 800;"#);
        let (_, sig) = db.iter_signals().next().unwrap();
        assert_eq!(sig.initial, Some(800.0));
    }
}
