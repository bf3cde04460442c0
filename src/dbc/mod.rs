//! # dbc
//!
//! Built-in decoder turning `.dbc` files into a [`Database`]. It is the default
//! collaborator plugged into the catalog through the [`Decode`] trait.

mod attributes;
mod messages;
mod nodes;
mod signals;
mod strings;

use crate::catalog::Decode;
use crate::types::{
    database::{Database, MessageKey},
    errors::DecodeError,
};

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Read};

use encoding_rs::WINDOWS_1252;
use tracing::debug;

/// [`Decode`] implementation reading `.dbc` files from disk.
#[derive(Default, Clone, Copy, Debug)]
pub struct DbcDecoder;

impl Decode for DbcDecoder {
    fn decode(&self, path: &str) -> Result<Database, DecodeError> {
        parse_from_file(path)
    }
}

/// Parser state carried from one line to the next.
#[derive(Default, Debug)]
pub(crate) struct ParseState {
    /// Message owning the following `SG_` lines.
    pub(crate) current_msg: Option<MessageKey>,
    /// Last multiplexer switch seen inside `current_msg`.
    pub(crate) current_mux: Option<String>,
    /// `SG_` lines of the pseudo message `VECTOR__INDEPENDENT_SIG_MSG` are dropped.
    pub(crate) skip_signals: bool,
}

/// Parses a DBC file and returns a populated [`Database`] instance.
///
/// The file is read at once and handed to [`parse_from_bytes`].
///
/// # Errors
/// - [`DecodeError::InvalidExtension`] if the path does not end in `.dbc`.
/// - [`DecodeError::OpenFile`] / [`DecodeError::Read`] on I/O failures.
/// - [`DecodeError::Malformed`] if the content cannot describe a database.
pub fn parse_from_file(path: &str) -> Result<Database, DecodeError> {
    // check if provided file has .dbc format
    if !path.to_lowercase().ends_with(".dbc") {
        return Err(DecodeError::InvalidExtension {
            path: path.to_string(),
        });
    }

    let file: File = File::open(path).map_err(|source| DecodeError::OpenFile {
        path: path.to_string(),
        source,
    })?;
    let mut reader: BufReader<File> = BufReader::new(file);

    let mut bytes: Vec<u8> = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|source| DecodeError::Read {
            path: path.to_string(),
            source,
        })?;

    debug!(path, bytes = bytes.len(), "decoding dbc file");
    parse_from_bytes(&bytes)
}

/// Parses raw DBC content.
///
/// UTF-8 content is used as is; anything else is decoded as Windows-1252,
/// the encoding most DBC editors write.
pub fn parse_from_bytes(bytes: &[u8]) -> Result<Database, DecodeError> {
    let bytes: &[u8] = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let text: Cow<'_, str> = match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => {
            let (s, _, _) = WINDOWS_1252.decode(bytes);
            s
        }
    };
    parse_from_str(&text)
}

/// Parses DBC text line by line and fills a [`Database`]:
/// - **Version** (`VERSION`)
/// - **Nodes** (`BU_`)
/// - **Messages** (`BO_`) and **Signals** (`SG_`)
/// - **Sender nodes** (`BO_TX_BU_`)
/// - **Comments** for nodes, messages and signals (`CM_`, possibly multi-line)
/// - **Choices** (`VAL_`)
/// - **Attributes** `DBName`, `GenMsgCycleTime`, `GenSigStartValue` (`BA_`)
///
/// Unknown statements and unusable lines are skipped; a `BO_`/`SG_` line that cannot be
/// tied to a message aborts the decode, since the rest of the file would be misattributed.
pub fn parse_from_str(text: &str) -> Result<Database, DecodeError> {
    let lines: Vec<&str> = text.lines().collect();

    let mut db: Database = Database::default();
    let mut state: ParseState = ParseState::default();
    let mut recognized: bool = false;
    let mut i: usize = 0;

    while i < lines.len() {
        let line: &str = lines[i].trim();
        let line_no: usize = i + 1;

        // skip comments and empty lines
        if line.is_empty() || line.starts_with("//") {
            i += 1;
            continue;
        }

        let keyword: &str = line.split_ascii_whitespace().next().unwrap_or("");
        match keyword {
            "VERSION" => {
                recognized = true;
                db.version = strings::split_quoted(line)
                    .map(|(_, v, _)| v)
                    .unwrap_or_default();
            }
            "NS_" | "BS_:" | "BS_" => recognized = true,
            "BU_:" | "BU_" => {
                recognized = true;
                nodes::decode(&mut db, line);
            }
            "BO_" => {
                recognized = true;
                messages::decode(&mut db, &mut state, line, line_no)?;
            }
            "SG_" => signals::decode(&mut db, &mut state, line, line_no)?,
            "BO_TX_BU_" => messages::decode_tx_nodes(&mut db, line),
            "CM_" => {
                let mut full: String = line.to_string();
                if full.contains('"') {
                    strings::accumulate_quoted(&mut full, &lines, &mut i);
                }
                match full.split_ascii_whitespace().nth(1) {
                    Some("BU_") => nodes::comments(&mut db, &full),
                    Some("BO_") => messages::comments(&mut db, &full),
                    Some("SG_") => signals::comments(&mut db, &full),
                    _ => {}
                }
            }
            "VAL_" => signals::decode_choices(&mut db, line),
            "BA_" => attributes::decode(&mut db, line),
            _ => {}
        }

        i += 1;
    }

    if !recognized && !lines.iter().all(|l| l.trim().is_empty()) {
        return Err(DecodeError::Malformed {
            line: 1,
            reason: "no DBC statement found".to_string(),
        });
    }

    signals::link_multiplexers(&mut db);
    attributes::apply_bus_name(&mut db);

    debug!(
        messages = db.messages.len(),
        signals = db.signals.len(),
        nodes = db.nodes.len(),
        "dbc content decoded"
    );
    Ok(db)
}

/// Splits a raw DBC frame id into `(id, extended)`: bit 31 flags extended frames.
pub(crate) fn split_raw_id(raw: u32) -> (u32, bool) {
    (raw & 0x1FFF_FFFF, raw & 0x8000_0000 != 0)
}

/// Looks a message up by the raw id written in `CM_`, `VAL_`, `BA_`, `BO_TX_BU_` lines.
pub(crate) fn message_key_by_raw_id(db: &Database, raw: &str) -> Option<MessageKey> {
    let raw: u32 = raw.trim_end_matches(';').parse().ok()?;
    db.msg_key_by_id.get(&split_raw_id(raw)).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{message::Message, signal::ByteOrder};
    use std::io::Write;

    const TEST_DBC: &str = r#"
VERSION "1.0.2"

NS_ :
	NS_DESC_
	CM_
	BA_DEF_

BS_:

BU_: Motor Infotainment Gateway

BO_ 2527679645 Motor_01: 8 Motor
 SG_ Status : 61|1@1+ (1,0) [0|1] ""  Infotainment,Gateway
 SG_ Overheat : 62|1@1+ (1,0) [0|1] ""  Gateway
 SG_ Engine_Speed : 48|8@1+ (1,0) [0|255] "km/h" Infotainment
 SG_ Failure : 63|1@1+ (1,0) [0|1] "" Infotainment,Gateway

BO_ 708 ZV_04: 8 Vector__XXX
 SG_ Mux_Sel M : 0|2@1+ (1,0) [0|3] "" Vector__XXX
 SG_ Temp_A m0 : 8|8@0- (0.5,-40) [-40|87.5] "degC" Gateway
 SG_ Temp_B m1 : 8|8@0- (0.5,-40) [-40|87.5] "degC" Gateway

BO_ 3221225472 VECTOR__INDEPENDENT_SIG_MSG: 0 Vector__XXX
 SG_ Orphan : 0|8@1+ (1,0) [0|0] "" Vector__XXX

BO_TX_BU_ 2527679645 : Gateway;

CM_ BO_ 2527679645 "Funny comment about Motor_01";
CM_ SG_ 2527679645 Engine_Speed "This comment tells you
everything about Engine Speed.";
CM_ BU_ Motor "Motor ECU is really important for vehicle motion.";

BA_ "DBName" "TestCAN";
BA_ "GenMsgCycleTime" BO_ 2527679645 100;
BA_ "GenSigStartValue" SG_ 708 Mux_Sel 1;

VAL_ 2527679645 Status 1 "On" 0 "Off" ;
VAL_ 2527679645 Engine_Speed 255 "Error";
"#;

    fn message<'a>(db: &'a Database, name: &str) -> &'a Message {
        db.get_message_by_name(name).unwrap()
    }

    #[test]
    fn test_parse_from_str() {
        let db: Database = parse_from_str(TEST_DBC).unwrap();

        assert_eq!(db.version, "1.0.2");
        assert_eq!(db.name, "TestCAN");

        // --- Nodes ---
        let names: Vec<&str> = db.iter_nodes().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Motor", "Infotainment", "Gateway"]);
        assert_eq!(
            db.get_node_by_name("motor").unwrap().comment.as_deref(),
            Some("Motor ECU is really important for vehicle motion.")
        );

        // --- Messages ---
        assert_eq!(db.messages.len(), 2);
        let msg: &Message = message(&db, "Motor_01");
        assert_eq!(msg.id, 0x16A9549D);
        assert_eq!(msg.id_hex, "0x16A9549D");
        assert!(msg.is_extended());
        assert_eq!(msg.byte_length, 8);
        assert_eq!(msg.cycle_time, Some(100));
        assert_eq!(msg.senders, vec!["Motor", "Gateway"]);
        assert_eq!(msg.bus_name.as_deref(), Some("TestCAN"));
        assert_eq!(msg.comment.as_deref(), Some("Funny comment about Motor_01"));
        assert_eq!(msg.signals.len(), 4);

        let zv: &Message = message(&db, "ZV_04");
        assert_eq!(zv.id, 708);
        assert!(!zv.is_extended());
        assert!(zv.senders.is_empty());
        assert_eq!(zv.cycle_time, None);
    }

    #[test]
    fn test_parse_signals() {
        let db: Database = parse_from_str(TEST_DBC).unwrap();
        let msg_key = db.get_msg_key_by_name("Motor_01").unwrap();

        let speed = db
            .get_sig_by_key(db.get_signal_in_message(msg_key, "Engine_Speed").unwrap())
            .unwrap();
        assert_eq!(speed.bit_range(), "48|8");
        assert_eq!(speed.byte_order, ByteOrder::LittleEndian);
        assert!(!speed.is_signed);
        assert_eq!(speed.unit.as_deref(), Some("km/h"));
        assert_eq!(speed.minimum, Some(0.0));
        assert_eq!(speed.maximum, Some(255.0));
        assert_eq!(speed.receivers, vec!["Infotainment"]);
        assert_eq!(speed.choices_to_string(), "255=Error");
        assert_eq!(
            speed.comment.as_deref(),
            Some("This comment tells you\neverything about Engine Speed.")
        );

        let status = db
            .get_sig_by_key(db.get_signal_in_message(msg_key, "Status").unwrap())
            .unwrap();
        assert_eq!(status.unit, None);
        assert_eq!(status.receivers, vec!["Infotainment", "Gateway"]);
        assert_eq!(status.choices_to_string(), "0=Off,1=On");

        let zv_key = db.get_msg_key_by_name("ZV_04").unwrap();
        let mux = db
            .get_sig_by_key(db.get_signal_in_message(zv_key, "Mux_Sel").unwrap())
            .unwrap();
        assert!(mux.is_multiplexer);
        assert_eq!(mux.initial, Some(1.0));
        assert!(mux.receivers.is_empty());

        let temp_b = db
            .get_sig_by_key(db.get_signal_in_message(zv_key, "Temp_B").unwrap())
            .unwrap();
        assert_eq!(temp_b.byte_order, ByteOrder::BigEndian);
        assert!(temp_b.is_signed);
        assert_eq!(temp_b.factor, 0.5);
        assert_eq!(temp_b.offset, -40.0);
        assert_eq!(temp_b.multiplexer_descriptor(), "Mux_Sel = 1");
    }

    #[test]
    fn test_independent_signals_are_dropped() {
        let db: Database = parse_from_str(TEST_DBC).unwrap();
        assert!(db.get_message_by_name("VECTOR__INDEPENDENT_SIG_MSG").is_none());
        assert!(db.iter_signals().all(|(_, s)| s.name != "Orphan"));
    }

    #[test]
    fn test_signal_outside_message_is_malformed() {
        let err = parse_from_str("VERSION \"\"\n SG_ Lost : 0|8@1+ (1,0) [0|0] \"\" X\n").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { line: 2, .. }));
    }

    #[test]
    fn test_not_a_dbc() {
        let err = parse_from_str("hello\nworld\n").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { .. }));
        assert!(parse_from_str("").is_ok());
    }

    #[test]
    fn test_parse_from_bytes_windows_1252() {
        // 0xFC is 'ü' in Windows-1252 and invalid as UTF-8
        let bytes: &[u8] = b"VERSION \"\"\nBU_: Steuerger\xFCt\n";
        let db: Database = parse_from_bytes(bytes).unwrap();
        assert!(db.get_node_by_name("Steuergerüt").is_some());
    }

    #[test]
    fn test_parse_from_file() {
        let mut file = tempfile::Builder::new().suffix(".dbc").tempfile().unwrap();
        file.write_all(TEST_DBC.as_bytes()).unwrap();

        let db: Database = DbcDecoder.decode(file.path().to_str().unwrap()).unwrap();
        assert_eq!(db.messages.len(), 2);
    }

    #[test]
    fn test_parse_from_file_errors() {
        assert!(matches!(
            parse_from_file("database.txt"),
            Err(DecodeError::InvalidExtension { .. })
        ));
        assert!(matches!(
            parse_from_file("/definitely/not/here.dbc"),
            Err(DecodeError::OpenFile { .. })
        ));
    }
}
