use crate::dbc::strings;
use crate::types::database::Database;

/// `BU_: ECU1 ECU2 ECU3 ...`
pub(crate) fn decode(db: &mut Database, line: &str) {
    let body: &str = line
        .trim_start_matches("BU_")
        .trim_start()
        .trim_start_matches(':');

    for name in body
        .split_ascii_whitespace()
        .map(|s| s.trim_end_matches(';'))
        .filter(|s| !s.is_empty())
    {
        db.add_node_if_absent(name);
    }
}

/// `CM_ BU_ NodeName "Comment...";`
pub(crate) fn comments(db: &mut Database, line: &str) {
    let Some((head, comment, _)) = strings::split_quoted(line) else {
        return;
    };
    // head: "CM_ BU_ NodeName "
    let Some(node_name) = head.split_ascii_whitespace().nth(2) else {
        return;
    };

    if let Some(node) = db.get_node_by_name_mut(node_name) {
        node.comment = Some(comment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode() {
        let mut db: Database = Database::default();
        decode(&mut db, "BU_: Motor Infotainment Gateway");
        let names: Vec<&str> = db.iter_nodes().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Motor", "Infotainment", "Gateway"]);

        // same list twice: no duplicates
        decode(&mut db, "BU_ : Motor");
        assert_eq!(db.nodes.len(), 3);
    }

    #[test]
    fn test_comments() {
        let mut db: Database = Database::default();
        db.add_node_if_absent("Gateway");

        comments(&mut db, "CM_ BU_ Gateway \"Node comment line 1\nline 2\";");
        assert_eq!(
            db.get_node_by_name("gateway").unwrap().comment.as_deref(),
            Some("Node comment line 1\nline 2")
        );

        // unknown node: nothing happens
        comments(&mut db, "CM_ BU_ Ghost \"boo\";");
        assert_eq!(db.nodes.len(), 1);
    }
}
