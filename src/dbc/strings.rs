//! Helpers for the quoted strings of DBC files.
//!
//! Quoted strings may contain escaped quotes (`\"`) and span several physical lines,
//! which is common in `CM_` comments.

/// Count unescaped double quotes in a string.
/// A quote is considered escaped if immediately preceded by an odd number of backslashes.
pub(crate) fn count_unescaped_quotes(s: &str) -> usize {
    let mut count = 0usize;
    let mut backslashes = 0usize;
    for ch in s.chars() {
        if ch == '\\' {
            backslashes += 1;
            continue;
        }
        if ch == '"' && backslashes % 2 == 0 {
            count += 1;
        }
        backslashes = 0;
    }
    count
}

/// Accumulate subsequent lines until the buffer contains at least two unescaped quotes.
///
/// `i` is the current line index; it is advanced past every consumed line.
pub(crate) fn accumulate_quoted(acc: &mut String, lines: &[&str], i: &mut usize) {
    while count_unescaped_quotes(acc) < 2 && *i + 1 < lines.len() {
        *i += 1;
        acc.push('\n');
        acc.push_str(lines[*i].trim_start());
    }
}

/// Splits `s` at its first quoted segment.
///
/// Returns `(before, unescaped content, after)`, or `None` if `s` has no complete segment.
pub(crate) fn split_quoted(s: &str) -> Option<(&str, String, &str)> {
    let open: usize = s.find('"')?;
    let mut content: String = String::new();
    let mut escaped: bool = false;
    for (pos, ch) in s[open + 1..].char_indices() {
        match ch {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => {
                let close: usize = open + 1 + pos;
                return Some((&s[..open], content, &s[close + 1..]));
            }
            _ => {
                escaped = false;
                content.push(ch);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_unescaped_quotes() {
        assert_eq!(count_unescaped_quotes("\"a\""), 2);
        assert_eq!(count_unescaped_quotes("\\\"a\\\""), 0);
    }

    #[test]
    fn test_accumulate_quoted() {
        let lines = vec!["CM_ SG_ 123 Sig \"part1", "continues\";"];
        let mut acc: String = lines[0].to_string();
        let mut i = 0usize;
        accumulate_quoted(&mut acc, &lines, &mut i);
        assert_eq!(count_unescaped_quotes(&acc), 2);
        assert_eq!(i, 1);
    }

    #[test]
    fn test_split_quoted() {
        let (before, content, after) = split_quoted(r#"CM_ BO_ 10 "say \"hi\"";"#).unwrap();
        assert_eq!(before, "CM_ BO_ 10 ");
        assert_eq!(content, "say \"hi\"");
        assert_eq!(after, ";");
        assert!(split_quoted("no quotes").is_none());
        assert!(split_quoted("\"open only").is_none());
    }
}
