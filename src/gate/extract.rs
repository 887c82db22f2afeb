//! Delimiter scan over raw response bodies.
//!
//! Gates reply with JSON-ish text, but the interesting field is pulled out
//! with a plain substring scan instead of a JSON parser: the first
//! occurrence of the opening marker wins, then the first occurrence of the
//! closing marker after it. Malformed bodies therefore degrade to "no
//! message" instead of a parse error.

/// Return the slice of `data` strictly between the first occurrence of
/// `first` and the next occurrence of `last` after it.
///
/// Returns `None` when either marker is missing. Marker positions are byte
/// offsets returned by `str::find`, so the returned slice always sits on
/// UTF-8 boundaries.
#[must_use]
pub fn find_between<'a>(data: &'a str, first: &str, last: &str) -> Option<&'a str> {
    let start = data.find(first)? + first.len();
    let end = data[start..].find(last)? + start;

    Some(&data[start..end])
}

#[cfg(test)]
mod tests {
    use super::find_between;

    #[test]
    fn extracts_between_markers() {
        let body = r#"{"status":"ok","message":"APPROVED","code":200}"#;
        assert_eq!(find_between(body, "\"message\":\"", "\""), Some("APPROVED"));
    }

    #[test]
    fn missing_first_marker_returns_none() {
        let body = r#"{"status":"ok","code":200}"#;
        assert_eq!(find_between(body, "\"message\":\"", "\""), None);
    }

    #[test]
    fn missing_last_marker_returns_none() {
        assert_eq!(find_between("prefix [open only", "[", "]"), None);
    }

    #[test]
    fn close_marker_before_open_is_ignored() {
        // The closing marker must come after the opening one.
        assert_eq!(find_between("] noise [value] tail", "[", "]"), Some("value"));
    }

    #[test]
    fn first_match_wins() {
        let body = r#"{"message":"first","message":"second"}"#;
        assert_eq!(find_between(body, "\"message\":\"", "\""), Some("first"));
    }

    #[test]
    fn empty_field_yields_empty_slice() {
        let body = r#"{"message":""}"#;
        assert_eq!(find_between(body, "\"message\":\"", "\""), Some(""));
    }

    #[test]
    fn multibyte_bodies_slice_cleanly() {
        let body = "código <ключ> prüfen";
        assert_eq!(find_between(body, "<", ">"), Some("ключ"));
    }
}
