/*
    This file is part of ZXDOC, a ZX Spectrum development toolkit.

    For the full copyright notice, see the lib.rs file.
*/
//! Delimiter matching and low-level parameter scanning shared by the macro
//! handlers.

/// Returns the closing delimiter paired with an opening bracket character.
pub fn matching_delimiter(open: u8) -> Option<u8> {
    match open {
        b'(' => Some(b')'),
        b'[' => Some(b']'),
        b'{' => Some(b'}'),
        _ => None
    }
}

/// Finds the index of the closing delimiter matching the opening bracket at
/// `index`, counting nested occurrences of the same bracket type only.
pub fn find_closing(text: &str, index: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let open = bytes[index];
    let close = matching_delimiter(open)?;
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(index) {
        if b == open {
            depth += 1;
        }
        else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Splits `content` on `sep` at the top bracket depth, counting all three
/// bracket pairs. An empty string splits into a single empty field.
pub fn split_top_level(content: &str, sep: u8) -> Vec<&str> {
    let bytes = content.as_bytes();
    let mut fields = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            _ if b == sep && depth == 0 => {
                fields.push(&content[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    fields.push(&content[start..]);
    fields
}

/// A custom text delimiter may be any single character that is not
/// alphanumeric, whitespace, or an opening bracket.
pub fn is_custom_delimiter(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace()
        && (!c.is_ascii() || matching_delimiter(c as u8).is_none())
}

/// Scans a plain integer literal (optionally negated, decimal or `$hex`) at
/// `index`, returning the end index and the value.
pub fn scan_int(text: &str, index: usize) -> Option<(usize, i64)> {
    let bytes = text.as_bytes();
    let mut i = index;
    let negative = bytes.get(i) == Some(&b'-');
    if negative {
        i += 1;
    }
    let value = if bytes.get(i) == Some(&b'$') {
        i += 1;
        let start = i;
        while matches!(bytes.get(i), Some(c) if c.is_ascii_hexdigit()) {
            i += 1;
        }
        i64::from_str_radix(&text[start..i], 16).ok()?
    }
    else {
        let start = i;
        while matches!(bytes.get(i), Some(c) if c.is_ascii_digit()) {
            i += 1;
        }
        text[start..i].parse().ok()?
    };
    Some((i, if negative { -value } else { value }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closing_bracket_counts_same_type_nesting() {
        assert_eq!(find_closing("(a(b)c)", 0), Some(6));
        assert_eq!(find_closing("x[1,[2]]y", 1), Some(7));
        assert_eq!(find_closing("{a(b}", 0), Some(4));
        assert_eq!(find_closing("(open", 0), None);
    }

    #[test]
    fn top_level_split_skips_bracketed_commas() {
        assert_eq!(split_top_level("a,b(c,d),e", b','), vec!["a", "b(c,d)", "e"]);
        assert_eq!(split_top_level("f[1,2],g", b','), vec!["f[1,2]", "g"]);
        assert_eq!(split_top_level("", b','), vec![""]);
        assert_eq!(split_top_level(",", b','), vec!["", ""]);
    }

    #[test]
    fn integer_scanning() {
        assert_eq!(scan_int("123,", 0), Some((3, 123)));
        assert_eq!(scan_int("-$10;", 0), Some((4, -16)));
        assert_eq!(scan_int("a1", 0), None);
        assert_eq!(scan_int("$", 0), None);
        assert_eq!(scan_int("x42", 1), Some((3, 42)));
    }
}
