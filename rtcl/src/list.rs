//! List-to-string serialization.
//!
//! The inverse of list parsing: a list renders by joining its elements'
//! string forms with single spaces, wrapping any element that contains
//! list-separating whitespace (or is empty) in braces.  No backslash
//! escaping is introduced at this layer.

use crate::value::Value;

fn needs_braces(s: &str) -> bool {
    s.is_empty() || s.chars().any(|c| matches!(c, ' ' | '\t' | '\n' | '\x0b'))
}

/// Converts a slice of values to the canonical string form of the list
/// they make up.
pub(crate) fn list_to_string(items: &[Value]) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let s = item.as_str();
        if needs_braces(s) {
            out.push('{');
            out.push_str(s);
            out.push('}');
        } else {
            out.push_str(s);
        }
    }
    out
}
