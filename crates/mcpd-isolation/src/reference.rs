//! Illegal-reference detector.
//!
//! Recognizes `$NAME`, `${NAME}`, and `$(NAME)` shapes, case-insensitively,
//! and decides whether the referenced name belongs to a namespace the
//! current server may not read.

use crate::{APP_PREFIX, SERVER_PREFIX};

/// True when `value` contains a reference to another server's namespace or
/// to an application-level variable.
///
/// `own_prefix` is the full `MCPD__<SERVER>__` prefix of the server being
/// launched. References into that prefix are allowed. A bracketed reference
/// without its closing bracket cannot be parsed reliably, so any such
/// pattern naming the daemon namespace at all is rejected.
pub(crate) fn contains_illegal_reference(value: &str, own_prefix: &str) -> bool {
    let upper = value.to_ascii_uppercase();
    let bytes = upper.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let Some(dollar) = upper[i..].find('$') else {
            break;
        };
        let start = i + dollar + 1;
        if start >= bytes.len() {
            break;
        }

        let closer = match bytes[start] {
            b'{' => Some(b'}'),
            b'(' => Some(b')'),
            _ => None,
        };
        let name_start = if closer.is_some() { start + 1 } else { start };
        let name_end = upper[name_start..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .map(|off| name_start + off)
            .unwrap_or(upper.len());
        let name = &upper[name_start..name_end];

        let complete = match closer {
            Some(expected) => bytes.get(name_end) == Some(&expected),
            None => true,
        };

        if !name.is_empty() {
            if complete {
                if is_foreign_name(name, own_prefix) {
                    return true;
                }
            } else if name.starts_with(APP_PREFIX) {
                // Mismatched bracket: cannot tell where the name ends, so
                // any daemon-namespace prefix (own included) is rejected.
                return true;
            }
        }

        i = name_end.max(start);
    }
    false
}

/// A complete reference is foreign when it names another server's variable
/// or an application-level variable.
fn is_foreign_name(name: &str, own_prefix: &str) -> bool {
    if name.starts_with(SERVER_PREFIX) {
        return !name.starts_with(own_prefix);
    }
    name.starts_with(APP_PREFIX)
}
