//! One-shot `${VAR}` expansion.

use std::collections::BTreeMap;

/// Expand `${VAR}` references in `value` against `env`, exactly once.
///
/// Replacement text is taken from the pre-expansion snapshot, so a value
/// that resolves to another `${...}` stays literal. Unknown variables and
/// unterminated `${` runs are left untouched. Only the braced form is
/// expanded; `$VAR` and `$(VAR)` pass through.
pub fn expand_once(value: &str, env: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find("${") {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 2..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match env.get(name) {
                    Some(replacement) => out.push_str(replacement),
                    None => {
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[pos..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
