//! Tokenization for word wrap.
//!
//! Tokens are whitespace-delimited words, except that a run starting with
//! `(` extends to the next `)` and may contain spaces:
//!
//! ```text
//! "Ofengemüse (29. 12. 2024)"  →  ["Ofengemüse", "(29. 12. 2024)"]
//! "a(b c)"                     →  ["a(b", "c)"]
//! "(open ended"                →  ["(open", "ended"]
//! ```

/// Split one physical line into wrap tokens.
pub fn tokenize(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = line.trim_start();

    while !rest.is_empty() {
        let group_end = if rest.starts_with('(') {
            rest.find(')').map(|i| i + 1)
        } else {
            None
        };
        let end = group_end.unwrap_or_else(|| rest.find(char::is_whitespace).unwrap_or(rest.len()));

        tokens.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }

    tokens
}
