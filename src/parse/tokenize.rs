/// Characters removed from the outer edges of a token by [`trim_quotes`].
const QUOTE_CHARS: [char; 3] = ['"', '\'', '`'];

/// Split a stage into words on whitespace, except inside double quotes.
///
/// Each `"` toggles quoted mode; while quoted, whitespace is part of the
/// word. The quote characters stay in the emitted words (see [`trim_quotes`]).
/// An unterminated quote simply runs to the end of the input, and runs of
/// whitespace never produce empty words.
pub fn split(stage: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut buf = String::new();
    let mut quoted = false;

    for c in stage.chars() {
        if c == '"' {
            quoted = !quoted;
        }
        if c.is_whitespace() && !quoted {
            if !buf.is_empty() {
                words.push(std::mem::take(&mut buf));
            }
            continue;
        }
        buf.push(c);
    }
    if !buf.is_empty() {
        words.push(buf);
    }

    words
}

/// Strip leading and trailing quote characters (`"`, `'`, `` ` ``).
///
/// Only the outer edges are touched; interior quotes are kept.
pub fn trim_quotes(word: &str) -> &str {
    word.trim_matches(&QUOTE_CHARS[..])
}

/// Split a stage and clean each word, ready to become a [`CommandSpec`](super::CommandSpec).
pub fn tokenize(stage: &str) -> Vec<String> {
    split(stage)
        .iter()
        .map(|word| trim_quotes(word.trim()).to_string())
        .collect()
}
