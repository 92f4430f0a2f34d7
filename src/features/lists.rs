//! Dual-mode parsing of list-valued cells.
//!
//! Source data stores list columns either as plain comma-separated text
//! (`"Action, Drama"`) or as a literal-encoded list (`"['Action', 'Drama']"`).
//! The literal interpretation is attempted first, and only for cells that
//! are structurally bracketed; anything else falls back to a comma split.
//! Both modes are pure and never fail: malformed cells degrade to the
//! comma-split reading, missing/empty cells to an empty sequence.

/// Parse one cell into an ordered sequence of trimmed tokens.
pub fn parse_list_cell(cell: &str) -> Vec<String> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        if let Some(tokens) = parse_literal_list(trimmed) {
            return tokens;
        }
    }
    split_on_commas(trimmed)
}

/// Split raw text on commas, trimming tokens and dropping empties.
fn split_on_commas(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Attempt a structured interpretation of a bracketed literal list with
/// single- or double-quoted elements. Returns `None` on any structural
/// mismatch so the caller can fall back to the delimiter split; this is
/// the only "error" the parser can produce.
fn parse_literal_list(text: &str) -> Option<Vec<String>> {
    let inner = text.strip_prefix('[')?.strip_suffix(']')?.trim();
    if inner.is_empty() {
        return Some(Vec::new());
    }

    let mut tokens = Vec::new();
    let mut rest = inner;
    loop {
        rest = rest.trim_start();
        let quote = rest.chars().next()?;
        if quote != '\'' && quote != '"' {
            return None;
        }
        let body = &rest[quote.len_utf8()..];
        let end = body.find(quote)?;
        let token = body[..end].trim();
        if !token.is_empty() {
            tokens.push(token.to_string());
        }
        rest = body[end + quote.len_utf8()..].trim_start();
        if rest.is_empty() {
            return Some(tokens);
        }
        rest = rest.strip_prefix(',')?;
    }
}
