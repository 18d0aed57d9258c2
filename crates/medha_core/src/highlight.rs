//! Parsing for the revision markup used in highlighted essays:
//! `**added text**` and `~~removed text~~`.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span<'a> {
    Plain(&'a str),
    Added(&'a str),
    Removed(&'a str),
}

/// Splits a highlighted essay into plain, added and removed spans.
/// An unterminated marker is kept as plain text.
pub fn spans(text: &str) -> Vec<Span<'_>> {
    let mut out = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let next = [("**", 0usize), ("~~", 1usize)]
            .iter()
            .filter_map(|(marker, kind)| rest.find(marker).map(|pos| (pos, *marker, *kind)))
            .min_by_key(|(pos, _, _)| *pos);

        let Some((start, marker, kind)) = next else {
            out.push(Span::Plain(rest));
            break;
        };

        let body_start = start + marker.len();
        let Some(len) = rest[body_start..].find(marker) else {
            out.push(Span::Plain(rest));
            break;
        };

        if start > 0 {
            out.push(Span::Plain(&rest[..start]));
        }
        let body = &rest[body_start..body_start + len];
        out.push(if kind == 0 {
            Span::Added(body)
        } else {
            Span::Removed(body)
        });
        rest = &rest[body_start + len + marker.len()..];
    }

    out
}

/// Drops deletions and keeps additions, giving the essay as revised.
pub fn accept_all(text: &str) -> String {
    spans(text)
        .into_iter()
        .filter_map(|span| match span {
            Span::Plain(s) | Span::Added(s) => Some(s),
            Span::Removed(_) => None,
        })
        .collect()
}
