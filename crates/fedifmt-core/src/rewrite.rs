use crate::entity::Entity;

/// HTML-encodes a text slice for safe embedding in markup.
pub fn encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let _ = pulldown_cmark_escape::escape_html(&mut out, text);
    out
}

/// Reconstructs `text` left to right, alternating gap slices with the output
/// of `substitute` for each entity.
///
/// `entities` must be sorted ascending by start and pairwise disjoint (the
/// overlap resolver's postcondition). Gap slices are HTML-encoded unless
/// `keep_html` is set, which is used when the buffer already contains trusted
/// emitted HTML. Every byte of the input is consumed exactly once: with no
/// entities the result is the encoded (or raw) whole input.
pub fn rewrite<F>(text: &str, entities: &[Entity], keep_html: bool, mut substitute: F) -> String
where
    F: FnMut(&Entity) -> String,
{
    let mut out = String::with_capacity(text.len() + text.len() / 2);
    let mut cursor = 0usize;

    for entity in entities {
        debug_assert!(cursor <= entity.span.start, "entities overlap or are unsorted");
        push_gap(&mut out, &text[cursor..entity.span.start], keep_html);
        out.push_str(&substitute(entity));
        cursor = entity.span.end;
    }
    push_gap(&mut out, &text[cursor..], keep_html);

    out
}

fn push_gap(out: &mut String, slice: &str, keep_html: bool) {
    if keep_html {
        out.push_str(slice);
    } else {
        out.push_str(&encode(slice));
    }
}
