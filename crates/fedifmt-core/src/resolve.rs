use crate::entity::{Entity, EntityKind};

/// Selects a non-overlapping subset of candidate entities.
///
/// Candidates are ranked by extractor priority, then earlier start, then
/// longer span; a candidate is kept only if it conflicts with nothing already
/// kept. The result is sorted ascending by start and pairwise disjoint, which
/// is what the rewrite pass requires.
pub fn resolve(mut entities: Vec<Entity>) -> Vec<Entity> {
    entities.sort_by(|a, b| {
        priority(&b.kind)
            .cmp(&priority(&a.kind))
            .then(a.span.start.cmp(&b.span.start))
            .then(b.span.len().cmp(&a.span.len()))
    });

    let mut kept: Vec<Entity> = Vec::with_capacity(entities.len());
    for candidate in entities {
        if kept.iter().any(|entity| entity.span.overlaps(candidate.span)) {
            continue;
        }
        kept.push(candidate);
    }

    kept.sort_by_key(|entity| entity.span.start);
    kept
}

/// URL extraction takes precedence over mention and hashtag extraction on
/// overlapping text; protected markdown-link spans outrank everything.
fn priority(kind: &EntityKind) -> u8 {
    match kind {
        EntityKind::MarkdownLink => 4,
        EntityKind::Url { .. } => 3,
        EntityKind::Mention { .. } => 2,
        EntityKind::Hashtag { .. } => 1,
        EntityKind::Shortcode { .. } => 0,
    }
}
