use once_cell::sync::Lazy;
use regex::Regex;

use crate::emoji::EmojiMap;
use crate::entity::{Entity, EntityKind};
use crate::offset::{OffsetError, OffsetMapBuilder, TAG_PLACEHOLDER};
use crate::span::Span;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bhttps?://[^\s<>\u{200B}]+").unwrap());

// The leading group consumes one boundary character, so spans are computed
// from the inner capture, not the whole match.
static WWW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|[^/\w@.])(www\.[^\s<>\u{200B}]+)").unwrap());

static MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|[^/\w])(@[a-z0-9_]+(?:@[a-z0-9.\-]+[a-z0-9])?)").unwrap());

static HASHTAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^/)\w])(#\w*[\p{Alphabetic}_·]\w*)").unwrap());

static SHORTCODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r":([A-Za-z0-9_+\-]+):").unwrap());

static MD_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\[\]]*\]\([^()\s]+\)").unwrap());

/// Which candidate kinds an extraction pass reports.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExtractOptions<'a> {
    /// Also match schemeless `www.` URLs (linked with an `http://` prefix).
    pub bare_www: bool,
    /// Match `[text](url)` spans so their internals are preserved verbatim.
    pub markdown_links: bool,
    /// Match `:shortcode:` tokens found in this vocabulary.
    pub shortcode_vocab: Option<&'a EmojiMap>,
    /// Skip `@mention` matching.
    pub skip_mentions: bool,
    /// Skip `#hashtag` matching.
    pub skip_hashtags: bool,
}

/// Scans plain text for candidate entities. Non-destructive; the returned
/// order is unspecified until the set goes through the overlap resolver.
pub fn extract(text: &str, options: &ExtractOptions) -> Vec<Entity> {
    let mut entities = Vec::new();

    if options.markdown_links {
        for found in MD_LINK_RE.find_iter(text) {
            entities.push(Entity::new(
                Span {
                    start: found.start(),
                    end: found.end(),
                },
                EntityKind::MarkdownLink,
            ));
        }
    }

    for found in URL_RE.find_iter(text) {
        let trimmed = trim_url(found.as_str());
        entities.push(Entity::new(
            Span {
                start: found.start(),
                end: found.start() + trimmed.len(),
            },
            EntityKind::Url {
                href: trimmed.to_string(),
            },
        ));
    }

    if options.bare_www {
        for caps in WWW_RE.captures_iter(text) {
            let matched = caps.get(1).unwrap();
            let trimmed = trim_url(matched.as_str());
            entities.push(Entity::new(
                Span {
                    start: matched.start(),
                    end: matched.start() + trimmed.len(),
                },
                EntityKind::Url {
                    href: format!("http://{trimmed}"),
                },
            ));
        }
    }

    if !options.skip_mentions {
        for caps in MENTION_RE.captures_iter(text) {
            let matched = caps.get(1).unwrap();
            entities.push(Entity::new(
                Span {
                    start: matched.start(),
                    end: matched.end(),
                },
                EntityKind::Mention {
                    acct: matched.as_str()[1..].to_string(),
                },
            ));
        }
    }

    if !options.skip_hashtags {
        for caps in HASHTAG_RE.captures_iter(text) {
            let matched = caps.get(1).unwrap();
            entities.push(Entity::new(
                Span {
                    start: matched.start(),
                    end: matched.end(),
                },
                EntityKind::Hashtag {
                    name: matched.as_str()[1..].to_string(),
                },
            ));
        }
    }

    if let Some(vocab) = options.shortcode_vocab {
        for caps in SHORTCODE_RE.captures_iter(text) {
            let whole = caps.get(0).unwrap();
            let name = caps.get(1).unwrap().as_str();
            if !shortcode_boundaries_ok(text, whole.start(), whole.end()) {
                continue;
            }
            if !vocab.contains(name) {
                continue;
            }
            entities.push(Entity::new(
                Span {
                    start: whole.start(),
                    end: whole.end(),
                },
                EntityKind::Shortcode {
                    name: name.to_string(),
                },
            ));
        }
    }

    entities
}

/// Extraction over HTML-bearing text. Existing tags are opaque: each one is
/// collapsed to a single [`TAG_PLACEHOLDER`] before pattern matching, and the
/// resulting spans are mapped back to the original buffer. Candidates inside
/// anchor element content are discarded so links are never nested.
pub fn extract_html(html: &str, options: &ExtractOptions) -> Result<Vec<Entity>, OffsetError> {
    let collapsed = collapse_tags(html);
    let mut entities = extract(&collapsed.text, options);
    entities.retain(|entity| {
        !collapsed
            .anchor_content
            .iter()
            .any(|region| region.overlaps(entity.span))
    });
    entities
        .into_iter()
        .map(|mut entity| {
            entity.span = collapsed.map.map_span_back(entity.span)?;
            Ok(entity)
        })
        .collect()
}

fn shortcode_boundaries_ok(text: &str, start: usize, end: usize) -> bool {
    let before_ok = text[..start]
        .chars()
        .next_back()
        .is_none_or(|ch| !ch.is_alphanumeric() && ch != ':');
    let after_ok = text[end..]
        .chars()
        .next()
        .is_none_or(|ch| !ch.is_alphanumeric() && ch != ':');
    before_ok && after_ok
}

/// Trailing sentence punctuation is not part of the URL, and neither is a
/// close paren with no matching open paren inside the match.
fn trim_url(url: &str) -> &str {
    let mut url = url.trim_end_matches(|c| {
        matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | '\'' | '"' | '…')
    });
    while url.ends_with(')') && url.matches('(').count() < url.matches(')').count() {
        url = &url[..url.len() - 1];
        url = url.trim_end_matches(|c| {
            matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | '\'' | '"' | '…')
        });
    }
    url
}

struct Collapsed {
    text: String,
    map: crate::offset::OffsetMap,
    /// Transformed-buffer regions covered by `<a>…</a>` element content.
    anchor_content: Vec<Span>,
}

fn collapse_tags(html: &str) -> Collapsed {
    let bytes = html.as_bytes();
    let mut text = String::with_capacity(html.len());
    let mut builder = OffsetMapBuilder::new();
    let mut anchor_content = Vec::new();
    let mut anchor_depth = 0usize;
    let mut anchor_start = 0usize;
    let mut run_start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        let Some(tag_end) = find_tag_end(html, i) else {
            // A lone '<' is text, not markup.
            i += 1;
            continue;
        };
        builder.push_verbatim(i - run_start);
        text.push_str(&html[run_start..i]);

        let tag = &html[i..tag_end];
        builder.push_placeholder(tag.len());
        let placeholder_at = text.len();
        text.push(TAG_PLACEHOLDER);

        if is_open_tag(tag, "a") {
            if anchor_depth == 0 {
                anchor_start = text.len();
            }
            anchor_depth += 1;
        } else if is_close_tag(tag, "a") && anchor_depth > 0 {
            anchor_depth -= 1;
            if anchor_depth == 0 {
                anchor_content.push(Span {
                    start: anchor_start,
                    end: placeholder_at,
                });
            }
        }

        run_start = tag_end;
        i = tag_end;
    }

    builder.push_verbatim(html.len() - run_start);
    text.push_str(&html[run_start..]);

    if anchor_depth > 0 {
        anchor_content.push(Span {
            start: anchor_start,
            end: text.len(),
        });
    }

    Collapsed {
        text,
        map: builder.finish(),
        anchor_content,
    }
}

/// Returns the byte offset one past the closing `>`, or `None` if the `<` at
/// `start` does not begin a tag.
fn find_tag_end(html: &str, start: usize) -> Option<usize> {
    let next = html.as_bytes().get(start + 1)?;
    if !next.is_ascii_alphabetic() && *next != b'/' && *next != b'!' {
        return None;
    }
    html[start..].find('>').map(|pos| start + pos + 1)
}

fn is_open_tag(tag: &str, name: &str) -> bool {
    if tag.ends_with("/>") {
        return false;
    }
    let body = &tag[1..tag.len() - 1];
    let Some(prefix) = body.get(..name.len()) else {
        return false;
    };
    prefix.eq_ignore_ascii_case(name)
        && body[name.len()..]
            .chars()
            .next()
            .is_none_or(|ch| ch.is_ascii_whitespace())
}

fn is_close_tag(tag: &str, name: &str) -> bool {
    let body = tag[1..tag.len() - 1].trim_end();
    body.strip_prefix('/')
        .is_some_and(|rest| rest.trim().eq_ignore_ascii_case(name))
}
