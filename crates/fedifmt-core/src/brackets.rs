use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::offset::TAG_PLACEHOLDER;
use crate::rewrite::encode;

const MAX_DEPTH: usize = 32;

/// One allowed bracket tag: `[name]…[/name]` or `[name=param]…[/name]`.
///
/// `html_open` may contain `%param%` (replaced by a validated quick
/// parameter) or `%content%` (replaced by text the content pattern pulls out
/// of the inner text, which is then consumed).
#[derive(Debug)]
pub struct TagSpec {
    pub name: &'static str,
    pub html_open: &'static str,
    pub html_close: &'static str,
    pub quick_param: Option<Regex>,
    pub require_content: bool,
    pub content_pattern: Option<Regex>,
}

impl TagSpec {
    fn simple(name: &'static str, html_open: &'static str, html_close: &'static str) -> Self {
        Self {
            name,
            html_open,
            html_close,
            quick_param: None,
            require_content: false,
            content_pattern: None,
        }
    }

    fn with_param(
        name: &'static str,
        html_open: &'static str,
        html_close: &'static str,
        quick_param: &str,
    ) -> Self {
        Self {
            name,
            html_open,
            html_close,
            quick_param: Some(Regex::new(quick_param).unwrap()),
            require_content: false,
            content_pattern: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum MarkupError {
    #[error("bracket markup nested deeper than {MAX_DEPTH} levels")]
    TooDeep,
}

static DEFAULT_TAGS: Lazy<Vec<TagSpec>> = Lazy::new(|| {
    vec![
        TagSpec::simple(
            "b",
            "<span style=\"font-family: 'kozuka-gothic-pro', sans-serif; font-weight: 900;\">",
            "</span>",
        ),
        TagSpec::simple(
            "i",
            "<span style=\"font-family: 'kozuka-gothic-pro', sans-serif; font-style: italic; \
             font-feature-settings: 'ital';\">",
            "</span>",
        ),
        TagSpec::simple("u", "<u>", "</u>"),
        TagSpec::simple("s", "<s>", "</s>"),
        TagSpec::simple("code", "<pre>", "</pre>"),
        TagSpec::simple("quote", "<blockquote>", "</blockquote>"),
        TagSpec::simple("spin", "<span class=\"fa fa-spin\">", "</span>"),
        TagSpec::simple("pulse", "<span class=\"pulse-loading\">", "</span>"),
        TagSpec::with_param(
            "flip",
            "<span class=\"fa fa-flip-%param%\">",
            "</span>",
            r"^(?:horizontal|vertical)$",
        ),
        TagSpec::with_param(
            "large",
            "<span class=\"fa fa-%param%\">",
            "</span>",
            r"^(?:2x|3x|4x|5x)$",
        ),
        TagSpec::with_param(
            "color",
            "<span style=\"color: %param%;\">",
            "</span>",
            r"^(?:[a-zA-Z]+|#[0-9a-fA-F]{3}|#[0-9a-fA-F]{6})$",
        ),
        TagSpec::with_param(
            "size",
            "<span style=\"font-size: %param%px;\">",
            "</span>",
            r"^[1-9][0-9]?$",
        ),
        TagSpec {
            name: "youtube",
            html_open: "<iframe width=\"480\" height=\"270\" \
                 src=\"https://www.youtube.com/embed/%content%\" frameborder=\"0\"></iframe>",
            html_close: "",
            quick_param: None,
            require_content: true,
            content_pattern: Some(
                Regex::new(
                    r"^(?:(?:https?://)?(?:www\.)?(?:youtube\.com/watch\?(?:[^\s&]*&)*v=|youtu\.be/))?([A-Za-z0-9_-]{6,12})(?:[?&#]\S*)?$",
                )
                .unwrap(),
            ),
        },
    ]
});

pub fn default_tags() -> &'static [TagSpec] {
    &DEFAULT_TAGS
}

/// Transforms allowed `[tag]…[/tag]` markup into HTML.
///
/// Every malformed construct fails soft: unknown tags, bad quick parameters,
/// and unclosed tags are left as literal bracket text and scanning continues
/// after them. The only hard failure is pathological nesting depth, which the
/// caller handles by passing the input through unchanged.
pub fn transform(text: &str, tags: &[TagSpec]) -> Result<String, MarkupError> {
    transform_inner(text, tags, 0)
}

fn transform_inner(text: &str, tags: &[TagSpec], depth: usize) -> Result<String, MarkupError> {
    if depth > MAX_DEPTH {
        return Err(MarkupError::TooDeep);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('[') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match parse_construct(rest, tags, depth)? {
            Some((html, consumed)) => {
                out.push_str(&html);
                rest = &rest[consumed..];
            }
            None => {
                out.push('[');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

/// Attempts to parse one complete construct at `text` (which starts with
/// `[`). Returns the rendered HTML and the number of bytes consumed, or
/// `None` if the construct is malformed and the `[` should stay literal.
fn parse_construct(
    text: &str,
    tags: &[TagSpec],
    depth: usize,
) -> Result<Option<(String, usize)>, MarkupError> {
    let Some((name, param, open_len)) = parse_open_token(text) else {
        return Ok(None);
    };
    let Some(spec) = tags
        .iter()
        .find(|spec| spec.name.eq_ignore_ascii_case(name))
    else {
        return Ok(None);
    };

    let body = &text[open_len..];
    let Some((inner_len, close_len)) = find_matching_close(body, spec.name) else {
        return Ok(None);
    };
    let inner = &body[..inner_len];
    let consumed = open_len + inner_len + close_len;

    if spec.require_content && inner.trim().is_empty() {
        return Ok(None);
    }

    let mut open = spec.html_open.to_string();

    if let Some(pattern) = &spec.content_pattern {
        let Some(caps) = pattern.captures(inner.trim()) else {
            return Ok(None);
        };
        let content = caps.get(1).map_or(inner.trim(), |m| m.as_str());
        open = open.replace("%content%", &encode(content));
        // Inner text is consumed by the template.
        return Ok(Some((format!("{open}{}", spec.html_close), consumed)));
    }

    match (&spec.quick_param, param) {
        (Some(pattern), Some(param)) if pattern.is_match(param) => {
            open = open.replace("%param%", &encode(param));
        }
        (Some(_), Some(_)) => return Ok(None),
        (Some(_), None) => {
            if open.contains("%param%") {
                return Ok(None);
            }
        }
        (None, Some(_)) => return Ok(None),
        (None, None) => {}
    }

    let inner_html = transform_inner(inner, tags, depth + 1)?;
    Ok(Some((
        format!("{open}{inner_html}{}", spec.html_close),
        consumed,
    )))
}

/// Parses `[name]` or `[name=param]` at the start of `text`.
fn parse_open_token(text: &str) -> Option<(&str, Option<&str>, usize)> {
    let close = text.find(']')?;
    let token = &text[1..close];
    let (name, param) = match token.split_once('=') {
        Some((name, param)) if !param.is_empty() => (name, Some(param)),
        Some(_) => return None,
        None => (token, None),
    };
    if name.is_empty() || !name.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return None;
    }
    if let Some(param) = param {
        if param.contains('[') || param.contains('<') {
            return None;
        }
    }
    Some((name, param, close + 1))
}

/// Finds the matching `[/name]` for an already-consumed opener, honoring
/// nested same-name openers. Returns (inner length, close-token length).
fn find_matching_close(body: &str, name: &str) -> Option<(usize, usize)> {
    let mut depth = 1usize;
    let mut search_from = 0usize;

    while let Some(pos) = body[search_from..].find('[') {
        let at = search_from + pos;
        let rest = &body[at..];
        if let Some(close_len) = close_token_len(rest, name) {
            depth -= 1;
            if depth == 0 {
                return Some((at, close_len));
            }
        } else if opens_same_tag(rest, name) {
            depth += 1;
        }
        search_from = at + 1;
    }
    None
}

fn close_token_len(text: &str, name: &str) -> Option<usize> {
    let rest = text.strip_prefix("[/")?;
    let matches = rest
        .get(..name.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(name))
        && rest.as_bytes().get(name.len()) == Some(&b']');
    matches.then(|| name.len() + 3)
}

fn opens_same_tag(text: &str, name: &str) -> bool {
    let Some(rest) = text.strip_prefix('[') else {
        return false;
    };
    rest.get(..name.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(name))
        && matches!(rest.as_bytes().get(name.len()), Some(&b']') | Some(&b'='))
}

/// Defuses bracket characters that earlier passes emitted inside HTML tags
/// (for example a `[` in a generated `href`), so the bracket pass never
/// reinterprets them as markup. A zero-width separator after the bracket
/// breaks tag-name parsing; brackets already followed by one are left alone,
/// which keeps the pass idempotent.
pub fn neutralize_brackets(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut chars = html.chars().peekable();

    while let Some(ch) = chars.next() {
        out.push(ch);
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            '[' if in_tag => {
                if chars.peek() != Some(&TAG_PLACEHOLDER) {
                    out.push(TAG_PLACEHOLDER);
                }
            }
            _ => {}
        }
    }
    out
}
