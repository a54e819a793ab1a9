use std::collections::HashMap;

use crate::rewrite::encode;

/// A caller-supplied custom emoji: one shortcode, two asset URLs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EmojiRecord {
    pub shortcode: String,
    pub url: String,
    pub static_url: String,
}

impl EmojiRecord {
    pub fn new(
        shortcode: impl Into<String>,
        url: impl Into<String>,
        static_url: impl Into<String>,
    ) -> Self {
        Self {
            shortcode: shortcode.into(),
            url: url.into(),
            static_url: static_url.into(),
        }
    }
}

/// Shortcode → asset URL, built fresh per format invocation. The autoplay
/// flag picks the animated or the static asset; later duplicates of a
/// shortcode are ignored.
#[derive(Clone, Debug, Default)]
pub struct EmojiMap {
    by_shortcode: HashMap<String, String>,
}

impl EmojiMap {
    pub fn build(records: &[EmojiRecord], autoplay: bool) -> Self {
        let mut by_shortcode = HashMap::with_capacity(records.len());
        for record in records {
            let url = if autoplay {
                &record.url
            } else {
                &record.static_url
            };
            by_shortcode
                .entry(record.shortcode.clone())
                .or_insert_with(|| url.clone());
        }
        Self { by_shortcode }
    }

    pub fn get(&self, shortcode: &str) -> Option<&str> {
        self.by_shortcode.get(shortcode).map(String::as_str)
    }

    pub fn contains(&self, shortcode: &str) -> bool {
        self.by_shortcode.contains_key(shortcode)
    }

    pub fn is_empty(&self) -> bool {
        self.by_shortcode.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ScanState {
    Outside,
    /// `mark` is the output position of the opening `<`.
    InTag { mark: usize },
    /// `mark` is the output position of the opening `:`.
    InShortcode { mark: usize },
}

/// Replaces `:shortcode:` tokens with `<img>` markup for every shortcode in
/// the map.
///
/// Single left-to-right scan over the HTML. Substitution happens only outside
/// tags and outside `<span class="invisible">` wrappers; inside an invisible
/// wrapper, nesting depth rises on every open tag and falls on every close
/// tag, with self-closing tags contributing zero net depth. Unknown and
/// unterminated shortcodes are left untouched, which also makes the pass
/// idempotent: emitted `<img>` markup keeps the shortcode only inside
/// attribute text, where the scanner never substitutes.
pub fn substitute_emoji(html: &str, map: &EmojiMap) -> String {
    if map.is_empty() {
        return html.to_string();
    }

    let mut out = String::with_capacity(html.len() + html.len() / 4);
    let mut state = ScanState::Outside;
    let mut invisible_depth = 0usize;

    for ch in html.chars() {
        match state {
            ScanState::Outside => match ch {
                '<' => {
                    state = ScanState::InTag { mark: out.len() };
                    out.push(ch);
                }
                ':' => {
                    state = ScanState::InShortcode { mark: out.len() };
                    out.push(ch);
                }
                _ => out.push(ch),
            },
            ScanState::InTag { mark } => {
                out.push(ch);
                if ch == '>' {
                    invisible_depth = update_depth(invisible_depth, &out[mark..]);
                    state = ScanState::Outside;
                }
            }
            ScanState::InShortcode { mark } => {
                if ch == ':' {
                    let name = &out[mark + 1..];
                    if invisible_depth == 0 {
                        if let Some(url) = map.get(name) {
                            let img = emoji_img(name, url);
                            out.truncate(mark);
                            out.push_str(&img);
                            state = ScanState::Outside;
                            continue;
                        }
                    }
                    // Not substituted; this colon may open the next token.
                    state = ScanState::InShortcode { mark: out.len() };
                    out.push(ch);
                } else if ch == '<' {
                    state = ScanState::InTag { mark: out.len() };
                    out.push(ch);
                } else if is_shortcode_char(ch) {
                    out.push(ch);
                } else {
                    state = ScanState::Outside;
                    out.push(ch);
                }
            }
        }
    }

    out
}

fn is_shortcode_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '+' | '-')
}

/// Tag-structure heuristic for invisible-span nesting: depth starts on the
/// exact `<span class="invisible">` opener; while positive, any open tag
/// increments and any close tag decrements, except self-closing tags.
fn update_depth(depth: usize, tag: &str) -> usize {
    if depth == 0 {
        if tag == "<span class=\"invisible\">" {
            1
        } else {
            0
        }
    } else if tag.starts_with("</") {
        depth - 1
    } else if tag.ends_with("/>") {
        depth
    } else {
        depth + 1
    }
}

fn emoji_img(shortcode: &str, url: &str) -> String {
    let alt = encode(shortcode);
    let src = encode(url);
    format!(
        "<img draggable=\"false\" class=\"emojione\" alt=\":{alt}:\" title=\":{alt}:\" src=\"{src}\" />"
    )
}
