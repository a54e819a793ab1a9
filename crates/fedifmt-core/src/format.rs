use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::brackets::{default_tags, neutralize_brackets, transform};
use crate::emoji::{EmojiMap, EmojiRecord, substitute_emoji};
use crate::entity::{Entity, EntityKind};
use crate::extract::{ExtractOptions, extract, extract_html};
use crate::markdown::render_markdown;
use crate::offset::OffsetError;
use crate::resolve::resolve;
use crate::rewrite::{encode, rewrite};
use crate::sanitize::{decode_entities, sanitize_foreign, strip_markup};

/// An account a mention can resolve to. `domain` is `None` for accounts on
/// the caller's own instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Account {
    pub username: String,
    pub domain: Option<String>,
}

impl Account {
    pub fn local(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            domain: None,
        }
    }

    pub fn remote(username: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            domain: Some(domain.into()),
        }
    }

    /// `user` or `user@domain`, without the leading `@`.
    pub fn acct(&self) -> String {
        match &self.domain {
            Some(domain) => format!("{}@{}", self.username, domain),
            None => self.username.clone(),
        }
    }
}

/// URL construction and mention lookup, resolved by the caller's routing
/// layer. `resolve_remote_mention` is best effort: returning `None` degrades
/// the mention to plain text, it never fails the format call.
pub trait Linker {
    fn tag_url(&self, name: &str) -> String;
    fn account_url(&self, account: &Account) -> String;
    fn resolve_remote_mention(&self, acct: &str) -> Option<Account> {
        let _ = acct;
        None
    }
}

/// A [`Linker`] that derives every URL from a fixed base, for tests and the
/// CLI.
#[derive(Clone, Debug)]
pub struct StaticLinker {
    pub base_url: String,
}

impl StaticLinker {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Linker for StaticLinker {
    fn tag_url(&self, name: &str) -> String {
        format!("{}/tags/{name}", self.base_url)
    }

    fn account_url(&self, account: &Account) -> String {
        format!("{}/@{}", self.base_url, account.acct())
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ContentType {
    #[default]
    Plain,
    Html,
    Markdown,
}

/// Per-invocation configuration for [`format`]. The emoji list and linkable
/// set are owned by the caller and only borrowed for the duration of the
/// call.
#[derive(Clone, Copy, Debug)]
pub struct FormatOptions<'a> {
    /// Content authored on this instance. Foreign content takes the
    /// sanitize-only path instead.
    pub local: bool,
    pub content_type: ContentType,
    /// Accounts mentionable without an external lookup.
    pub linkable: &'a [Account],
    pub emojis: &'a [EmojiRecord],
    pub autoplay: bool,
    /// Handle prepended as `RT @handle ` before any annotation.
    pub reblog_prefix: Option<&'a str>,
}

impl Default for FormatOptions<'_> {
    fn default() -> Self {
        Self {
            local: true,
            content_type: ContentType::Plain,
            linkable: &[],
            emojis: &[],
            autoplay: false,
            reblog_prefix: None,
        }
    }
}

/// Configuration for [`format_field`], the single-line profile-field
/// variant.
#[derive(Clone, Copy, Debug)]
pub struct FieldOptions<'a> {
    pub local: bool,
    pub linkable: &'a [Account],
    pub emojis: &'a [EmojiRecord],
    pub autoplay: bool,
}

impl Default for FieldOptions<'_> {
    fn default() -> Self {
        Self {
            local: true,
            linkable: &[],
            emojis: &[],
            autoplay: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum FormatError {
    /// An extraction span could not be mapped back to its original buffer.
    /// This is an extractor/resolver bug, never a property of user input, so
    /// it surfaces instead of producing corrupted output.
    #[error("entity span could not be mapped back: {0}")]
    Offset(#[from] OffsetError),
}

/// Formats status text into safe, linkified, emoji-substituted HTML.
pub fn format(
    text: &str,
    options: &FormatOptions<'_>,
    linker: &dyn Linker,
) -> Result<String, FormatError> {
    if !options.local {
        return Ok(sanitize_foreign(text));
    }

    let emoji_map = EmojiMap::build(options.emojis, options.autoplay);
    let prefixed;
    let text = match options.reblog_prefix {
        Some(handle) => {
            prefixed = format!("RT @{handle} {text}");
            prefixed.as_str()
        }
        None => text,
    };

    let html = match options.content_type {
        ContentType::Plain => {
            let text = normalize_newlines(text);
            let entities = resolve(extract(&text, &ExtractOptions::default()));
            let linked = rewrite(&text, &entities, false, |entity| {
                substitute(entity, &text, false, options.linkable, linker)
            });
            wrap_paragraphs(&linked)
        }
        ContentType::Html => {
            let entities = resolve(extract_html(text, &ExtractOptions::default())?);
            rewrite(text, &entities, true, |entity| {
                substitute(entity, text, true, options.linkable, linker)
            })
        }
        ContentType::Markdown => {
            let rendered = render_markdown(text);
            let entities = resolve(extract_html(&rendered, &ExtractOptions::default())?);
            rewrite(&rendered, &entities, true, |entity| {
                substitute(entity, &rendered, true, options.linkable, linker)
            })
        }
    };

    let html = substitute_emoji(&html, &emoji_map);
    let html = neutralize_brackets(&html);
    match transform(&html, default_tags()) {
        Ok(out) => Ok(out),
        Err(error) => {
            tracing::warn!(%error, "bracket markup pass failed, passing content through");
            Ok(html)
        }
    }
}

/// Strips markup for plaintext surfaces. Local text is already plain.
pub fn format_plain(text: &str, local: bool) -> String {
    if local {
        text.to_string()
    } else {
        strip_markup(text)
    }
}

/// Formats a single-line profile field: URL and mention linking plus emoji
/// substitution, with no paragraph wrapping and no bracket markup.
pub fn format_field(
    text: &str,
    options: &FieldOptions<'_>,
    linker: &dyn Linker,
) -> Result<String, FormatError> {
    if !options.local {
        return Ok(sanitize_foreign(text));
    }

    let emoji_map = EmojiMap::build(options.emojis, options.autoplay);
    let extract_options = ExtractOptions {
        skip_hashtags: true,
        ..Default::default()
    };
    let entities = resolve(extract(text, &extract_options));
    let linked = rewrite(text, &entities, false, |entity| {
        substitute(entity, text, false, options.linkable, linker)
    });
    Ok(substitute_emoji(&linked, &emoji_map))
}

fn substitute(
    entity: &Entity,
    buffer: &str,
    keep_html: bool,
    linkable: &[Account],
    linker: &dyn Linker,
) -> String {
    match &entity.kind {
        // URLs lifted out of an HTML buffer carry entity-encoded text;
        // decode before the anchor builder re-encodes.
        EntityKind::Url { href } if keep_html => link_html(&decode_entities(href)),
        EntityKind::Url { href } => link_html(href),
        EntityKind::Hashtag { name } => hashtag_html(name, linker),
        EntityKind::Mention { acct } => match resolve_mention(acct, linkable, linker) {
            Some(account) => {
                let url = linker.account_url(&account);
                mention_html(&account, &url)
            }
            None => passthrough(entity, buffer, keep_html),
        },
        EntityKind::Shortcode { .. } | EntityKind::MarkdownLink => {
            passthrough(entity, buffer, keep_html)
        }
    }
}

fn passthrough(entity: &Entity, buffer: &str, keep_html: bool) -> String {
    let slice = entity.span.slice(buffer);
    if keep_html {
        slice.to_string()
    } else {
        encode(slice)
    }
}

fn resolve_mention(acct: &str, linkable: &[Account], linker: &dyn Linker) -> Option<Account> {
    if let Some(account) = linkable
        .iter()
        .find(|account| account.acct().eq_ignore_ascii_case(acct))
    {
        return Some(account.clone());
    }
    let resolved = linker.resolve_remote_mention(acct);
    if resolved.is_none() {
        tracing::debug!(acct, "mention did not resolve, leaving it unlinked");
    }
    resolved
}

static URL_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^https?://(?:www\.)?").unwrap());

const URL_DISPLAY_CHARS: usize = 30;

/// The three-span anchor the original formatter emits: invisible prefix,
/// display window capped at 30 characters, invisible suffix.
fn link_html(href: &str) -> String {
    let prefix_len = URL_PREFIX_RE.find(href).map_or(0, |found| found.end());
    let prefix = &href[..prefix_len];
    let rest = &href[prefix_len..];
    let display_end = rest
        .char_indices()
        .nth(URL_DISPLAY_CHARS)
        .map_or(rest.len(), |(index, _)| index);
    let display = &rest[..display_end];
    let suffix = &rest[display_end..];
    let class = if suffix.is_empty() { "" } else { "ellipsis" };

    format!(
        "<a href=\"{}\" target=\"_blank\" rel=\"nofollow noopener\">\
         <span class=\"invisible\">{}</span>\
         <span class=\"{class}\">{}</span>\
         <span class=\"invisible\">{}</span></a>",
        encode(href),
        encode(prefix),
        encode(display),
        encode(suffix),
    )
}

fn mention_html(account: &Account, url: &str) -> String {
    format!(
        "<span class=\"h-card\"><a href=\"{}\" class=\"u-url mention\">@<span>{}</span></a></span>",
        encode(url),
        encode(&account.username),
    )
}

fn hashtag_html(name: &str, linker: &dyn Linker) -> String {
    let url = linker.tag_url(&name.to_lowercase());
    format!(
        "<a href=\"{}\" class=\"mention hashtag\">#<span>{}</span></a>",
        encode(&url),
        encode(name),
    )
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

static PARAGRAPH_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").unwrap());

/// Blank-line-separated blocks become `<p>` elements; single newlines become
/// `<br/>`. No newline characters survive into the output.
fn wrap_paragraphs(html: &str) -> String {
    let mut out = String::with_capacity(html.len() + 16);
    for paragraph in PARAGRAPH_SPLIT_RE.split(html) {
        if paragraph.is_empty() {
            continue;
        }
        out.push_str("<p>");
        out.push_str(&paragraph.replace('\n', "<br/>"));
        out.push_str("</p>");
    }
    out
}
