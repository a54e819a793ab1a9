use std::collections::{HashMap, HashSet};

use ammonia::Builder;
use once_cell::sync::Lazy;

// Remote content keeps only the markup this formatter itself emits.
static FOREIGN_CLEANER: Lazy<Builder<'static>> = Lazy::new(|| {
    let tags: HashSet<&'static str> = ["a", "br", "p", "span"].iter().copied().collect();

    let mut generic_attributes: HashSet<&'static str> = HashSet::new();
    generic_attributes.insert("rel");
    generic_attributes.insert("class");

    let mut tag_attributes = HashMap::new();
    tag_attributes.insert("a", ["href"].iter().copied().collect());

    let url_schemes: HashSet<&'static str> = ["http", "https"].iter().copied().collect();

    let mut builder = Builder::default();
    builder
        .tags(tags)
        .generic_attributes(generic_attributes)
        .tag_attributes(tag_attributes)
        .url_schemes(url_schemes)
        // `rel` passes through as-is; ammonia forbids combining an allowed
        // `rel` attribute with a forced link_rel value.
        .link_rel(None);
    builder
});

static STRIP_CLEANER: Lazy<Builder<'static>> = Lazy::new(|| {
    let mut builder = Builder::default();
    builder.tags(HashSet::new());
    builder
});

/// Sanitizes remote/foreign HTML down to `a, br, p, span` with `href, rel,
/// class` attributes. Everything else is stripped, not escaped.
pub fn sanitize_foreign(html: &str) -> String {
    FOREIGN_CLEANER.clean(html).to_string()
}

/// Removes all markup, keeping the text content, for plaintext surfaces like
/// notification emails.
pub fn strip_markup(html: &str) -> String {
    decode_entities(&STRIP_CLEANER.clean(html).to_string())
}

/// Decodes the basic named entities the stripping step leaves behind.
pub(crate) fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::{sanitize_foreign, strip_markup};

    #[test]
    fn disallowed_tags_are_stripped_not_escaped() {
        let out = sanitize_foreign("<p>hi <script>alert(1)</script><b>bold</b></p>");
        assert_eq!(out, "<p>hi bold</p>");
        assert!(!out.contains("&lt;"));
    }

    #[test]
    fn allowed_markup_survives() {
        let out = sanitize_foreign(
            "<p><span class=\"h-card\"><a href=\"https://remote.tld/@bob\" class=\"u-url mention\">@bob</a></span> hi</p>",
        );
        assert!(out.contains("<span class=\"h-card\">"));
        assert!(out.contains("href=\"https://remote.tld/@bob\""));
        assert!(out.contains("class=\"u-url mention\""));
    }

    #[test]
    fn unsafe_schemes_lose_the_href() {
        let out = sanitize_foreign("<a href=\"javascript:alert(1)\">x</a>");
        assert!(!out.contains("javascript"));
    }

    #[test]
    fn stripping_keeps_text_content() {
        assert_eq!(
            strip_markup("<p>one <a href=\"x\">two</a><br/>three</p>"),
            "one twothree"
        );
    }
}
