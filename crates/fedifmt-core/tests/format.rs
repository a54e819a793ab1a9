use fedifmt_core::{
    Account, ContentType, EmojiRecord, FieldOptions, FormatOptions, Linker, StaticLinker, format,
    format_field, format_plain,
};

fn linker() -> StaticLinker {
    StaticLinker::new("https://local.tld")
}

fn wave() -> Vec<EmojiRecord> {
    vec![EmojiRecord::new(
        "wave",
        "https://cdn/wave.gif",
        "https://cdn/wave.png",
    )]
}

#[test]
fn emoji_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let emojis = wave();
    let options = FormatOptions {
        emojis: &emojis,
        ..Default::default()
    };
    let html = format("hello :wave: world", &options, &linker())?;

    assert_eq!(html.matches("<img").count(), 1);
    assert!(html.contains("alt=\":wave:\""));
    assert!(html.contains("src=\"https://cdn/wave.png\""));
    assert!(html.contains("hello <img"));
    assert!(html.contains("/> world"));
    Ok(())
}

#[test]
fn autoplay_picks_the_animated_emoji() -> Result<(), Box<dyn std::error::Error>> {
    let emojis = wave();
    let options = FormatOptions {
        emojis: &emojis,
        autoplay: true,
        ..Default::default()
    };
    let html = format(":wave:", &options, &linker())?;
    assert!(html.contains("src=\"https://cdn/wave.gif\""));
    Ok(())
}

#[test]
fn url_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let html = format(
        "check https://example.com/x out",
        &FormatOptions::default(),
        &linker(),
    )?;

    assert!(html.contains("<a href=\"https://example.com/x\" target=\"_blank\" rel=\"nofollow noopener\">"));
    assert!(html.contains("<span class=\"invisible\">https://</span>"));
    assert!(html.contains("<span class=\"\">example.com/x</span>"));
    assert!(html.starts_with("<p>check <a"));
    assert!(html.ends_with(" out</p>"));
    Ok(())
}

#[test]
fn long_urls_get_an_ellipsis_window() -> Result<(), Box<dyn std::error::Error>> {
    let url = format!("https://example.com/{}", "a".repeat(60));
    let html = format(&url, &FormatOptions::default(), &linker())?;
    assert!(html.contains("class=\"ellipsis\""));
    let display: &str = html
        .split("class=\"ellipsis\">")
        .nth(1)
        .and_then(|rest| rest.split('<').next())
        .unwrap();
    assert!(display.chars().count() <= 30);
    Ok(())
}

#[test]
fn mention_scenario_linkable() -> Result<(), Box<dyn std::error::Error>> {
    let linkable = [Account::local("alice")];
    let options = FormatOptions {
        linkable: &linkable,
        ..Default::default()
    };
    let html = format("@alice hi", &options, &linker())?;

    assert_eq!(
        html,
        "<p><span class=\"h-card\"><a href=\"https://local.tld/@alice\" class=\"u-url mention\">\
         @<span>alice</span></a></span> hi</p>"
    );
    Ok(())
}

#[test]
fn mention_scenario_unresolved() -> Result<(), Box<dyn std::error::Error>> {
    let html = format("@alice hi", &FormatOptions::default(), &linker())?;
    assert_eq!(html, "<p>@alice hi</p>");
    Ok(())
}

#[test]
fn remote_mentions_resolve_through_the_linker() -> Result<(), Box<dyn std::error::Error>> {
    struct Directory;
    impl Linker for Directory {
        fn tag_url(&self, name: &str) -> String {
            format!("https://local.tld/tags/{name}")
        }
        fn account_url(&self, account: &Account) -> String {
            match &account.domain {
                Some(domain) => format!("https://{domain}/@{}", account.username),
                None => format!("https://local.tld/@{}", account.username),
            }
        }
        fn resolve_remote_mention(&self, acct: &str) -> Option<Account> {
            (acct == "bob@remote.tld").then(|| Account::remote("bob", "remote.tld"))
        }
    }

    let html = format("@bob@remote.tld hi", &FormatOptions::default(), &Directory)?;
    assert!(html.contains("href=\"https://remote.tld/@bob\""));
    assert!(html.contains("@<span>bob</span>"));
    Ok(())
}

#[test]
fn hashtags_link_lowercased() -> Result<(), Box<dyn std::error::Error>> {
    let html = format("#RustLang", &FormatOptions::default(), &linker())?;
    assert!(html.contains("href=\"https://local.tld/tags/rustlang\""));
    assert!(html.contains("#<span>RustLang</span>"));
    Ok(())
}

#[test]
fn bracket_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let html = format("[b]bold[/b]", &FormatOptions::default(), &linker())?;
    assert!(html.contains("font-weight: 900;\">bold</span>"));

    let html = format("[b]bold", &FormatOptions::default(), &linker())?;
    assert_eq!(html, "<p>[b]bold</p>");
    Ok(())
}

#[test]
fn markdown_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let options = FormatOptions {
        content_type: ContentType::Markdown,
        ..Default::default()
    };
    let html = format("# Title\n\nSee https://example.com", &options, &linker())?;

    assert!(html.contains("<h1>Title</h1>"));
    assert!(!html.contains("&lt;h1&gt;"));
    assert!(html.contains("<a href=\"https://example.com\""));
    Ok(())
}

#[test]
fn markdown_mentions_link_without_double_encoding() -> Result<(), Box<dyn std::error::Error>> {
    let linkable = [Account::local("alice")];
    let options = FormatOptions {
        content_type: ContentType::Markdown,
        linkable: &linkable,
        ..Default::default()
    };
    let html = format("# Hi @alice\n\n*welcome*", &options, &linker())?;

    assert!(html.contains("<h1>Hi <span class=\"h-card\">"));
    assert!(html.contains("<em>welcome</em>"));
    Ok(())
}

#[test]
fn markdown_raw_anchors_stay_inert_text() -> Result<(), Box<dyn std::error::Error>> {
    let options = FormatOptions {
        content_type: ContentType::Markdown,
        ..Default::default()
    };
    let html = format(
        "<a href=\"javascript:alert(1)\">click</a>",
        &options,
        &linker(),
    )?;

    assert!(!html.contains("<a href"));
    assert!(!html.contains("javascript:alert(1)\">click"));
    assert!(html.contains("&lt;a href="));
    Ok(())
}

#[test]
fn markdown_urls_with_query_params_link_once() -> Result<(), Box<dyn std::error::Error>> {
    let options = FormatOptions {
        content_type: ContentType::Markdown,
        ..Default::default()
    };
    let html = format("See https://example.com/a?x=1&y=2", &options, &linker())?;

    assert!(html.contains("href=\"https://example.com/a?x=1&amp;y=2\""));
    assert!(html.contains(">example.com/a?x=1&amp;y=2<"));
    assert!(!html.contains("&amp;amp;"));
    Ok(())
}

#[test]
fn html_urls_with_query_params_link_once() -> Result<(), Box<dyn std::error::Error>> {
    let options = FormatOptions {
        content_type: ContentType::Html,
        ..Default::default()
    };
    let html = format("<p>see https://example.com/a?x=1&amp;y=2</p>", &options, &linker())?;

    assert!(html.contains("href=\"https://example.com/a?x=1&amp;y=2\""));
    assert!(!html.contains("&amp;amp;"));
    Ok(())
}

#[test]
fn markdown_links_are_not_relinked_inside() -> Result<(), Box<dyn std::error::Error>> {
    let options = FormatOptions {
        content_type: ContentType::Markdown,
        ..Default::default()
    };
    let html = format("[docs](https://example.com/docs)", &options, &linker())?;
    // One anchor from the renderer, none nested inside it.
    assert_eq!(html.matches("<a ").count() + html.matches("<a>").count(), 1);
    Ok(())
}

#[test]
fn html_content_keeps_existing_markup() -> Result<(), Box<dyn std::error::Error>> {
    let options = FormatOptions {
        content_type: ContentType::Html,
        ..Default::default()
    };
    let html = format("<p>see https://example.com/x</p>", &options, &linker())?;
    assert!(html.starts_with("<p>see <a href=\"https://example.com/x\""));
    assert!(html.ends_with("</p>"));
    Ok(())
}

#[test]
fn foreign_content_is_sanitize_only() -> Result<(), Box<dyn std::error::Error>> {
    let options = FormatOptions {
        local: false,
        ..Default::default()
    };
    let html = format(
        "<p>hi</p><script>alert(1)</script><img src=x>",
        &options,
        &linker(),
    )?;
    assert_eq!(html, "<p>hi</p>");
    Ok(())
}

#[test]
fn reblog_prefix_is_annotated_too() -> Result<(), Box<dyn std::error::Error>> {
    let linkable = [Account::local("bob")];
    let options = FormatOptions {
        linkable: &linkable,
        reblog_prefix: Some("bob"),
        ..Default::default()
    };
    let html = format("hello", &options, &linker())?;
    assert!(html.starts_with("<p>RT <span class=\"h-card\">"));
    assert!(html.ends_with(" hello</p>"));
    Ok(())
}

#[test]
fn paragraphs_and_line_breaks() -> Result<(), Box<dyn std::error::Error>> {
    let html = format("one\ntwo\n\nthree", &FormatOptions::default(), &linker())?;
    assert_eq!(html, "<p>one<br/>two</p><p>three</p>");
    assert!(!html.contains('\n'));
    Ok(())
}

#[test]
fn plain_text_is_encoded() -> Result<(), Box<dyn std::error::Error>> {
    let html = format("2 < 3 & \"so on\"", &FormatOptions::default(), &linker())?;
    assert_eq!(html, "<p>2 &lt; 3 &amp; &quot;so on&quot;</p>");
    Ok(())
}

#[test]
fn format_plain_strips_only_foreign_markup() {
    assert_eq!(format_plain("<p>hi</p>", true), "<p>hi</p>");
    assert_eq!(format_plain("<p>hi <b>there</b></p>", false), "hi there");
}

#[test]
fn fields_link_urls_and_mentions_only() -> Result<(), Box<dyn std::error::Error>> {
    let linkable = [Account::local("alice")];
    let emojis = wave();
    let options = FieldOptions {
        linkable: &linkable,
        emojis: &emojis,
        ..Default::default()
    };
    let html = format_field("@alice #tag https://example.com/x :wave:", &options, &linker())?;

    assert!(html.contains("u-url mention"));
    assert!(!html.contains("hashtag"));
    assert!(html.contains("#tag"));
    assert!(html.contains("<a href=\"https://example.com/x\""));
    assert!(html.contains("<img"));
    assert!(!html.starts_with("<p>"));
    Ok(())
}
