use pulldown_cmark::html::push_html;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use crate::rewrite::encode;

/// Renders Markdown through a restricted event filter:
///
/// - raw HTML (block and inline) is emitted as literal text, never passed
///   through;
/// - images are dropped, keeping their alt text as plain text;
/// - links with non-http(s) destinations lose the anchor, keeping the text;
/// - fenced and indented code renders as literal text with `<br/>` line
///   breaks, no highlighting;
/// - soft line breaks harden into `<br/>`.
pub fn render_markdown(source: &str) -> String {
    let parser = Parser::new_ext(source, Options::ENABLE_STRIKETHROUGH);
    let mut events: Vec<Event> = Vec::new();
    let mut code_buffer: Option<String> = None;
    let mut unsafe_link_depth = 0usize;

    for event in parser {
        if let Some(buffer) = code_buffer.as_mut() {
            match event {
                Event::Text(text) => buffer.push_str(&text),
                Event::End(TagEnd::CodeBlock) => {
                    let literal = encode(buffer).replace('\n', "<br/>");
                    events.push(Event::Html(format!("<pre>{literal}</pre>").into()));
                    code_buffer = None;
                }
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(Tag::CodeBlock(_)) => code_buffer = Some(String::new()),
            Event::Start(Tag::Image { .. }) | Event::End(TagEnd::Image) => {}
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => {
                if is_safe_link(&dest_url) {
                    events.push(Event::Start(Tag::Link {
                        link_type,
                        dest_url,
                        title,
                        id,
                    }));
                } else {
                    unsafe_link_depth += 1;
                }
            }
            Event::End(TagEnd::Link) => {
                if unsafe_link_depth > 0 {
                    unsafe_link_depth -= 1;
                } else {
                    events.push(Event::End(TagEnd::Link));
                }
            }
            Event::SoftBreak => events.push(Event::HardBreak),
            Event::Html(raw) => events.push(Event::Text(raw)),
            Event::InlineHtml(raw) => events.push(Event::Text(raw)),
            other => events.push(other),
        }
    }

    let mut html = String::with_capacity(source.len() * 2);
    push_html(&mut html, events.into_iter());
    html
}

fn is_safe_link(dest: &str) -> bool {
    let dest = dest.trim_start();
    dest.get(..7)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("http://"))
        || dest
            .get(..8)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("https://"))
}
