mod brackets;
mod emoji;
mod entity;
mod extract;
mod format;
mod markdown;
mod offset;
mod resolve;
mod rewrite;
mod sanitize;
mod span;

pub use brackets::{MarkupError, TagSpec, default_tags, neutralize_brackets, transform};
pub use emoji::{EmojiMap, EmojiRecord, substitute_emoji};
pub use entity::{Entity, EntityKind};
pub use extract::{ExtractOptions, extract, extract_html};
pub use format::{
    Account, ContentType, FieldOptions, FormatError, FormatOptions, Linker, StaticLinker, format,
    format_field, format_plain,
};
pub use markdown::render_markdown;
pub use offset::{OffsetError, OffsetMap, TAG_PLACEHOLDER};
pub use resolve::resolve;
pub use rewrite::{encode, rewrite};
pub use sanitize::{sanitize_foreign, strip_markup};
pub use span::{Span, SpanError};
