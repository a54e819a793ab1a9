use crate::span::Span;

/// A recognized annotatable region of text, before or after overlap
/// resolution.
///
/// The payload carried by each kind is re-derivable by slicing the source
/// buffer at `span`; it is kept alongside so substitution callbacks do not
/// have to re-parse the slice.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entity {
    pub span: Span,
    pub kind: EntityKind,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EntityKind {
    /// A bare URL. `href` carries the link target, which differs from the
    /// matched text only for schemeless `www.` matches.
    Url { href: String },
    /// `#hashtag`; `name` is the tag without the leading `#`.
    Hashtag { name: String },
    /// `@user` or `@user@domain`; `acct` is the handle without the leading
    /// `@`.
    Mention { acct: String },
    /// `:shortcode:`; `name` is the shortcode without the colons.
    Shortcode { name: String },
    /// A `[text](url)` construct matched so link-syntax internals are not
    /// annotated separately. Substitutes to the raw span, verbatim.
    MarkdownLink,
}

impl Entity {
    pub fn new(span: Span, kind: EntityKind) -> Self {
        Self { span, kind }
    }
}
