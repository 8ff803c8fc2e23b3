//! Syntax extension registry.
//!
//! An extension is a prefix-anchored recognizer for one custom syntax plus
//! the renderer for the token it produces. Extensions are grouped by level
//! (block or inline) and kept in registration order; when several could
//! claim the same position, the first registered wins.

use std::fmt;

use pulldown_cmark::Event;

use super::Markdown;
use super::tweet::TweetRef;

/// Where in the document an extension is offered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// At the start of a line, before the host parser sees the block.
    Block,
    /// Inside running text, before it becomes a host text event.
    Inline,
}

/// Structured token produced by an extension.
///
/// The host parser's own constructs (paragraphs, headings, lists, ...) stay
/// as `pulldown_cmark::Event`s; this enum only carries the custom cases.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A term/definition pair. Both sides are inline events that have
    /// already been through the inline extensions.
    DefinitionList {
        term: Vec<Event<'static>>,
        definition: Vec<Event<'static>>,
    },
    Tweet(TweetRef),
}

/// A successful tokenize: how many bytes were consumed and what they meant.
#[derive(Debug, Clone, PartialEq)]
pub struct Tokenized {
    /// Length of the consumed prefix in bytes. Always positive.
    pub consumed: usize,
    pub token: Token,
}

/// A custom Markdown syntax.
///
/// `tokenize` must only ever match at the very start of `src`. It either
/// returns a token covering a non-empty prefix or declines with `None`; it
/// never consumes part of the input and then gives up.
pub trait SyntaxExtension: Send + Sync {
    /// Stable identifier, used in logs and tests.
    fn name(&self) -> &'static str;

    fn level(&self) -> Level;

    /// Byte offset of the earliest position in `src` where this syntax could
    /// start, or `None` if it cannot appear at all. A cheap pre-filter; a hit
    /// here does not promise that `tokenize` will succeed.
    fn detect(&self, src: &str) -> Option<usize>;

    fn tokenize(&self, src: &str, engine: &Markdown) -> Option<Tokenized>;

    /// Render a token this extension produced. Tokens of other kinds render
    /// to an empty string.
    fn render(&self, token: &Token, engine: &Markdown) -> String;
}

/// Ordered collection of block and inline extensions.
#[derive(Default)]
pub struct ExtensionRegistry {
    block: Vec<Box<dyn SyntaxExtension>>,
    inline: Vec<Box<dyn SyntaxExtension>>,
}

impl ExtensionRegistry {
    /// An empty registry. The engine then behaves exactly like the host parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Definition lists (block) and tweet embeds (inline).
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry
            .register(super::definition_list::DefinitionList)
            .register(super::tweet::TweetEmbed);
        registry
    }

    /// Append an extension to the list for its level.
    pub fn register(&mut self, extension: impl SyntaxExtension + 'static) -> &mut Self {
        match extension.level() {
            Level::Block => self.block.push(Box::new(extension)),
            Level::Inline => self.inline.push(Box::new(extension)),
        }
        self
    }

    /// Extensions of one level, in registration order.
    pub fn all(&self, level: Level) -> &[Box<dyn SyntaxExtension>] {
        match level {
            Level::Block => &self.block,
            Level::Inline => &self.inline,
        }
    }

    pub fn names(&self, level: Level) -> Vec<&'static str> {
        self.all(level).iter().map(|ext| ext.name()).collect()
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("block", &self.names(Level::Block))
            .field("inline", &self.names(Level::Inline))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Inline extension that claims a fixed literal.
    struct Literal {
        name: &'static str,
        literal: &'static str,
    }

    impl SyntaxExtension for Literal {
        fn name(&self) -> &'static str {
            self.name
        }

        fn level(&self) -> Level {
            Level::Inline
        }

        fn detect(&self, src: &str) -> Option<usize> {
            src.find(self.literal)
        }

        fn tokenize(&self, src: &str, _engine: &Markdown) -> Option<Tokenized> {
            src.starts_with(self.literal).then(|| Tokenized {
                consumed: self.literal.len(),
                token: Token::Tweet(TweetRef {
                    id: self.name.to_string(),
                    mode: None,
                }),
            })
        }

        fn render(&self, token: &Token, _engine: &Markdown) -> String {
            match token {
                Token::Tweet(t) => format!("[{}]", t.id),
                _ => String::new(),
            }
        }
    }

    #[test]
    fn standard_registry_levels() {
        let registry = ExtensionRegistry::standard();
        assert_eq!(registry.names(Level::Block), vec!["definitionList"]);
        assert_eq!(registry.names(Level::Inline), vec!["tweet"]);
    }

    #[test]
    fn registration_order_is_preserved() {
        let mut registry = ExtensionRegistry::new();
        registry
            .register(Literal {
                name: "first",
                literal: "@@",
            })
            .register(Literal {
                name: "second",
                literal: "@@",
            });
        assert_eq!(registry.names(Level::Inline), vec!["first", "second"]);
        assert!(registry.all(Level::Block).is_empty());
    }

    #[test]
    fn first_registered_wins_ties() {
        let mut registry = ExtensionRegistry::new();
        registry
            .register(Literal {
                name: "first",
                literal: "@@",
            })
            .register(Literal {
                name: "second",
                literal: "@@",
            });
        let engine = Markdown::new(registry, &Default::default());
        let html = engine.render("a @@ b");
        assert!(html.contains("[first]"));
        assert!(!html.contains("[second]"));
    }

    #[test]
    fn debug_lists_names() {
        let debug = format!("{:?}", ExtensionRegistry::standard());
        assert!(debug.contains("definitionList"));
        assert!(debug.contains("tweet"));
    }
}
