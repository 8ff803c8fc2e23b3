//! Markdown rendering with custom syntax extensions.
//!
//! The host parser is `pulldown-cmark` with the GFM extensions (tables,
//! strikethrough, task lists, footnotes). Custom syntaxes from the
//! [`ExtensionRegistry`] get the first look at every position the host would
//! otherwise handle:
//!
//! ```text
//! source ──block pass──▶ source' ──pulldown-cmark──▶ events ──inline pass──▶ HTML
//! ```
//!
//! - **Block pass**: at each block start outside a fenced code block (start
//!   of input, after a blank line, a heading, a closing fence or a spliced
//!   block), block extensions are offered the rest of the document. A match
//!   is rendered and spliced back in as a raw HTML block, which the host
//!   passes through. Lines that continue a paragraph or list item are left
//!   to the host.
//! - **Inline pass**: each merged text event outside code is scanned for the
//!   earliest inline candidate; a match becomes an inline HTML event, a
//!   decline leaves the text alone.
//!
//! With no extension match the output is exactly what `pulldown-cmark`
//! produces on its own.

mod definition_list;
mod registry;
mod tweet;

pub use definition_list::DefinitionList;
pub use registry::{ExtensionRegistry, Level, SyntaxExtension, Token, Tokenized};
pub use tweet::{ColorMode, TweetEmbed, TweetRef};

use std::borrow::Cow;
use std::sync::LazyLock;

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, TextMergeStream, html};

use regex::Regex;

use crate::config::MarkdownConfig;

/// Line openers that would make the host start a heading, quote, bullet list,
/// thematic break or link reference definition.
static BLOCK_OPENER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:#{1,6}(?:[ \t]|$)|>|[-+*](?:[ \t]|$)|-(?:[ \t]*-){2,}[ \t]*$|\*(?:[ \t]*\*){2,}[ \t]*$|_(?:[ \t]*_){2,}[ \t]*$|\[[^\]]*\]:)",
    )
    .expect("valid regex")
});

/// Ordered list opener; group 1 is the delimiter.
static ORDERED_OPENER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,9}([.)])(?:[ \t]|$)").expect("valid regex"));

/// Markdown engine: host parser options plus an immutable extension registry.
#[derive(Debug)]
pub struct Markdown {
    registry: ExtensionRegistry,
    options: Options,
    hard_breaks: bool,
}

impl Markdown {
    pub fn new(registry: ExtensionRegistry, config: &MarkdownConfig) -> Self {
        let mut options = Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS;
        if config.footnotes {
            options |= Options::ENABLE_FOOTNOTES;
        }
        Self {
            registry,
            options,
            hard_breaks: config.hard_breaks,
        }
    }

    /// Engine with the standard extensions installed.
    pub fn standard(config: &MarkdownConfig) -> Self {
        Self::new(ExtensionRegistry::standard(), config)
    }

    /// Host parser options, for comparing against plain `pulldown-cmark`.
    pub fn options(&self) -> Options {
        self.options
    }

    /// Render a Markdown document to an HTML fragment.
    pub fn render(&self, text: &str) -> String {
        let source = self.expand_blocks(text);
        let events = self.host_events(&source);
        let mut out = String::with_capacity(source.len() + source.len() / 2);
        html::push_html(&mut out, events.into_iter());
        out
    }

    /// Lex a single line of text into inline events, extensions applied.
    ///
    /// The line is always read as one paragraph: a leading block marker
    /// (`#`, `>`, `-`, `1.`, a fence) stays literal text. The wrapping
    /// paragraph is dropped, so the events can be embedded in another element.
    pub fn inline_tokens(&self, text: &str) -> Vec<Event<'static>> {
        let line = escape_block_opener(text.trim());
        self.host_events(&line)
            .into_iter()
            .filter(|event| {
                !matches!(
                    event,
                    Event::Start(Tag::Paragraph) | Event::End(TagEnd::Paragraph)
                )
            })
            .map(Event::into_static)
            .collect()
    }

    /// Render inline events produced by [`Markdown::inline_tokens`].
    pub fn render_inline(&self, tokens: &[Event<'static>]) -> String {
        let mut out = String::new();
        html::push_html(&mut out, tokens.iter().cloned());
        out
    }

    // ========================================================================
    // Block pass
    // ========================================================================

    fn expand_blocks<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let extensions = self.registry.all(Level::Block);
        if extensions.is_empty() {
            return Cow::Borrowed(text);
        }

        let mut out = String::new();
        let mut copied_to = 0;
        let mut pos = 0;
        let mut fence: Option<Fence> = None;
        let mut candidate: Option<usize> = None;
        let mut block_start = true;

        while pos < text.len() {
            let line_end = text[pos..].find('\n').map_or(text.len(), |i| pos + i + 1);
            let line = &text[pos..line_end];

            if let Some(open) = &fence {
                if open.is_closed_by(line) {
                    fence = None;
                    block_start = true;
                }
                pos = line_end;
                continue;
            }
            if let Some(open) = Fence::opened_by(line) {
                fence = Some(open);
                pos = line_end;
                continue;
            }
            if line.trim().is_empty() {
                block_start = true;
                pos = line_end;
                continue;
            }

            // A non-blank line opens or continues a block. Only a heading
            // ends on its own line.
            let offered = block_start;
            block_start = is_atx_heading(line);
            if !offered {
                pos = line_end;
                continue;
            }

            if candidate.is_none_or(|c| c < pos) {
                candidate = earliest(extensions, &text[pos..]).map(|offset| pos + offset);
            }
            match candidate {
                None => break,
                Some(c) if c > pos => {
                    pos = line_end;
                    continue;
                }
                Some(_) => {}
            }

            if let Some((extension, tokenized)) = self.tokenize_at(extensions, &text[pos..]) {
                tracing::trace!(extension = extension.name(), at = pos, "block extension matched");
                out.push_str(&text[copied_to..pos]);
                out.push_str(&extension.render(&tokenized.token, self));
                // A blank line ends the raw HTML block for the host parser.
                out.push('\n');
                pos += tokenized.consumed;
                copied_to = pos;
                candidate = None;
                block_start = true;
            } else {
                pos = line_end;
            }
        }

        if copied_to == 0 {
            return Cow::Borrowed(text);
        }
        out.push_str(&text[copied_to..]);
        Cow::Owned(out)
    }

    // ========================================================================
    // Host parse + inline pass
    // ========================================================================

    fn host_events<'a>(&self, source: &'a str) -> Vec<Event<'a>> {
        let parser = Parser::new_ext(source, self.options);
        let mut events = Vec::new();
        let mut code_depth = 0usize;

        for event in TextMergeStream::new(parser) {
            match event {
                Event::Start(Tag::CodeBlock(_)) => {
                    code_depth += 1;
                    events.push(event);
                }
                Event::End(TagEnd::CodeBlock) => {
                    code_depth = code_depth.saturating_sub(1);
                    events.push(event);
                }
                Event::Text(text) if code_depth == 0 => self.expand_inline(text, &mut events),
                Event::SoftBreak if self.hard_breaks => events.push(Event::HardBreak),
                other => events.push(other),
            }
        }
        events
    }

    fn expand_inline<'a>(&self, text: CowStr<'a>, out: &mut Vec<Event<'a>>) {
        let extensions = self.registry.all(Level::Inline);
        let mut pieces: Vec<Event<'a>> = Vec::new();
        let mut literal_start = 0;
        let mut pos = 0;

        {
            let src: &str = &text;
            while pos < src.len() {
                let Some(offset) = earliest(extensions, &src[pos..]) else {
                    break;
                };
                let at = pos + offset;
                match self.tokenize_at(extensions, &src[at..]) {
                    Some((extension, tokenized)) => {
                        if at > literal_start {
                            pieces.push(Event::Text(src[literal_start..at].to_string().into()));
                        }
                        pieces.push(Event::InlineHtml(
                            extension.render(&tokenized.token, self).into(),
                        ));
                        pos = at + tokenized.consumed;
                        literal_start = pos;
                    }
                    None => {
                        // Declined: step over one character and look again.
                        pos = at + src[at..].chars().next().map_or(1, char::len_utf8);
                    }
                }
            }
            if !pieces.is_empty() && literal_start < src.len() {
                pieces.push(Event::Text(src[literal_start..].to_string().into()));
            }
        }

        if pieces.is_empty() {
            out.push(Event::Text(text));
        } else {
            out.append(&mut pieces);
        }
    }

    /// Offer `src` to each extension in registration order; first match wins.
    fn tokenize_at<'r>(
        &self,
        extensions: &'r [Box<dyn SyntaxExtension>],
        src: &str,
    ) -> Option<(&'r dyn SyntaxExtension, Tokenized)> {
        extensions.iter().find_map(|extension| {
            extension
                .tokenize(src, self)
                .filter(|t| t.consumed > 0 && t.consumed <= src.len())
                .map(|t| (extension.as_ref(), t))
        })
    }
}

fn earliest(extensions: &[Box<dyn SyntaxExtension>], src: &str) -> Option<usize> {
    extensions.iter().filter_map(|ext| ext.detect(src)).min()
}

/// An open fenced code block (```` ``` ```` or `~~~`).
struct Fence {
    marker: u8,
    len: usize,
}

impl Fence {
    fn opened_by(line: &str) -> Option<Self> {
        let trimmed = strip_indent(line)?;
        let marker = *trimmed.as_bytes().first()?;
        if marker != b'`' && marker != b'~' {
            return None;
        }
        let len = trimmed.bytes().take_while(|b| *b == marker).count();
        if len < 3 {
            return None;
        }
        // A backtick fence's info string cannot contain backticks.
        if marker == b'`' && trimmed[len..].contains('`') {
            return None;
        }
        Some(Self { marker, len })
    }

    fn is_closed_by(&self, line: &str) -> bool {
        let Some(trimmed) = strip_indent(line) else {
            return false;
        };
        let len = trimmed.bytes().take_while(|b| *b == self.marker).count();
        len >= self.len && trimmed[len..].trim().is_empty()
    }
}

fn is_atx_heading(line: &str) -> bool {
    strip_indent(line).is_some_and(|rest| {
        let hashes = rest.bytes().take_while(|b| *b == b'#').count();
        (1..=6).contains(&hashes)
            && rest[hashes..]
                .chars()
                .next()
                .is_none_or(|c| c == ' ' || c == '\t' || c == '\n' || c == '\r')
    })
}

/// Backslash-escape whatever would make `line` open a block other than a
/// paragraph.
fn escape_block_opener(line: &str) -> Cow<'_, str> {
    if BLOCK_OPENER.is_match(line) || Fence::opened_by(line).is_some() {
        return Cow::Owned(format!("\\{line}"));
    }
    match ORDERED_OPENER.captures(line).and_then(|c| c.get(1)) {
        Some(delimiter) => {
            let (number, rest) = line.split_at(delimiter.start());
            Cow::Owned(format!("{number}\\{rest}"))
        }
        None => Cow::Borrowed(line),
    }
}

/// Strip up to three spaces of indentation; `None` for indented code.
fn strip_indent(line: &str) -> Option<&str> {
    let spaces = line.bytes().take_while(|b| *b == b' ').count();
    (spaces <= 3).then(|| &line[spaces..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_config() -> MarkdownConfig {
        MarkdownConfig {
            hard_breaks: false,
            footnotes: true,
        }
    }

    fn engine() -> Markdown {
        Markdown::standard(&plain_config())
    }

    fn host_only(engine: &Markdown, text: &str) -> String {
        let mut out = String::new();
        html::push_html(&mut out, Parser::new_ext(text, engine.options()));
        out
    }

    #[test]
    fn plain_markdown_matches_host_parser() {
        let engine = engine();
        let inputs = [
            "# Heading\n\nSome *emphasis* and **strong** text.\n",
            "- one\n- two\n  - nested\n",
            "| a | b |\n|---|---|\n| 1 | 2 |\n",
            "A footnote[^1].\n\n[^1]: The note.\n",
            "```rust\nfn main() {}\n```\n",
            "> quoted\n> lines\n\n~~gone~~ [link](about.html)\n",
            "Term\nNotADefinition\n",
            "colons: everywhere : here\n",
        ];
        for input in inputs {
            assert_eq!(engine.render(input), host_only(&engine, input), "input: {input:?}");
        }
    }

    #[test]
    fn empty_registry_is_host_parser() {
        let engine = Markdown::new(ExtensionRegistry::new(), &plain_config());
        let input = "Term\n: Def\n\n::tweet(123)\n";
        assert_eq!(engine.render(input), host_only(&engine, input));
    }

    #[test]
    fn render_is_deterministic() {
        let engine = engine();
        let input = "Term\n: Def\n\n::tweet(42) and *more*\n";
        assert_eq!(engine.render(input), engine.render(input));
    }

    #[test]
    fn hard_breaks_turn_newlines_into_br() {
        let engine = Markdown::standard(&MarkdownConfig {
            hard_breaks: true,
            footnotes: true,
        });
        assert_eq!(engine.render("one\ntwo"), "<p>one<br />\ntwo</p>\n");
    }

    // ========================================================================
    // Definition lists
    // ========================================================================

    #[test]
    fn definition_list_renders_term_and_definition() {
        let html = engine().render("Term\n: Def");
        assert_eq!(html, "<dl><dt>Term</dt><dd>Def</dd></dl>\n");
    }

    #[test]
    fn line_without_colon_is_not_a_definition() {
        let html = engine().render("Term\nNotADefinition");
        assert!(!html.contains("<dl>"));
        assert_eq!(html, "<p>Term\nNotADefinition</p>\n");
    }

    #[test]
    fn definition_sides_get_inline_rendering() {
        let html = engine().render("*Term*\n: a [link](x.html) with `code`\n");
        assert!(html.contains("<dt><em>Term</em></dt>"));
        assert!(html.contains(r#"<dd>a <a href="x.html">link</a> with <code>code</code></dd>"#));
    }

    #[test]
    fn definition_list_between_paragraphs() {
        let html = engine().render("Intro.\n\nTerm\n: Def\n\nOutro.\n");
        assert!(html.starts_with("<p>Intro.</p>\n"));
        assert!(html.contains("<dl><dt>Term</dt><dd>Def</dd></dl>"));
        assert!(html.ends_with("<p>Outro.</p>\n"));
    }

    #[test]
    fn consecutive_definition_lists() {
        let html = engine().render("One\n: First\nTwo\n: Second\n");
        assert!(html.contains("<dl><dt>One</dt><dd>First</dd></dl>"));
        assert!(html.contains("<dl><dt>Two</dt><dd>Second</dd></dl>"));
    }

    #[test]
    fn block_markers_in_term_stay_literal() {
        let engine = engine();
        assert_eq!(
            engine.render("- Term\n: Def"),
            "<dl><dt>- Term</dt><dd>Def</dd></dl>\n"
        );
        assert_eq!(
            engine.render("# Term\n: Def"),
            "<dl><dt># Term</dt><dd>Def</dd></dl>\n"
        );
        assert_eq!(
            engine.render("1. Step\n: Def"),
            "<dl><dt>1. Step</dt><dd>Def</dd></dl>\n"
        );
    }

    #[test]
    fn block_markers_in_definition_stay_literal() {
        let engine = engine();
        assert_eq!(
            engine.render("Term\n: > quoted"),
            "<dl><dt>Term</dt><dd>&gt; quoted</dd></dl>\n"
        );
        assert_eq!(
            engine.render("Term\n: ```not a fence"),
            "<dl><dt>Term</dt><dd>```not a fence</dd></dl>\n"
        );
    }

    #[test]
    fn inline_tokens_keep_emphasis_after_escaping() {
        let engine = engine();
        let tokens = engine.inline_tokens("- *soft* dash");
        assert_eq!(engine.render_inline(&tokens), "- <em>soft</em> dash");
    }

    #[test]
    fn paragraph_continuation_is_not_split() {
        let engine = engine();
        let input = "Intro line\nTerm\n: Def";
        assert_eq!(engine.render(input), host_only(&engine, input));
        assert!(!engine.render(input).contains("<dl>"));
    }

    #[test]
    fn list_item_continuation_is_not_split() {
        let engine = engine();
        let input = "- a\n- Term\n: Def";
        assert_eq!(engine.render(input), host_only(&engine, input));
    }

    #[test]
    fn definition_after_heading_matches() {
        let html = engine().render("# Title\nTerm\n: Def\n");
        assert!(html.starts_with("<h1>Title</h1>\n"));
        assert!(html.contains("<dl><dt>Term</dt><dd>Def</dd></dl>"));
    }

    #[test]
    fn definition_list_inside_fence_is_code() {
        let html = engine().render("```\nTerm\n: Def\n```\n");
        assert!(!html.contains("<dl>"));
        assert!(html.contains("Term\n: Def"));
    }

    #[test]
    fn definition_after_fence_still_matches() {
        let html = engine().render("```\ncode\n```\n\nTerm\n: Def\n");
        assert!(html.contains("<pre><code>code\n</code></pre>"));
        assert!(html.contains("<dl><dt>Term</dt><dd>Def</dd></dl>"));
    }

    // ========================================================================
    // Tweets
    // ========================================================================

    #[test]
    fn tweet_by_id() {
        let html = engine().render("::tweet(1234567890123456789)");
        assert!(html.contains("1234567890123456789"));
        assert!(html.contains("twitter-tweet"));
    }

    #[test]
    fn tweet_by_url_yields_same_id() {
        let engine = engine();
        let by_url = engine.render("::tweet(https://x.com/alice/status/1234567890123456789)");
        let by_id = engine.render("::tweet(1234567890123456789)");
        assert_eq!(by_url, by_id);
    }

    #[test]
    fn tweet_with_unusable_argument_is_left_alone() {
        let engine = engine();
        let input = "::tweet(not-a-number)";
        assert_eq!(engine.render(input), host_only(&engine, input));
        assert!(engine.render(input).contains("::tweet(not-a-number)"));
    }

    #[test]
    fn tweet_mode_does_not_change_output() {
        let engine = engine();
        assert_eq!(
            engine.render("::tweet(42, dark)"),
            engine.render("::tweet(42)")
        );
    }

    #[test]
    fn tweet_keeps_surrounding_text() {
        let html = engine().render("before ::tweet(7) after");
        assert!(html.starts_with("<p>before <div class=\"tweet-container\">"));
        assert!(html.ends_with("</div> after</p>\n"));
    }

    #[test]
    fn declined_tweet_does_not_hide_a_later_one() {
        let html = engine().render("::tweet(nope) then ::tweet(99)");
        assert!(html.contains("::tweet(nope) then "));
        assert!(html.contains("https://twitter.com/i/status/99"));
    }

    #[test]
    fn tweet_in_code_is_not_expanded() {
        let engine = engine();
        let span = engine.render("`::tweet(123)`");
        assert_eq!(span, "<p><code>::tweet(123)</code></p>\n");
        let block = engine.render("```\n::tweet(123)\n```\n");
        assert!(!block.contains("twitter-tweet"));
    }

    #[test]
    fn tweet_inside_definition() {
        let html = engine().render("Example\n: ::tweet(5)\n");
        assert!(html.contains("<dd><div class=\"tweet-container\">"));
    }
}
