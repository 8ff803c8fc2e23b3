//! Definition lists: a line of text followed by a `: definition` line.
//!
//! ```markdown
//! Latency
//! : Time until the *first* byte arrives.
//! ```
//!
//! renders as `<dl><dt>Latency</dt><dd>Time until the <em>first</em> byte
//! arrives.</dd></dl>`.

use std::sync::LazyLock;

use maud::{PreEscaped, html};
use regex::Regex;

use super::Markdown;
use super::registry::{Level, SyntaxExtension, Token, Tokenized};

static CANDIDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[^\n]+\n:[ \t]").expect("valid regex"));

static RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^\n]+)\n:[ \t]+([^\n]+)(?:\n|$)").expect("valid regex"));

/// Block extension for single term/definition pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefinitionList;

impl SyntaxExtension for DefinitionList {
    fn name(&self) -> &'static str {
        "definitionList"
    }

    fn level(&self) -> Level {
        Level::Block
    }

    fn detect(&self, src: &str) -> Option<usize> {
        CANDIDATE.find(src).map(|m| m.start())
    }

    fn tokenize(&self, src: &str, engine: &Markdown) -> Option<Tokenized> {
        let caps = RULE.captures(src)?;
        let term = caps[1].trim();
        let definition = caps[2].trim();
        if term.is_empty() || definition.is_empty() {
            return None;
        }
        Some(Tokenized {
            consumed: caps[0].len(),
            token: Token::DefinitionList {
                term: engine.inline_tokens(term),
                definition: engine.inline_tokens(definition),
            },
        })
    }

    fn render(&self, token: &Token, engine: &Markdown) -> String {
        let Token::DefinitionList { term, definition } = token else {
            return String::new();
        };
        let markup = html! {
            dl {
                dt { (PreEscaped(engine.render_inline(term))) }
                dd { (PreEscaped(engine.render_inline(definition))) }
            }
        };
        let mut out = markup.into_string();
        out.push('\n');
        out
    }
}
