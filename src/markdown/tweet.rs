//! Tweet embeds: `::tweet(ID)` or `::tweet(URL)`.
//!
//! The argument is either a bare numeric status id or any URL with a
//! `status/<digits>` segment. Only the id reaches the output; the widget
//! always renders in its default (auto) colour mode.
//!
//! An optional second argument, `::tweet(ID, dark)`, is accepted and kept on
//! the token as [`ColorMode`], but does not affect rendering yet.

use std::sync::LazyLock;

use maud::html;
use regex::Regex;

use super::Markdown;
use super::registry::{Level, SyntaxExtension, Token, Tokenized};

const CALL_PREFIX: &str = "::tweet(";
const WIDGET_SCRIPT: &str = "https://platform.twitter.com/widgets.js";

static CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^::tweet\(([^)]+)\)").expect("valid regex"));

static STATUS_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"status/(\d+)").expect("valid regex"));

/// Requested widget theme. Parsed, carried, not rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Light,
    Dark,
}

impl ColorMode {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

/// A resolved tweet reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetRef {
    /// Numeric status id, digits only.
    pub id: String,
    pub mode: Option<ColorMode>,
}

/// Inline extension for `::tweet(...)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TweetEmbed;

impl SyntaxExtension for TweetEmbed {
    fn name(&self) -> &'static str {
        "tweet"
    }

    fn level(&self) -> Level {
        Level::Inline
    }

    fn detect(&self, src: &str) -> Option<usize> {
        src.find(CALL_PREFIX)
    }

    fn tokenize(&self, src: &str, _engine: &Markdown) -> Option<Tokenized> {
        let caps = CALL.captures(src)?;
        let (target, mode) = match caps[1].split_once(',') {
            Some((target, mode)) => (target, ColorMode::parse(mode)),
            None => (&caps[1], None),
        };
        let id = status_id(target.trim())?;
        Some(Tokenized {
            consumed: caps[0].len(),
            token: Token::Tweet(TweetRef { id, mode }),
        })
    }

    fn render(&self, token: &Token, _engine: &Markdown) -> String {
        let Token::Tweet(tweet) = token else {
            return String::new();
        };
        html! {
            div.tweet-container {
                blockquote.twitter-tweet {
                    a style="visibility: hidden;" href={ "https://twitter.com/i/status/" (tweet.id) } {
                        "View on X/Twitter"
                    }
                }
                script async src=(WIDGET_SCRIPT) charset="utf-8" {}
            }
        }
        .into_string()
    }
}

/// Extract the numeric status id from a tweet argument.
///
/// A `status/` URL wins unless the whole argument is already all digits.
fn status_id(target: &str) -> Option<String> {
    let all_digits = !target.is_empty() && target.bytes().all(|b| b.is_ascii_digit());
    if target.contains("status/") && !all_digits {
        STATUS_ID.captures(target).map(|caps| caps[1].to_string())
    } else if all_digits {
        Some(target.to_string())
    } else {
        None
    }
}
