//! # Quill
//!
//! A small static site compiler for personal writing. A directory of Markdown
//! files becomes a directory of HTML pages, an RSS feed, and copied static
//! files. In watch mode it rebuilds on every real change and replaces itself
//! when its own binary or config changes.
//!
//! # Architecture
//!
//! ```text
//! pages/*.md ──scan──▶ Page ──markdown──▶ HTML body ──generate──▶ dist/*.html
//!                       │                                          dist/rss.xml
//!                       └── writing/ ──▶ WritingEntry ──feed───────┘
//!
//! notify ──▶ watch::Router ──▶ watch::Scheduler ──debounce──▶ generate::compile
//!                                    │
//!                                    └── logic change ──▶ re-exec
//! ```
//!
//! Every build is a full build. Incremental work is avoided one level up:
//! the watcher only triggers a build when file content actually changed.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`markdown`] | Markdown engine: `pulldown-cmark` plus registered syntax extensions (definition lists, tweet embeds) |
//! | [`watch`] | File watching, change detection, debounced rebuild scheduling, self-restart |
//! | [`scan`] | Walks the content tree into [`types::Page`]s and the sorted writing list |
//! | [`generate`] | Full compile: placeholders, page chrome, HTML shell, static files, feed |
//! | [`feed`] | RSS 2.0 rendering with absolute links |
//! | [`entry`] | `quill new` scaffolding for dated drafts |
//! | [`config`] | `site.toml` loading over stock defaults, validation, documented stock file |
//! | [`naming`] | `YYYY-MM-DD-slug` filename convention and date labels |
//! | [`types`] | Shared data types (`Page`, `WritingEntry`) |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`output`] | CLI output formatting for build reports |
//!
//! # Design Decisions
//!
//! ## Extensions Splice Into the Host Parser
//!
//! Custom syntax never replaces `pulldown-cmark`. Block extensions rewrite
//! their match into a raw HTML block before parsing; inline extensions
//! rewrite text events after parsing. Input without custom syntax renders
//! byte-for-byte as plain `pulldown-cmark` would.
//!
//! ## Content Hashes, Not Timestamps
//!
//! The watcher compares SHA-256 digests to skip saves that changed nothing,
//! and the style sheet link carries a content hash instead of a build time.
//! The same inputs always give the same output tree.
//!
//! ## Flat Output
//!
//! Every page lands in the output root under its basename with the date
//! prefix stripped. Links between pages are plain filenames, and a name
//! collision is a build error rather than a silent overwrite.

pub mod config;
pub mod entry;
pub mod feed;
pub mod generate;
pub mod logging;
pub mod markdown;
pub mod naming;
pub mod output;
pub mod scan;
pub mod types;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_helpers;
