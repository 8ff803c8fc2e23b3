use chrono::Local;
use clap::{Parser, Subcommand};
use quill::generate::{self, BuildContext, GenerateError};
use quill::watch::{self, WatchPlan};
use quill::{config, entry, logging, output};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "Markdown to static HTML, with a rebuild-on-save watcher")]
#[command(long_about = "\
Markdown to static HTML, with a rebuild-on-save watcher

Every *.md under the content directory becomes a flat HTML page. Files in the
writing directory are listed on the index and published in rss.xml, newest
first by their YYYY-MM-DD- filename prefix.

Source structure:

  site.toml                        # Site config (optional)
  styles.css                       # Copied to dist/styles.css
  assets/                          # Copied to dist/assets/
  pages/
  ├── index.md                     # Site root; {{writing}} expands to the listing
  ├── about.md                     # → about.html
  ├── writing/
  │   ├── 2024-01-01-new-year.md   # → new-year.html, dated Jan 2024
  │   └── colophon.md              # → colophon.html, undated
  └── drafts/                      # `quill new` writes here; compiled, not listed

Placeholders: {{date}} (dated files), {{YEAR}}, {{writing}} (index.md only).
Extra syntax: definition lists (Term / : Definition) and ::tweet(ID or URL).

Run 'quill gen-config' to generate a documented site.toml.")]
#[command(version)]
struct Cli {
    /// Site config file, relative to --root
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Project root that configured paths resolve against
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile the site, then rebuild whenever sources change
    Build {
        /// Compile once and exit instead of watching
        #[arg(long)]
        once: bool,
    },
    /// Create a dated draft entry
    New {
        /// Entry title
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    /// Print a stock site.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config_path = cli.root.join(&cli.config);

    match cli.command {
        Command::Build { once } => {
            let site_config = load(&config_path)?;
            let paths = site_config.resolve_paths(&cli.root);

            // Watch before the first build so edits made during it are seen.
            let session = if once {
                None
            } else {
                let plan = WatchPlan {
                    content_roots: vec![paths.content.clone(), paths.writing.clone()],
                    stylesheet: Some(paths.stylesheet.clone()),
                    logic_files: vec![config_path.clone()],
                    executable: std::env::current_exe()?,
                    debounce: site_config.watch.debounce(),
                };
                Some(watch::Session::start(&plan)?)
            };

            let report = generate::compile(&site_config, &paths, &BuildContext::now())?;
            output::print_compile_report(&report, &cli.root);

            if let Some(session) = session {
                session.run(|| {
                    let report = generate::compile(&site_config, &paths, &BuildContext::now())?;
                    output::print_compile_summary(&report, &cli.root);
                    Ok::<(), GenerateError>(())
                })?;
            }
        }
        Command::New { title } => {
            let site_config = load(&config_path)?;
            let paths = site_config.resolve_paths(&cli.root);
            let path = entry::create(&paths.drafts, &title.join(" "), Local::now().date_naive())?;
            println!("{}", output::format_new_entry(&path, &cli.root));
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the site config and install logging from it.
fn load(config_path: &Path) -> Result<config::SiteConfig, config::ConfigError> {
    let site_config = config::load_config(config_path)?;
    logging::init(&site_config.logging);
    tracing::debug!(path = %config_path.display(), "loaded config");
    Ok(site_config)
}
