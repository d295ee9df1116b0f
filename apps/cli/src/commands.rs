//! CLI command definitions, routing, and tracing setup.

use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use nbshelf_core::{
    AuditProgress, DiscoverOptions, EnrichmentProgress, Pipeline, ProgressReporter, TitleCheck,
    TitleReport, TitleStatus,
};
use nbshelf_discovery::DiscoveryProgress;
use nbshelf_shared::{
    AppConfig, DiscoveredNotebook, Library, init_config, library_path, load_config,
};
use nbshelf_storage::LibraryStore;
use nbshelf_webdriver::WebDriverLauncher;

/// Separates the human summary from the machine-readable batch output.
const JSON_MARKER: &str = "---JSON---";

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// nbshelf: a local library of your NotebookLM notebooks.
#[derive(Parser)]
#[command(
    name = "nbshelf",
    version,
    about = "Discover, store and enrich your NotebookLM notebooks.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Read the notebook list and resolve every notebook's URL.
    Discover {
        /// Show the browser window instead of running headless.
        #[arg(long)]
        show_browser: bool,

        /// Add newly discovered notebooks to the library.
        #[arg(long)]
        sync: bool,

        /// Enrich library notebooks that have no description yet.
        #[arg(long)]
        enrich: bool,
    },

    /// Compare stored names with the titles shown on each notebook page.
    Titles {
        /// Show the browser window instead of running headless.
        #[arg(long)]
        show_browser: bool,
    },

    /// List the notebooks in the library.
    List,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "nbshelf=info",
        1 => "nbshelf=debug",
        _ => "nbshelf=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Discover {
            show_browser,
            sync,
            enrich,
        } => cmd_discover(show_browser, DiscoverOptions { sync, enrich }).await,
        Command::Titles { show_browser } => cmd_titles(show_browser).await,
        Command::List => cmd_list(),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn pipeline(config: &AppConfig, show_browser: bool) -> Result<Pipeline<WebDriverLauncher>> {
    let launcher = WebDriverLauncher::new(&config.browser.webdriver_url)?;
    let pipeline = Pipeline::new(launcher, config);
    Ok(if show_browser {
        pipeline.headless(false)
    } else {
        pipeline
    })
}

fn library_store(config: &AppConfig) -> Result<LibraryStore> {
    Ok(LibraryStore::new(library_path(config)?))
}

async fn cmd_discover(show_browser: bool, opts: DiscoverOptions) -> Result<()> {
    let config = load_config()?;
    let store = library_store(&config)?;
    let pipeline = pipeline(&config, show_browser)?;

    info!(
        home = %config.browser.home_url,
        sync = opts.sync,
        enrich = opts.enrich,
        "discovering notebooks"
    );

    let reporter = CliProgress::new();
    let result = pipeline.discover(&store, opts, &reporter).await;
    reporter.finish();
    let outcome = result?;

    println!();
    if outcome.snapshot.is_empty() {
        println!("  No notebooks found. The list may be empty or failed to load.");
    } else {
        println!("  Found {} notebook(s):", outcome.snapshot.len());
        for (i, nb) in outcome.snapshot.iter().enumerate() {
            println!(
                "  {:>3}. {}  {}",
                i + 1,
                nb.title,
                nb.url.as_deref().unwrap_or("(unresolved)")
            );
        }
    }
    if !outcome.new_notebooks.is_empty() {
        println!();
        println!("  {} notebook(s) not in the library:", outcome.new_notebooks.len());
        for nb in &outcome.new_notebooks {
            println!("    {}  {}", nb.title, nb.url.as_deref().unwrap_or_default());
        }
        if !opts.sync {
            println!("  Run with --sync to add them.");
        }
        println!();
    }
    if opts.sync {
        println!("  Added:    {}", outcome.added.len());
    }
    if opts.enrich {
        println!("  Enriched: {}", outcome.enriched);
    }
    println!("  Time:     {:.1}s", outcome.elapsed.as_secs_f64());
    println!();

    println!("{JSON_MARKER}");
    println!(
        "{}",
        serde_json::to_string_pretty(&outcome.snapshot).wrap_err("serializing snapshot")?
    );
    Ok(())
}

async fn cmd_titles(show_browser: bool) -> Result<()> {
    let config = load_config()?;
    let store = library_store(&config)?;
    let pipeline = pipeline(&config, show_browser)?;

    info!(library = %store.path().display(), "auditing notebook titles");

    let reporter = CliProgress::new();
    let result = pipeline.audit_titles(&store, &reporter).await;
    reporter.finish();
    let report = result?;

    print_title_summary(&report);

    println!("{JSON_MARKER}");
    println!(
        "{}",
        serde_json::to_string_pretty(&report).wrap_err("serializing title report")?
    );
    Ok(())
}

fn print_title_summary(report: &TitleReport) {
    println!();
    println!("  Checked:    {}", report.checks.len());
    println!("  Matching:   {}", report.count(|s| *s == TitleStatus::Match));
    println!("  Mismatched: {}", report.mismatches().count());
    println!("  Unknown:    {}", report.count(|s| *s == TitleStatus::Unknown));
    println!(
        "  Errors:     {}",
        report.count(|s| matches!(s, TitleStatus::Error { .. }))
    );

    for check in report.mismatches() {
        if let TitleStatus::Mismatch { actual } = &check.result {
            println!("    {}: stored \"{}\", page shows \"{actual}\"", check.slug, check.stored);
        }
    }
    println!();
}

fn cmd_list() -> Result<()> {
    let config = load_config()?;
    let store = library_store(&config)?;
    let library = store.load()?;

    if library.notebooks.is_empty() {
        println!("No notebooks in {}", store.path().display());
        return Ok(());
    }

    print!("{}", render_library(&library));
    println!();
    println!("{} notebook(s)", library.notebooks.len());
    Ok(())
}

/// One header line plus one line per record, in library order.
fn render_library(library: &Library) -> String {
    let mut out = format!(
        "{:<32} {:<40} {:<7} {:<9} URL\n",
        "SLUG", "NAME", "TOPICS", "ENRICHED"
    );
    for (slug, nb) in &library.notebooks {
        out.push_str(&format!(
            "{:<32} {:<40} {:<7} {:<9} {}\n",
            slug,
            nb.name,
            nb.topics.len(),
            if nb.description.is_empty() { "no" } else { "yes" },
            nb.url.as_deref().unwrap_or("-")
        ));
    }
    out
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl DiscoveryProgress for CliProgress {
    fn rows_found(&self, total: usize) {
        self.spinner
            .set_message(format!("Found {total} notebooks, resolving URLs"));
    }

    fn row_resolved(&self, current: usize, total: usize, entry: &DiscoveredNotebook) {
        let mark = if entry.url.is_some() { "ok" } else { "unresolved" };
        self.spinner
            .set_message(format!("Resolving [{current}/{total}] {} ({mark})", entry.title));
    }
}

impl EnrichmentProgress for CliProgress {
    fn record_started(&self, current: usize, total: usize, slug: &str) {
        self.spinner
            .set_message(format!("Enriching [{current}/{total}] {slug}"));
    }

    fn record_finished(&self, _slug: &str, _updated: bool) {}
}

impl AuditProgress for CliProgress {
    fn title_checked(&self, current: usize, total: usize, check: &TitleCheck) {
        self.spinner
            .set_message(format!("Checking titles [{current}/{total}] {}", check.slug));
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }
}
