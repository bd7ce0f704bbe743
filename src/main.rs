//! wit command-line interface

use anyhow::{anyhow, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use url::Url;
use wit::config::{create_default_config, load_config, validate, ScrapingConfig};
use wit::extract::extract_page;
use wit::fetch::FetchClient;
use wit::markdown::render_document;
use wit::sync::{sync_site, write_changes, SyncReport};
use wit::SiteConfig;

/// wit: website in tree
///
/// Scrapes websites into a markdown file tree, rewriting only pages whose
/// content actually changed, so the tree versions cleanly under git.
#[derive(Parser, Debug)]
#[command(name = "wit")]
#[command(version)]
#[command(about = "Scrape websites into a versioned markdown tree", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape configured site(s) and update the markdown tree
    Scrape {
        /// Config file path
        #[arg(short, long, default_value = "wit.yaml")]
        config: PathBuf,

        /// Commit changes to git after scraping
        #[arg(long)]
        commit: bool,

        /// Site(s) to scrape, comma-separated (default: all)
        #[arg(short, long, value_delimiter = ',')]
        site: Vec<String>,
    },

    /// Scrape a single URL without a config file
    ScrapeUrl {
        /// URL to scrape
        url: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Render the page with a JavaScript backend
        #[arg(short, long)]
        javascript: bool,
    },

    /// List the pages a scrape would sync, without writing anything
    List {
        /// Config file path
        #[arg(short, long, default_value = "wit.yaml")]
        config: PathBuf,

        /// Site(s) to list, comma-separated (default: all)
        #[arg(short, long, value_delimiter = ',')]
        site: Vec<String>,
    },

    /// List configured sites
    Sites {
        /// Config file path
        #[arg(short, long, default_value = "wit.yaml")]
        config: PathBuf,
    },

    /// Create a starter wit.yaml config file
    Init {
        /// Website base URL
        #[arg(long)]
        base_url: String,

        /// Output config file path
        #[arg(short, long, default_value = "wit.yaml")]
        output: PathBuf,

        /// Create a multi-site config template
        #[arg(long)]
        multi_site: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Scrape {
            config,
            commit,
            site,
        } => run_scrape(&config, commit, &site).await,
        Command::ScrapeUrl {
            url,
            output,
            javascript,
        } => run_scrape_url(&url, &output, javascript).await,
        Command::List { config, site } => run_list(&config, &site).await,
        Command::Sites { config } => run_sites(&config),
        Command::Init {
            base_url,
            output,
            multi_site,
        } => run_init(&base_url, &output, multi_site),
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("wit=info,warn"),
            1 => EnvFilter::new("wit=debug,info"),
            2 => EnvFilter::new("wit=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Resolves the `--site` filter against the config, erroring usefully when
/// nothing matches
fn select_sites<'a>(
    config: &'a wit::Config,
    filter: &[String],
) -> anyhow::Result<Vec<&'a SiteConfig>> {
    let names = (!filter.is_empty()).then_some(filter);
    let sites = config.get_sites(names);

    if sites.is_empty() {
        if filter.is_empty() {
            bail!("no sites configured");
        }
        bail!(
            "no sites found matching: {} (available: {})",
            filter.join(", "),
            config.site_names().join(", ")
        );
    }

    Ok(sites)
}

async fn run_scrape(config_path: &Path, commit: bool, filter: &[String]) -> anyhow::Result<()> {
    tracing::info!("Loading config from {}", config_path.display());
    let config = load_config(config_path)?;
    validate(&config, false)?;

    if commit && !wit::git::is_git_repo(Path::new(".")) {
        bail!("not in a git repository; cannot commit changes");
    }

    let sites = select_sites(&config, filter)?;
    if sites.len() > 1 {
        tracing::info!(
            "Scraping {} sites: {}",
            sites.len(),
            sites.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join(", ")
        );
    }

    let mut total_pages = 0usize;
    let mut total_failed = 0usize;
    let mut changed_paths: Vec<PathBuf> = Vec::new();

    // One client carries the robots cache and per-origin delays across
    // sites, so sites sharing an origin share one politeness schedule
    let mut client: Option<FetchClient> = None;

    for site in &sites {
        let mut site_client = match client.take() {
            Some(previous) => previous.for_site(&site.scraping)?,
            None => FetchClient::new(&site.scraping)?,
        };

        let report = sync_site(site, &mut site_client).await?;
        client = Some(site_client);

        let written = write_changes(&report)?;
        report_summary(&report);

        total_pages += report.decisions.len();
        total_failed += report.failures.len();
        changed_paths.extend(written);
    }

    if sites.len() > 1 {
        tracing::info!(
            "Total: {} pages, {} changed, {} failed",
            total_pages,
            changed_paths.len(),
            total_failed
        );
    }

    if commit {
        if changed_paths.is_empty() {
            tracing::info!("No changes to commit");
        } else {
            let changed_files: Vec<String> =
                changed_paths.iter().map(|p| p.display().to_string()).collect();
            let message = wit::git::format_commit_message(&config.git.message_template, &changed_files);
            let sha = wit::git::commit_changes(
                Path::new("."),
                &message,
                &changed_paths,
                &config.git.author_name,
                &config.git.author_email,
            )?;
            if let Some(sha) = sha {
                tracing::info!("Committed: {} \"{}\"", sha, message);
            }
        }
    }

    Ok(())
}

fn report_summary(report: &SyncReport) {
    for failure in &report.failures {
        tracing::warn!("[{}] skipped {}: {}", report.site, failure.url, failure.message);
    }
    tracing::info!(
        "[{}] Complete: {} pages, {} changed, {} failed",
        report.site,
        report.decisions.len(),
        report.changed_count(),
        report.failures.len()
    );
}

async fn run_scrape_url(url: &str, output: &Path, javascript: bool) -> anyhow::Result<()> {
    if javascript {
        bail!("JavaScript rendering requires a render backend; none is available in this build");
    }

    let url = Url::parse(url).map_err(|e| anyhow!("invalid URL '{}': {}", url, e))?;

    // Ad-hoc scrape of a single page; no inter-request delay needed
    let scraping = ScrapingConfig {
        delay: 0.0,
        ..ScrapingConfig::default()
    };
    let mut client = FetchClient::new(&scraping)?;

    tracing::info!("Scraping {}", url);

    let outcome = client.fetch(&url).await;
    let body = match outcome.body {
        Some(body) if outcome.is_ok() => body,
        _ => bail!("failed to fetch {}: {}", url, outcome.status.as_str()),
    };

    let page = extract_page(&body, &Default::default(), &Default::default())?;
    let document = render_document(
        &page.markdown,
        &url,
        page.title.as_deref(),
        &Default::default(),
        chrono::Utc::now(),
    );

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, document)?;

    tracing::info!("Saved to {}", output.display());
    Ok(())
}

async fn run_list(config_path: &Path, filter: &[String]) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    validate(&config, false)?;
    let sites = select_sites(&config, filter)?;

    let mut total_pages = 0usize;
    let mut client: Option<FetchClient> = None;

    for site in &sites {
        let mut site_client = match client.take() {
            Some(previous) => previous.for_site(&site.scraping)?,
            None => FetchClient::new(&site.scraping)?,
        };
        let discovery = wit::discovery::discover(site, &mut site_client).await;
        client = Some(site_client);

        total_pages += discovery.targets.len();

        if sites.len() > 1 {
            println!("\n{} ({}):", site.name, site.base_url);
            println!("  Found {} pages\n", discovery.targets.len());
        } else {
            println!("Found {} pages:\n", discovery.targets.len());
        }

        for target in &discovery.targets {
            let path = wit::sync::map_path(&target.url, &site.base_url, &site.output_dir);
            println!("  {}", target.url);
            println!("    -> {}", path.display());
            println!();
        }
    }

    if sites.len() > 1 {
        println!("\nTotal: {} pages across {} sites", total_pages, sites.len());
    }

    Ok(())
}

fn run_sites(config_path: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    println!("Configured sites ({}):\n", config.sites.len());
    for site in &config.sites {
        println!("  {}", site.name);
        println!("    URL:    {}", site.base_url);
        println!("    Output: {}", site.output_dir.display());
        println!();
    }

    Ok(())
}

fn run_init(base_url: &str, output: &Path, multi_site: bool) -> anyhow::Result<()> {
    if output.exists() {
        bail!(
            "{} already exists; remove it first or pass a different --output",
            output.display()
        );
    }

    let content = create_default_config(base_url, multi_site);
    std::fs::write(output, content)?;

    tracing::info!("Created {}", output.display());
    if multi_site {
        tracing::info!("Multi-site config created. Add more sites under the 'sites' key.");
    }
    tracing::info!("Edit the config file to customize scraping settings");
    tracing::info!("Then run 'wit scrape' to start scraping");
    Ok(())
}
