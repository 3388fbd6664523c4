// src/main.rs
// =============================================================================
// Entry point of the sitescout CLI.
//
// What happens here:
// 1. Parse command-line arguments and set up logging (stderr)
// 2. Load the configuration and apply command-line overrides
// 3. Run the requested subcommand
// 4. Print a table or JSON and exit with a meaningful code:
//      0 = report has at least one page (or sitemaps listed pages)
//      1 = the crawl ran but produced nothing
//      2 = the crawl could not run at all
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use sitescout::config::CrawlConfig;
use sitescout::crawl::{CrawlReport, Crawler};
use sitescout::fetch::{ChromeAgent, RenderingAgent};
use sitescout::links::SiteBase;
use sitescout::sitemap::SitemapDiscoverer;
use sitescout::snippets::{HeaderFooterIdentifier, NoSnippets, StaticSnippets};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "sitescout=debug" } else { "sitescout=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Crawl {
            seed,
            config,
            json,
            output,
            max_pages,
            max_links,
            no_sitemaps,
            header_snippets,
            footer_snippets,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(max_pages) = max_pages {
                config.max_pages_to_analyze = max_pages;
            }
            if let Some(max_links) = max_links {
                config.max_links_to_discover = max_links;
            }
            if no_sitemaps {
                config.use_sitemaps = false;
            }
            config.validate()?;

            let identifier = load_identifier(header_snippets, footer_snippets)?;
            handle_crawl(&seed, config, identifier, json, output.as_deref()).await
        }
        Commands::Sitemap { seed, config, json } => {
            let config = load_config(config.as_deref())?;
            handle_sitemap(&seed, &config, json).await
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<CrawlConfig> {
    match path {
        Some(path) => Ok(CrawlConfig::load(path)?),
        None => Ok(CrawlConfig::default()),
    }
}

fn load_identifier(
    header: Option<PathBuf>,
    footer: Option<PathBuf>,
) -> Result<Arc<dyn HeaderFooterIdentifier>> {
    if header.is_none() && footer.is_none() {
        return Ok(Arc::new(NoSnippets));
    }
    let identifier = StaticSnippets::from_files(header.as_deref(), footer.as_deref())
        .context("cannot read header/footer snippet file")?;
    Ok(Arc::new(identifier))
}

// Handles the 'crawl' subcommand
async fn handle_crawl(
    seed: &str,
    config: CrawlConfig,
    identifier: Arc<dyn HeaderFooterIdentifier>,
    json: bool,
    output: Option<&Path>,
) -> Result<i32> {
    // fail fast on a bad seed, before a browser is started
    SiteBase::from_seed(seed)?;

    // stdout carries nothing but the report in JSON mode
    if !json {
        println!("🔍 Crawling {}", seed);
        println!(
            "📊 Limits: {} page(s), {} link(s)",
            config.max_pages_to_analyze, config.max_links_to_discover
        );
    }

    let agent = Arc::new(ChromeAgent::launch(&config).await?);
    let shared: Arc<dyn RenderingAgent> = agent.clone();
    let outcome = match Crawler::new(config, shared, identifier) {
        Ok(crawler) => crawler.run(seed).await,
        Err(e) => Err(e),
    };

    // every other handle to the browser was dropped with the crawler
    if let Ok(agent) = Arc::try_unwrap(agent) {
        agent.close().await;
    }

    let report = outcome?;

    if let Some(path) = output {
        std::fs::write(path, report.to_json()?)
            .with_context(|| format!("cannot write report to {}", path.display()))?;
        if !json {
            println!("💾 Report written to {}", path.display());
        }
    }

    if json {
        println!("{}", report.to_json()?);
    } else {
        print_table(&report);
    }

    if report.is_empty() {
        Ok(1)
    } else {
        Ok(0)
    }
}

// Handles the 'sitemap' subcommand
async fn handle_sitemap(seed: &str, config: &CrawlConfig, json: bool) -> Result<i32> {
    let base = SiteBase::from_seed(seed)?;
    let discoverer = SitemapDiscoverer::new(config).context("cannot build HTTP client")?;
    let result = discoverer.discover(&base).await;

    if json {
        let failures: Vec<serde_json::Value> = result
            .failures
            .iter()
            .map(|f| serde_json::json!({ "url": f.url(), "kind": f.kind(), "message": f.to_string() }))
            .collect();
        let output = serde_json::json!({
            "site": base.as_str(),
            "page_urls": result.page_urls,
            "sitemaps_visited": result.visited_sitemaps.len(),
            "failures": failures,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for url in &result.page_urls {
            println!("{}", url);
        }
        println!();
        println!("📊 Summary:");
        println!("   🗺️  Sitemaps: {}", result.visited_sitemaps.len());
        println!("   📄 Pages: {}", result.page_urls.len());
        println!("   ⚠️  Failures: {}", result.failures.len());
    }

    if result.page_urls.is_empty() {
        Ok(1)
    } else {
        Ok(0)
    }
}

// Prints the report as a human-readable table
fn print_table(report: &CrawlReport) {
    println!();
    println!("{:<60} {:<10} {:<8} {:<40}", "URL", "KIND", "ENTITIES", "TOP KEYWORDS");
    println!("{}", "=".repeat(121));

    for page in &report.pages {
        let keywords = page
            .keywords
            .iter()
            .take(3)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{:<60} {:<10} {:<8} {:<40}",
            truncate(page.url.as_str(), 57),
            format!("{:?}", page.kind).to_lowercase(),
            page.entities.all().count(),
            truncate(&keywords, 40)
        );
    }

    if !report.failures.is_empty() {
        println!();
        println!("{:<60} {:<22} {:<40}", "FAILED", "KIND", "MESSAGE");
        println!("{}", "-".repeat(121));
        for failure in &report.failures {
            println!(
                "{:<60} {:<22} {:<40}",
                truncate(&failure.url, 57),
                failure.kind,
                truncate(&failure.message, 40)
            );
        }
    }

    println!();
    println!("📊 Summary:");
    println!("   ✅ Pages analysed: {}", report.crawled_page_count);
    println!("   ❌ Failures: {}", report.failures.len());
    println!(
        "   🗺️  Sitemap URLs: {} ({} crawled)",
        report.sitemap_stats.urls_discovered, report.sitemap_stats.pages_processed
    );
    println!("   ⏱️  Duration: {:.1}s", report.duration_seconds);
}

// Shortens text for a table cell, counting characters rather than bytes
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut)
}
