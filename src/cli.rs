// src/cli.rs
// =============================================================================
// Command-line interface, defined with clap's derive API.
//
//   sitescout crawl example.com --max-pages 50 --json --output report.json
//   sitescout sitemap example.com
//
// Limits given on the command line override the config file, which in turn
// overrides the built-in defaults.
// =============================================================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "sitescout",
    version,
    about = "Crawl a website and mine its pages for keywords and contact details",
    long_about = "sitescout discovers a bounded set of pages on a site (sitemaps plus link \
                  following), renders them in headless Chrome, and extracts keywords, \
                  phone numbers, emails, prices and dates from the visible text."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a site and print the analysis report
    ///
    /// Example: sitescout crawl example.com --max-pages 10
    Crawl {
        /// Seed URL; "https://" is assumed when no scheme is given
        seed: String,

        /// TOML configuration file
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Print the full report as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Write the JSON report to this file
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Maximum number of pages to analyse
        #[arg(long)]
        max_pages: Option<usize>,

        /// Maximum number of distinct URLs to discover
        #[arg(long)]
        max_links: Option<usize>,

        /// Do not seed the crawl from robots.txt / sitemap.xml
        #[arg(long)]
        no_sitemaps: bool,

        /// File with header snippets to strip, one per line
        #[arg(long)]
        header_snippets: Option<PathBuf>,

        /// File with footer snippets to strip, one per line
        #[arg(long)]
        footer_snippets: Option<PathBuf>,
    },

    /// Only run sitemap discovery and list the page URLs found
    ///
    /// Example: sitescout sitemap example.com --json
    Sitemap {
        /// Site to inspect
        seed: String,

        /// TOML configuration file
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Print JSON instead of a plain list
        #[arg(long)]
        json: bool,
    },
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Option<usize> for --max-pages:
//    - None means "not given on the command line"
//    - That is different from a number, so the config file value survives
//
// 2. What does global = true do on --verbose?
//    - The flag is accepted before or after the subcommand
//    - `sitescout -v crawl x` and `sitescout crawl x -v` both work
//
// 3. Doc comments (///) become help text:
//    - clap reads them to build `--help`, so they double as documentation
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crawl() {
        let cli = Cli::parse_from([
            "sitescout",
            "crawl",
            "example.com",
            "--max-pages",
            "5",
            "--no-sitemaps",
            "-v",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Crawl {
                seed,
                max_pages,
                max_links,
                no_sitemaps,
                json,
                ..
            } => {
                assert_eq!(seed, "example.com");
                assert_eq!(max_pages, Some(5));
                assert_eq!(max_links, None);
                assert!(no_sitemaps);
                assert!(!json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_sitemap() {
        let cli = Cli::parse_from(["sitescout", "sitemap", "https://example.com", "--json"]);
        assert!(matches!(cli.command, Commands::Sitemap { json: true, .. }));
    }

    #[test]
    fn test_seed_is_required() {
        assert!(Cli::try_parse_from(["sitescout", "crawl"]).is_err());
    }
}
