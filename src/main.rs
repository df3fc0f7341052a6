// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (tracing, filtered by RUST_LOG, written to stderr)
// 2. Parse command-line arguments using clap
// 3. Build the controller and the HTTP engine, then run the crawl
// 4. Print the crawl report as a table or JSON
// 5. Exit with proper code (0 = success, 2 = error)
//
// Any error, whether from configuration, a failed write or teardown, ends the
// process with a message naming the URL or path involved.
// =============================================================================

mod cli;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{split_scopes, Cli, Commands};
use site_dumper::config::CrawlConfig;
use site_dumper::controller::{CrawlController, CrawlReport};
use site_dumper::crawl::{CrawlEngine, EngineOptions, HttpEngine};
use site_dumper::error::CrawlError;
use site_dumper::events::TracingObserver;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole error chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            seed,
            scopes,
            dump_dir,
            max_depth,
            max_pages,
            json,
            delay_ms,
            timeout_secs,
            user_agent,
        } => {
            let config = CrawlConfig::new(seed, split_scopes(&scopes), dump_dir)
                .with_max_depth(max_depth)
                .with_max_pages(max_pages);

            let mut options = EngineOptions {
                delay: Duration::from_millis(delay_ms),
                timeout: Duration::from_secs(timeout_secs),
                ..EngineOptions::default()
            };
            if let Some(agent) = user_agent {
                options.user_agent = agent;
            }

            handle_run(config, options, json).await
        }
    }
}

// Handles the 'run' subcommand
async fn handle_run(config: CrawlConfig, options: EngineOptions, json: bool) -> Result<i32> {
    println!("🔍 Mirroring {} into {}", config.seed, config.dump_dir.display());
    println!("📊 Max depth: {}, max pages: {}", config.max_depth, config.max_pages);

    let controller = CrawlController::new(config)?;

    let mut engine = HttpEngine::new(options);
    engine.add_listener(Box::new(TracingObserver));

    match controller.run(&mut engine).await {
        Ok(report) => {
            print_report(&report, json)?;
            Ok(0)
        }
        Err(CrawlError::Aborted {
            report,
            source,
            teardown,
        }) => {
            // Show what made it to disk before the failure
            print_report(&report, json)?;
            if let Some(e) = teardown {
                eprintln!("⚠️  {}", e);
            }
            Err(anyhow::Error::new(source).context("crawl aborted"))
        }
        Err(e) => Err(e.into()),
    }
}

fn print_report(report: &CrawlReport, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(report)?;
        println!("{}", json_output);
    } else {
        println!();
        println!("📄 Summary:");
        println!("   Seed:             {}", report.seed);
        println!("   Dump directory:   {}", report.dump_dir);
        println!("   Links accepted:   {}", report.pages_accepted);
        println!("   Pages mirrored:   {}", report.pages_mirrored);
        println!("   Metadata records: {}", report.metadata_records);
        println!("   Bytes written:    {}", report.bytes_written);
        println!("   Duration:         {:.2}s", report.elapsed_secs);
    }
    Ok(())
}
