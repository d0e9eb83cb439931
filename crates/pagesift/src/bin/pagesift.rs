// ABOUTME: CLI binary for pagesift: extracts readable content from URLs or local HTML files.
// ABOUTME: Processes URLs concurrently, each under a deadline, and prints numbered entries or JSON.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use clap::Parser;
use futures::future::join_all;
use pagesift::{ExtractionResult, Pipeline};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pagesift")]
#[command(about = "Extract paragraphs, headings and links from web pages")]
struct Args {
    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long = "json")]
    json_output: bool,

    /// HTML file to extract from (requires --url)
    #[arg(long = "html")]
    html: Option<PathBuf>,

    /// Base URL for resolving links in --html mode
    #[arg(long = "url")]
    url: Option<String>,

    /// Print elapsed time in ms to stderr
    #[arg(long = "timing")]
    timing: bool,

    /// Never fall back to the headless browser
    #[arg(long = "no-render")]
    no_render: bool,

    /// Fetch attempts per URL
    #[arg(long = "max-retries", default_value_t = 3)]
    max_retries: u32,

    /// Delay before each attempt, in milliseconds
    #[arg(long = "base-delay-ms", default_value_t = 2000)]
    base_delay_ms: u64,

    /// Seconds allowed per URL before giving up
    #[arg(long = "deadline", default_value_t = 120)]
    deadline: u64,

    /// Log filter used when RUST_LOG is unset
    #[arg(long = "log-level", default_value = "warn")]
    log_level: String,

    /// URLs to extract (fetch mode)
    #[arg()]
    urls: Vec<String>,
}

#[derive(Serialize)]
struct Report<'a> {
    url: &'a str,
    #[serde(flatten)]
    result: &'a ExtractionResult,
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn validate(args: &Args) -> anyhow::Result<()> {
    if args.html.is_some() && args.url.is_none() {
        bail!("--url is required when using --html");
    }
    if args.html.is_none() && args.urls.is_empty() {
        bail!("at least one URL is required, or use --html with --url");
    }
    if args.html.is_some() && !args.urls.is_empty() {
        bail!("cannot use both --html and positional URLs");
    }
    Ok(())
}

fn format_text(reports: &[(String, ExtractionResult)]) -> String {
    reports
        .iter()
        .map(|(url, result)| match result.failure_reason() {
            Some(reason) => format!("Results for {}:\nFailed to extract content: {}", url, reason),
            None => format!(
                "Results for {}:\nMethod: {}\n{}",
                url,
                result.method(),
                result.format_numbered()
            ),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_json(reports: &[(String, ExtractionResult)]) -> anyhow::Result<String> {
    let reports: Vec<Report<'_>> = reports
        .iter()
        .map(|(url, result)| Report { url, result })
        .collect();
    let out = if reports.len() == 1 {
        serde_json::to_string_pretty(&reports[0])?
    } else {
        serde_json::to_string_pretty(&reports)?
    };
    Ok(out)
}

async fn run(args: &Args) -> anyhow::Result<Vec<(String, ExtractionResult)>> {
    let pipeline = Pipeline::builder()
        .max_retries(args.max_retries)
        .base_delay(Duration::from_millis(args.base_delay_ms))
        .render_fallback(!args.no_render)
        .build();

    if let (Some(html_path), Some(url)) = (&args.html, &args.url) {
        let html = fs::read_to_string(html_path)
            .with_context(|| format!("error reading file {:?}", html_path))?;
        return Ok(vec![(url.clone(), pipeline.process_html(&html, url))]);
    }

    let deadline = Duration::from_secs(args.deadline);
    let results = join_all(
        args.urls
            .iter()
            .map(|url| pipeline.process_with_deadline(url, deadline)),
    )
    .await;
    Ok(args.urls.iter().cloned().zip(results).collect())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args.log_level);

    if let Err(e) = validate(&args) {
        eprintln!("error: {}", e);
        return ExitCode::from(1);
    }

    let start = Instant::now();
    let reports = match run(&args).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::from(1);
        }
    };
    let elapsed = start.elapsed();

    let mut had_error = reports.iter().any(|(_, r)| !r.is_success());

    let output = if args.json_output {
        format_json(&reports)
    } else {
        Ok(format_text(&reports))
    };
    match output {
        Ok(text) => {
            if let Some(path) = &args.output {
                if let Err(e) = fs::write(path, &text) {
                    eprintln!("error writing to {:?}: {}", path, e);
                    had_error = true;
                }
            } else {
                println!("{}", text);
            }
        }
        Err(e) => {
            eprintln!("error serializing results: {}", e);
            had_error = true;
        }
    }

    if args.timing {
        let _ = writeln!(io::stderr(), "elapsed: {}ms", elapsed.as_millis());
    }

    if had_error {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
