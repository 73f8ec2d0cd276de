mod config;
mod crawler;
mod fetcher;
mod parser;
mod render;

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;

use config::Config;
use crawler::Crawler;
use parser::story::{StorySegment, Transcript};

#[derive(Parser)]
#[command(name = "prts_story", about = "Story transcript scraper for the PRTS wiki")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl an activity's stages and write the story transcript
    Run {
        /// Activity name (e.g. 众生行记); prompted for when omitted
        activity: Option<String>,
        /// Output file (default: <ACTIVITY>.txt)
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        config: Config,
    },
    /// List the story links found for an activity without fetching them
    Links {
        activity: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        config: Config,
    },
    /// Extract story text from saved HTML pages
    Extract {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Segment title (default: file stem)
        #[arg(short, long)]
        title: Option<String>,
        /// Print segments as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { activity, out, config } => {
            let activity = match activity {
                Some(a) => a,
                None => prompt_activity()?,
            };
            let activity = activity.trim();
            if activity.is_empty() {
                println!("No activity name given, exiting.");
                return Ok(());
            }

            let crawler = Crawler::new(config)?;
            let links = crawler.story_links(activity).await?;
            if links.is_empty() {
                println!("No story links found.");
                return Ok(());
            }

            println!("Found {} candidate links, fetching...", links.len());
            let transcript = crawler.collect_transcript(activity, &links).await;
            let path = out.unwrap_or_else(|| PathBuf::from(format!("{}.txt", activity)));
            write_transcript(&path, &transcript)?;
            println!(
                "Saved {} segments to {}",
                transcript.segments.len(),
                path.display()
            );
            Ok(())
        }
        Commands::Links { activity, json, config } => {
            let crawler = Crawler::new(config)?;
            let links = crawler.story_links(&activity).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&links)?);
            } else if links.is_empty() {
                println!("No story links found.");
            } else {
                for (i, link) in links.iter().enumerate() {
                    println!("{:>3} | {:<24} | {}", i + 1, truncate(&link.title, 24), link.url);
                }
            }
            Ok(())
        }
        Commands::Extract { files, title, json } => {
            let segments = extract_files(&files, title.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&segments)?);
            } else {
                for segment in &segments {
                    print!("{}", segment.render());
                }
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

fn prompt_activity() -> Result<String> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        bail!("stdin is not a terminal; pass the activity name on the command line");
    }
    print!("Activity name (e.g. 众生行记): ");
    io::stdout().flush()?;
    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .context("Failed to read activity name")?;
    Ok(line.trim().to_string())
}

/// Run the extractor over saved pages in parallel; output keeps input order.
fn extract_files(files: &[PathBuf], title: Option<&str>) -> Result<Vec<StorySegment>> {
    let results: Vec<Result<Option<StorySegment>>> = files
        .par_iter()
        .map(|path| {
            let html = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let title = match title {
                Some(t) => t.to_string(),
                None => file_stem(path),
            };
            Ok(parser::process_page(&html, &title))
        })
        .collect();

    let mut segments = Vec::new();
    for result in results {
        if let Some(segment) = result? {
            segments.push(segment);
        }
    }
    Ok(segments)
}

fn write_transcript(path: &Path, transcript: &Transcript) -> Result<()> {
    std::fs::write(path, transcript.render())
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
