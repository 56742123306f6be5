use clap::{Parser, Subcommand};
use concurrent_scraper::config::{ConfigLoader, PipelineConfig};
use concurrent_scraper::output::{archive, create_output};
use concurrent_scraper::pool::BatchProgress;
use concurrent_scraper::{FetchResult, Fetcher, Outcome, Processor};
use futures::StreamExt;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;

#[derive(Parser)]
#[command(name = "concurrent-scraper")]
#[command(version = "0.1.0")]
#[command(about = "Fetch a batch of pages concurrently and extract their content", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and process a batch of URLs
    Run {
        /// Path to the configuration file (JSON/YAML/TOML); the built-in demo batch is used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Show progress bars (stderr)
        #[arg(short, long, default_value_t = false)]
        progress: bool,
    },
    /// Validate a configuration file
    Check {
        /// Path to the configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        unsafe { std::env::set_var("RUST_LOG", "info"); }
    }
    let cli = Cli::parse();
    let logger = env_logger::Builder::from_default_env().build();
    let multi = Arc::new(MultiProgress::new());

    match cli.command {
        Commands::Run { config, progress } => {
            let level = logger.filter();
            if progress {
                indicatif_log_bridge::LogWrapper::new((*multi).clone(), logger).try_init()?;
            } else {
                log::set_boxed_logger(Box::new(logger))?;
            }
            log::set_max_level(level);

            let config_data = match config {
                Some(path) => {
                    log::info!("Loading config from {:?}", path);
                    ConfigLoader::load(&path)?
                }
                None => PipelineConfig::default(),
            };
            log::info!("Loaded batch: {}", config_data.name);

            let bars = progress.then(|| multi.clone());
            run(config_data, bars).await?;
        }
        Commands::Check { config } => match ConfigLoader::load(&config) {
            Ok(cfg) => {
                println!("✅ Config is valid:");
                println!("   Name: {}", cfg.name);
                println!("   URLs: {:?}", cfg.urls);
                println!("   Fetch concurrency: {}", cfg.fetch.concurrency);
            }
            Err(e) => {
                eprintln!("❌ Config error: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

async fn run(config: PipelineConfig, multi: Option<Arc<MultiProgress>>) -> anyhow::Result<()> {
    if let Some(dir) = &config.save_dir {
        archive::prepare_dir(Path::new(dir)).await?;
    }

    let fetcher = Fetcher::new(&config.fetch)?;
    let processor = Processor::new(&config.process)?;
    let mut output = create_output(config.output.as_ref(), multi.clone()).await?;

    println!("Starting concurrent fetch of {} URLs...", config.urls.len());
    let start = Instant::now();

    let bar = multi
        .as_ref()
        .map(|m| track(m, "fetch", fetcher.watch_progress()));
    let fetched = fetcher.fetch_all(config.urls.clone()).await;
    finish(bar, *fetcher.watch_progress().borrow());

    println!("\nFetch Metrics:");
    println!("{}", fetcher.metrics_summary());
    println!("Total fetch time: {:.2?}", start.elapsed());

    let mut pages: Vec<FetchResult> = Vec::new();
    for outcome in fetched {
        match outcome {
            Outcome::Success(page) => pages.push(page),
            Outcome::Failure(info) => log::error!("{}", info),
        }
    }

    if let Some(dir) = &config.save_dir {
        let written = archive::save_pages(Path::new(dir), &pages).await?;
        log::info!("Saved {} pages to {}", written.len(), dir);
    }

    println!("\nStarting parallel content processing...");
    let process_start = Instant::now();

    let (urls, contents): (Vec<String>, Vec<String>) =
        pages.into_iter().map(|page| (page.url, page.content)).unzip();

    let bar = multi
        .as_ref()
        .map(|m| track(m, "process", processor.watch_progress()));
    let processed = processor.process_all(contents).await;
    finish(bar, *processor.watch_progress().borrow());

    println!("\nProcessing Metrics:");
    println!("{}", processor.metrics_summary());
    println!("Total processing time: {:.2?}", process_start.elapsed());

    println!("\nResults Summary:");
    println!("---------------");
    for (url, outcome) in urls.iter().zip(&processed) {
        match outcome {
            Outcome::Success(record) => output.write(url, record).await?,
            Outcome::Failure(info) => println!("{}: Error processing content: {}", url, info),
        }
    }
    output.close().await?;

    println!("\nTotal execution time: {:.2?}", start.elapsed());
    Ok(())
}

fn track(
    multi: &MultiProgress,
    label: &'static str,
    progress: watch::Receiver<BatchProgress>,
) -> (ProgressBar, JoinHandle<()>) {
    let pb = multi.add(ProgressBar::new(0));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_prefix(label);

    let pb_clone = pb.clone();
    let task = tokio::spawn(async move {
        let mut updates = WatchStream::new(progress);
        while let Some(snapshot) = updates.next().await {
            pb_clone.set_length(snapshot.total as u64);
            pb_clone.set_position(snapshot.completed as u64);
            pb_clone.set_message(format!("failed: {}", snapshot.failed));
        }
    });
    (pb, task)
}

fn finish(bar: Option<(ProgressBar, JoinHandle<()>)>, last: BatchProgress) {
    if let Some((pb, task)) = bar {
        task.abort();
        pb.set_length(last.total as u64);
        pb.set_position(last.completed as u64);
        pb.finish_with_message(format!("failed: {} - Completed", last.failed));
    }
}
