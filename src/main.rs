//! Essaymark CLI
//!
//! Usage:
//!   essaymark --essay essay.txt --highlights highlights.json     # Annotated essay
//!   essaymark --text "The cat sat." --highlights h.json --html   # HTML markup
//!   essaymark --essay essay.txt --highlights h.json --animate    # Scan + staged reveal
//!   essaymark --serve                                            # HTTP API server
//!   essaymark --essay essay.txt --highlights h.json --json       # JSON output

use clap::Parser;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tracing::info;

use essaymark::core::{markup, run_server, RevealController, ScanConfig, ScanDriver, SpanResolver};
use essaymark::types::{AnnotationOutput, HighlightSpan};
use essaymark::{EssaymarkError, DEFAULT_BLOCK_EXTENT, FRAME_INTERVAL_MS, REVEAL_STAGE, SCAN_STEP_UNITS, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "essaymark",
    version = VERSION,
    about = "Essaymark - overlay feedback highlights on an essay",
    long_about = "Essaymark resolves feedback highlights (literal text + category)\n\
                  against an essay and paints them for a terminal or browser.\n\n\
                  Highlights are matched by their first occurrence in the essay.\n\
                  Highlights that aren't found, or that overlap an earlier one,\n\
                  are left out.\n\n\
                  Categories:\n  \
                  strong       - green\n  \
                  improvement  - yellow\n  \
                  weak         - red"
)]
struct Args {
    /// Essay text (inline)
    #[arg(short, long, conflicts_with = "essay")]
    text: Option<String>,

    /// Essay file
    #[arg(short, long)]
    essay: Option<String>,

    /// Highlights JSON file: [{"text", "type", "feedback"}]
    #[arg(short = 'H', long)]
    highlights: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Output HTML markup
    #[arg(long)]
    html: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// List highlights that were left out
    #[arg(long)]
    verbose: bool,

    /// Play the scan and staged reveal before showing results
    #[arg(short, long)]
    animate: bool,

    /// Block extent scanned by the animation
    #[arg(long, default_value_t = DEFAULT_BLOCK_EXTENT)]
    extent: f64,

    /// Scan distance per frame
    #[arg(long, default_value_t = SCAN_STEP_UNITS)]
    step: f64,

    /// Milliseconds between scan frames
    #[arg(long, default_value_t = FRAME_INTERVAL_MS)]
    frame_ms: u64,

    /// Milliseconds between analysis stages in --animate
    #[arg(long, default_value_t = 400)]
    stage_ms: u64,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,
}

impl Args {
    fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            step: self.step,
            frame_interval: Duration::from_millis(self.frame_ms),
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let args = Args::parse();

    let result = if args.serve {
        run_serve(&args).await
    } else {
        run_annotate(&args).await
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so --json output stays clean
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("essaymark=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Read essay and highlights from the arguments
fn load_input(args: &Args) -> Result<(String, Vec<HighlightSpan>), EssaymarkError> {
    let essay = match (&args.text, &args.essay) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => {
            std::fs::read_to_string(path).map_err(|e| EssaymarkError::io(path, e))?
        }
        (None, None) => {
            return Err(EssaymarkError::InvalidInput(
                "provide --text or --essay".to_string(),
            ))
        }
    };

    let highlights = match &args.highlights {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|e| EssaymarkError::io(path, e))?;
            serde_json::from_str(&raw)?
        }
        None => Vec::new(),
    };

    Ok((essay, highlights))
}

/// Annotate and print, optionally after the reveal animation
async fn run_annotate(args: &Args) -> Result<(), EssaymarkError> {
    let (essay, highlights) = load_input(args)?;
    info!(chars = essay.len(), highlights = highlights.len(), "input loaded");

    if args.animate {
        run_animation(args, &essay, &highlights).await;
    }

    let plan = SpanResolver::new().resolve(&essay, &highlights);
    let units = markup::to_presentation(&plan);

    if args.json {
        let output = AnnotationOutput::new(plan, units);
        let json = serde_json::to_string_pretty(&output)
            .map_err(|e| EssaymarkError::Serialization(e.to_string()))?;
        println!("{}", json);
        return Ok(());
    }

    if args.html {
        println!("{}", markup::render_html(&units));
    } else {
        println!("{}", markup::render_terminal(&units, !args.no_color));
    }

    if args.verbose {
        let output = AnnotationOutput::new(plan, units);
        println!();
        println!("{}", output.to_parseable_string());
        for dropped in &output.dropped {
            println!("  #{} {:?} - {}", dropped.index, dropped.text, dropped.reason);
        }
    }
    Ok(())
}

/// Drive the reveal controller the way an essay view would
async fn run_animation(args: &Args, essay: &str, highlights: &[HighlightSpan]) {
    let config = args.scan_config();
    let controller = Arc::new(Mutex::new(RevealController::new(config)));
    let timer = controller.lock().await.begin(args.extent);

    let (tx, mut rx) = broadcast::channel(256);
    let driver = ScanDriver::spawn(controller.clone(), timer, config.frame_interval, tx);

    let mut stderr = io::stderr();
    loop {
        let frame = match rx.recv().await {
            Ok(frame) => frame,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        };
        let filled = (frame.progress() * 30.0).round() as usize;
        let _ = write!(
            stderr,
            "\rScanning [{}{}] {:>3.0}%",
            "#".repeat(filled),
            ".".repeat(30 - filled),
            frame.progress() * 100.0
        );
        let _ = stderr.flush();
        if frame.done {
            break;
        }
    }
    let _ = writeln!(stderr);
    driver.join().await;

    for stage in 1..=REVEAL_STAGE {
        tokio::time::sleep(Duration::from_millis(args.stage_ms)).await;
        let mut controller = controller.lock().await;
        controller.advance_stage(stage);
        let _ = writeln!(stderr, "Stage {} - {}", stage, controller.phase());
    }

    let mut controller = controller.lock().await;
    let reason = controller.finish();
    let view = controller.view(essay, highlights);
    let shown = view.units.iter().filter(|u| u.tone().is_some()).count();
    let _ = writeln!(stderr, "{} ({} highlights)", reason, shown);
}

/// Run HTTP API server
async fn run_serve(args: &Args) -> Result<(), EssaymarkError> {
    println!();
    println!("Essaymark API Server v{}", VERSION);
    println!();

    run_server(&args.addr, args.scan_config())
        .await
        .map_err(|e| EssaymarkError::Server(e.to_string()))
}
