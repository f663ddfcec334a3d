//! Skim through a directory of images, organizing on the fly.
//!
//! `image-triage skim <DIR>` opens each image full-screen in the terminal and
//! waits for one key: keep, delete, move to a review bucket, go back, start
//! over, or quit.  `image-triage census <DIR>` counts what is left.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use image_triage::config::{Action, DisplaySize, Settings};
use image_triage::core::{
    census::{census, Census},
    rules::{Category, ExtensionAllowList},
};
use image_triage::ui::terminal::TerminalViewer;
use image_triage::{EngineOptions, SessionEnd, SessionReport, TriageEngine};

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), version, about = "Skim through images and organize on the fly")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Write logs to this file instead of stderr (filter with RUST_LOG).
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Triage the images in a directory, one key press per image.
    Skim(SkimArgs),
    /// Count files under a directory tree, per extension.
    Census(CensusArgs),
}

#[derive(Args, Debug)]
struct SkimArgs {
    /// Directory of images to skim through.
    source: PathBuf,

    /// Destination for good images of the wrong class (key `m`).
    /// Defaults to `<SOURCE>/mis_classified`.
    #[arg(long, value_name = "DIR")]
    reclassify_dir: Option<PathBuf>,

    /// Destination for images needing manual annotation (key `a`).
    /// Defaults to `<SOURCE>/manual_annotation`.
    #[arg(long, value_name = "DIR", conflicts_with = "no_annotate")]
    annotate_dir: Option<PathBuf>,

    /// Don't offer the annotation bucket at all.
    #[arg(long)]
    no_annotate: bool,

    /// Accepted extensions (repeat or comma-separate).  Default: .png .jpg .jpeg
    #[arg(long = "ext", value_name = "EXT", value_delimiter = ',')]
    extensions: Vec<String>,

    /// Progress notice every N files (0 disables).
    #[arg(long, value_name = "N")]
    milestone: Option<usize>,

    /// Pixel box images are fitted into, e.g. `800x800`.
    #[arg(long, value_name = "WxH")]
    size: Option<DisplaySize>,

    /// Print a census of the source before and after the session.
    #[arg(long)]
    census: bool,

    /// Save the effective extensions / milestone / size as defaults.
    #[arg(long)]
    save_config: bool,
}

#[derive(Args, Debug)]
struct CensusArgs {
    /// Root of the tree to count.
    root: PathBuf,

    /// Only tabulate these extensions (repeat or comma-separate).
    #[arg(long = "ext", value_name = "EXT", value_delimiter = ',')]
    extensions: Vec<String>,
}

// ───────────────────────────────────────── main ─────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;

    match cli.command {
        Command::Skim(args) => run_skim(args),
        Command::Census(args) => run_census(args),
    }
}

/// Logs go to stderr by default (stdout belongs to the TUI), or to a file.
fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            let filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

fn run_skim(args: SkimArgs) -> Result<()> {
    // ── settings: file defaults, then flags ───────────────────
    let mut settings = Settings::load();
    if !args.extensions.is_empty() {
        settings.allowed_extensions = ExtensionAllowList::new(&args.extensions);
    }
    if let Some(n) = args.milestone {
        settings.milestone_interval = n;
    }
    if let Some(size) = args.size {
        settings.display_size = size;
    }
    if args.save_config {
        let path = settings.save()?;
        println!("Saved settings to {}", path.display());
    }

    let source = args.source.canonicalize().unwrap_or(args.source);
    let mut options = EngineOptions::from_settings(&source, &settings);
    if let Some(dir) = args.reclassify_dir {
        options.targets = options.targets.with(Category::Reclassify, dir);
    }
    if let Some(dir) = args.annotate_dir {
        options.targets = options.targets.with(Category::Annotate, dir);
    }
    if args.no_annotate {
        options.targets = options.targets.without(Category::Annotate);
    }

    let before = if args.census {
        Some(census(&source, None)?)
    } else {
        None
    };

    // Path errors surface here, before the terminal is touched.
    let mut engine = TriageEngine::new(options)?;
    let targets = engine.targets().clone();
    let hint = engine.bindings().status_bar_hint(|action| match action {
        Action::MoveTo(category) => targets.get(category).is_some(),
        _ => true,
    });

    let report = {
        let mut viewer = TerminalViewer::enter(hint)?;
        engine.run(&mut viewer)?
        // viewer dropped here: terminal restored before we print
    };

    print_report(&report, &engine);
    if let Some(before) = before {
        let after = census(&source, None)?;
        print_census_pair(&before, &after);
    }
    Ok(())
}

fn run_census(args: CensusArgs) -> Result<()> {
    let only = if args.extensions.is_empty() {
        None
    } else {
        Some(ExtensionAllowList::new(&args.extensions))
    };
    let result = census(&args.root, only.as_ref())?;
    print!("{result}");
    Ok(())
}

// ───────────────────────────────────────── output ───────────

fn print_report(report: &SessionReport, engine: &TriageEngine) {
    let how = match report.end {
        SessionEnd::Completed => "all files processed",
        SessionEnd::Quit => "quit",
        SessionEnd::Declined => "stopped at a file you chose to keep",
    };
    let elapsed = report.finished_at - report.started_at;

    println!(
        "Session over in {} ({how}) after {}s",
        engine.source().display(),
        elapsed.num_seconds()
    );
    println!("  started   {}", report.started_at.format("%Y-%m-%d %H:%M:%S"));
    println!("  kept      {}", report.kept);
    for (category, dir) in engine.targets().iter() {
        let n = report.moved.get(&category).copied().unwrap_or(0);
        println!("  {:<9} {n}  -> {}", category.label(), dir.display());
    }
    println!("  deleted   {}", report.deleted);
    println!("  rejected  {}", report.rejected);
    println!("  remaining {}", report.remaining);
}

fn print_census_pair(before: &Census, after: &Census) {
    println!();
    println!("Before:");
    print!("{before}");
    println!("After:");
    print!("{after}");
    let gone = before.total_files.saturating_sub(after.total_files);
    println!("{gone} file(s) left the tree");
}
