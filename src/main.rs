use clap::Parser;
use marginalia::{ComposeError, ComposerBuilder, RenderMode, load_explanations};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Lays explanations out in columns beside the pages of a PDF.
#[derive(Parser, Debug)]
#[command(name = "marginalia", version, about)]
struct Args {
    /// Source PDF.
    #[arg(short, long)]
    input: PathBuf,

    /// JSON object mapping zero-based page indices to explanation text.
    #[arg(short, long)]
    explanations: PathBuf,

    /// Where to write the composed PDF.
    #[arg(short, long)]
    output: PathBuf,

    /// Body font size in points (8 to 20).
    #[arg(long)]
    font_size: Option<f32>,

    /// Line spacing multiplier (above 0, at most 3).
    #[arg(long)]
    line_spacing: Option<f32>,

    /// text, markdown or empty_right.
    #[arg(long)]
    render_mode: Option<RenderMode>,

    /// Minimum padding inside each column, in points (0 to 50).
    #[arg(long)]
    column_padding: Option<f32>,

    /// Built-in font name (helv, hebo, cour), a font file, or a font name
    /// looked up in --font-dir.
    #[arg(long)]
    font: Option<String>,

    /// Directory searched for fonts given by name.
    #[arg(long)]
    font_dir: Option<PathBuf>,

    /// JSON file with layout tuning constants. Missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a JSON report of the run to this file.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Log layout decisions.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), ComposeError> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let explanations = load_explanations(&args.explanations)?;

    let mut builder = ComposerBuilder::new();
    if let Some(path) = &args.config {
        builder = builder.with_tuning_file(path)?;
    }
    if let Some(size) = args.font_size {
        builder = builder.with_font_size(size);
    }
    if let Some(spacing) = args.line_spacing {
        builder = builder.with_line_spacing(spacing);
    }
    if let Some(mode) = args.render_mode {
        builder = builder.with_render_mode(mode);
    }
    if let Some(padding) = args.column_padding {
        builder = builder.with_column_padding(padding);
    }
    if let Some(dir) = &args.font_dir {
        builder = builder.with_font_dir(dir);
    }
    if let Some(font) = args.font {
        builder = builder.with_font(font);
    }
    let composer = builder.build()?;

    log::info!("Composing {} into {}", args.input.display(), args.output.display());
    let report = composer.compose_file(&args.input, &explanations, &args.output)?;

    if report.has_absorbed_issues() {
        log::warn!(
            "Finished with absorbed issues: {} truncated chars, {} fallbacks, {} duplicate guard trips",
            report.truncated_chars(),
            report.fallbacks(),
            report.duplicate_guard_trips()
        );
    }
    if let Some(path) = &args.report {
        serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), &report)?;
    }

    log::info!("Wrote {} pages to {}", report.output_pages, args.output.display());
    Ok(())
}
