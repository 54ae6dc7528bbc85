//! rmnb - Inspect and unpack reMarkable notebook exports
//!
//! This tool decodes notebook archives (the `.lines` stroke data and its sidecar
//! members) and reports what they contain, optionally extracting embedded documents
//! and page thumbnails.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, ValueEnum};
use rmnb_core::{DecoderConfig, Notebook, NotebookDecoder};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// File extensions treated as notebook exports in directory mode
const ARCHIVE_EXTENSIONS: [&str; 2] = ["zip", "rmdoc"];

/// Inspect and unpack reMarkable notebook exports
#[derive(Parser, Debug)]
#[command(name = "rmnb")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value = "summary")]
    format: OutputFormat,

    /// Directory to extract embedded PDF/EPUB documents and thumbnails into
    #[arg(short = 'x', long)]
    extract: Option<PathBuf>,

    /// Overwrite existing files when extracting
    #[arg(long)]
    force: bool,

    /// Keep default metadata when the .content member is malformed
    #[arg(long)]
    lenient_metadata: bool,

    /// Do not load page thumbnails
    #[arg(long)]
    no_thumbnails: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Path to a single notebook archive
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a directory of notebook archives to process
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

/// Output format for decoded notebooks
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable overview of pages and strokes
    Summary,
    /// Full stroke tree as JSON (embedded blobs omitted)
    Json,
    /// Just the notebook identifier (for scripting)
    Id,
}

/// JSON document emitted per notebook
#[derive(Serialize)]
struct JsonReport<'a> {
    source: String,
    digest: String,
    has_pdf: bool,
    has_epub: bool,
    thumbnails: usize,
    #[serde(flatten)]
    notebook: &'a Notebook,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    let decoder = NotebookDecoder::with_config(
        DecoderConfig::new()
            .lenient_metadata(cli.lenient_metadata)
            .load_thumbnails(!cli.no_thumbnails),
    );

    // Dispatch based on input mode
    if let Some(ref file) = cli.input.file {
        process_single_file(&cli, &decoder, file)
    } else if let Some(ref directory) = cli.input.directory {
        process_directory(&cli, &decoder, directory)
    } else {
        bail!("Either --file or --directory must be specified")
    }
}

/// Process a single notebook archive
fn process_single_file(cli: &Cli, decoder: &NotebookDecoder, file: &Path) -> Result<()> {
    if !file.exists() {
        bail!("Input file does not exist: {}", file.display());
    }
    if !file.is_file() {
        bail!("Input path is not a file: {}", file.display());
    }

    process_archive(cli, decoder, file)
}

/// Process a directory of notebook archives recursively
fn process_directory(cli: &Cli, decoder: &NotebookDecoder, directory: &Path) -> Result<()> {
    if !directory.exists() {
        bail!("Directory does not exist: {}", directory.display());
    }
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());

    let mut processed = 0;
    let mut failed = 0;

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        if !is_notebook_archive(path) {
            trace!("Skipping non-archive: {}", path.display());
            continue;
        }

        debug!("Processing archive: {}", path.display());
        if let Err(e) = process_archive(cli, decoder, path) {
            // Log error but continue with other files
            warn!("Error processing {}: {:#}", path.display(), e);
            failed += 1;
        }
        processed += 1;
    }

    info!("Processed {} archive(s), {} failed", processed, failed);
    Ok(())
}

/// Returns true if the path looks like a notebook export
fn is_notebook_archive(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false);

    !hidden
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| ARCHIVE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false)
}

/// Compute a short hash of the archive (first 8 chars of blake3)
fn archive_digest(data: &[u8]) -> String {
    let hash = blake3::hash(data);
    hash.to_hex()[..8].to_string()
}

/// Decode one archive and report or extract its contents
fn process_archive(cli: &Cli, decoder: &NotebookDecoder, path: &Path) -> Result<()> {
    trace!("Reading {}", path.display());
    let data =
        fs::read(path).with_context(|| format!("Failed to read archive: {}", path.display()))?;

    let notebook = decoder
        .decode_bytes(&data)
        .with_context(|| format!("Failed to decode notebook: {}", path.display()))?;
    let digest = archive_digest(&data);

    match cli.format {
        OutputFormat::Id => println!("{}", notebook.id),
        OutputFormat::Summary => print!("{}", render_summary(path, &digest, &notebook)),
        OutputFormat::Json => {
            let report = JsonReport {
                source: path.display().to_string(),
                digest,
                has_pdf: notebook.pdf.is_some(),
                has_epub: notebook.epub.is_some(),
                thumbnails: notebook.thumbnail_count(),
                notebook: &notebook,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    if let Some(ref output_dir) = cli.extract {
        let written = extract_notebook(&notebook, output_dir, cli.force)?;
        info!("Extracted {} file(s) from {}", written, path.display());
    }

    Ok(())
}

/// Human-readable overview of a decoded notebook
fn render_summary(path: &Path, digest: &str, notebook: &Notebook) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} ({}) [{}]\n",
        notebook.id,
        path.display(),
        digest
    ));

    let content = &notebook.content;
    if !content.file_type.is_empty() {
        out.push_str(&format!("  type: {}\n", content.file_type));
    }
    out.push_str(&format!(
        "  pages: {}, strokes: {}, points: {}, thumbnails: {}\n",
        notebook.pages.len(),
        notebook.line_count(),
        notebook.point_count(),
        notebook.thumbnail_count()
    ));

    for (index, page) in notebook.pages.iter().enumerate() {
        let template = if page.template.is_empty() {
            "-"
        } else {
            page.template.as_str()
        };
        out.push_str(&format!(
            "  [{}] template {}, {} layer(s), {} stroke(s), {} point(s)\n",
            index,
            template,
            page.layers.len(),
            page.line_count(),
            page.point_count()
        ));
    }

    if let Some(ref pdf) = notebook.pdf {
        out.push_str(&format!("  pdf: {} bytes\n", pdf.len()));
    }
    if let Some(ref epub) = notebook.epub {
        out.push_str(&format!("  epub: {} bytes\n", epub.len()));
    }
    out
}

/// Write embedded documents and thumbnails below `output_dir`
///
/// Returns the number of files written.
fn extract_notebook(notebook: &Notebook, output_dir: &Path, force: bool) -> Result<usize> {
    // The identifier comes from an archive member name, keep it to one path component
    let id = sanitize_component(&notebook.id);
    let mut written = 0;

    if let Some(ref pdf) = notebook.pdf {
        write_output_file(&output_dir.join(format!("{}.pdf", id)), pdf, force)?;
        written += 1;
    }
    if let Some(ref epub) = notebook.epub {
        write_output_file(&output_dir.join(format!("{}.epub", id)), epub, force)?;
        written += 1;
    }

    let thumbnail_dir = output_dir.join(&id).join("thumbnails");
    for (index, page) in notebook.pages.iter().enumerate() {
        if let Some(ref thumbnail) = page.thumbnail {
            write_output_file(
                &thumbnail_dir.join(format!("{}.jpg", index)),
                thumbnail,
                force,
            )?;
            written += 1;
        }
    }

    Ok(written)
}

/// Replace anything that could escape the output directory
fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "notebook".to_string(),
        _ => cleaned,
    }
}

/// Write an extracted file, refusing to clobber unless forced
fn write_output_file(output_path: &Path, content: &[u8], force: bool) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    if output_path.exists() && !force {
        bail!(
            "File already exists: {} (use --force to overwrite)",
            output_path.display()
        );
    }

    let mut file = fs::File::create(output_path)
        .with_context(|| format!("Failed to create file: {}", output_path.display()))?;

    file.write_all(content)
        .with_context(|| format!("Failed to write file: {}", output_path.display()))?;

    println!("Wrote {}", output_path.display());
    Ok(())
}
