//! `lc-export` — render a canvas snapshot to PNG or JPEG.
//!
//! Loads an optional JSON snapshot, optionally inserts a text layer (the
//! same path a clipboard automation hook takes), and writes the exported
//! raster without any selection decoration.
//!
//! ```text
//! lc-export --snapshot scene.json --font "Inter=fonts/Inter-Bold.ttf:bold" --out scene.png
//! lc-export --text "Hello" --format jpeg --quality 80 --out hello.jpg
//! ```

use clap::{Parser, ValueEnum};
use lc_core::{FontWeight, SnapshotError};
use lc_editor::{ConfigError, Editor, EditorConfig};
use lc_render::export::DEFAULT_JPEG_QUALITY;
use lc_render::{ExportFormat, FontError, Renderer};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "lc-export", version, about = "Export a layer canvas to PNG or JPEG")]
struct Cli {
    /// Canvas snapshot (JSON). Starts from an empty canvas when omitted.
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,
    /// Output file.
    #[arg(long, value_name = "FILE")]
    out: PathBuf,
    /// Insert a text layer with this content before exporting.
    #[arg(long)]
    text: Option<String>,
    /// Register a font face: FAMILY=PATH, optionally suffixed `:bold`.
    #[arg(long = "font", value_name = "FAMILY=PATH[:bold]", value_parser = parse_font_spec)]
    fonts: Vec<FontSpec>,
    #[arg(long, value_enum, default_value_t = Format::Png)]
    format: Format,
    /// JPEG quality, 1-100.
    #[arg(
        long,
        default_value_t = DEFAULT_JPEG_QUALITY,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    quality: u8,
    /// Editor config (JSON).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Png,
    Jpeg,
}

#[derive(Debug, Clone, PartialEq)]
struct FontSpec {
    family: String,
    weight: FontWeight,
    path: PathBuf,
}

fn parse_font_spec(arg: &str) -> Result<FontSpec, String> {
    let (family, rest) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected FAMILY=PATH, got `{arg}`"))?;
    if family.trim().is_empty() {
        return Err("font family is empty".into());
    }
    let (path, weight) = match rest.rsplit_once(':') {
        Some((path, "bold")) => (path, FontWeight::Bold),
        Some((path, "normal")) => (path, FontWeight::Normal),
        _ => (rest, FontWeight::Normal),
    };
    if path.is_empty() {
        return Err(format!("font path is empty in `{arg}`"));
    }
    Ok(FontSpec {
        family: family.trim().to_string(),
        weight,
        path: PathBuf::from(path),
    })
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Font(#[from] FontError),
    #[error("export failed")]
    Export,
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };

    let mut renderer = Renderer::new(config.raster_cache_capacity);
    for font in &cli.fonts {
        renderer
            .fonts
            .load_file(font.family.as_str(), font.weight, &font.path)?;
    }

    let mut editor = Editor::new(config);
    if let Some(path) = &cli.snapshot {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CliError::Io {
                path: path.display().to_string(),
                source,
            })?;
        editor.load_snapshot(&json)?;
    }
    if let Some(text) = &cli.text {
        editor.insert_text_layer_for_export(text);
    }

    let format = match cli.format {
        Format::Png => ExportFormat::Png,
        Format::Jpeg => ExportFormat::Jpeg {
            quality: cli.quality,
        },
    };
    let bytes = editor
        .export(&renderer, format)
        .await
        .ok_or(CliError::Export)?;

    tokio::fs::write(&cli.out, &bytes)
        .await
        .map_err(|source| CliError::Io {
            path: cli.out.display().to_string(),
            source,
        })?;
    log::info!(
        "wrote {} ({} bytes, {}x{})",
        cli.out.display(),
        bytes.len(),
        editor.state().width,
        editor.state().height
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("lc-export error: {e}");
        std::process::exit(1);
    }
}
