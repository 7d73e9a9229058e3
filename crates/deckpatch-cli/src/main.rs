use clap::{Parser, Subcommand};
use deckpatch_core::{
    pml, EditOptions, ElementKind, MediaStore, PptxEditor, SlideElement,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "deckpatch")]
#[command(about = "PPTX round-trip edit engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump the element model of every slide as JSON.
    Extract {
        file: PathBuf,

        /// Write JSON here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Apply an edited element-model JSON back onto the deck.
    Apply {
        file: PathBuf,

        /// Edited model, as produced by `extract`.
        #[arg(short, long)]
        edits: PathBuf,

        /// Image files referenced by edited `src` values, one flag each.
        #[arg(short, long)]
        media: Vec<PathBuf>,

        /// Directory whose files are all registered as media by base name.
        #[arg(long)]
        media_dir: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Append a placeholder table grid to one slide.
    AddTable {
        file: PathBuf,

        #[arg(short, long)]
        slide: usize,

        #[arg(long, default_value_t = 1.0)]
        x: f64,

        #[arg(long, default_value_t = 1.0)]
        y: f64,

        #[arg(long, default_value_t = 5.0)]
        width: f64,

        #[arg(long, default_value_t = 2.5)]
        height: f64,

        #[arg(short, long, default_value_t = 5)]
        rows: usize,

        #[arg(short, long, default_value_t = 5)]
        cols: usize,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Summarize slides, elements, and media in a deck.
    Info {
        file: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> deckpatch_core::Result<()> {
    match cli.command {
        Commands::Extract { file, output } => {
            let editor = PptxEditor::open(&file)?;
            let json = pml::slides_to_json(&editor.extract())?;
            match output {
                Some(path) => std::fs::write(path, json)?,
                None => println!("{}", json),
            }
            Ok(())
        }

        Commands::Apply {
            file,
            edits,
            media,
            media_dir,
            output,
        } => {
            let mut editor = PptxEditor::open(&file)?;
            let edits = pml::edits_from_json(&std::fs::read_to_string(edits)?)?;

            let mut store = MediaStore::new();
            if let Some(dir) = &media_dir {
                let names = store.load_dir(dir)?;
                log::debug!("loaded {} media file(s) from {}", names.len(), dir.display());
            }
            for path in &media {
                let name = store.load_file(path)?;
                log::debug!("loaded media '{}' from {}", name, path.display());
            }

            let report = editor.apply_edits(&edits, &store)?;
            let out = output.unwrap_or_else(|| default_output_path(&file));
            editor.save(&out)?;

            println!(
                "Patched {} element(s) across {} slide(s) -> {}",
                report.elements_patched,
                report.slides_patched,
                out.display()
            );
            for warning in &report.warnings {
                eprintln!("warning: {}", warning);
            }
            Ok(())
        }

        Commands::AddTable {
            file,
            slide,
            x,
            y,
            width,
            height,
            rows,
            cols,
            output,
        } => {
            let options = EditOptions {
                placeholder_rows: rows,
                placeholder_cols: cols,
                ..EditOptions::default()
            };
            let mut editor = PptxEditor::open(&file)?.with_options(options);

            let element = SlideElement::new(
                "table-new".to_string(),
                x,
                y,
                width,
                height,
                ElementKind::Table { rows: Vec::new() },
            );
            editor.insert_table(slide, &element)?;

            let out = output.unwrap_or_else(|| default_output_path(&file));
            editor.save(&out)?;
            println!(
                "Added {}x{} table to slide {} -> {}",
                rows,
                cols,
                slide,
                out.display()
            );
            Ok(())
        }

        Commands::Info { file } => {
            let editor = PptxEditor::open(&file)?;
            let slides = editor.extract();
            let media_count = editor
                .package()
                .part_names()
                .filter(|p| p.starts_with("ppt/media/"))
                .count();

            println!("Slides: {}", slides.len());
            for slide in &slides {
                let mut counts = std::collections::BTreeMap::new();
                for element in &slide.elements {
                    *counts.entry(element.kind.name()).or_insert(0usize) += 1;
                }
                let summary = counts
                    .iter()
                    .map(|(kind, n)| format!("{} {}", n, kind))
                    .collect::<Vec<_>>()
                    .join(", ");
                println!(
                    "  Slide {}: {} element(s){}{}",
                    slide.number,
                    slide.elements.len(),
                    if summary.is_empty() { "" } else { " - " },
                    summary
                );
            }
            println!("Media parts: {}", media_count);
            Ok(())
        }
    }
}

/// `deck.pptx` becomes `deck_edited_20260828_101500_1a2b3c4d.pptx` next to
/// the input.
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("deck");
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let tag = uuid::Uuid::new_v4().simple().to_string();
    input.with_file_name(format!("{}_edited_{}_{}.pptx", stem, stamp, &tag[..8]))
}
