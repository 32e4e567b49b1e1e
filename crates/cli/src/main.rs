use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use guidebook_content::{
    derive_toc, filter_toc, normalise, render_export, render_view, Document, ExportOptions,
    TocStats,
};
use guidebook_core::{
    data_dir_from_env_value, export_highlight_from_env_value, CoreConfig, GuideFilter, Store,
    DEFAULT_MAX_UPLOAD_BYTES,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "guidebook")]
#[command(about = "Guidebook guide store CLI")]
struct Cli {
    /// Data directory (defaults to GUIDEBOOK_DATA_DIR, then ./guide_data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List guides, newest first
    List {
        /// Case-insensitive title search
        #[arg(long)]
        search: Option<String>,
        /// Only guides carrying this tag id
        #[arg(long)]
        tag: Option<String>,
    },
    /// List tags
    Tags,
    /// Print the normalised form of an editor document file
    Normalise {
        /// Path to a document JSON file
        file: PathBuf,
    },
    /// Print the table of contents of an editor document file
    Toc {
        /// Path to a document JSON file
        file: PathBuf,
        /// Only sections whose text contains this (case-insensitive)
        #[arg(long)]
        filter: Option<String>,
    },
    /// Render the page view HTML of an editor document file
    Render {
        /// Path to a document JSON file
        file: PathBuf,
    },
    /// Export a stored guide as a standalone HTML file
    Export {
        /// Guide id
        guide_id: String,
        /// Output path (defaults to <slug>.html in the current directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("guidebook=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| data_dir_from_env_value(std::env::var("GUIDEBOOK_DATA_DIR").ok()));

    match cli.command {
        Some(Commands::List { search, tag }) => {
            let store = open_store(data_dir)?;
            let guides = store.guides().list(&GuideFilter { search, tag });
            if guides.is_empty() {
                println!("No guides found.");
            } else {
                for guide in guides {
                    let tags: Vec<&str> = guide.tags.iter().map(|t| t.name.as_str()).collect();
                    println!(
                        "ID: {}, Title: {}, Slug: {}, Tags: [{}], Created: {}",
                        guide.id,
                        guide.title,
                        guide.slug,
                        tags.join(", "),
                        guide.created_at
                    );
                }
            }
        }
        Some(Commands::Tags) => {
            let store = open_store(data_dir)?;
            let tags = store.tags().list();
            if tags.is_empty() {
                println!("No tags found.");
            } else {
                for tag in tags {
                    println!(
                        "ID: {}, Name: {}, Slug: {}, Colour: {}",
                        tag.id, tag.name, tag.slug, tag.color
                    );
                }
            }
        }
        Some(Commands::Normalise { file }) => {
            let document = read_document(&file)?;
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        Some(Commands::Toc { file, filter }) => {
            let document = read_document(&file)?;
            print!("{}", toc_text(&document, filter.as_deref().unwrap_or("")));
        }
        Some(Commands::Render { file }) => {
            let document = read_document(&file)?;
            println!("{}", render_view(&document.blocks).to_html());
        }
        Some(Commands::Export { guide_id, out }) => {
            let highlight =
                export_highlight_from_env_value(std::env::var("GUIDEBOOK_EXPORT_HIGHLIGHT").ok())?;
            let store = open_store(data_dir)?;
            let path = export_to_file(&store, &guide_id, out, highlight)?;
            println!("Exported guide {} to {}", guide_id, path.display());
        }
        None => {
            println!("Use 'guidebook --help' for commands");
        }
    }

    Ok(())
}

fn open_store(data_dir: PathBuf) -> anyhow::Result<Store> {
    let cfg = CoreConfig::new(data_dir, DEFAULT_MAX_UPLOAD_BYTES, true)?;
    Ok(Store::new(Arc::new(cfg)))
}

/// Reads a document file. Anything that parses as JSON is accepted and normalised.
fn read_document(path: &Path) -> anyhow::Result<Document> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw: serde_json::Value = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    Ok(normalise(&raw))
}

/// One line per matching header, indented two spaces per level below 1, then the section counts.
fn toc_text(document: &Document, filter: &str) -> String {
    let entries = derive_toc(&document.blocks);
    let mut out = String::new();
    for entry in filter_toc(&entries, filter) {
        let indent = "  ".repeat(usize::from(entry.level.saturating_sub(1)));
        out.push_str(&format!("{indent}{} (#{})\n", entry.text, entry.anchor_id));
    }
    let stats = TocStats::of(&document.blocks);
    out.push_str(&format!(
        "Total sections: {}, total blocks: {}\n",
        stats.sections, stats.blocks
    ));
    out
}

fn export_to_file(
    store: &Store,
    guide_id: &str,
    out: Option<PathBuf>,
    highlight: bool,
) -> anyhow::Result<PathBuf> {
    let guide = store.guides().get(guide_id)?;
    let options = ExportOptions {
        exported_at: Utc::now(),
        highlight,
    };
    let html = render_export(&guide.export_guide(), &options);
    let path = out.unwrap_or_else(|| PathBuf::from(guide.export_filename()));
    std::fs::write(&path, html).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use guidebook_core::NewGuide;
    use guidebook_types::NonEmptyText;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_data_dir_flag_is_global() {
        let cli = Cli::try_parse_from(["guidebook", "list", "--data-dir", "/tmp/guides"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/guides")));
    }

    #[test]
    fn test_read_document_normalises() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("doc.json");
        std::fs::write(
            &path,
            json!({"blocks": [
                {"type": "header", "data": {"text": "Setup", "level": 1}},
                {"type": "paragraph", "data": {"text": ""}},
                {"type": "header", "data": {"text": "Gear <b>swaps</b>", "level": 3}}
            ]})
            .to_string(),
        )
        .unwrap();

        let document = read_document(&path).unwrap();

        assert_eq!(document.blocks.len(), 2);
        assert_eq!(
            toc_text(&document, ""),
            "Setup (#section-0)\n    Gear swaps (#section-1)\nTotal sections: 2, total blocks: 2\n"
        );
        assert_eq!(
            toc_text(&document, "GEAR"),
            "    Gear swaps (#section-1)\nTotal sections: 2, total blocks: 2\n"
        );
    }

    #[test]
    fn test_read_document_rejects_invalid_json() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("bad.json");
        std::fs::write(&path, "{").unwrap();

        assert!(read_document(&path).is_err());
    }

    #[test]
    fn test_export_to_file_writes_html() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = open_store(temp_dir.path().join("data")).unwrap();
        let guide = store
            .guides()
            .create(
                NewGuide {
                    title: NonEmptyText::new("Barrows").unwrap(),
                    slug: None,
                    description: None,
                    content: Some(json!({"blocks": [
                        {"type": "header", "data": {"text": "Brothers", "level": 2}}
                    ]})),
                },
                vec![],
            )
            .unwrap();
        let out = temp_dir.path().join("barrows.html");

        let path = export_to_file(&store, &guide.id, Some(out.clone()), false).unwrap();

        assert_eq!(path, out);
        let html = std::fs::read_to_string(out).unwrap();
        assert!(html.contains("<h2 id=\"section-0\">"));
        assert!(export_to_file(&store, "missing", None, false).is_err());
    }
}
