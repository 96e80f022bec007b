use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use doctarion_config::Config;
use doctarion_engine::model::builders::{document, paragraph};
use doctarion_engine::{Editor, EditorEvent, Node};

mod script;

/// Replays a script of editing commands against a document and prints the
/// result.
///
/// Examples:
///   doctarion-cli doc.json script.jsonl
///   doctarion-cli --anchors doc.json script.jsonl
///   echo '{"id": "insert", "payload": {"text": "hi"}}' | doctarion-cli
#[derive(Parser, Debug)]
#[clap(name = "doctarion-cli", version, about)]
struct Args {
    /// Document in its JSON form. Relative paths are looked up in the
    /// configured document directory. Defaults to one empty paragraph.
    #[clap(long, short)]
    document: Option<PathBuf>,

    /// JSON-lines command script; reads stdin when left out
    script: Option<PathBuf>,

    /// Config file to use instead of ~/.config/doctarion/config.toml
    #[clap(long)]
    config: Option<PathBuf>,

    /// Also print every anchor
    #[clap(long)]
    anchors: bool,

    #[clap(long, value_enum, default_value_t = Format::Xmlish)]
    format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Xmlish,
    Json,
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("Error: {e:?}");
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config_path = args.config.clone().unwrap_or_else(Config::config_path);
    log::debug!("Config path: {}", config_path.display());
    let config = Config::load_from_path(&config_path)?.unwrap_or_default();

    let root = match &args.document {
        Some(path) => {
            let path = config.resolve_document_path(path);
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading document {}", path.display()))?;
            serde_json::from_str::<Node>(&content)
                .with_context(|| format!("parsing document {}", path.display()))?
        }
        None => document(vec![paragraph(vec![])]),
    };

    let mut editor = Editor::new(root, config.editor.clone()).context("loading document")?;
    editor.subscribe(Box::new(|event: &EditorEvent| log::debug!("{event:?}")));

    let source = match &args.script {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?,
        None => std::io::read_to_string(std::io::stdin()).context("reading script from stdin")?,
    };
    let steps = script::parse(&source)?;
    log::info!("Replaying {} steps", steps.len());
    script::replay(&mut editor, &steps)?;

    match args.format {
        Format::Xmlish => {
            print!("{}", doctarion_engine::debug::document_to_xmlish(editor.document())?)
        }
        Format::Json => println!("{}", serde_json::to_string_pretty(&editor.to_node()?)?),
    }
    if args.anchors {
        println!("{}", doctarion_engine::debug::dump_anchors(editor.document())?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use doctarion_engine::model::builders::span;
    use tempfile::TempDir;

    fn args(dir: &TempDir, script: &str) -> Args {
        let root = document(vec![paragraph(vec![span("hello")])]);
        let document_path = dir.path().join("doc.json");
        std::fs::write(&document_path, serde_json::to_string(&root).unwrap()).unwrap();
        let script_path = dir.path().join("script.jsonl");
        std::fs::write(&script_path, script).unwrap();
        Args {
            document: Some(document_path),
            script: Some(script_path),
            config: Some(dir.path().join("missing.toml")),
            anchors: true,
            format: Format::Xmlish,
        }
    }

    #[test]
    fn test_run_replays_a_script_file() {
        let dir = TempDir::new().unwrap();
        let args = args(&dir, "{\"id\": \"insert\", \"payload\": {\"text\": \">\"}}\n");
        run(args).unwrap();
    }

    #[test]
    fn test_run_reports_a_missing_document() {
        let dir = TempDir::new().unwrap();
        let mut args = args(&dir, "");
        args.document = Some(dir.path().join("nope.json"));
        let err = run(args).unwrap_err();
        assert!(err.to_string().contains("reading document"));
    }

    #[test]
    fn test_run_reports_a_bad_config() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(&config, "editor = 3").unwrap();
        let mut args = args(&dir, "");
        args.config = Some(config);
        assert!(run(args).is_err());
    }
}
