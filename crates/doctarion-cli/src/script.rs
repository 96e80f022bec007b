//! JSON-lines command scripts.
//!
//! One command per line in its JSON form, e.g.
//! `{"id": "insert", "payload": {"text": "hello"}}`. Blank lines and lines
//! starting with `#` are skipped. `{"id": "undo"}` and `{"id": "redo"}` step
//! through the editor's history.

use anyhow::{Context, Result, bail};
use doctarion_engine::{Command, Editor};

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Run(Command),
    Undo,
    Redo,
}

/// A step plus the script line it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub number: usize,
    pub step: Step,
}

pub fn parse(source: &str) -> Result<Vec<Line>> {
    let mut lines = Vec::new();
    for (i, text) in source.lines().enumerate() {
        let number = i + 1;
        let text = text.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let command: Command = serde_json::from_str(text)
            .with_context(|| format!("line {number}: not a command"))?;
        let step = match command.id.as_str() {
            "undo" => Step::Undo,
            "redo" => Step::Redo,
            _ => Step::Run(command),
        };
        lines.push(Line { number, step });
    }
    Ok(lines)
}

pub fn replay(editor: &mut Editor, lines: &[Line]) -> Result<()> {
    for line in lines {
        match &line.step {
            Step::Run(command) => editor
                .update(command)
                .with_context(|| format!("line {}: {} failed", line.number, command.id))?,
            Step::Undo => {
                if !editor.undo() {
                    bail!("line {}: nothing to undo", line.number);
                }
            }
            Step::Redo => {
                if !editor.redo() {
                    bail!("line {}: nothing to redo", line.number);
                }
            }
        }
    }
    Ok(())
}
