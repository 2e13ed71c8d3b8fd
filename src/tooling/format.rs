//! Render the visible rows as text or JSON.

use super::fs::FsNode;
use crate::view::FlatView;
use owo_colors::OwoColorize;
use serde::Serialize;

/// One visible row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowOutput {
    pub index: usize,
    pub path: String,
    pub name: String,
    pub depth: u32,
    pub is_dir: bool,
    pub is_open: bool,
}

pub fn rows(view: FlatView<'_, FsNode>) -> Vec<RowOutput> {
    view.iter()
        .enumerate()
        .map(|(index, record)| RowOutput {
            index,
            path: record.data().path.clone(),
            name: record.data().name.clone(),
            depth: record.depth(),
            is_dir: record.data().is_dir,
            is_open: record.is_open(),
        })
        .collect()
}

/// Indented listing; directories carry an open/closed marker.
pub fn format_rows_text(rows: &[RowOutput], color: bool) -> String {
    let mut out = String::new();
    for row in rows {
        let indent = "  ".repeat(row.depth as usize);
        let line = if row.is_dir {
            let marker = if row.is_open { "▾" } else { "▸" };
            let name = format!("{}/", row.name);
            if color {
                format!("{}{} {}", indent, marker.dimmed(), name.blue().bold())
            } else {
                format!("{}{} {}", indent, marker, name)
            }
        } else {
            format!("{}  {}", indent, row.name)
        };
        out.push_str(&line);
        out.push('\n');
    }
    if color {
        out.push_str(&format!("{}", format!("{} visible", rows.len()).dimmed()));
    } else {
        out.push_str(&format!("{} visible", rows.len()));
    }
    out
}

pub fn format_rows_json(rows: &[RowOutput]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(rows)
}
