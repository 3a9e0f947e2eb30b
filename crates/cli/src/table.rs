// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A minimal column table for `orbitmesh <entity> list` output: header row,
//! left-aligned cells, optional per-column width caps.

use crate::color;
use std::io::Write;

enum Style {
    Plain,
    Muted,
}

pub struct Column {
    name: String,
    max_width: Option<usize>,
    style: Style,
}

impl Column {
    pub fn left(name: impl Into<String>) -> Self {
        Self { name: name.into(), max_width: None, style: Style::Plain }
    }

    /// A column whose cells render dim (id columns, mostly).
    pub fn muted(name: impl Into<String>) -> Self {
        Self { name: name.into(), max_width: None, style: Style::Muted }
    }

    pub fn with_max(mut self, max: usize) -> Self {
        self.max_width = Some(max);
        self
    }
}

pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    /// Add one row. `cells.len()` must match the column count; a short row
    /// is padded with empty cells rather than panicking.
    pub fn row(&mut self, mut cells: Vec<String>) {
        cells.resize(self.columns.len(), String::new());
        self.rows.push(cells);
    }

    pub fn render(&self, out: &mut (impl Write + ?Sized)) {
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let cell_width =
                    self.rows.iter().map(|r| cell_len(&r[i], col.max_width)).max().unwrap_or(0);
                cell_width.max(col.name.len())
            })
            .collect();

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, width)| format!("{:width$}", col.name, width = width))
            .collect();
        let _ = writeln!(out, "{}", color::header(&header.join("  ")));

        for row in &self.rows {
            let rendered: Vec<String> = row
                .iter()
                .zip(&self.columns)
                .zip(&widths)
                .map(|((cell, col), width)| {
                    let cell = truncate(cell, col.max_width);
                    let padded = format!("{:width$}", cell, width = width);
                    match col.style {
                        Style::Plain => padded,
                        Style::Muted => color::muted(&padded),
                    }
                })
                .collect();
            let _ = writeln!(out, "{}", rendered.join("  "));
        }
    }
}

fn cell_len(cell: &str, max_width: Option<usize>) -> usize {
    truncate(cell, max_width).chars().count()
}

fn truncate(cell: &str, max_width: Option<usize>) -> String {
    match max_width {
        Some(max) if cell.chars().count() > max => {
            if max <= 1 {
                cell.chars().take(max).collect()
            } else {
                let head: String = cell.chars().take(max - 1).collect();
                format!("{head}…")
            }
        }
        _ => cell.to_string(),
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
