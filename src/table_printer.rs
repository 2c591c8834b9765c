//! Boxed text tables for printing query results in a terminal.

use std::fmt::Write;

use serde_json::Value;
use unicode_width::UnicodeWidthStr;

use crate::{errors::StationRefErr, resources::flatten_json};

/// Builds a table one row at a time and renders it with box drawing characters.
#[derive(Default, Debug)]
pub struct TablePrinter {
    title: Option<String>,
    footer: Option<String>,
    column_names: Vec<String>,
    rows: Vec<Vec<String>>,
    fill: String,
}

impl TablePrinter {
    /// An empty table.
    pub fn new() -> Self {
        TablePrinter::default()
    }

    /// A table with one row per JSON record and one column per flattened key. Columns appear in
    /// the order their keys are first seen.
    pub fn from_records(records: &[Value]) -> Self {
        let flat: Vec<Vec<(String, String)>> = records.iter().map(flatten_json).collect();

        let mut column_names: Vec<String> = vec![];
        for (key, _) in flat.iter().flatten() {
            if !column_names.contains(key) {
                column_names.push(key.clone());
            }
        }

        let rows = flat
            .iter()
            .map(|pairs| {
                column_names
                    .iter()
                    .map(|name| {
                        pairs
                            .iter()
                            .find(|(key, _)| key == name)
                            .map(|(_, value)| value.clone())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();

        TablePrinter {
            column_names,
            rows,
            ..TablePrinter::default()
        }
    }

    /// Set the title.
    pub fn with_title<T: Into<String>>(self, title: T) -> Self {
        TablePrinter {
            title: Some(title.into()),
            ..self
        }
    }

    /// Set the footer, wrapped to the width of the table.
    pub fn with_footer<T: Into<String>>(self, footer: T) -> Self {
        TablePrinter {
            footer: Some(footer.into()),
            ..self
        }
    }

    /// Text used for cells of short rows.
    pub fn with_fill<T: AsRef<str>>(self, fill: T) -> Self {
        TablePrinter {
            fill: fill.as_ref().to_owned(),
            ..self
        }
    }

    /// Add a column name.
    pub fn with_column<T: ToString>(mut self, name: T) -> Self {
        self.column_names.push(name.to_string());
        self
    }

    /// Add a row of values, one per column.
    pub fn with_row<V: ToString>(mut self, values: &[V]) -> Self {
        self.rows.push(values.iter().map(ToString::to_string).collect());
        self
    }

    /// Number of data rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Render the table.
    pub fn render(&self) -> Result<String, StationRefErr> {
        if self.column_names.is_empty() {
            return Err(StationRefErr::LogicError("table has no columns"));
        }

        let cell = |row: &[String], col: usize| -> String {
            row.get(col).cloned().unwrap_or_else(|| self.fill.clone())
        };

        let mut col_widths: Vec<usize> = self
            .column_names
            .iter()
            .map(|name| UnicodeWidthStr::width(name.as_str()))
            .collect();
        for row in &self.rows {
            for (col, width) in col_widths.iter_mut().enumerate() {
                *width = (*width).max(UnicodeWidthStr::width(cell(row, col).as_str()));
            }
        }

        let inner_width = col_widths.iter().sum::<usize>() + col_widths.len() - 1;
        let title_width = self
            .title
            .as_ref()
            .map(|t| UnicodeWidthStr::width(t.as_str()))
            .unwrap_or(0);
        let table_width = inner_width.max(title_width);
        // Pad the last column so the column rows are as wide as the title.
        if let Some(last) = col_widths.last_mut() {
            *last += table_width - inner_width;
        }

        let rule = |left: char, cross: char, right: char| -> String {
            let segments: Vec<String> = col_widths.iter().map(|&w| "\u{2500}".repeat(w)).collect();
            format!("{}{}{}\n", left, segments.join(&cross.to_string()), right)
        };

        let mut out = String::with_capacity(2000);
        let mut top = ('\u{250c}', '\u{2510}');

        if let Some(ref title) = self.title {
            writeln!(out, "\u{250c}{}\u{2510}", "\u{2500}".repeat(table_width))?;
            writeln!(out, "\u{2502}{}\u{2502}", pad_center(title, table_width))?;
            top = ('\u{251c}', '\u{2524}');
        }

        out.push_str(&rule(top.0, '\u{252c}', top.1));
        for (col, name) in self.column_names.iter().enumerate() {
            write!(out, "\u{2502}{}", pad_center(name, col_widths[col]))?;
        }
        out.push_str("\u{2502}\n");
        out.push_str(&rule('\u{251c}', '\u{253c}', '\u{2524}'));

        for row in &self.rows {
            for (col, &width) in col_widths.iter().enumerate() {
                write!(out, "\u{2502}{}", pad_left(&cell(row, col), width))?;
            }
            out.push_str("\u{2502}\n");
        }

        match self.footer {
            Some(ref footer) => {
                out.push_str(&rule('\u{251c}', '\u{2534}', '\u{2524}'));
                for line in wrap(footer, table_width) {
                    writeln!(out, "\u{2502}{}\u{2502}", pad_left(&line, table_width))?;
                }
                writeln!(out, "\u{2514}{}\u{2518}", "\u{2500}".repeat(table_width))?;
            }
            None => out.push_str(&rule('\u{2514}', '\u{2534}', '\u{2518}')),
        }

        Ok(out)
    }

    /// Render the table to stdout.
    pub fn print(&self) -> Result<(), StationRefErr> {
        print!("{}", self.render()?);
        Ok(())
    }
}

// Display width aware padding, the std formatter counts chars.
fn pad_left(text: &str, width: usize) -> String {
    let used = UnicodeWidthStr::width(text);
    format!("{}{}", text, " ".repeat(width.saturating_sub(used)))
}

fn pad_center(text: &str, width: usize) -> String {
    let spare = width.saturating_sub(UnicodeWidthStr::width(text));
    let left = spare / 2;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(spare - left))
}

// Greedy word wrap on whitespace; words longer than the width get a line of their own.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = vec![];
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let needed = UnicodeWidthStr::width(line.as_str())
                + UnicodeWidthStr::width(word)
                + if line.is_empty() { 0 } else { 1 };
            if needed > width && !line.is_empty() {
                lines.push(std::mem::replace(&mut line, String::new()));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    lines
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
