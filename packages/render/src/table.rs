//! Formatted summary tables, rendered to Markdown and standalone HTML.

use std::fmt::Write as _;

use crate::svg::escape;
use crate::{RenderError, ReportTheme};

/// How a column's numbers are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnFormat {
    /// Verbatim text.
    Text,
    /// Integer with thousands separators.
    Integer,
    /// Ratio in `[0, 1]` shown as a percentage with one decimal.
    Percent,
}

/// One column header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Header label.
    pub label: String,
    /// Display format.
    pub format: ColumnFormat,
}

impl Column {
    /// A column with the given label and format.
    #[must_use]
    pub fn new(label: &str, format: ColumnFormat) -> Self {
        Self {
            label: label.to_string(),
            format,
        }
    }
}

/// One table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Text.
    Text(String),
    /// Count.
    Integer(u64),
    /// Ratio, formatted by the column.
    Number(f64),
    /// No value.
    Empty,
}

/// Row ordering by a fixed list of category values. Values not in the list
/// sort after every listed value, in their original order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOrder {
    /// Column holding the category.
    pub column: usize,
    /// Category values, in display order.
    pub priority: Vec<String>,
}

/// A titled table with an optional source footer.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Title shown above the table.
    pub title: String,
    /// Column headers.
    pub columns: Vec<Column>,
    /// Rows; each has one cell per column.
    pub rows: Vec<Vec<Cell>>,
    /// Attribution shown under the table.
    pub footer: Option<String>,
    /// Row ordering, applied when rendering.
    pub order: Option<RowOrder>,
}

impl Table {
    /// An empty table.
    #[must_use]
    pub fn new(title: &str, columns: Vec<Column>) -> Self {
        Self {
            title: title.to_string(),
            columns,
            rows: Vec::new(),
            footer: None,
            order: None,
        }
    }

    /// Sets the attribution footer.
    #[must_use]
    pub fn with_footer(mut self, footer: &str) -> Self {
        self.footer = Some(footer.to_string());
        self
    }

    /// Orders rows by `priority` values of `column`.
    #[must_use]
    pub fn with_row_order(mut self, column: usize, priority: &[&str]) -> Self {
        self.order = Some(RowOrder {
            column,
            priority: priority.iter().map(ToString::to_string).collect(),
        });
        self
    }

    /// Appends a row.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Table`] if the cell count does not match the
    /// column count.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), RenderError> {
        if row.len() != self.columns.len() {
            return Err(RenderError::Table(format!(
                "row has {} cells, table {:?} has {} columns",
                row.len(),
                self.title,
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Rows in display order.
    #[must_use]
    pub fn ordered_rows(&self) -> Vec<&Vec<Cell>> {
        let mut rows: Vec<&Vec<Cell>> = self.rows.iter().collect();
        if let Some(order) = &self.order {
            let rank = |row: &Vec<Cell>| {
                let value = match row.get(order.column) {
                    Some(Cell::Text(s)) => Some(s.as_str()),
                    _ => None,
                };
                value
                    .and_then(|v| order.priority.iter().position(|p| p.eq_ignore_ascii_case(v)))
                    .unwrap_or(order.priority.len())
            };
            rows.sort_by_key(|row| rank(row));
        }
        rows
    }

    fn formatted(&self, row: &[Cell]) -> Vec<String> {
        row.iter()
            .zip(&self.columns)
            .map(|(cell, column)| format_cell(cell, column.format))
            .collect()
    }

    /// Renders a GitHub-flavored Markdown table with the title as a heading.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "### {}\n", self.title);

        let headers: Vec<&str> = self.columns.iter().map(|c| c.label.as_str()).collect();
        let _ = writeln!(out, "| {} |", headers.join(" | "));
        let aligns: Vec<&str> = self
            .columns
            .iter()
            .map(|c| match c.format {
                ColumnFormat::Text => ":---",
                ColumnFormat::Integer | ColumnFormat::Percent => "---:",
            })
            .collect();
        let _ = writeln!(out, "| {} |", aligns.join(" | "));

        for row in self.ordered_rows() {
            let cells: Vec<String> = self
                .formatted(row)
                .into_iter()
                .map(|c| c.replace('|', "\\|"))
                .collect();
            let _ = writeln!(out, "| {} |", cells.join(" | "));
        }

        if let Some(footer) = &self.footer {
            let _ = writeln!(out, "\n_{footer}_");
        }
        out
    }

    /// Renders a standalone HTML page holding the table.
    #[must_use]
    pub fn to_html(&self, theme: &ReportTheme) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "<!DOCTYPE html>");
        let _ = writeln!(
            out,
            "<html><head><meta charset=\"utf-8\"><title>{}</title>",
            escape(&self.title)
        );
        let _ = writeln!(
            out,
            "<style>body{{font-family:{font};color:{fg};background:{bg}}}\
             table{{border-collapse:collapse}}\
             th,td{{padding:4px 12px;border-bottom:1px solid {grid}}}\
             td.num{{text-align:right}}caption{{font-size:{title}px;font-weight:bold;text-align:left;padding-bottom:8px}}\
             .footer{{color:{muted};font-size:{small}px}}</style></head><body>",
            font = theme.font_family,
            fg = theme.foreground,
            bg = theme.background,
            grid = theme.grid,
            title = theme.title_size,
            muted = theme.muted,
            small = theme.small_size,
        );
        let _ = writeln!(out, "<table><caption>{}</caption>", escape(&self.title));

        out.push_str("<thead><tr>");
        for column in &self.columns {
            let _ = write!(out, "<th>{}</th>", escape(&column.label));
        }
        out.push_str("</tr></thead>\n<tbody>\n");

        for row in self.ordered_rows() {
            out.push_str("<tr>");
            for (text, column) in self.formatted(row).iter().zip(&self.columns) {
                let class = if column.format == ColumnFormat::Text { "" } else { " class=\"num\"" };
                let _ = write!(out, "<td{class}>{}</td>", escape(text));
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</tbody></table>\n");

        if let Some(footer) = &self.footer {
            let _ = writeln!(out, "<p class=\"footer\">{}</p>", escape(footer));
        }
        out.push_str("</body></html>\n");
        out
    }
}

/// `0.1234` as `"12.3%"`.
#[must_use]
pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// `1234567` as `"1,234,567"`.
#[must_use]
pub fn format_integer(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn format_cell(cell: &Cell, format: ColumnFormat) -> String {
    match (cell, format) {
        (Cell::Text(s), _) => s.clone(),
        (Cell::Integer(n), ColumnFormat::Percent) => {
            #[allow(clippy::cast_precision_loss)]
            format_percent(*n as f64)
        }
        (Cell::Integer(n), _) => format_integer(*n),
        (Cell::Number(x), ColumnFormat::Percent) => format_percent(*x),
        (Cell::Number(x), _) => format!("{x:.2}"),
        (Cell::Empty, _) => String::new(),
    }
}
