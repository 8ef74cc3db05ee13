//! Column-driven table rendering.
//!
//! A view describes its table as a list of [`Column`]s. [`TableView`] applies
//! the optional filter (on one designated column) and sort, then renders the
//! rows with `comfy-table`.

use std::cmp::Ordering;

use anyhow::{bail, Result};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use oxn_core::dates::{parse_timestamp, DateFormatter};

/// The value of one cell, before rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Count(u64),
    /// Rendered through the [`DateFormatter`]; `None` shows as `-`.
    Timestamp(Option<String>),
    /// Badge list, rendered comma-separated.
    List(Vec<String>),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    pub fn timestamp(s: &str) -> Self {
        Cell::Timestamp(Some(s.to_string()))
    }

    pub fn render(&self, dates: &DateFormatter) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Count(n) => n.to_string(),
            Cell::Timestamp(t) => dates.format_opt(t.as_deref()),
            Cell::List(items) => items.join(", "),
        }
    }

    /// Raw text the filter matches against.
    fn haystack(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Count(n) => n.to_string(),
            Cell::Timestamp(t) => t.clone().unwrap_or_default(),
            Cell::List(items) => items.join(" "),
        }
    }

    fn compare(&self, other: &Cell) -> Ordering {
        match (self, other) {
            (Cell::Count(a), Cell::Count(b)) => a.cmp(b),
            (Cell::Timestamp(a), Cell::Timestamp(b)) => {
                let parse = |t: &Option<String>| t.as_deref().and_then(parse_timestamp);
                match (parse(a), parse(b)) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    // Missing or unparseable timestamps sort first.
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (None, None) => a.cmp(b),
                }
            }
            (Cell::List(a), Cell::List(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            _ => self.haystack().cmp(&other.haystack()),
        }
    }
}

/// One column of a table: a stable key, the header text, and a cell accessor.
pub struct Column<R> {
    pub key: &'static str,
    pub header: &'static str,
    pub cell: fn(&R) -> Cell,
}

impl<R> Column<R> {
    pub fn new(key: &'static str, header: &'static str, cell: fn(&R) -> Cell) -> Self {
        Self { key, header, cell }
    }
}

pub struct TableView<R> {
    columns: Vec<Column<R>>,
    dates: DateFormatter,
    filter_column: Option<usize>,
    filter: Option<String>,
    sort: Option<(usize, bool)>,
}

impl<R> TableView<R> {
    pub fn new(columns: Vec<Column<R>>, dates: DateFormatter) -> Self {
        Self {
            columns,
            dates,
            filter_column: None,
            filter: None,
            sort: None,
        }
    }

    fn position(&self, key: &str) -> Result<usize> {
        match self.columns.iter().position(|c| c.key == key) {
            Some(i) => Ok(i),
            None => {
                let keys: Vec<_> = self.columns.iter().map(|c| c.key).collect();
                bail!("Unknown column '{}' (expected one of: {})", key, keys.join(", "))
            }
        }
    }

    /// Designate the column that `filter` applies to.
    pub fn filter_on(mut self, key: &str) -> Result<Self> {
        self.filter_column = Some(self.position(key)?);
        Ok(self)
    }

    /// Case-insensitive substring filter on the designated column.
    pub fn filter(mut self, text: Option<&str>) -> Self {
        self.filter = text
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());
        self
    }

    pub fn sort_by(mut self, key: Option<&str>, descending: bool) -> Result<Self> {
        self.sort = match key {
            Some(key) => Some((self.position(key)?, descending)),
            None => None,
        };
        Ok(self)
    }

    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.header).collect()
    }

    /// Rows after filtering and sorting, rendered to strings.
    pub fn rows(&self, data: &[R]) -> Vec<Vec<String>> {
        let mut cells: Vec<Vec<Cell>> = data
            .iter()
            .map(|row| self.columns.iter().map(|c| (c.cell)(row)).collect())
            .collect();

        if let (Some(col), Some(needle)) = (self.filter_column, &self.filter) {
            cells.retain(|row| row[col].haystack().to_lowercase().contains(needle.as_str()));
        }
        if let Some((col, descending)) = self.sort {
            // Stable, so ties keep their input order.
            cells.sort_by(|a, b| {
                let ord = a[col].compare(&b[col]);
                if descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        cells
            .iter()
            .map(|row| row.iter().map(|c| c.render(&self.dates)).collect())
            .collect()
    }

    pub fn render(&self, data: &[R]) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(self.headers());
        for row in self.rows(data) {
            table.add_row(row);
        }
        table
    }
}
