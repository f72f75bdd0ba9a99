//! Fixed-width result tables and label formatting.

use std::fmt::{self, Write as _};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Clone, Debug)]
pub struct Column {
    pub title: String,
    pub width: usize,
    pub align: Align,
}

impl Column {
    pub fn left(title: impl Into<String>, width: usize) -> Self {
        Self { title: title.into(), width, align: Align::Left }
    }

    pub fn right(title: impl Into<String>, width: usize) -> Self {
        Self { title: title.into(), width, align: Align::Right }
    }

    fn pad(&self, out: &mut String, text: &str) {
        // `write!` into a String cannot fail
        let _ = match self.align {
            Align::Left => write!(out, "{:<w$}", text, w = self.width),
            Align::Right => write!(out, "{:>w$}", text, w = self.width),
        };
    }
}

/// A table whose rows can be printed as they are measured (`header` then
/// `line` per row) or collected and rendered at once via `Display`.
#[derive(Clone, Debug, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    pub fn width(&self) -> usize {
        self.columns.iter().map(|c| c.width).sum()
    }

    /// Column titles followed by a dash rule as wide as the table.
    pub fn header(&self) -> String {
        let titles: Vec<String> = self.columns.iter().map(|c| c.title.clone()).collect();
        format!("{}\n{}", self.line(&titles), "-".repeat(self.width()))
    }

    /// One formatted row. Missing trailing cells render empty; cells are
    /// never truncated.
    pub fn line<S: AsRef<str>>(&self, cells: &[S]) -> String {
        let mut out = String::new();
        for (i, col) in self.columns.iter().enumerate() {
            col.pad(&mut out, cells.get(i).map(AsRef::as_ref).unwrap_or(""));
        }
        out.truncate(out.trim_end().len());
        out
    }

    pub fn push<S: Into<String>>(&mut self, cells: impl IntoIterator<Item = S>) -> &mut Self {
        self.rows.push(cells.into_iter().map(Into::into).collect());
        self
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header())?;
        for row in &self.rows {
            writeln!(f, "{}", self.line(row))?;
        }
        Ok(())
    }
}

/// `"1.00x"` style speedup cell.
pub fn fmt_speedup(x: f64) -> String {
    format!("{x:.2}x")
}

pub fn fmt_fixed(v: f64, precision: usize) -> String {
    format!("{v:.precision$}")
}

/// Compact element count: `1024 -> "1K"`, `4194304 -> "4M"`, else the
/// number itself. Rounds down, so `1536 -> "1K"`.
pub fn size_label(n: usize) -> String {
    const K: usize = 1 << 10;
    const M: usize = 1 << 20;
    if n >= M {
        format!("{}M", n / M)
    } else if n >= K {
        format!("{}K", n / K)
    } else {
        n.to_string()
    }
}

/// At most `max` characters of `name`, split on a char boundary.
pub fn short_name(name: &str, max: usize) -> &str {
    match name.char_indices().nth(max) {
        Some((idx, _)) => &name[..idx],
        None => name,
    }
}

/// Banner used between benchmark sections.
pub fn section(title: &str) -> String {
    let rule = "=".repeat(40);
    format!("{rule}\n{title}\n{rule}")
}
