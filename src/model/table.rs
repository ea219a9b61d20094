//! Tables: a rectangular grid of cells, each holding paragraphs.

use crate::error::{DocxServerError, Result};
use crate::model::{clean_text, Paragraph};

/// Word's limit on table columns.
pub const MAX_COLUMNS: usize = 63;
/// Word's limit on table rows.
pub const MAX_ROWS: usize = 32_767;

/// A table cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    paragraphs: Vec<Paragraph>,
}

impl Cell {
    /// Cell holding one empty paragraph.
    pub fn empty() -> Self {
        Self {
            paragraphs: vec![Paragraph::new(None)],
        }
    }

    /// Cell with one paragraph per line of `text`.
    pub fn with_text(text: &str) -> Result<Self> {
        let text = clean_text(text)?;
        let paragraphs = text
            .split('\n')
            .map(|line| Paragraph::with_text(line, None))
            .collect::<Result<_>>()?;
        Ok(Self { paragraphs })
    }

    pub fn from_paragraphs(paragraphs: Vec<Paragraph>) -> Self {
        Self { paragraphs }
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// Cell text, one line per paragraph.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replace the content; "\n" starts a new paragraph, as in `text()`.
    pub fn set_text(&mut self, text: &str) -> Result<()> {
        *self = Self::with_text(text)?;
        Ok(())
    }
}

/// A table. Every row has the same number of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Table style id.
    pub style: Option<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Empty `rows` x `cols` table.
    pub fn new(rows: usize, cols: usize, style: Option<String>) -> Result<Self> {
        check_dimensions(rows, cols)?;
        Ok(Self {
            style,
            rows: (0..rows)
                .map(|_| (0..cols).map(|_| Cell::empty()).collect())
                .collect(),
        })
    }

    /// Build from possibly ragged rows, padding short rows with empty cells.
    ///
    /// Returns `None` when there are no cells at all.
    pub fn from_rows(mut rows: Vec<Vec<Cell>>, style: Option<String>) -> Option<Self> {
        rows.retain(|row| !row.is_empty());
        let cols = rows.iter().map(Vec::len).max()?;
        for row in &mut rows {
            row.resize_with(cols, Cell::empty);
        }
        Some(Self { style, rows })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn cell(&self, row: usize, col: usize) -> Result<&Cell> {
        self.check_cell(row, col)?;
        Ok(&self.rows[row][col])
    }

    pub fn set_cell_text(&mut self, row: usize, col: usize, text: &str) -> Result<()> {
        self.check_cell(row, col)?;
        self.rows[row][col].set_text(text)
    }

    /// Fill every cell from `data`, which must match the grid exactly.
    pub fn fill(&mut self, data: &[Vec<String>]) -> Result<()> {
        let cols = self.column_count();
        if data.len() != self.row_count() || data.iter().any(|row| row.len() != cols) {
            return Err(DocxServerError::validation(format!(
                "data must be {} rows of {} values",
                self.row_count(),
                cols
            )));
        }
        let rows = data
            .iter()
            .map(|values| values.iter().map(|v| Cell::with_text(v)).collect())
            .collect::<Result<Vec<Vec<Cell>>>>()?;
        self.rows = rows;
        Ok(())
    }

    /// Append a row, optionally filled with `values`. Returns the new row index.
    pub fn push_row(&mut self, values: Option<&[String]>) -> Result<usize> {
        let cols = self.column_count();
        if self.row_count() >= MAX_ROWS {
            return Err(DocxServerError::validation(format!(
                "table already has the maximum of {MAX_ROWS} rows"
            )));
        }
        let row = match values {
            Some(values) if values.len() != cols => {
                return Err(DocxServerError::validation(format!(
                    "row must have {} values, got {}",
                    cols,
                    values.len()
                )));
            }
            Some(values) => values
                .iter()
                .map(|v| Cell::with_text(v))
                .collect::<Result<_>>()?,
            None => (0..cols).map(|_| Cell::empty()).collect(),
        };
        self.rows.push(row);
        Ok(self.rows.len() - 1)
    }

    fn check_cell(&self, row: usize, col: usize) -> Result<()> {
        if row >= self.row_count() || col >= self.column_count() {
            return Err(DocxServerError::invalid_index(format!(
                "cell ({}, {}) is outside the {}x{} table",
                row,
                col,
                self.row_count(),
                self.column_count()
            )));
        }
        Ok(())
    }
}

pub(crate) fn check_dimensions(rows: usize, cols: usize) -> Result<()> {
    if rows == 0 || cols == 0 {
        return Err(DocxServerError::validation(
            "number of rows and columns must be positive",
        ));
    }
    if rows > MAX_ROWS || cols > MAX_COLUMNS {
        return Err(DocxServerError::validation(format!(
            "table size {rows}x{cols} exceeds the limit of {MAX_ROWS}x{MAX_COLUMNS}"
        )));
    }
    Ok(())
}
