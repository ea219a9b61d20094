//! Table tools: creation, rows and cell access.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{DocxServerError, Result};
use crate::state::DocumentStore;
use crate::tools::document::{insertion_index, InsertBlockResult};

/// Table style applied when the caller does not name one.
pub const DEFAULT_TABLE_STYLE: &str = "TableGrid";

// ============== Add Table ==============

/// Parameters for adding a table.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AddTableParams {
    /// Document ID.
    pub document_id: String,
    /// Number of rows. Inferred from `data` when omitted.
    #[serde(default)]
    pub rows: Option<usize>,
    /// Number of columns. Inferred from `data` when omitted.
    #[serde(default)]
    pub cols: Option<usize>,
    /// Cell text, row by row. Must match rows x cols exactly.
    #[serde(default)]
    pub data: Option<Vec<Vec<String>>>,
    /// Table style id or name (default "TableGrid").
    #[serde(default)]
    pub style: Option<String>,
    /// Block index to insert at. Omit to append.
    #[serde(default)]
    pub index: Option<usize>,
}

impl AddTableParams {
    /// Table shape from explicit counts, falling back to the data's shape.
    fn dimensions(&self) -> Result<(usize, usize)> {
        let data_rows = self.data.as_ref().map(Vec::len);
        let data_cols = self
            .data
            .as_ref()
            .and_then(|rows| rows.first())
            .map(Vec::len);

        let rows = self.rows.or(data_rows);
        let cols = self.cols.or(data_cols);
        match (rows, cols) {
            (Some(rows), Some(cols)) => Ok((rows, cols)),
            _ => Err(DocxServerError::validation(
                "rows and cols are required unless data is given",
            )),
        }
    }
}

/// Insert a table.
pub fn add_table(store: &DocumentStore, params: AddTableParams) -> Result<InsertBlockResult> {
    let (rows, cols) = params.dimensions()?;
    let style = params.style.as_deref().unwrap_or(DEFAULT_TABLE_STYLE);

    store.with_document_mut(&params.document_id, |model| {
        let index = insertion_index(model, params.index);
        let index = model.add_table(index, rows, cols, Some(style), params.data.as_deref())?;
        Ok(InsertBlockResult {
            index,
            block_count: model.len(),
        })
    })
}

// ============== Add Table Row ==============

/// Parameters for appending a table row.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AddTableRowParams {
    /// Document ID.
    pub document_id: String,
    /// Table block index.
    pub table: usize,
    /// Cell text for the new row; must have one entry per column.
    #[serde(default)]
    pub values: Option<Vec<String>>,
}

/// Result of appending a table row.
#[derive(Debug, Serialize, JsonSchema)]
pub struct AddTableRowResult {
    /// Index of the new row.
    pub row: usize,
}

/// Append a row to a table.
pub fn add_table_row(
    store: &DocumentStore,
    params: AddTableRowParams,
) -> Result<AddTableRowResult> {
    store.with_document_mut(&params.document_id, |model| {
        let row = model.add_table_row(params.table, params.values.as_deref())?;
        Ok(AddTableRowResult { row })
    })
}

// ============== Set Cell Text ==============

/// Parameters for replacing a cell's text.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SetCellTextParams {
    /// Document ID.
    pub document_id: String,
    /// Table block index.
    pub table: usize,
    /// Row index (0-indexed).
    pub row: usize,
    /// Column index (0-indexed).
    pub col: usize,
    /// New cell text; each "\n" starts a new paragraph inside the cell.
    pub text: String,
}

/// Result of a table mutation with no other payload.
#[derive(Debug, Serialize, JsonSchema)]
pub struct SetCellTextResult {
    pub success: bool,
}

/// Replace the text of one cell.
pub fn set_cell_text(
    store: &DocumentStore,
    params: SetCellTextParams,
) -> Result<SetCellTextResult> {
    store.with_document_mut(&params.document_id, |model| {
        model.set_cell_text(params.table, params.row, params.col, &params.text)?;
        Ok(SetCellTextResult { success: true })
    })
}

// ============== Get Cell Text ==============

/// Parameters for reading a cell.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetCellTextParams {
    /// Document ID.
    pub document_id: String,
    /// Table block index.
    pub table: usize,
    /// Row index (0-indexed).
    pub row: usize,
    /// Column index (0-indexed).
    pub col: usize,
}

/// Result of reading a cell.
#[derive(Debug, Serialize, JsonSchema)]
pub struct GetCellTextResult {
    pub text: String,
}

/// Read the text of one cell.
pub fn get_cell_text(
    store: &DocumentStore,
    params: GetCellTextParams,
) -> Result<GetCellTextResult> {
    store.with_document(&params.document_id, |model| {
        Ok(GetCellTextResult {
            text: model.cell_text(params.table, params.row, params.col)?,
        })
    })
}

// ============== Get Table Dimensions ==============

/// Parameters for reading a table's size.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetTableDimensionsParams {
    /// Document ID.
    pub document_id: String,
    /// Table block index.
    pub table: usize,
}

/// Table size.
#[derive(Debug, Serialize, JsonSchema)]
pub struct GetTableDimensionsResult {
    pub rows: usize,
    pub cols: usize,
}

/// Get the row and column count of a table.
pub fn get_table_dimensions(
    store: &DocumentStore,
    params: GetTableDimensionsParams,
) -> Result<GetTableDimensionsResult> {
    store.with_document(&params.document_id, |model| {
        let (rows, cols) = model.table_dimensions(params.table)?;
        Ok(GetTableDimensionsResult { rows, cols })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Block;

    fn params(id: &str) -> AddTableParams {
        AddTableParams {
            document_id: id.to_string(),
            rows: None,
            cols: None,
            data: None,
            style: None,
            index: None,
        }
    }

    #[test]
    fn test_add_table_from_data_uses_default_style() {
        let store = DocumentStore::new();
        let id = store.create(None, None).unwrap();
        add_table(
            &store,
            AddTableParams {
                data: Some(vec![
                    vec!["Name".to_string(), "Qty".to_string()],
                    vec!["Apples".to_string(), "3".to_string()],
                ]),
                ..params(&id)
            },
        )
        .unwrap();

        let dims = get_table_dimensions(
            &store,
            GetTableDimensionsParams {
                document_id: id.clone(),
                table: 0,
            },
        )
        .unwrap();
        assert_eq!((dims.rows, dims.cols), (2, 2));

        let style = store
            .with_document(&id, |model| match &model.blocks()[0] {
                Block::Table(table) => Ok(table.style.clone()),
                _ => Ok(None),
            })
            .unwrap();
        assert_eq!(style.as_deref(), Some(DEFAULT_TABLE_STYLE));

        let cell = get_cell_text(
            &store,
            GetCellTextParams {
                document_id: id,
                table: 0,
                row: 1,
                col: 0,
            },
        )
        .unwrap();
        assert_eq!(cell.text, "Apples");
    }

    #[test]
    fn test_add_table_requires_shape() {
        let store = DocumentStore::new();
        let id = store.create(None, None).unwrap();
        let result = add_table(
            &store,
            AddTableParams {
                rows: Some(2),
                ..params(&id)
            },
        );
        assert!(matches!(result, Err(DocxServerError::Validation(_))));
    }

    #[test]
    fn test_cell_out_of_range() {
        let store = DocumentStore::new();
        let id = store.create(None, None).unwrap();
        add_table(
            &store,
            AddTableParams {
                rows: Some(1),
                cols: Some(1),
                ..params(&id)
            },
        )
        .unwrap();
        let result = set_cell_text(
            &store,
            SetCellTextParams {
                document_id: id,
                table: 0,
                row: 0,
                col: 5,
                text: "x".to_string(),
            },
        );
        assert!(matches!(result, Err(DocxServerError::InvalidIndex(_))));
    }

    #[test]
    fn test_add_table_row() {
        let store = DocumentStore::new();
        let id = store.create(None, None).unwrap();
        add_table(
            &store,
            AddTableParams {
                rows: Some(1),
                cols: Some(2),
                ..params(&id)
            },
        )
        .unwrap();
        let added = add_table_row(
            &store,
            AddTableRowParams {
                document_id: id,
                table: 0,
                values: Some(vec!["a".to_string(), "b".to_string()]),
            },
        )
        .unwrap();
        assert_eq!(added.row, 1);
    }

    #[test]
    fn test_cell_text_lines_round_trip() {
        let store = DocumentStore::new();
        let id = store.create(None, None).unwrap();
        add_table(
            &store,
            AddTableParams {
                rows: Some(1),
                cols: Some(1),
                ..params(&id)
            },
        )
        .unwrap();
        set_cell_text(
            &store,
            SetCellTextParams {
                document_id: id.clone(),
                table: 0,
                row: 0,
                col: 0,
                text: "line one\nline two".to_string(),
            },
        )
        .unwrap();

        let paragraphs = store
            .with_document(&id, |model| {
                Ok(model.table(0)?.cell(0, 0)?.paragraphs().len())
            })
            .unwrap();
        assert_eq!(paragraphs, 2);
        let cell = get_cell_text(
            &store,
            GetCellTextParams {
                document_id: id,
                table: 0,
                row: 0,
                col: 0,
            },
        )
        .unwrap();
        assert_eq!(cell.text, "line one\nline two");
    }
}
