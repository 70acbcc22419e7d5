use std::path::Path;

use tracing::info;

use crate::error::{Result, ToolError};
use crate::table::{Column, Row, StateTable, join_path};

/// Columns a tabular file must carry; everything else may be defaulted.
const REQUIRED_COLUMNS: [Column; 3] = [Column::NodeType, Column::Name, Column::Parent];

/// Loads a table from a CSV file. The path column is recomputed from parent
/// and name, the error column is reset, and rows are sorted by path, so the
/// result is ready for validation no matter what the file carried.
pub fn read_table(path: &Path) -> Result<StateTable> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| header == required.name()) {
            return Err(ToolError::InvalidTable(format!(
                "missing column '{}'",
                required.name()
            )));
        }
    }

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<Row>().enumerate() {
        let mut row = record?;
        if row.name.is_empty() {
            return Err(ToolError::InvalidTable(format!(
                "row {} has no Name",
                index + 1
            )));
        }
        row.path = join_path(&row.parent, &row.name);
        row.error = String::new();
        row.restore_numeric_columns();
        rows.push(row);
    }

    let mut table = StateTable::new(rows);
    table.sort_by_path();
    info!(row_count = table.row_count(), "CSV table loaded");
    Ok(table)
}

/// Writes the table as CSV with the canonical column order.
pub fn write_table(path: &Path, table: &StateTable) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(Column::ALL.iter().map(|column| column.name()))?;
    for row in table.rows() {
        writer.write_record(Column::ALL.iter().map(|column| row.cell(*column)))?;
    }
    writer.flush()?;
    Ok(())
}
