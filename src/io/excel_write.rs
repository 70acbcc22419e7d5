use std::path::Path;

use rust_xlsxwriter::Workbook;

use crate::error::Result;
use crate::table::{Column, StateTable};

/// Sheet name holding the flattened state table.
pub const STATES_SHEET: &str = "States";

/// Writes the table to an Excel workbook: one sheet, header row, and an
/// autofiltered table region over the data.
pub fn write_table(path: &Path, table: &StateTable) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(STATES_SHEET)?;

    for (col_idx, column) in Column::ALL.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, column.name())?;
    }

    for (row_idx, row) in table.rows().iter().enumerate() {
        for (col_idx, column) in Column::ALL.iter().enumerate() {
            worksheet.write_string((row_idx + 1) as u32, col_idx as u16, row.cell(*column))?;
        }
    }

    let mut excel_table_binding = rust_xlsxwriter::Table::new();
    let excel_table = excel_table_binding.set_autofilter(true);
    let col_end = (Column::ALL.len() as u16).saturating_sub(1);
    let row_end = if table.is_empty() {
        0
    } else {
        table.row_count() as u32
    };
    worksheet.add_table(0, 0, row_end, col_end, &excel_table)?;

    workbook.save(path)?;
    Ok(())
}
