use std::collections::HashMap;
use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};
use tracing::info;

use crate::error::{Result, ToolError};
use crate::io::excel_write::STATES_SHEET;
use crate::table::{Column, NodeType, Row, StateTable, join_path};

/// Reads a table from an Excel workbook following the layout produced by
/// [`excel_write`](crate::io::excel_write). The states sheet is preferred;
/// a workbook without one is read from its first sheet.
pub fn read_table(path: &Path) -> Result<StateTable> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;

    let sheet_name = if workbook.sheet_names().iter().any(|name| name == STATES_SHEET) {
        STATES_SHEET.to_string()
    } else {
        workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ToolError::InvalidTable("workbook contains no sheets".into()))?
    };

    let range_result = workbook
        .worksheet_range(&sheet_name)
        .ok_or_else(|| ToolError::InvalidTable(format!("missing sheet '{sheet_name}'")))?;
    let range = range_result.map_err(ToolError::from)?;

    let headers: Vec<String> = match range.rows().next() {
        Some(first_row) => first_row
            .iter()
            .map(|cell| cell_to_string(Some(cell)))
            .collect(),
        None => Vec::new(),
    };

    let header_index: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| (header.as_str(), idx))
        .collect();
    for required in [Column::NodeType, Column::Name, Column::Parent] {
        if !header_index.contains_key(required.name()) {
            return Err(ToolError::InvalidTable(format!(
                "missing column '{}'",
                required.name()
            )));
        }
    }

    let mut rows = Vec::new();
    for (row_idx, cells) in range.rows().enumerate().skip(1) {
        let cell = |column: Column| -> String {
            header_index
                .get(column.name())
                .and_then(|&idx| cells.get(idx))
                .map(|value| cell_to_string(Some(value)))
                .unwrap_or_default()
        };

        let type_text = cell(Column::NodeType);
        if type_text.is_empty() {
            continue;
        }
        let node_type = NodeType::from_tag(&type_text).ok_or_else(|| {
            ToolError::InvalidTable(format!("unknown node type '{type_text}' in row {row_idx}"))
        })?;

        let name = cell(Column::Name);
        if name.is_empty() {
            return Err(ToolError::InvalidTable(format!("row {row_idx} has no Name")));
        }

        let roles_text = cell(Column::Roles);
        let parent = cell(Column::Parent);
        let mut row = Row {
            node_type,
            state_class: cell(Column::StateClass),
            path: join_path(&parent, &name),
            name,
            override_downtime: cell(Column::OverrideCurrentLineDowntime),
            code: cell(Column::Code),
            kind: cell(Column::Type),
            short_stop_threshold: cell(Column::ShortStopThreshold),
            enable_meantime_metrics: cell(Column::EnableMeantimeMetrics),
            override_flag: cell(Column::Override),
            scope: cell(Column::Scope),
            roles: if roles_text.is_empty() {
                None
            } else {
                Some(roles_text)
            },
            parent,
            error: String::new(),
        };
        row.restore_numeric_columns();
        rows.push(row);
    }

    let mut table = StateTable::new(rows);
    table.sort_by_path();
    info!(row_count = table.row_count(), "Excel table loaded");
    Ok(table)
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
