use tracing::debug;

use crate::error::ToolError;
use crate::model::{ClassNode, Node, RolesFragment, StateNode, StateTree};
use crate::table::{NodeType, ROOT_MARKER, Row, StateTable};

/// Failure of the reconstruction walk: some row's parent was never offered
/// as an expected parent, so the forward cursor stalled before the end of
/// the table. The tree built up to that point is kept for diagnostics.
#[derive(Debug)]
pub struct ReconstructionFailure {
    /// Index of the first unconsumed row.
    pub index: usize,
    /// That row's parent cell.
    pub parent: String,
    /// That row's path cell.
    pub path: String,
    /// Everything built before the walk stalled.
    pub partial: StateTree,
}

impl std::fmt::Display for ReconstructionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "reconstruction failed at row {}: parent '{}' of '{}' was never built",
            self.index, self.parent, self.path
        )
    }
}

impl std::error::Error for ReconstructionFailure {}

impl From<ReconstructionFailure> for ToolError {
    fn from(failure: ReconstructionFailure) -> Self {
        ToolError::Reconstruction {
            index: failure.index,
            parent: failure.parent,
            path: failure.path,
        }
    }
}

/// Rebuilds the node tree from a path-sorted table with a single forward
/// cursor. Path order guarantees every class row is visited before the rows
/// naming it as parent, so one pass suffices; a cursor that stops short of
/// the table's end means an orphaned or out-of-order row.
pub fn reconstruct(table: &StateTable) -> Result<StateTree, ReconstructionFailure> {
    let rows = table.rows();
    let mut classes = Vec::new();
    let mut cursor = 0;

    while cursor < rows.len() && rows[cursor].parent == ROOT_MARKER {
        match rows[cursor].node_type {
            NodeType::Class => {
                let (next, class) = build_class(rows, cursor);
                classes.push(class);
                cursor = next;
            }
            // Only classes may sit directly under the root; a top-level
            // state row is left unconsumed and reported below.
            NodeType::State => break,
        }
    }

    if cursor < rows.len() {
        let row = &rows[cursor];
        return Err(ReconstructionFailure {
            index: cursor,
            parent: row.parent.clone(),
            path: row.path.clone(),
            partial: StateTree { classes },
        });
    }

    debug!(class_count = classes.len(), "table reconstructed");
    Ok(StateTree { classes })
}

fn build_class(rows: &[Row], index: usize) -> (usize, ClassNode) {
    let row = &rows[index];
    let mut class = ClassNode {
        name: row.name.clone(),
        override_downtime: row.override_downtime.clone(),
        roles: RolesFragment::from_cell(row.roles.as_deref()),
        children: Vec::new(),
    };

    let mut cursor = index + 1;
    while cursor < rows.len() && rows[cursor].parent == row.path {
        match rows[cursor].node_type {
            NodeType::Class => {
                let (next, nested) = build_class(rows, cursor);
                class.children.push(Node::Class(nested));
                cursor = next;
            }
            NodeType::State => {
                class.children.push(Node::State(build_state(&rows[cursor])));
                cursor += 1;
            }
        }
    }

    (cursor, class)
}

fn build_state(row: &Row) -> StateNode {
    StateNode {
        name: row.name.clone(),
        code: row.code.clone(),
        kind: row.kind.clone(),
        short_stop_threshold: row.short_stop_threshold.clone(),
        enable_meantime_metrics: row.enable_meantime_metrics.clone(),
        override_downtime: row.override_downtime.clone(),
        override_flag: row.override_flag.clone(),
        scope: row.scope.clone(),
    }
}
