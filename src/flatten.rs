use tracing::debug;

use crate::error::{Result, ToolError};
use crate::model::{ClassNode, Node, StateNode, StateTree};
use crate::table::{NodeType, ROOT_MARKER, Row, StateTable, join_path};

/// Flattens the tree into its tabular form: one row per node, emitted in
/// preorder and then normalised to ascending path order. Every error cell
/// starts empty.
pub fn flatten(tree: &StateTree) -> Result<StateTable> {
    let mut table = StateTable::default();

    for class in &tree.classes {
        flatten_class(class, ROOT_MARKER, "", &mut table)?;
    }

    table.sort_by_path();
    debug!(row_count = table.row_count(), "tree flattened");
    Ok(table)
}

fn flatten_class(
    class: &ClassNode,
    parent: &str,
    state_class: &str,
    table: &mut StateTable,
) -> Result<()> {
    if class.name.is_empty() {
        return Err(ToolError::Schema(format!(
            "class under '{parent}' has no Name"
        )));
    }

    let path = join_path(parent, &class.name);
    table.push(Row {
        node_type: NodeType::Class,
        state_class: state_class.to_string(),
        name: class.name.clone(),
        override_downtime: class.override_downtime.clone(),
        code: String::new(),
        kind: String::new(),
        short_stop_threshold: String::new(),
        enable_meantime_metrics: String::new(),
        override_flag: String::new(),
        scope: String::new(),
        roles: class.roles.as_text().map(str::to_string),
        parent: parent.to_string(),
        path: path.clone(),
        error: String::new(),
    });

    // The class's own name becomes the StateClass context for everything
    // below it; the class row itself keeps the enclosing context.
    for child in &class.children {
        match child {
            Node::Class(nested) => flatten_class(nested, &path, &class.name, table)?,
            Node::State(state) => flatten_state(state, &path, &class.name, table)?,
        }
    }

    Ok(())
}

fn flatten_state(
    state: &StateNode,
    parent: &str,
    state_class: &str,
    table: &mut StateTable,
) -> Result<()> {
    if state.name.is_empty() {
        return Err(ToolError::Schema(format!(
            "state under '{parent}' has no Name"
        )));
    }

    let path = join_path(parent, &state.name);
    table.push(Row {
        node_type: NodeType::State,
        state_class: state_class.to_string(),
        name: state.name.clone(),
        override_downtime: state.override_downtime.clone(),
        code: state.code.clone(),
        kind: state.kind.clone(),
        short_stop_threshold: state.short_stop_threshold.clone(),
        enable_meantime_metrics: state.enable_meantime_metrics.clone(),
        override_flag: state.override_flag.clone(),
        scope: state.scope.clone(),
        roles: None,
        parent: parent.to_string(),
        path,
        error: String::new(),
    });

    Ok(())
}
