use serde::{Deserialize, Serialize};

/// The distinguished path prefix denoting "no parent"; ancestor of every
/// top-level class.
pub const ROOT_MARKER: &str = "~";

/// Separator glued between a parent path and a node name.
pub const PATH_SEPARATOR: char = '/';

/// Joins a parent path and a node name into the node's own path.
pub fn join_path(parent: &str, name: &str) -> String {
    format!("{parent}{PATH_SEPARATOR}{name}")
}

/// Discriminates the two markup node kinds. The serialized names are the
/// original element tags so tabular files stay interchangeable with the
/// markup vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    #[serde(rename = "EquipmentStateClass")]
    Class,
    #[serde(rename = "EquipmentState")]
    State,
}

impl NodeType {
    /// The markup element tag for this node kind.
    pub fn tag(self) -> &'static str {
        match self {
            NodeType::Class => "EquipmentStateClass",
            NodeType::State => "EquipmentState",
        }
    }

    /// Maps an element tag back to a node kind.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "EquipmentStateClass" => Some(NodeType::Class),
            "EquipmentState" => Some(NodeType::State),
            _ => None,
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// The table columns, in canonical output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    NodeType,
    StateClass,
    Name,
    OverrideCurrentLineDowntime,
    Code,
    Type,
    ShortStopThreshold,
    EnableMeantimeMetrics,
    Override,
    Scope,
    Roles,
    Parent,
    Path,
    Error,
}

impl Column {
    /// Every column in the order emitters must use.
    pub const ALL: [Column; 14] = [
        Column::NodeType,
        Column::StateClass,
        Column::Name,
        Column::OverrideCurrentLineDowntime,
        Column::Code,
        Column::Type,
        Column::ShortStopThreshold,
        Column::EnableMeantimeMetrics,
        Column::Override,
        Column::Scope,
        Column::Roles,
        Column::Parent,
        Column::Path,
        Column::Error,
    ];

    /// The column header as written to tabular files.
    pub fn name(self) -> &'static str {
        match self {
            Column::NodeType => "NodeType",
            Column::StateClass => "StateClass",
            Column::Name => "Name",
            Column::OverrideCurrentLineDowntime => "OverrideCurrentLineDowntime",
            Column::Code => "Code",
            Column::Type => "Type",
            Column::ShortStopThreshold => "ShortStopThreshold",
            Column::EnableMeantimeMetrics => "EnableMeantimeMetrics",
            Column::Override => "Override",
            Column::Scope => "Scope",
            Column::Roles => "Roles",
            Column::Parent => "Parent",
            Column::Path => "Path",
            Column::Error => "Error",
        }
    }
}

/// One table row; a fixed record rather than a string-keyed mapping, so a
/// mistyped or missing column is a compile error instead of a runtime one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    #[serde(rename = "NodeType")]
    pub node_type: NodeType,
    #[serde(rename = "StateClass", default)]
    pub state_class: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "OverrideCurrentLineDowntime", default)]
    pub override_downtime: String,
    #[serde(rename = "Code", default)]
    pub code: String,
    #[serde(rename = "Type", default)]
    pub kind: String,
    #[serde(rename = "ShortStopThreshold", default)]
    pub short_stop_threshold: String,
    #[serde(rename = "EnableMeantimeMetrics", default)]
    pub enable_meantime_metrics: String,
    #[serde(rename = "Override", default)]
    pub override_flag: String,
    #[serde(rename = "Scope", default)]
    pub scope: String,
    /// Raw roles markup for class rows; `None` when the class has none.
    #[serde(rename = "Roles", default)]
    pub roles: Option<String>,
    #[serde(rename = "Parent")]
    pub parent: String,
    #[serde(rename = "Path", default)]
    pub path: String,
    #[serde(rename = "Error", default)]
    pub error: String,
}

impl Row {
    /// Reads a cell by column.
    pub fn cell(&self, column: Column) -> &str {
        match column {
            Column::NodeType => self.node_type.tag(),
            Column::StateClass => &self.state_class,
            Column::Name => &self.name,
            Column::OverrideCurrentLineDowntime => &self.override_downtime,
            Column::Code => &self.code,
            Column::Type => &self.kind,
            Column::ShortStopThreshold => &self.short_stop_threshold,
            Column::EnableMeantimeMetrics => &self.enable_meantime_metrics,
            Column::Override => &self.override_flag,
            Column::Scope => &self.scope,
            Column::Roles => self.roles.as_deref().unwrap_or(""),
            Column::Parent => &self.parent,
            Column::Path => &self.path,
            Column::Error => &self.error,
        }
    }

    /// The row as an ordered (column, cell) mapping.
    pub fn cells(&self) -> impl Iterator<Item = (Column, &str)> {
        Column::ALL.into_iter().map(|column| (column, self.cell(column)))
    }

    /// Appends a validation message to the error cell, pipe-joined onto any
    /// existing content. A message already present is not appended again, so
    /// re-validation leaves the cell unchanged.
    pub fn append_error(&mut self, message: &str) {
        if self.error.split(" | ").any(|existing| existing == message) {
            return;
        }
        if self.error.is_empty() {
            self.error = message.to_string();
        } else {
            self.error = format!("{} | {message}", self.error);
        }
    }

    /// Undoes float promotion on the numeric-looking columns after a tabular
    /// ingest, so a code written as `12.0` reads back as `12`.
    pub fn restore_numeric_columns(&mut self) {
        self.code = restore_integral_text(&self.code);
        self.short_stop_threshold = restore_integral_text(&self.short_stop_threshold);
    }
}

/// Strips a fractional part consisting only of zeros from an integral text,
/// restoring the form mangled by substrates that promote integer columns to
/// floating point. Anything that is not an integral-plus-zeros pattern is
/// returned untouched.
pub fn restore_integral_text(raw: &str) -> String {
    if let Some((integral, fraction)) = raw.split_once('.') {
        let digits = integral.strip_prefix('-').unwrap_or(integral);
        if !digits.is_empty()
            && digits.bytes().all(|byte| byte.is_ascii_digit())
            && !fraction.is_empty()
            && fraction.bytes().all(|byte| byte == b'0')
        {
            return integral.to_string();
        }
    }
    raw.to_string()
}

/// The in-memory tabular form: an ordered sequence of rows, sorted by path
/// before reconstruction. Structural columns are immutable once built; only
/// the validator writes, and only to the error column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateTable {
    rows: Vec<Row>,
}

impl StateTable {
    /// Wraps an existing row set.
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        Column::ALL.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Reads a cell by row index and column.
    pub fn cell(&self, row: usize, column: Column) -> Option<&str> {
        self.rows.get(row).map(|row| row.cell(column))
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Sorts rows ascending by path. Plain lexicographic string order; a
    /// parent's path always sorts before its descendants' paths because each
    /// path strictly extends its parent's.
    pub fn sort_by_path(&mut self) {
        self.rows.sort_by(|lhs, rhs| lhs.path.cmp(&rhs.path));
    }

    /// Whether any row carries a validation message.
    pub fn has_errors(&self) -> bool {
        self.rows.iter().any(|row| !row.error.is_empty())
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }
}
