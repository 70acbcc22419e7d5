/// The opaque role assignment carried by a class. The markup inside the
/// `Roles` element is never interpreted, only transported; `Absent` (no
/// element at all) and `Present("<Roles/>")` (an element with no content)
/// are distinct and both survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RolesFragment {
    /// The class declares no roles element.
    #[default]
    Absent,
    /// The raw markup text of the whole roles element.
    Present(String),
}

impl RolesFragment {
    /// Returns the raw markup text, or `None` when absent.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RolesFragment::Absent => None,
            RolesFragment::Present(text) => Some(text),
        }
    }

    /// Builds a fragment from a table cell; an empty cell means absent.
    pub fn from_cell(cell: Option<&str>) -> Self {
        match cell {
            Some(text) if !text.is_empty() => RolesFragment::Present(text.to_string()),
            _ => RolesFragment::Absent,
        }
    }
}

/// A grouping node. Classes carry a name, a downtime-override flag, an
/// opaque roles fragment, and any number of nested classes or states.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassNode {
    pub name: String,
    pub override_downtime: String,
    pub roles: RolesFragment,
    pub children: Vec<Node>,
}

impl ClassNode {
    /// Creates an empty class with the provided name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A leaf state definition. Every field is kept as its original text so the
/// codec never has to guess at numeric or boolean representations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateNode {
    pub name: String,
    pub code: String,
    /// The state's `Type` leaf; renamed to avoid the reserved word.
    pub kind: String,
    pub short_stop_threshold: String,
    pub enable_meantime_metrics: String,
    pub override_downtime: String,
    pub override_flag: String,
    pub scope: String,
}

impl StateNode {
    /// Creates an empty state with the provided name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A node in the equipment-state tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Class(ClassNode),
    State(StateNode),
}

impl Node {
    /// Returns the node's name regardless of variant.
    pub fn name(&self) -> &str {
        match self {
            Node::Class(class) => &class.name,
            Node::State(state) => &state.name,
        }
    }
}

/// The root container. Only classes may sit directly under the root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateTree {
    pub classes: Vec<ClassNode>,
}

impl StateTree {
    /// Counts the state leaves in the whole tree.
    pub fn state_count(&self) -> usize {
        fn count(children: &[Node]) -> usize {
            children
                .iter()
                .map(|child| match child {
                    Node::Class(class) => count(&class.children),
                    Node::State(_) => 1,
                })
                .sum()
        }

        self.classes.iter().map(|class| count(&class.children)).sum()
    }
}
