use std::fs;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{info, warn};

use crate::error::{Result, ToolError};
use crate::model::{ClassNode, Node, RolesFragment, StateNode, StateTree};

const ROOT_TAG: &str = "EquipmentStateRoot";
const CLASS_TAG: &[u8] = b"EquipmentStateClass";
const STATE_TAG: &[u8] = b"EquipmentState";
const ROLES_TAG: &[u8] = b"Roles";

/// Reads an equipment-state export file into a tree.
pub fn read_tree(path: &Path) -> Result<StateTree> {
    let source = fs::read_to_string(path)?;
    let tree = parse_markup(&source)?;
    info!(
        class_count = tree.classes.len(),
        state_count = tree.state_count(),
        "markup parsed"
    );
    Ok(tree)
}

/// Parses markup source into a tree. The root element must be
/// `EquipmentStateRoot`; its non-class children are skipped.
pub fn parse_markup(source: &str) -> Result<StateTree> {
    let mut reader = Reader::from_str(source);
    reader.trim_text(true);

    expect_root(&mut reader)?;

    let mut classes = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                if element.name().as_ref() == CLASS_TAG {
                    classes.push(parse_class(&mut reader)?);
                } else {
                    let tag = tag_name(&element);
                    reader.read_to_end(element.name())?;
                    warn!(%tag, "skipping non-class element under the root");
                }
            }
            Event::Empty(element) if element.name().as_ref() == CLASS_TAG => {
                return Err(ToolError::Schema(
                    "class element without a Name leaf".into(),
                ));
            }
            Event::Empty(_) => {}
            Event::End(_) => break,
            Event::Eof => {
                return Err(ToolError::Schema(
                    "document ended before the root element was closed".into(),
                ));
            }
            _ => {}
        }
    }

    Ok(StateTree { classes })
}

fn expect_root(reader: &mut Reader<&[u8]>) -> Result<()> {
    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                let tag = tag_name(&element);
                if tag != ROOT_TAG {
                    return Err(ToolError::Schema(format!("invalid root element '{tag}'")));
                }
                return Ok(());
            }
            Event::Eof => {
                return Err(ToolError::Schema("document has no root element".into()));
            }
            _ => {}
        }
    }
}

fn parse_class(reader: &mut Reader<&[u8]>) -> Result<ClassNode> {
    let mut class = ClassNode::default();

    loop {
        match reader.read_event()? {
            Event::Start(element) => match element.name().as_ref() {
                CLASS_TAG => class.children.push(Node::Class(parse_class(reader)?)),
                STATE_TAG => class.children.push(Node::State(parse_state(reader)?)),
                ROLES_TAG => {
                    let inner = reader.read_text(element.name())?;
                    class.roles =
                        RolesFragment::Present(compact_fragment(&format!("<Roles>{inner}</Roles>")));
                }
                b"Name" => class.name = read_leaf(reader)?,
                b"OverrideCurrentLineDowntime" => class.override_downtime = read_leaf(reader)?,
                _ => {
                    let tag = tag_name(&element);
                    reader.read_to_end(element.name())?;
                    warn!(%tag, "ignoring unexpected element in class");
                }
            },
            Event::Empty(element) => match element.name().as_ref() {
                ROLES_TAG => class.roles = RolesFragment::Present("<Roles/>".to_string()),
                b"Name" | b"OverrideCurrentLineDowntime" => {}
                _ => {
                    let tag = tag_name(&element);
                    warn!(%tag, "ignoring unexpected element in class");
                }
            },
            Event::End(_) => break,
            Event::Eof => {
                return Err(ToolError::Schema(
                    "document ended inside a class element".into(),
                ));
            }
            _ => {}
        }
    }

    if class.name.is_empty() {
        return Err(ToolError::Schema("class element without a Name leaf".into()));
    }
    Ok(class)
}

fn parse_state(reader: &mut Reader<&[u8]>) -> Result<StateNode> {
    let mut state = StateNode::default();

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                if let Some(slot) = state_leaf_slot(&mut state, element.name().as_ref()) {
                    *slot = read_leaf(reader)?;
                } else {
                    let tag = tag_name(&element);
                    reader.read_to_end(element.name())?;
                    warn!(%tag, "ignoring unexpected leaf in state");
                }
            }
            Event::Empty(element) => {
                if let Some(slot) = state_leaf_slot(&mut state, element.name().as_ref()) {
                    slot.clear();
                } else {
                    let tag = tag_name(&element);
                    warn!(%tag, "ignoring unexpected leaf in state");
                }
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(ToolError::Schema(
                    "document ended inside a state element".into(),
                ));
            }
            _ => {}
        }
    }

    if state.name.is_empty() {
        return Err(ToolError::Schema("state element without a Name leaf".into()));
    }
    Ok(state)
}

fn state_leaf_slot<'a>(state: &'a mut StateNode, tag: &[u8]) -> Option<&'a mut String> {
    match tag {
        b"Name" => Some(&mut state.name),
        b"Code" => Some(&mut state.code),
        b"Type" => Some(&mut state.kind),
        b"ShortStopThreshold" => Some(&mut state.short_stop_threshold),
        b"EnableMeantimeMetrics" => Some(&mut state.enable_meantime_metrics),
        b"OverrideCurrentLineDowntime" => Some(&mut state.override_downtime),
        b"Override" => Some(&mut state.override_flag),
        b"Scope" => Some(&mut state.scope),
        _ => None,
    }
}

/// Collects the text content of a leaf element up to its end tag.
fn read_leaf(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut value = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(text) => value.push_str(&text.unescape()?),
            Event::CData(cdata) => value.push_str(&String::from_utf8_lossy(&cdata.into_inner())),
            // Leaves hold text only; stray markup is skipped whole so the
            // end-tag bookkeeping stays aligned.
            Event::Start(element) => {
                reader.read_to_end(element.name())?;
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(ToolError::Schema(
                    "document ended inside a leaf element".into(),
                ));
            }
            _ => {}
        }
    }
    Ok(value)
}

fn tag_name(element: &BytesStart) -> String {
    String::from_utf8_lossy(element.name().as_ref()).into_owned()
}

/// Drops the formatting whitespace between tags of a raw fragment so the
/// stored text is stable no matter how the source file was indented. Text
/// content and attribute values are untouched.
fn compact_fragment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut whitespace = String::new();

    for ch in raw.chars() {
        if ch.is_whitespace() {
            whitespace.push(ch);
            continue;
        }
        if !(ch == '<' && out.ends_with('>')) {
            out.push_str(&whitespace);
        }
        whitespace.clear();
        out.push(ch);
    }

    out
}
