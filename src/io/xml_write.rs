use std::fs;
use std::io::Write;
use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::Result;
use crate::model::{ClassNode, Node, RolesFragment, StateNode, StateTree};

/// Writes the tree to a markup export file.
pub fn write_tree(path: &Path, tree: &StateTree) -> Result<()> {
    let bytes = serialize_tree(tree)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Serialises the tree into indented markup bytes.
pub fn serialize_tree(tree: &StateTree) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("no"))))?;
    writer.write_event(Event::Start(BytesStart::new("EquipmentStateRoot")))?;
    for class in &tree.classes {
        write_class(&mut writer, class)?;
    }
    writer.write_event(Event::End(BytesEnd::new("EquipmentStateRoot")))?;

    Ok(writer.into_inner())
}

fn write_class<W: Write>(writer: &mut Writer<W>, class: &ClassNode) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("EquipmentStateClass")))?;

    write_leaf(writer, "Name", &class.name)?;
    write_leaf(writer, "OverrideCurrentLineDowntime", &class.override_downtime)?;
    match &class.roles {
        // An absent fragment emits nothing; this is what keeps "no roles"
        // distinguishable from an empty roles element on the way back in.
        RolesFragment::Absent => {}
        RolesFragment::Present(raw) => {
            writer.write_event(Event::Text(BytesText::from_escaped(raw.as_str())))?;
        }
    }

    for child in &class.children {
        match child {
            Node::Class(nested) => write_class(writer, nested)?,
            Node::State(state) => write_state(writer, state)?,
        }
    }

    writer.write_event(Event::End(BytesEnd::new("EquipmentStateClass")))?;
    Ok(())
}

fn write_state<W: Write>(writer: &mut Writer<W>, state: &StateNode) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("EquipmentState")))?;

    write_leaf(writer, "Name", &state.name)?;
    write_leaf(writer, "Code", &state.code)?;
    write_leaf(writer, "Type", &state.kind)?;
    write_leaf(writer, "ShortStopThreshold", &state.short_stop_threshold)?;
    write_leaf(writer, "EnableMeantimeMetrics", &state.enable_meantime_metrics)?;
    write_leaf(writer, "OverrideCurrentLineDowntime", &state.override_downtime)?;
    write_leaf(writer, "Override", &state.override_flag)?;
    write_leaf(writer, "Scope", &state.scope)?;

    writer.write_event(Event::End(BytesEnd::new("EquipmentState")))?;
    Ok(())
}

fn write_leaf<W: Write>(writer: &mut Writer<W>, tag: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new(tag)))?;
        return Ok(());
    }
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}
