use equipstate_tools::flatten::flatten;
use equipstate_tools::io::{csv_file, excel_read, excel_write, xml_read, xml_write};
use equipstate_tools::model::{ClassNode, Node, RolesFragment, StateNode, StateTree};
use equipstate_tools::reconstruct::reconstruct;
use equipstate_tools::sync::{self, SyncOutcome};
use equipstate_tools::table::{Column, NodeType, ROOT_MARKER};
use std::fs;
use tempfile::tempdir;

const SAMPLE_EXPORT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<EquipmentStateRoot>
  <EquipmentStateClass>
    <Name>Lines</Name>
    <OverrideCurrentLineDowntime>false</OverrideCurrentLineDowntime>
    <Roles>
      <Role>operator</Role>
    </Roles>
    <EquipmentStateClass>
      <Name>LineDown</Name>
      <OverrideCurrentLineDowntime>true</OverrideCurrentLineDowntime>
      <EquipmentState>
        <Name>Starved</Name>
        <Code>5</Code>
        <Type>Planned</Type>
        <ShortStopThreshold>120</ShortStopThreshold>
        <EnableMeantimeMetrics>true</EnableMeantimeMetrics>
        <OverrideCurrentLineDowntime>false</OverrideCurrentLineDowntime>
        <Override>false</Override>
        <Scope>Line</Scope>
      </EquipmentState>
      <EquipmentState>
        <Name>Blocked</Name>
        <Code>6</Code>
        <Type>Unplanned</Type>
        <ShortStopThreshold>30</ShortStopThreshold>
        <EnableMeantimeMetrics>false</EnableMeantimeMetrics>
        <OverrideCurrentLineDowntime>false</OverrideCurrentLineDowntime>
        <Override>true</Override>
        <Scope>Cell</Scope>
      </EquipmentState>
    </EquipmentStateClass>
  </EquipmentStateClass>
</EquipmentStateRoot>
"#;

#[test]
fn flatten_sorts_by_path_and_attaches_contexts() {
    let tree = xml_read::parse_markup(SAMPLE_EXPORT).expect("markup parsed");
    let table = flatten(&tree).expect("tree flattened");

    let paths: Vec<&str> = table.rows().iter().map(|row| row.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "~/Lines",
            "~/Lines/LineDown",
            "~/Lines/LineDown/Blocked",
            "~/Lines/LineDown/Starved",
        ]
    );

    let contexts: Vec<&str> = table
        .rows()
        .iter()
        .map(|row| row.state_class.as_str())
        .collect();
    assert_eq!(contexts, vec!["", "Lines", "LineDown", "LineDown"]);

    assert_eq!(table.rows()[0].parent, ROOT_MARKER);
    assert_eq!(
        table.rows()[0].roles.as_deref(),
        Some("<Roles><Role>operator</Role></Roles>")
    );
    assert_eq!(table.cell(3, Column::Code), Some("5"));
    assert!(table.rows().iter().all(|row| row.error.is_empty()));
}

#[test]
fn reconstructed_tree_reflattens_to_the_same_table() {
    let tree = xml_read::parse_markup(SAMPLE_EXPORT).expect("markup parsed");
    let table = flatten(&tree).expect("tree flattened");

    let rebuilt = reconstruct(&table).expect("table reconstructed");
    let reflattened = flatten(&rebuilt).expect("rebuilt tree flattened");

    assert_eq!(reflattened, table);
}

#[test]
fn markup_file_roundtrip_preserves_the_table() {
    let tree = xml_read::parse_markup(SAMPLE_EXPORT).expect("markup parsed");
    let table = flatten(&tree).expect("tree flattened");

    let temp_dir = tempdir().expect("temporary directory");
    let xml_path = temp_dir.path().join("export.xml");
    xml_write::write_tree(&xml_path, &tree).expect("markup written");

    let restored = xml_read::read_tree(&xml_path).expect("markup re-read");
    assert_eq!(flatten(&restored).expect("restored flattened"), table);
}

#[test]
fn roles_absent_and_empty_stay_distinct() {
    let tree = StateTree {
        classes: vec![
            ClassNode {
                name: "Bare".to_string(),
                override_downtime: "false".to_string(),
                roles: RolesFragment::Absent,
                children: Vec::new(),
            },
            ClassNode {
                name: "Empty".to_string(),
                override_downtime: "false".to_string(),
                roles: RolesFragment::Present("<Roles/>".to_string()),
                children: Vec::new(),
            },
        ],
    };

    let bytes = xml_write::serialize_tree(&tree).expect("markup serialised");
    let restored =
        xml_read::parse_markup(&String::from_utf8(bytes).expect("utf8 markup")).expect("re-parsed");

    assert_eq!(restored.classes[0].roles, RolesFragment::Absent);
    assert_eq!(
        restored.classes[1].roles,
        RolesFragment::Present("<Roles/>".to_string())
    );
}

#[test]
fn csv_roundtrip_preserves_rows_and_column_order() {
    let tree = xml_read::parse_markup(SAMPLE_EXPORT).expect("markup parsed");
    let table = flatten(&tree).expect("tree flattened");

    let temp_dir = tempdir().expect("temporary directory");
    let csv_path = temp_dir.path().join("states.csv");
    csv_file::write_table(&csv_path, &table).expect("CSV written");

    let written = fs::read_to_string(&csv_path).expect("CSV file read");
    let header = written.lines().next().expect("header line");
    assert_eq!(
        header,
        "NodeType,StateClass,Name,OverrideCurrentLineDowntime,Code,Type,ShortStopThreshold,EnableMeantimeMetrics,Override,Scope,Roles,Parent,Path,Error"
    );

    let restored = csv_file::read_table(&csv_path).expect("CSV read");
    assert_eq!(restored, table);
}

#[test]
fn excel_roundtrip_preserves_rows() {
    let tree = xml_read::parse_markup(SAMPLE_EXPORT).expect("markup parsed");
    let table = flatten(&tree).expect("tree flattened");

    let temp_dir = tempdir().expect("temporary directory");
    let xlsx_path = temp_dir.path().join("states.xlsx");
    excel_write::write_table(&xlsx_path, &table).expect("Excel written");

    let restored = excel_read::read_table(&xlsx_path).expect("Excel read");
    assert_eq!(restored, table);
}

#[test]
fn promoted_numeric_cells_read_back_as_integral_text() {
    let temp_dir = tempdir().expect("temporary directory");

    let csv_path = temp_dir.path().join("promoted.csv");
    fs::write(
        &csv_path,
        "NodeType,StateClass,Name,Code,ShortStopThreshold,Parent\n\
         EquipmentStateClass,,LineDown,,,~\n\
         EquipmentState,LineDown,Starved,7.0,120.50,~/LineDown\n",
    )
    .expect("CSV written");
    let table = csv_file::read_table(&csv_path).expect("CSV read");
    let state = &table.rows()[1];
    assert_eq!(state.code, "7");
    assert_eq!(state.short_stop_threshold, "120.50");

    // An Excel producer may have stored the code as a real number outright.
    let xlsx_path = temp_dir.path().join("promoted.xlsx");
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("States").expect("sheet named");
    for (idx, header) in ["NodeType", "StateClass", "Name", "Code", "Parent"]
        .iter()
        .enumerate()
    {
        worksheet
            .write_string(0, idx as u16, *header)
            .expect("header written");
    }
    worksheet
        .write_string(1, 0, "EquipmentState")
        .expect("cell written");
    worksheet
        .write_string(1, 1, "LineDown")
        .expect("cell written");
    worksheet.write_string(1, 2, "Starved").expect("cell written");
    worksheet.write_number(1, 3, 7.0).expect("cell written");
    worksheet
        .write_string(1, 4, "~/LineDown")
        .expect("cell written");
    workbook.save(&xlsx_path).expect("Excel written");

    let table = excel_read::read_table(&xlsx_path).expect("Excel read");
    assert_eq!(table.rows()[0].code, "7");
}

#[test]
fn reconstruction_failure_names_the_first_orphan_row() {
    let tree = StateTree {
        classes: vec![ClassNode {
            name: "Lines".to_string(),
            override_downtime: "false".to_string(),
            roles: RolesFragment::Absent,
            children: vec![Node::State(StateNode {
                code: "5".to_string(),
                ..StateNode::new("Starved")
            })],
        }],
    };
    let mut table = flatten(&tree).expect("tree flattened");

    // Orphan: its parent path is never produced during the walk.
    let mut orphan = table.rows()[1].clone();
    orphan.parent = "~/Lines/Missing".to_string();
    orphan.path = "~/Lines/Missing/Orphan".to_string();
    orphan.name = "Orphan".to_string();
    table.push(orphan);
    table.sort_by_path();

    let failure = reconstruct(&table).expect_err("reconstruction must fail");
    assert_eq!(failure.index, 2);
    assert_eq!(failure.parent, "~/Lines/Missing");
    assert_eq!(failure.path, "~/Lines/Missing/Orphan");
    assert_eq!(failure.partial.classes.len(), 1);
}

#[test]
fn validation_gate_refuses_markup_export() {
    let temp_dir = tempdir().expect("temporary directory");

    let csv_path = temp_dir.path().join("broken.csv");
    fs::write(
        &csv_path,
        "NodeType,StateClass,Name,Code,Parent\n\
         EquipmentStateClass,,LineDown,,~\n\
         EquipmentState,LineDown,Starved,5,~/LineDown\n\
         EquipmentState,LineDown,Starved,6,~/LineDown\n",
    )
    .expect("CSV written");

    let xml_path = temp_dir.path().join("export.xml");
    let outcome = sync::csv_to_xml(&csv_path, &xml_path).expect("conversion ran");

    match outcome {
        SyncOutcome::Rejected {
            annotated,
            findings,
        } => {
            assert!(!findings.is_empty());
            assert!(annotated.exists());
            assert!(!xml_path.exists());
            let written = fs::read_to_string(&annotated).expect("annotated table read");
            assert!(written.contains("Duplicate Path"));
        }
        SyncOutcome::Written { .. } => panic!("markup export should have been refused"),
    }
}

#[test]
fn clean_csv_converts_to_markup() {
    let temp_dir = tempdir().expect("temporary directory");

    let tree = xml_read::parse_markup(SAMPLE_EXPORT).expect("markup parsed");
    let table = flatten(&tree).expect("tree flattened");
    let csv_path = temp_dir.path().join("states.csv");
    csv_file::write_table(&csv_path, &table).expect("CSV written");

    let xml_path = temp_dir.path().join("export.xml");
    let outcome = sync::csv_to_xml(&csv_path, &xml_path).expect("conversion ran");

    assert!(matches!(outcome, SyncOutcome::Written { ref findings } if findings.is_empty()));
    let restored = xml_read::read_tree(&xml_path).expect("markup re-read");
    assert_eq!(flatten(&restored).expect("restored flattened"), table);
}

#[test]
fn wrong_root_element_is_a_schema_error() {
    let error = xml_read::parse_markup("<WrongRoot></WrongRoot>").expect_err("must fail");
    assert!(error.to_string().contains("WrongRoot"));

    let error = xml_read::parse_markup(
        "<EquipmentStateRoot><EquipmentStateClass>\
         <OverrideCurrentLineDowntime>false</OverrideCurrentLineDowntime>\
         </EquipmentStateClass></EquipmentStateRoot>",
    )
    .expect_err("a class without a name must fail");
    assert!(error.to_string().contains("Name"));

    assert_eq!(NodeType::State.tag(), "EquipmentState");
}
