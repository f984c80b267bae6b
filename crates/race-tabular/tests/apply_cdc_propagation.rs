use chrono::{TimeZone, Utc};
use race_tabular::{CellKind, CellValue, Column, ColumnDataChange, ColumnId, ColumnList, Node, NodeId, Row, RowId, RowList, UpdateFilterSpec};

fn sample_node() -> Node {
    let columns = ColumnList {
        columns: vec![Column { id: ColumnId::from("/c1"), owner_node: "node-a".into(), update_filter: UpdateFilterSpec::default() }],
    };
    let rows = RowList::new(vec![
        Row { id: RowId::from("/r1"), kind: CellKind::Integer, attrs: vec![], formula: None, min: None, max: None },
        Row { id: RowId::from("/r2"), kind: CellKind::Real, attrs: vec![], formula: None, min: Some(0.0), max: Some(100.0) },
    ]);
    Node::new(NodeId::from("node-a"), None, columns, rows)
}

#[test]
fn applying_a_cdc_stores_its_rows_in_column_data() {
    let mut node = sample_node();
    let mut cdc = ColumnDataChange::new("sensor1", ColumnId::from("/c1"), Utc.timestamp_opt(100, 0).unwrap());
    cdc.push(RowId::from("/r1"), CellValue::Integer(42));
    cdc.push(RowId::from("/r2"), CellValue::Real(55.5));

    let (applied, rejected) = node.apply_cdc(&cdc);
    assert_eq!(applied.len(), 2);
    assert!(rejected.is_empty());

    let data = node.column_data(&ColumnId::from("/c1")).unwrap();
    assert_eq!(data.get(&RowId::from("/r1")).unwrap().value, CellValue::Integer(42));
    assert_eq!(data.get(&RowId::from("/r2")).unwrap().value, CellValue::Real(55.5));
}

#[test]
fn a_write_older_than_the_current_value_is_rejected_not_applied() {
    let mut node = sample_node();
    let mut first = ColumnDataChange::new("sensor1", ColumnId::from("/c1"), Utc.timestamp_opt(100, 0).unwrap());
    first.push(RowId::from("/r1"), CellValue::Integer(1));
    node.apply_cdc(&first);

    let mut stale = ColumnDataChange::new("sensor1", ColumnId::from("/c1"), Utc.timestamp_opt(50, 0).unwrap());
    stale.push(RowId::from("/r1"), CellValue::Integer(2));
    let (applied, rejected) = node.apply_cdc(&stale);

    assert!(applied.is_empty());
    assert_eq!(rejected.len(), 1);
    assert_eq!(node.column_data(&ColumnId::from("/c1")).unwrap().get(&RowId::from("/r1")).unwrap().value, CellValue::Integer(1));
}

#[test]
fn a_write_to_an_unknown_column_is_rejected_wholesale() {
    let mut node = sample_node();
    let mut cdc = ColumnDataChange::new("sensor1", ColumnId::from("/ghost"), Utc.timestamp_opt(1, 0).unwrap());
    cdc.push(RowId::from("/r1"), CellValue::Integer(1));

    let (applied, rejected) = node.apply_cdc(&cdc);
    assert!(applied.is_empty());
    assert_eq!(rejected.len(), 1);
}
