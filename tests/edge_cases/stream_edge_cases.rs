//! Edge cases of diff streams and their compilation

use crate::common::{row, row_set};
use tabsync::{DiffCodec, DiffToSqlCompiler, Key, TableDiffer, TabsyncError};

fn compile_err(rows: &[tabsync::DiffRow], key: Option<&str>) -> TabsyncError {
    DiffToSqlCompiler::new("t")
        .with_key(key.map(|k| Key::parse(k).unwrap()))
        .compile(rows)
        .unwrap_err()
}

#[test]
fn test_data_before_header() {
    let err = compile_err(&[row("+++", &["1"]), row("@@", &["id"])], None);
    assert!(matches!(err, TabsyncError::MalformedDiff { .. }));
}

#[test]
fn test_second_header() {
    let err = compile_err(&[row("@@", &["id"]), row("@@", &["id"])], None);
    assert!(matches!(err, TabsyncError::MalformedDiff { .. }));
}

#[test]
fn test_cell_count_mismatch() {
    let err = compile_err(&[row("@@", &["id", "name"]), row("+++", &["1"])], None);
    assert!(matches!(err, TabsyncError::MalformedDiff { .. }));
}

#[test]
fn test_key_missing_from_header() {
    let err = compile_err(&[row("@@", &["id", "name"]), row("+++", &["1", "a"])], Some("uid"));
    assert!(matches!(err, TabsyncError::MalformedDiff { .. }));
}

#[test]
fn test_tag_repeated_inside_cell() {
    let err = compile_err(&[row("@@", &["id", "name"]), row("->", &["1", "a->b->c"])], None);
    assert!(matches!(err, TabsyncError::MalformedDiff { .. }));
}

#[test]
fn test_key_column_change_uses_old_key() {
    let groups = DiffToSqlCompiler::new("t")
        .with_key(Some(Key::parse("id").unwrap()))
        .compile(&[row("@@", &["id", "name", "age"]), row("->", &["1->2", "a->b", "30"])])
        .unwrap();
    assert_eq!(groups[0].sql(), "update t set name = ? where id = ?");
    assert_eq!(groups[0].rows, vec![vec!["b", "1"]]);
}

#[test]
fn test_schema_change_beats_malformed_rows() {
    let err = compile_err(&[row("+++", &["1"]), row("!", &[])], None);
    assert!(err.is_schema_change());
}

#[test]
fn test_update_without_changes_is_dropped() {
    let groups = DiffToSqlCompiler::new("t")
        .compile(&[row("@@", &["id", "name"]), row("->", &["1", "a"])])
        .unwrap();
    assert!(groups.is_empty());
}

#[test]
fn test_header_only_stream() {
    let groups = DiffToSqlCompiler::new("t")
        .compile(&[row("@@", &["id", "name"])])
        .unwrap();
    assert!(groups.is_empty());
    assert!(DiffToSqlCompiler::new("t").compile(&[]).unwrap().is_empty());
}

#[test]
fn test_differ_reports_schema_change() {
    let old = row_set(&["id", "name"], &[&["1", "a"]]);
    let new = row_set(&["id", "email"], &[&["1", "a@x"]]);
    let err = TableDiffer::new().diff(&old, &new).unwrap_err();
    assert!(err.is_schema_change());
}

#[test]
fn test_differ_aligns_reordered_columns() {
    let old = row_set(&["id", "name"], &[&["1", "a"]]);
    let new = row_set(&["name", "id"], &[&["b", "1"]]);
    let rows = TableDiffer::new()
        .with_key(Some(Key::parse("id").unwrap()))
        .diff(&old, &new)
        .unwrap();
    assert_eq!(rows[0].cells, vec!["id", "name"]);
    assert_eq!(rows[1].cells, vec!["1", "a->b"]);
}

#[test]
fn test_differ_picks_longer_tag_for_arrow_values() {
    let old = row_set(&["id", "arrow"], &[&["1", "->"]]);
    let new = row_set(&["id", "arrow"], &[&["1", "-->"]]);
    let rows = TableDiffer::new()
        .with_key(Some(Key::parse("id").unwrap()))
        .diff(&old, &new)
        .unwrap();
    assert_eq!(rows[1].tag.as_str(), "--->");
    assert_eq!(rows[1].cells, vec!["1", "->--->-->"]);

    let groups = DiffToSqlCompiler::new("t")
        .with_key(Some(Key::parse("id").unwrap()))
        .compile(&rows)
        .unwrap();
    assert_eq!(groups[0].rows, vec![vec!["-->", "1"]]);
}

#[test]
fn test_crlf_and_unicode_cells_survive_framing() {
    let codec = DiffCodec::default();
    let original = row("+++", &["1", "line one\r\nline two", "Привет, мир"]);
    let line = codec.encode(&original).unwrap();
    assert_eq!(codec.decode(&line).unwrap(), original);
}

