//! Diff stream compilation into grouped statements

use crate::common::row;
use tabsync::output::GroupWriter;
use tabsync::{Delimiter, DiffCodec, DiffToSqlCompiler, Key, StatementKind};

#[test]
fn test_update_without_key_uses_all_old_values() {
    let rows = vec![
        row("@@", &["id", "name", "age"]),
        row("->", &["1", "john->bill", "50->60"]),
    ];
    let groups = DiffToSqlCompiler::new("t").compile(&rows).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(
        groups[0].sql(),
        "update t set name = ?, age = ? where id = ? and name = ? and age = ?"
    );
    assert_eq!(groups[0].rows, vec![vec!["bill", "60", "1", "john", "50"]]);
}

#[test]
fn test_update_with_key_narrows_predicate() {
    let rows = vec![
        row("@@", &["id", "name", "age"]),
        row("->", &["1", "john->bill", "50->60"]),
    ];
    let groups = DiffToSqlCompiler::new("t")
        .with_key(Some(Key::parse("id").unwrap()))
        .compile(&rows)
        .unwrap();

    assert_eq!(groups[0].sql(), "update t set name = ?, age = ? where id = ?");
    assert_eq!(groups[0].rows, vec![vec!["bill", "60", "1"]]);
}

#[test]
fn test_schema_change_anywhere_fails_compilation() {
    let rows = vec![
        row("@@", &["id", "name"]),
        row("+++", &["1", "john"]),
        row("---", &["2", "bill"]),
        row("!", &["", "+++"]),
    ];
    let err = DiffToSqlCompiler::new("t").compile(&rows).unwrap_err();
    assert!(err.is_schema_change());
    assert!(err.to_string().contains("NotSupported"));
}

#[test]
fn test_interleaved_shapes_form_two_groups() {
    let rows = vec![
        row("@@", &["id", "name", "age"]),
        row("->", &["1", "a->b", "1"]),
        row("->", &["2", "c", "2->3"]),
        row("->", &["3", "d->e", "4"]),
        row("->", &["4", "f", "5->6"]),
    ];
    let groups = DiffToSqlCompiler::new("t")
        .with_key(Some(Key::parse("id").unwrap()))
        .compile(&rows)
        .unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].sql(), "update t set name = ? where id = ?");
    assert_eq!(groups[0].rows, vec![vec!["b", "1"], vec!["e", "3"]]);
    assert_eq!(groups[1].sql(), "update t set age = ? where id = ?");
    assert_eq!(groups[1].rows, vec![vec!["3", "2"], vec!["6", "4"]]);
}

#[test]
fn test_group_order_follows_first_appearance() {
    let rows = vec![
        row("@@", &["id", "name"]),
        row("---", &["9", "zed"]),
        row("+++", &["1", "john"]),
        row("---", &["8", "yan"]),
        row("+++", &["2", "bill"]),
    ];
    let groups = DiffToSqlCompiler::new("t").compile(&rows).unwrap();

    let kinds: Vec<StatementKind> = groups.iter().map(|g| g.kind).collect();
    assert_eq!(kinds, vec![StatementKind::Delete, StatementKind::Insert]);
    assert_eq!(groups[0].rows, vec![vec!["9", "zed"], vec!["8", "yan"]]);
    assert_eq!(groups[1].rows, vec![vec!["1", "john"], vec!["2", "bill"]]);
}

#[test]
fn test_typed_header_is_echoed() {
    let rows = vec![
        row("@@", &["id integer", "name varchar"]),
        row("+++", &["1", "john"]),
    ];
    let groups = DiffToSqlCompiler::new("t")
        .typed_header(true)
        .compile(&rows)
        .unwrap();

    assert_eq!(groups[0].sql(), "insert into t (id, name) values (?, ?)");
    let mut text = Vec::new();
    GroupWriter::new(DiffCodec::new(Delimiter::Tab), true)
        .write(&mut text, &groups)
        .unwrap();
    assert_eq!(
        String::from_utf8(text).unwrap(),
        "insert into t (id, name) values (?, ?)\nid integer\tname varchar\n1\tjohn\n"
    );
}

#[test]
fn test_long_update_tag_splits_on_its_own_text() {
    let rows = vec![
        row("@@", &["id", "arrow"]),
        row("--->", &["1", "->--->-->"]),
    ];
    let groups = DiffToSqlCompiler::new("t")
        .with_key(Some(Key::parse("id").unwrap()))
        .compile(&rows)
        .unwrap();

    assert_eq!(groups[0].rows, vec![vec!["-->", "1"]]);
}

#[test]
fn test_skip_rows_are_ignored() {
    let rows = vec![
        row("@@", &["id", "name"]),
        row("", &["5", "ctx"]),
        row("...", &["...", "..."]),
        row(":", &["6", "moved"]),
        row("+++", &["7", "new"]),
    ];
    let groups = DiffToSqlCompiler::new("t").compile(&rows).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].rows, vec![vec!["7", "new"]]);
}
