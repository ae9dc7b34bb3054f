//! Applying diff streams to DuckDB tables through the CLI

use crate::common::{sample_data, CliTestRunner};

#[test]
fn test_patch_applies_all_kinds() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let db = fixture
        .create_db(
            "dest.db",
            &sample_data::people_db("people", &[("1", "john", "50"), ("2", "bill", "40")]),
        )
        .unwrap();
    let diff = fixture
        .create_diff(
            "d.csv",
            "@@,id,name,age\n---,2,bill,40\n->,1,john->jon,50->51\n+++,3,ann,30\n",
        )
        .unwrap();

    runner.expect_success(&["patch", &db, "people", "--input", diff.to_str().unwrap()]);

    let mut rows = fixture.read(&db, "people").unwrap().rows;
    rows.sort();
    assert_eq!(rows, vec![vec!["1", "jon", "51"], vec!["3", "ann", "30"]]);
}

#[test]
fn test_patch_reads_typed_header_without_flag() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let db = fixture
        .create_db(
            "dest.db",
            "CREATE TABLE tbl (id INTEGER, name VARCHAR); INSERT INTO tbl VALUES (1, 'john');",
        )
        .unwrap();
    let diff = fixture
        .create_diff("d.csv", "@@,id integer,name\n---,1,john\n+++,2,bill\n")
        .unwrap();

    runner.expect_success(&["patch", &db, "tbl", "--input", diff.to_str().unwrap()]);

    let rows = fixture.read(&db, "tbl").unwrap();
    assert_eq!(rows.rows, vec![vec!["2", "bill"]]);
}

#[test]
fn test_patch_with_typed_header() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let db = fixture
        .create_db("dest.db", &sample_data::people_db("people", &[]))
        .unwrap();
    let diff = fixture
        .create_diff("d.csv", "@@,id varchar,name,age varchar\n+++,1,john,50\n")
        .unwrap();

    runner.expect_success(&[
        "patch",
        &db,
        "people",
        "--typed-header",
        "--input",
        diff.to_str().unwrap(),
    ]);

    let rows = fixture.read(&db, "people").unwrap();
    assert_eq!(rows.rows, vec![vec!["1", "john", "50"]]);
}

#[test]
fn test_patch_schema_change_leaves_table_untouched() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let db = fixture
        .create_db("dest.db", &sample_data::people_db("people", &[("1", "john", "50")]))
        .unwrap();
    let diff = fixture
        .create_diff("d.csv", "@@,id,name,age\n---,1,john,50\n!,,,+++\n")
        .unwrap();

    let error = runner.expect_failure(&["patch", &db, "people", "--input", diff.to_str().unwrap()]);
    assert!(error.is_schema_change());

    let rows = fixture.read(&db, "people").unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn test_patch_missing_table_reports_store_error() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let db = fixture
        .create_db("dest.db", &sample_data::people_db("people", &[]))
        .unwrap();
    let diff = fixture
        .create_diff("d.csv", "@@,id,name,age\n+++,1,john,50\n")
        .unwrap();

    let error = runner.expect_failure(&["patch", &db, "missing", "--input", diff.to_str().unwrap()]);
    assert!(matches!(error, tabsync::TabsyncError::StoreExecution { .. }));
}

#[test]
fn test_patch_missing_input_file() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let db = fixture
        .create_db("dest.db", &sample_data::people_db("people", &[]))
        .unwrap();
    let missing = fixture.root().join("nope.csv");

    let error = runner.expect_failure(&["patch", &db, "people", "--input", missing.to_str().unwrap()]);
    assert!(error.to_string().contains("nope.csv"));
}
