//! Unit tests for CLI argument parsing and validation

use clap::Parser;
use tabsync::cli::{Cli, Commands};

#[test]
fn test_cli_diff_command() {
    let cli = Cli::try_parse_from(["tabsync", "diff", "a.db", "b.db", "people"]).unwrap();
    match cli.command {
        Commands::Diff {
            db1,
            db2,
            source1,
            source2,
            stream,
            output,
        } => {
            assert_eq!(db1, "a.db");
            assert_eq!(db2, "b.db");
            assert_eq!(source1, "people");
            assert!(source2.is_none());
            assert!(stream.key.is_none());
            assert!(!stream.typed_header);
            assert!(!stream.tab);
            assert!(output.is_none());
        }
        _ => panic!("Expected Diff command"),
    }
}

#[test]
fn test_cli_diff_command_with_query_and_options() {
    let cli = Cli::try_parse_from([
        "tabsync",
        "diff",
        "a.db",
        "b.db",
        "people",
        "select * from people where age > 30",
        "--key",
        "id",
        "-t",
        "--typed-header",
    ])
    .unwrap();
    match cli.command {
        Commands::Diff { source2, stream, .. } => {
            assert_eq!(source2.as_deref(), Some("select * from people where age > 30"));
            assert_eq!(stream.key.as_deref(), Some("id"));
            assert!(stream.tab);
            assert!(stream.typed_header);
        }
        _ => panic!("Expected Diff command"),
    }
}

#[test]
fn test_cli_diff2sql_command() {
    let cli = Cli::try_parse_from(["tabsync", "diff2sql", "people", "--input", "d.csv"]).unwrap();
    match cli.command {
        Commands::Diff2sql {
            table,
            input,
            format,
            ..
        } => {
            assert_eq!(table, "people");
            assert_eq!(input.unwrap().to_str(), Some("d.csv"));
            assert_eq!(format, "sql");
        }
        _ => panic!("Expected Diff2sql command"),
    }
}

#[test]
fn test_cli_patch_command() {
    let cli = Cli::try_parse_from(["tabsync", "patch", "dest.db", "people", "--key", "id,name"]).unwrap();
    match cli.command {
        Commands::Patch {
            db, table, stream, ..
        } => {
            assert_eq!(db, "dest.db");
            assert_eq!(table, "people");
            assert_eq!(stream.key.as_deref(), Some("id,name"));
        }
        _ => panic!("Expected Patch command"),
    }
}

#[test]
fn test_cli_sync_command() {
    let cli = Cli::try_parse_from([
        "tabsync",
        "sync",
        "src.db",
        "dest.db",
        "full",
        "select * from empty",
        "--target-table",
        "empty",
        "--dry-run",
        "--json",
    ])
    .unwrap();
    match cli.command {
        Commands::Sync {
            src_db,
            dest_db,
            source,
            dest,
            target_table,
            dry_run,
            json,
            ..
        } => {
            assert_eq!(src_db, "src.db");
            assert_eq!(dest_db, "dest.db");
            assert_eq!(source, "full");
            assert_eq!(dest.as_deref(), Some("select * from empty"));
            assert_eq!(target_table.as_deref(), Some("empty"));
            assert!(dry_run);
            assert!(json);
        }
        _ => panic!("Expected Sync command"),
    }
}

#[test]
fn test_cli_global_flags() {
    let cli = Cli::try_parse_from([
        "tabsync",
        "diff2sql",
        "t",
        "--verbose",
        "--config",
        "engine.json",
    ])
    .unwrap();
    assert!(cli.verbose);
    assert_eq!(cli.config.unwrap().to_str(), Some("engine.json"));
}

#[test]
fn test_cli_rejects_empty_key() {
    assert!(Cli::try_parse_from(["tabsync", "diff2sql", "t", "--key", ""]).is_err());
    assert!(Cli::try_parse_from(["tabsync", "diff2sql", "t", "--key", "id,,name"]).is_err());
}

#[test]
fn test_cli_missing_arguments() {
    assert!(Cli::try_parse_from(["tabsync", "diff", "a.db"]).is_err());
    assert!(Cli::try_parse_from(["tabsync", "patch", "dest.db"]).is_err());
    assert!(Cli::try_parse_from(["tabsync", "sync", "src.db", "dest.db"]).is_err());
}
