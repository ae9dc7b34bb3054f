//! Command implementations for tabsync CLI

use crate::cli::{Commands, StreamOptions};
use crate::codec::DiffCodec;
use crate::config::EngineConfig;
use crate::data::DuckDbStore;
use crate::differ::TableDiffer;
use crate::error::{Result, TabsyncError};
use crate::model::{DiffRow, Key};
use crate::output::{GroupWriter, JsonFormatter, OutputFormat, PrettyPrinter};
use crate::patch::PatchApplier;
use crate::sql::DiffToSqlCompiler;
use crate::sync::{SourceRef, SyncOrchestrator};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Execute a command
pub fn execute_command(command: Commands, config: EngineConfig) -> Result<()> {
    match command {
        Commands::Diff {
            db1,
            db2,
            source1,
            source2,
            stream,
            output,
        } => {
            let config = apply_stream_options(config, &stream)?;
            diff_command(&config, &db1, &db2, &source1, source2.as_deref(), output.as_deref())
        }
        Commands::Diff2sql {
            table,
            stream,
            input,
            format,
        } => {
            let config = apply_stream_options(config, &stream)?;
            let format = OutputFormat::parse(&format).map_err(TabsyncError::configuration)?;
            diff2sql_command(&config, &table, input.as_deref(), format)
        }
        Commands::Patch {
            db,
            table,
            stream,
            input,
        } => {
            let config = apply_stream_options(config, &stream)?;
            patch_command(&config, &db, &table, input.as_deref())
        }
        Commands::Sync {
            src_db,
            dest_db,
            source,
            dest,
            target_table,
            stream,
            dry_run,
            json,
        } => {
            let config = apply_stream_options(config, &stream)?.with_target_table(target_table);
            sync_command(&config, &src_db, &dest_db, &source, dest.as_deref(), dry_run, json)
        }
    }
}

/// Merge command-line flags over the loaded configuration
fn apply_stream_options(config: EngineConfig, stream: &StreamOptions) -> Result<EngineConfig> {
    let key = stream.key.as_deref().map(Key::parse).transpose()?;
    let config = config
        .with_key(key)
        .with_typed_header(stream.typed_header)
        .with_tab_delimiter(stream.tab);
    config.validate()?;
    Ok(config)
}

/// Diff two sources and write the diff stream
fn diff_command(
    config: &EngineConfig,
    db1: &str,
    db2: &str,
    source1: &str,
    source2: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let old_ref = SourceRef::parse(source1);
    let new_ref = SourceRef::parse(source2.unwrap_or(source1));

    // each store is closed before the next opens, so db1 and db2 may be the same file
    let old = DuckDbStore::open(db1)?.read(&old_ref)?;
    let new = DuckDbStore::open(db2)?.read(&new_ref)?;

    let rows = TableDiffer::new()
        .with_key(config.key.clone())
        .typed_header(config.typed_header)
        .diff(&old, &new)?;

    let codec = DiffCodec::new(config.delimiter);
    match output {
        Some(path) => codec.write_rows(BufWriter::new(File::create(path)?), &rows)?,
        None => codec.write_rows(io::stdout().lock(), &rows)?,
    }
    Ok(())
}

/// Compile a diff stream and print the statement groups
fn diff2sql_command(
    config: &EngineConfig,
    table: &str,
    input: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let rows = read_diff(config, input)?;
    let groups = DiffToSqlCompiler::new(table)
        .with_key(config.key.clone())
        .typed_header(config.typed_header)
        .compile(&rows)?;

    match format {
        OutputFormat::Sql => {
            let writer = GroupWriter::new(DiffCodec::new(config.delimiter), config.typed_header);
            writer.write(io::stdout().lock(), &groups)?;
        }
        OutputFormat::Json => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", JsonFormatter::format_groups(&groups)?)?;
        }
    }
    Ok(())
}

/// Compile a diff stream and apply it to a table
fn patch_command(config: &EngineConfig, db: &str, table: &str, input: Option<&Path>) -> Result<()> {
    let rows = read_diff(config, input)?;
    // labels are always read as `name type`; a bare name is a column without a type
    let groups = DiffToSqlCompiler::new(table)
        .with_key(config.key.clone())
        .typed_header(true)
        .compile(&rows)?;

    let store = DuckDbStore::open(db)?;
    let mut applier = PatchApplier::new(store).show_progress(config.progress);
    let report = applier.apply(&groups)?;
    log::info!("Patched '{}' with {} rows", table, report.rows());
    Ok(())
}

/// Synchronize a destination table with a source
fn sync_command(
    config: &EngineConfig,
    src_db: &str,
    dest_db: &str,
    source: &str,
    dest: Option<&str>,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let source_ref = SourceRef::parse(source);
    let dest_ref = SourceRef::parse(dest.unwrap_or(source));

    let orchestrator = SyncOrchestrator::new(config.clone()).dry_run(dry_run);
    // reject a query destination without a target table before opening anything
    orchestrator.target_table(&dest_ref)?;

    let mut source_store = DuckDbStore::open(src_db)?;
    let report = if same_database(src_db, dest_db) {
        orchestrator.sync_same_store(&mut source_store, &source_ref, &dest_ref)?
    } else {
        let mut dest_store = DuckDbStore::open(dest_db)?;
        orchestrator.sync(&mut source_store, &source_ref, &mut dest_store, &dest_ref)?
    };

    if json {
        println!("{}", JsonFormatter::format_sync_report(&report)?);
    } else {
        PrettyPrinter::print_sync_report(&report);
    }
    Ok(())
}

/// Whether two database arguments name the same file. In-memory databases are
/// never shared between two opens.
fn same_database(a: &str, b: &str) -> bool {
    if a == ":memory:" || b == ":memory:" {
        return false;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => Path::new(a) == Path::new(b),
    }
}

/// Read and decode a diff stream from a file or stdin
fn read_diff(config: &EngineConfig, input: Option<&Path>) -> Result<Vec<DiffRow>> {
    let codec = DiffCodec::new(config.delimiter);
    let reader: Box<dyn Read> = match input {
        Some(path) => Box::new(BufReader::new(File::open(path).map_err(|e| {
            TabsyncError::configuration(format!("Failed to open diff '{}': {}", path.display(), e))
        })?)),
        None => Box::new(io::stdin().lock()),
    };
    codec.read_rows(reader)
}
