//! Output formatting utilities

use crate::codec::DiffCodec;
use crate::error::Result;
use crate::sql::StatementGroup;
use crate::sync::SyncReport;
use std::io::Write;

/// Output format of compiled statement groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Statement row, parameter header row, parameter rows; groups separated by a blank line
    Sql,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "sql" => Ok(Self::Sql),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {}. Use 'sql' or 'json'", s)),
        }
    }
}

/// Writes statement groups in the delimited `diff2sql` layout
pub struct GroupWriter {
    codec: DiffCodec,
    typed_header: bool,
}

impl GroupWriter {
    pub fn new(codec: DiffCodec, typed_header: bool) -> Self {
        Self {
            codec,
            typed_header,
        }
    }

    /// The statement line is written raw; labels and parameter rows are framed
    pub fn write<W: Write>(&self, mut writer: W, groups: &[StatementGroup]) -> Result<()> {
        for (idx, group) in groups.iter().enumerate() {
            if idx > 0 {
                writeln!(writer)?;
            }
            writeln!(writer, "{}", group.sql())?;
            let mut records: Vec<Vec<String>> = Vec::with_capacity(group.rows.len() + 1);
            records.push(group.parameter_labels(self.typed_header));
            records.extend(group.rows.iter().cloned());
            self.codec.write_records(&mut writer, records)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn format_groups(groups: &[StatementGroup]) -> Result<String> {
        let value: Vec<serde_json::Value> = groups
            .iter()
            .map(|g| {
                serde_json::json!({
                    "table": g.table,
                    "kind": g.kind,
                    "sql": g.sql(),
                    "parameters": g.parameter_columns().iter().map(|c| &c.name).collect::<Vec<_>>(),
                    "rows": g.rows,
                })
            })
            .collect();
        Ok(serde_json::to_string_pretty(&value)?)
    }

    pub fn format_sync_report(report: &SyncReport) -> Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }
}

/// Pretty printer for tabsync output
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Print a summary of a sync run
    pub fn print_sync_report(report: &SyncReport) {
        println!("{}", Self::format_sync_report(report));
    }

    pub fn format_sync_report(report: &SyncReport) -> String {
        let mut out = String::new();
        let title = if report.is_dry_run() {
            "🔍 Sync dry run"
        } else {
            "🔄 Sync"
        };
        out.push_str(&format!("{} → {}\n", title, report.target_table));
        out.push_str(&format!(
            "├─ Rows read: {} source, {} destination\n",
            report.source_rows, report.dest_rows
        ));

        if report.diff.is_empty() {
            out.push_str("└─ ✅ Already in sync");
            return out;
        }

        out.push_str(&format!(
            "├─ Changes: {} inserts, {} deletes, {} updates\n",
            report.diff.inserts, report.diff.deletes, report.diff.updates
        ));
        for group in &report.groups {
            out.push_str(&format!("│  ├─ {} ({} rows)\n", group.sql(), group.rows.len()));
        }
        match &report.applied {
            Some(applied) => out.push_str(&format!(
                "└─ ✅ Applied {} statement groups, {} rows",
                applied.groups,
                applied.rows()
            )),
            None => out.push_str("└─ 💡 Nothing applied (dry run)"),
        }
        out
    }
}
