//! Compilation of diff streams into batched, parameterized SQL
//!
//! Inserts share one statement, deletes share one statement, and updates are
//! bucketed by their shape: the ordered set of non-key columns they change.
//! Each bucket becomes one statement executed with a batch of parameter rows.

use crate::error::{Result, TabsyncError};
use crate::model::{Column, DiffRow, Header, Key, RowTag};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Kind of statement a group executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Insert,
    Delete,
    Update,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert => f.write_str("insert"),
            Self::Delete => f.write_str("delete"),
            Self::Update => f.write_str("update"),
        }
    }
}

/// One statement template plus the batch of parameter rows it runs with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementGroup {
    pub table: String,
    pub kind: StatementKind,
    /// Inserted columns, or the SET list of an update
    pub assignments: Vec<Column>,
    /// WHERE columns of a delete or update
    pub predicate: Vec<Column>,
    pub rows: Vec<Vec<String>>,
}

impl StatementGroup {
    fn new(table: &str, kind: StatementKind, assignments: Vec<Column>, predicate: Vec<Column>) -> Self {
        Self {
            table: table.to_string(),
            kind,
            assignments,
            predicate,
            rows: Vec::new(),
        }
    }

    /// Columns in placeholder order; a column used in SET and WHERE appears twice
    pub fn parameter_columns(&self) -> Vec<&Column> {
        self.assignments.iter().chain(self.predicate.iter()).collect()
    }

    /// Parameter header as echoed to the user, typed labels preserved
    pub fn parameter_labels(&self, typed: bool) -> Vec<String> {
        self.parameter_columns()
            .into_iter()
            .map(|c| c.label(typed))
            .collect()
    }

    /// Statement text with one `?` per parameter column
    pub fn sql(&self) -> String {
        self.render("=")
    }

    /// Same statement with `IS NOT DISTINCT FROM` predicates, so that a NULL
    /// parameter matches a NULL column
    pub fn null_safe_sql(&self) -> String {
        self.render("IS NOT DISTINCT FROM")
    }

    fn render(&self, compare: &str) -> String {
        let predicate = || {
            self.predicate
                .iter()
                .map(|c| format!("{} {} ?", c.name, compare))
                .collect::<Vec<_>>()
                .join(" and ")
        };

        match self.kind {
            StatementKind::Insert => format!(
                "insert into {} ({}) values ({})",
                self.table,
                self.assignments
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                vec!["?"; self.assignments.len()].join(", ")
            ),
            StatementKind::Delete => format!("delete from {} where {}", self.table, predicate()),
            StatementKind::Update => format!(
                "update {} set {} where {}",
                self.table,
                self.assignments
                    .iter()
                    .map(|c| format!("{} = ?", c.name))
                    .collect::<Vec<_>>()
                    .join(", "),
                predicate()
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Insert,
    Delete,
    Update(Vec<usize>),
}

/// Header state fixed by the `@@` row
struct StreamHeader {
    header: Header,
    key_positions: Option<Vec<usize>>,
}

impl StreamHeader {
    fn predicate_positions(&self) -> Vec<usize> {
        match &self.key_positions {
            Some(positions) => positions.clone(),
            None => (0..self.header.len()).collect(),
        }
    }

    fn is_key(&self, pos: usize) -> bool {
        self.key_positions
            .as_ref()
            .is_some_and(|positions| positions.contains(&pos))
    }

    fn columns(&self, positions: &[usize]) -> Vec<Column> {
        positions
            .iter()
            .map(|&pos| self.header.columns[pos].clone())
            .collect()
    }
}

/// Compiles a decoded diff stream into statement groups for one target table
#[derive(Debug, Clone)]
pub struct DiffToSqlCompiler {
    table: String,
    key: Option<Key>,
    typed_header: bool,
}

impl DiffToSqlCompiler {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            key: None,
            typed_header: false,
        }
    }

    pub fn with_key(mut self, key: Option<Key>) -> Self {
        self.key = key;
        self
    }

    pub fn typed_header(mut self, typed_header: bool) -> Self {
        self.typed_header = typed_header;
        self
    }

    /// Compile the stream. Any schema change marker fails the whole call.
    pub fn compile(&self, rows: &[DiffRow]) -> Result<Vec<StatementGroup>> {
        if let Some(pos) = rows.iter().position(|r| r.tag == RowTag::SchemaChange) {
            return Err(TabsyncError::schema_change(format!(
                "diff row {} marks incompatible column sets",
                pos + 1
            )));
        }

        let mut stream: Option<StreamHeader> = None;
        let mut groups: IndexMap<GroupKey, StatementGroup> = IndexMap::new();

        for (idx, row) in rows.iter().enumerate() {
            let line = idx + 1;
            if let RowTag::Skip(_) = row.tag {
                continue;
            }
            if row.is_header() {
                if stream.is_some() {
                    return Err(TabsyncError::malformed_diff(format!(
                        "row {}: header already defined",
                        line
                    )));
                }
                stream = Some(self.read_header(row)?);
                continue;
            }

            let current = stream.as_ref().ok_or_else(|| {
                TabsyncError::malformed_diff(format!("row {}: data row before header", line))
            })?;
            if row.cells.len() != current.header.len() {
                return Err(TabsyncError::malformed_diff(format!(
                    "row {}: expected {} cells, found {}",
                    line,
                    current.header.len(),
                    row.cells.len()
                )));
            }

            match &row.tag {
                RowTag::Insert => {
                    let all: Vec<usize> = (0..current.header.len()).collect();
                    groups
                        .entry(GroupKey::Insert)
                        .or_insert_with(|| {
                            StatementGroup::new(
                                &self.table,
                                StatementKind::Insert,
                                current.columns(&all),
                                Vec::new(),
                            )
                        })
                        .rows
                        .push(row.cells.clone());
                }
                RowTag::Delete => {
                    let predicate = current.predicate_positions();
                    let params = predicate.iter().map(|&pos| row.cells[pos].clone()).collect();
                    groups
                        .entry(GroupKey::Delete)
                        .or_insert_with(|| {
                            StatementGroup::new(
                                &self.table,
                                StatementKind::Delete,
                                Vec::new(),
                                current.columns(&predicate),
                            )
                        })
                        .rows
                        .push(params);
                }
                RowTag::Update(tag) => {
                    let cells = split_update_cells(&row.cells, tag, line)?;
                    // key columns only narrow the predicate, with their old values
                    let shape: Vec<usize> = (0..cells.len())
                        .filter(|&p| cells[p].changed && !current.is_key(p))
                        .collect();
                    if shape.is_empty() {
                        log::debug!("Row {} changes no column, skipping", line);
                        continue;
                    }

                    let predicate = current.predicate_positions();
                    let params = shape
                        .iter()
                        .map(|&pos| cells[pos].after.to_string())
                        .chain(predicate.iter().map(|&pos| cells[pos].before.to_string()))
                        .collect();
                    groups
                        .entry(GroupKey::Update(shape.clone()))
                        .or_insert_with(|| {
                            StatementGroup::new(
                                &self.table,
                                StatementKind::Update,
                                current.columns(&shape),
                                current.columns(&predicate),
                            )
                        })
                        .rows
                        .push(params);
                }
                RowTag::Header | RowTag::Skip(_) | RowTag::SchemaChange => {}
            }
        }

        let groups: Vec<StatementGroup> = groups.into_values().collect();
        log::debug!(
            "Compiled {} diff rows into {} statement groups for '{}'",
            rows.len(),
            groups.len(),
            self.table
        );
        Ok(groups)
    }

    fn read_header(&self, row: &DiffRow) -> Result<StreamHeader> {
        let header = Header::from_labels(&row.cells, self.typed_header);
        let key_positions = match &self.key {
            Some(key) => Some(key.positions(&header).map_err(TabsyncError::malformed_diff)?),
            None => None,
        };
        Ok(StreamHeader {
            header,
            key_positions,
        })
    }
}

struct UpdateCell<'a> {
    before: &'a str,
    after: &'a str,
    changed: bool,
}

/// Split each cell on the row's own tag: one occurrence is a change, none a literal
fn split_update_cells<'a>(cells: &'a [String], tag: &str, line: usize) -> Result<Vec<UpdateCell<'a>>> {
    if tag.is_empty() {
        return Err(TabsyncError::malformed_diff(format!("row {}: empty update tag", line)));
    }

    cells
        .iter()
        .map(|cell| cell.as_str())
        .map(|cell| match cell.matches(tag).count() {
            0 => Ok(UpdateCell {
                before: cell,
                after: cell,
                changed: false,
            }),
            1 => {
                let (before, after) = cell.split_once(tag).unwrap_or((cell, cell));
                Ok(UpdateCell {
                    before,
                    after,
                    changed: true,
                })
            }
            n => Err(TabsyncError::malformed_diff(format!(
                "row {}: cell '{}' contains update tag '{}' {} times",
                line, cell, tag, n
            ))),
        })
        .collect()
}
