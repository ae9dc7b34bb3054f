//! Row correlation between two row-sets
//!
//! Rows are matched by the tuple of their key values, or by the whole row when
//! no key is given. Duplicated key values pair up positionally: the first
//! occurrence on the old side goes with the first on the new side, and so on.
//! Whatever is left over on either side becomes a plain delete or insert.

use crate::error::{Result, TabsyncError};
use crate::model::{DiffRow, Header, Key, RowSet, RowTag, DEFAULT_UPDATE_TAG};
use indexmap::IndexMap;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;

/// Computes the diff stream that turns an old row-set into a new one
#[derive(Debug, Clone, Default)]
pub struct TableDiffer {
    key: Option<Key>,
    typed_header: bool,
}

impl TableDiffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, key: Option<Key>) -> Self {
        self.key = key;
        self
    }

    pub fn typed_header(mut self, typed_header: bool) -> Self {
        self.typed_header = typed_header;
        self
    }

    /// Diff `old` against `new`. The first returned row is always the header.
    pub fn diff(&self, old: &RowSet, new: &RowSet) -> Result<Vec<DiffRow>> {
        check_schema(&old.header, &new.header)?;

        let header = &old.header;
        let width = header.len();
        let key_positions = match &self.key {
            Some(key) => key.positions(header).map_err(TabsyncError::configuration)?,
            None => (0..width).collect(),
        };
        let value_positions: Vec<usize> = (0..width)
            .filter(|pos| !key_positions.contains(pos))
            .collect();

        check_widths("old", &old.rows, width)?;
        check_widths("new", &new.rows, width)?;
        let new_rows = align_columns(header, new)?;

        // Number of rows per key value on the old side
        let mut old_counts: HashMap<Vec<&str>, usize> = HashMap::new();
        for row in &old.rows {
            *old_counts.entry(key_of(row, &key_positions)).or_default() += 1;
        }

        // Occurrences of each key value on the new side, in encounter order
        let mut new_index: IndexMap<Vec<&str>, Vec<usize>> = IndexMap::new();
        for (idx, row) in new_rows.iter().enumerate() {
            new_index
                .entry(key_of(row, &key_positions))
                .or_default()
                .push(idx);
        }

        let mut rows = vec![DiffRow::header(header, self.typed_header)];

        let mut seen: HashMap<Vec<&str>, usize> = HashMap::new();
        for old_row in &old.rows {
            let key = key_of(old_row, &key_positions);
            let occurrence = seen.entry(key.clone()).or_default();
            let partner = new_index
                .get(&key)
                .and_then(|occurrences| occurrences.get(*occurrence))
                .map(|&idx| &new_rows[idx]);
            *occurrence += 1;

            match partner {
                Some(new_row) => {
                    let changed = value_positions
                        .iter()
                        .any(|&pos| old_row[pos] != new_row[pos]);
                    if changed {
                        rows.push(update_row(old_row, new_row, &value_positions));
                    }
                }
                None => rows.push(DiffRow::delete(old_row.clone())),
            }
        }

        // Occurrences beyond what the old side holds are inserts, in new order
        let mut new_seen: HashMap<Vec<&str>, usize> = HashMap::new();
        for new_row in new_rows.iter() {
            let key = key_of(new_row, &key_positions);
            let paired = old_counts.get(&key).copied().unwrap_or(0);
            let occurrence = new_seen.entry(key).or_default();
            if *occurrence >= paired {
                rows.push(DiffRow::insert(new_row.clone()));
            }
            *occurrence += 1;
        }

        let stats = DiffStats::from_rows(&rows);
        log::debug!(
            "Diffed {} old rows against {} new rows: {} inserts, {} deletes, {} updates",
            old.len(),
            new.len(),
            stats.inserts,
            stats.deletes,
            stats.updates
        );

        Ok(rows)
    }
}

/// Counts of each row kind in a diff stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub inserts: usize,
    pub deletes: usize,
    pub updates: usize,
}

impl DiffStats {
    pub fn from_rows(rows: &[DiffRow]) -> Self {
        let mut stats = Self::default();
        for row in rows {
            match row.tag {
                RowTag::Insert => stats.inserts += 1,
                RowTag::Delete => stats.deletes += 1,
                RowTag::Update(_) => stats.updates += 1,
                _ => {}
            }
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.inserts + self.deletes + self.updates
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Pick the shortest `-…->` separator that occurs in none of the cells
pub fn choose_update_tag(old_row: &[String], new_row: &[String]) -> String {
    let mut tag = DEFAULT_UPDATE_TAG.to_string();
    while old_row
        .iter()
        .chain(new_row.iter())
        .any(|cell| cell.contains(&tag))
    {
        tag.insert(0, '-');
    }
    tag
}

fn update_row(old_row: &[String], new_row: &[String], value_positions: &[usize]) -> DiffRow {
    let tag = choose_update_tag(old_row, new_row);
    let cells = old_row
        .iter()
        .zip(new_row)
        .enumerate()
        .map(|(pos, (before, after))| {
            if before != after && value_positions.contains(&pos) {
                format!("{}{}{}", before, tag, after)
            } else {
                before.clone()
            }
        })
        .collect();
    DiffRow::new(RowTag::Update(tag), cells)
}

fn key_of<'a>(row: &'a [String], positions: &[usize]) -> Vec<&'a str> {
    positions.iter().map(|&pos| row[pos].as_str()).collect()
}

fn check_schema(old: &Header, new: &Header) -> Result<()> {
    // compared as multisets so repeated names must repeat equally often
    let mut old_names = old.names();
    let mut new_names = new.names();
    old_names.sort_unstable();
    new_names.sort_unstable();
    if old_names == new_names {
        return Ok(());
    }

    Err(TabsyncError::schema_change(format!(
        "column sets differ (old: [{}], new: [{}])",
        old.names().join(", "),
        new.names().join(", ")
    )))
}

fn check_widths(side: &str, rows: &[Vec<String>], width: usize) -> Result<()> {
    if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
        return Err(TabsyncError::malformed_diff(format!(
            "{} row {} has {} cells, header has {}",
            side,
            idx + 1,
            row.len(),
            width
        )));
    }
    Ok(())
}

/// Reorder the new side's cells into the old header's column order
fn align_columns<'a>(header: &Header, new: &'a RowSet) -> Result<Cow<'a, [Vec<String>]>> {
    // a repeated name takes the next unused column of that name
    let mut taken = vec![false; new.header.len()];
    let permutation = header
        .columns
        .iter()
        .map(|c| {
            let pos = (0..new.header.len())
                .find(|&p| !taken[p] && new.header.columns[p].name == c.name)
                .ok_or_else(|| {
                    TabsyncError::schema_change(format!("column '{}' missing from new side", c.name))
                })?;
            taken[pos] = true;
            Ok(pos)
        })
        .collect::<Result<Vec<usize>>>()?;

    if permutation.iter().enumerate().all(|(i, &p)| i == p) {
        return Ok(Cow::Borrowed(&new.rows));
    }

    log::debug!("Reordering new side columns to match old header");
    Ok(Cow::Owned(
        new.rows
            .iter()
            .map(|row| permutation.iter().map(|&p| row[p].clone()).collect())
            .collect(),
    ))
}
