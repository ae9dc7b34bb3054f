//! Textual framing of diff streams
//!
//! The codec only frames rows: it picks the delimiter, quotes cells that need
//! it and restores them byte for byte. Update cells are never split here.

use crate::error::{Result, TabsyncError};
use crate::model::{DiffRow, RowTag};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Cell delimiter of a diff stream, fixed for the whole stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
}

impl Delimiter {
    pub fn from_tab_flag(tab: bool) -> Self {
        if tab {
            Self::Tab
        } else {
            Self::Comma
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Self::Comma => b',',
            Self::Tab => b'\t',
        }
    }
}

/// Encoder/decoder for tagged diff rows
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffCodec {
    delimiter: Delimiter,
}

impl DiffCodec {
    pub fn new(delimiter: Delimiter) -> Self {
        Self { delimiter }
    }

    /// Encode one row as a line, terminator included
    pub fn encode(&self, row: &DiffRow) -> Result<String> {
        let mut buf = Vec::new();
        self.write_rows(&mut buf, std::slice::from_ref(row))?;
        String::from_utf8(buf).map_err(|e| {
            TabsyncError::malformed_diff(format!("encoded row is not valid UTF-8: {}", e))
        })
    }

    /// Decode exactly one framed row
    pub fn decode(&self, line: &str) -> Result<DiffRow> {
        let mut rows = self.read_rows(line.as_bytes())?;
        match rows.len() {
            1 => Ok(rows.remove(0)),
            0 => Err(TabsyncError::malformed_diff("empty line")),
            n => Err(TabsyncError::malformed_diff(format!(
                "expected a single row, found {}",
                n
            ))),
        }
    }

    /// Write rows as a diff stream
    pub fn write_rows<W: Write>(&self, writer: W, rows: &[DiffRow]) -> Result<()> {
        let mut records = self.record_writer(writer);
        for row in rows {
            records.write_record(
                std::iter::once(row.tag.as_str()).chain(row.cells.iter().map(String::as_str)),
            )?;
        }
        records.flush()?;
        Ok(())
    }

    /// Write plain records with this codec's framing, no tag interpretation
    pub fn write_records<W, R, S>(&self, writer: W, records: R) -> Result<()>
    where
        W: Write,
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let mut out = self.record_writer(writer);
        for record in records {
            out.write_record(record)?;
        }
        out.flush()?;
        Ok(())
    }

    /// Read a complete diff stream
    pub fn read_rows<R: Read>(&self, reader: R) -> Result<Vec<DiffRow>> {
        let mut records = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter.as_byte())
            .from_reader(reader);

        let mut rows = Vec::new();
        for (index, record) in records.records().enumerate() {
            let record = record.map_err(|e| {
                TabsyncError::malformed_diff(format!("row {}: {}", index + 1, e))
            })?;

            let mut fields = record.iter();
            let tag = match fields.next() {
                Some(tag) => RowTag::parse(tag),
                None => continue,
            };
            rows.push(DiffRow::new(tag, fields.map(str::to_string).collect()));
        }

        log::debug!("Decoded {} diff rows", rows.len());
        Ok(rows)
    }

    fn record_writer<W: Write>(&self, writer: W) -> csv::Writer<W> {
        csv::WriterBuilder::new()
            .flexible(true)
            .delimiter(self.delimiter.as_byte())
            .quote_style(csv::QuoteStyle::Necessary)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer)
    }
}
