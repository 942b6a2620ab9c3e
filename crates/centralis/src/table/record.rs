//! In-memory record table.

use std::io::Write;

use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value as JsonValue};

use crate::error::{CentralisError, Result};

use super::value::Value;

/// An ordered batch of typed rows with named columns.
///
/// Tables change only through whole-column replacement, column
/// addition/removal, header renaming, or whole-row removal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    headers: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RecordTable {
    /// Create a table, padding short rows with nulls and truncating long ones.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Null);
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Create a table with columns but no rows.
    pub fn empty(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Create a table from raw text cells, mapping null markers to nulls.
    pub fn from_text_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| row.iter().map(|cell| Value::from_text(cell)).collect())
            .collect();
        Self::new(headers, rows)
    }

    /// Create a table from JSON objects, one row each.
    ///
    /// Columns are the union of keys in first-seen order; absent keys are null.
    pub fn from_json_records(records: &[Map<String, JsonValue>]) -> Self {
        let mut headers: IndexSet<&str> = IndexSet::new();
        for record in records {
            for key in record.keys() {
                headers.insert(key.as_str());
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                headers
                    .iter()
                    .map(|key| record.get(*key).map(Value::from_json).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        let headers = headers.iter().map(|k| k.to_string()).collect();
        Self::new(headers, rows)
    }

    /// Create a table from either a JSON array of records or a column-oriented
    /// object of the form `{"column": {"0": value, "1": value}}`.
    pub fn from_json(json: &JsonValue) -> Result<Self> {
        match json {
            JsonValue::Array(items) => {
                let records = items
                    .iter()
                    .map(|item| match item {
                        JsonValue::Object(map) => Ok(map.clone()),
                        other => Err(CentralisError::UnexpectedResponse(format!(
                            "expected JSON object per record, got {}",
                            json_kind(other)
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::from_json_records(&records))
            }
            JsonValue::Object(columns) => Self::from_json_columns(columns),
            other => Err(CentralisError::UnexpectedResponse(format!(
                "expected JSON array or object, got {}",
                json_kind(other)
            ))),
        }
    }

    fn from_json_columns(columns: &Map<String, JsonValue>) -> Result<Self> {
        // Row keys are pandas-style index labels; order them numerically when possible.
        let mut row_keys: Vec<String> = Vec::new();
        for cells in columns.values() {
            let JsonValue::Object(cells) = cells else {
                return Err(CentralisError::UnexpectedResponse(format!(
                    "expected column object, got {}",
                    json_kind(cells)
                )));
            };
            for key in cells.keys() {
                if !row_keys.contains(key) {
                    row_keys.push(key.clone());
                }
            }
        }
        row_keys.sort_by(|a, b| match (a.parse::<u64>(), b.parse::<u64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => a.cmp(b),
        });

        let headers: Vec<String> = columns.keys().cloned().collect();
        let rows = row_keys
            .iter()
            .map(|row_key| {
                columns
                    .values()
                    .map(|cells| {
                        cells
                            .get(row_key)
                            .map(Value::from_json)
                            .unwrap_or(Value::Null)
                    })
                    .collect()
            })
            .collect();

        Ok(Self::new(headers, rows))
    }

    /// Concatenate tables (e.g. document pages), unioning their columns.
    pub fn concat(tables: Vec<RecordTable>) -> Self {
        let mut headers: Vec<String> = Vec::new();
        for table in &tables {
            for header in &table.headers {
                if !headers.contains(header) {
                    headers.push(header.clone());
                }
            }
        }

        let mut rows = Vec::new();
        for table in tables {
            let positions: Vec<Option<usize>> = headers
                .iter()
                .map(|h| table.column_index(h))
                .collect();
            for row in table.rows {
                rows.push(
                    positions
                        .iter()
                        .map(|pos| pos.map(|i| row[i].clone()).unwrap_or(Value::Null))
                        .collect(),
                );
            }
        }

        Self::new(headers, rows)
    }

    /// Column headers.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// All rows.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Position of a column, or a schema mismatch naming the stage that needed it.
    pub fn require_column(&self, name: &str, stage: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| CentralisError::SchemaMismatch {
                stage: stage.to_string(),
                column: name.to_string(),
            })
    }

    /// Get all values for a column by index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Get a column by name.
    pub fn column_by_name(&self, name: &str) -> Option<Vec<&Value>> {
        let index = self.column_index(name)?;
        Some(self.column_values(index).collect())
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Get a cell by row position and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        self.get(row, self.column_index(column)?)
    }

    /// Replace a column's values, appending the column if it does not exist.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(CentralisError::ColumnLength {
                column: name.to_string(),
                expected: self.rows.len(),
                actual: values.len(),
            });
        }

        match self.column_index(name) {
            Some(index) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[index] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Remove the named columns. Returns how many were present.
    pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) -> usize {
        let doomed: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| names.iter().any(|n| n.as_ref() == h.as_str()))
            .map(|(i, _)| i)
            .collect();

        for &index in doomed.iter().rev() {
            self.headers.remove(index);
            for row in &mut self.rows {
                row.remove(index);
            }
        }
        doomed.len()
    }

    /// Rename every header through `rename`.
    pub fn rename_headers(&mut self, rename: impl Fn(&str) -> String) {
        for header in &mut self.headers {
            *header = rename(header);
        }
    }

    /// Keep rows for which `keep` returns true. Returns the number removed.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[Value]) -> bool) -> usize {
        let before = self.rows.len();
        self.rows.retain(|row| keep(row));
        before - self.rows.len()
    }

    /// Keep rows whose mask entry is true. Returns the number removed.
    pub fn retain_mask(&mut self, mask: &[bool]) -> Result<usize> {
        if mask.len() != self.rows.len() {
            return Err(CentralisError::ColumnLength {
                column: "<row mask>".to_string(),
                expected: self.rows.len(),
                actual: mask.len(),
            });
        }
        let mut flags = mask.iter();
        Ok(self.retain_rows(|_| flags.next().copied().unwrap_or(false)))
    }

    /// Write the table as CSV with a header row. Nulls become empty cells.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.headers)?;
        for row in &self.rows {
            csv_writer.write_record(row.iter().map(|v| v.to_string()))?;
        }
        csv_writer.flush().map_err(|e| CentralisError::Io {
            path: "<csv output>".into(),
            source: e,
        })?;
        Ok(())
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_json_records(&self) -> Vec<IndexMap<&str, &Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .map(|h| h.as_str())
                    .zip(row.iter())
                    .collect()
            })
            .collect()
    }
}

fn json_kind(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
