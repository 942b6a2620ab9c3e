//! Stage interpreter that runs entity pipelines over record tables.

use chrono::NaiveDate;
use indexmap::IndexMap;
use regex::Regex;

use crate::error::Result;
use crate::schema::{EntityKind, EntitySchema, ParseTarget, ReferenceData, Stage};
use crate::table::{RecordTable, Value};
use crate::validation::{
    WeightClass, card_length_matches, combine_date, extract_price, float_to_integer,
    normalize_phone, parse_date, parse_float, parse_integer, parse_month_year, parse_time_of_day,
    weight_to_kg,
};

use super::report::{CleaningReport, StageOutcome};

/// What applying one stage changed beyond the row count.
#[derive(Debug, Default)]
struct StageEffect {
    values_corrected: usize,
    skipped: bool,
}

impl StageEffect {
    fn skipped() -> Self {
        Self {
            values_corrected: 0,
            skipped: true,
        }
    }
}

/// Engine for cleaning raw tables with the built-in entity schemas.
#[derive(Debug, Clone, Default)]
pub struct CleaningEngine {
    reference: ReferenceData,
}

impl CleaningEngine {
    /// Create an engine backed by the given reference data.
    pub fn new(reference: ReferenceData) -> Self {
        Self { reference }
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// The stage list used for `kind`.
    pub fn schema(&self, kind: EntityKind) -> EntitySchema {
        EntitySchema::for_kind(kind, &self.reference)
    }

    /// Clean a raw table of the given kind.
    pub fn clean(&self, kind: EntityKind, table: &RecordTable) -> Result<RecordTable> {
        self.clean_with_report(kind, table).map(|(cleaned, _)| cleaned)
    }

    /// Clean a raw table and report what every stage did.
    pub fn clean_with_report(
        &self,
        kind: EntityKind,
        table: &RecordTable,
    ) -> Result<(RecordTable, CleaningReport)> {
        self.run(&self.schema(kind), table)
    }

    /// Run an arbitrary stage list. The input table is never modified; a
    /// missing field aborts the run with a schema mismatch.
    pub fn run(
        &self,
        schema: &EntitySchema,
        table: &RecordTable,
    ) -> Result<(RecordTable, CleaningReport)> {
        let mut working = table.clone();
        let mut report = CleaningReport::new(schema.kind, working.row_count());

        for stage in &schema.stages {
            let rows_before = working.row_count();
            let effect = apply_stage(stage, &mut working)?;
            let outcome = StageOutcome {
                stage: stage.name().to_string(),
                description: stage.description(),
                issue: stage.issue_kind(),
                rows_before,
                rows_after: working.row_count(),
                values_corrected: effect.values_corrected,
                skipped: effect.skipped,
            };
            tracing::debug!(
                entity = %schema.kind,
                stage = stage.name(),
                dropped = outcome.rows_dropped(),
                corrected = outcome.values_corrected,
                skipped = outcome.skipped,
                "{}",
                outcome.description
            );
            report.add_stage(outcome);
        }

        tracing::info!(
            entity = %schema.kind,
            rows_in = report.rows_in,
            rows_out = report.rows_out,
            "Cleaned {} records",
            schema.kind
        );

        Ok((working, report))
    }
}

fn apply_stage(stage: &Stage, table: &mut RecordTable) -> Result<StageEffect> {
    let name = stage.name();
    match stage {
        Stage::DropColumns { columns } => {
            table.drop_columns(columns.as_slice());
            Ok(StageEffect::default())
        }

        Stage::PurgeNulls { columns, except } => {
            let indices: Vec<usize> = match columns {
                Some(columns) => columns
                    .iter()
                    .map(|c| table.require_column(c, name))
                    .collect::<Result<Vec<_>>>()?,
                None => (0..table.column_count()).collect(),
            };
            let indices: Vec<usize> = indices
                .into_iter()
                .filter(|&i| !except.contains(&table.headers()[i]))
                .collect();
            table.retain_rows(|row| indices.iter().all(|&i| !row[i].is_null()));
            Ok(StageEffect::default())
        }

        Stage::LowercaseHeaders => {
            table.rename_headers(|h| h.to_lowercase());
            Ok(StageEffect::default())
        }

        Stage::Reparse {
            column,
            target,
            optional,
        } => {
            if *optional && !table.has_column(column) {
                return Ok(StageEffect::skipped());
            }
            let target = *target;
            rewrite_or_drop(table, column, name, |value| reparse(value, target))?;
            Ok(StageEffect::default())
        }

        Stage::CombineDate {
            year,
            month,
            day,
            into,
        } => {
            let components = [year, month, day];
            if table.has_column(into) && components.iter().all(|c| !table.has_column(c)) {
                return Ok(StageEffect::skipped());
            }
            let indices = components
                .iter()
                .map(|c| table.require_column(c, name))
                .collect::<Result<Vec<_>>>()?;

            let combined: Vec<Option<NaiveDate>> = table
                .rows()
                .iter()
                .map(|row| {
                    let part = |i: usize| integer_of(&row[indices[i]]);
                    combine_date(part(0)?, part(1)?, part(2)?)
                })
                .collect();
            keep_some(table, into, combined.into_iter().map(|d| d.map(Value::Date)))?;
            table.drop_columns(&[year, month, day]);
            Ok(StageEffect::default())
        }

        Stage::MatchPattern { column, pattern } => {
            let index = table.require_column(column, name)?;
            let regex = Regex::new(pattern)?;
            table.retain_rows(|row| row[index].to_text().is_some_and(|t| regex.is_match(&t)));
            Ok(StageEffect::default())
        }

        Stage::AllowList { column, values } => {
            let index = table.require_column(column, name)?;
            table.retain_rows(|row| row[index].to_text().is_some_and(|t| values.contains(&t)));
            Ok(StageEffect::default())
        }

        Stage::Correct {
            authority,
            dependent,
            lookup,
        } => correct(table, authority, dependent, lookup, name),

        Stage::NormalizePhone { column } => {
            rewrite_or_drop(table, column, name, |value| {
                text_of(value)
                    .and_then(|t| normalize_phone(&t))
                    .map(Value::Str)
            })?;
            Ok(StageEffect::default())
        }

        Stage::CardLength { number, provider } => {
            let number = table.require_column(number, name)?;
            let provider = table.require_column(provider, name)?;
            table.retain_rows(|row| match (row[number].to_text(), text_of(&row[provider])) {
                (Some(n), Some(p)) => card_length_matches(&n, &p),
                _ => false,
            });
            Ok(StageEffect::default())
        }

        Stage::MapFlag {
            column,
            into,
            true_values,
            false_values,
        } => {
            if !table.has_column(column) && table.has_column(into) {
                return Ok(StageEffect::skipped());
            }
            table.require_column(column, name)?;
            if column != into {
                table.drop_columns(&[into]);
                table.rename_headers(|h| if h == column.as_str() { into.clone() } else { h.to_string() });
            }
            rewrite_or_drop(table, into, name, |value| match value {
                Value::Bool(b) => Some(Value::Bool(*b)),
                other => {
                    let text = text_of(other)?;
                    if true_values.contains(&text) {
                        Some(Value::Bool(true))
                    } else if false_values.contains(&text) {
                        Some(Value::Bool(false))
                    } else {
                        None
                    }
                }
            })?;
            Ok(StageEffect::default())
        }

        Stage::ExtractPrice { column } => {
            rewrite_or_drop(table, column, name, |value| match value {
                Value::Float(_) | Value::Int(_) => value.as_f64().map(Value::Float),
                Value::Str(s) => extract_price(s).map(Value::Float),
                _ => None,
            })?;
            Ok(StageEffect::default())
        }

        Stage::ConvertWeight { column } => {
            let index = table.require_column(column, name)?;
            let converted: Vec<Value> = table
                .column_values(index)
                .map(|value| match value {
                    Value::Float(_) | Value::Int(_) => value.as_f64().into(),
                    Value::Str(s) => weight_to_kg(s).into(),
                    _ => Value::Null,
                })
                .collect();
            table.set_column(column, converted)?;
            Ok(StageEffect::default())
        }

        Stage::ClassifyWeight { column, into } => {
            let index = table.require_column(column, name)?;
            let classes: Vec<Value> = table
                .column_values(index)
                .map(|value| Value::from(WeightClass::classify(value.as_f64()).label()))
                .collect();
            table.set_column(into, classes)?;
            Ok(StageEffect::default())
        }
    }
}

/// Parse a value into its canonical type. Values already canonical pass through.
fn reparse(value: &Value, target: ParseTarget) -> Option<Value> {
    match (target, value) {
        (_, Value::Null) => None,
        (ParseTarget::Date, Value::Date(d)) => Some(Value::Date(*d)),
        (ParseTarget::Date, other) => parse_date(&text_of(other)?).map(Value::Date),
        (ParseTarget::MonthYear, other) => parse_month_year(&text_of(other)?).map(Value::Str),
        (ParseTarget::Float, Value::Float(f)) => Some(Value::Float(*f)),
        (ParseTarget::Float, Value::Int(i)) => Some(Value::Float(*i as f64)),
        (ParseTarget::Float, other) => parse_float(&text_of(other)?).map(Value::Float),
        (ParseTarget::Integer, Value::Int(i)) => Some(Value::Int(*i)),
        (ParseTarget::Integer, Value::Float(f)) => float_to_integer(*f).map(Value::Int),
        (ParseTarget::Integer, other) => parse_integer(&text_of(other)?).map(Value::Int),
        (ParseTarget::TimeOfDay, Value::Time(t)) => Some(Value::Time(*t)),
        (ParseTarget::TimeOfDay, other) => parse_time_of_day(&text_of(other)?).map(Value::Time),
    }
}

fn correct(
    table: &mut RecordTable,
    authority: &str,
    dependent: &str,
    lookup: &IndexMap<String, String>,
    stage: &str,
) -> Result<StageEffect> {
    let authority_index = table.require_column(authority, stage)?;
    let dependent_index = table.require_column(dependent, stage)?;

    let mut corrected = 0;
    let expected: Vec<Option<Value>> = table
        .rows()
        .iter()
        .map(|row| {
            let wanted = text_of(&row[authority_index]).and_then(|a| lookup.get(&a))?;
            if text_of(&row[dependent_index]).as_ref() != Some(wanted) {
                corrected += 1;
            }
            Some(Value::Str(wanted.clone()))
        })
        .collect();

    let before = table.row_count();
    keep_some(table, dependent, expected.into_iter())?;
    if table.row_count() < before {
        tracing::debug!(
            stage,
            dropped = before - table.row_count(),
            "'{}' values outside the lookup",
            authority
        );
    }

    Ok(StageEffect {
        values_corrected: corrected,
        skipped: false,
    })
}

/// Replace a column through `rewrite`, dropping rows it rejects.
fn rewrite_or_drop(
    table: &mut RecordTable,
    column: &str,
    stage: &str,
    rewrite: impl Fn(&Value) -> Option<Value>,
) -> Result<()> {
    let index = table.require_column(column, stage)?;
    let rewritten: Vec<Option<Value>> = table.column_values(index).map(rewrite).collect();
    keep_some(table, column, rewritten.into_iter())
}

/// Drop rows whose new value is `None`, then store the rest in `column`.
fn keep_some(
    table: &mut RecordTable,
    column: &str,
    values: impl Iterator<Item = Option<Value>>,
) -> Result<()> {
    let values: Vec<Option<Value>> = values.collect();
    let mask: Vec<bool> = values.iter().map(Option::is_some).collect();
    table.retain_mask(&mask)?;
    table.set_column(column, values.into_iter().flatten().collect())
}

/// Trimmed text for stages that rewrite the value. Filters that keep the
/// value as stored test `Value::to_text` instead.
fn text_of(value: &Value) -> Option<String> {
    value.to_text().map(|t| t.trim().to_string())
}

fn integer_of(value: &Value) -> Option<i64> {
    match value {
        Value::Int(i) => Some(*i),
        Value::Float(f) => float_to_integer(*f),
        other => parse_integer(&text_of(other)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RecordTable {
        RecordTable::from_text_rows(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|v| v.to_string()).collect())
                .collect(),
        )
    }

    fn run(stages: Vec<Stage>, input: &RecordTable) -> Result<(RecordTable, CleaningReport)> {
        CleaningEngine::default().run(&EntitySchema::new(EntityKind::User, stages), input)
    }

    #[test]
    fn test_reparse_drops_unparseable_rows() {
        let input = table(&["n"], &[&["12.5"], &["abc"], &["7"]]);
        let (out, report) = run(
            vec![Stage::Reparse {
                column: "n".to_string(),
                target: ParseTarget::Float,
                optional: false,
            }],
            &input,
        )
        .unwrap();

        assert_eq!(out.row_count(), 2);
        assert_eq!(out.value(1, "n"), Some(&Value::Float(7.0)));
        assert_eq!(report.stages[0].rows_dropped(), 1);
    }

    #[test]
    fn test_missing_column_is_schema_mismatch() {
        let input = table(&["a"], &[&["x"]]);
        let err = run(
            vec![Stage::NormalizePhone {
                column: "phone_number".to_string(),
            }],
            &input,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            crate::error::CentralisError::SchemaMismatch { ref column, .. } if column == "phone_number"
        ));
    }

    #[test]
    fn test_correct_counts_overwrites() {
        let reference = ReferenceData::embedded();
        let input = table(
            &["country", "country_code"],
            &[&["Germany", "US"], &["Germany", "DE"], &["France", "FR"]],
        );
        let (out, report) = run(
            vec![Stage::Correct {
                authority: "country".to_string(),
                dependent: "country_code".to_string(),
                lookup: reference.country_codes.clone(),
            }],
            &input,
        )
        .unwrap();

        assert_eq!(out.row_count(), 2);
        assert_eq!(out.value(0, "country_code"), Some(&Value::from("DE")));
        assert_eq!(report.values_corrected(), 1);
    }

    #[test]
    fn test_map_flag_keeps_column_position() {
        let input = table(&["removed", "x"], &[&["Removed", "1"], &["Still_avaliable", "2"]]);
        let stage = Stage::MapFlag {
            column: "removed".to_string(),
            into: "still_available".to_string(),
            true_values: vec!["Still_available".to_string(), "Still_avaliable".to_string()],
            false_values: vec!["Removed".to_string()],
        };
        let (out, _) = run(vec![stage.clone()], &input).unwrap();
        assert_eq!(out.headers(), &["still_available".to_string(), "x".to_string()]);
        assert_eq!(out.value(0, "still_available"), Some(&Value::Bool(false)));
        assert_eq!(out.value(1, "still_available"), Some(&Value::Bool(true)));

        let (again, report) = run(vec![stage], &out).unwrap();
        assert_eq!(again, out);
        assert!(report.stages[0].skipped);
    }

    #[test]
    fn test_combine_date_drops_invalid_and_components() {
        let input = table(
            &["day", "month", "year", "timestamp"],
            &[&["19", "9", "2012", "22:00:06"], &["31", "2", "2020", "10:00:00"]],
        );
        let (out, _) = run(
            vec![Stage::CombineDate {
                year: "year".to_string(),
                month: "month".to_string(),
                day: "day".to_string(),
                into: "date".to_string(),
            }],
            &input,
        )
        .unwrap();

        assert_eq!(out.row_count(), 1);
        assert_eq!(out.headers(), &["timestamp".to_string(), "date".to_string()]);
        assert_eq!(out.value(0, "date").map(|v| v.to_string()), Some("2012-09-19".to_string()));
    }

    #[test]
    fn test_convert_weight_nulls_unknown_units() {
        let input = table(&["weight"], &[&["200g"], &["abc"]]);
        let (out, _) = run(
            vec![Stage::ConvertWeight {
                column: "weight".to_string(),
            }],
            &input,
        )
        .unwrap();
        assert_eq!(out.value(0, "weight").and_then(Value::as_f64), Some(0.2));
        assert_eq!(out.value(1, "weight"), Some(&Value::Null));
    }

    #[test]
    fn test_input_table_untouched_on_error() {
        let input = table(&["a"], &[&["x"], &[""]]);
        let stages = vec![
            Stage::PurgeNulls {
                columns: None,
                except: Vec::new(),
            },
            Stage::DropColumns {
                columns: vec!["a".to_string()],
            },
            Stage::LowercaseHeaders,
            Stage::PurgeNulls {
                columns: Some(vec!["a".to_string()]),
                except: Vec::new(),
            },
        ];
        assert!(run(stages, &input).is_err());
        assert_eq!(input.row_count(), 2);
    }

    #[test]
    fn test_purge_nulls_skips_excepted_columns() {
        let input = table(&["weight", "name"], &[&["", "box"], &["1kg", ""], &["2kg", "bag"]]);
        let (out, _) = run(
            vec![Stage::PurgeNulls {
                columns: None,
                except: vec!["weight".to_string()],
            }],
            &input,
        )
        .unwrap();

        assert_eq!(out.row_count(), 2);
        assert_eq!(out.value(0, "weight"), Some(&Value::Null));
        assert_eq!(out.value(1, "name"), Some(&Value::from("bag")));
    }

    #[test]
    fn test_filters_test_the_stored_text() {
        let input = table(&["locality"], &[&[" London "], &["London"]]);
        let (out, _) = run(
            vec![Stage::MatchPattern {
                column: "locality".to_string(),
                pattern: "^[A-Za-z]+$".to_string(),
            }],
            &input,
        )
        .unwrap();
        assert_eq!(out.row_count(), 1);
        assert_eq!(out.value(0, "locality"), Some(&Value::from("London")));

        let input = table(&["country"], &[&["Germany "], &["Germany"]]);
        let (out, _) = run(
            vec![Stage::AllowList {
                column: "country".to_string(),
                values: vec!["Germany".to_string()],
            }],
            &input,
        )
        .unwrap();
        assert_eq!(out.row_count(), 1);
        assert_eq!(out.value(0, "country"), Some(&Value::from("Germany")));
    }
}
