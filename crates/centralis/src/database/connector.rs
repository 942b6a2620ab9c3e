//! Postgres connector built on a sqlx pool.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value as JsonValue};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::query_builder::Separated;
use sqlx::{Postgres, QueryBuilder};

use crate::error::{CentralisError, Result};
use crate::table::{RecordTable, Value};

use super::credentials::DbCredentials;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Postgres caps a statement at this many bind parameters.
const MAX_BIND_PARAMS: usize = 65_535;

/// Reject names that cannot be used verbatim as a table identifier.
pub fn validate_identifier(name: &str) -> Result<&str> {
    if IDENTIFIER.is_match(name) {
        Ok(name)
    } else {
        Err(CentralisError::InvalidIdentifier(name.to_string()))
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Column type chosen for an uploaded column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    BigInt,
    Double,
    Date,
    Time,
    Boolean,
    Text,
}

impl SqlType {
    /// Narrowest type holding every non-null value. Mixed or all-null columns
    /// are text; integers mixed with floats are doubles.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut inferred: Option<SqlType> = None;
        for value in values {
            let current = match value {
                Value::Null => continue,
                Value::Int(_) => SqlType::BigInt,
                Value::Float(_) => SqlType::Double,
                Value::Date(_) => SqlType::Date,
                Value::Time(_) => SqlType::Time,
                Value::Bool(_) => SqlType::Boolean,
                Value::Str(_) => SqlType::Text,
            };
            inferred = Some(match (inferred, current) {
                (None, t) => t,
                (Some(a), b) if a == b => a,
                (Some(SqlType::BigInt), SqlType::Double) | (Some(SqlType::Double), SqlType::BigInt) => {
                    SqlType::Double
                }
                _ => SqlType::Text,
            });
        }
        inferred.unwrap_or(SqlType::Text)
    }

    pub fn ddl(&self) -> &'static str {
        match self {
            SqlType::BigInt => "BIGINT",
            SqlType::Double => "DOUBLE PRECISION",
            SqlType::Date => "DATE",
            SqlType::Time => "TIME",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Text => "TEXT",
        }
    }
}

/// Bind `value` as a parameter of the column's type. Nulls are bound typed.
fn push_value(builder: &mut Separated<'_, '_, Postgres, &'static str>, value: &Value, ty: SqlType) {
    match ty {
        SqlType::BigInt => builder.push_bind(value.as_i64()),
        SqlType::Double => builder.push_bind(value.as_f64()),
        SqlType::Date => builder.push_bind(value.as_date()),
        SqlType::Time => builder.push_bind(value.as_time()),
        SqlType::Boolean => builder.push_bind(value.as_bool()),
        SqlType::Text => builder.push_bind(value.to_text()),
    };
}

/// Connection pool to one Postgres database.
#[derive(Debug, Clone)]
pub struct DatabaseConnector {
    pool: PgPool,
}

impl DatabaseConnector {
    /// Open a pool with the given credentials.
    pub async fn connect(credentials: &DbCredentials) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_with(credentials.connect_options())
            .await?;
        tracing::info!(
            host = %credentials.host,
            database = %credentials.database,
            "Connected to database"
        );
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Names of the base tables in the public schema.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let tables = sqlx::query_scalar::<_, String>(
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_type = 'BASE TABLE' \
             ORDER BY table_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(tables)
    }

    /// Read a whole table as raw records.
    pub async fn read_table(&self, name: &str) -> Result<RecordTable> {
        let name = validate_identifier(name)?;
        let sql = format!(
            "SELECT row_to_json(t)::text FROM {} t",
            quote_identifier(name)
        );
        let rows: Vec<String> = sqlx::query_scalar(&sql).fetch_all(&self.pool).await?;

        if rows.is_empty() {
            let columns = self.column_names(name).await?;
            return Ok(RecordTable::empty(columns));
        }

        let records = rows
            .iter()
            .map(|row| serde_json::from_str::<Map<String, JsonValue>>(row))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tracing::info!(table = name, rows = records.len(), "Read table");
        Ok(RecordTable::from_json_records(&records))
    }

    async fn column_names(&self, name: &str) -> Result<Vec<String>> {
        let columns = sqlx::query_scalar::<_, String>(
            "SELECT column_name::text FROM information_schema.columns \
             WHERE table_schema = 'public' AND table_name = $1 \
             ORDER BY ordinal_position",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;
        Ok(columns)
    }

    /// Replace the table `name` with the contents of `table`.
    ///
    /// The existing table is dropped and recreated with column types
    /// inferred from the values, all inside one transaction.
    pub async fn upload_table(&self, table: &RecordTable, name: &str) -> Result<()> {
        let name = validate_identifier(name)?;
        if table.column_count() == 0 {
            return Err(CentralisError::EmptyData(format!(
                "Cannot upload '{}' without columns",
                name
            )));
        }

        let types: Vec<SqlType> = (0..table.column_count())
            .map(|i| SqlType::infer(table.column_values(i)))
            .collect();
        let quoted_columns: Vec<String> = table
            .headers()
            .iter()
            .map(|h| quote_identifier(h))
            .collect();

        let definitions: Vec<String> = quoted_columns
            .iter()
            .zip(&types)
            .map(|(column, ty)| format!("{} {}", column, ty.ddl()))
            .collect();

        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!("DROP TABLE IF EXISTS {}", quote_identifier(name)))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!(
            "CREATE TABLE {} ({})",
            quote_identifier(name),
            definitions.join(", ")
        ))
        .execute(&mut *tx)
        .await?;

        let rows_per_statement = (MAX_BIND_PARAMS / table.column_count()).max(1);
        for chunk in table.rows().chunks(rows_per_statement) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                "INSERT INTO {} ({}) ",
                quote_identifier(name),
                quoted_columns.join(", ")
            ));
            builder.push_values(chunk, |mut values, row| {
                for (value, ty) in row.iter().zip(&types) {
                    push_value(&mut values, value, *ty);
                }
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        tracing::info!(table = name, rows = table.row_count(), "Uploaded table");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("legacy_users").is_ok());
        assert!(validate_identifier("_tmp1").is_ok());
        assert!(validate_identifier("1users").is_err());
        assert!(validate_identifier("users; DROP TABLE x").is_err());
        assert!(validate_identifier("").is_err());
    }

    #[test]
    fn test_quote_identifier_escapes_quotes() {
        assert_eq!(quote_identifier("weight"), "\"weight\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_sql_type_inference() {
        let date = Value::Date(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
        assert_eq!(SqlType::infer(&[Value::Int(1), Value::Null]), SqlType::BigInt);
        assert_eq!(SqlType::infer(&[Value::Int(1), Value::Float(1.5)]), SqlType::Double);
        assert_eq!(SqlType::infer(&[date.clone(), Value::Null]), SqlType::Date);
        assert_eq!(SqlType::infer(&[date, Value::Int(3)]), SqlType::Text);
        assert_eq!(SqlType::infer(&[Value::Null]), SqlType::Text);
        assert_eq!(SqlType::infer(&[Value::Bool(true)]), SqlType::Boolean);
    }
}
