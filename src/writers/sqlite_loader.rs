use crate::config::check_table_name;
use crate::error::{ProcessingError, Result};
use crate::models::Row;
use csv::ReaderBuilder;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;
use tracing::{debug, info};

/// Replaces a SQLite table with the rows of a headerless CSV file
pub struct SqliteLoader {
    table_name: String,
}

impl SqliteLoader {
    pub fn new(table_name: &str) -> Result<Self> {
        check_table_name(table_name)?;
        Ok(Self {
            table_name: table_name.to_string(),
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Load `input` into `database`, dropping any previous table of the same
    /// name. Returns the number of rows loaded.
    pub fn load_file(&self, input: &Path, database: &Path) -> Result<usize> {
        let rows = read_rows(input)?;
        let mut conn = Connection::open(database)?;
        let loaded = self.load_rows(&mut conn, &rows)?;

        info!(
            "Loaded {} rows from {} into {}.{}",
            loaded,
            input.display(),
            database.display(),
            self.table_name
        );
        Ok(loaded)
    }

    /// Replace the table with `rows` inside a single transaction.
    ///
    /// Columns are named by position (`"0"`, `"1"`, ...) and typed by
    /// [`ColumnType::infer`]. The width is the widest row; shorter rows are
    /// padded with NULL, and empty fields are stored as NULL.
    pub fn load_rows(&self, conn: &mut Connection, rows: &[Row]) -> Result<usize> {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        if width == 0 {
            return Err(ProcessingError::MissingData(format!(
                "no rows to load into table {}",
                self.table_name
            )));
        }

        let columns = (0..width)
            .map(|i| {
                let values = rows.iter().filter_map(|row| row.get(i)).map(String::as_str);
                format!("\"{}\" {}", i, ColumnType::infer(values).sql())
            })
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; width].join(", ");

        let tx = conn.transaction()?;
        tx.execute(&format!("DROP TABLE IF EXISTS {}", self.table_name), [])?;
        tx.execute(
            &format!("CREATE TABLE {} ({})", self.table_name, columns),
            [],
        )?;
        debug!("Created table {} with {} columns", self.table_name, width);

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} VALUES ({})",
                self.table_name, placeholders
            ))?;
            for row in rows {
                let values = (0..width).map(|i| {
                    row.get(i)
                        .map(String::as_str)
                        .filter(|field| !field.is_empty())
                });
                stmt.execute(params_from_iter(values))?;
            }
        }

        tx.commit()?;
        Ok(rows.len())
    }
}

/// Declared type of a loaded column. SQLite converts bound text to the
/// column's affinity, so numeric columns come back as numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    /// INTEGER if every non-empty value is an integer, REAL if every one is
    /// a number, otherwise TEXT. A column with no values is TEXT.
    fn infer<'a>(values: impl Iterator<Item = &'a str>) -> Self {
        let mut inferred = None;
        for value in values.filter(|v| !v.is_empty()) {
            let current = inferred.unwrap_or(ColumnType::Integer);
            inferred = Some(match current {
                ColumnType::Integer if value.parse::<i64>().is_ok() => ColumnType::Integer,
                ColumnType::Integer | ColumnType::Real if value.parse::<f64>().is_ok() => {
                    ColumnType::Real
                }
                _ => return ColumnType::Text,
            });
        }
        inferred.unwrap_or(ColumnType::Text)
    }

    fn sql(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

fn read_rows(input: &Path) -> Result<Vec<Row>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(input)?;

    let mut rows = Vec::new();
    for record_result in reader.records() {
        let record = record_result?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn count_rows(database: &Path, table: &str) -> Result<i64> {
        let conn = Connection::open(database)?;
        let count = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })?;
        Ok(count)
    }

    #[test]
    fn test_load_file() -> Result<()> {
        let dir = TempDir::new()?;
        let input = dir.path().join("transformed_data.csv");
        std::fs::write(&input, "1,a,CAR\n2,b,TRUCK\n3,c,VAN\n")?;
        let database = dir.path().join("toll.db");

        let loaded = SqliteLoader::new("toll_data")?.load_file(&input, &database)?;

        assert_eq!(loaded, 3);
        assert_eq!(count_rows(&database, "toll_data")?, 3);

        let conn = Connection::open(&database)?;
        let vehicle: String =
            conn.query_row("SELECT \"2\" FROM toll_data WHERE \"0\" = '2'", [], |row| row.get(0))?;
        assert_eq!(vehicle, "TRUCK");
        Ok(())
    }

    #[test]
    fn test_reload_replaces_previous_contents() -> Result<()> {
        let dir = TempDir::new()?;
        let database = dir.path().join("toll.db");
        let first = dir.path().join("first.csv");
        let second = dir.path().join("second.csv");
        std::fs::write(&first, "1,a\n2,b\n3,c\n4,d\n")?;
        std::fs::write(&second, "9,z,extra\n")?;

        let loader = SqliteLoader::new("toll_data")?;
        loader.load_file(&first, &database)?;
        loader.load_file(&second, &database)?;

        assert_eq!(count_rows(&database, "toll_data")?, 1);
        let conn = Connection::open(&database)?;
        let (id, extra): (i64, String) =
            conn.query_row("SELECT \"0\", \"2\" FROM toll_data", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?;
        assert_eq!(id, 9);
        assert_eq!(extra, "extra");
        Ok(())
    }

    #[test]
    fn test_ragged_rows_are_padded_with_null() -> Result<()> {
        let mut conn = Connection::open_in_memory()?;
        let rows = vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["c".to_string()],
        ];

        SqliteLoader::new("toll_data")?.load_rows(&mut conn, &rows)?;

        let missing: Option<String> = conn.query_row(
            "SELECT \"1\" FROM toll_data WHERE \"0\" = 'c'",
            [],
            |row| row.get(0),
        )?;
        assert_eq!(missing, None);
        Ok(())
    }

    #[test]
    fn test_empty_fields_load_as_null() -> Result<()> {
        let dir = TempDir::new()?;
        let input = dir.path().join("transformed_data.csv");
        std::fs::write(&input, "1,,x\n2,7,y\n")?;
        let database = dir.path().join("toll.db");

        SqliteLoader::new("toll_data")?.load_file(&input, &database)?;

        let conn = Connection::open(&database)?;
        let (id_type, missing): (String, Option<i64>) = conn.query_row(
            "SELECT typeof(\"0\"), \"1\" FROM toll_data WHERE \"2\" = 'x'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        assert_eq!(id_type, "integer");
        assert_eq!(missing, None);
        Ok(())
    }

    #[test]
    fn test_column_type_inference() {
        assert_eq!(ColumnType::infer(["1", "", "42"].into_iter()), ColumnType::Integer);
        assert_eq!(ColumnType::infer(["1", "2.5"].into_iter()), ColumnType::Real);
        assert_eq!(ColumnType::infer(["1", "CAR"].into_iter()), ColumnType::Text);
        assert_eq!(ColumnType::infer(["", ""].into_iter()), ColumnType::Text);
    }

    #[test]
    fn test_empty_input_is_rejected() -> Result<()> {
        let dir = TempDir::new()?;
        let input = dir.path().join("empty.csv");
        std::fs::write(&input, "")?;

        let result = SqliteLoader::new("toll_data")?.load_file(&input, &dir.path().join("toll.db"));
        assert!(matches!(result, Err(ProcessingError::MissingData(_))));
        Ok(())
    }

    #[test]
    fn test_invalid_table_name() {
        assert!(matches!(
            SqliteLoader::new("toll_data; DROP TABLE x"),
            Err(ProcessingError::InvalidIdentifier(_))
        ));
    }
}
