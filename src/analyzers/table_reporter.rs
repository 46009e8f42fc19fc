use crate::config::check_table_name;
use crate::error::Result;
use crate::utils::constants::DEFAULT_SAMPLE_SIZE;
use clap::ValueEnum;
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// One sampled row; `None` is a SQL NULL
pub type SampleRow = Vec<Option<String>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// One tuple per line
    #[default]
    Table,
    /// A JSON array of rows
    Json,
}

/// Reads a bounded sample of a loaded table back for inspection
pub struct TableReporter {
    table_name: String,
    limit: usize,
}

impl TableReporter {
    pub fn new(table_name: &str) -> Result<Self> {
        check_table_name(table_name)?;
        Ok(Self {
            table_name: table_name.to_string(),
            limit: DEFAULT_SAMPLE_SIZE,
        })
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Fetch up to `limit` rows in whatever order the storage engine
    /// returns them. The database must already exist.
    pub fn sample(&self, database: &Path) -> Result<Vec<SampleRow>> {
        let conn = Connection::open_with_flags(database, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        self.sample_from(&conn)
    }

    pub fn sample_from(&self, conn: &Connection) -> Result<Vec<SampleRow>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} LIMIT {}",
            self.table_name, self.limit
        ))?;
        let column_count = stmt.column_count();

        let rows = stmt
            .query_map([], |row| {
                (0..column_count)
                    .map(|i| row.get::<_, Value>(i).map(render_value))
                    .collect::<rusqlite::Result<SampleRow>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    /// Write `rows` to `writer` in the requested format
    pub fn emit<W: Write>(&self, rows: &[SampleRow], format: ReportFormat, mut writer: W) -> Result<()> {
        match format {
            ReportFormat::Table => {
                writeln!(writer, "Sample of {} ({} rows):", self.table_name, rows.len())?;
                for row in rows {
                    writeln!(writer, "{}", format_tuple(row))?;
                }
            }
            ReportFormat::Json => {
                serde_json::to_writer_pretty(&mut writer, rows).map_err(std::io::Error::from)?;
                writeln!(writer)?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    /// Sample `database` and emit the rows. Returns how many were emitted.
    pub fn report<W: Write>(&self, database: &Path, format: ReportFormat, writer: W) -> Result<usize> {
        let rows = self.sample(database)?;
        self.emit(&rows, format, writer)?;
        info!(
            "Reported {} rows from {}.{}",
            rows.len(),
            database.display(),
            self.table_name
        );
        Ok(rows.len())
    }
}

fn render_value(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(f) => Some(f.to_string()),
        Value::Text(s) => Some(s),
        Value::Blob(b) => Some(format!("<blob {} bytes>", b.len())),
    }
}

fn format_tuple(row: &[Option<String>]) -> String {
    let fields: Vec<String> = row
        .iter()
        .map(|field| match field {
            Some(text) => quote(text),
            None => "NULL".to_string(),
        })
        .collect();
    format!("({})", fields.join(", "))
}

/// Quote a value the way Python's `repr` quotes a string: single quotes
/// unless the text contains only single quotes, with backslash escapes.
fn quote(text: &str) -> String {
    let delimiter = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push(delimiter);
    for c in text.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c == delimiter => {
                quoted.push('\\');
                quoted.push(c);
            }
            c => quoted.push(c),
        }
    }
    quoted.push(delimiter);
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn seeded_connection(rows: usize) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE toll_data (\"0\" TEXT, \"1\" TEXT)", [])
            .unwrap();
        for i in 0..rows {
            conn.execute(
                "INSERT INTO toll_data VALUES (?1, ?2)",
                rusqlite::params![i.to_string(), if i % 2 == 0 { Some("CAR") } else { None }],
            )
            .unwrap();
        }
        conn
    }

    #[test]
    fn test_sample_is_bounded() -> Result<()> {
        let conn = seeded_connection(25);
        let rows = TableReporter::new("toll_data")?.sample_from(&conn)?;
        assert_eq!(rows.len(), 10);

        let rows = TableReporter::new("toll_data")?.with_limit(3).sample_from(&conn)?;
        assert_eq!(rows.len(), 3);
        Ok(())
    }

    #[test]
    fn test_sample_of_small_table() -> Result<()> {
        let conn = seeded_connection(2);
        let rows = TableReporter::new("toll_data")?.sample_from(&conn)?;
        assert_eq!(rows.len(), 2);
        Ok(())
    }

    #[test]
    fn test_emit_table_format() -> Result<()> {
        let reporter = TableReporter::new("toll_data")?;
        let rows = vec![
            vec![Some("1".to_string()), Some("CAR".to_string())],
            vec![Some("2".to_string()), None],
        ];
        let mut out = Vec::new();

        reporter.emit(&rows, ReportFormat::Table, &mut out)?;

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Sample of toll_data (2 rows):\n('1', 'CAR')\n('2', NULL)\n"
        );
        Ok(())
    }

    #[test]
    fn test_emit_json_format() -> Result<()> {
        let reporter = TableReporter::new("toll_data")?;
        let rows = vec![vec![Some("1".to_string()), None]];
        let mut out = Vec::new();

        reporter.emit(&rows, ReportFormat::Json, &mut out)?;

        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, serde_json::json!([["1", null]]));
        Ok(())
    }

    #[test]
    fn test_missing_database_is_an_error() -> Result<()> {
        let dir = TempDir::new()?;
        let result = TableReporter::new("toll_data")?.sample(&dir.path().join("absent.db"));
        assert!(matches!(result, Err(ProcessingError::Sqlite(_))));
        Ok(())
    }

    #[test]
    fn test_quotes_in_values_are_escaped() {
        let row = vec![
            Some("O'Brien".to_string()),
            Some("say \"hi\"".to_string()),
            Some("it's \"x\"".to_string()),
            Some("a\\b\tc".to_string()),
        ];
        assert_eq!(
            format_tuple(&row),
            r#"("O'Brien", 'say "hi"', 'it\'s "x"', 'a\\b\tc')"#
        );
    }

    #[test]
    fn test_render_value() {
        assert_eq!(render_value(Value::Integer(42)), Some("42".to_string()));
        assert_eq!(render_value(Value::Null), None);
        assert_eq!(render_value(Value::Text("VAN".into())), Some("VAN".to_string()));
    }
}
