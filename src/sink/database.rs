//! DuckDB sink
//!
//! Stores each resource as a table of raw JSON records in a local DuckDB
//! file, honouring the resource's write mode.

use super::types::{RecordSink, SinkTarget};
use crate::error::{Error, Result};
use crate::types::{JsonValue, WriteMode};
use async_trait::async_trait;
use duckdb::{params, Connection};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default schema for harvested tables
pub const DEFAULT_SCHEMA: &str = "raw_riksdagen";

/// Local DuckDB destination
pub struct DuckDbSink {
    path: PathBuf,
    schema: String,
    conn: Option<Connection>,
    target: Option<SinkTarget>,
    written: u64,
}

impl DuckDbSink {
    /// Sink writing to `<database>.duckdb` in the working directory
    pub fn for_database(database: &str) -> Self {
        Self::at_path(format!("{database}.duckdb"))
    }

    /// Sink writing to an explicit file
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            schema: DEFAULT_SCHEMA.to_string(),
            conn: None,
            target: None,
            written: 0,
        }
    }

    /// Use a different schema
    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn table(&self, target: &SinkTarget) -> String {
        format!(
            "{}.{}",
            quote_ident(&self.schema),
            quote_ident(&target.resource)
        )
    }
}

#[async_trait]
impl RecordSink for DuckDbSink {
    async fn open(&mut self, target: &SinkTarget) -> Result<()> {
        if target.write_mode == WriteMode::Merge && target.primary_key.is_empty() {
            return Err(Error::sink(format!(
                "Resource '{}' uses merge but declares no primary key",
                target.resource
            )));
        }

        let conn = Connection::open(&self.path)?;
        let table = self.table(target);

        let mut ddl = format!("CREATE SCHEMA IF NOT EXISTS {};", quote_ident(&self.schema));
        if target.write_mode == WriteMode::Replace {
            ddl.push_str(&format!("DROP TABLE IF EXISTS {table};"));
        }
        ddl.push_str(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                _key VARCHAR,
                _loaded_at TIMESTAMP DEFAULT current_timestamp,
                record VARCHAR
            );"
        ));
        conn.execute_batch(&ddl)?;

        info!(
            path = %self.path.display(),
            table = %table,
            mode = %target.write_mode,
            "Opened DuckDB destination"
        );
        self.conn = Some(conn);
        self.target = Some(target.clone());
        self.written = 0;
        Ok(())
    }

    async fn write(&mut self, records: &[JsonValue]) -> Result<()> {
        let target = self
            .target
            .clone()
            .ok_or_else(|| Error::sink("DuckDB sink written before open"))?;
        let table = self.table(&target);
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| Error::sink("DuckDB sink written before open"))?;

        let tx = conn.transaction()?;
        {
            let mut delete = tx.prepare(&format!("DELETE FROM {table} WHERE _key = ?"))?;
            let mut insert = tx.prepare(&format!("INSERT INTO {table} (_key, record) VALUES (?, ?)"))?;

            for record in records {
                let key = target.record_key(record);
                if target.write_mode == WriteMode::Merge {
                    if let Some(key) = &key {
                        delete.execute(params![key])?;
                    }
                }
                insert.execute(params![key, record.to_string()])?;
            }
        }
        tx.commit()?;

        self.written += records.len() as u64;
        debug!(table = %table, count = records.len(), "Wrote batch");
        Ok(())
    }

    async fn close(&mut self) -> Result<u64> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| Error::Database(e))?;
        }
        Ok(self.written)
    }
}

impl std::fmt::Debug for DuckDbSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbSink")
            .field("path", &self.path)
            .field("schema", &self.schema)
            .field("written", &self.written)
            .finish_non_exhaustive()
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
