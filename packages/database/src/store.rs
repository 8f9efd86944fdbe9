//! The in-memory store and the [`Dataset`] handle.

use std::cell::Cell;
use std::path::Path;

use duckdb::Connection;

use crate::schema::{ColumnInfo, ColumnType};
use crate::DbError;

/// Missing-value marker used by the Open Policing CSV exports.
const NULL_MARKER: &str = "NA";

/// Quotes an SQL identifier.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quotes an SQL string literal.
#[must_use]
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// One in-memory `DuckDB` database holding every table of a report run.
pub struct StopStore {
    conn: Connection,
    next_view: Cell<u32>,
}

impl std::fmt::Debug for StopStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopStore")
            .field("views", &self.next_view.get())
            .finish_non_exhaustive()
    }
}

impl StopStore {
    /// Opens an empty in-memory store.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if `DuckDB` cannot be initialized.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("SET threads = 1;")?;

        Ok(Self {
            conn,
            next_view: Cell::new(0),
        })
    }

    /// Loads a CSV file into a new table named `table`, inferring a type per
    /// column from the full file contents. The literal `NA` is read as
    /// missing.
    ///
    /// The file is fully copied into memory; it may be deleted as soon as
    /// this returns.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the file cannot be parsed or yields no columns.
    pub fn load_csv(&self, table: &str, csv_path: &Path) -> Result<Dataset<'_>, DbError> {
        let path_str = csv_path.display().to_string();
        log::debug!("Loading {path_str} into {table}");

        self.conn.execute_batch(&format!(
            "CREATE OR REPLACE TABLE {} AS SELECT * FROM read_csv({}, header = true, \
             nullstr = {}, sample_size = -1, auto_detect = true);",
            quote_ident(table),
            quote_literal(&path_str),
            quote_literal(NULL_MARKER),
        ))?;

        let dataset = Dataset {
            store: self,
            relation: table.to_string(),
        };

        let columns = dataset.schema()?;
        if columns.is_empty() {
            return Err(DbError::EmptyCsv { path: path_str });
        }

        log::info!(
            "Loaded {} rows x {} columns into {table}",
            dataset.row_count()?,
            columns.len()
        );

        Ok(dataset)
    }

    /// Returns a handle to an existing table or view.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::UnknownRelation`] if no such relation exists.
    pub fn dataset(&self, relation: &str) -> Result<Dataset<'_>, DbError> {
        let exists: i64 = self
            .conn
            .prepare("SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?")?
            .query_row(duckdb::params![relation], |row| row.get(0))?;

        if exists == 0 {
            return Err(DbError::UnknownRelation(relation.to_string()));
        }

        Ok(Dataset {
            store: self,
            relation: relation.to_string(),
        })
    }

    fn next_view_name(&self, parent: &str) -> String {
        let id = self.next_view.get();
        self.next_view.set(id + 1);
        let base = parent.split("__").next().unwrap_or(parent);
        format!("{base}__v{id}")
    }
}

/// A named relation (table or view) inside a [`StopStore`].
#[derive(Debug, Clone)]
pub struct Dataset<'a> {
    store: &'a StopStore,
    relation: String,
}

impl<'a> Dataset<'a> {
    /// The relation name.
    #[must_use]
    pub fn relation(&self) -> &str {
        &self.relation
    }

    /// The relation name, quoted for use in SQL.
    #[must_use]
    pub fn quoted(&self) -> String {
        quote_ident(&self.relation)
    }

    /// The store this dataset lives in.
    #[must_use]
    pub const fn store(&self) -> &'a StopStore {
        self.store
    }

    /// Returns the columns and their inferred types, in CSV order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the catalog query fails.
    pub fn schema(&self) -> Result<Vec<ColumnInfo>, DbError> {
        let mut stmt = self.store.conn.prepare(
            "SELECT column_name, data_type FROM information_schema.columns \
             WHERE table_name = ? ORDER BY ordinal_position",
        )?;
        let rows = stmt.query_map(duckdb::params![self.relation], |row| {
            let name: String = row.get(0)?;
            let type_name: String = row.get(1)?;
            Ok(ColumnInfo {
                name,
                column_type: ColumnType::from_duckdb(&type_name),
            })
        })?;
        let columns: Result<Vec<_>, _> = rows.collect();
        Ok(columns?)
    }

    /// Returns the inferred type of `column`, or `None` if it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the catalog query fails.
    pub fn column_type(&self, column: &str) -> Result<Option<ColumnType>, DbError> {
        Ok(self
            .schema()?
            .into_iter()
            .find(|c| c.name == column)
            .map(|c| c.column_type))
    }

    /// Number of rows in the relation.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn row_count(&self) -> Result<u64, DbError> {
        let count: i64 = self
            .store
            .conn
            .prepare(&format!("SELECT COUNT(*) FROM {}", self.quoted()))?
            .query_row([], |row| row.get(0))?;

        #[allow(clippy::cast_sign_loss)]
        Ok(count.max(0) as u64)
    }

    /// Creates a view of the rows satisfying `where_clause` and returns it
    /// as a new dataset. The parent is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the clause does not compile.
    pub fn derive(&self, where_clause: &str) -> Result<Self, DbError> {
        let name = self.store.next_view_name(&self.relation);
        self.store.conn.execute_batch(&format!(
            "CREATE VIEW {} AS SELECT * FROM {} WHERE {where_clause};",
            quote_ident(&name),
            self.quoted(),
        ))?;
        log::debug!("Derived {name} from {} where {where_clause}", self.relation);

        Ok(Self {
            store: self.store,
            relation: name,
        })
    }

    /// Runs `sql` and maps every result row through `map`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the statement fails or a row cannot be mapped.
    pub fn query_rows<T, F>(&self, sql: &str, map: F) -> Result<Vec<T>, DbError>
    where
        F: FnMut(&duckdb::Row<'_>) -> duckdb::Result<T>,
    {
        let mut stmt = self.store.conn.prepare(sql)?;
        let rows = stmt.query_map([], map)?;
        let collected: Result<Vec<T>, duckdb::Error> = rows.collect();
        Ok(collected?)
    }
}
