use anyhow::{bail, Result};
use rusqlite::{params, Connection};

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            // Allow unused_mut because the variable is only mutated when optional
            // field assignments are passed to the macro (e.g., `non_null = true`)
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                foreign_key: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
    Blob,
}

impl SqlType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Blob => "BLOB",
        }
    }
}

#[allow(unused)]
pub enum ForeignKeyOnChange {
    NoAction,
    Restrict,
    SetNull,
    SetDefault,
    Cascade,
}

impl ForeignKeyOnChange {
    fn as_sql(&self) -> &'static str {
        match self {
            ForeignKeyOnChange::NoAction => "NO ACTION",
            ForeignKeyOnChange::Restrict => "RESTRICT",
            ForeignKeyOnChange::SetNull => "SET NULL",
            ForeignKeyOnChange::SetDefault => "SET DEFAULT",
            ForeignKeyOnChange::Cascade => "CASCADE",
        }
    }
}

pub struct ForeignKey {
    pub foreign_table: &'static str,
    pub foreign_column: &'static str,
    pub on_delete: ForeignKeyOnChange,
}

pub struct Column<'a> {
    pub name: &'static str,
    pub sql_type: &'a SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub foreign_key: Option<&'a ForeignKey>,
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column<'static>],
    /// Composite primary key. Leave empty when a single column carries `is_primary_key`.
    pub primary_key: &'static [&'static str],
    pub indices: &'static [(&'static str, &'static str)],
}

/// Outcome of comparing a live table against its expected definition.
#[derive(Debug, Clone, PartialEq)]
pub struct TableReport {
    pub table: &'static str,
    pub exists: bool,
    pub missing_columns: Vec<&'static str>,
    /// (column, expected type, declared type)
    pub type_mismatches: Vec<(&'static str, &'static str, String)>,
}

impl TableReport {
    pub fn is_ok(&self) -> bool {
        self.exists && self.missing_columns.is_empty() && self.type_mismatches.is_empty()
    }
}

impl std::fmt::Display for TableReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.exists {
            return write!(f, "[NO TABLE] {}", self.table);
        }
        if self.is_ok() {
            return write!(f, "[OK] {}", self.table);
        }
        write!(f, "[MISMATCH] {}:", self.table)?;
        if !self.missing_columns.is_empty() {
            write!(f, " missing columns ({})", self.missing_columns.join(", "))?;
        }
        for (column, expected, actual) in &self.type_mismatches {
            write!(f, " {} expected {} got {}", column, expected, actual)?;
        }
        Ok(())
    }
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let mut create_sql = format!("CREATE TABLE {} (", self.name);
        for (column_index, column) in self.columns.iter().enumerate() {
            if column_index > 0 {
                create_sql.push_str(", ");
            }
            create_sql.push_str(&format!("{} {}", column.name, column.sql_type.as_sql()));
            if column.is_primary_key {
                create_sql.push_str(" PRIMARY KEY");
            }
            if column.non_null {
                create_sql.push_str(" NOT NULL");
            }
            if let Some(foreign_key) = column.foreign_key {
                create_sql.push_str(&format!(
                    " REFERENCES {}({}) ON DELETE {}",
                    foreign_key.foreign_table,
                    foreign_key.foreign_column,
                    foreign_key.on_delete.as_sql()
                ));
            }
        }
        if !self.primary_key.is_empty() {
            create_sql.push_str(&format!(", PRIMARY KEY ({})", self.primary_key.join(", ")));
        }
        create_sql.push_str(");");
        conn.execute(&create_sql, params![])?;

        for (index_name, column_name) in self.indices {
            conn.execute(
                &format!(
                    "CREATE INDEX {} ON {}({});",
                    index_name, self.name, column_name
                ),
                params![],
            )?;
        }
        Ok(())
    }

    /// Compares the live table with this definition. Extra columns are tolerated,
    /// the catalog is produced by an external import and may carry more.
    pub fn inspect(&self, conn: &Connection) -> Result<TableReport> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", self.name))?;
        let actual_columns: Vec<(String, String)> = stmt
            .query_map(params![], |row| {
                Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut report = TableReport {
            table: self.name,
            exists: !actual_columns.is_empty(),
            missing_columns: vec![],
            type_mismatches: vec![],
        };
        if !report.exists {
            return Ok(report);
        }

        for expected in self.columns {
            match actual_columns.iter().find(|(name, _)| name == expected.name) {
                None => report.missing_columns.push(expected.name),
                Some((_, declared)) => {
                    let expected_type = expected.sql_type.as_sql();
                    if !declared.eq_ignore_ascii_case(expected_type) {
                        report
                            .type_mismatches
                            .push((expected.name, expected_type, declared.clone()));
                    }
                }
            }
        }
        Ok(report)
    }
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        conn.execute("PRAGMA foreign_keys = ON;", params![])?;
        for table in self.tables {
            table.create(conn)?;
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + self.version),
            [],
        )?;
        Ok(())
    }

    pub fn inspect(&self, conn: &Connection) -> Result<Vec<TableReport>> {
        self.tables.iter().map(|table| table.inspect(conn)).collect()
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for report in self.inspect(conn)? {
            if !report.is_ok() {
                bail!("Schema mismatch: {}", report);
            }
        }
        Ok(())
    }
}

pub const BASE_DB_VERSION: usize = 99999;
