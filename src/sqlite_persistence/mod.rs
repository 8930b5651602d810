mod versioned_schema;

pub use versioned_schema::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, TableReport, VersionedSchema,
    BASE_DB_VERSION,
};
