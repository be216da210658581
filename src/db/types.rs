/// A typed value bound into a SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum DbValue {
    Null,
    Bool(bool),
    /// Unsigned 64-bit integer, stored as `BIGINT`
    Uint64(u64),
    Text(String),
}

/// A write issued against the projection database.
#[derive(Debug, Clone)]
pub enum DbOperation {
    /// `INSERT ... ON CONFLICT` upsert. On conflict only `update_columns`
    /// are overwritten from the incoming row; columns outside that list
    /// keep their stored values.
    Upsert {
        table: String,
        columns: Vec<String>,
        values: Vec<DbValue>,
        conflict_columns: Vec<String>,
        update_columns: Vec<String>,
    },
    /// `UPDATE ... WHERE key_column = key_value`. Matching zero rows is a
    /// valid outcome, reported through the affected-row count.
    Update {
        table: String,
        set_columns: Vec<(String, DbValue)>,
        key_column: String,
        key_value: DbValue,
    },
}
