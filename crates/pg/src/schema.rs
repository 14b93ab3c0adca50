use tokio_postgres::Client;

/// Schema metadata for PostgreSQL tables.
///
/// Provides compile-time SQL generation for table creation and indexing.
/// All methods return `&'static str` to avoid runtime allocations and enable
/// compile-time string construction via `const_format::concatcp!`.
///
/// This trait contains no I/O; [`migrate`] executes the statements.
pub trait Schema {
    /// Returns the table name in the database.
    fn name() -> &'static str;
    /// Returns `CREATE TABLE IF NOT EXISTS` DDL statement.
    fn creates() -> &'static str;
    /// Returns `CREATE INDEX IF NOT EXISTS` statements for all indices.
    fn indices() -> &'static str;
}

/// Creates the table for `S` and its indices if they do not already exist.
pub async fn migrate<S: Schema>(client: &Client) -> Result<(), tokio_postgres::Error> {
    log::info!("migrating table ({})", S::name());
    client.batch_execute(S::creates()).await?;
    match S::indices() {
        "" => Ok(()),
        sql => client.batch_execute(sql).await,
    }
}
