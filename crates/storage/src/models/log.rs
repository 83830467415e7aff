use sqlx::{FromRow, SqliteConnection};


/// One digest log item from a block header.
#[derive(Debug, Clone, Default, FromRow)]
pub struct LogRow {
    #[sqlx(try_from = "i64")]
    pub block_id: u64,
    pub log_idx: u32,
    /// Digest item variant byte.
    pub type_id: u32,
    #[sqlx(rename = "type")]
    pub log_type: String,
    /// Variant payload as JSON, e.g. engine id plus hex data.
    pub data: String,
}


pub async fn insert_log(conn: &mut SqliteConnection, log: &LogRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO logs (block_id, log_idx, type_id, type, data)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(log.block_id as i64)
    .bind(log.log_idx)
    .bind(log.type_id)
    .bind(&log.log_type)
    .bind(&log.data)
    .execute(conn)
    .await?;
    Ok(())
}


pub async fn logs_by_block(
    conn: &mut SqliteConnection,
    block_id: u64,
) -> Result<Vec<LogRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM logs WHERE block_id = ? ORDER BY log_idx")
        .bind(block_id as i64)
        .fetch_all(conn)
        .await
}


pub async fn logs_by_block_and_type(
    conn: &mut SqliteConnection,
    block_id: u64,
    log_type: &str,
) -> Result<Vec<LogRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM logs WHERE block_id = ? AND type = ? ORDER BY log_idx")
        .bind(block_id as i64)
        .bind(log_type)
        .fetch_all(conn)
        .await
}
