use sqlx::{FromRow, Row, SqliteConnection};


/// One accumulated block.
///
/// Counters are filled during accumulation and never change afterwards,
/// except `account_index` which the author backfill sets later.
#[derive(Debug, Clone, Default, FromRow)]
pub struct BlockRow {
    #[sqlx(try_from = "i64")]
    pub id: u64,
    #[sqlx(try_from = "crate::SqlxOption<i64>")]
    pub parent_id: Option<u64>,
    pub hash: String,
    pub parent_hash: String,
    pub state_root: String,
    pub extrinsics_root: String,
    pub count_extrinsics: u32,
    pub count_extrinsics_unsigned: u32,
    pub count_extrinsics_signed: u32,
    pub count_extrinsics_error: u32,
    pub count_extrinsics_success: u32,
    pub count_extrinsics_signedby_address: u32,
    pub count_extrinsics_signedby_index: u32,
    pub count_events: u32,
    pub count_events_system: u32,
    pub count_events_module: u32,
    pub count_events_extrinsic: u32,
    pub count_events_finalization: u32,
    pub count_accounts: u32,
    pub count_accounts_new: u32,
    pub count_accounts_reaped: u32,
    pub count_sessions_new: u32,
    pub count_contracts_new: u32,
    pub count_log: u32,
    pub range10000: u32,
    pub range100000: u32,
    pub range1000000: u32,
    /// Milliseconds since epoch, from the timestamp extrinsic.
    pub datetime: Option<i64>,
    pub slot_number: Option<i64>,
    pub account_index: Option<u32>,
    pub spec_version_id: u32,
    /// Digest log payloads as a JSON array.
    pub logs: String,
    pub debug_info: Option<String>,
}


pub async fn insert_block(conn: &mut SqliteConnection, block: &BlockRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO blocks (
            id, parent_id, hash, parent_hash, state_root, extrinsics_root,
            count_extrinsics, count_extrinsics_unsigned, count_extrinsics_signed,
            count_extrinsics_error, count_extrinsics_success,
            count_extrinsics_signedby_address, count_extrinsics_signedby_index,
            count_events, count_events_system, count_events_module,
            count_events_extrinsic, count_events_finalization,
            count_accounts, count_accounts_new, count_accounts_reaped,
            count_sessions_new, count_contracts_new, count_log,
            range10000, range100000, range1000000,
            datetime, slot_number, account_index, spec_version_id, logs, debug_info
        ) VALUES (
            ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
            ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
        )",
    )
    .bind(block.id as i64)
    .bind(block.parent_id.map(|v| v as i64))
    .bind(&block.hash)
    .bind(&block.parent_hash)
    .bind(&block.state_root)
    .bind(&block.extrinsics_root)
    .bind(block.count_extrinsics)
    .bind(block.count_extrinsics_unsigned)
    .bind(block.count_extrinsics_signed)
    .bind(block.count_extrinsics_error)
    .bind(block.count_extrinsics_success)
    .bind(block.count_extrinsics_signedby_address)
    .bind(block.count_extrinsics_signedby_index)
    .bind(block.count_events)
    .bind(block.count_events_system)
    .bind(block.count_events_module)
    .bind(block.count_events_extrinsic)
    .bind(block.count_events_finalization)
    .bind(block.count_accounts)
    .bind(block.count_accounts_new)
    .bind(block.count_accounts_reaped)
    .bind(block.count_sessions_new)
    .bind(block.count_contracts_new)
    .bind(block.count_log)
    .bind(block.range10000)
    .bind(block.range100000)
    .bind(block.range1000000)
    .bind(block.datetime)
    .bind(block.slot_number)
    .bind(block.account_index)
    .bind(block.spec_version_id)
    .bind(&block.logs)
    .bind(&block.debug_info)
    .execute(conn)
    .await?;
    Ok(())
}


pub async fn block_exists(conn: &mut SqliteConnection, hash: &str) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT 1 FROM blocks WHERE hash = ?")
        .bind(hash)
        .fetch_optional(conn)
        .await?;
    Ok(row.is_some())
}


pub async fn block_by_id(
    conn: &mut SqliteConnection,
    id: u64,
) -> Result<Option<BlockRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM blocks WHERE id = ?")
        .bind(id as i64)
        .fetch_optional(conn)
        .await
}


pub async fn block_by_hash(
    conn: &mut SqliteConnection,
    hash: &str,
) -> Result<Option<BlockRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM blocks WHERE hash = ?")
        .bind(hash)
        .fetch_optional(conn)
        .await
}


pub async fn block_by_parent_hash(
    conn: &mut SqliteConnection,
    parent_hash: &str,
) -> Result<Option<BlockRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM blocks WHERE parent_hash = ? LIMIT 1")
        .bind(parent_hash)
        .fetch_optional(conn)
        .await
}


pub async fn max_block_id(conn: &mut SqliteConnection) -> Result<Option<u64>, sqlx::Error> {
    let max: Option<i64> = sqlx::query_scalar("SELECT MAX(id) FROM blocks")
        .fetch_one(conn)
        .await?;
    Ok(max.map(|v| v as u64))
}


pub async fn min_block_id(conn: &mut SqliteConnection) -> Result<Option<u64>, sqlx::Error> {
    let min: Option<i64> = sqlx::query_scalar("SELECT MIN(id) FROM blocks")
        .fetch_one(conn)
        .await?;
    Ok(min.map(|v| v as u64))
}


pub async fn count_blocks(conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blocks")
        .fetch_one(conn)
        .await?;
    Ok(count as u64)
}


/// Contiguous runs of missing heights between the lowest and highest
/// stored block, ascending.
pub async fn missing_block_ranges(
    conn: &mut SqliteConnection,
) -> Result<Vec<(u64, u64)>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT id + 1 AS gap_start, next_id - 1 AS gap_end
         FROM (SELECT id, LEAD(id) OVER (ORDER BY id) AS next_id FROM blocks)
         WHERE next_id > id + 1
         ORDER BY gap_start",
    )
    .fetch_all(conn)
    .await?;
    rows.into_iter()
        .map(|row| {
            let start: i64 = row.try_get("gap_start")?;
            let end: i64 = row.try_get("gap_end")?;
            Ok((start as u64, end as u64))
        })
        .collect()
}


/// Writes the fields genesis bootstrapping fills in after the fact.
pub async fn update_genesis_block(
    conn: &mut SqliteConnection,
    block: &BlockRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE blocks
         SET datetime = ?, count_accounts = ?, count_accounts_new = ?
         WHERE id = ?",
    )
    .bind(block.datetime)
    .bind(block.count_accounts)
    .bind(block.count_accounts_new)
    .bind(block.id as i64)
    .execute(conn)
    .await?;
    Ok(())
}


pub async fn set_account_index(
    conn: &mut SqliteConnection,
    id: u64,
    account_index: u32,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE blocks SET account_index = ? WHERE id = ?")
        .bind(account_index)
        .bind(id as i64)
        .execute(conn)
        .await?;
    Ok(())
}


pub async fn blocks_missing_account_index(
    conn: &mut SqliteConnection,
    limit: u32,
) -> Result<Vec<u64>, sqlx::Error> {
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT id FROM blocks WHERE account_index IS NULL ORDER BY id LIMIT ?",
    )
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(ids.into_iter().map(|v| v as u64).collect())
}
