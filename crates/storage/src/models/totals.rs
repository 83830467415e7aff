use sqlx::{FromRow, SqliteConnection};


/// Running totals for one block, chained from the parent's row.
#[derive(Debug, Clone, Default, FromRow)]
pub struct BlockTotalRow {
    #[sqlx(try_from = "i64")]
    pub id: u64,
    pub parent_datetime: Option<i64>,
    /// Seconds between the parent block and this one.
    pub blocktime: i64,
    #[sqlx(try_from = "i64")]
    pub total_extrinsics: u64,
    #[sqlx(try_from = "i64")]
    pub total_extrinsics_success: u64,
    #[sqlx(try_from = "i64")]
    pub total_extrinsics_error: u64,
    #[sqlx(try_from = "i64")]
    pub total_extrinsics_signed: u64,
    #[sqlx(try_from = "i64")]
    pub total_extrinsics_unsigned: u64,
    #[sqlx(try_from = "i64")]
    pub total_extrinsics_signedby_address: u64,
    #[sqlx(try_from = "i64")]
    pub total_extrinsics_signedby_index: u64,
    #[sqlx(try_from = "i64")]
    pub total_events: u64,
    #[sqlx(try_from = "i64")]
    pub total_events_system: u64,
    #[sqlx(try_from = "i64")]
    pub total_events_module: u64,
    #[sqlx(try_from = "i64")]
    pub total_events_extrinsic: u64,
    #[sqlx(try_from = "i64")]
    pub total_events_finalization: u64,
    pub total_blocktime: i64,
    #[sqlx(try_from = "i64")]
    pub total_accounts: u64,
    #[sqlx(try_from = "i64")]
    pub total_accounts_new: u64,
    #[sqlx(try_from = "i64")]
    pub total_accounts_reaped: u64,
    #[sqlx(try_from = "i64")]
    pub total_sessions_new: u64,
    #[sqlx(try_from = "i64")]
    pub total_contracts_new: u64,
    #[sqlx(try_from = "i64")]
    pub total_logs: u64,
    #[sqlx(try_from = "i64")]
    pub total_transfers: u64,
}


pub async fn insert_block_total(
    conn: &mut SqliteConnection,
    total: &BlockTotalRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO block_totals (
            id, parent_datetime, blocktime,
            total_extrinsics, total_extrinsics_success, total_extrinsics_error,
            total_extrinsics_signed, total_extrinsics_unsigned,
            total_extrinsics_signedby_address, total_extrinsics_signedby_index,
            total_events, total_events_system, total_events_module,
            total_events_extrinsic, total_events_finalization, total_blocktime,
            total_accounts, total_accounts_new, total_accounts_reaped,
            total_sessions_new, total_contracts_new, total_logs, total_transfers
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(total.id as i64)
    .bind(total.parent_datetime)
    .bind(total.blocktime)
    .bind(total.total_extrinsics as i64)
    .bind(total.total_extrinsics_success as i64)
    .bind(total.total_extrinsics_error as i64)
    .bind(total.total_extrinsics_signed as i64)
    .bind(total.total_extrinsics_unsigned as i64)
    .bind(total.total_extrinsics_signedby_address as i64)
    .bind(total.total_extrinsics_signedby_index as i64)
    .bind(total.total_events as i64)
    .bind(total.total_events_system as i64)
    .bind(total.total_events_module as i64)
    .bind(total.total_events_extrinsic as i64)
    .bind(total.total_events_finalization as i64)
    .bind(total.total_blocktime)
    .bind(total.total_accounts as i64)
    .bind(total.total_accounts_new as i64)
    .bind(total.total_accounts_reaped as i64)
    .bind(total.total_sessions_new as i64)
    .bind(total.total_contracts_new as i64)
    .bind(total.total_logs as i64)
    .bind(total.total_transfers as i64)
    .execute(conn)
    .await?;
    Ok(())
}


pub async fn block_total_by_id(
    conn: &mut SqliteConnection,
    id: u64,
) -> Result<Option<BlockTotalRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM block_totals WHERE id = ?")
        .bind(id as i64)
        .fetch_optional(conn)
        .await
}


pub async fn max_sequenced_id(conn: &mut SqliteConnection) -> Result<Option<u64>, sqlx::Error> {
    let max: Option<i64> = sqlx::query_scalar("SELECT MAX(id) FROM block_totals")
        .fetch_one(conn)
        .await?;
    Ok(max.map(|v| v as u64))
}


pub async fn count_block_totals(conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM block_totals")
        .fetch_one(conn)
        .await?;
    Ok(count as u64)
}
