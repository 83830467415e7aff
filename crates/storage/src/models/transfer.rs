use sqlx::{FromRow, SqliteConnection};


/// Balance transfer derived from a transfer call, one per extrinsic.
#[derive(Debug, Clone, Default, FromRow)]
pub struct TransferRow {
    #[sqlx(try_from = "i64")]
    pub block_id: u64,
    pub extrinsic_idx: u32,
    /// "{block}_{idx}" key used by downstream consumers.
    pub data_extrinsic_idx: String,
    /// SS58 encoded sender.
    pub transfer_from: String,
    /// Sender public key hex, no 0x.
    pub from_raw: String,
    pub transfer_to: String,
    pub to_raw: String,
    pub hash: Option<String>,
    /// Decimal string, amounts do not fit an i64.
    pub amount: String,
    pub module_id: String,
    pub success: u32,
    pub error: u32,
    pub block_timestamp: Option<i64>,
}


pub async fn insert_transfer(
    conn: &mut SqliteConnection,
    transfer: &TransferRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO transfers (
            block_id, extrinsic_idx, data_extrinsic_idx, transfer_from,
            from_raw, transfer_to, to_raw, hash, amount, module_id,
            success, error, block_timestamp
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(transfer.block_id as i64)
    .bind(transfer.extrinsic_idx)
    .bind(&transfer.data_extrinsic_idx)
    .bind(&transfer.transfer_from)
    .bind(&transfer.from_raw)
    .bind(&transfer.transfer_to)
    .bind(&transfer.to_raw)
    .bind(&transfer.hash)
    .bind(&transfer.amount)
    .bind(&transfer.module_id)
    .bind(transfer.success)
    .bind(transfer.error)
    .bind(transfer.block_timestamp)
    .execute(conn)
    .await?;
    Ok(())
}


pub async fn transfers_by_block(
    conn: &mut SqliteConnection,
    block_id: u64,
) -> Result<Vec<TransferRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM transfers WHERE block_id = ? ORDER BY extrinsic_idx")
        .bind(block_id as i64)
        .fetch_all(conn)
        .await
}


pub async fn count_transfers_by_block(
    conn: &mut SqliteConnection,
    block_id: u64,
) -> Result<u32, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transfers WHERE block_id = ?")
        .bind(block_id as i64)
        .fetch_one(conn)
        .await?;
    Ok(count as u32)
}
