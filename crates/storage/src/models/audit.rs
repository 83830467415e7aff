use sqlx::{FromRow, SqliteConnection};


pub const AUDIT_TYPE_NEW: u32 = 1;
pub const AUDIT_TYPE_REAPED: u32 = 2;


/// Account lifecycle fact, append-only.
#[derive(Debug, Clone, Default, FromRow)]
pub struct AccountAuditRow {
    /// Public key hex, no 0x.
    pub account_id: String,
    #[sqlx(try_from = "i64")]
    pub block_id: u64,
    pub extrinsic_idx: Option<u32>,
    pub event_idx: Option<u32>,
    pub type_id: u32,
}


#[derive(Debug, Clone, Default, FromRow)]
pub struct AccountIndexAuditRow {
    #[sqlx(try_from = "i64")]
    pub account_index: u64,
    pub account_id: Option<String>,
    #[sqlx(try_from = "i64")]
    pub block_id: u64,
    pub extrinsic_idx: Option<u32>,
    pub event_idx: Option<u32>,
    pub type_id: u32,
}


pub async fn insert_account_audit(
    conn: &mut SqliteConnection,
    audit: &AccountAuditRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO account_audits (account_id, block_id, extrinsic_idx, event_idx, type_id)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&audit.account_id)
    .bind(audit.block_id as i64)
    .bind(audit.extrinsic_idx)
    .bind(audit.event_idx)
    .bind(audit.type_id)
    .execute(conn)
    .await?;
    Ok(())
}


pub async fn insert_account_index_audit(
    conn: &mut SqliteConnection,
    audit: &AccountIndexAuditRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO account_index_audits (
            account_index, account_id, block_id, extrinsic_idx, event_idx, type_id
        ) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(audit.account_index as i64)
    .bind(&audit.account_id)
    .bind(audit.block_id as i64)
    .bind(audit.extrinsic_idx)
    .bind(audit.event_idx)
    .bind(audit.type_id)
    .execute(conn)
    .await?;
    Ok(())
}


pub async fn account_audits_by_block(
    conn: &mut SqliteConnection,
    block_id: u64,
) -> Result<Vec<AccountAuditRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT account_id, block_id, extrinsic_idx, event_idx, type_id
         FROM account_audits WHERE block_id = ? ORDER BY id",
    )
    .bind(block_id as i64)
    .fetch_all(conn)
    .await
}


pub async fn account_index_audits_by_block(
    conn: &mut SqliteConnection,
    block_id: u64,
) -> Result<Vec<AccountIndexAuditRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT account_index, account_id, block_id, extrinsic_idx, event_idx, type_id
         FROM account_index_audits WHERE block_id = ? ORDER BY id",
    )
    .bind(block_id as i64)
    .fetch_all(conn)
    .await
}
