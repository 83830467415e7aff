use sqlx::{FromRow, SqliteConnection};


#[derive(Debug, Clone, Default, FromRow)]
pub struct ExtrinsicRow {
    #[sqlx(try_from = "i64")]
    pub block_id: u64,
    pub extrinsic_idx: u32,
    /// Hex digest of the raw bytes, signed extrinsics only.
    pub extrinsic_hash: Option<String>,
    pub extrinsic_length: u32,
    pub extrinsic_version: u32,
    pub signed: u32,
    pub unsigned: u32,
    pub signedby_address: u32,
    pub signedby_index: u32,
    pub address_length: Option<u32>,
    pub address: Option<String>,
    #[sqlx(try_from = "crate::SqlxOption<i64>")]
    pub account_index: Option<u64>,
    pub signature: Option<String>,
    pub nonce: Option<i64>,
    pub era: Option<String>,
    /// Two byte call code, hex.
    pub call: String,
    pub module_id: String,
    pub call_id: String,
    pub params: String,
    pub success: u32,
    pub error: u32,
    pub spec_version_id: u32,
    pub codec_error: u32,
}


pub async fn insert_extrinsic(
    conn: &mut SqliteConnection,
    extrinsic: &ExtrinsicRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO extrinsics (
            block_id, extrinsic_idx, extrinsic_hash, extrinsic_length,
            extrinsic_version, signed, unsigned, signedby_address,
            signedby_index, address_length, address, account_index,
            signature, nonce, era, call, module_id, call_id, params,
            success, error, spec_version_id, codec_error
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(extrinsic.block_id as i64)
    .bind(extrinsic.extrinsic_idx)
    .bind(&extrinsic.extrinsic_hash)
    .bind(extrinsic.extrinsic_length)
    .bind(extrinsic.extrinsic_version)
    .bind(extrinsic.signed)
    .bind(extrinsic.unsigned)
    .bind(extrinsic.signedby_address)
    .bind(extrinsic.signedby_index)
    .bind(extrinsic.address_length)
    .bind(&extrinsic.address)
    .bind(extrinsic.account_index.map(|v| v as i64))
    .bind(&extrinsic.signature)
    .bind(extrinsic.nonce)
    .bind(&extrinsic.era)
    .bind(&extrinsic.call)
    .bind(&extrinsic.module_id)
    .bind(&extrinsic.call_id)
    .bind(&extrinsic.params)
    .bind(extrinsic.success)
    .bind(extrinsic.error)
    .bind(extrinsic.spec_version_id)
    .bind(extrinsic.codec_error)
    .execute(conn)
    .await?;
    Ok(())
}


pub async fn extrinsics_by_block(
    conn: &mut SqliteConnection,
    block_id: u64,
) -> Result<Vec<ExtrinsicRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM extrinsics WHERE block_id = ? ORDER BY extrinsic_idx")
        .bind(block_id as i64)
        .fetch_all(conn)
        .await
}
