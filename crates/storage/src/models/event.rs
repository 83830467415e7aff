use sqlx::{FromRow, SqliteConnection};


#[derive(Debug, Clone, Default, FromRow)]
pub struct EventRow {
    #[sqlx(try_from = "i64")]
    pub block_id: u64,
    pub event_idx: u32,
    /// 0 during extrinsic application, 1 at finalization.
    pub phase: u32,
    /// Index into the block's extrinsics; lookup only, may be out of range.
    pub extrinsic_idx: Option<u32>,
    #[sqlx(rename = "type")]
    pub event_type: String,
    pub module_id: String,
    pub event_id: String,
    pub system: u32,
    pub module: u32,
    pub attributes: String,
    pub spec_version_id: u32,
    pub codec_error: u32,
}


pub async fn insert_event(conn: &mut SqliteConnection, event: &EventRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO events (
            block_id, event_idx, phase, extrinsic_idx, type, module_id,
            event_id, system, module, attributes, spec_version_id, codec_error
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(event.block_id as i64)
    .bind(event.event_idx)
    .bind(event.phase)
    .bind(event.extrinsic_idx)
    .bind(&event.event_type)
    .bind(&event.module_id)
    .bind(&event.event_id)
    .bind(event.system)
    .bind(event.module)
    .bind(&event.attributes)
    .bind(event.spec_version_id)
    .bind(event.codec_error)
    .execute(conn)
    .await?;
    Ok(())
}


pub async fn events_by_block(
    conn: &mut SqliteConnection,
    block_id: u64,
) -> Result<Vec<EventRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM events WHERE block_id = ? ORDER BY event_idx")
        .bind(block_id as i64)
        .fetch_all(conn)
        .await
}
