use async_trait::async_trait;
use sqlx::SqliteConnection;

use hrv_storage::{insert_session, BlockRow, EventRow, ExtrinsicRow};

use crate::error::HarvesterError;
use crate::processors::{event_param_u64, EventProcessor};


/// `session.NewSession` opens validator session N at this block.
pub struct NewSessionProcessor;

#[async_trait]
impl EventProcessor for NewSessionProcessor {
    fn module_id(&self) -> &'static str {
        "session"
    }

    fn event_id(&self) -> &'static str {
        "NewSession"
    }

    async fn accumulation_hook(
        &self,
        conn: &mut SqliteConnection,
        block: &mut BlockRow,
        event: &EventRow,
        _extrinsic: Option<&ExtrinsicRow>,
    ) -> Result<(), HarvesterError> {
        block.count_sessions_new += 1;
        if let Some(session_id) = event_param_u64(&event.attributes, 0) {
            insert_session(conn, session_id).await?;
        }
        Ok(())
    }
}
