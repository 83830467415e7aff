use async_trait::async_trait;
use sqlx::SqliteConnection;

use hrv_storage::{
    insert_account_index_audit, AccountIndexAuditRow, BlockRow, EventRow, ExtrinsicRow,
    AUDIT_TYPE_NEW,
};

use crate::error::HarvesterError;
use crate::processors::{event_param_account, event_param_u64, EventProcessor};


/// `indices.NewAccountIndex` maps a short index to an account id.
pub struct NewAccountIndexProcessor;

#[async_trait]
impl EventProcessor for NewAccountIndexProcessor {
    fn module_id(&self) -> &'static str {
        "indices"
    }

    fn event_id(&self) -> &'static str {
        "NewAccountIndex"
    }

    async fn accumulation_hook(
        &self,
        conn: &mut SqliteConnection,
        block: &mut BlockRow,
        event: &EventRow,
        _extrinsic: Option<&ExtrinsicRow>,
    ) -> Result<(), HarvesterError> {
        let Some(account_index) = event_param_u64(&event.attributes, 1) else {
            return Ok(());
        };
        insert_account_index_audit(
            conn,
            &AccountIndexAuditRow {
                account_index,
                account_id: event_param_account(&event.attributes, 0),
                block_id: block.id,
                extrinsic_idx: event.extrinsic_idx,
                event_idx: Some(event.event_idx),
                type_id: AUDIT_TYPE_NEW,
            },
        )
        .await?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use hrv_storage::Database;

    #[tokio::test]
    async fn index_audit_is_written() {
        let db = Database::open_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let mut block = BlockRow {
            id: 12,
            ..Default::default()
        };
        let event = EventRow {
            block_id: 12,
            event_idx: 3,
            extrinsic_idx: Some(1),
            attributes: format!(
                r#"[{{"type":"AccountId","value":"0x{0}","valueRaw":"{0}"}},{{"type":"AccountIndex","value":517,"valueRaw":"05020000"}}]"#,
                "ee".repeat(32)
            ),
            ..Default::default()
        };
        NewAccountIndexProcessor
            .accumulation_hook(&mut conn, &mut block, &event, None)
            .await
            .unwrap();

        let (index, account): (i64, String) = sqlx::query_as(
            "SELECT account_index, account_id FROM account_index_audits",
        )
        .fetch_one(&mut *conn)
        .await
        .unwrap();
        assert_eq!(index, 517);
        assert_eq!(account, "ee".repeat(32));
    }
}
