use async_trait::async_trait;
use sqlx::SqliteConnection;

use hrv_storage::{
    insert_account_audit, AccountAuditRow, BlockRow, BlockTotalRow, EventRow, ExtrinsicRow,
    AUDIT_TYPE_NEW, AUDIT_TYPE_REAPED,
};

use crate::error::HarvesterError;
use crate::processors::{event_param_account, EventProcessor};


/// `balances.Transfer` feeds the running transfer total. The transfer
/// row itself is written during accumulation, next to its extrinsic.
pub struct TransferEventProcessor;

#[async_trait]
impl EventProcessor for TransferEventProcessor {
    fn module_id(&self) -> &'static str {
        "balances"
    }

    fn event_id(&self) -> &'static str {
        "Transfer"
    }

    async fn sequencing_hook(
        &self,
        _conn: &mut SqliteConnection,
        _block: &BlockRow,
        _event: &EventRow,
        _parent: Option<&BlockRow>,
        _parent_totals: Option<&BlockTotalRow>,
        totals: &mut BlockTotalRow,
    ) -> Result<(), HarvesterError> {
        totals.total_transfers += 1;
        Ok(())
    }
}


/// `balances.NewAccount` bumps the block's account counters and leaves
/// an audit fact for the account's first sighting.
pub struct NewAccountProcessor;

#[async_trait]
impl EventProcessor for NewAccountProcessor {
    fn module_id(&self) -> &'static str {
        "balances"
    }

    fn event_id(&self) -> &'static str {
        "NewAccount"
    }

    async fn accumulation_hook(
        &self,
        conn: &mut SqliteConnection,
        block: &mut BlockRow,
        event: &EventRow,
        _extrinsic: Option<&ExtrinsicRow>,
    ) -> Result<(), HarvesterError> {
        block.count_accounts_new += 1;
        block.count_accounts += 1;
        if let Some(account_id) = event_param_account(&event.attributes, 0) {
            insert_account_audit(
                conn,
                &AccountAuditRow {
                    account_id,
                    block_id: block.id,
                    extrinsic_idx: event.extrinsic_idx,
                    event_idx: Some(event.event_idx),
                    type_id: AUDIT_TYPE_NEW,
                },
            )
            .await?;
        }
        Ok(())
    }
}


pub struct ReapedAccountProcessor;

#[async_trait]
impl EventProcessor for ReapedAccountProcessor {
    fn module_id(&self) -> &'static str {
        "balances"
    }

    fn event_id(&self) -> &'static str {
        "ReapedAccount"
    }

    async fn accumulation_hook(
        &self,
        conn: &mut SqliteConnection,
        block: &mut BlockRow,
        event: &EventRow,
        _extrinsic: Option<&ExtrinsicRow>,
    ) -> Result<(), HarvesterError> {
        block.count_accounts_reaped += 1;
        block.count_accounts = block.count_accounts.saturating_sub(1);
        if let Some(account_id) = event_param_account(&event.attributes, 0) {
            insert_account_audit(
                conn,
                &AccountAuditRow {
                    account_id,
                    block_id: block.id,
                    extrinsic_idx: event.extrinsic_idx,
                    event_idx: Some(event.event_idx),
                    type_id: AUDIT_TYPE_REAPED,
                },
            )
            .await?;
        }
        Ok(())
    }
}
