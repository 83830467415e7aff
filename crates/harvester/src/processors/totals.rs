use async_trait::async_trait;
use sqlx::SqliteConnection;

use hrv_storage::{BlockRow, BlockTotalRow};

use crate::error::HarvesterError;
use crate::processors::BlockProcessor;


/// Seeds a block's totals row from the parent's totals plus the block's
/// own counters. Event-level sequencing handlers run afterwards and add
/// what only they can see, so this must stay the first block processor.
pub struct BlockTotalProcessor;

#[async_trait]
impl BlockProcessor for BlockTotalProcessor {
    async fn sequencing_hook(
        &self,
        _conn: &mut SqliteConnection,
        block: &BlockRow,
        parent: Option<&BlockRow>,
        parent_totals: Option<&BlockTotalRow>,
        totals: &mut BlockTotalRow,
    ) -> Result<(), HarvesterError> {
        let base = parent_totals.cloned().unwrap_or_default();

        totals.id = block.id;
        totals.parent_datetime = parent.and_then(|p| p.datetime);
        totals.blocktime = match (block.datetime, totals.parent_datetime) {
            (Some(own), Some(parent)) => (own - parent) / 1000,
            _ => 0,
        };
        totals.total_blocktime = base.total_blocktime + totals.blocktime;

        totals.total_extrinsics = base.total_extrinsics + u64::from(block.count_extrinsics);
        totals.total_extrinsics_success =
            base.total_extrinsics_success + u64::from(block.count_extrinsics_success);
        totals.total_extrinsics_error =
            base.total_extrinsics_error + u64::from(block.count_extrinsics_error);
        totals.total_extrinsics_signed =
            base.total_extrinsics_signed + u64::from(block.count_extrinsics_signed);
        totals.total_extrinsics_unsigned =
            base.total_extrinsics_unsigned + u64::from(block.count_extrinsics_unsigned);
        totals.total_extrinsics_signedby_address = base.total_extrinsics_signedby_address
            + u64::from(block.count_extrinsics_signedby_address);
        totals.total_extrinsics_signedby_index = base.total_extrinsics_signedby_index
            + u64::from(block.count_extrinsics_signedby_index);

        totals.total_events = base.total_events + u64::from(block.count_events);
        totals.total_events_system =
            base.total_events_system + u64::from(block.count_events_system);
        totals.total_events_module =
            base.total_events_module + u64::from(block.count_events_module);
        totals.total_events_extrinsic =
            base.total_events_extrinsic + u64::from(block.count_events_extrinsic);
        totals.total_events_finalization =
            base.total_events_finalization + u64::from(block.count_events_finalization);

        totals.total_accounts_new = base.total_accounts_new + u64::from(block.count_accounts_new);
        totals.total_accounts_reaped =
            base.total_accounts_reaped + u64::from(block.count_accounts_reaped);
        totals.total_accounts = (base.total_accounts + u64::from(block.count_accounts_new))
            .saturating_sub(u64::from(block.count_accounts_reaped));

        totals.total_sessions_new = base.total_sessions_new + u64::from(block.count_sessions_new);
        totals.total_contracts_new =
            base.total_contracts_new + u64::from(block.count_contracts_new);
        totals.total_logs = base.total_logs + u64::from(block.count_log);

        // event handlers add per-event totals on top of this seed
        totals.total_transfers = base.total_transfers;
        Ok(())
    }
}
