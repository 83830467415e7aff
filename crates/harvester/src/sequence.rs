use tracing::info;

use hrv_storage::{
    block_by_id, block_total_by_id, events_by_block, extrinsics_by_block, insert_block_total,
    is_unique_violation, max_sequenced_id, min_block_id, BlockRow, BlockTotalRow,
};

use crate::accumulate::Harvester;
use crate::error::HarvesterError;
use crate::metrics::{BLOCKS_SEQUENCED, SEQUENCER_HEIGHT};


impl Harvester {
    /// Sequences the lowest height that has no totals row yet.
    ///
    /// `Ok(None)` means there is nothing to do: either the store is
    /// empty or the next block is not accumulated yet. The first call
    /// ever also runs the genesis bootstrap, fetching block zero through
    /// the stored parent hash when accumulation stopped at height one.
    pub async fn sequence_next(&self) -> Result<Option<BlockTotalRow>, HarvesterError> {
        let frontier = {
            let mut conn = self.db().pool().acquire().await?;
            max_sequenced_id(&mut conn).await?
        };

        let totals = match frontier {
            Some(parent_id) => {
                let (parent, parent_totals, target) = {
                    let mut conn = self.db().pool().acquire().await?;
                    let parent = block_by_id(&mut conn, parent_id)
                        .await?
                        .ok_or(HarvesterError::Storage(sqlx::Error::RowNotFound))?;
                    let parent_totals = block_total_by_id(&mut conn, parent_id)
                        .await?
                        .ok_or(HarvesterError::Storage(sqlx::Error::RowNotFound))?;
                    let target = block_by_id(&mut conn, parent_id + 1).await?;
                    (parent, parent_totals, target)
                };
                let Some(target) = target else {
                    return Ok(None);
                };
                self.sequence_block(&target, Some(&parent), Some(&parent_totals))
                    .await?
            }
            None => {
                let Some(genesis) = self.ensure_genesis().await? else {
                    return Ok(None);
                };
                let genesis = self.process_genesis(&genesis).await?;
                self.sequence_block(&genesis, None, None).await?
            }
        };
        Ok(Some(totals))
    }

    /// Block zero, fetched through the parent hash of block one when the
    /// accumulated range stops just short of it.
    async fn ensure_genesis(&self) -> Result<Option<BlockRow>, HarvesterError> {
        let lowest = {
            let mut conn = self.db().pool().acquire().await?;
            min_block_id(&mut conn).await?
        };
        let lowest = match lowest {
            Some(lowest) => lowest,
            None => return Ok(None),
        };

        if lowest == 1 {
            let first = {
                let mut conn = self.db().pool().acquire().await?;
                block_by_id(&mut conn, 1)
                    .await?
                    .ok_or(HarvesterError::Storage(sqlx::Error::RowNotFound))?
            };
            match self.add_block(&first.parent_hash).await {
                Ok(_) | Err(HarvesterError::AlreadyAdded(_)) => {}
                Err(e) => return Err(e),
            }
        } else if lowest > 1 {
            return Err(HarvesterError::ChainNotAtGenesis(lowest));
        }

        let mut conn = self.db().pool().acquire().await?;
        block_by_id(&mut conn, 0)
            .await?
            .ok_or(HarvesterError::ChainNotAtGenesis(lowest))
            .map(Some)
    }

    /// Derives and writes the totals row for one block.
    ///
    /// Handlers run in three passes: block processors seed the row from
    /// the parent's totals, then extrinsic and event handlers fold in
    /// their rows, reading them back from the store.
    pub async fn sequence_block(
        &self,
        block: &BlockRow,
        parent: Option<&BlockRow>,
        parent_totals: Option<&BlockTotalRow>,
    ) -> Result<BlockTotalRow, HarvesterError> {
        if block.id > 0 && parent_totals.is_none() {
            return Err(HarvesterError::SequencingOutOfOrder(block.id));
        }

        let mut totals = BlockTotalRow {
            id: block.id,
            ..Default::default()
        };
        let mut tx = self.db().begin().await?;

        for processor in self.processors().block_processors() {
            processor
                .sequencing_hook(&mut tx, block, parent, parent_totals, &mut totals)
                .await?;
        }

        let extrinsics = extrinsics_by_block(&mut tx, block.id).await?;
        for extrinsic in &extrinsics {
            for processor in self
                .processors()
                .extrinsic_processors(&extrinsic.module_id, &extrinsic.call_id)
            {
                processor
                    .sequencing_hook(&mut tx, block, extrinsic, parent, parent_totals, &mut totals)
                    .await?;
            }
        }

        let events = events_by_block(&mut tx, block.id).await?;
        for event in &events {
            for processor in self
                .processors()
                .event_processors(&event.module_id, &event.event_id)
            {
                processor
                    .sequencing_hook(&mut tx, block, event, parent, parent_totals, &mut totals)
                    .await?;
            }
        }

        match insert_block_total(&mut tx, &totals).await {
            Ok(()) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(HarvesterError::AlreadySequenced(block.id))
            }
            Err(e) => return Err(e.into()),
        }
        tx.commit().await?;

        BLOCKS_SEQUENCED.inc();
        SEQUENCER_HEIGHT.set(block.id as i64);
        info!(block = block.id, "block sequenced");
        Ok(totals)
    }
}
