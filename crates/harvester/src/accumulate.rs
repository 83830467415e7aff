use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value as JsonValue};
use tracing::{info, warn};

use hrv_primitives::{decode_hex, unprefix};
use hrv_scale::{ss58_encode, BabePreDigest, DigestLog, ScaleError};
use hrv_storage::{
    block_by_parent_hash, block_exists, blocks_missing_account_index, insert_account_audit,
    insert_account_index_audit, insert_block, insert_event, insert_extrinsic, insert_log,
    insert_session, insert_transfer, is_unique_violation, logs_by_block_and_type,
    set_account_index, update_genesis_block, AccountAuditRow, AccountIndexAuditRow, BlockRow,
    Database, EventRow, ExtrinsicRow, LogRow, TransferRow, AUDIT_TYPE_NEW,
};

use crate::decoder::{self, DecodedExtrinsic, EventRecord};
use crate::error::HarvesterError;
use crate::gateway::CodecGateway;
use crate::metadata::MetadataCache;
use crate::metrics::BLOCKS_ADDED;
use crate::processors::ProcessorRegistry;


/// The ingestion engine. One instance per process, shared by workers.
pub struct Harvester {
    db: Database,
    gateway: Arc<CodecGateway>,
    metadata: MetadataCache,
    processors: ProcessorRegistry,
    debug_capture: bool,
}

impl Harvester {
    pub fn new(db: Database, gateway: Arc<CodecGateway>, debug_capture: bool) -> Self {
        Harvester {
            db,
            gateway,
            metadata: MetadataCache::new(),
            processors: ProcessorRegistry::standard(),
            debug_capture,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn gateway(&self) -> &CodecGateway {
        &self.gateway
    }

    pub(crate) fn processors(&self) -> &ProcessorRegistry {
        &self.processors
    }

    /// Fetches, decodes and persists one block with everything it owns:
    /// extrinsics, events, digest logs, transfers and audit facts, in a
    /// single transaction.
    pub async fn add_block(&self, block_hash: &str) -> Result<BlockRow, HarvesterError> {
        let block = self
            .add_block_inner(block_hash)
            .await
            .map_err(|e| e.for_block(block_hash))?;
        BLOCKS_ADDED.inc();
        info!(
            block = block.id,
            extrinsics = block.count_extrinsics,
            events = block.count_events,
            "block added"
        );
        Ok(block)
    }

    async fn add_block_inner(&self, block_hash: &str) -> Result<BlockRow, HarvesterError> {
        {
            let mut conn = self.db.pool().acquire().await?;
            if block_exists(&mut conn, block_hash).await? {
                return Err(HarvesterError::AlreadyAdded(block_hash.to_string()));
            }
        }

        let signed_block = self.gateway.chain_block(block_hash).await?;
        let header = &signed_block.block.header;
        let block_id = header.number()?;

        let own_version = self.gateway.runtime_version(block_hash).await?;
        let spec_version = own_version.spec_version;
        let own_meta = self
            .metadata
            .get_or_load(&self.db, &self.gateway, &own_version, block_hash)
            .await?;

        // events and extrinsics of a block follow the runtime that was
        // active when it was authored, which is the parent's runtime
        let (parent_spec_version, parent_meta) = if block_id > 0 {
            let parent_version = self.gateway.runtime_version(&header.parent_hash).await?;
            let meta = self
                .metadata
                .get_or_load(&self.db, &self.gateway, &parent_version, &header.parent_hash)
                .await?;
            (parent_version.spec_version, meta)
        } else {
            (spec_version, own_meta)
        };

        let events = match self.gateway.block_events(block_hash, &parent_meta).await {
            Ok(events) => events,
            Err(e) => {
                warn!(block = block_id, error = %e, "events unavailable, storing the block without them");
                Vec::new()
            }
        };

        let mut block = BlockRow {
            id: block_id,
            parent_id: block_id.checked_sub(1),
            hash: block_hash.to_string(),
            parent_hash: header.parent_hash.clone(),
            state_root: header.state_root.clone(),
            extrinsics_root: header.extrinsics_root.clone(),
            range10000: (block_id / 10_000) as u32,
            range100000: (block_id / 100_000) as u32,
            range1000000: (block_id / 1_000_000) as u32,
            spec_version_id: spec_version,
            logs: json!(&header.digest.logs).to_string(),
            ..Default::default()
        };

        let mut log_rows = Vec::with_capacity(header.digest.logs.len());
        for (log_idx, raw_log) in header.digest.logs.iter().enumerate() {
            let bytes = decode_hex(raw_log)
                .map_err(|e| ScaleError::invalid(format!("digest log {log_idx}: {e}")))?;
            let log = DigestLog::decode(&bytes)?;
            if log.name == "PreRuntime" && log.data["engine"] == "BABE" {
                block.slot_number = babe_slot(&log.data);
            }
            log_rows.push(LogRow {
                block_id,
                log_idx: log_idx as u32,
                type_id: u32::from(log.index),
                log_type: log.name.to_string(),
                data: log.data.to_string(),
            });
        }
        block.count_log = log_rows.len() as u32;

        let mut success_by_idx: HashMap<u32, bool> = HashMap::new();
        let mut event_rows = Vec::with_capacity(events.len());
        for (event_idx, event) in events.iter().enumerate() {
            let system = event.module_id == "system";
            match event.phase {
                0 => block.count_events_extrinsic += 1,
                1 => block.count_events_finalization += 1,
                _ => {}
            }
            if system {
                block.count_events_system += 1;
                if event.event_id == "ExtrinsicSuccess" {
                    block.count_extrinsics_success += 1;
                    if let Some(idx) = event.extrinsic_idx {
                        success_by_idx.insert(idx, true);
                    }
                } else if event.event_id == "ExtrinsicFailed" {
                    block.count_extrinsics_error += 1;
                    if let Some(idx) = event.extrinsic_idx {
                        success_by_idx.insert(idx, false);
                    }
                }
            } else {
                block.count_events_module += 1;
            }
            event_rows.push(EventRow {
                block_id,
                event_idx: event_idx as u32,
                phase: event.phase,
                extrinsic_idx: event.extrinsic_idx,
                event_type: event.lookup.clone(),
                module_id: event.module_id.clone(),
                event_id: event.event_id.clone(),
                system: u32::from(system),
                module: u32::from(!system),
                attributes: event.attributes.to_string(),
                spec_version_id: parent_spec_version,
                codec_error: 0,
            });
        }
        block.count_events = events.len() as u32;

        let layout = decoder::signer_layout(block_hash);
        block.count_extrinsics = signed_block.block.extrinsics.len() as u32;
        let mut extrinsic_rows = Vec::with_capacity(signed_block.block.extrinsics.len());
        for (idx, raw_hex) in signed_block.block.extrinsics.iter().enumerate() {
            let raw = decode_hex(raw_hex)
                .map_err(|e| ScaleError::invalid(format!("extrinsic {idx}: {e}")))?;
            let decoded =
                decoder::decode_extrinsic(self.gateway.registry(), &parent_meta, &raw, layout)?;

            if decoded.signed {
                block.count_extrinsics_signed += 1;
                let address = decoded.address.as_ref();
                if address.is_some_and(|a| a.account_id_hex().is_some()) {
                    block.count_extrinsics_signedby_address += 1;
                }
                if address.is_some_and(|a| a.account_index().is_some()) {
                    block.count_extrinsics_signedby_index += 1;
                }
            } else {
                block.count_extrinsics_unsigned += 1;
            }

            let success = success_by_idx.get(&(idx as u32)).copied().unwrap_or(false);
            let row = ExtrinsicRow {
                block_id,
                extrinsic_idx: idx as u32,
                extrinsic_hash: decoded.hash.clone(),
                extrinsic_length: decoded.length,
                extrinsic_version: u32::from(decoded.version_info),
                signed: u32::from(decoded.signed),
                unsigned: u32::from(!decoded.signed),
                signedby_address: u32::from(
                    decoded.address.as_ref().is_some_and(|a| a.account_id_hex().is_some()),
                ),
                signedby_index: u32::from(
                    decoded.address.as_ref().is_some_and(|a| a.account_index().is_some()),
                ),
                address_length: decoded.address_kind.map(u32::from),
                address: decoded.address.as_ref().and_then(|a| a.account_id_hex()),
                account_index: decoded.address.as_ref().and_then(|a| a.account_index()),
                signature: decoded.signature.clone(),
                nonce: decoded.nonce.map(|n| n as i64),
                era: decoded.era.clone(),
                call: decoded.call.clone(),
                module_id: decoded.module_id.clone(),
                call_id: decoded.call_id.clone(),
                params: decoded.params.to_string(),
                success: u32::from(success),
                error: u32::from(!success),
                spec_version_id: parent_spec_version,
                codec_error: u32::from(decoded.codec_error),
            };
            let transfer = if decoded.call_id == "transfer" {
                self.build_transfer(&row, &decoded, &events)
            } else {
                None
            };
            extrinsic_rows.push((row, transfer));
        }

        let mut tx = self.db.begin().await?;
        for row in &event_rows {
            insert_event(&mut tx, row)
                .await
                .map_err(|e| insert_error(block_hash, e))?;
        }

        for (row, transfer) in &mut extrinsic_rows {
            insert_extrinsic(&mut tx, row)
                .await
                .map_err(|e| insert_error(block_hash, e))?;
            if let Some(transfer) = transfer {
                transfer.block_timestamp = block.datetime;
                insert_transfer(&mut tx, transfer)
                    .await
                    .map_err(|e| insert_error(block_hash, e))?;
            }
            for processor in self.processors.extrinsic_processors(&row.module_id, &row.call_id) {
                processor.accumulation_hook(&mut tx, &mut block, row).await?;
            }
        }

        for row in &event_rows {
            let extrinsic = row
                .extrinsic_idx
                .and_then(|idx| extrinsic_rows.get(idx as usize))
                .map(|(row, _)| row);
            for processor in self.processors.event_processors(&row.module_id, &row.event_id) {
                processor
                    .accumulation_hook(&mut tx, &mut block, row, extrinsic)
                    .await?;
            }
        }

        for processor in self.processors.block_processors() {
            processor.accumulation_hook(&mut tx, &mut block).await?;
        }

        for log in &log_rows {
            insert_log(&mut tx, log).await?;
        }

        if self.debug_capture {
            block.debug_info = serde_json::to_string(&signed_block).ok();
        }

        insert_block(&mut tx, &block)
            .await
            .map_err(|e| insert_error(block_hash, e))?;
        tx.commit().await?;
        Ok(block)
    }

    /// Transfer row for a `transfer` call.
    ///
    /// The canonical parties come from the `balances.Transfer` event the
    /// call raised; a failed call raises none, so the call's own signer
    /// and destination stand in. `None` when neither names both sides.
    fn build_transfer(
        &self,
        extrinsic: &ExtrinsicRow,
        decoded: &DecodedExtrinsic,
        events: &[EventRecord],
    ) -> Option<TransferRow> {
        let parties = events
            .iter()
            .find(|e| {
                e.module_id == "balances"
                    && e.event_id == "Transfer"
                    && e.extrinsic_idx == Some(extrinsic.extrinsic_idx)
            })
            .and_then(|e| {
                let attrs = e.attributes.as_array()?;
                let from = account_hex(attrs.first()?.get("value")?)?;
                let to = account_hex(attrs.get(1)?.get("value")?)?;
                Some((from, to))
            });
        let (from_raw, to_raw) = match parties {
            Some(parties) => parties,
            None => {
                let from = extrinsic.address.clone()?;
                let to = account_hex(decoded.params.as_array()?.first()?.get("value")?)?;
                (from, to)
            }
        };

        let params = decoded.params.as_array()?;
        let amount_param = if params.len() > 1 { &params[1] } else { params.first()? };
        let amount = amount_text(amount_param.get("value")?)?;

        let format = self.gateway.ss58_format();
        Some(TransferRow {
            block_id: extrinsic.block_id,
            extrinsic_idx: extrinsic.extrinsic_idx,
            data_extrinsic_idx: format!("{}_{}", extrinsic.block_id, extrinsic.extrinsic_idx),
            transfer_from: ss58_encode(&decode_hex(&from_raw).ok()?, format).ok()?,
            from_raw,
            transfer_to: ss58_encode(&decode_hex(&to_raw).ok()?, format).ok()?,
            to_raw,
            hash: extrinsic.extrinsic_hash.clone(),
            amount,
            module_id: extrinsic.module_id.clone(),
            success: extrinsic.success,
            error: extrinsic.error,
            block_timestamp: None,
        })
    }

    /// Seeds genesis-only facts: the datetime copied from the child
    /// block, the enumerated initial account set and session zero.
    pub async fn process_genesis(&self, block: &BlockRow) -> Result<BlockRow, HarvesterError> {
        let mut block = block.clone();
        let meta = match self.metadata.get(block.spec_version_id) {
            Some(meta) => meta,
            None => {
                let version = self.gateway.runtime_version(&block.hash).await?;
                self.metadata
                    .get_or_load(&self.db, &self.gateway, &version, &block.hash)
                    .await?
            }
        };

        // genesis itself has no timestamp extrinsic
        {
            let mut conn = self.db.pool().acquire().await?;
            if let Some(child) = block_by_parent_hash(&mut conn, &block.hash).await? {
                block.datetime = child.datetime;
            }
        }

        let mut audits: Vec<(u64, String)> = Vec::new();
        if meta.storage_entry("indices", "NextEnumSet").is_some()
            && meta.storage_entry("indices", "EnumSet").is_some()
        {
            let page_count = self
                .gateway
                .storage_value(&block.hash, "indices", "NextEnumSet", &[], &meta)
                .await?
                .and_then(|v| v.as_u64())
                .unwrap_or(0);
            block.count_accounts = 0;
            block.count_accounts_new = 0;
            for page in 0..=page_count {
                let params = (page as u32).to_le_bytes();
                let accounts = match self
                    .gateway
                    .storage_value(&block.hash, "indices", "EnumSet", &params, &meta)
                    .await?
                {
                    Some(JsonValue::Array(accounts)) => accounts,
                    _ => continue,
                };
                block.count_accounts += accounts.len() as u32;
                block.count_accounts_new += accounts.len() as u32;
                for (idx, account) in accounts.iter().enumerate() {
                    let Some(account_id) = account.as_str() else {
                        continue;
                    };
                    // enum set pages hold 64 indices each
                    audits.push((page * 64 + idx as u64, unprefix(account_id).to_string()));
                }
            }
        }

        let mut tx = self.db.begin().await?;
        for (account_index, account_id) in &audits {
            insert_account_audit(
                &mut tx,
                &AccountAuditRow {
                    account_id: account_id.clone(),
                    block_id: block.id,
                    extrinsic_idx: None,
                    event_idx: None,
                    type_id: AUDIT_TYPE_NEW,
                },
            )
            .await?;
            insert_account_index_audit(
                &mut tx,
                &AccountIndexAuditRow {
                    account_index: *account_index,
                    account_id: Some(account_id.clone()),
                    block_id: block.id,
                    extrinsic_idx: None,
                    event_idx: None,
                    type_id: AUDIT_TYPE_NEW,
                },
            )
            .await?;
        }
        update_genesis_block(&mut tx, &block).await?;
        insert_session(&mut tx, 0).await?;
        tx.commit().await?;
        info!(accounts = audits.len(), "genesis bootstrap complete");
        Ok(block)
    }

    /// Fills in the authoring validator index for blocks that were stored
    /// without one, reading it back out of their BABE pre-runtime log.
    pub async fn backfill_author_indices(&self, limit: u32) -> Result<usize, HarvesterError> {
        let pending = {
            let mut conn = self.db.pool().acquire().await?;
            blocks_missing_account_index(&mut conn, limit).await?
        };
        let mut updated = 0;
        for block_id in pending {
            let mut conn = self.db.pool().acquire().await?;
            let logs = logs_by_block_and_type(&mut conn, block_id, "PreRuntime").await?;
            let Some(authority) = logs.first().and_then(|log| authority_from_log(&log.data)) else {
                continue;
            };
            set_account_index(&mut conn, block_id, authority).await?;
            updated += 1;
        }
        Ok(updated)
    }
}


fn insert_error(block_hash: &str, e: sqlx::Error) -> HarvesterError {
    if is_unique_violation(&e) {
        HarvesterError::AlreadyAdded(block_hash.to_string())
    } else {
        HarvesterError::Storage(e)
    }
}


fn babe_slot(data: &JsonValue) -> Option<i64> {
    let raw = decode_hex(data.get("data")?.as_str()?).ok()?;
    let digest = BabePreDigest::decode(&raw).ok()?;
    Some(digest.slot_number as i64)
}


/// Stored logs carry `{"engine": "...", "data": "0x..."}` payloads.
fn authority_from_log(data: &str) -> Option<u32> {
    let value: JsonValue = serde_json::from_str(data).ok()?;
    if value.get("engine")?.as_str()? != "BABE" {
        return None;
    }
    let raw = decode_hex(value.get("data")?.as_str()?).ok()?;
    let digest = BabePreDigest::decode(&raw).ok()?;
    Some(digest.authority_index)
}


/// 32 byte account hex (no 0x) out of a decoded parameter value.
fn account_hex(value: &JsonValue) -> Option<String> {
    let text = unprefix(value.as_str()?);
    (text.len() == 64).then(|| text.to_string())
}


fn amount_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::String(s) if s.chars().all(|c| c.is_ascii_digit()) => Some(s.clone()),
        _ => None,
    }
}
