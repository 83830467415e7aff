use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parity_scale_codec::Encode;

use hrv_client::{
    BlockJson, DigestJson, HeaderJson, NodeClient, RpcError, RuntimeVersionJson, SignedBlockJson,
};
use hrv_harvester::{CodecGateway, Harvester, HarvesterError};
use hrv_primitives::BlockNumber;
use hrv_scale::{
    blake2_256, legacy_storage_key, ss58_encode, EventMetadata, ExtrinsicMetadata,
    FunctionArgumentMetadata, FunctionMetadata, MetadataV12, ModuleConstantMetadata,
    ModuleMetadataV12, RuntimeMetadata, RuntimeMetadataPrefixed, StorageEntryMetadata,
    StorageEntryModifier, StorageEntryType, StorageHasher, StorageMetadata, TypeRegistry,
    METADATA_MAGIC,
};
use hrv_storage::{
    account_audits_by_block, account_index_audits_by_block, block_by_id, block_total_by_id,
    blocks_missing_account_index, count_block_totals, count_blocks, count_sessions,
    events_by_block, extrinsics_by_block, logs_by_block, runtime_by_spec_version,
    runtime_module_ids, runtime_type_exists, session_exists, transfers_by_block, Database,
    AUDIT_TYPE_NEW,
};


const HEAD: u64 = 5;
const SPEC: u32 = 1;
const SS58_FORMAT: u16 = 42;
const GENESIS_PARENT: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000000";
const SIGNER: [u8; 32] = [0x11; 32];
const DEST: [u8; 32] = [0x22; 32];
const DEST_FAILED: [u8; 32] = [0x33; 32];
const GENESIS_ACCOUNTS: [[u8; 32]; 2] = [[0xaa; 32], [0xbb; 32]];


fn block_hash(id: u64) -> String {
    format!("0x{:064x}", 0xb10c_0000u64 + id)
}


fn millis(id: u64) -> i64 {
    1_574_000_000_000 + id as i64 * 6_000
}


fn compact(value: u64) -> Vec<u8> {
    match value {
        0..=63 => vec![(value as u8) << 2],
        64..=16_383 => (((value as u16) << 2) | 0b01).to_le_bytes().to_vec(),
        16_384..=1_073_741_823 => (((value as u32) << 2) | 0b10).to_le_bytes().to_vec(),
        _ => {
            let bytes = value.to_le_bytes();
            let len = 8 - value.leading_zeros() as usize / 8;
            let mut out = vec![(((len - 4) as u8) << 2) | 0b11];
            out.extend_from_slice(&bytes[..len]);
            out
        }
    }
}


fn hex0x(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}


fn with_length_prefix(payload: Vec<u8>) -> Vec<u8> {
    let mut raw = compact(payload.len() as u64);
    raw.extend_from_slice(&payload);
    raw
}


fn babe_log(authority: u32, slot: u64) -> String {
    let mut raw = vec![6];
    raw.extend_from_slice(b"BABE");
    raw.extend_from_slice(&compact(13));
    raw.push(2);
    raw.extend_from_slice(&authority.to_le_bytes());
    raw.extend_from_slice(&slot.to_le_bytes());
    hex0x(&raw)
}


fn timestamp_extrinsic(now: u64) -> String {
    let mut payload = vec![0x04, 0x02, 0x00];
    payload.extend_from_slice(&compact(now));
    hex0x(&with_length_prefix(payload))
}


fn transfer_extrinsic(dest: &[u8; 32], value: u64, nonce: u64) -> String {
    let mut payload = vec![0x84, 0xff];
    payload.extend_from_slice(&SIGNER);
    payload.push(0x01);
    payload.extend_from_slice(&[0x55; 64]);
    payload.push(0x00);
    payload.extend_from_slice(&compact(nonce));
    payload.extend_from_slice(&compact(0));
    payload.extend_from_slice(&[0x04, 0x00, 0xff]);
    payload.extend_from_slice(dest);
    payload.extend_from_slice(&compact(value));
    hex0x(&with_length_prefix(payload))
}


fn success_event(extrinsic_idx: u32) -> Vec<u8> {
    let mut record = vec![0x00];
    record.extend_from_slice(&extrinsic_idx.to_le_bytes());
    record.extend_from_slice(&[0x00, 0x00]);
    record.extend_from_slice(&compact(0));
    record
}


fn failed_event(extrinsic_idx: u32) -> Vec<u8> {
    let mut record = vec![0x00];
    record.extend_from_slice(&extrinsic_idx.to_le_bytes());
    record.extend_from_slice(&[0x00, 0x01]);
    record.extend_from_slice(&compact(0));
    record
}


fn new_account_event(extrinsic_idx: u32, account: &[u8; 32], balance: u128) -> Vec<u8> {
    let mut record = vec![0x00];
    record.extend_from_slice(&extrinsic_idx.to_le_bytes());
    record.extend_from_slice(&[0x04, 0x00]);
    record.extend_from_slice(account);
    record.extend_from_slice(&balance.to_le_bytes());
    record.extend_from_slice(&compact(0));
    record
}


fn transfer_event(extrinsic_idx: u32, from: &[u8; 32], to: &[u8; 32], amount: u128) -> Vec<u8> {
    let mut record = vec![0x00];
    record.extend_from_slice(&extrinsic_idx.to_le_bytes());
    record.extend_from_slice(&[0x04, 0x02]);
    record.extend_from_slice(from);
    record.extend_from_slice(to);
    record.extend_from_slice(&amount.to_le_bytes());
    record.extend_from_slice(&compact(0));
    record
}


fn events_value(records: &[Vec<u8>]) -> Vec<u8> {
    let mut raw = compact(records.len() as u64);
    for record in records {
        raw.extend_from_slice(record);
    }
    raw
}


fn plain_entry(name: &str, ty: &str) -> StorageEntryMetadata {
    StorageEntryMetadata {
        name: name.to_string(),
        modifier: StorageEntryModifier::Default,
        ty: StorageEntryType::Plain(ty.to_string()),
        default: Vec::new(),
        documentation: Vec::new(),
    }
}


fn fixture_metadata() -> Vec<u8> {
    let system = ModuleMetadataV12 {
        name: "System".to_string(),
        storage: Some(StorageMetadata {
            prefix: "System".to_string(),
            entries: vec![plain_entry("Events", "Vec<EventRecord>")],
        }),
        calls: None,
        event: Some(vec![
            EventMetadata {
                name: "ExtrinsicSuccess".to_string(),
                arguments: Vec::new(),
                documentation: Vec::new(),
            },
            EventMetadata {
                name: "ExtrinsicFailed".to_string(),
                arguments: Vec::new(),
                documentation: Vec::new(),
            },
        ]),
        constants: Vec::new(),
        errors: Vec::new(),
        index: 0,
    };
    let timestamp = ModuleMetadataV12 {
        name: "Timestamp".to_string(),
        storage: None,
        calls: Some(vec![FunctionMetadata {
            name: "set".to_string(),
            arguments: vec![FunctionArgumentMetadata {
                name: "now".to_string(),
                ty: "Compact<Moment>".to_string(),
            }],
            documentation: Vec::new(),
        }]),
        event: None,
        constants: Vec::new(),
        errors: Vec::new(),
        index: 2,
    };
    let balances = ModuleMetadataV12 {
        name: "Balances".to_string(),
        storage: None,
        calls: Some(vec![FunctionMetadata {
            name: "transfer".to_string(),
            arguments: vec![
                FunctionArgumentMetadata {
                    name: "dest".to_string(),
                    ty: "Address".to_string(),
                },
                FunctionArgumentMetadata {
                    name: "value".to_string(),
                    ty: "Compact<Balance>".to_string(),
                },
            ],
            documentation: Vec::new(),
        }]),
        event: Some(vec![
            EventMetadata {
                name: "NewAccount".to_string(),
                arguments: vec!["AccountId".to_string(), "Balance".to_string()],
                documentation: Vec::new(),
            },
            EventMetadata {
                name: "ReapedAccount".to_string(),
                arguments: vec!["AccountId".to_string()],
                documentation: Vec::new(),
            },
            EventMetadata {
                name: "Transfer".to_string(),
                arguments: vec![
                    "AccountId".to_string(),
                    "AccountId".to_string(),
                    "Balance".to_string(),
                ],
                documentation: Vec::new(),
            },
        ]),
        constants: vec![ModuleConstantMetadata {
            name: "ExistentialDeposit".to_string(),
            ty: "Balance".to_string(),
            value: 500u128.to_le_bytes().to_vec(),
            documentation: Vec::new(),
        }],
        errors: Vec::new(),
        index: 4,
    };
    let indices = ModuleMetadataV12 {
        name: "Indices".to_string(),
        storage: Some(StorageMetadata {
            prefix: "Indices".to_string(),
            entries: vec![
                plain_entry("NextEnumSet", "AccountIndex"),
                StorageEntryMetadata {
                    name: "EnumSet".to_string(),
                    modifier: StorageEntryModifier::Default,
                    ty: StorageEntryType::Map {
                        hasher: StorageHasher::Blake2_256,
                        key: "AccountIndex".to_string(),
                        value: "Vec<AccountId>".to_string(),
                        unused: false,
                    },
                    default: Vec::new(),
                    documentation: Vec::new(),
                },
            ],
        }),
        calls: None,
        event: Some(vec![EventMetadata {
            name: "NewAccountIndex".to_string(),
            arguments: vec!["AccountId".to_string(), "AccountIndex".to_string()],
            documentation: Vec::new(),
        }]),
        constants: Vec::new(),
        errors: Vec::new(),
        index: 5,
    };

    RuntimeMetadataPrefixed {
        magic: METADATA_MAGIC,
        metadata: RuntimeMetadata::V12(MetadataV12 {
            modules: vec![system, timestamp, balances, indices],
            extrinsic: ExtrinsicMetadata {
                version: 4,
                signed_extensions: Vec::new(),
            },
        }),
    }
    .encode()
}


struct FixtureNode {
    blocks: HashMap<String, SignedBlockJson>,
    hash_by_number: HashMap<u64, String>,
    head: String,
    metadata_bytes: Vec<u8>,
    metadata_calls: AtomicUsize,
    events_key: Vec<u8>,
    events: HashMap<String, Vec<u8>>,
    genesis_storage: HashMap<Vec<u8>, Vec<u8>>,
}


/// Six block chain: a timestamp extrinsic per block, a failed transfer
/// in block 4 and a successful one in block 5, two genesis accounts in
/// the indices enum set.
fn fixture_chain() -> FixtureNode {
    let mut blocks = HashMap::new();
    let mut hash_by_number = HashMap::new();
    let mut events = HashMap::new();

    for id in 0..=HEAD {
        let hash = block_hash(id);
        let parent_hash = if id == 0 {
            GENESIS_PARENT.to_string()
        } else {
            block_hash(id - 1)
        };

        let mut extrinsics = Vec::new();
        let mut records = Vec::new();
        if id > 0 {
            extrinsics.push(timestamp_extrinsic(millis(id) as u64));
            records.push(success_event(0));
        }
        if id == 4 {
            extrinsics.push(transfer_extrinsic(&DEST_FAILED, 55, 1));
            records.push(failed_event(1));
        }
        if id == 5 {
            extrinsics.push(transfer_extrinsic(&DEST, 100, 2));
            records.push(new_account_event(1, &DEST, 100));
            records.push(transfer_event(1, &SIGNER, &DEST, 100));
            records.push(success_event(1));
        }

        let header = HeaderJson {
            parent_hash,
            number: format!("0x{id:x}"),
            state_root: format!("0x{:064x}", 0xaaaa_0000u64 + id),
            extrinsics_root: format!("0x{:064x}", 0xeeee_0000u64 + id),
            digest: DigestJson {
                logs: vec![babe_log(id as u32, 1_000 + id)],
            },
        };
        if id > 0 {
            events.insert(hash.clone(), events_value(&records));
        }
        blocks.insert(
            hash.clone(),
            SignedBlockJson {
                block: BlockJson { header, extrinsics },
            },
        );
        hash_by_number.insert(id, hash);
    }

    let mut genesis_storage = HashMap::new();
    genesis_storage.insert(
        legacy_storage_key("Indices", "NextEnumSet", &[], None).unwrap(),
        0u32.to_le_bytes().to_vec(),
    );
    let mut enum_set = compact(GENESIS_ACCOUNTS.len() as u64);
    for account in &GENESIS_ACCOUNTS {
        enum_set.extend_from_slice(account);
    }
    genesis_storage.insert(
        legacy_storage_key("Indices", "EnumSet", &0u32.to_le_bytes(), Some("Blake2_256")).unwrap(),
        enum_set,
    );

    FixtureNode {
        blocks,
        hash_by_number,
        head: block_hash(HEAD),
        metadata_bytes: fixture_metadata(),
        metadata_calls: AtomicUsize::new(0),
        events_key: legacy_storage_key("System", "Events", &[], None).unwrap(),
        events,
        genesis_storage,
    }
}


#[async_trait]
impl NodeClient for FixtureNode {
    async fn block_hash(&self, number: BlockNumber) -> Result<Option<String>, RpcError> {
        Ok(self.hash_by_number.get(&number).cloned())
    }

    async fn finalized_head(&self) -> Result<String, RpcError> {
        Ok(self.head.clone())
    }

    async fn block(&self, hash: &str) -> Result<Option<SignedBlockJson>, RpcError> {
        Ok(self.blocks.get(hash).cloned())
    }

    async fn header(&self, hash: &str) -> Result<Option<HeaderJson>, RpcError> {
        Ok(self.blocks.get(hash).map(|b| b.block.header.clone()))
    }

    async fn runtime_version(&self, _hash: &str) -> Result<RuntimeVersionJson, RpcError> {
        Ok(RuntimeVersionJson {
            spec_name: "fixture".to_string(),
            impl_name: "fixture-node".to_string(),
            authoring_version: 1,
            spec_version: SPEC,
            impl_version: 1,
            apis: serde_json::json!([["0xdf6acb689907609b", 3]]),
            transaction_version: Some(1),
        })
    }

    async fn metadata(&self, _hash: &str) -> Result<Vec<u8>, RpcError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.metadata_bytes.clone())
    }

    async fn storage(&self, key: &[u8], hash: &str) -> Result<Option<Vec<u8>>, RpcError> {
        if key == self.events_key.as_slice() {
            return Ok(self.events.get(hash).cloned());
        }
        if hash == block_hash(0) {
            return Ok(self.genesis_storage.get(key).cloned());
        }
        Ok(None)
    }
}


async fn harvester_over(node: Arc<FixtureNode>) -> Harvester {
    let db = Database::open_memory().await.unwrap();
    let registry = TypeRegistry::builtin("default").unwrap();
    let gateway = Arc::new(CodecGateway::new(node, registry, SS58_FORMAT));
    Harvester::new(db, gateway, false)
}


/// Walks parent links from the head down to genesis.
async fn accumulate_all(harvester: &Harvester) {
    let mut current = block_hash(HEAD);
    loop {
        let block = harvester.add_block(&current).await.unwrap();
        if block.id == 0 {
            return;
        }
        current = block.parent_hash;
    }
}


async fn sequence_all(harvester: &Harvester) -> Vec<u64> {
    let mut sequenced = Vec::new();
    while let Some(totals) = harvester.sequence_next().await.unwrap() {
        sequenced.push(totals.id);
    }
    sequenced
}


#[tokio::test]
async fn harvests_the_chain_from_head_to_genesis() {
    let node = Arc::new(fixture_chain());
    let harvester = harvester_over(node.clone()).await;
    accumulate_all(&harvester).await;

    let mut conn = harvester.db().pool().acquire().await.unwrap();
    assert_eq!(count_blocks(&mut conn).await.unwrap(), 6);

    let head = block_by_id(&mut conn, 5).await.unwrap().unwrap();
    let parent = block_by_id(&mut conn, 4).await.unwrap().unwrap();
    assert_eq!(head.parent_id, Some(4));
    assert_eq!(head.parent_hash, parent.hash);
    assert_eq!(head.spec_version_id, SPEC);
    assert_eq!(head.count_extrinsics, 2);
    assert_eq!(head.count_extrinsics_signed, 1);
    assert_eq!(head.count_extrinsics_unsigned, 1);
    assert_eq!(head.count_extrinsics_signedby_address, 1);
    assert_eq!(head.count_extrinsics_signedby_index, 0);
    assert_eq!(head.count_extrinsics_success, 2);
    assert_eq!(head.count_extrinsics_error, 0);
    assert_eq!(head.count_events, 4);
    assert_eq!(head.count_events_system, 2);
    assert_eq!(head.count_events_module, 2);
    assert_eq!(head.count_events_extrinsic, 4);
    assert_eq!(head.count_accounts_new, 1);
    assert_eq!(head.count_log, 1);
    assert_eq!(head.datetime, Some(millis(5)));
    assert_eq!(head.slot_number, Some(1_005));
    assert_eq!(head.account_index, None);

    let genesis = block_by_id(&mut conn, 0).await.unwrap().unwrap();
    assert_eq!(genesis.parent_id, None);
    assert_eq!(genesis.parent_hash, GENESIS_PARENT);
    assert_eq!(genesis.count_extrinsics, 0);
    assert_eq!(genesis.count_events, 0);

    let logs = logs_by_block(&mut conn, 3).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].log_type, "PreRuntime");
    assert_eq!(logs[0].type_id, 6);

    let extrinsics = extrinsics_by_block(&mut conn, 5).await.unwrap();
    let signer_hex = "11".repeat(32);
    assert_eq!(extrinsics.len(), 2);
    assert_eq!(extrinsics[0].module_id, "timestamp");
    assert_eq!(extrinsics[0].call_id, "set");
    assert_eq!(extrinsics[0].call, "0200");
    assert_eq!(extrinsics[0].signed, 0);
    assert!(extrinsics[0].extrinsic_hash.is_none());
    assert_eq!(extrinsics[1].module_id, "balances");
    assert_eq!(extrinsics[1].call_id, "transfer");
    assert_eq!(extrinsics[1].address.as_deref(), Some(signer_hex.as_str()));
    assert_eq!(extrinsics[1].address_length, Some(0xff));
    assert_eq!(extrinsics[1].nonce, Some(2));
    assert_eq!(extrinsics[1].era.as_deref(), Some("00"));
    assert_eq!(extrinsics[1].success, 1);
    assert!(extrinsics[1].extrinsic_hash.is_some());

    let events = events_by_block(&mut conn, 5).await.unwrap();
    assert_eq!(events.len(), 4);
    assert_eq!(events[0].event_id, "ExtrinsicSuccess");
    assert_eq!(events[0].system, 1);
    assert_eq!(events[1].event_id, "NewAccount");
    assert_eq!(events[2].event_id, "Transfer");
    assert_eq!(events[2].event_type, "0402");
    assert_eq!(events[2].extrinsic_idx, Some(1));
    assert_eq!(events[2].spec_version_id, SPEC);

    assert_eq!(node.metadata_calls.load(Ordering::SeqCst), 1);
}


#[tokio::test]
async fn sequencing_chains_totals_up_from_genesis() {
    let harvester = harvester_over(Arc::new(fixture_chain())).await;
    accumulate_all(&harvester).await;

    let sequenced = sequence_all(&harvester).await;
    assert_eq!(sequenced, vec![0, 1, 2, 3, 4, 5]);
    assert!(harvester.sequence_next().await.unwrap().is_none());

    let mut conn = harvester.db().pool().acquire().await.unwrap();
    assert_eq!(count_block_totals(&mut conn).await.unwrap(), 6);

    // the genesis bootstrap ran as part of the first sequencer call
    let genesis = block_by_id(&mut conn, 0).await.unwrap().unwrap();
    assert_eq!(genesis.count_accounts, 2);
    assert_eq!(genesis.count_accounts_new, 2);
    assert_eq!(genesis.datetime, Some(millis(1)));
    assert!(session_exists(&mut conn, 0).await.unwrap());
    assert_eq!(count_sessions(&mut conn).await.unwrap(), 1);

    let audits = account_audits_by_block(&mut conn, 0).await.unwrap();
    assert_eq!(audits.len(), 2);
    assert!(audits.iter().all(|a| a.type_id == AUDIT_TYPE_NEW));
    assert_eq!(audits[0].account_id, "aa".repeat(32));
    let index_audits = account_index_audits_by_block(&mut conn, 0).await.unwrap();
    assert_eq!(index_audits.len(), 2);
    assert_eq!(index_audits[0].account_index, 0);
    assert_eq!(index_audits[1].account_index, 1);

    let new_account_audits = account_audits_by_block(&mut conn, 5).await.unwrap();
    assert_eq!(new_account_audits.len(), 1);
    assert_eq!(new_account_audits[0].account_id, "22".repeat(32));

    let first = block_total_by_id(&mut conn, 0).await.unwrap().unwrap();
    assert_eq!(first.parent_datetime, None);
    assert_eq!(first.blocktime, 0);
    assert_eq!(first.total_accounts, 2);
    assert_eq!(first.total_extrinsics, 0);
    assert_eq!(first.total_logs, 1);

    let last = block_total_by_id(&mut conn, 5).await.unwrap().unwrap();
    assert_eq!(last.parent_datetime, Some(millis(4)));
    assert_eq!(last.blocktime, 6);
    assert_eq!(last.total_blocktime, 24);
    assert_eq!(last.total_extrinsics, 7);
    assert_eq!(last.total_extrinsics_signed, 2);
    assert_eq!(last.total_extrinsics_unsigned, 5);
    assert_eq!(last.total_extrinsics_success, 6);
    assert_eq!(last.total_extrinsics_error, 1);
    assert_eq!(last.total_extrinsics_signedby_address, 2);
    assert_eq!(last.total_events, 9);
    assert_eq!(last.total_events_system, 7);
    assert_eq!(last.total_events_module, 2);
    assert_eq!(last.total_events_extrinsic, 9);
    assert_eq!(last.total_events_finalization, 0);
    assert_eq!(last.total_accounts, 3);
    assert_eq!(last.total_accounts_new, 3);
    assert_eq!(last.total_accounts_reaped, 0);
    assert_eq!(last.total_transfers, 1);
    assert_eq!(last.total_logs, 6);

    let parent = block_by_id(&mut conn, 4).await.unwrap().unwrap();
    let parent_totals = block_total_by_id(&mut conn, 4).await.unwrap().unwrap();
    let head = block_by_id(&mut conn, 5).await.unwrap().unwrap();
    drop(conn);

    let err = harvester
        .sequence_block(&head, Some(&parent), Some(&parent_totals))
        .await
        .unwrap_err();
    assert!(matches!(err, HarvesterError::AlreadySequenced(5)));

    let err = harvester.sequence_block(&parent, None, None).await.unwrap_err();
    assert!(matches!(err, HarvesterError::SequencingOutOfOrder(4)));
}


#[tokio::test]
async fn a_known_block_is_not_added_twice() {
    let harvester = harvester_over(Arc::new(fixture_chain())).await;
    harvester.add_block(&block_hash(3)).await.unwrap();

    let err = harvester.add_block(&block_hash(3)).await.unwrap_err();
    assert!(matches!(err, HarvesterError::AlreadyAdded(_)));

    let mut conn = harvester.db().pool().acquire().await.unwrap();
    assert_eq!(count_blocks(&mut conn).await.unwrap(), 1);
    assert_eq!(extrinsics_by_block(&mut conn, 3).await.unwrap().len(), 1);
    assert_eq!(events_by_block(&mut conn, 3).await.unwrap().len(), 1);
}


#[tokio::test]
async fn transfer_parties_come_from_the_event() {
    let harvester = harvester_over(Arc::new(fixture_chain())).await;
    harvester.add_block(&block_hash(5)).await.unwrap();

    let mut conn = harvester.db().pool().acquire().await.unwrap();
    let transfers = transfers_by_block(&mut conn, 5).await.unwrap();
    assert_eq!(transfers.len(), 1);

    let transfer = &transfers[0];
    assert_eq!(transfer.data_extrinsic_idx, "5_1");
    assert_eq!(transfer.from_raw, "11".repeat(32));
    assert_eq!(transfer.to_raw, "22".repeat(32));
    assert_eq!(transfer.transfer_to, ss58_encode(&DEST, SS58_FORMAT).unwrap());
    assert_eq!(transfer.amount, "100");
    assert_eq!(transfer.success, 1);
    assert_eq!(transfer.error, 0);
    assert_eq!(transfer.block_timestamp, Some(millis(5)));

    let extrinsics = extrinsics_by_block(&mut conn, 5).await.unwrap();
    assert_eq!(transfer.hash, extrinsics[1].extrinsic_hash);
    let raw = hex::decode(
        transfer_extrinsic(&DEST, 100, 2).trim_start_matches("0x"),
    )
    .unwrap();
    assert_eq!(transfer.hash.as_deref(), Some(hex::encode(blake2_256(&raw)).as_str()));
}


#[tokio::test]
async fn a_failed_transfer_falls_back_to_the_call_parties() {
    let harvester = harvester_over(Arc::new(fixture_chain())).await;
    harvester.add_block(&block_hash(4)).await.unwrap();

    let mut conn = harvester.db().pool().acquire().await.unwrap();
    let transfers = transfers_by_block(&mut conn, 4).await.unwrap();
    assert_eq!(transfers.len(), 1);

    let transfer = &transfers[0];
    assert_eq!(transfer.data_extrinsic_idx, "4_1");
    assert_eq!(transfer.from_raw, "11".repeat(32));
    assert_eq!(transfer.to_raw, "33".repeat(32));
    assert_eq!(transfer.amount, "55");
    assert_eq!(transfer.success, 0);
    assert_eq!(transfer.error, 1);
    assert_eq!(transfer.block_timestamp, Some(millis(4)));
}


#[tokio::test]
async fn undecodable_events_degrade_to_a_bare_block() {
    let mut node = fixture_chain();
    node.events.insert(block_hash(2), vec![0xde, 0xad]);

    let harvester = harvester_over(Arc::new(node)).await;
    let block = harvester.add_block(&block_hash(2)).await.unwrap();
    assert_eq!(block.count_events, 0);
    assert_eq!(block.count_extrinsics, 1);

    // without the success event the extrinsic reads as failed
    let mut conn = harvester.db().pool().acquire().await.unwrap();
    let extrinsics = extrinsics_by_block(&mut conn, 2).await.unwrap();
    assert_eq!(extrinsics[0].success, 0);
    assert_eq!(extrinsics[0].error, 1);
}


#[tokio::test]
async fn author_indices_are_backfilled_from_stored_logs() {
    let harvester = harvester_over(Arc::new(fixture_chain())).await;
    accumulate_all(&harvester).await;

    {
        let mut conn = harvester.db().pool().acquire().await.unwrap();
        let pending = blocks_missing_account_index(&mut conn, 10).await.unwrap();
        assert_eq!(pending.len(), 6);
    }

    assert_eq!(harvester.backfill_author_indices(256).await.unwrap(), 6);

    {
        let mut conn = harvester.db().pool().acquire().await.unwrap();
        let genesis = block_by_id(&mut conn, 0).await.unwrap().unwrap();
        assert_eq!(genesis.account_index, Some(0));
        let fourth = block_by_id(&mut conn, 4).await.unwrap().unwrap();
        assert_eq!(fourth.account_index, Some(4));
        assert!(blocks_missing_account_index(&mut conn, 10)
            .await
            .unwrap()
            .is_empty());
    }

    assert_eq!(harvester.backfill_author_indices(256).await.unwrap(), 0);
}


#[tokio::test]
async fn the_runtime_catalog_is_written_once() {
    let node = Arc::new(fixture_chain());
    let harvester = harvester_over(node.clone()).await;
    harvester.add_block(&block_hash(5)).await.unwrap();
    harvester.add_block(&block_hash(4)).await.unwrap();

    let mut conn = harvester.db().pool().acquire().await.unwrap();
    let runtime = runtime_by_spec_version(&mut conn, SPEC).await.unwrap().unwrap();
    assert_eq!(runtime.spec_name, "fixture");
    assert_eq!(runtime.metadata_version, 12);
    assert_eq!(runtime.count_modules, 4);
    assert_eq!(runtime.count_call_functions, 2);
    assert_eq!(runtime.count_events, 6);
    assert_eq!(runtime.count_storage_functions, 3);
    assert_eq!(runtime.count_constants, 1);
    assert!(runtime.apis.contains("0xdf6acb689907609b"));
    assert!(runtime.raw_metadata.starts_with("0x"));

    let mut modules = runtime_module_ids(&mut conn, SPEC).await.unwrap();
    modules.sort();
    assert_eq!(modules, vec!["balances", "indices", "system", "timestamp"]);

    // compound types are split down to their parts
    for ty in [
        "Compact<Moment>",
        "Moment",
        "Compact<Balance>",
        "Balance",
        "Address",
        "AccountId",
        "AccountIndex",
        "Vec<EventRecord>",
        "EventRecord",
        "Vec<AccountId>",
    ] {
        assert!(
            runtime_type_exists(&mut conn, SPEC, ty).await.unwrap(),
            "type {ty} missing from the catalog"
        );
    }
    assert!(!runtime_type_exists(&mut conn, SPEC, "Bogus").await.unwrap());

    let deposit: String = sqlx::query_scalar(
        "SELECT value FROM runtime_constants WHERE spec_version = ? AND name = 'ExistentialDeposit'",
    )
    .bind(SPEC)
    .fetch_one(&mut *conn)
    .await
    .unwrap();
    assert_eq!(deposit, "500");

    assert_eq!(node.metadata_calls.load(Ordering::SeqCst), 1);
}


#[tokio::test]
async fn decoding_the_same_block_twice_yields_identical_rows() {
    let node = Arc::new(fixture_chain());
    let first = harvester_over(node.clone()).await;
    let second = harvester_over(node.clone()).await;

    first.add_block(&block_hash(5)).await.unwrap();
    second.add_block(&block_hash(5)).await.unwrap();

    let rows_of = |harvester: &Harvester| {
        let db = harvester.db().clone();
        async move {
            let mut conn = db.pool().acquire().await.unwrap();
            let extrinsics: Vec<(String, String)> = extrinsics_by_block(&mut conn, 5)
                .await
                .unwrap()
                .into_iter()
                .map(|e| (e.call, e.params))
                .collect();
            let events: Vec<String> = events_by_block(&mut conn, 5)
                .await
                .unwrap()
                .into_iter()
                .map(|e| e.attributes)
                .collect();
            (extrinsics, events)
        }
    };

    assert_eq!(rows_of(&first).await, rows_of(&second).await);
}


#[tokio::test]
async fn the_sequencer_waits_until_the_chain_reaches_genesis() {
    let harvester = harvester_over(Arc::new(fixture_chain())).await;
    harvester.add_block(&block_hash(5)).await.unwrap();

    let err = harvester.sequence_next().await.unwrap_err();
    assert!(matches!(err, HarvesterError::ChainNotAtGenesis(5)));
}


#[tokio::test]
async fn genesis_is_fetched_through_the_parent_hash_of_block_one() {
    let harvester = harvester_over(Arc::new(fixture_chain())).await;

    // accumulate 5..=1 only, stopping short of genesis
    let mut current = block_hash(HEAD);
    loop {
        let block = harvester.add_block(&current).await.unwrap();
        if block.id == 1 {
            break;
        }
        current = block.parent_hash;
    }

    let totals = harvester.sequence_next().await.unwrap().unwrap();
    assert_eq!(totals.id, 0);

    let mut conn = harvester.db().pool().acquire().await.unwrap();
    let genesis = block_by_id(&mut conn, 0).await.unwrap().unwrap();
    assert_eq!(genesis.hash, block_hash(0));
    assert_eq!(genesis.count_accounts, 2);
}
