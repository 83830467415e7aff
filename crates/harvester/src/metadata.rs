use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{json, Value as JsonValue};
use sqlx::SqliteConnection;
use tracing::{debug, info};

use hrv_client::RuntimeVersionJson;
use hrv_primitives::{decode_hex, encode_hex, SpecVersion};
use hrv_scale::{
    decode_value, split_subtypes, type_info, RuntimeMetadataPrefixed, ScaleReader, SpecMetadata,
    StorageEntryType, TypeRegistry,
};
use hrv_storage::{
    insert_runtime, insert_runtime_call, insert_runtime_call_param, insert_runtime_constant,
    insert_runtime_event, insert_runtime_event_attribute, insert_runtime_module,
    insert_runtime_storage, insert_runtime_type, is_unique_violation, runtime_by_spec_version,
    runtime_type_exists, Database, RuntimeCallParamRow, RuntimeCallRow, RuntimeConstantRow,
    RuntimeEventAttributeRow, RuntimeEventRow, RuntimeModuleRow, RuntimeRow, RuntimeStorageRow,
    RuntimeTypeRow, DECODER_NOT_IMPLEMENTED,
};

use crate::error::HarvesterError;
use crate::gateway::CodecGateway;


/// Normalized runtime metadata per spec version.
///
/// Snapshots are immutable, so a version is resolved at most once per
/// process: first from this map, then from the runtimes table, and only
/// then from the node. A node fetch also writes the full call, event,
/// storage and constant catalog so the store can describe every runtime
/// it has decoded blocks against.
pub struct MetadataCache {
    inner: RwLock<HashMap<SpecVersion, Arc<SpecMetadata>>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        MetadataCache {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, spec_version: SpecVersion) -> Option<Arc<SpecMetadata>> {
        self.inner.read().get(&spec_version).cloned()
    }

    fn put(&self, spec_version: SpecVersion, meta: SpecMetadata) -> Arc<SpecMetadata> {
        let meta = Arc::new(meta);
        self.inner.write().insert(spec_version, meta.clone());
        meta
    }

    /// Returns the metadata for `version`, loading and cataloging it on
    /// first sight.
    ///
    /// Two workers can race the catalog insert; the loser rereads the
    /// winner's rows instead of failing the block that triggered it.
    pub async fn get_or_load(
        &self,
        db: &Database,
        gateway: &CodecGateway,
        version: &RuntimeVersionJson,
        block_hash: &str,
    ) -> Result<Arc<SpecMetadata>, HarvesterError> {
        let spec_version = version.spec_version;
        if let Some(meta) = self.get(spec_version) {
            return Ok(meta);
        }

        if let Some(meta) = self.load_from_store(db, spec_version).await? {
            debug!(spec_version, "runtime metadata restored from store");
            return Ok(meta);
        }

        let raw = gateway.metadata_bytes(block_hash).await?;
        let prefixed = RuntimeMetadataPrefixed::from_bytes(&raw)?;
        let meta = prefixed.metadata.normalize();

        let mut tx = db.begin().await?;
        let outcome = persist_catalog(
            &mut tx,
            gateway.registry(),
            version,
            prefixed.metadata.version(),
            &raw,
            &meta,
        )
        .await;
        match outcome {
            Ok(()) => {
                tx.commit().await?;
                info!(
                    spec_version,
                    modules = meta.modules.len(),
                    "runtime metadata cataloged"
                );
                Ok(self.put(spec_version, meta))
            }
            Err(e) if is_unique_violation(&e) => {
                drop(tx);
                self.load_from_store(db, spec_version)
                    .await?
                    .ok_or(HarvesterError::Storage(e))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn load_from_store(
        &self,
        db: &Database,
        spec_version: SpecVersion,
    ) -> Result<Option<Arc<SpecMetadata>>, HarvesterError> {
        let mut conn = db.pool().acquire().await?;
        let Some(runtime) = runtime_by_spec_version(&mut conn, spec_version).await? else {
            return Ok(None);
        };
        let raw = decode_hex(&runtime.raw_metadata)
            .map_err(|e| HarvesterError::NotFound(format!("stored metadata: {e}")))?;
        let prefixed = RuntimeMetadataPrefixed::from_bytes(&raw)?;
        Ok(Some(self.put(spec_version, prefixed.metadata.normalize())))
    }
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new()
    }
}


async fn persist_catalog(
    conn: &mut SqliteConnection,
    registry: &TypeRegistry,
    version: &RuntimeVersionJson,
    metadata_version: u8,
    raw: &[u8],
    meta: &SpecMetadata,
) -> Result<(), sqlx::Error> {
    let spec_version = version.spec_version;
    insert_runtime(
        conn,
        &RuntimeRow {
            spec_version,
            spec_name: version.spec_name.clone(),
            impl_name: version.impl_name.clone(),
            impl_version: version.impl_version,
            authoring_version: version.authoring_version,
            metadata_version: u32::from(metadata_version),
            apis: version.apis.to_string(),
            raw_metadata: encode_hex(raw),
            metadata_decoded: metadata_summary(meta).to_string(),
            count_modules: meta.modules.len() as u32,
            count_call_functions: meta.count_calls(),
            count_events: meta.count_events(),
            count_storage_functions: meta.count_storage_entries(),
            count_constants: meta.count_constants(),
        },
    )
    .await?;

    // Some historic runtimes carry two modules with the same identifier;
    // later occurrences get a numeric suffix so the catalog key stays
    // unique while decoding keeps using the plain id.
    let mut seen: HashMap<&str, u32> = HashMap::new();
    for module in &meta.modules {
        let occurrence = seen.entry(module.id.as_str()).or_insert(0);
        let module_id = if *occurrence == 0 {
            module.id.clone()
        } else {
            format!("{}_{}", module.id, occurrence)
        };
        *occurrence += 1;

        insert_runtime_module(
            conn,
            &RuntimeModuleRow {
                spec_version,
                module_id: module_id.clone(),
                name: module.name.clone(),
                prefix: module.prefix.clone(),
                count_call_functions: module.calls.len() as u32,
                count_events: module.events.len() as u32,
                count_storage_functions: module.storage.len() as u32,
                count_constants: module.constants.len() as u32,
                count_errors: module.errors.len() as u32,
            },
        )
        .await?;

        for call in &module.calls {
            insert_runtime_call(
                conn,
                &RuntimeCallRow {
                    spec_version,
                    module_id: module_id.clone(),
                    call_id: call.name.clone(),
                    call_idx: u32::from(call.index),
                    lookup: call.lookup.clone(),
                    name: call.name.clone(),
                    documentation: call.docs.clone(),
                    count_params: call.args.len() as u32,
                },
            )
            .await?;
            for (param_idx, arg) in call.args.iter().enumerate() {
                insert_runtime_call_param(
                    conn,
                    &RuntimeCallParamRow {
                        spec_version,
                        module_id: module_id.clone(),
                        call_id: call.name.clone(),
                        param_idx: param_idx as u32,
                        name: arg.name.clone(),
                        param_type: arg.ty.clone(),
                    },
                )
                .await?;
                record_type(conn, registry, spec_version, &arg.ty).await?;
            }
        }

        for event in &module.events {
            insert_runtime_event(
                conn,
                &RuntimeEventRow {
                    spec_version,
                    module_id: module_id.clone(),
                    event_id: event.name.clone(),
                    event_idx: u32::from(event.index),
                    lookup: event.lookup.clone(),
                    name: event.name.clone(),
                    documentation: event.docs.clone(),
                    count_attributes: event.args.len() as u32,
                },
            )
            .await?;
            for (attribute_idx, ty) in event.args.iter().enumerate() {
                insert_runtime_event_attribute(
                    conn,
                    &RuntimeEventAttributeRow {
                        spec_version,
                        module_id: module_id.clone(),
                        event_id: event.name.clone(),
                        attribute_idx: attribute_idx as u32,
                        attribute_type: ty.clone(),
                    },
                )
                .await?;
            }
        }

        for entry in &module.storage {
            let (key1, key2) = entry.key_types();
            let type_key2hasher = match &entry.ty {
                StorageEntryType::DoubleMap { key2_hasher, .. } => {
                    Some(key2_hasher.as_str().to_string())
                }
                _ => None,
            };
            insert_runtime_storage(
                conn,
                &RuntimeStorageRow {
                    spec_version,
                    module_id: module_id.clone(),
                    name: entry.name.clone(),
                    modifier: entry.modifier.to_string(),
                    type_hasher: entry.key_hasher().map(String::from),
                    type_key1: key1.map(String::from),
                    type_key2: key2.map(String::from),
                    type_value: entry.value_type().to_string(),
                    type_is_linked: entry.is_linked(),
                    type_key2hasher,
                    default_value: encode_hex(&entry.default),
                    documentation: entry.docs.clone(),
                },
            )
            .await?;
            record_type(conn, registry, spec_version, entry.value_type()).await?;
            if let Some(key1) = key1 {
                record_type(conn, registry, spec_version, key1).await?;
            }
            if let Some(key2) = key2 {
                record_type(conn, registry, spec_version, key2).await?;
            }
        }

        for constant in &module.constants {
            insert_runtime_constant(
                conn,
                &RuntimeConstantRow {
                    spec_version,
                    module_id: module_id.clone(),
                    name: constant.name.clone(),
                    constant_type: constant.ty.clone(),
                    value: constant_value(registry, &constant.ty, &constant.value),
                    value_raw: encode_hex(&constant.value),
                    documentation: constant.docs.clone(),
                },
            )
            .await?;
            record_type(conn, registry, spec_version, &constant.ty).await?;
        }
    }
    Ok(())
}


/// Decoded constant as JSON text, or the raw hex when the type has no
/// decoder or the bytes do not fit it.
fn constant_value(registry: &TypeRegistry, ty: &str, raw: &[u8]) -> String {
    let mut input = ScaleReader::new(raw);
    match decode_value(registry, ty, &mut input).and_then(|value| {
        input.expect_end()?;
        Ok(value)
    }) {
        Ok(value) => value.to_string(),
        Err(_) => encode_hex(raw),
    }
}


/// Files a type string and every subtype it mentions in the catalog.
///
/// Entries are written before their subtypes are expanded, which keeps
/// self-referential type definitions from looping.
async fn record_type(
    conn: &mut SqliteConnection,
    registry: &TypeRegistry,
    spec_version: SpecVersion,
    type_string: &str,
) -> Result<(), sqlx::Error> {
    let mut pending = vec![type_string.to_string()];
    while let Some(ty) = pending.pop() {
        let ty = ty.trim().to_string();
        if ty.is_empty() || runtime_type_exists(conn, spec_version, &ty).await? {
            continue;
        }
        let info = type_info(registry, &ty);
        insert_runtime_type(
            conn,
            &RuntimeTypeRow {
                spec_version,
                type_string: ty,
                decoder_class: info
                    .class
                    .map(String::from)
                    .unwrap_or_else(|| DECODER_NOT_IMPLEMENTED.to_string()),
            },
        )
        .await?;
        if let Some(sub) = info.sub_type {
            pending.extend(split_subtypes(&sub));
        }
    }
    Ok(())
}


fn metadata_summary(meta: &SpecMetadata) -> JsonValue {
    json!({
        "metadata_version": meta.version,
        "modules": meta
            .modules
            .iter()
            .map(|module| {
                json!({
                    "name": module.name,
                    "prefix": module.prefix,
                    "calls": module.calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                    "events": module.events.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
                    "storage": module.storage.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
                })
            })
            .collect::<Vec<_>>(),
    })
}
