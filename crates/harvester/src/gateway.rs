use std::sync::Arc;

use hrv_client::{NodeClient, RuntimeVersionJson, SignedBlockJson};
use hrv_primitives::BlockNumber;
use hrv_scale::{decode_value, legacy_storage_key, ScaleReader, SpecMetadata, TypeRegistry};
use serde_json::Value as JsonValue;

use crate::decoder::{self, EventRecord};
use crate::error::HarvesterError;


/// Chain access with the codec layered on top.
///
/// Storage reads use the legacy key scheme, a single hash over
/// `prefix ++ " " ++ name ++ params`, with the hasher taken from the
/// metadata entry and `Blake2_256` as the default.
pub struct CodecGateway {
    node: Arc<dyn NodeClient>,
    registry: TypeRegistry,
    ss58_format: u16,
}


impl CodecGateway {
    pub fn new(node: Arc<dyn NodeClient>, registry: TypeRegistry, ss58_format: u16) -> Self {
        CodecGateway {
            node,
            registry,
            ss58_format,
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn ss58_format(&self) -> u16 {
        self.ss58_format
    }

    pub async fn chain_block(&self, hash: &str) -> Result<SignedBlockJson, HarvesterError> {
        self.node
            .block(hash)
            .await?
            .ok_or_else(|| HarvesterError::NotFound(hash.to_string()))
    }

    pub async fn runtime_version(&self, hash: &str) -> Result<RuntimeVersionJson, HarvesterError> {
        Ok(self.node.runtime_version(hash).await?)
    }

    pub async fn metadata_bytes(&self, hash: &str) -> Result<Vec<u8>, HarvesterError> {
        Ok(self.node.metadata(hash).await?)
    }

    pub async fn chain_head(&self) -> Result<String, HarvesterError> {
        Ok(self.node.finalized_head().await?)
    }

    pub async fn block_hash(&self, number: BlockNumber) -> Result<Option<String>, HarvesterError> {
        Ok(self.node.block_hash(number).await?)
    }

    pub async fn block_number(&self, hash: &str) -> Result<BlockNumber, HarvesterError> {
        let header = self
            .node
            .header(hash)
            .await?
            .ok_or_else(|| HarvesterError::NotFound(hash.to_string()))?;
        Ok(header.number()?)
    }

    /// Events of a block, decoded with the metadata active at its parent.
    ///
    /// A missing storage value means an empty event vector; decode
    /// failures are surfaced so the caller can degrade explicitly.
    pub async fn block_events(
        &self,
        hash: &str,
        meta: &SpecMetadata,
    ) -> Result<Vec<EventRecord>, HarvesterError> {
        let (prefix, hasher) = match meta.storage_entry("system", "Events") {
            Some((module, entry)) => (module.prefix.clone(), entry.key_hasher()),
            None => ("System".to_string(), None),
        };
        let key = legacy_storage_key(&prefix, "Events", &[], hasher)?;
        let raw = match self.node.storage(&key, hash).await? {
            Some(raw) => raw,
            None => return Ok(Vec::new()),
        };
        Ok(decoder::decode_events(&self.registry, meta, &raw)?)
    }

    /// Reads and decodes one storage value.
    ///
    /// `None` when the entry is not part of this runtime or the node has
    /// no value under the key.
    pub async fn storage_value(
        &self,
        hash: &str,
        module_id: &str,
        name: &str,
        params: &[u8],
        meta: &SpecMetadata,
    ) -> Result<Option<JsonValue>, HarvesterError> {
        let Some((module, entry)) = meta.storage_entry(module_id, name) else {
            return Ok(None);
        };
        let key = legacy_storage_key(&module.prefix, name, params, entry.key_hasher())?;
        let value_type = entry.value_type().to_string();
        let Some(raw) = self.node.storage(&key, hash).await? else {
            return Ok(None);
        };
        let mut input = ScaleReader::new(&raw);
        let value = decode_value(&self.registry, &value_type, &mut input)?;
        input.expect_end()?;
        Ok(Some(value))
    }
}
