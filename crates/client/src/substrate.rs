use async_trait::async_trait;
use hrv_primitives::{parse_block_number, BlockNumber};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::error::RpcError;
use crate::rpc::RpcClient;


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedBlockJson {
    pub block: BlockJson,
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockJson {
    pub header: HeaderJson,
    /// Hex encoded extrinsics, in body order.
    pub extrinsics: Vec<String>,
}


#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderJson {
    pub parent_hash: String,
    /// Hex encoded block height.
    pub number: String,
    pub state_root: String,
    pub extrinsics_root: String,
    pub digest: DigestJson,
}


impl HeaderJson {
    pub fn number(&self) -> Result<BlockNumber, RpcError> {
        parse_block_number(&self.number)
            .map_err(|_| RpcError::invalid("chain_getBlock", format!("bad block number `{}`", self.number)))
    }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestJson {
    pub logs: Vec<String>,
}


#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeVersionJson {
    pub spec_name: String,
    pub impl_name: String,
    pub authoring_version: u32,
    pub spec_version: u32,
    pub impl_version: u32,
    /// Runtime api ids and versions, kept verbatim.
    #[serde(default)]
    pub apis: JsonValue,
    #[serde(default)]
    pub transaction_version: Option<u32>,
}


/// Node access needed by the harvester.
///
/// The production implementation speaks JSON-RPC; tests substitute fixture
/// backed implementations.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Hash of the block at `number`, `None` past the chain head.
    async fn block_hash(&self, number: BlockNumber) -> Result<Option<String>, RpcError>;

    async fn finalized_head(&self) -> Result<String, RpcError>;

    /// Full block by hash, `None` when the node does not know the hash.
    async fn block(&self, hash: &str) -> Result<Option<SignedBlockJson>, RpcError>;

    async fn header(&self, hash: &str) -> Result<Option<HeaderJson>, RpcError>;

    async fn runtime_version(&self, hash: &str) -> Result<RuntimeVersionJson, RpcError>;

    /// Raw `state_getMetadata` response at the given block.
    async fn metadata(&self, hash: &str) -> Result<Vec<u8>, RpcError>;

    /// Raw storage value under `key` at the given block.
    async fn storage(&self, key: &[u8], hash: &str) -> Result<Option<Vec<u8>>, RpcError>;
}


/// `NodeClient` over a substrate JSON-RPC endpoint.
pub struct SubstrateRpc {
    rpc: RpcClient,
}


impl SubstrateRpc {
    pub fn new(rpc: RpcClient) -> Self {
        SubstrateRpc { rpc }
    }

    fn hex_field(method: &str, value: &JsonValue) -> Result<Vec<u8>, RpcError> {
        let text = value
            .as_str()
            .ok_or_else(|| RpcError::invalid(method, "expected a hex string"))?;
        hex::decode(text.trim_start_matches("0x"))
            .map_err(|e| RpcError::invalid(method, format!("bad hex: {e}")))
    }
}


#[async_trait]
impl NodeClient for SubstrateRpc {
    async fn block_hash(&self, number: BlockNumber) -> Result<Option<String>, RpcError> {
        let result = self.rpc.call("chain_getBlockHash", json!([number])).await?;
        if result.is_null() {
            return Ok(None);
        }
        match result.as_str() {
            Some(hash) => Ok(Some(hash.to_string())),
            None => Err(RpcError::invalid("chain_getBlockHash", "expected a hash")),
        }
    }

    async fn finalized_head(&self) -> Result<String, RpcError> {
        let result = self.rpc.call("chain_getFinalizedHead", json!([])).await?;
        match result.as_str() {
            Some(hash) => Ok(hash.to_string()),
            None => Err(RpcError::invalid("chain_getFinalizedHead", "expected a hash")),
        }
    }

    async fn block(&self, hash: &str) -> Result<Option<SignedBlockJson>, RpcError> {
        let result = self.rpc.call("chain_getBlock", json!([hash])).await?;
        if result.is_null() {
            return Ok(None);
        }
        serde_json::from_value(result)
            .map(Some)
            .map_err(|e| RpcError::invalid("chain_getBlock", e.to_string()))
    }

    async fn header(&self, hash: &str) -> Result<Option<HeaderJson>, RpcError> {
        let result = self.rpc.call("chain_getHeader", json!([hash])).await?;
        if result.is_null() {
            return Ok(None);
        }
        serde_json::from_value(result)
            .map(Some)
            .map_err(|e| RpcError::invalid("chain_getHeader", e.to_string()))
    }

    async fn runtime_version(&self, hash: &str) -> Result<RuntimeVersionJson, RpcError> {
        let result = self
            .rpc
            .call("state_getRuntimeVersion", json!([hash]))
            .await?;
        serde_json::from_value(result)
            .map_err(|e| RpcError::invalid("state_getRuntimeVersion", e.to_string()))
    }

    async fn metadata(&self, hash: &str) -> Result<Vec<u8>, RpcError> {
        let result = self.rpc.call("state_getMetadata", json!([hash])).await?;
        Self::hex_field("state_getMetadata", &result)
    }

    async fn storage(&self, key: &[u8], hash: &str) -> Result<Option<Vec<u8>>, RpcError> {
        let key = format!("0x{}", hex::encode(key));
        let result = self.rpc.call("state_getStorage", json!([key, hash])).await?;
        if result.is_null() {
            return Ok(None);
        }
        Self::hex_field("state_getStorage", &result).map(Some)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_signed_block() {
        let raw = serde_json::json!({
            "block": {
                "header": {
                    "parentHash": "0x4545454545454545454545454545454545454545454545454545454545454545",
                    "number": "0xeefd",
                    "stateRoot": "0x1111111111111111111111111111111111111111111111111111111111111111",
                    "extrinsicsRoot": "0x2222222222222222222222222222222222222222222222222222222222222222",
                    "digest": {
                        "logs": ["0x0642414245b501"]
                    }
                },
                "extrinsics": ["0x280402000b50e9fd6d6d01"]
            },
            "justification": null
        });
        let block: SignedBlockJson = serde_json::from_value(raw).unwrap();
        assert_eq!(block.block.header.number().unwrap(), 61181);
        assert_eq!(block.block.extrinsics.len(), 1);
        assert_eq!(block.block.header.digest.logs.len(), 1);
    }

    #[test]
    fn parses_a_runtime_version() {
        let raw = serde_json::json!({
            "specName": "kusama",
            "implName": "parity-kusama",
            "authoringVersion": 2,
            "specVersion": 1045,
            "implVersion": 0,
            "apis": [["0xdf6acb689907609b", 2]]
        });
        let version: RuntimeVersionJson = serde_json::from_value(raw).unwrap();
        assert_eq!(version.spec_version, 1045);
        assert_eq!(version.transaction_version, None);
        assert!(version.apis.is_array());
    }
}
