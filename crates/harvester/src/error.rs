use hrv_client::RpcError;
use hrv_scale::ScaleError;


/// Failure taxonomy of the harvesting pipeline.
///
/// `AlreadyAdded` and `AlreadySequenced` are expected outcomes under
/// concurrent workers rather than faults; the scheduler treats them as
/// signals to move on. `UpstreamUnavailable` marks work that is safe to
/// retry once the node comes back.
#[derive(Debug, thiserror::Error)]
pub enum HarvesterError {
    #[error("block {0} was already added")]
    AlreadyAdded(String),

    #[error("block {0} is unknown to the node")]
    NotFound(String),

    #[error("node is unavailable: {0}")]
    UpstreamUnavailable(#[source] RpcError),

    #[error("node request failed: {0}")]
    Rpc(#[source] RpcError),

    #[error("codec failure: {0}")]
    Codec(#[from] ScaleError),

    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("block {0} cannot be sequenced before its parent")]
    SequencingOutOfOrder(u64),

    #[error("block {0} is already sequenced")]
    AlreadySequenced(u64),

    #[error("chain is not accumulated down to genesis yet, lowest block is {0}")]
    ChainNotAtGenesis(u64),

    #[error("could not add block {block_hash}")]
    CouldNotAddBlock {
        block_hash: String,
        #[source]
        source: Box<HarvesterError>,
    },
}


impl From<RpcError> for HarvesterError {
    fn from(err: RpcError) -> Self {
        if err.is_transport() {
            HarvesterError::UpstreamUnavailable(err)
        } else {
            HarvesterError::Rpc(err)
        }
    }
}


impl HarvesterError {
    /// Attaches the offending hash to unexpected failures, leaving the
    /// outcome-like variants untouched so callers can still match on them.
    pub fn for_block(self, block_hash: &str) -> HarvesterError {
        match self {
            HarvesterError::AlreadyAdded(_)
            | HarvesterError::NotFound(_)
            | HarvesterError::UpstreamUnavailable(_)
            | HarvesterError::CouldNotAddBlock { .. } => self,
            other => HarvesterError::CouldNotAddBlock {
                block_hash: block_hash.to_string(),
                source: Box::new(other),
            },
        }
    }
}
