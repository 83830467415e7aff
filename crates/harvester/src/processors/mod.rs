mod balances;
mod contracts;
mod indices;
mod session;
mod timestamp;
mod totals;

pub use balances::{NewAccountProcessor, ReapedAccountProcessor, TransferEventProcessor};
pub use contracts::ContractInstantiatedProcessor;
pub use indices::NewAccountIndexProcessor;
pub use session::NewSessionProcessor;
pub use timestamp::TimestampProcessor;
pub use totals::BlockTotalProcessor;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::SqliteConnection;

use hrv_storage::{BlockRow, BlockTotalRow, EventRow, ExtrinsicRow};

use crate::error::HarvesterError;


/// Handler for one call, keyed by module and call id.
///
/// Accumulation hooks run inside the block's insert transaction, in
/// extrinsic order, and may adjust the not yet written block row.
/// Sequencing hooks run later, inside the totals transaction, against
/// rows read back from the store.
#[async_trait]
pub trait ExtrinsicProcessor: Send + Sync {
    fn module_id(&self) -> &'static str;
    fn call_id(&self) -> &'static str;

    async fn accumulation_hook(
        &self,
        _conn: &mut SqliteConnection,
        _block: &mut BlockRow,
        _extrinsic: &ExtrinsicRow,
    ) -> Result<(), HarvesterError> {
        Ok(())
    }

    async fn sequencing_hook(
        &self,
        _conn: &mut SqliteConnection,
        _block: &BlockRow,
        _extrinsic: &ExtrinsicRow,
        _parent: Option<&BlockRow>,
        _parent_totals: Option<&BlockTotalRow>,
        _totals: &mut BlockTotalRow,
    ) -> Result<(), HarvesterError> {
        Ok(())
    }
}


/// Handler for one event, keyed by module and event id.
#[async_trait]
pub trait EventProcessor: Send + Sync {
    fn module_id(&self) -> &'static str;
    fn event_id(&self) -> &'static str;

    async fn accumulation_hook(
        &self,
        _conn: &mut SqliteConnection,
        _block: &mut BlockRow,
        _event: &EventRow,
        _extrinsic: Option<&ExtrinsicRow>,
    ) -> Result<(), HarvesterError> {
        Ok(())
    }

    async fn sequencing_hook(
        &self,
        _conn: &mut SqliteConnection,
        _block: &BlockRow,
        _event: &EventRow,
        _parent: Option<&BlockRow>,
        _parent_totals: Option<&BlockTotalRow>,
        _totals: &mut BlockTotalRow,
    ) -> Result<(), HarvesterError> {
        Ok(())
    }
}


/// Handler that sees every block.
#[async_trait]
pub trait BlockProcessor: Send + Sync {
    async fn accumulation_hook(
        &self,
        _conn: &mut SqliteConnection,
        _block: &mut BlockRow,
    ) -> Result<(), HarvesterError> {
        Ok(())
    }

    async fn sequencing_hook(
        &self,
        _conn: &mut SqliteConnection,
        _block: &BlockRow,
        _parent: Option<&BlockRow>,
        _parent_totals: Option<&BlockTotalRow>,
        _totals: &mut BlockTotalRow,
    ) -> Result<(), HarvesterError> {
        Ok(())
    }
}


/// The registered handler sets, matched in registration order.
pub struct ProcessorRegistry {
    extrinsic: Vec<Arc<dyn ExtrinsicProcessor>>,
    event: Vec<Arc<dyn EventProcessor>>,
    block: Vec<Arc<dyn BlockProcessor>>,
}

impl ProcessorRegistry {
    pub fn empty() -> Self {
        ProcessorRegistry {
            extrinsic: Vec::new(),
            event: Vec::new(),
            block: Vec::new(),
        }
    }

    /// The built-in handler set.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register_extrinsic(Arc::new(TimestampProcessor));
        registry.register_event(Arc::new(TransferEventProcessor));
        registry.register_event(Arc::new(NewAccountProcessor));
        registry.register_event(Arc::new(ReapedAccountProcessor));
        registry.register_event(Arc::new(NewAccountIndexProcessor));
        registry.register_event(Arc::new(NewSessionProcessor));
        registry.register_event(Arc::new(ContractInstantiatedProcessor));
        registry.register_block(Arc::new(BlockTotalProcessor));
        registry
    }

    pub fn register_extrinsic(&mut self, processor: Arc<dyn ExtrinsicProcessor>) {
        self.extrinsic.push(processor);
    }

    pub fn register_event(&mut self, processor: Arc<dyn EventProcessor>) {
        self.event.push(processor);
    }

    pub fn register_block(&mut self, processor: Arc<dyn BlockProcessor>) {
        self.block.push(processor);
    }

    pub fn extrinsic_processors(
        &self,
        module_id: &str,
        call_id: &str,
    ) -> Vec<Arc<dyn ExtrinsicProcessor>> {
        self.extrinsic
            .iter()
            .filter(|p| p.module_id() == module_id && p.call_id() == call_id)
            .cloned()
            .collect()
    }

    pub fn event_processors(&self, module_id: &str, event_id: &str) -> Vec<Arc<dyn EventProcessor>> {
        self.event
            .iter()
            .filter(|p| p.module_id() == module_id && p.event_id() == event_id)
            .cloned()
            .collect()
    }

    pub fn block_processors(&self) -> Vec<Arc<dyn BlockProcessor>> {
        self.block.clone()
    }
}


fn event_param(attributes: &str, idx: usize) -> Option<JsonValue> {
    let value: JsonValue = serde_json::from_str(attributes).ok()?;
    value.as_array()?.get(idx).cloned()
}


/// Account id hex (no 0x) out of an event attribute, when the attribute
/// is a full 32 byte key.
pub(crate) fn event_param_account(attributes: &str, idx: usize) -> Option<String> {
    let param = event_param(attributes, idx)?;
    let raw = param.get("valueRaw")?.as_str()?;
    (raw.len() == 64).then(|| raw.to_string())
}


pub(crate) fn event_param_u64(attributes: &str, idx: usize) -> Option<u64> {
    match event_param(attributes, idx)?.get("value")? {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.parse().ok(),
        _ => None,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_filters_on_module_and_id() {
        let registry = ProcessorRegistry::standard();
        assert_eq!(registry.extrinsic_processors("timestamp", "set").len(), 1);
        assert_eq!(registry.extrinsic_processors("timestamp", "other").len(), 0);
        assert_eq!(registry.event_processors("balances", "Transfer").len(), 1);
        assert_eq!(registry.event_processors("system", "Transfer").len(), 0);
        assert_eq!(registry.block_processors().len(), 1);
    }

    #[test]
    fn event_param_helpers() {
        let attributes = format!(
            r#"[{{"type":"AccountId","value":"0x{0}","valueRaw":"{0}"}},{{"type":"AccountIndex","value":9,"valueRaw":"09000000"}}]"#,
            "ab".repeat(32)
        );
        assert_eq!(
            event_param_account(&attributes, 0).unwrap(),
            "ab".repeat(32)
        );
        assert_eq!(event_param_u64(&attributes, 1), Some(9));
        assert_eq!(event_param_account(&attributes, 1), None);
        assert_eq!(event_param_u64(&attributes, 5), None);
    }
}
