use async_trait::async_trait;
use sqlx::SqliteConnection;

use hrv_storage::{BlockRow, EventRow, ExtrinsicRow};

use crate::error::HarvesterError;
use crate::processors::EventProcessor;


/// `contracts.Instantiated` marks a new contract account.
pub struct ContractInstantiatedProcessor;

#[async_trait]
impl EventProcessor for ContractInstantiatedProcessor {
    fn module_id(&self) -> &'static str {
        "contracts"
    }

    fn event_id(&self) -> &'static str {
        "Instantiated"
    }

    async fn accumulation_hook(
        &self,
        _conn: &mut SqliteConnection,
        block: &mut BlockRow,
        _event: &EventRow,
        _extrinsic: Option<&ExtrinsicRow>,
    ) -> Result<(), HarvesterError> {
        block.count_contracts_new += 1;
        Ok(())
    }
}
