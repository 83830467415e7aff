use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::SqliteConnection;

use hrv_storage::{BlockRow, ExtrinsicRow};

use crate::error::HarvesterError;
use crate::processors::ExtrinsicProcessor;


/// `timestamp.set` carries the block's wall clock.
///
/// Early runtimes reported seconds, later ones milliseconds; anything
/// below 10^12 is read as seconds.
pub struct TimestampProcessor;

const MILLIS_THRESHOLD: u64 = 1_000_000_000_000;

#[async_trait]
impl ExtrinsicProcessor for TimestampProcessor {
    fn module_id(&self) -> &'static str {
        "timestamp"
    }

    fn call_id(&self) -> &'static str {
        "set"
    }

    async fn accumulation_hook(
        &self,
        _conn: &mut SqliteConnection,
        block: &mut BlockRow,
        extrinsic: &ExtrinsicRow,
    ) -> Result<(), HarvesterError> {
        let Some(moment) = first_param_u64(&extrinsic.params) else {
            return Ok(());
        };
        let millis = if moment >= MILLIS_THRESHOLD {
            moment
        } else {
            moment.saturating_mul(1000)
        };
        block.datetime = Some(millis as i64);
        Ok(())
    }
}


fn first_param_u64(params: &str) -> Option<u64> {
    let value: JsonValue = serde_json::from_str(params).ok()?;
    match value.as_array()?.first()?.get("value")? {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.parse().ok(),
        _ => None,
    }
}
