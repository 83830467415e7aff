use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;


lazy_static::lazy_static! {
    pub static ref BLOCKS_ADDED: Counter = Default::default();
    pub static ref BLOCKS_SEQUENCED: Counter = Default::default();
    pub static ref SEQUENCER_HEIGHT: Gauge = Default::default();
    pub static ref CHAIN_HEAD: Gauge = Default::default();
}


pub fn register_metrics(registry: &mut Registry) {
    registry.register(
        "hrv_blocks_added",
        "Blocks accumulated into the store",
        BLOCKS_ADDED.clone()
    );
    registry.register(
        "hrv_blocks_sequenced",
        "Blocks with a derived totals row",
        BLOCKS_SEQUENCED.clone()
    );
    registry.register(
        "hrv_sequencer_height",
        "Highest sequenced block",
        SEQUENCER_HEIGHT.clone()
    );
    registry.register(
        "hrv_chain_head",
        "Finalized head reported by the node",
        CHAIN_HEAD.clone()
    );
}
