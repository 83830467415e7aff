pub mod accumulate;
pub mod cli;
pub mod decoder;
pub mod error;
pub mod gateway;
pub mod metadata;
pub mod metrics;
pub mod processors;
pub mod scheduler;
pub mod sequence;
pub mod server;
pub mod service;

pub use accumulate::Harvester;
pub use error::HarvesterError;
pub use gateway::CodecGateway;
pub use metadata::MetadataCache;
