use clap::{value_parser, Parser};
use url::Url;


#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// URL of the substrate node RPC endpoint
    #[arg(short, long, value_name = "URL")]
    pub node_url: Url,

    /// Database location, e.g. sqlite://harvester.db
    #[arg(short, long, value_name = "DB", default_value = "sqlite://harvester.db")]
    pub database_url: String,

    /// Number of concurrent harvesting jobs
    #[arg(long, value_parser = value_parser!(u16).range(1..), default_value_t = 4)]
    pub workers: u16,

    /// Interval between polls of the finalized head in seconds
    #[arg(long, value_parser = value_parser!(u16).range(1..), default_value_t = 6)]
    pub poll_interval: u16,

    /// Look for and fill gaps in the accumulated range on every poll
    #[arg(long)]
    pub check_gaps: bool,

    /// Named type registry to decode against
    #[arg(long, value_name = "NAME", default_value = "default")]
    pub type_registry: String,

    /// SS58 network format used when rendering addresses
    #[arg(long, value_name = "N", default_value_t = 42)]
    pub ss58_format: u16,

    /// Store the raw node response next to each block
    #[arg(long)]
    pub debug_capture: bool,

    /// Whether the logs should be structured in JSON format
    #[arg(long)]
    pub json_log: bool,

    /// Port to use for built-in prometheus metrics server
    #[arg(long)]
    pub prom_port: Option<u16>,
}
