use std::sync::Arc;
use std::time::Duration;

use prometheus_client::registry::Registry;
use tracing::info;

use hrv_client::{RpcClient, SubstrateRpc};
use hrv_scale::TypeRegistry;
use hrv_storage::Database;

use crate::accumulate::Harvester;
use crate::cli::Cli;
use crate::gateway::CodecGateway;
use crate::metrics::register_metrics;
use crate::scheduler::Scheduler;
use crate::server::run_server;


pub async fn run(args: &Cli) -> anyhow::Result<()> {
    if let Some(port) = args.prom_port {
        let mut registry = Registry::default();
        register_metrics(&mut registry);
        tokio::spawn(run_server(registry, port));
    }

    let db = Database::open(&args.database_url).await?;
    let node = Arc::new(SubstrateRpc::new(RpcClient::new(args.node_url.clone())));
    let type_registry = TypeRegistry::builtin(&args.type_registry)?;
    let gateway = Arc::new(CodecGateway::new(node, type_registry, args.ss58_format));
    let harvester = Arc::new(Harvester::new(db, gateway, args.debug_capture));

    info!(
        node = %args.node_url,
        workers = args.workers,
        "harvester starting"
    );

    let scheduler = Scheduler::new(harvester, usize::from(args.workers));
    scheduler
        .run(
            Duration::from_secs(u64::from(args.poll_interval)),
            args.check_gaps,
        )
        .await;
    Ok(())
}
