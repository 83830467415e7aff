use hrv_harvester::{cli, service};


fn init_logging(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}


fn main() -> anyhow::Result<()> {
    let args = <cli::Cli as clap::Parser>::parse();

    init_logging(args.json_log);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(service::run(&args))?;
    Ok(())
}
