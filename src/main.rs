use clap::Parser;
use docker_registry_manager::cli::{Args, Runner};
use docker_registry_manager::config::ManagerConfig;
use docker_registry_manager::logging::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    args.validate().map_err(|e| anyhow::anyhow!(e))?;

    let base = ManagerConfig::from_env()?;
    init_tracing(args.verbose || base.verbose)?;

    Runner::new(args, base).run().await?;
    Ok(())
}
