use clap::Parser;
use kube::Client;
use owo_colors::OwoColorize;

mod clusters;
mod daemonclusters;
mod daemons;
mod monclusters;
mod mons;
mod osds;
mod util;

/// Runs the six `CephCluster`/`CephMonCluster`/`CephDaemonCluster`/`CephMon`/
/// `CephDaemon`/`CephOsd` reconcile loops against the cluster pointed to by
/// `KUBECONFIG`/in-cluster config, each behind its own leader election lock.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Port the `/metrics` endpoint listens on. Set to 0 to disable.
    #[arg(long, env = "METRICS_PORT", default_value_t = 9090)]
    metrics_port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    println!("{}", "🚀 Starting ceph-operator...".green());

    let client = Client::try_default().await?;

    #[cfg(feature = "metrics")]
    if cli.metrics_port != 0 {
        tokio::spawn(util::metrics::serve(cli.metrics_port));
    }
    #[cfg(not(feature = "metrics"))]
    let _ = cli.metrics_port;

    ceph_common::signal_ready();

    let result = tokio::try_join!(
        clusters::run(client.clone()),
        monclusters::run(client.clone()),
        mons::run(client.clone()),
        daemonclusters::run(client.clone()),
        daemons::run(client.clone()),
        osds::run(client.clone()),
    );

    if let Err(e) = result {
        eprintln!("{}", format!("🛑 ceph-operator exited with error: {e}").red());
        return Err(e.into());
    }

    println!("{}", "🛑 ceph-operator stopped gracefully".red());
    Ok(())
}
