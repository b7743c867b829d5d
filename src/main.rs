use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use lexis::ContentStore;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Clone, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Address the HTTP API binds to
    #[clap(long, env = "LEXIS_ADDR", default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// Runtime worker threads (defaults to available cores)
    #[clap(long, env = "LEXIS_WORKERS")]
    workers: Option<usize>,

    /// tracing filter directives
    #[clap(long, env = "RUST_LOG", default_value = "info,lexis=info")]
    log_filter: String,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::new(&args.log_filter))
    .with_target(false)
    .with_level(true)
    .init();

    let workers = args
    .workers
    .unwrap_or_else(|| thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
    .max(1);
    tracing::info!(workers, "starting runtime");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
    .worker_threads(workers)
    .enable_all()
    .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "failed to build runtime");
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(async_main(args)) {
        tracing::error!(error = %e, "server failed");
        std::process::exit(1);
    }
}

async fn async_main(args: Args) -> Result<(), warp::Error> {
    let store = Arc::new(ContentStore::new());

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "could not listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutting down.");
    };

    lexis::server::serve(store, args.addr, shutdown).await
}
