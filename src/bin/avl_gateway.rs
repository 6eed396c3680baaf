//! Server entry point: parses config, wires up collaborators, runs the
//! accept loop until ctrl-c, then drains in-flight sessions before exit.

use avl_gateway::config::Config;
use avl_gateway::publisher::LogPublisher;
use avl_gateway::server::{spawn_ctrl_c_shutdown, Server};
use avl_gateway::store::NullStore;
use log::error;
use std::sync::Arc;
use tokio::sync::oneshot;

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    // Real store/publisher backends (ClickHouse, NATS) are left for a
    // deployment-specific build; the no-op store and logging publisher keep
    // this binary runnable and observable stand-alone.
    let store = Arc::new(NullStore);
    let publisher = Arc::new(LogPublisher);

    let server = Server::new(config, store, publisher);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    spawn_ctrl_c_shutdown(shutdown_tx);

    if let Err(e) = server.run(shutdown_rx).await {
        error!("server exited with an error: {e}");
        std::process::exit(1);
    }
}
