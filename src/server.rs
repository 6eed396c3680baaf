//! TCP accept loop (A4): one task per connection, tracked by a `TaskTracker`
//! so shutdown can wait for in-flight sessions to drain before exiting.
//! Grounded on the daemon binary's ctrl-c/`TaskTracker` shutdown pattern.

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::publisher::Publisher;
use crate::session::Session;
use crate::store::AvlStore;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_util::task::TaskTracker;

pub struct Server {
    config: Config,
    dispatcher: Arc<Dispatcher>,
}

impl Server {
    pub fn new(config: Config, store: Arc<dyn AvlStore>, publisher: Arc<dyn Publisher>) -> Self {
        let mut dispatcher = Dispatcher::new(store, publisher);
        dispatcher.sorted_last_point = config.sorted_last_point;
        Server {
            config,
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Accepts connections until `shutdown_rx` fires, then waits for every
    /// spawned session to finish before returning.
    pub async fn run(&self, shutdown_rx: oneshot::Receiver<()>) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.config.listen_addr()).await?;
        info!("listening on {}", self.config.listen_addr());

        let tracker = TaskTracker::new();
        tokio::pin!(shutdown_rx);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (socket, peer_addr) = match accepted {
                        Ok(v) => v,
                        Err(e) => {
                            warn!("accept failed: {e}");
                            continue;
                        }
                    };
                    let config = self.config.clone();
                    let dispatcher = self.dispatcher.clone();
                    tracker.spawn(async move {
                        let mut session = Session::new(peer_addr);
                        if let Err(e) = session.run(socket, &config, &dispatcher).await {
                            error!("session with {peer_addr} ended with an error: {e}");
                        }
                    });
                }
                _ = &mut shutdown_rx => {
                    info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        tracker.close();
        tracker.wait().await;
        Ok(())
    }
}

/// Spawns a task that resolves `shutdown_tx` when ctrl-c is received.
pub fn spawn_ctrl_c_shutdown(shutdown_tx: oneshot::Sender<()>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("ctrl-c received, shutting down");
                let _ = shutdown_tx.send(());
            }
            Err(e) => error!("unable to listen for shutdown signal: {e}"),
        }
    });
}
