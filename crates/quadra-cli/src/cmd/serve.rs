use crate::cmd::open_store;
use quadra_server::AppState;
use std::path::Path;
use std::sync::Arc;

pub fn run(root: &Path, port: Option<u16>) -> anyhow::Result<()> {
    let (config, db) = open_store(root)?;
    let port = port.unwrap_or(config.server.port);
    let state = AppState::new(root.to_path_buf(), Arc::new(db));

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
        let actual_port = listener.local_addr()?.port();
        println!(
            "quadra API for '{}' → http://localhost:{actual_port}",
            config.club.name
        );

        tokio::select! {
            res = quadra_server::serve_on(state, listener) => res,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                Ok(())
            }
        }
    })
}
