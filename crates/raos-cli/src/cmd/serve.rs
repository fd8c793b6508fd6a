use anyhow::Context;
use raos_server::AppState;
use std::path::Path;

pub fn run(root: &Path, port: Option<u16>) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    let pipeline = super::open_pipeline(root, &config)?;
    let addr = format!("{}:{}", config.server.host, port.unwrap_or(config.server.port));

    super::runtime()?.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        raos_server::serve_on(listener, AppState::new(pipeline)).await
    })
}
