use cantstop::{CantStopError, CantStopServer, DEFAULT_ADDR};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), CantStopError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("CANTSTOP_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());

    let server = CantStopServer::builder().bind(&addr).build().await?;
    server.run().await
}
