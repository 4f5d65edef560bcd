//! Move-sync demo.
//!
//! Run a server and any number of clients against it:
//!
//! ```text
//! move-sync server 0.0.0.0 8888
//! move-sync client 127.0.0.1 8888
//! ```

mod client;
mod messages;
mod server;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), wirelink::WirelinkError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let mode = args.next().unwrap_or_default();
    let host = args.next().unwrap_or_else(|| "127.0.0.1".to_string());
    let port = args
        .next()
        .and_then(|p| p.parse().ok())
        .unwrap_or(messages::DEFAULT_PORT);

    match mode.as_str() {
        "server" => server::run(&host, port).await,
        "client" => client::run(&host, port).await,
        _ => {
            eprintln!("usage: move-sync <server|client> [host] [port]");
            std::process::exit(2);
        }
    }
}
