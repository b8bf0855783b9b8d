#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use clap::Parser;
    use class_scheduler::{AppConfig, http_api};
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    /// Class scheduler HTTP API
    #[derive(Parser, Debug)]
    #[command(name = "class-scheduler-http", version)]
    struct Cli {
        /// Address to listen on
        #[arg(long, env = "CLASS_SCHEDULER_HTTP_ADDR", default_value = "0.0.0.0:3000")]
        addr: SocketAddr,

        #[command(flatten)]
        config: AppConfig,
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();

    let cli = Cli::parse();
    let scheduler = cli.config.open_scheduler()?;
    println!("class-scheduler HTTP API listening on http://{}", cli.addr);
    http_api::serve(cli.addr, scheduler).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
