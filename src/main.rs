use anyhow::Result;
use shipping_manager::{config::Config, console, page::Page};
use tokio::io::BufReader;
use tracing::info;

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shipping_manager=debug"));

    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            std::process::exit(1);
        }
    };

    info!(
        api = %config.shipments_url(),
        page = %config.page_output.display(),
        "shipping manager starting"
    );

    let page = Page::from_config(&config)?;
    let _ = page.load().await;

    console::run(
        &page,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        &config.page_output,
    )
    .await
}
