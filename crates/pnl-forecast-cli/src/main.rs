#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pnl_forecast_cli::run(std::env::args()).await
}
