use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pnl-forecast-web")]
#[command(about = "HTTP API for filling P&L forecasts")]
struct Args {
    /// JSON data file holding statements and versions
    #[arg(short, long, default_value = "pnl-forecast.json")]
    store: PathBuf,

    /// Port to listen on
    #[arg(short, long, default_value_t = pnl_forecast_web::DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    pnl_forecast_web::run(args.store, args.port).await
}
