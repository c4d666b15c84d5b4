use color_eyre::eyre::Result;
use ledger_wager_client::{
    client,
    config,
    logging,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let app_config = config::parse_cli_args()?;
    let _log_guard = logging::init_tracing(&app_config.log_file())?;
    tracing::info!(
        service = %app_config.service_url,
        data_dir = %app_config.data_dir.display(),
        "starting ledger wager client"
    );
    client::run_app(app_config).await
}
