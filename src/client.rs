use crate::{
    config::AppConfig,
    ledger_client::HttpLedgerClient,
    session::ClientSession,
    storage::FileAddressStore,
    ui,
    view::SharedView,
    wallet::WalletIdentity,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use std::sync::Arc;
use tracing::{
    debug,
    info,
};

pub async fn run_app(config: AppConfig) -> Result<()> {
    let api = HttpLedgerClient::new(config.service_url.clone())?;
    let store = FileAddressStore::new(&config.data_dir)?;
    info!(
        service = %api,
        wallet_file = %store.path().display(),
        "ledger client configured"
    );
    let view = SharedView::new();
    let session = ClientSession::new(
        api,
        view.clone(),
        WalletIdentity::new(Arc::new(store)),
        config.block_limit,
        config.refresh_delay,
    );

    let mut ui_state = ui::UiState::new(config.service_url.clone());
    let mut input_events = ui::input_event_stream();

    info!("Starting UI");
    ui::terminal_enter(&mut ui_state)?;
    let res = run_loop(session, view, &mut ui_state, &mut input_events).await;
    ui::terminal_exit()?;
    res
}

async fn run_loop(
    session: ClientSession<HttpLedgerClient, SharedView>,
    view: SharedView,
    ui_state: &mut ui::UiState,
    input_events: &mut ui::InputEventReceiver,
) -> Result<()> {
    info!("Running app loop");
    let loader = session.clone();
    tokio::spawn(async move { loader.load().await });
    ui::draw(ui_state, &view.snapshot()).wrap_err("initial draw failed")?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received interrupt, exiting");
                break;
            }
            _ = view.changed() => {
                ui::draw(ui_state, &view.snapshot())
                    .wrap_err("draw after view update failed")?;
            }
            raw_ev = ui::next_raw_event(input_events) => {
                let event = raw_ev?;
                let prompt_open = view.snapshot().prompt.is_some();
                let Some(ev) = ui::interpret_event(ui_state, event, prompt_open) else {
                    continue;
                };
                match ev {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::Redraw => {}
                    ui::UserEvent::DismissPrompt => view.dismiss_prompt(),
                    ui::UserEvent::CreateWallet => {
                        let session = session.clone();
                        tokio::spawn(async move {
                            if let Err(err) = session.create_wallet().await {
                                debug!(%err, "create wallet action ended with error");
                            }
                        });
                    }
                    ui::UserEvent::RefreshBlocks => {
                        let session = session.clone();
                        tokio::spawn(async move { session.refresh_blocks().await });
                    }
                    ui::UserEvent::SubmitWager(form) => {
                        let session = session.clone();
                        tokio::spawn(async move {
                            if let Err(err) = session.place_wager(&form).await {
                                debug!(%err, kind = %form.kind, "wager action ended with error");
                            }
                        });
                    }
                }
                ui::draw(ui_state, &view.snapshot())
                    .wrap_err("draw after input failed")?;
            }
        }
    }
    Ok(())
}
