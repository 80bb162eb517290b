use crate::bot::events::{event_from_text, file_ref_from_message, Command};
use crate::bot::handlers::dispatch_event;
use crate::config::{BotSettings, POLLING_RETRY_DELAY_SECS, POLLING_TIMEOUT_SECS};
use file_relay_core::dispatch::{FileRelay, InboundEvent};
use file_relay_core::model::FileRef;
use file_relay_core::storage::{self, LinkStore};
use std::sync::Arc;
use std::time::Duration;
use teloxide::dispatching::UpdateHandler;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::types::Me;
use teloxide::update_listeners::Polling;
use tracing::{error, info, warn};

/// Run the Telegram transport runtime.
pub async fn run_bot(settings: Arc<BotSettings>) {
    let store = init_storage(&settings).await;

    let bot = Bot::new(settings.telegram.telegram_token.clone());
    remove_webhook(&bot).await;
    let me = init_me(&bot).await;

    let admins = settings.telegram.admin_ids();
    if admins.is_empty() {
        warn!("ADMIN_IDS is empty, nobody can upload files.");
    }
    info!("Loaded {} admin id(s).", admins.len());
    let relay = Arc::new(FileRelay::new(store, admins));

    let listener = Polling::builder(bot.clone())
        .timeout(Duration::from_secs(POLLING_TIMEOUT_SECS))
        .backoff_strategy(|_| Duration::from_secs(POLLING_RETRY_DELAY_SECS))
        .build();

    info!("Bot @{} is running...", me.username());

    Dispatcher::builder(bot, setup_handler())
        .dependencies(dptree::deps![relay.clone(), settings, me])
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    let pending = relay.sessions().active_sessions().await;
    if pending > 0 {
        warn!("Dropping {pending} unfinished upload session(s) on shutdown.");
    }
    relay.sessions().clear().await;
    info!("Bot stopped.");
}

async fn init_storage(settings: &BotSettings) -> Arc<dyn LinkStore> {
    let store = match storage::connect(&settings.relay).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to initialize link store: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = store.check_connection().await {
        error!("Link store connection check failed: {}", e);
        std::process::exit(1);
    }
    info!(
        backend = ?settings.relay.storage_backend,
        "Link store initialized."
    );
    store
}

/// Polling and webhooks are mutually exclusive, so drop any webhook first.
async fn remove_webhook(bot: &Bot) {
    match bot.get_webhook_info().await {
        Ok(webhook) => match webhook.url {
            Some(url) => {
                info!("Removing webhook {}", url.host_str().unwrap_or("<unknown>"));
                if let Err(e) = bot.delete_webhook().await {
                    error!("Failed to delete webhook: {}", e);
                } else {
                    info!("Webhook removed.");
                }
            }
            None => info!("No webhook set, polling can start."),
        },
        Err(e) => error!("Failed to fetch webhook info: {}", e),
    }
}

async fn init_me(bot: &Bot) -> Me {
    match bot.get_me().await {
        Ok(me) => {
            info!("Authorized as @{}", me.username());
            me
        }
        Err(e) => {
            error!("getMe failed, check TELEGRAM_TOKEN: {}", e);
            std::process::exit(1);
        }
    }
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(
            dptree::filter_map(|msg: Message| file_ref_from_message(&msg)).endpoint(handle_media),
        )
        .branch(
            dptree::filter_map(|msg: Message| msg.text().map(ToOwned::to_owned))
                .endpoint(handle_text),
        )
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    me: Me,
    relay: Arc<FileRelay>,
    settings: Arc<BotSettings>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = dispatch_event(&bot, &msg, &me, &relay, &settings, cmd.into()).await {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_media(
    bot: Bot,
    msg: Message,
    file: FileRef,
    me: Me,
    relay: Arc<FileRelay>,
    settings: Arc<BotSettings>,
) -> Result<(), teloxide::RequestError> {
    let event = InboundEvent::Media(file);
    if let Err(e) = dispatch_event(&bot, &msg, &me, &relay, &settings, event).await {
        error!("Media handler error: {}", e);
    }
    respond(())
}

async fn handle_text(
    bot: Bot,
    msg: Message,
    text: String,
    me: Me,
    relay: Arc<FileRelay>,
    settings: Arc<BotSettings>,
) -> Result<(), teloxide::RequestError> {
    let event = event_from_text(&text);
    if let Err(e) = dispatch_event(&bot, &msg, &me, &relay, &settings, event).await {
        error!("Text handler error: {}", e);
    }
    respond(())
}
