use dotenvy::dotenv;
use std::sync::Arc;
use steam_deals_bot::bot::dedup::DedupTracker;
use steam_deals_bot::bot::handlers::Command;
use steam_deals_bot::bot::{callback, deals, handlers};
use steam_deals_bot::config::{self, Settings};
use steam_deals_bot::steam::api::SteamClient;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ChatId, InlineQuery};
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    // Load .env file
    dotenv().ok();

    init_logging();

    info!("Starting Steam Deals Bot...");

    let settings = init_settings();

    // Single cache/tracker instances for the whole process, owned here and
    // handed out as Arcs instead of living in globals.
    let client = match SteamClient::new(settings.steam_api_key.clone()) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };
    let tracker = Arc::new(DedupTracker::new(
        config::SEEN_DEALS_MAX_SIZE,
        config::SEEN_DEALS_CLEANUP_FRACTION,
    ));

    let bot = Bot::new(settings.bot_token.clone());

    let channel = ChatId(settings.channel_id);
    tokio::spawn(deals::deals_loop(
        bot.clone(),
        channel,
        Arc::clone(&client),
        Arc::clone(&tracker),
    ));

    info!("Bot is running...");

    Dispatcher::builder(bot, setup_handler())
        .dependencies(dptree::deps![client, tracker])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_inline_query().endpoint(handle_inline_query))
        .branch(Update::filter_callback_query().endpoint(handle_callback_query))
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    client: Arc<SteamClient>,
    tracker: Arc<DedupTracker>,
) -> Result<(), teloxide::RequestError> {
    let res = match cmd {
        Command::Start => handlers::start(bot, msg).await,
        Command::Help => handlers::help(bot, msg).await,
        Command::User(vanity) => handlers::user_lookup(bot, msg, vanity, client).await,
        Command::Stats => handlers::stats(bot, msg, client, tracker).await,
    };
    if let Err(e) = res {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_inline_query(
    bot: Bot,
    q: InlineQuery,
    client: Arc<SteamClient>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_inline_query(bot, q, client).await {
        error!("Inline query handler error: {}", e);
    }
    respond(())
}

async fn handle_callback_query(
    bot: Bot,
    q: CallbackQuery,
    client: Arc<SteamClient>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = callback::handle_callback(bot, q, client).await {
        error!("Callback handler error: {}", e);
    }
    respond(())
}
