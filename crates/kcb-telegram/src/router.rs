use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tokio::sync::Mutex;
use tracing::{info, warn};

use kcb_core::{
    config::Config, interpreter::CommandInterpreter, messaging::port::DeliveryChannel,
    session::SessionRegistry,
};

use crate::handlers;
use crate::TelegramChannel;

#[derive(Clone)]
pub struct AppState {
    pub interpreter: Arc<CommandInterpreter>,
    pub channel: Arc<dyn DeliveryChannel>,
    pub sessions: Arc<Mutex<SessionRegistry>>,
}

pub async fn run_polling(
    cfg: Arc<Config>,
    interpreter: Arc<CommandInterpreter>,
    sessions: Arc<Mutex<SessionRegistry>>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => info!(username = %me.username(), "Bot started"),
        Err(e) => warn!(error = %e, "Could not fetch bot identity"),
    }
    info!(owner = cfg.owner_id.0, "Accepting commands from owner only");

    let channel: Arc<dyn DeliveryChannel> = Arc::new(TelegramChannel::new(bot.clone()));

    let state = Arc::new(AppState {
        interpreter,
        channel,
        sessions,
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
