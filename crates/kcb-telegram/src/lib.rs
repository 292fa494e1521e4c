//! Telegram adapter (teloxide).
//!
//! This crate implements the `kcb-core` DeliveryChannel over the Telegram Bot API
//! and runs the long-polling dispatcher.

use std::path::Path;

use async_trait::async_trait;

use teloxide::{net::Download, prelude::*};

use tokio::{io::AsyncWriteExt, time::sleep};

pub mod handlers;
pub mod router;

use kcb_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{port::DeliveryChannel, types::PhotoRef},
    Result,
};

#[derive(Clone)]
pub struct TelegramChannel {
    bot: Bot,
}

impl TelegramChannel {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    /// Retry once when Telegram asks us to back off; every other failure is final.
    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(teloxide::RequestError::RetryAfter(d)) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    tracing::debug!(wait = ?d, "Telegram flood control, retrying");
                    sleep(d).await;
                }
                Err(other) => return Err(Self::map_err(other)),
            }
        }
    }
}

#[async_trait]
impl DeliveryChannel for TelegramChannel {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), text.to_string())
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn fetch_photo(&self, photo: &PhotoRef, dest: &Path) -> Result<u64> {
        let file = self
            .with_retry(|| self.bot.get_file(photo.file_id.clone()))
            .await?;

        let mut dst = tokio::fs::File::create(dest).await?;
        self.bot
            .download_file(&file.path, &mut dst)
            .await
            .map_err(|e| Error::External(format!("telegram download error: {e}")))?;
        dst.flush().await?;

        Ok(tokio::fs::metadata(dest).await?.len())
    }
}
