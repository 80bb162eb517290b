//! Replays stored file handles through the Bot API.

use anyhow::Result;
use async_trait::async_trait;
use file_relay_core::model::{FileKind, FileRef};
use file_relay_core::transport::MediaTransport;
use teloxide::prelude::*;
use teloxide::types::{ChatId, FileId, InputFile};

/// Sends files by their Telegram `file_id`; nothing is re-uploaded.
pub struct TelegramMediaTransport {
    bot: Bot,
}

impl TelegramMediaTransport {
    /// Create a transport using the given bot
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl MediaTransport for TelegramMediaTransport {
    async fn send_media(&self, chat_id: i64, file: &FileRef) -> Result<()> {
        let chat_id = ChatId(chat_id);
        let input = InputFile::file_id(FileId(file.handle().to_string()));

        match file.kind() {
            FileKind::Photo => {
                let mut req = self.bot.send_photo(chat_id, input);
                if let Some(caption) = file.caption() {
                    req = req.caption(caption);
                }
                req.await?;
            }
            FileKind::Video => {
                let mut req = self.bot.send_video(chat_id, input);
                if let Some(caption) = file.caption() {
                    req = req.caption(caption);
                }
                req.await?;
            }
            FileKind::Document => {
                self.bot.send_document(chat_id, input).await?;
            }
            FileKind::Audio => {
                self.bot.send_audio(chat_id, input).await?;
            }
            FileKind::Voice => {
                self.bot.send_voice(chat_id, input).await?;
            }
            FileKind::Animation => {
                self.bot.send_animation(chat_id, input).await?;
            }
            FileKind::Sticker => {
                self.bot.send_sticker(chat_id, input).await?;
            }
        }
        Ok(())
    }
}
