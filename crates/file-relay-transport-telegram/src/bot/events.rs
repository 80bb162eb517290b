//! Telegram message → [`InboundEvent`] mapping.

use crate::bot::views::{DONE_BUTTON, UPLOAD_BUTTON};
use file_relay_core::dispatch::InboundEvent;
use file_relay_core::model::{FileKind, FileRef};
use teloxide::prelude::*;
use teloxide::utils::command::{BotCommands, ParseError};

/// Supported commands for the bot
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Welcome menu, or replay a shared link when a token follows
    #[command(
        description = "Show the menu or open a shared link.",
        parse_with = parse_start_payload
    )]
    Start(String),
    /// Open an upload session
    #[command(description = "Start collecting files (admins only).")]
    Upload,
    /// Finish the upload session
    #[command(description = "Finish the upload and get the link (admins only).")]
    Done,
    /// Link statistics
    #[command(description = "Show link statistics (admins only).")]
    Stats,
    /// Command overview
    #[command(description = "Show this help.")]
    Help,
}

// Accepts a bare `/start` as well as `/start <token>`.
#[allow(clippy::unnecessary_wraps)]
fn parse_start_payload(input: String) -> Result<(String,), ParseError> {
    Ok((input.trim().to_string(),))
}

impl From<Command> for InboundEvent {
    fn from(cmd: Command) -> Self {
        match cmd {
            Command::Start(payload) => Self::Start {
                payload: Some(payload).filter(|p| !p.is_empty()),
            },
            Command::Upload => Self::UploadTrigger,
            Command::Done => Self::FinishTrigger,
            Command::Stats => Self::Stats,
            Command::Help => Self::Help,
        }
    }
}

/// Map plain text, recognising the reply-keyboard buttons.
#[must_use]
pub fn event_from_text(text: &str) -> InboundEvent {
    match text.trim() {
        UPLOAD_BUTTON => InboundEvent::UploadTrigger,
        DONE_BUTTON => InboundEvent::FinishTrigger,
        _ => InboundEvent::Text(text.to_string()),
    }
}

/// Extract the shareable media item of a message, if it carries one.
///
/// Photos use the largest available size. Captions are kept for photos and videos.
#[must_use]
pub fn file_ref_from_message(msg: &Message) -> Option<FileRef> {
    let caption = msg.caption().map(ToString::to_string);

    if let Some(photo) = msg.photo().and_then(<[_]>::last) {
        return Some(FileRef::new(FileKind::Photo, photo.file.id.to_string(), caption));
    }
    if let Some(video) = msg.video() {
        return Some(FileRef::new(FileKind::Video, video.file.id.to_string(), caption));
    }
    if let Some(animation) = msg.animation() {
        return Some(FileRef::new(FileKind::Animation, animation.file.id.to_string(), None));
    }
    if let Some(document) = msg.document() {
        return Some(FileRef::new(FileKind::Document, document.file.id.to_string(), None));
    }
    if let Some(audio) = msg.audio() {
        return Some(FileRef::new(FileKind::Audio, audio.file.id.to_string(), None));
    }
    if let Some(voice) = msg.voice() {
        return Some(FileRef::new(FileKind::Voice, voice.file.id.to_string(), None));
    }
    msg.sticker()
        .map(|sticker| FileRef::new(FileKind::Sticker, sticker.file.id.to_string(), None))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT: &str = "relay_bot";

    fn parse(text: &str) -> Option<InboundEvent> {
        Command::parse(text, BOT).ok().map(InboundEvent::from)
    }

    #[test]
    fn start_with_and_without_token() {
        assert_eq!(
            parse("/start file_1700000000_42"),
            Some(InboundEvent::Start {
                payload: Some("file_1700000000_42".into())
            })
        );
        assert_eq!(parse("/start"), Some(InboundEvent::Start { payload: None }));
    }

    #[test]
    fn admin_commands() {
        assert_eq!(parse("/upload"), Some(InboundEvent::UploadTrigger));
        assert_eq!(parse("/done"), Some(InboundEvent::FinishTrigger));
        assert_eq!(parse("/stats"), Some(InboundEvent::Stats));
        assert_eq!(parse("/help"), Some(InboundEvent::Help));
        assert_eq!(parse("/unknown"), None);
    }

    #[test]
    fn buttons_map_to_triggers() {
        assert_eq!(event_from_text(UPLOAD_BUTTON), InboundEvent::UploadTrigger);
        assert_eq!(event_from_text(DONE_BUTTON), InboundEvent::FinishTrigger);
        assert_eq!(
            event_from_text("hello"),
            InboundEvent::Text("hello".into())
        );
    }
}
