//! Texts and keyboards
//!
//! Every user-facing string lives here; [`render_reply`] turns a relay
//! [`Reply`] into an HTML message plus optional keyboard.

use crate::bot::events::Command;
use crate::config::TelegramSettings;
use file_relay_core::dispatch::Reply;
use file_relay_core::model::{share_link, KindTally, LinkStats};
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, KeyboardRemove,
    ReplyMarkup,
};
use teloxide::utils::command::BotCommands;
use tracing::warn;

/// Reply-keyboard button that opens an upload session
pub const UPLOAD_BUTTON: &str = "📤 Upload Files";
/// Reply-keyboard button that finishes the upload session
pub const DONE_BUTTON: &str = "✅ Done";

/// Shown after a link is replayed. Nothing actually deletes the files.
pub const AUTO_DELETE_NOTICE: &str = "⚠️ Files will be auto-deleted after 30 minutes.";
/// Sent when the relay fails on a storage error
pub const GENERIC_ERROR: &str = "⚠️ Something went wrong. Please try again later.";

const ADMIN_MENU: &str =
    "👑 <b>Admin Panel</b>\n\nWelcome back! Use the button below to share files.";
const USER_MENU: &str = "📢 <b>Welcome to File Sharing Bot!</b>\n\n\
     This bot allows you to access shared files from admins.";
const USER_MENU_LINKS: &str = "\n\n👇 Please check out our channel and website:";
const UPLOAD_STARTED: &str = "📤 <b>Upload Mode Activated</b>\n\n\
     Send me files (one by one or multiple at once).\n\
     When finished, click ✅ Done";
const LINK_NOT_FOUND: &str = "❌ No media found for this link.";
const UNAUTHORIZED: &str = "⛔ This command is for admins only.";
const NO_FILES: &str = "❌ No files uploaded.";
const NO_SESSION: &str = "❌ No active upload session. Use /upload to start.";
const SEND_MEDIA: &str = "❌ Please send media files only, or click ✅ Done to finish.";

/// A rendered message ready to send
#[derive(Debug, Clone)]
pub struct ReplyView {
    /// HTML text
    pub text: String,
    /// Keyboard to attach, if any
    pub markup: Option<ReplyMarkup>,
}

impl ReplyView {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: None,
        }
    }

    fn with_markup(text: impl Into<String>, markup: impl Into<ReplyMarkup>) -> Self {
        Self {
            text: text.into(),
            markup: Some(markup.into()),
        }
    }
}

/// Keyboard shown to admins on `/start`
#[must_use]
pub fn admin_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(UPLOAD_BUTTON)]]).resize_keyboard()
}

/// Keyboard shown while an upload session is open
#[must_use]
pub fn upload_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(DONE_BUTTON)]]).resize_keyboard()
}

/// Channel / website buttons for regular users, if configured
#[must_use]
pub fn user_menu_keyboard(settings: &TelegramSettings) -> Option<InlineKeyboardMarkup> {
    let rows: Vec<Vec<InlineKeyboardButton>> = [
        ("📢 Join Our Channel", settings.channel_url.as_deref()),
        ("🌐 Visit Our Website", settings.website_url.as_deref()),
    ]
    .into_iter()
    .filter_map(|(label, url)| {
        let url = url?;
        match reqwest::Url::parse(url) {
            Ok(parsed) => Some(vec![InlineKeyboardButton::url(label, parsed)]),
            Err(e) => {
                warn!(url, error = %e, "Ignoring invalid menu URL");
                None
            }
        }
    })
    .collect();

    (!rows.is_empty()).then(|| InlineKeyboardMarkup::new(rows))
}

/// Upload summary with the share link
#[must_use]
pub fn upload_complete_text(
    bot_username: &str,
    link_token: &str,
    total: usize,
    tally: &KindTally,
) -> String {
    let summary: String = tally
        .iter()
        .map(|(kind, count)| format!("📁 {kind}: {count}\n"))
        .collect();
    let link = share_link(bot_username, link_token);

    format!(
        "✅ <b>Upload Complete!</b>\n\n\
         📦 Total files: {total}\n\
         {summary}\n\
         🔗 <b>Shareable Link:</b>\n{}",
        html_escape::encode_text(&link)
    )
}

/// Admin statistics
#[must_use]
pub fn stats_text(stats: &LinkStats) -> String {
    format!(
        "📊 <b>Bot Statistics</b>\n\n\
         📦 Total shared files: {}\n\
         👁️ Total link accesses: {}",
        stats.total_links, stats.total_accesses
    )
}

/// Context needed to render replies
pub struct ViewContext<'a> {
    /// Bot username for share links
    pub bot_username: &'a str,
    /// Menu configuration
    pub settings: &'a TelegramSettings,
}

/// Render a relay reply. `None` means nothing should be sent.
#[must_use]
pub fn render_reply(reply: &Reply, ctx: &ViewContext<'_>) -> Option<ReplyView> {
    let view = match reply {
        Reply::Delivered { report } => {
            let mut text = AUTO_DELETE_NOTICE.to_string();
            if !report.is_complete() {
                text.push_str(&format!(
                    "\n\n⚠️ {} of {} files could not be delivered.",
                    report.failed.len(),
                    report.failed.len() + report.delivered.len()
                ));
            }
            ReplyView::text(text)
        }
        Reply::LinkNotFound => ReplyView::text(LINK_NOT_FOUND),
        Reply::AdminMenu => ReplyView::with_markup(ADMIN_MENU, admin_keyboard()),
        Reply::UserMenu => match user_menu_keyboard(ctx.settings) {
            Some(markup) => {
                ReplyView::with_markup(format!("{USER_MENU}{USER_MENU_LINKS}"), markup)
            }
            None => ReplyView::text(USER_MENU),
        },
        Reply::UploadStarted => ReplyView::with_markup(UPLOAD_STARTED, upload_keyboard()),
        Reply::Unauthorized => ReplyView::text(UNAUTHORIZED),
        Reply::Progress { count } => ReplyView::text(format!(
            "✅ <b>{count} files</b> saved so far. Send more or click ✅ Done."
        )),
        Reply::UploadComplete {
            link_token,
            total,
            tally,
        } => ReplyView::with_markup(
            upload_complete_text(ctx.bot_username, link_token, *total, tally),
            KeyboardRemove::new(),
        ),
        Reply::NoFilesUploaded => ReplyView::with_markup(NO_FILES, KeyboardRemove::new()),
        Reply::NoActiveSession => ReplyView::text(NO_SESSION),
        Reply::SendMediaReminder => ReplyView::text(SEND_MEDIA),
        Reply::Stats(stats) => ReplyView::text(stats_text(stats)),
        Reply::Help => ReplyView::text(
            html_escape::encode_text(&Command::descriptions().to_string()).into_owned(),
        ),
        Reply::Ignored => return None,
    };
    Some(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use file_relay_core::model::{tally_kinds, FileKind, FileRef};
    use file_relay_core::resolver::{DeliveryFailure, DeliveryReport};

    fn ctx(settings: &TelegramSettings) -> ViewContext<'_> {
        ViewContext {
            bot_username: "relay_bot",
            settings,
        }
    }

    #[test]
    fn keyboards_are_not_empty() {
        assert_eq!(admin_keyboard().keyboard[0][0].text, UPLOAD_BUTTON);
        assert_eq!(upload_keyboard().keyboard[0][0].text, DONE_BUTTON);
    }

    #[test]
    fn user_menu_buttons_follow_config() {
        let mut settings = TelegramSettings::default();
        assert!(user_menu_keyboard(&settings).is_none());

        settings.channel_url = Some("https://t.me/some_channel".into());
        settings.website_url = Some("not a url".into());
        let markup = user_menu_keyboard(&settings).expect("one valid url");
        assert_eq!(markup.inline_keyboard.len(), 1);
    }

    #[test]
    fn upload_complete_lists_kinds_and_link() {
        let files = vec![
            FileRef::new(FileKind::Photo, "a", None),
            FileRef::new(FileKind::Photo, "b", None),
            FileRef::new(FileKind::Document, "c", None),
        ];
        let text = upload_complete_text("relay_bot", "file_1_2", 3, &tally_kinds(&files));
        assert!(text.contains("Total files: 3"));
        assert!(text.contains("📁 photo: 2"));
        assert!(text.contains("📁 document: 1"));
        assert!(text.contains("https://t.me/relay_bot?start=file_1_2"));
    }

    #[test]
    fn ignored_renders_nothing() {
        let settings = TelegramSettings::default();
        assert!(render_reply(&Reply::Ignored, &ctx(&settings)).is_none());
    }

    #[test]
    fn partial_delivery_is_mentioned() {
        let settings = TelegramSettings::default();
        let report = DeliveryReport {
            delivered: vec![FileRef::new(FileKind::Photo, "a", None)],
            failed: vec![DeliveryFailure {
                file: FileRef::new(FileKind::Video, "b", None),
                reason: "Bad Request".into(),
            }],
        };
        let view = render_reply(&Reply::Delivered { report }, &ctx(&settings)).expect("view");
        assert!(view.text.starts_with(AUTO_DELETE_NOTICE));
        assert!(view.text.contains("1 of 2 files"));

        let view = render_reply(
            &Reply::Delivered {
                report: DeliveryReport::default(),
            },
            &ctx(&settings),
        )
        .expect("view");
        assert_eq!(view.text, AUTO_DELETE_NOTICE);
    }

    #[test]
    fn completion_removes_keyboard() {
        let settings = TelegramSettings::default();
        let view = render_reply(
            &Reply::UploadComplete {
                link_token: "file_1_1".into(),
                total: 1,
                tally: KindTally::new(),
            },
            &ctx(&settings),
        )
        .expect("view");
        assert!(matches!(view.markup, Some(ReplyMarkup::KeyboardRemove(_))));
    }

    #[test]
    fn help_lists_commands() {
        let settings = TelegramSettings::default();
        let view = render_reply(&Reply::Help, &ctx(&settings)).expect("view");
        assert!(view.text.contains("/upload"));
        assert!(view.text.contains("/stats"));
    }
}
