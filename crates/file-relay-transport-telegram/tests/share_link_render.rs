use file_relay_core::dispatch::Reply;
use file_relay_core::model::{generate_link_token, tally_kinds, FileKind, FileRef};
use file_relay_transport_telegram::bot::views::{render_reply, ViewContext};
use file_relay_transport_telegram::config::TelegramSettings;
use lazy_regex::regex_captures;

fn photo(id: &str) -> FileRef {
    FileRef::new(FileKind::Photo, id, None)
}

#[test]
fn upload_complete_carries_a_start_link() {
    let settings = TelegramSettings::default();
    let ctx = ViewContext {
        bot_username: "relay_bot",
        settings: &settings,
    };
    let now = chrono::DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp");
    let token = generate_link_token(42, now);
    let files = vec![photo("a"), photo("b")];
    let reply = Reply::UploadComplete {
        link_token: token.clone(),
        total: files.len(),
        tally: tally_kinds(&files),
    };

    let view = render_reply(&reply, &ctx).expect("upload summary is rendered");
    let (_, username, linked_token, ts, owner) = regex_captures!(
        r"https://t\.me/(\w+)\?start=(file_(\d+)_(\d+))",
        &view.text
    )
    .expect("share link present");

    assert_eq!(username, "relay_bot");
    assert_eq!(linked_token, token);
    assert_eq!(ts, "1700000000");
    assert_eq!(owner, "42");
    assert!(view.text.contains("Total files: 2"));
    assert!(view.text.contains("photo: 2"));
}
