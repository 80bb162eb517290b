use file_relay_core::dispatch::{FileRelay, InboundEvent, Reply};
use file_relay_core::model::{FileKind, FileRef};
use file_relay_core::resolver::{LinkResolver, ResolveError};
use file_relay_core::session::SessionController;
use file_relay_core::storage::{InMemoryLinkStore, LinkStore};
use file_relay_core::transport::MediaTransport;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

const ADMIN: i64 = 1001;
const VIEWER: i64 = 2002;

/// Records every send instead of talking to a platform.
#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<(i64, FileRef)>>,
}

#[async_trait::async_trait]
impl MediaTransport for RecordingTransport {
    async fn send_media(&self, user_id: i64, file: &FileRef) -> anyhow::Result<()> {
        self.sent.lock().await.push((user_id, file.clone()));
        Ok(())
    }
}

fn file(kind: FileKind, handle: &str) -> FileRef {
    FileRef::new(kind, handle, None)
}

#[tokio::test]
async fn append_before_start_is_noop() {
    let controller = SessionController::new(Arc::new(InMemoryLinkStore::new()));
    for owner in [1, 2, 3] {
        assert!(controller
            .append_file(owner, file(FileKind::Photo, "p"))
            .await
            .is_none());
    }
    assert_eq!(controller.active_sessions().await, 0);
}

#[tokio::test]
async fn restart_discards_previous_files() {
    let store = Arc::new(InMemoryLinkStore::new());
    let controller = SessionController::new(store.clone());

    controller.start_upload(ADMIN).await;
    controller
        .append_file(ADMIN, file(FileKind::Photo, "a"))
        .await
        .expect("session open");
    let token = controller.start_upload(ADMIN).await;
    let outcome = controller.finish_upload(ADMIN).await.expect("session open");

    assert_eq!(outcome.link_token, token);
    assert_eq!(outcome.total, 0);
    assert!(!outcome.committed());
    assert_eq!(store.count_links().await.expect("count"), 0);
}

#[tokio::test]
async fn tally_matches_kinds() {
    let controller = SessionController::new(Arc::new(InMemoryLinkStore::new()));
    controller.start_upload(ADMIN).await;
    for (kind, handle) in [
        (FileKind::Photo, "p1"),
        (FileKind::Document, "d1"),
        (FileKind::Photo, "p2"),
        (FileKind::Document, "d2"),
        (FileKind::Photo, "p3"),
    ] {
        controller.append_file(ADMIN, file(kind, handle)).await;
    }

    let outcome = controller.finish_upload(ADMIN).await.expect("committed");
    assert_eq!(outcome.total, 5);
    assert_eq!(outcome.tally.len(), 2);
    assert_eq!(outcome.tally[&FileKind::Photo], 3);
    assert_eq!(outcome.tally[&FileKind::Document], 2);
}

#[tokio::test]
async fn empty_session_token_never_resolves() {
    let store = Arc::new(InMemoryLinkStore::new());
    let controller = SessionController::new(store.clone());
    let resolver = LinkResolver::new(store);

    let token = controller.start_upload(ADMIN).await;
    controller.finish_upload(ADMIN).await.expect("session open");

    assert!(!controller.has_session(ADMIN).await);
    assert!(matches!(
        resolver.resolve(&token).await,
        Err(ResolveError::NotFound(_))
    ));
}

#[tokio::test]
async fn unknown_token_touches_no_counter() {
    let store = Arc::new(InMemoryLinkStore::new());
    let controller = SessionController::new(store.clone());
    let resolver = LinkResolver::new(store.clone());

    controller.start_upload(ADMIN).await;
    controller
        .append_file(ADMIN, file(FileKind::Video, "v"))
        .await;
    let outcome = controller.finish_upload(ADMIN).await.expect("committed");

    assert!(matches!(
        resolver.resolve("file_0_0").await,
        Err(ResolveError::NotFound(_))
    ));
    assert_eq!(store.access_count(&outcome.link_token).await, Some(0));
    assert_eq!(store.access_count("file_0_0").await, None);
}

#[tokio::test]
async fn each_resolve_counts_once_and_keeps_order() {
    let store = Arc::new(InMemoryLinkStore::new());
    let controller = SessionController::new(store.clone());
    let resolver = LinkResolver::new(store.clone());

    controller.start_upload(ADMIN).await;
    let handles = ["a", "b", "c", "d"];
    let kinds = [
        FileKind::Audio,
        FileKind::Sticker,
        FileKind::Voice,
        FileKind::Animation,
    ];
    for (kind, handle) in kinds.into_iter().zip(handles) {
        controller.append_file(ADMIN, file(kind, handle)).await;
    }
    let token = controller
        .finish_upload(ADMIN)
        .await
        .expect("committed")
        .link_token;

    for n in 1..=5 {
        let files = resolver.resolve(&token).await.expect("resolved");
        let got: Vec<&str> = files.iter().map(FileRef::handle).collect();
        assert_eq!(got, handles);
        assert_eq!(store.access_count(&token).await, Some(n));
    }
}

#[tokio::test]
async fn admin_upload_then_user_opens_link() {
    let store = Arc::new(InMemoryLinkStore::new());
    let relay = FileRelay::new(store.clone(), HashSet::from([ADMIN]));
    let transport = RecordingTransport::default();

    let started = relay
        .handle(&transport, ADMIN, InboundEvent::UploadTrigger)
        .await
        .expect("started");
    assert!(matches!(started, Reply::UploadStarted));

    for handle in ["photo-1", "photo-2"] {
        let reply = relay
            .handle(
                &transport,
                ADMIN,
                InboundEvent::Media(FileRef::new(FileKind::Photo, handle, Some("cap".into()))),
            )
            .await
            .expect("appended");
        assert!(matches!(reply, Reply::Progress { .. }));
    }

    let finished = relay
        .handle(&transport, ADMIN, InboundEvent::FinishTrigger)
        .await
        .expect("finished");
    let Reply::UploadComplete {
        link_token,
        total,
        tally,
    } = finished
    else {
        panic!("expected a committed upload, got {finished:?}");
    };
    assert_eq!(total, 2);
    assert_eq!(tally[&FileKind::Photo], 2);

    let opened = relay
        .handle(
            &transport,
            VIEWER,
            InboundEvent::Start {
                payload: Some(link_token.clone()),
            },
        )
        .await
        .expect("opened");
    let Reply::Delivered { report } = opened else {
        panic!("expected delivery, got {opened:?}");
    };
    assert!(report.is_complete());

    let sent = transport.sent.lock().await;
    assert_eq!(sent.len(), 2);
    assert!(sent
        .iter()
        .all(|(user, f)| *user == VIEWER && f.kind() == FileKind::Photo));
    assert_eq!(sent[0].1.handle(), "photo-1");
    assert_eq!(sent[1].1.handle(), "photo-2");
    assert_eq!(store.access_count(&link_token).await, Some(1));
}

#[tokio::test]
async fn stats_cover_all_links() {
    let store = Arc::new(InMemoryLinkStore::new());
    let relay = FileRelay::new(store.clone(), HashSet::from([ADMIN, ADMIN + 1]));
    let transport = RecordingTransport::default();

    let mut tokens = Vec::new();
    for admin in [ADMIN, ADMIN + 1] {
        relay.handle(&transport, admin, InboundEvent::UploadTrigger).await.expect("started");
        relay
            .handle(&transport, admin, InboundEvent::Media(file(FileKind::Document, "d")))
            .await
            .expect("appended");
        if let Ok(Reply::UploadComplete { link_token, .. }) =
            relay.handle(&transport, admin, InboundEvent::FinishTrigger).await
        {
            tokens.push(link_token);
        }
    }
    assert_eq!(tokens.len(), 2);

    for _ in 0..3 {
        relay
            .handle(&transport, VIEWER, InboundEvent::Start { payload: Some(tokens[0].clone()) })
            .await
            .expect("opened");
    }

    let reply = relay
        .handle(&transport, ADMIN, InboundEvent::Stats)
        .await
        .expect("stats");
    let Reply::Stats(stats) = reply else {
        panic!("expected stats, got {reply:?}");
    };
    assert_eq!(stats.total_links, 2);
    assert_eq!(stats.total_accesses, 3);
}
