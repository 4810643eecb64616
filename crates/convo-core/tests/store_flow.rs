//! End-to-end flow over the public API: one wallet session carries a user
//! through creating a thread, commenting on it, searching, and cleaning up.

use std::sync::Arc;

use convo_core::search;
use convo_core::testing::{MockApi, MockWallet};
use convo_core::{AuthSession, CommentStore, ConvoError, SessionState, ThreadStore};

const ALICE: &str = "0x9fa1c391e1a7fbb1cde3b9ad05afc6c796e5e3b1";
const PAGE: &str = "https://example.com/article?utm_source=x";
const PAGE_NORM: &str = "https://example.com/article/";

struct Harness {
    api: Arc<MockApi>,
    auth: Arc<AuthSession>,
    threads: ThreadStore,
    comments: CommentStore,
}

fn harness(wallet: MockWallet) -> Harness {
    let api = Arc::new(MockApi::default());
    let auth = Arc::new(AuthSession::new(api.clone(), Arc::new(wallet)));
    Harness {
        api: api.clone(),
        auth: auth.clone(),
        threads: ThreadStore::new(api.clone(), auth.clone()),
        comments: CommentStore::new(api, auth),
    }
}

#[tokio::test]
async fn test_full_session_flow_signs_in_once() {
    let h = harness(MockWallet::connected(ALICE));

    let thread = h.threads.create("First post", Some(PAGE)).await.unwrap();
    assert_eq!(thread.url, PAGE_NORM);
    assert_eq!(h.auth.state(), SessionState::Authenticated);

    let comment = h
        .comments
        .create(&thread.id, &thread.url, "gm everyone")
        .await
        .unwrap();
    assert_eq!(comment.author, ALICE);

    // Both writes rode the same token: one challenge for the whole session.
    assert_eq!(h.api.challenge_requests(), 1);

    let listed = h.comments.list(Some(&thread.id)).await.data.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].text, "gm everyone");

    let found = search::filter(&listed, "GM");
    assert_eq!(found.len(), 1);
    assert!(search::filter(&listed, "gn").is_empty());

    h.comments.delete(&thread.id, &comment.id).await.unwrap();
    h.threads.delete(Some(PAGE), &thread.id).await.unwrap();
    assert!(h
        .threads
        .list_for_url(Some(PAGE))
        .await
        .data
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_dismissed_wallet_never_reaches_backend() {
    let h = harness(MockWallet::disconnected());

    let result = h.threads.create("No wallet", Some(PAGE)).await;
    assert!(matches!(result, Err(ConvoError::AuthDenied)));
    assert_eq!(h.api.thread_creates(), 0);
    assert_eq!(h.api.challenge_requests(), 0);
    assert_eq!(h.auth.state(), SessionState::Disconnected);

    // Reads stay open to everyone.
    let snapshot = h.threads.list_for_url(None).await;
    assert_eq!(snapshot.data, Some(vec![]));
}

#[tokio::test]
async fn test_account_switch_reauthenticates() {
    const BOB: &str = "0x1111111111111111111111111111111111111111";
    let wallet = MockWallet::connected(ALICE);
    let h = harness(wallet.clone());

    let thread = h.threads.create("Mine", Some(PAGE)).await.unwrap();
    assert_eq!(h.api.challenge_requests(), 1);

    wallet.switch_address(BOB);
    h.comments
        .create(&thread.id, &thread.url, "hi from bob")
        .await
        .unwrap();
    // The new address needs its own challenge and token.
    assert_eq!(h.api.challenge_requests(), 2);

    // Bob cannot delete Alice's thread; the guard fires locally.
    let result = h.threads.delete(Some(PAGE), &thread.id).await;
    assert!(matches!(result, Err(ConvoError::Validation(_))));
    assert_eq!(h.api.thread_deletes(), 0);
}
