//! One-shot notices carried across a redirect.

use tower_sessions::Session;

use crate::models::{Notice, session_keys};

/// Queue a notice for the next rendered page, replacing any pending one.
pub async fn push_notice(session: &Session, notice: Notice) {
    if let Err(e) = session.insert(session_keys::NOTICE, notice).await {
        tracing::warn!("Failed to store notice: {e}");
    }
}

/// Take the pending notice, if any.
pub async fn take_notice(session: &Session) -> Option<Notice> {
    session
        .remove::<Notice>(session_keys::NOTICE)
        .await
        .ok()
        .flatten()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_notice_is_shown_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        push_notice(&session, Notice::info("first")).await;
        push_notice(&session, Notice::success("second")).await;

        assert_eq!(take_notice(&session).await, Some(Notice::success("second")));
        assert_eq!(take_notice(&session).await, None);
    }
}
