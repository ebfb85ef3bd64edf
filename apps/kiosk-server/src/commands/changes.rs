//! # Change Stream
//!
//! Server-sent events carrying every table change, so the dashboard can
//! refetch what changed instead of polling.
//!
//! ```text
//! event: change
//! data: {"table":"orders","op":"insert","id":"5c0e..."}
//!
//! event: resync
//! data: 12            <- subscriber fell behind by 12 changes; refetch all
//! ```

use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::debug;

use crate::auth::AdminSession;
use crate::state::DbState;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

pub async fn change_stream(
    admin: AdminSession,
    State(db): State<DbState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let rx = db.inner().changes().subscribe();
    debug!(admin = %admin.0.email, "Change stream opened");

    let stream = BroadcastStream::new(rx).map(|item| match item {
        Ok(change) => Event::default().event("change").json_data(&change),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            Ok(Event::default().event("resync").data(skipped.to_string()))
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use axum::http::{header, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_stream_emits_table_changes() {
        let (app, state) = test_app().await;
        let token = admin_token(&state).await;

        let response = app
            .clone()
            .oneshot(with_token(get("/api/admin/changes"), &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );

        state.db.inner().products().set_stock("11", 8).await.unwrap();

        let mut body = response.into_body();
        let frame = body.frame().await.unwrap().unwrap();
        let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();

        assert!(text.contains("event: change"));
        assert!(text.contains(r#""table":"products""#));
        assert!(text.contains(r#""id":"11""#));
    }

    #[tokio::test]
    async fn test_stream_requires_admin() {
        let (app, _) = test_app().await;
        let (status, _) = send(&app, get("/api/admin/changes")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
