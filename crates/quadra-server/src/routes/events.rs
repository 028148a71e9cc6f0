use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use quadra_core::invitation::Invitation;
use quadra_core::watch::watch_pending;
use std::convert::Infallible;
use tokio::sync::mpsc;
use tokio_stream::wrappers::{BroadcastStream, UnboundedReceiverStream};
use tokio_stream::StreamExt as _;

use crate::error::AppError;
use crate::routes::invitations::PendingQuery;
use crate::state::AppState;

/// GET /api/events: SSE stream with one `change` event per committed change.
pub async fn sse_events(State(app): State<AppState>) -> impl IntoResponse {
    let rx = app.store.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| {
        let change = msg.ok()?;
        let data = serde_json::to_string(&change).ok()?;
        Some(Ok::<Event, Infallible>(
            Event::default().event("change").data(data),
        ))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// GET /api/invitations/live?email=: SSE stream of `pending` events, each
/// carrying the full pending set for the email. The first event is sent on
/// connect; the live query is torn down when the client disconnects.
pub async fn sse_pending(
    State(app): State<AppState>,
    Query(query): Query<PendingQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (tx, rx) = mpsc::unbounded_channel::<Vec<Invitation>>();
    let subscription = watch_pending(app.store.clone(), &query.email, move |pending| {
        let _ = tx.send(pending);
    })?;

    let stream = UnboundedReceiverStream::new(rx).filter_map(move |pending| {
        // The stream owns the subscription; dropping the stream cancels it.
        let _live = &subscription;
        let data = serde_json::to_string(&pending).ok()?;
        Some(Ok::<Event, Infallible>(
            Event::default().event("pending").data(data),
        ))
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
