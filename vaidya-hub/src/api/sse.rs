//! Server-Sent Events for notices and domain events

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use vaidya_common::events::VaidyaEvent;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct EventQuery {
    /// Only deliver notices addressed to this profile (or to everyone)
    pub profile: Option<String>,
}

fn is_visible(event: &VaidyaEvent, profile: Option<&str>) -> bool {
    match (event, profile) {
        (VaidyaEvent::Notice { profile_id: Some(target), .. }, Some(profile)) => target == profile,
        (VaidyaEvent::Notice { profile_id: Some(_), .. }, None) => false,
        _ => true,
    }
}

/// GET /events - SSE event stream
pub async fn event_stream(
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(profile = ?query.profile, "New SSE client connected");

    let mut rx = state.event_bus.subscribe();
    let profile = query.profile;

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if !is_visible(&event, profile.as_deref()) {
                        continue;
                    }
                    let event_type = event.event_type().to_string();
                    match serde_json::to_string(&event) {
                        Ok(event_json) => {
                            debug!("SSE: Broadcasting event: {}", event_type);
                            yield Ok(Event::default().event(event_type).data(event_json));
                        }
                        Err(e) => {
                            warn!("SSE: Failed to serialize event {}: {}", event_type, e);
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "SSE: Client lagging, events dropped");
                }
                Err(RecvError::Closed) => {
                    debug!("SSE: Event bus closed");
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
