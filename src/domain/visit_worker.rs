//! Background visit recording worker.
//!
//! Consumes queued [`VisitEvent`]s and records them through the resolver.
//! Handlers never wait on this path: a full queue drops events, a failed
//! record is logged and forgotten, and the worker exits when the last sender
//! is dropped during shutdown.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::application::services::LinkResolver;
use crate::domain::visit_event::VisitEvent;

pub async fn run_visit_worker(mut rx: mpsc::Receiver<VisitEvent>, resolver: Arc<LinkResolver>) {
    while let Some(event) = rx.recv().await {
        match event {
            VisitEvent::Link {
                path,
                meta,
                visited_at,
            } => match resolver.resolve(&path).await {
                Ok(link) => resolver.record_visit(&link, visited_at, &meta).await,
                Err(e) => debug!(path, "dropping visit for unresolvable link: {e:?}"),
            },
            VisitEvent::AdHoc {
                target_url,
                meta,
                visited_at,
            } => {
                resolver
                    .record_ad_hoc_visit(&target_url, visited_at, &meta)
                    .await;
            }
        }
    }

    debug!("visit worker stopped");
}
