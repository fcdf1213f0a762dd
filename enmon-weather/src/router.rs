use crate::provider::ReportOutcome;
use crate::registry::SharedProviderRegistry;
use crate::topics::{route, Route};
use log::debug;
use tokio::task::JoinHandle;

/// Outcome of dispatching one inbound publish
#[derive(Debug)]
pub enum Dispatched {
    /// Announcement; `Some` when the plant was registered, carrying the
    /// background task for its first report
    Info(Option<JoinHandle<ReportOutcome>>),
    /// Liveness signal; `true` if the plant was known
    Status(bool),
}

impl Dispatched {
    pub fn route(&self) -> Route {
        match self {
            Dispatched::Info(_) => Route::Info,
            Dispatched::Status(_) => Route::Status,
        }
    }
}

/// Routes an inbound message to the registry.
///
/// Registration happens here, in delivery order. Only the first report of a
/// new registration goes to its own task, so a weather fetch never stalls
/// the MQTT event loop. Unrouted topics return `None`.
pub fn dispatch(registry: &SharedProviderRegistry, topic: &str, payload: &[u8]) -> Option<Dispatched> {
    let Some((kind, site_id)) = route(topic) else {
        debug!("[router] no route for {}", topic);
        return None;
    };

    match kind {
        Route::Info => {
            let report = registry.accept_announcement(site_id, payload).map(|provider| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.first_report(&provider).await })
            });
            Some(Dispatched::Info(report))
        }
        Route::Status => Some(Dispatched::Status(registry.on_liveness_signal(site_id))),
    }
}
