//! Topic names and the inbound dispatch table
//!
//! Every plant talks on `enmon/{id}/{kind}`. Inbound messages are matched
//! against [`ROUTES`] and routed with the plant id taken from the second level.

pub const INFO_PATTERN: &str = "enmon/+/info";
pub const STATUS_PATTERN: &str = "enmon/+/status";

/// Kind of inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Plant announcement carrying its location
    Info,
    /// Liveness signal
    Status,
}

/// Subscription pattern -> route
pub const ROUTES: &[(&str, Route)] = &[(INFO_PATTERN, Route::Info), (STATUS_PATTERN, Route::Status)];

pub fn weather_topic(site_id: &str) -> String {
    format!("enmon/{}/weather", site_id)
}

/// MQTT filter matching with `+` and `#` wildcards
pub fn matches(pattern: &str, topic: &str) -> bool {
    let mut topic_levels = topic.split('/');
    for level in pattern.split('/') {
        match level {
            "#" => return true,
            "+" => {
                if topic_levels.next().is_none() {
                    return false;
                }
            }
            literal => {
                if topic_levels.next() != Some(literal) {
                    return false;
                }
            }
        }
    }
    topic_levels.next().is_none()
}

/// Finds the route for `topic` and extracts the plant id
///
/// Ex: "enmon/p1/status" -> (Route::Status, "p1")
pub fn route(topic: &str) -> Option<(Route, &str)> {
    let (_, route) = ROUTES.iter().find(|(pattern, _)| matches(pattern, topic))?;
    let site_id = topic.split('/').nth(1).filter(|id| !id.is_empty())?;
    Some((*route, site_id))
}
