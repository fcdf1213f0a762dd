use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// Broker connection state, written by the MQTT listener and read by the scheduler
#[derive(Clone, Default)]
pub struct LinkStatus {
    connected: Arc<AtomicBool>,
    reconnects: Arc<AtomicU32>,
}

impl LinkStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_connected(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }

    pub fn mark_disconnected(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Connection lost; the event loop will dial again on its next poll
    pub fn increment_reconnects(&self) -> u32 {
        self.mark_disconnected();
        self.reconnects.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn reconnects(&self) -> u32 {
        self.reconnects.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkStatus")
            .field("connected", &self.is_connected())
            .field("reconnects", &self.reconnects())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disconnected_and_counts_reconnects() {
        let link = LinkStatus::new();
        assert!(!link.is_connected());

        let shared = link.clone();
        shared.mark_connected();
        assert!(link.is_connected());

        assert_eq!(link.increment_reconnects(), 1);
        assert!(!shared.is_connected());
        assert_eq!(shared.reconnects(), 1);
    }
}
