//! Process-wide buses: one default and one per channel key.
//!
//! Channel buses are created on first lookup and live for the rest of the
//! process. Buses on different keys share nothing but the process-wide
//! executor and UI thread.

use crate::{bus::EventBus, config::BusConfig};
use dashmap::DashMap;
use std::sync::{Arc, LazyLock};
use tracing::debug;

const DEFAULT_NAME: &str = "default";

static DEFAULT: LazyLock<Arc<EventBus>> =
    LazyLock::new(|| Arc::new(EventBus::with_config(BusConfig::new().with_name(DEFAULT_NAME))));

static CHANNELS: LazyLock<DashMap<String, Arc<EventBus>>> = LazyLock::new(DashMap::new);

impl EventBus {
    /// The process-wide default bus.
    pub fn get_default() -> Arc<EventBus> {
        Arc::clone(&DEFAULT)
    }

    /// The bus for `channel`, created on first use. The empty key is the
    /// default bus.
    pub fn get(channel: &str) -> Arc<EventBus> {
        if channel.is_empty() {
            return Self::get_default();
        }
        if let Some(bus) = CHANNELS.get(channel) {
            return Arc::clone(bus.value());
        }
        let bus = CHANNELS.entry(channel.to_string()).or_insert_with(|| {
            debug!(channel, "creating channel bus");
            Arc::new(EventBus::with_config(BusConfig::new().with_name(channel)))
        });
        Arc::clone(bus.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn empty_key_is_the_default_bus() {
        assert!(Arc::ptr_eq(&EventBus::get(""), &EventBus::get_default()));
        assert_eq!(EventBus::get_default().name(), DEFAULT_NAME);
    }

    #[test]
    fn concurrent_lookups_share_one_bus() {
        let handles: Vec<_> = (0..8)
            .map(|_| thread::spawn(|| EventBus::get("channel-unit-race")))
            .collect();
        let buses: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();
        assert!(buses.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
        assert_eq!(buses[0].name(), "channel-unit-race");
    }
}
