//! Test doubles and common utilities for architecture contract tests
//!
//! This module provides minimal test doubles that verify architectural
//! constraints without touching the OS or the network.

#![allow(dead_code)]

use ddns6_core::error::{Error, Result};
use ddns6_core::traits::{
    InterfaceSource, NetworkChange, NetworkChanges, NetworkMonitor, RecordUpdater,
};
use ddns6_core::{DdnsConfig, NetworkInterface, OperationalState, RecordTarget};
use std::net::{IpAddr, Ipv6Addr};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// An InterfaceSource whose snapshot the test can swap between passes
pub struct StaticInterfaces {
    snapshot: Arc<Mutex<Result<Vec<NetworkInterface>>>>,
    call_count: Arc<AtomicUsize>,
}

impl StaticInterfaces {
    pub fn new(interfaces: Vec<NetworkInterface>) -> Self {
        Self {
            snapshot: Arc::new(Mutex::new(Ok(interfaces))),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source whose enumeration always fails
    pub fn failing(message: &str) -> Self {
        let source = Self::new(Vec::new());
        source.fail_with(message);
        source
    }

    /// Replace the snapshot returned by the next enumeration
    pub fn set(&self, interfaces: Vec<NetworkInterface>) {
        *self.snapshot.lock().unwrap() = Ok(interfaces);
    }

    /// Make the next enumeration fail
    pub fn fail_with(&self, message: &str) {
        *self.snapshot.lock().unwrap() = Err(Error::enumeration(message));
    }

    /// Get the number of times interfaces() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Create a new StaticInterfaces that shares state with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            snapshot: Arc::clone(&other.snapshot),
            call_count: Arc::clone(&other.call_count),
        }
    }
}

#[async_trait::async_trait]
impl InterfaceSource for StaticInterfaces {
    async fn interfaces(&self) -> Result<Vec<NetworkInterface>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match &*self.snapshot.lock().unwrap() {
            Ok(interfaces) => Ok(interfaces.clone()),
            Err(e) => Err(Error::enumeration(e.to_string())),
        }
    }
}

/// A NetworkMonitor the test drives by hand
pub struct ControlledMonitor {
    /// Receiver handed out on the first subscribe()
    rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<NetworkChange>>>>,
    /// Call counter for subscribe()
    subscribe_count: Arc<AtomicUsize>,
    /// Set when the subscription guard is dropped
    unsubscribed: Arc<AtomicBool>,
    /// Make subscribe() fail
    fail: bool,
}

impl ControlledMonitor {
    /// Create a new monitor and the sender used to fire notifications
    pub fn new() -> (Self, mpsc::UnboundedSender<NetworkChange>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let monitor = Self {
            rx: Arc::new(Mutex::new(Some(rx))),
            subscribe_count: Arc::new(AtomicUsize::new(0)),
            unsubscribed: Arc::new(AtomicBool::new(false)),
            fail: false,
        };
        (monitor, tx)
    }

    /// A monitor whose subscription always fails
    pub fn failing() -> Self {
        let (mut monitor, _tx) = Self::new();
        monitor.fail = true;
        monitor
    }

    pub fn subscribe_count(&self) -> usize {
        self.subscribe_count.load(Ordering::SeqCst)
    }

    pub fn unsubscribed(&self) -> bool {
        self.unsubscribed.load(Ordering::SeqCst)
    }

    /// Create a new ControlledMonitor that shares state with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            rx: Arc::clone(&other.rx),
            subscribe_count: Arc::clone(&other.subscribe_count),
            unsubscribed: Arc::clone(&other.unsubscribed),
            fail: other.fail,
        }
    }
}

#[async_trait::async_trait]
impl NetworkMonitor for ControlledMonitor {
    async fn subscribe(&self) -> Result<NetworkChanges> {
        self.subscribe_count.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::subscription("netlink socket unavailable"));
        }

        let rx = self
            .rx
            .lock()
            .unwrap()
            .take()
            .expect("subscribe() can only be called once");

        let unsubscribed = Arc::clone(&self.unsubscribed);
        Ok(
            NetworkChanges::new(tokio_stream::wrappers::UnboundedReceiverStream::new(rx))
                .on_drop(move || unsubscribed.store(true, Ordering::SeqCst)),
        )
    }
}

/// A mock RecordUpdater that records calls and fails on chosen record ids
pub struct MockUpdater {
    /// (record_id, address) for every update_record() call, in order
    calls: Arc<Mutex<Vec<(String, Ipv6Addr)>>>,
    /// Record ids that fail with a provider rejection
    failing: Arc<Mutex<Vec<String>>>,
    /// Record ids whose request never gets an answer
    unreachable: Arc<Mutex<Vec<String>>>,
}

impl MockUpdater {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(Mutex::new(Vec::new())),
            unreachable: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make updates to `record_id` fail with HTTP 400
    pub fn fail_record(&self, record_id: &str) {
        self.failing.lock().unwrap().push(record_id.to_string());
    }

    /// Make updates to `record_id` fail as if the request timed out
    pub fn fail_transport(&self, record_id: &str) {
        self.unreachable.lock().unwrap().push(record_id.to_string());
    }

    /// Get the number of times update_record() was called
    pub fn update_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Every call so far
    pub fn calls(&self) -> Vec<(String, Ipv6Addr)> {
        self.calls.lock().unwrap().clone()
    }

    /// Create a new MockUpdater that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            calls: Arc::clone(&other.calls),
            failing: Arc::clone(&other.failing),
            unreachable: Arc::clone(&other.unreachable),
        }
    }
}

#[async_trait::async_trait]
impl RecordUpdater for MockUpdater {
    async fn update_record(&self, target: &RecordTarget, address: Ipv6Addr) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((target.record_id.clone(), address));

        if self.unreachable.lock().unwrap().contains(&target.record_id) {
            return Err(Error::http("operation timed out"));
        }
        if self.failing.lock().unwrap().contains(&target.record_id) {
            return Err(Error::provider(400, r#"{"error":"invalid"}"#));
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

pub fn v6(s: &str) -> Ipv6Addr {
    s.parse().expect("valid IPv6 literal")
}

/// An up interface carrying the given addresses
pub fn up_interface(index: u32, name: &str, addresses: &[&str]) -> NetworkInterface {
    addresses.iter().fold(
        NetworkInterface::new(index, name, OperationalState::Up),
        |iface, a| iface.with_address(a.parse::<IpAddr>().expect("valid IP literal")),
    )
}

/// A host with one public address on eth0
pub fn public_host(address: &str) -> Vec<NetworkInterface> {
    vec![
        NetworkInterface::new(1, "lo", OperationalState::Unknown).with_address(v6("::1")),
        up_interface(2, "eth0", &["fe80::1", address]),
    ]
}

/// Targets `z1/r1` .. `z1/rN`
pub fn targets(n: usize) -> Vec<RecordTarget> {
    (1..=n)
        .map(|i| RecordTarget::new("z1", format!("r{i}")))
        .collect()
}

/// Helper to create a minimal DdnsConfig for testing
pub fn minimal_config(targets: Vec<RecordTarget>) -> DdnsConfig {
    let mut config = DdnsConfig::new("ops@example.com", "test-api-key", targets);
    config.engine.event_channel_capacity = 100;
    config
}

/// Wait for the event that ends the current pass
///
/// Panics if no pass ends within two seconds.
pub async fn wait_for_pass_end(
    event_rx: &mut tokio::sync::mpsc::Receiver<ddns6_core::EngineEvent>,
) -> ddns6_core::EngineEvent {
    use ddns6_core::EngineEvent;

    let wait = async {
        while let Some(event) = event_rx.recv().await {
            if matches!(
                event,
                EngineEvent::PassCompleted { .. }
                    | EngineEvent::NoAddress
                    | EngineEvent::SelectionFailed { .. }
            ) {
                return event;
            }
        }
        panic!("event channel closed before the pass ended");
    };

    tokio::time::timeout(std::time::Duration::from_secs(2), wait)
        .await
        .expect("pass ended within timeout")
}
