//! Tor control-port client
//!
//! The catalog blocks aggressive clients by IP. All traffic leaves through a
//! local Tor SOCKS proxy, and when the site starts refusing requests the
//! fetcher asks this module for a fresh circuit (a NEWNYM signal on the
//! control port) so the next attempt arrives from a different exit node.

mod controller;

pub use controller::{TorController, TorError};

use std::future::Future;

/// Capability to swap the network egress identity.
///
/// The production implementation is [`TorController`]; tests substitute
/// counting or failing rotators to observe the fetcher's recovery protocol.
pub trait Rotate {
    /// Requests a new identity and waits until it is safe to reuse the
    /// network path. An error means the rotation mechanism itself is
    /// unusable and the run cannot recover from blocking.
    fn rotate(&self) -> impl Future<Output = Result<(), TorError>> + Send;
}
