//! Blocking wait for working name resolution before startup.

use std::io;
use std::net::ToSocketAddrs;
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

const NETWORK_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::network");

/// Host probed by default.
pub const DEFAULT_PROBE_HOST: &str = "www.google.com";

/// Delay between failed probes.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);

/// Name resolution seam.
#[cfg_attr(test, mockall::automock)]
pub trait Resolver {
    /// Resolves `host` and returns how many addresses were found.
    fn resolve(&self, host: &str) -> io::Result<usize>;
}

/// Resolver backed by the system's `getaddrinfo`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
    fn resolve(&self, host: &str) -> io::Result<usize> {
        (host, 0).to_socket_addrs().map(Iterator::count)
    }
}

/// Retries resolution until the network answers.
#[derive(Debug)]
pub struct NetworkGate<R> {
    resolver: R,
    host: String,
    backoff: Duration,
}

impl<R: Resolver> NetworkGate<R> {
    /// Builds a gate probing [`DEFAULT_PROBE_HOST`] every [`DEFAULT_BACKOFF`].
    #[must_use]
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            host: DEFAULT_PROBE_HOST.to_owned(),
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Overrides the probed host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Overrides the delay between attempts.
    #[must_use]
    pub const fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Blocks until the host resolves to at least one address.
    ///
    /// There is no retry bound. Returns the number of attempts made.
    pub fn wait_until_ready(&self) -> u32 {
        let mut attempt: u32 = 1;
        loop {
            match self.resolver.resolve(&self.host) {
                Ok(count) if count > 0 => {
                    info!(
                        target: NETWORK_TARGET,
                        host = %self.host,
                        attempt,
                        "network is up"
                    );
                    return attempt;
                }
                Ok(_) => debug!(
                    target: NETWORK_TARGET,
                    host = %self.host,
                    attempt,
                    "resolution returned no addresses"
                ),
                Err(error) => debug!(
                    target: NETWORK_TARGET,
                    host = %self.host,
                    attempt,
                    %error,
                    "resolution failed"
                ),
            }
            thread::sleep(self.backoff);
            attempt = attempt.saturating_add(1);
        }
    }
}
