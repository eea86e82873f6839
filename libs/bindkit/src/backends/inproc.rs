//! In-process backend.
//!
//! Implements the transport, discovery and proxy-builder contracts entirely
//! in memory: listeners are table entries, announcements are table entries,
//! proxies are plain values capturing the descriptor identity. Used for
//! embedded deployments and as the test double for the registry itself —
//! the state it tracks (start counts, listener table, announcement table)
//! is exactly what the lifecycle contracts promise.

use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};

use anyhow::bail;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::contracts::{Discovery, ProxyBuilder, ProxyHandle, TransportLifecycle};
use crate::descriptor::{ConsumerDescriptor, ServerBinding};

/// First port handed out when a binding asks for auto port selection.
const DEFAULT_AUTO_PORT_BASE: u16 = 14_040;

/// In-memory transport lifecycle.
///
/// The client runtime is a flag, listeners are records keyed by their
/// resolved port. Equivalent bindings reuse the existing listener record,
/// so repeated `start_listener` calls are observably idempotent.
pub struct InProcTransport {
    client_running: AtomicBool,
    client_starts: AtomicUsize,
    listeners: DashMap<u16, ServerBinding>,
    next_auto_port: AtomicU16,
}

impl InProcTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::with_auto_port_base(DEFAULT_AUTO_PORT_BASE)
    }

    #[must_use]
    pub fn with_auto_port_base(base: u16) -> Self {
        Self {
            client_running: AtomicBool::new(false),
            client_starts: AtomicUsize::new(0),
            listeners: DashMap::new(),
            next_auto_port: AtomicU16::new(base),
        }
    }

    /// How many times the client runtime actually started (not how many
    /// times a start was requested).
    #[must_use]
    pub fn client_starts(&self) -> usize {
        self.client_starts.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn client_running(&self) -> bool {
        self.client_running.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn listener(&self, port: u16) -> Option<ServerBinding> {
        self.listeners.get(&port).map(|entry| entry.clone())
    }
}

impl Default for InProcTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransportLifecycle for InProcTransport {
    async fn start_client_runtime(&self) -> anyhow::Result<()> {
        if !self.client_running.swap(true, Ordering::SeqCst) {
            self.client_starts.fetch_add(1, Ordering::SeqCst);
            tracing::debug!("client invocation runtime started");
        }
        Ok(())
    }

    async fn start_listener(&self, binding: &ServerBinding) -> anyhow::Result<ServerBinding> {
        if binding.auto_select_port {
            let port = self.next_auto_port.fetch_add(1, Ordering::SeqCst);
            let resolved = ServerBinding {
                port,
                auto_select_port: false,
                ..binding.clone()
            };
            self.listeners.insert(port, resolved.clone());
            tracing::debug!(port = port, "listener started on auto-selected port");
            return Ok(resolved);
        }

        if let Some(existing) = self.listeners.get(&binding.port) {
            return Ok(existing.clone());
        }
        self.listeners.insert(binding.port, binding.clone());
        tracing::debug!(port = binding.port, "listener started");
        Ok(binding.clone())
    }

    async fn stop_listener(&self) -> anyhow::Result<()> {
        let stopped = self.listeners.len();
        self.listeners.clear();
        if stopped > 0 {
            tracing::debug!(count = stopped, "listeners stopped");
        }
        Ok(())
    }

    async fn stop_client_runtime(&self) -> anyhow::Result<()> {
        self.client_running.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory discovery service.
///
/// `discover_providers` fails for URLs nobody announced, which is the
/// natural way to exercise the registry's best-effort swallow path.
#[derive(Default)]
pub struct InProcDiscovery {
    announced: DashMap<String, ServerBinding>,
    announcements: AtomicUsize,
    last_query: Mutex<Option<ProviderQuery>>,
}

/// The most recent `discover_providers` call, for assertions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderQuery {
    pub url: String,
    pub group: String,
    pub vip: Option<String>,
}

impl InProcDiscovery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_announced(&self, url: &str) -> bool {
        self.announced.contains_key(url)
    }

    #[must_use]
    pub fn announced_binding(&self, url: &str) -> Option<ServerBinding> {
        self.announced.get(url).map(|entry| entry.clone())
    }

    /// Total announce calls, withdrawn or not.
    #[must_use]
    pub fn announcement_count(&self) -> usize {
        self.announcements.load(Ordering::SeqCst)
    }

    /// The most recent provider query, if any.
    #[must_use]
    pub fn last_query(&self) -> Option<ProviderQuery> {
        self.last_query.lock().clone()
    }
}

#[async_trait]
impl Discovery for InProcDiscovery {
    async fn announce(&self, url: &str, binding: &ServerBinding) -> anyhow::Result<()> {
        self.announcements.fetch_add(1, Ordering::SeqCst);
        self.announced.insert(url.to_owned(), binding.clone());
        tracing::debug!(url = %url, port = binding.port, "provider announced");
        Ok(())
    }

    async fn withdraw(&self, url: &str) -> anyhow::Result<()> {
        self.announced.remove(url);
        tracing::debug!(url = %url, "provider withdrawn");
        Ok(())
    }

    async fn discover_providers(
        &self,
        url: &str,
        group: &str,
        vip: Option<&str>,
    ) -> anyhow::Result<()> {
        *self.last_query.lock() = Some(ProviderQuery {
            url: url.to_owned(),
            group: group.to_owned(),
            vip: vip.map(str::to_owned),
        });
        if self.announced.contains_key(url) {
            Ok(())
        } else {
            bail!("no providers announced for {url}")
        }
    }
}

/// Proxy minted by the in-process builder: the resolved binding identity,
/// nothing more.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InProcProxy {
    pub interface: String,
    pub url: String,
    pub group: String,
    pub version: String,
    pub codec: String,
}

/// Builds [`InProcProxy`] handles and counts constructions.
#[derive(Default)]
pub struct InProcProxyBuilder {
    built: AtomicUsize,
}

impl InProcProxyBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn build_count(&self) -> usize {
        self.built.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProxyBuilder for InProcProxyBuilder {
    async fn build_proxy(&self, descriptor: &ConsumerDescriptor) -> anyhow::Result<ProxyHandle> {
        self.built.fetch_add(1, Ordering::SeqCst);
        Ok(ProxyHandle::new(InProcProxy {
            interface: descriptor.interface.clone(),
            url: descriptor.url.clone(),
            group: descriptor.group.clone(),
            version: descriptor.version.clone(),
            codec: descriptor.codec.clone(),
        }))
    }
}
