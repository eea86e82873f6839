//! Collaborator contracts consumed by the registry.
//!
//! The registry never owns a transport, a codec, or a discovery client — it
//! calls into these traits and wraps their failures. Implementations return
//! `anyhow::Result`; the registry attaches the offending descriptor/URL when
//! it surfaces an error.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::descriptor::{ConsumerDescriptor, ServerBinding};

/// Lifecycle control for the client invocation runtime and provider listeners.
///
/// Both start operations are idempotent: a running runtime must not be
/// restarted, and an equivalent `ServerBinding` must map onto the already
/// bound listener. `start_listener` returns the *resolved* binding (after
/// auto port selection), which the registry persists back onto the
/// publication record.
#[async_trait]
pub trait TransportLifecycle: Send + Sync {
    async fn start_client_runtime(&self) -> anyhow::Result<()>;
    async fn start_listener(&self, binding: &ServerBinding) -> anyhow::Result<ServerBinding>;
    async fn stop_listener(&self) -> anyhow::Result<()>;
    async fn stop_client_runtime(&self) -> anyhow::Result<()>;
}

/// Builds a callable proxy for a canonicalized consumer descriptor.
///
/// Selected by the descriptor's codec name; the wire protocol behind the
/// proxy is entirely the builder's business.
#[async_trait]
pub trait ProxyBuilder: Send + Sync {
    async fn build_proxy(&self, descriptor: &ConsumerDescriptor) -> anyhow::Result<ProxyHandle>;
}

/// External discovery service: provider announcement and consumer-side
/// provider lookup.
///
/// `discover_providers` is best-effort at every call site in this crate —
/// a failure is logged and swallowed because the proxy stays usable once a
/// provider becomes reachable later.
#[async_trait]
pub trait Discovery: Send + Sync {
    async fn announce(&self, url: &str, binding: &ServerBinding) -> anyhow::Result<()>;
    async fn withdraw(&self, url: &str) -> anyhow::Result<()>;
    async fn discover_providers(
        &self,
        url: &str,
        group: &str,
        vip: Option<&str>,
    ) -> anyhow::Result<()>;
}

/// Completion callback capability for callback-mode invocations.
pub trait ServiceCallback: Send + Sync {
    fn on_success(&self, payload: &[u8]);
    fn on_failure(&self, error: &anyhow::Error);
}

/// Cloneable, type-erased handle to a built proxy.
///
/// The registry caches and hands out these handles without knowing the
/// concrete proxy type; consumers recover it with [`ProxyHandle::downcast`].
/// Clones share the underlying proxy, so [`ProxyHandle::ptr_eq`] tells a
/// cache hit apart from a reconstruction.
#[derive(Clone)]
pub struct ProxyHandle {
    inner: Arc<dyn Any + Send + Sync>,
}

impl ProxyHandle {
    /// Wrap a concrete proxy value.
    pub fn new<T: Send + Sync + 'static>(proxy: T) -> Self {
        Self {
            inner: Arc::new(proxy),
        }
    }

    /// Wrap an already shared proxy.
    #[must_use]
    pub fn from_arc(inner: Arc<dyn Any + Send + Sync>) -> Self {
        Self { inner }
    }

    /// Recover the concrete proxy type, if it matches.
    #[must_use]
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.inner).downcast::<T>().ok()
    }

    /// Whether two handles point at the same underlying proxy.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ProxyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyHandle").finish_non_exhaustive()
    }
}
