//! Service descriptors: the value objects the registry keys everything by.
//!
//! A [`ConsumerDescriptor`] fully specifies an intended client-side binding
//! and doubles as the proxy-cache key — two descriptors are equal iff every
//! field compares equal by value. A [`ProviderDescriptor`] pairs an interface
//! identity with a shared implementation handle and the [`ServerBinding`]
//! its listener should use.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use crate::canonical::{self, DEFAULT_PROTOCOL};
use crate::contracts::ServiceCallback;

/// Default provider listener port.
pub const DEFAULT_PORT: u16 = 4040;

/// Default invocation timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Default serialization codec name.
pub const DEFAULT_CODEC: &str = "json";

/// Default load-balance strategy name.
pub const DEFAULT_LOAD_BALANCE: &str = "random";

/// Default cluster/fault-tolerance strategy name.
pub const DEFAULT_CLUSTER: &str = "failfast";

/// Default service version.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// How an invocation through the proxy completes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CallMode {
    /// Block the caller until the response arrives.
    #[default]
    Sync,
    /// Return immediately; completion is delivered to a [`ServiceCallback`].
    Callback,
    /// Fire and forget.
    Oneway,
}

/// A completion callback bound to a consumer descriptor.
///
/// Compares and hashes by the registered type name only — the instance is an
/// opaque capability, and descriptors differing only in callback *instance*
/// still collide in the proxy cache.
#[derive(Clone)]
pub struct CallbackBinding {
    type_name: String,
    instance: Arc<dyn ServiceCallback>,
}

impl CallbackBinding {
    pub fn new(type_name: impl Into<String>, instance: Arc<dyn ServiceCallback>) -> Self {
        Self {
            type_name: type_name.into(),
            instance,
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn instance(&self) -> &Arc<dyn ServiceCallback> {
        &self.instance
    }
}

impl fmt::Debug for CallbackBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name)
    }
}

impl PartialEq for CallbackBinding {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name
    }
}

impl Eq for CallbackBinding {}

impl Hash for CallbackBinding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_name.hash(state);
    }
}

/// Client-side binding specification; immutable once used as a cache key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConsumerDescriptor {
    /// Fully-qualified interface type name.
    pub interface: String,
    /// Service URL; canonicalized before any lookup.
    pub url: String,
    pub protocol: String,
    pub group: String,
    pub version: String,
    pub timeout: Duration,
    /// Serialization codec name; selects the proxy builder.
    pub codec: String,
    pub load_balance: String,
    pub cluster: String,
    pub retries: u32,
    pub timeout_retry: bool,
    /// Target-instance override: route to this provider address only.
    pub vip: Option<String>,
    pub call_mode: CallMode,
    pub callback: Option<CallbackBinding>,
}

impl ConsumerDescriptor {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            url: String::new(),
            protocol: DEFAULT_PROTOCOL.to_owned(),
            group: String::new(),
            version: DEFAULT_VERSION.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            codec: DEFAULT_CODEC.to_owned(),
            load_balance: DEFAULT_LOAD_BALANCE.to_owned(),
            cluster: DEFAULT_CLUSTER.to_owned(),
            retries: 1,
            timeout_retry: false,
            vip: None,
            call_mode: CallMode::Sync,
            callback: None,
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    #[must_use]
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = codec.into();
        self
    }

    #[must_use]
    pub fn with_load_balance(mut self, strategy: impl Into<String>) -> Self {
        self.load_balance = strategy.into();
        self
    }

    #[must_use]
    pub fn with_cluster(mut self, strategy: impl Into<String>) -> Self {
        self.cluster = strategy.into();
        self
    }

    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    #[must_use]
    pub fn with_timeout_retry(mut self, retry: bool) -> Self {
        self.timeout_retry = retry;
        self
    }

    #[must_use]
    pub fn with_vip(mut self, vip: impl Into<String>) -> Self {
        self.vip = Some(vip.into());
        self
    }

    #[must_use]
    pub fn with_call_mode(mut self, mode: CallMode) -> Self {
        self.call_mode = mode;
        self
    }

    /// Attach a completion callback and switch to callback mode.
    #[must_use]
    pub fn with_callback(mut self, callback: CallbackBinding) -> Self {
        self.callback = Some(callback);
        self.call_mode = CallMode::Callback;
        self
    }

    /// The canonical URL this descriptor resolves to, without mutating it.
    #[must_use]
    pub fn canonical_url(&self) -> String {
        canonical::canonical_url(&self.interface, &self.url, &self.protocol)
    }

    /// Normalize the URL in place. Idempotent.
    pub fn canonicalize(&mut self) {
        self.url = self.canonical_url();
    }
}

impl fmt::Display for ConsumerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "consumer {} url={} group={} version={} codec={}",
            self.interface, self.url, self.group, self.version, self.codec
        )
    }
}

/// Network listener configuration for a publication.
///
/// One value conceptually corresponds to one listener: publications that
/// resolve to the same effective port share the underlying listener, and the
/// transport reports the *resolved* binding back (e.g. after auto port
/// selection).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerBinding {
    pub port: u16,
    /// Let the transport pick a free port instead of `port`.
    pub auto_select_port: bool,
    pub http_port: Option<u16>,
    pub core_pool_size: usize,
    pub max_pool_size: usize,
    pub work_queue_size: usize,
}

impl Default for ServerBinding {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            auto_select_port: false,
            http_port: None,
            core_pool_size: 20,
            max_pool_size: 200,
            work_queue_size: 500,
        }
    }
}

impl ServerBinding {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_auto_select_port(mut self, auto: bool) -> Self {
        self.auto_select_port = auto;
        self
    }

    #[must_use]
    pub fn with_http_port(mut self, port: u16) -> Self {
        self.http_port = Some(port);
        self
    }

    #[must_use]
    pub fn with_pool(mut self, core: usize, max: usize, queue: usize) -> Self {
        self.core_pool_size = core;
        self.max_pool_size = max;
        self.work_queue_size = queue;
        self
    }
}

/// Provider-side publication specification.
///
/// Holds a shared reference to the implementation for the lifetime of the
/// publication; the registry never copies or owns it.
#[derive(Clone)]
pub struct ProviderDescriptor {
    pub interface: String,
    pub url: String,
    pub protocol: String,
    pub version: String,
    pub group: String,
    pub server: ServerBinding,
    implementation: Arc<dyn Any + Send + Sync>,
}

impl ProviderDescriptor {
    pub fn new<T: Send + Sync + 'static>(
        interface: impl Into<String>,
        implementation: Arc<T>,
    ) -> Self {
        Self {
            interface: interface.into(),
            url: String::new(),
            protocol: DEFAULT_PROTOCOL.to_owned(),
            version: DEFAULT_VERSION.to_owned(),
            group: String::new(),
            server: ServerBinding::default(),
            implementation,
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    #[must_use]
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    #[must_use]
    pub fn with_server(mut self, server: ServerBinding) -> Self {
        self.server = server;
        self
    }

    /// Shared handle to the published implementation.
    #[must_use]
    pub fn implementation(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.implementation
    }

    /// The canonical URL this descriptor publishes under.
    #[must_use]
    pub fn canonical_url(&self) -> String {
        canonical::canonical_url(&self.interface, &self.url, &self.protocol)
    }

    /// Normalize the URL in place. Idempotent.
    pub fn canonicalize(&mut self) {
        self.url = self.canonical_url();
    }
}

impl fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("interface", &self.interface)
            .field("url", &self.url)
            .field("protocol", &self.protocol)
            .field("version", &self.version)
            .field("group", &self.group)
            .field("server", &self.server)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "provider {} url={} group={} version={} port={}",
            self.interface, self.url, self.group, self.version, self.server.port
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    struct NoopCallback;

    impl ServiceCallback for NoopCallback {
        fn on_success(&self, _payload: &[u8]) {}
        fn on_failure(&self, _error: &anyhow::Error) {}
    }

    fn hash_of(descriptor: &ConsumerDescriptor) -> u64 {
        let mut hasher = DefaultHasher::new();
        descriptor.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn field_wise_equal_descriptors_are_equal_and_hash_alike() {
        let a = ConsumerDescriptor::new("com.acme.Echo")
            .with_url("echo")
            .with_group("blue")
            .with_version("2.0.0")
            .with_timeout(Duration::from_secs(1))
            .with_retries(3);
        let b = ConsumerDescriptor::new("com.acme.Echo")
            .with_url("echo")
            .with_group("blue")
            .with_version("2.0.0")
            .with_timeout(Duration::from_secs(1))
            .with_retries(3);

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn any_differing_field_breaks_equality() {
        let base = ConsumerDescriptor::new("com.acme.Echo").with_url("echo");
        assert_ne!(base.clone().with_group("blue"), base);
        assert_ne!(base.clone().with_version("2.0.0"), base);
        assert_ne!(base.clone().with_timeout(Duration::from_secs(9)), base);
        assert_ne!(base.clone().with_retries(7), base);
        assert_ne!(base.clone().with_vip("10.0.0.1:4040"), base);
    }

    #[test]
    fn callbacks_compare_by_type_name_not_instance() {
        let first = ConsumerDescriptor::new("com.acme.Echo").with_callback(CallbackBinding::new(
            "com.acme.EchoCallback",
            Arc::new(NoopCallback),
        ));
        let second = ConsumerDescriptor::new("com.acme.Echo").with_callback(CallbackBinding::new(
            "com.acme.EchoCallback",
            Arc::new(NoopCallback),
        ));
        assert_eq!(first, second);
        assert_eq!(hash_of(&first), hash_of(&second));
    }

    #[test]
    fn with_callback_switches_to_callback_mode() {
        let descriptor = ConsumerDescriptor::new("com.acme.Echo").with_callback(
            CallbackBinding::new("com.acme.EchoCallback", Arc::new(NoopCallback)),
        );
        assert_eq!(descriptor.call_mode, CallMode::Callback);
    }

    #[test]
    fn consumer_canonicalize_is_idempotent() {
        let mut descriptor = ConsumerDescriptor::new("com.acme.Echo")
            .with_url("svc")
            .with_protocol("foo");
        descriptor.canonicalize();
        assert_eq!(descriptor.url, "@FOO@svc");
        descriptor.canonicalize();
        assert_eq!(descriptor.url, "@FOO@svc", "must not double-prefix");
    }

    #[test]
    fn provider_blank_url_derives_from_interface() {
        let mut descriptor = ProviderDescriptor::new("com.acme.Echo", Arc::new(42_u32));
        descriptor.canonicalize();
        assert_eq!(descriptor.url, "com.acme.Echo");
    }

    #[test]
    fn provider_keeps_a_shared_implementation_handle() {
        let implementation = Arc::new(String::from("impl"));
        let descriptor = ProviderDescriptor::new("com.acme.Echo", Arc::clone(&implementation));
        assert_eq!(Arc::strong_count(&implementation), 2);
        drop(descriptor);
        assert_eq!(Arc::strong_count(&implementation), 1);
    }
}
