//! Declarative-wiring entry point.
//!
//! A host container discovers "depends-on" markers (scanning is its
//! business, not ours) and hands each one over as a [`ReferenceSpec`]. The
//! resolver dedupes semantically identical references through a binding-key
//! table with atomic insert-if-absent, so exactly one [`ConsumerDescriptor`]
//! is ever constructed per key no matter how many call sites race on it —
//! unlike the raw proxy cache, this path is race-free by construction.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::callbacks::CallbackRegistry;
use crate::descriptor::{CallbackBinding, ConsumerDescriptor};
use crate::errors::BindingError;

/// A plain reference specification, as produced by a wiring scan.
///
/// String fields left empty fall back to the descriptor defaults; the
/// interface identity may be explicit or inferred from the injection-site
/// target type.
#[derive(Clone, Debug, Default)]
pub struct ReferenceSpec {
    pub interface: Option<String>,
    /// Declared type at the injection site, used when `interface` is unset.
    pub target_type: Option<String>,
    pub url: String,
    pub group: String,
    pub version: String,
    pub protocol: String,
    pub timeout: Option<Duration>,
    pub codec: String,
    pub load_balance: String,
    pub cluster: String,
    pub retries: u32,
    pub timeout_retry: bool,
    pub vip: Option<String>,
    /// Fully-qualified callback type name; instantiated through the
    /// [`CallbackRegistry`] and fatal when unknown.
    pub callback: Option<String>,
}

impl ReferenceSpec {
    #[must_use]
    pub fn for_interface(interface: impl Into<String>) -> Self {
        Self {
            interface: Some(interface.into()),
            retries: 1,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn for_target(target_type: impl Into<String>) -> Self {
        Self {
            target_type: Some(target_type.into()),
            retries: 1,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
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
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = codec.into();
        self
    }

    #[must_use]
    pub fn with_vip(mut self, vip: impl Into<String>) -> Self {
        self.vip = Some(vip.into());
        self
    }

    #[must_use]
    pub fn with_callback(mut self, type_name: impl Into<String>) -> Self {
        self.callback = Some(type_name.into());
        self
    }

    /// The interface identity this reference binds to.
    ///
    /// # Errors
    /// `BindingError::InvalidReference` when neither an explicit interface
    /// nor an injection-site target is available.
    pub fn interface_name(&self) -> Result<&str, BindingError> {
        self.interface
            .as_deref()
            .or(self.target_type.as_deref())
            .ok_or_else(|| BindingError::InvalidReference {
                target: if self.url.is_empty() {
                    "<unspecified>".to_owned()
                } else {
                    self.url.clone()
                },
            })
    }

    /// Deduplication key: semantically identical references collide on it
    /// even when requested from different call sites.
    #[must_use]
    pub fn binding_key(&self, interface: &str) -> String {
        format!(
            "{}/{}@{}:{}",
            self.group, self.url, interface, self.version
        )
    }
}

/// Binding-key table: one constructed descriptor per key, forever.
#[derive(Default)]
pub struct Wiring {
    descriptors: DashMap<String, Arc<ConsumerDescriptor>>,
}

impl Wiring {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse or construct the descriptor for `spec`.
    ///
    /// The callback, when named, is instantiated before the key table is
    /// consulted, so an unknown callback type fails even for a key that
    /// already has a descriptor.
    pub fn descriptor_for(
        &self,
        spec: &ReferenceSpec,
        callbacks: &CallbackRegistry,
        default_timeout: Duration,
    ) -> Result<Arc<ConsumerDescriptor>, BindingError> {
        let interface = spec.interface_name()?;
        let callback = match spec.callback.as_deref() {
            Some(type_name) => Some(CallbackBinding::new(
                type_name,
                callbacks.instantiate(type_name)?,
            )),
            None => None,
        };

        let key = spec.binding_key(interface);
        let entry = self
            .descriptors
            .entry(key)
            .or_insert_with(|| Arc::new(build_descriptor(spec, interface, callback, default_timeout)));
        Ok(Arc::clone(entry.value()))
    }

    /// Number of distinct binding keys seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

fn build_descriptor(
    spec: &ReferenceSpec,
    interface: &str,
    callback: Option<CallbackBinding>,
    default_timeout: Duration,
) -> ConsumerDescriptor {
    let mut descriptor = ConsumerDescriptor::new(interface)
        .with_url(spec.url.clone())
        .with_group(spec.group.clone())
        .with_timeout(spec.timeout.unwrap_or(default_timeout))
        .with_retries(spec.retries)
        .with_timeout_retry(spec.timeout_retry);
    if !spec.version.is_empty() {
        descriptor = descriptor.with_version(spec.version.clone());
    }
    if !spec.protocol.is_empty() {
        descriptor = descriptor.with_protocol(spec.protocol.clone());
    }
    if !spec.codec.is_empty() {
        descriptor = descriptor.with_codec(spec.codec.clone());
    }
    if !spec.load_balance.is_empty() {
        descriptor = descriptor.with_load_balance(spec.load_balance.clone());
    }
    if !spec.cluster.is_empty() {
        descriptor = descriptor.with_cluster(spec.cluster.clone());
    }
    if let Some(vip) = &spec.vip {
        descriptor = descriptor.with_vip(vip.clone());
    }
    if let Some(callback) = callback {
        descriptor = descriptor.with_callback(callback);
    }
    descriptor
}
