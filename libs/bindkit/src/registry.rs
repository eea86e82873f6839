//! The service binding registry facade.
//!
//! One [`ServiceRegistry`] is an explicit context object: it owns the proxy
//! cache, the publication table and the binding-key table, and it is the
//! only place that sequences transport startup against them. Construct
//! independent instances for isolated tests — nothing here is process-global.
//!
//! Sequencing contracts:
//! - consumer side: canonicalize → cache lookup → client runtime start →
//!   proxy construction → best-effort discovery → cache store;
//! - provider side: canonicalize → register → listener start → resolved
//!   binding write-back → discovery announce → mark published. Partial
//!   effects of a failed add are kept, not rolled back.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cache::ProxyCache;
use crate::callbacks::CallbackRegistry;
use crate::codecs::ProxyBuilders;
use crate::contracts::{Discovery, ProxyBuilder, ProxyHandle, ServiceCallback, TransportLifecycle};
use crate::descriptor::{ConsumerDescriptor, ProviderDescriptor};
use crate::errors::BindingError;
use crate::publications::PublicationRegistry;
use crate::settings::RegistrySettings;
use crate::wiring::{ReferenceSpec, Wiring};

/// Binding registry for one transport/discovery pair.
pub struct ServiceRegistry {
    settings: RegistrySettings,
    lifecycle: Arc<dyn TransportLifecycle>,
    discovery: Arc<dyn Discovery>,
    codecs: ProxyBuilders,
    callbacks: CallbackRegistry,
    cache: ProxyCache,
    publications: PublicationRegistry,
    wiring: Wiring,
}

impl ServiceRegistry {
    #[must_use]
    pub fn new(
        settings: RegistrySettings,
        lifecycle: Arc<dyn TransportLifecycle>,
        discovery: Arc<dyn Discovery>,
    ) -> Self {
        let cache = ProxyCache::new(settings.cache_proxies);
        Self {
            settings,
            lifecycle,
            discovery,
            codecs: ProxyBuilders::new(),
            callbacks: CallbackRegistry::new(),
            cache,
            publications: PublicationRegistry::new(),
            wiring: Wiring::new(),
        }
    }

    /// Make `builder` the proxy builder for `codec`-serialized bindings.
    pub fn register_proxy_builder(&self, codec: impl Into<String>, builder: Arc<dyn ProxyBuilder>) {
        self.codecs.register(codec, builder);
    }

    /// Register a callback constructor under its fully-qualified type name.
    pub fn register_callback<F>(&self, type_name: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn ServiceCallback> + Send + Sync + 'static,
    {
        self.callbacks.register(type_name, factory);
    }

    #[must_use]
    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    // ---------------------------------------------------------------- consumer

    /// Resolve a callable proxy for `descriptor`.
    ///
    /// Failures of runtime startup or proxy construction are fatal; a
    /// failed provider discovery is logged and swallowed because the proxy
    /// stays usable once a provider becomes reachable later.
    ///
    /// # Errors
    /// `MissingInterface`, `UnknownCodec`, or `Bind` wrapping the
    /// collaborator's root cause.
    pub async fn resolve_service(
        &self,
        mut descriptor: ConsumerDescriptor,
    ) -> Result<ProxyHandle, BindingError> {
        if descriptor.interface.trim().is_empty() {
            return Err(BindingError::MissingInterface {
                descriptor: descriptor.to_string(),
            });
        }
        descriptor.canonicalize();

        if self.cache.enabled() {
            if let Some(proxy) = self.cache.get(&descriptor) {
                tracing::debug!(url = %descriptor.url, "proxy cache hit");
                return Ok(proxy);
            }
        }

        self.lifecycle
            .start_client_runtime()
            .await
            .map_err(|e| BindingError::Bind {
                descriptor: descriptor.to_string(),
                source: e,
            })?;

        let builder =
            self.codecs
                .for_descriptor(&descriptor)
                .ok_or_else(|| BindingError::UnknownCodec {
                    codec: descriptor.codec.clone(),
                })?;
        let proxy = builder
            .build_proxy(&descriptor)
            .await
            .map_err(|e| BindingError::Bind {
                descriptor: descriptor.to_string(),
                source: e,
            })?;

        let group = if descriptor.group.is_empty() {
            self.settings.group.as_str()
        } else {
            descriptor.group.as_str()
        };
        if let Err(error) = self
            .discovery
            .discover_providers(&descriptor.url, group, descriptor.vip.as_deref())
            .await
        {
            tracing::warn!(
                url = %descriptor.url,
                error = %error,
                "provider discovery failed; proxy remains usable once a provider is reachable"
            );
        }

        if self.cache.enabled() {
            self.cache.store(descriptor, proxy.clone());
        }
        Ok(proxy)
    }

    /// Resolve a declaratively wired reference.
    ///
    /// Reuses the per-key descriptor (exactly one construction per binding
    /// key) and delegates to [`Self::resolve_service`].
    ///
    /// # Errors
    /// `InvalidReference`/`UnknownCallback` from the reference itself, plus
    /// anything `resolve_service` reports.
    pub async fn bind_reference(&self, spec: &ReferenceSpec) -> Result<ProxyHandle, BindingError> {
        let descriptor =
            self.wiring
                .descriptor_for(spec, &self.callbacks, self.settings.default_timeout())?;
        self.resolve_service((*descriptor).clone()).await
    }

    /// Global proxy-cache toggle; never evicts existing entries.
    pub fn set_caching_enabled(&self, enabled: bool) {
        self.cache.set_enabled(enabled);
    }

    #[must_use]
    pub fn caching_enabled(&self) -> bool {
        self.cache.enabled()
    }

    /// Number of proxies currently cached.
    #[must_use]
    pub fn cached_proxy_count(&self) -> usize {
        self.cache.len()
    }

    // ---------------------------------------------------------------- provider

    /// Register `descriptor`, ensure its listener, and announce it.
    ///
    /// Partial side effects of a failure are kept: a descriptor whose
    /// announcement failed stays registered until explicitly removed.
    ///
    /// # Errors
    /// `MissingInterface` or `Add` wrapping the collaborator's root cause.
    pub async fn add_service(&self, mut descriptor: ProviderDescriptor) -> Result<(), BindingError> {
        if descriptor.interface.trim().is_empty() {
            return Err(BindingError::MissingInterface {
                descriptor: descriptor.to_string(),
            });
        }
        descriptor.canonicalize();
        let url = descriptor.url.clone();
        tracing::info!(url = %url, interface = %descriptor.interface, "adding service");

        self.publications.register(descriptor.clone());

        let resolved = self
            .lifecycle
            .start_listener(&descriptor.server)
            .await
            .map_err(|e| BindingError::Add {
                descriptor: descriptor.to_string(),
                source: e,
            })?;
        self.publications.set_resolved_binding(&url, resolved.clone());

        self.discovery
            .announce(&url, &resolved)
            .await
            .map_err(|e| BindingError::Add {
                descriptor: descriptor.to_string(),
                source: e,
            })?;
        self.publications.mark_published(&url, true);
        Ok(())
    }

    /// Add each descriptor in order; the first failure aborts the rest.
    ///
    /// Not atomic: earlier descriptors stay added and published.
    ///
    /// # Errors
    /// The first `add_service` error, identifying the offending descriptor.
    pub async fn add_services(
        &self,
        descriptors: Vec<ProviderDescriptor>,
    ) -> Result<(), BindingError> {
        tracing::info!(count = descriptors.len(), "adding services");
        for descriptor in descriptors {
            self.add_service(descriptor).await?;
        }
        Ok(())
    }

    /// Re-announce an already-registered service.
    ///
    /// Uses the stored resolved binding; neither re-registers nor restarts
    /// the listener.
    ///
    /// # Errors
    /// `UnknownService` or `Publish`.
    pub async fn publish_service(&self, url: &str) -> Result<(), BindingError> {
        let descriptor =
            self.publications
                .get(url)
                .ok_or_else(|| BindingError::UnknownService {
                    url: url.to_owned(),
                })?;
        self.discovery
            .announce(url, &descriptor.server)
            .await
            .map_err(|e| BindingError::Publish {
                url: url.to_owned(),
                source: e,
            })?;
        self.publications.mark_published(url, true);
        tracing::debug!(url = %url, "service published");
        Ok(())
    }

    /// Withdraw the discovery announcement only; the registration and the
    /// listener remain.
    ///
    /// # Errors
    /// `UnknownService` or `Unpublish`.
    pub async fn unpublish_service(&self, url: &str) -> Result<(), BindingError> {
        if self.publications.get(url).is_none() {
            return Err(BindingError::UnknownService {
                url: url.to_owned(),
            });
        }
        self.discovery
            .withdraw(url)
            .await
            .map_err(|e| BindingError::Unpublish {
                url: url.to_owned(),
                source: e,
            })?;
        self.publications.mark_published(url, false);
        tracing::debug!(url = %url, "service unpublished");
        Ok(())
    }

    /// Withdraw the announcement and delete the local registration.
    ///
    /// # Errors
    /// `UnknownService` or `Remove`; on a failed withdrawal the
    /// registration is kept.
    pub async fn remove_service(&self, url: &str) -> Result<(), BindingError> {
        if self.publications.get(url).is_none() {
            return Err(BindingError::UnknownService {
                url: url.to_owned(),
            });
        }
        self.discovery
            .withdraw(url)
            .await
            .map_err(|e| BindingError::Remove {
                url: url.to_owned(),
                source: e,
            })?;
        self.publications.remove(url);
        tracing::info!(url = %url, "service removed");
        Ok(())
    }

    /// Descriptor form of [`Self::publish_service`].
    ///
    /// # Errors
    /// See [`Self::publish_service`].
    pub async fn publish_service_config(
        &self,
        descriptor: &ProviderDescriptor,
    ) -> Result<(), BindingError> {
        self.publish_service(&descriptor.canonical_url()).await
    }

    /// Descriptor form of [`Self::unpublish_service`].
    ///
    /// # Errors
    /// See [`Self::unpublish_service`].
    pub async fn unpublish_service_config(
        &self,
        descriptor: &ProviderDescriptor,
    ) -> Result<(), BindingError> {
        self.unpublish_service(&descriptor.canonical_url()).await
    }

    /// Descriptor form of [`Self::remove_service`].
    ///
    /// # Errors
    /// See [`Self::remove_service`].
    pub async fn remove_service_config(
        &self,
        descriptor: &ProviderDescriptor,
    ) -> Result<(), BindingError> {
        self.remove_service(&descriptor.canonical_url()).await
    }

    /// Re-announce every registered service; first failure aborts.
    ///
    /// # Errors
    /// The first `publish_service` error.
    pub async fn publish_all_services(&self) -> Result<(), BindingError> {
        for url in self.publications.urls() {
            self.publish_service(&url).await?;
        }
        Ok(())
    }

    /// Withdraw every announcement; first failure aborts.
    ///
    /// # Errors
    /// The first `unpublish_service` error.
    pub async fn unpublish_all_services(&self) -> Result<(), BindingError> {
        for url in self.publications.urls() {
            self.unpublish_service(&url).await?;
        }
        Ok(())
    }

    /// Withdraw and delete every registration; first failure aborts.
    ///
    /// # Errors
    /// The first `remove_service` error.
    pub async fn remove_all_services(&self) -> Result<(), BindingError> {
        for url in self.publications.urls() {
            self.remove_service(&url).await?;
        }
        Ok(())
    }

    /// Pure lookup; reflects the resolved listener binding.
    #[must_use]
    pub fn get_service_config(&self, url: &str) -> Option<ProviderDescriptor> {
        self.publications.get(url)
    }

    /// Number of registered services.
    #[must_use]
    pub fn service_count(&self) -> usize {
        self.publications.len()
    }

    // --------------------------------------------------------------- lifecycle

    /// Stop the provider listener and the client runtime, in that order.
    ///
    /// # Errors
    /// `Shutdown` wrapping the transport's root cause.
    pub async fn shutdown(&self) -> Result<(), BindingError> {
        self.lifecycle
            .stop_listener()
            .await
            .map_err(|e| BindingError::Shutdown { source: e })?;
        self.lifecycle
            .stop_client_runtime()
            .await
            .map_err(|e| BindingError::Shutdown { source: e })?;
        Ok(())
    }

    /// Run [`Self::shutdown`] when `cancel` fires.
    pub fn watch_shutdown(self: Arc<Self>, cancel: CancellationToken) {
        let registry = self;
        tokio::spawn(async move {
            cancel.cancelled().await;
            tracing::info!("shutdown signal received, stopping transport");
            if let Err(error) = registry.shutdown().await {
                tracing::warn!(error = %error, "transport shutdown reported an error");
            }
        });
    }
}
