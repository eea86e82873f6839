//! Courier service binding registry.
//!
//! Turns a logical service description into either a callable client-side
//! proxy or a published, network-reachable provider endpoint. The registry:
//! - canonicalizes service identifiers before every lookup;
//! - keeps at most one live proxy per descriptor when caching is enabled;
//! - sequences transport startup before first use (client runtime before a
//!   proxy is minted, listener before a service is announced);
//! - exposes idempotent publish/unpublish/remove operations with a strict
//!   split between fatal failures and best-effort discovery.
//!
//! The wire protocol, the transport and the discovery service are
//! collaborators behind the traits in [`contracts`]; [`backends`] ships an
//! in-process implementation for embedded use and tests.

pub mod backends;
pub mod cache;
pub mod callbacks;
pub mod canonical;
pub mod codecs;
pub mod contracts;
pub mod descriptor;
pub mod errors;
pub mod publications;
pub mod registry;
pub mod settings;
pub mod wiring;

pub use contracts::{Discovery, ProxyBuilder, ProxyHandle, ServiceCallback, TransportLifecycle};
pub use descriptor::{
    CallMode, CallbackBinding, ConsumerDescriptor, ProviderDescriptor, ServerBinding,
};
pub use errors::BindingError;
pub use registry::ServiceRegistry;
pub use settings::RegistrySettings;
pub use wiring::ReferenceSpec;
