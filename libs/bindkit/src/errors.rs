//! Error taxonomy for the binding registry.
//!
//! Severity is split three ways:
//! - validation errors (`MissingInterface`, `InvalidReference`) are raised
//!   before any side effect and are never retried;
//! - binding/publication errors wrap the collaborator's root cause and carry
//!   the offending descriptor or URL for diagnostics;
//! - best-effort discovery failures never appear here at all — call sites
//!   log and swallow them.

/// Unified error type surfaced by every registry operation.
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    /// The descriptor has no interface identity.
    #[error("service interface is required: {descriptor}")]
    MissingInterface { descriptor: String },

    /// A declarative reference names no interface and its injection target
    /// cannot supply one.
    #[error("reference '{target}' has neither an explicit interface nor an interface-typed target")]
    InvalidReference { target: String },

    /// No proxy builder registered under the descriptor's codec name.
    #[error("no proxy builder registered for codec '{codec}'")]
    UnknownCodec { codec: String },

    /// A callback type name that no factory was registered for.
    #[error("callback type '{type_name}' is not registered as a service callback")]
    UnknownCallback { type_name: String },

    /// Publish/unpublish/remove against a URL that was never registered.
    #[error("service is not registered: {url}")]
    UnknownService { url: String },

    /// Client runtime startup or proxy construction failed.
    #[error("error while binding service {descriptor}")]
    Bind {
        descriptor: String,
        #[source]
        source: anyhow::Error,
    },

    /// Listener startup or discovery announcement failed while adding a
    /// service; the registration is kept and must be removed explicitly.
    #[error("error while adding service {descriptor}")]
    Add {
        descriptor: String,
        #[source]
        source: anyhow::Error,
    },

    /// Re-announcement of an already-registered service failed.
    #[error("error while publishing service {url}")]
    Publish {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    /// Discovery withdrawal failed.
    #[error("error while unpublishing service {url}")]
    Unpublish {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    /// Withdrawal failed while removing a service; the registration is kept.
    #[error("error while removing service {url}")]
    Remove {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    /// Transport teardown failed during shutdown.
    #[error("error while shutting down transport")]
    Shutdown {
        #[source]
        source: anyhow::Error,
    },
}
