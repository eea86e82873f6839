//! Shipped implementations of the collaborator contracts.

mod inproc;

pub use inproc::{InProcDiscovery, InProcProxy, InProcProxyBuilder, InProcTransport, ProviderQuery};
