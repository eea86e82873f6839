//! Canonical service URL derivation.
//!
//! Every cache and table in this crate is keyed by canonical URLs, so
//! canonicalization must run before any lookup. The rules:
//! - A blank URL is derived from the interface identity (its fully-qualified
//!   type name).
//! - A non-default protocol is encoded as an `@PROTOCOL@` prefix, uppercased.
//!   Prefixing is idempotent: an already-prefixed URL is returned unchanged.

/// Protocol name that maps to the transport default and carries no prefix.
pub const DEFAULT_PROTOCOL: &str = "DEFAULT";

/// Compute the canonical URL for a service identified by `interface`.
///
/// Pure and side-effect-free; safe to call repeatedly
/// (`canonical_url(i, canonical_url(i, u, p), p) == canonical_url(i, u, p)`).
#[must_use]
pub fn canonical_url(interface: &str, url: &str, protocol: &str) -> String {
    let base = if url.trim().is_empty() { interface } else { url };
    if !has_protocol(protocol) {
        return base.to_owned();
    }
    let prefix = protocol_prefix(protocol);
    if base.starts_with(&prefix) {
        base.to_owned()
    } else {
        format!("{prefix}{base}")
    }
}

/// Whether `protocol` selects something other than the transport default.
#[must_use]
pub fn has_protocol(protocol: &str) -> bool {
    !protocol.trim().is_empty() && !protocol.eq_ignore_ascii_case(DEFAULT_PROTOCOL)
}

fn protocol_prefix(protocol: &str) -> String {
    format!("@{}@", protocol.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_url_falls_back_to_interface_identity() {
        assert_eq!(
            canonical_url("com.acme.EchoService", "", DEFAULT_PROTOCOL),
            "com.acme.EchoService"
        );
        assert_eq!(
            canonical_url("com.acme.EchoService", "   ", DEFAULT_PROTOCOL),
            "com.acme.EchoService"
        );
    }

    #[test]
    fn explicit_url_wins_over_interface_identity() {
        assert_eq!(
            canonical_url("com.acme.EchoService", "echo", DEFAULT_PROTOCOL),
            "echo"
        );
    }

    #[test]
    fn non_default_protocol_is_prefixed_uppercase() {
        assert_eq!(canonical_url("com.acme.Echo", "svc", "foo"), "@FOO@svc");
        assert_eq!(canonical_url("com.acme.Echo", "svc", "FOO"), "@FOO@svc");
    }

    #[test]
    fn prefixing_is_idempotent() {
        let once = canonical_url("com.acme.Echo", "svc", "foo");
        let twice = canonical_url("com.acme.Echo", &once, "foo");
        assert_eq!(once, twice, "re-canonicalizing must not double-prefix");
        assert_eq!(twice, "@FOO@svc");
    }

    #[test]
    fn default_protocol_is_not_prefixed() {
        assert_eq!(canonical_url("com.acme.Echo", "svc", "DEFAULT"), "svc");
        assert_eq!(canonical_url("com.acme.Echo", "svc", "default"), "svc");
        assert_eq!(canonical_url("com.acme.Echo", "svc", ""), "svc");
    }

    #[test]
    fn blank_url_with_protocol_prefixes_the_derived_url() {
        assert_eq!(
            canonical_url("com.acme.Echo", "", "grpc"),
            "@GRPC@com.acme.Echo"
        );
    }
}
