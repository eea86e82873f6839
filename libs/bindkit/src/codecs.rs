//! Codec-name-keyed proxy builder registry.
//!
//! A [`ConsumerDescriptor`] names its serialization codec; this table maps
//! that name onto the [`ProxyBuilder`] that knows how to mint proxies for it.
//! Re-registering a name overwrites the previous builder; handles already
//! minted by the old builder remain valid.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::contracts::ProxyBuilder;
use crate::descriptor::ConsumerDescriptor;

/// Registry of proxy builders, one per codec name.
#[derive(Default)]
pub struct ProxyBuilders {
    map: RwLock<HashMap<String, Arc<dyn ProxyBuilder>>>,
}

impl ProxyBuilders {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, codec: impl Into<String>, builder: Arc<dyn ProxyBuilder>) {
        let mut w = self.map.write();
        w.insert(codec.into(), builder);
    }

    #[must_use]
    pub fn get(&self, codec: &str) -> Option<Arc<dyn ProxyBuilder>> {
        self.map.read().get(codec).cloned()
    }

    /// The builder selected by the descriptor's codec name.
    #[must_use]
    pub fn for_descriptor(&self, descriptor: &ConsumerDescriptor) -> Option<Arc<dyn ProxyBuilder>> {
        self.get(&descriptor.codec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::ProxyHandle;
    use async_trait::async_trait;

    struct TaggedBuilder(&'static str);

    #[async_trait]
    impl ProxyBuilder for TaggedBuilder {
        async fn build_proxy(
            &self,
            _descriptor: &ConsumerDescriptor,
        ) -> anyhow::Result<ProxyHandle> {
            Ok(ProxyHandle::new(self.0))
        }
    }

    #[tokio::test]
    async fn builders_are_selected_by_codec_name() {
        let builders = ProxyBuilders::new();
        builders.register("json", Arc::new(TaggedBuilder("json")));
        builders.register("hessian", Arc::new(TaggedBuilder("hessian")));

        let descriptor = ConsumerDescriptor::new("com.acme.Echo").with_codec("hessian");
        let builder = builders
            .for_descriptor(&descriptor)
            .expect("codec must be registered");
        let proxy = builder.build_proxy(&descriptor).await.unwrap();
        assert_eq!(*proxy.downcast::<&str>().unwrap(), "hessian");
    }

    #[test]
    fn unknown_codec_is_a_miss() {
        let builders = ProxyBuilders::new();
        assert!(builders.get("protobuf").is_none());
    }

    #[test]
    fn re_registering_overwrites_the_previous_builder() {
        let builders = ProxyBuilders::new();
        builders.register("json", Arc::new(TaggedBuilder("first")));
        builders.register("json", Arc::new(TaggedBuilder("second")));
        assert!(builders.get("json").is_some());
        assert_eq!(builders.map.read().len(), 1);
    }
}
