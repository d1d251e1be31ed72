use crate::config::Config;
use crate::error::BuildError;
use crate::redirect::RegexRedirect;
use crate::service::RegexRedirectService;
use std::sync::Arc;
use tower::Layer;

/// A Tower layer that turns upstream responses into redirects.
///
/// Every service built by this layer shares the same compiled pattern.
#[derive(Debug, Clone)]
pub struct RegexRedirectLayer {
    redirect: Arc<RegexRedirect>,
}

impl RegexRedirectLayer {
    /// Creates a layer from host configuration.
    ///
    /// Fails if the configured pattern does not compile.
    pub fn new(config: &Config, name: impl Into<String>) -> Result<Self, BuildError> {
        RegexRedirect::new(config, name).map(Self::from)
    }

    /// Returns the shared redirect logic.
    pub fn redirect(&self) -> &RegexRedirect {
        &self.redirect
    }
}

impl From<RegexRedirect> for RegexRedirectLayer {
    fn from(redirect: RegexRedirect) -> Self {
        Self {
            redirect: Arc::new(redirect),
        }
    }
}

impl<S> Layer<S> for RegexRedirectLayer {
    type Service = RegexRedirectService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RegexRedirectService::new(inner, Arc::clone(&self.redirect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern_rejected() {
        assert!(matches!(
            RegexRedirectLayer::new(&Config::new("a(b"), "broken"),
            Err(BuildError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_layer_and_service_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}

        assert_send_sync::<RegexRedirectLayer>();
        assert_send_sync::<RegexRedirectService<()>>();
    }

    #[test]
    fn test_services_share_matcher() {
        let layer = RegexRedirectLayer::new(&Config::new("https?://\\S+"), "shared").unwrap();
        let first = layer.layer(());
        let second = layer.layer(());

        assert!(Arc::ptr_eq(first.redirect(), second.redirect()));
        assert_eq!(layer.redirect().name(), "shared");
    }
}
