use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::detect::result::DetectionKind;

use super::backend::VisionProvider;

/// Registry of vision providers by name.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn VisionProvider>>,
    default_name: Option<String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            default_name: None,
        }
    }

    /// Register a provider. The first registered provider becomes the default.
    pub fn register<P: VisionProvider + 'static>(&mut self, provider: P) {
        self.register_shared(Arc::new(provider));
    }

    pub fn register_shared(&mut self, provider: Arc<dyn VisionProvider>) {
        let name = provider.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.providers.insert(name, provider);
    }

    /// Set default provider by name.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.providers.contains_key(name) {
            return Err(anyhow!("provider '{}' not registered", name));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn VisionProvider>> {
        self.providers.get(name).cloned()
    }

    pub fn default_provider(&self) -> Option<Arc<dyn VisionProvider>> {
        self.default_name.as_ref().and_then(|name| self.get(name))
    }

    /// List registered providers, sorted by name.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Select a provider that offers the requested detection kind.
    ///
    /// Prefers the default provider when it supports the kind.
    pub fn provider_for(&self, kind: DetectionKind) -> Result<Arc<dyn VisionProvider>> {
        if let Some(default_provider) = self.default_provider() {
            if default_provider.supports(kind) {
                return Ok(default_provider);
            }
        }

        let mut names: Vec<&String> = self.providers.keys().collect();
        names.sort();
        names
            .into_iter()
            .filter_map(|name| self.providers.get(name))
            .find(|provider| provider.supports(kind))
            .cloned()
            .ok_or_else(|| anyhow!("no registered provider supports {}", kind))
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Only(&'static str, DetectionKind);

    impl VisionProvider for Only {
        fn name(&self) -> &'static str {
            self.0
        }

        fn supports(&self, kind: DetectionKind) -> bool {
            kind == self.1
        }
    }

    #[test]
    fn first_registered_is_default() {
        let mut registry = ProviderRegistry::new();
        registry.register(Only("text", DetectionKind::Text));
        registry.register(Only("faces", DetectionKind::Face));

        assert_eq!(registry.default_provider().unwrap().name(), "text");
        assert_eq!(registry.list(), vec!["faces", "text"]);
    }

    #[test]
    fn falls_back_to_any_provider_supporting_kind() {
        let mut registry = ProviderRegistry::new();
        registry.register(Only("text", DetectionKind::Text));
        registry.register(Only("faces", DetectionKind::Face));

        let provider = registry.provider_for(DetectionKind::Face).unwrap();
        assert_eq!(provider.name(), "faces");

        let err = registry
            .provider_for(DetectionKind::Barcode)
            .err()
            .expect("no barcode provider");
        assert!(err.to_string().contains("Barcode scanning"));
    }

    #[test]
    fn set_default_rejects_unknown_names() {
        let mut registry = ProviderRegistry::new();
        registry.register(Only("text", DetectionKind::Text));
        assert!(registry.set_default("missing").is_err());
        registry.register(Only("labels", DetectionKind::Label));
        registry.set_default("labels").unwrap();
        assert_eq!(registry.default_provider().unwrap().name(), "labels");
    }
}
