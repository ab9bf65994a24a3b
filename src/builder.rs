use std::sync::Arc;

use tracing::info;

use crate::{
    Config, Result,
    backend::{BackendType, GeminiBackend, GenerativeBackend, MockBackend},
    flow::{FlowDefinition, FlowExecutor, FlowRegistry},
    flows,
    model::FlowModel,
};

/// Assembles a [`FlowExecutor`] from a [`Config`].
pub struct RoadhogBuilder {
    config: Config,
    backend: Option<Arc<dyn GenerativeBackend>>,
    builtin: bool,
    models: Vec<FlowModel>,
    flows: Vec<FlowDefinition>,
}

impl Default for RoadhogBuilder {
    fn default() -> Self {
        Self {
            config: Config::default(),
            backend: None,
            builtin: true,
            models: Vec::new(),
            flows: Vec::new(),
        }
    }
}

impl RoadhogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(
        mut self,
        config: Config,
    ) -> Self {
        self.config = config;
        self
    }

    /// Uses `backend` instead of the one named in the config.
    pub fn backend(
        mut self,
        backend: Arc<dyn GenerativeBackend>,
    ) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Leaves the RoadHog flows out of the registry.
    pub fn without_builtin(mut self) -> Self {
        self.builtin = false;
        self
    }

    /// Registers a flow loaded from a manifest.
    pub fn model(
        mut self,
        model: FlowModel,
    ) -> Self {
        self.models.push(model);
        self
    }

    pub fn flow(
        mut self,
        def: FlowDefinition,
    ) -> Self {
        self.flows.push(def);
        self
    }

    pub fn build(self) -> Result<FlowExecutor> {
        let backend = match self.backend {
            Some(backend) => backend,
            None => match self.config.backend.backend_type {
                BackendType::Gemini => Arc::new(GeminiBackend::from_config(&self.config.backend)?) as Arc<dyn GenerativeBackend>,
                BackendType::Mock => Arc::new(MockBackend::new()),
            },
        };

        let mut registry = FlowRegistry::builder();
        if self.builtin {
            registry = flows::register_builtin(registry)?;
        }
        for model in &self.models {
            registry = registry.define(model.to_definition()?)?;
        }
        for def in self.flows {
            registry = registry.define(def)?;
        }
        let registry = registry.build();

        info!(backend = backend.name(), flows = registry.len(), "roadhog ready");
        Ok(FlowExecutor::new(Arc::new(registry), backend).with_policy(self.config.policy))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{RoadhogError, flows::location};

    #[test]
    fn test_build_with_builtin_flows() {
        let config = Config::load_from_str("[backend]\nbackend_type = \"mock\"\n[policy]\noutput_retries = 2").unwrap();
        let executor = RoadhogBuilder::new().config(config).build().unwrap();

        assert_eq!(executor.registry().len(), 8);
        assert_eq!(executor.policy().output_retries, 2);
    }

    #[test]
    fn test_gemini_without_key_fails() {
        let config = Config::load_from_str("[backend]\napi_key_env = \"ROADHOG_TEST_MISSING_KEY\"").unwrap();
        let err = RoadhogBuilder::new().config(config).build().err();
        assert!(matches!(err, Some(RoadhogError::Config(_))));
    }

    #[tokio::test]
    async fn test_explicit_backend_and_manifest() {
        let model = FlowModel::from_json(r#"{"name": "pingFlow", "output": {"type": "string"}, "template": "ping"}"#).unwrap();
        let backend = Arc::new(MockBackend::new().respond(json!("pong")).respond(json!({"location": "Taos, NM"})));
        let executor = RoadhogBuilder::new().backend(backend.clone()).model(model).build().unwrap();

        assert_eq!(executor.invoke("pingFlow", None).await.unwrap(), json!("pong"));
        assert_eq!(location::find_user_location(&executor).await.unwrap().location, "Taos, NM");
        assert_eq!(backend.calls(), 2);
    }

    #[test]
    fn test_manifest_clashing_with_builtin() {
        let model = FlowModel::from_json(r#"{"name": "findUserLocationFlow", "output": {"type": "string"}, "template": "x"}"#).unwrap();
        let err = RoadhogBuilder::new().backend(Arc::new(MockBackend::new())).model(model).build().err();
        assert!(matches!(err, Some(RoadhogError::Programmer(_))));
    }

    #[test]
    fn test_without_builtin() {
        let executor = RoadhogBuilder::new().backend(Arc::new(MockBackend::new())).without_builtin().build().unwrap();
        assert!(executor.registry().is_empty());
    }
}
