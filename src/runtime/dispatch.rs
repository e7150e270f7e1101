//! Render dispatch
//!
//! Resolves a canonical identifier against the current registry generation
//! and hands the definition name and the caller's attributes to a
//! [`TemplateRenderer`]. Attributes travel inside the [`RenderRequest`], so
//! concurrent dispatches never share render state.

use std::sync::Arc;

use crate::core::definition::Attributes;
use crate::core::registry::{BlockRegistry, RegistryError};
use crate::core::schema::AttributeSchema;

/// Template kind used for front-end block output
pub const DEFAULT_TEMPLATE_KIND: &str = "block";

/// Everything a renderer needs for one render
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    /// Definition key of the block being rendered
    pub name: &'a str,
    /// Caller-supplied attribute values, unvalidated
    pub attributes: &'a Attributes,
    pub template_kind: &'a str,
}

/// External template renderer
///
/// The returned buffer is passed back to the caller untouched.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, request: &RenderRequest<'_>) -> String;
}

impl<F> TemplateRenderer for F
where
    F: Fn(&RenderRequest<'_>) -> String + Send + Sync,
{
    fn render(&self, request: &RenderRequest<'_>) -> String {
        self(request)
    }
}

/// Dispatches render calls to registered blocks
#[derive(Clone)]
pub struct Dispatcher {
    registry: BlockRegistry,
    renderer: Arc<dyn TemplateRenderer>,
    template_kind: String,
}

impl Dispatcher {
    pub fn new(registry: BlockRegistry, renderer: impl TemplateRenderer + 'static) -> Self {
        Self::with_shared_renderer(registry, Arc::new(renderer))
    }

    pub fn with_shared_renderer(registry: BlockRegistry, renderer: Arc<dyn TemplateRenderer>) -> Self {
        Self {
            registry,
            renderer,
            template_kind: DEFAULT_TEMPLATE_KIND.to_string(),
        }
    }

    pub fn with_template_kind(mut self, template_kind: impl Into<String>) -> Self {
        self.template_kind = template_kind.into();
        self
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn template_kind(&self) -> &str {
        &self.template_kind
    }

    /// Render the block registered under `canonical_id`
    ///
    /// # Returns
    /// * `Ok(String)` with the renderer's output
    /// * `Err(RegistryError::UnknownBlock)` if nothing is registered under the id
    pub fn dispatch(&self, canonical_id: &str, attributes: &Attributes) -> Result<String, RegistryError> {
        let block = self.registry.lookup(canonical_id).map_err(|err| {
            tracing::debug!(canonical_id, "dispatch to unregistered block");
            err
        })?;

        let request = RenderRequest {
            name: &block.definition.name,
            attributes,
            template_kind: &self.template_kind,
        };
        Ok(self.renderer.render(&request))
    }

    /// Handle that dispatches to `canonical_id`
    ///
    /// Fails if the block is not registered now. The handle resolves the
    /// identifier again on every call, so it follows later generations.
    pub fn handler(&self, canonical_id: &str) -> Result<RenderHandler, RegistryError> {
        if !self.registry.contains(canonical_id) {
            return Err(RegistryError::UnknownBlock(canonical_id.to_string()));
        }
        Ok(RenderHandler {
            dispatcher: self.clone(),
            canonical_id: canonical_id.to_string(),
        })
    }

    /// Everything the host registers: one entry per block of the current generation
    pub fn registrations(&self) -> Vec<Registration> {
        self.registry
            .snapshot()
            .iter()
            .map(|block| Registration {
                canonical_id: block.canonical_id.clone(),
                schema: block.schema.clone(),
                handler: RenderHandler {
                    dispatcher: self.clone(),
                    canonical_id: block.canonical_id.clone(),
                },
            })
            .collect()
    }
}

/// Render callback bound to one canonical identifier
#[derive(Clone)]
pub struct RenderHandler {
    dispatcher: Dispatcher,
    canonical_id: String,
}

impl RenderHandler {
    pub fn canonical_id(&self) -> &str {
        &self.canonical_id
    }

    pub fn call(&self, attributes: &Attributes) -> Result<String, RegistryError> {
        self.dispatcher.dispatch(&self.canonical_id, attributes)
    }
}

impl std::fmt::Debug for RenderHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderHandler")
            .field("canonical_id", &self.canonical_id)
            .finish_non_exhaustive()
    }
}

/// Registration output consumed by the host
#[derive(Debug, Clone)]
pub struct Registration {
    pub canonical_id: String,
    pub schema: AttributeSchema,
    pub handler: RenderHandler,
}
