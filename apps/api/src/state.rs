use std::sync::Arc;

use crate::creations::CreationStore;
use crate::documents::DocumentReader;
use crate::identity::IdentityProvider;
use crate::llm_client::ChatModel;
use crate::media::{ImageGenerator, ImageHost};

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Every external collaborator is held behind a trait object so handlers never
/// touch a concrete vendor client.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub llm: Arc<dyn ChatModel>,
    pub image_generator: Arc<dyn ImageGenerator>,
    pub image_host: Arc<dyn ImageHost>,
    pub documents: Arc<dyn DocumentReader>,
    pub creations: Arc<dyn CreationStore>,
}
