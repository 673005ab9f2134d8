use std::sync::Arc;
use std::time::Duration;

use crate::gateway::PersistenceGateway;
use crate::llm_client::CompletionProvider;
use crate::onboarding::DocumentParserClient;
use crate::optimization::lock::RegenerationLock;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn PersistenceGateway>,
    pub llm: Arc<dyn CompletionProvider>,
    pub locks: Arc<dyn RegenerationLock>,
    /// Plain HTTP client for fetching documents by URL.
    pub http: reqwest::Client,
    /// External document-to-text service; onboarding parses in-process without it.
    pub doc_parser: Option<DocumentParserClient>,
    /// Bound on every external call a request makes.
    pub upstream_timeout: Duration,
}
