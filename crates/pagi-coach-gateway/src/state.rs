//! Shared handler state. Cheap to clone; every service handle is behind an `Arc`.

use pagi_coach_core::{
    ChatOrchestrator, ContextLookup, DatasetStore, MeetingScheduler, ProviderStatus, Providers,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub secret_token: Arc<str>,
    pub chat: Arc<ChatOrchestrator>,
    pub meetings: Arc<MeetingScheduler>,
    pub datasets: Arc<DatasetStore>,
    /// Captured once from the start-up provider handles.
    pub providers: ProviderStatus,
}

impl AppState {
    pub fn new(
        secret_token: &str,
        providers: Providers,
        cache_capacity: usize,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        let status = providers.status();
        let context = Arc::new(ContextLookup::new(providers.context_index, cache_capacity));
        Self {
            secret_token: Arc::from(secret_token),
            chat: Arc::new(ChatOrchestrator::new(context, providers.language_model)),
            meetings: Arc::new(MeetingScheduler::new(providers.meetings)),
            datasets: Arc::new(DatasetStore::new(data_dir)),
            providers: status,
        }
    }
}
