//! PAGI Coach — core library.
//! Provider seams, dataset persistence and the chat / meeting orchestration used by the gateway.

pub mod chat;
pub mod config;
pub mod context;
pub mod datasets;
pub mod meetings;
pub mod providers;

pub use chat::{ChatError, ChatOrchestrator, ChatRequest, ChatResponse};
pub use config::{CoachConfig, ConfigError};
pub use context::{ContextCache, ContextLookup};
pub use datasets::{Dataset, DatasetError, DatasetStore, JsonMap};
pub use meetings::{MeetingRequest, MeetingResponse, MeetingScheduler, ScheduleError};
pub use providers::{
    ContextIndex, CreatedMeeting, Embedder, LanguageModel, MeetingParams, MeetingProvider,
    ProviderError, ProviderStatus, Providers,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
