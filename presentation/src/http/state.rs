use relay_application::{ConversationStore, RunChatUseCase, TraceRecorder};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shared handles every request handler needs.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<RunChatUseCase>,
    pub recorder: Arc<TraceRecorder>,
    pub conversations: Arc<dyn ConversationStore>,
    /// Parent of every chat run's cancellation token.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        chat: Arc<RunChatUseCase>,
        recorder: Arc<TraceRecorder>,
        conversations: Arc<dyn ConversationStore>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            chat,
            recorder,
            conversations,
            shutdown,
        }
    }
}
