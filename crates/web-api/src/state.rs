use std::sync::Arc;

use application::{MessageHistoryService, PresenceHub, RoomDirectory, SendMessageService};

#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<RoomDirectory>,
    pub send_service: Arc<SendMessageService>,
    pub history_service: Arc<MessageHistoryService>,
    pub hub: Arc<PresenceHub>,
}

impl AppState {
    pub fn new(
        directory: Arc<RoomDirectory>,
        send_service: Arc<SendMessageService>,
        history_service: Arc<MessageHistoryService>,
        hub: Arc<PresenceHub>,
    ) -> Self {
        Self {
            directory,
            send_service,
            history_service,
            hub,
        }
    }
}
