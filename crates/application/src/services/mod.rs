pub mod history;
pub mod room_directory;
pub mod send_message;

pub use history::{MessageHistoryService, MessageHistoryServiceDependencies, HISTORY_PAGE_SIZE};
pub use room_directory::{
    MemberProfile, RoomDirectory, RoomDirectoryDependencies, RoomIdentifier,
};
pub use send_message::{
    AttachmentPayload, SendMessageRequest, SendMessageService, SendMessageServiceDependencies,
};

#[cfg(test)]
mod history_tests;
