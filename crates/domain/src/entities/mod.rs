pub mod message;
pub mod room;
pub mod room_member;
pub mod user;

pub use message::{Message, IMAGE_PLACEHOLDER};
pub use room::Room;
pub use room_member::RoomMember;
pub use user::User;
