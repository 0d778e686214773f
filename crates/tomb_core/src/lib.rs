pub mod codec;
pub mod cursor;
pub mod error;
pub mod gameflow;
pub mod hooks;
pub mod item;
pub mod layout;
pub mod legacy;
pub mod object;
pub mod player;
pub mod savegame;
pub mod schema;
pub mod session;
pub mod slots;
pub mod start_info;
pub mod storage;
pub mod summary;

pub use error::SaveError;
pub use gameflow::GameFlow;
pub use session::GameSession;
