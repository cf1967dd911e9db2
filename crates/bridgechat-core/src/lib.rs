pub mod error;
pub mod constants;
pub mod config;
pub mod ingest;
pub mod llm;
pub mod state;
pub mod session;

// Re-export key types
pub use error::BridgeError;
pub use config::Settings;
pub use ingest::{FileHandle, FileKind, FileRecord, LocalFile, MemoryFile};
pub use llm::{ChatBackend, ChatRequest, FragmentStream, GeminiClient};
pub use state::{ChatMessage, ConversationState, Role};
pub use session::{SendOutcome, Session};
