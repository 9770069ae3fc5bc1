pub mod provider;
pub mod providers;
pub mod session;
pub mod transport;
pub mod types;

pub use provider::{ChatBackend, ProviderError, TurnRequest};
pub use providers::GeminiProvider;
pub use session::{ChatSession, SessionSettings};
pub use transport::{ChatTransport, Connector, GeminiConnector, TransportError};
pub use types::{GenerationConfig, StreamChunk, Turn, TurnRole};
