mod backend;
mod memory;

pub use backend::{Backend, BackendError};
pub use memory::InMemoryBackend;
