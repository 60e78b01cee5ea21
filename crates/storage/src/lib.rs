#![forbid(unsafe_code)]

pub mod banks;
pub mod loader;
pub mod repository;

pub use banks::BankStore;
pub use loader::{LoadError, load_banks_from_dir, parse_bank};
pub use repository::{InMemorySessionStore, SessionHandle, SessionStore, StorageError};
