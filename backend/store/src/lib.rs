pub mod sqlite_store;
pub mod store;

pub use sqlite_store::SqliteTallyStore;
pub use store::{InMemoryTallyStore, TallyStore};
