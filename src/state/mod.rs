pub mod activity;

pub use activity::{ActivityStore, JsonFileStore, MemoryStore};
