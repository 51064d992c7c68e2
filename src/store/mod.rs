pub mod queue;

pub use queue::{QUEUE_VERSION, SqliteQueueStore, StoredAction};
