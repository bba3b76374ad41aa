pub mod sync;

pub use sync::{run_file_sync, SyncReport};
