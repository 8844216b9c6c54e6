// * Persistence
// * Dated JSON batch files are the durable output of a crawl run and the
// * read-back source for the activity layer.

pub mod record;
pub mod store;

pub use record::VideoMetadata;
pub use store::{find_last_by_aweme_id, JsonBatchStore, StoreError};
