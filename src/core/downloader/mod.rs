mod fetcher;
mod progress;

pub use fetcher::{sha1_file, verify_sha1, FetchReport, FileFetcher};
pub use progress::{AtomicProgress, NoProgress, Progress, ProgressSink, SubProgress};
