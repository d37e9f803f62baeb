pub mod download;
pub mod urls;

pub use download::{download_all, FetchStats};
pub use urls::{generate, Candidate};
