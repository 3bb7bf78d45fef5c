//! I/O services kept apart from the normalization logic

pub mod fetch;
pub mod io;

pub use fetch::{HttpFetcher, ImageFetcher};
pub use io::ImageIOService;
