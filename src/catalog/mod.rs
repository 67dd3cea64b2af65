//! Track and album metadata from the iTunes catalog

pub mod itunes;
pub mod models;

pub use itunes::ItunesClient;
pub use models::{AlbumDetails, SearchType, Track};
