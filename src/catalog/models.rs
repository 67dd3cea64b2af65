use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub track_name: String,
    pub artist_name: String,
    pub collection_name: String,
    pub collection_id: Option<u64>,
    pub artwork_url_100: String,
    pub high_res_artwork: String,
    pub preview_url: Option<String>,
    pub primary_genre_name: Option<String>,
    pub release_date: Option<String>,
    pub track_number: Option<u32>,
    pub disc_number: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumDetails {
    pub copyright: String,
    pub track_count: u32,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    Song,
    Album,
}

impl SearchType {
    /// Value of the `entity` query parameter.
    pub fn entity(self) -> &'static str {
        match self {
            Self::Song => "song",
            Self::Album => "album",
        }
    }
}
