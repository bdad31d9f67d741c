use serde::{Deserialize, Serialize};

pub const FINAL_PROJECT_TITLE: &str = "Final project";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoDescriptor {
    #[serde(rename = "playbackURL")]
    pub playback_url: String,
    pub title: String,
    pub section: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitEntry {
    pub title: String,
    #[serde(rename = "videoData")]
    pub videos: Vec<VideoDescriptor>,
}

impl UnitEntry {
    pub fn final_project(playback_url: String) -> Self {
        Self {
            title: FINAL_PROJECT_TITLE.to_string(),
            videos: vec![VideoDescriptor {
                playback_url,
                title: FINAL_PROJECT_TITLE.to_string(),
                section: FINAL_PROJECT_TITLE.to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseListing {
    pub title: String,
    pub units: Vec<UnitEntry>,
    /// Course id of the final project, when one of the unit links points at it.
    pub final_project: Option<String>,
}

impl CourseListing {
    pub fn total_videos(&self) -> usize {
        self.units.iter().map(|u| u.videos.len()).sum()
    }
}
