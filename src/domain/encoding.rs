use super::state::EncodingStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Source media an encoding reads from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    /// Storage key of the master file, also its name inside the workspace
    pub filename: String,
    pub original_filename: Option<String>,
    pub width: u32,
    pub height: u32,
    /// Duration in milliseconds
    pub duration: Option<u64>,
    #[serde(default)]
    pub container: Option<String>,
}

/// Target preset: output container, frame size and the recipe used to produce it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub title: String,
    pub container: String,
    pub width: u32,
    pub height: u32,
    /// Recipe template, e.g. `ffmpeg -i $input_file$ $resolution_and_padding$ -y $output_file$`
    pub command: String,
}

/// One request to transcode a video with a profile.
///
/// Plain persisted record; state changes go through
/// [`EncodingService`](crate::application::encoder::EncodingService).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encoding {
    pub id: String,
    pub video_id: String,
    pub profile_id: String,
    pub filename: String,
    pub status: EncodingStatus,
    pub command: String,
    pub width: u32,
    pub height: u32,
    pub duration: Option<u64>,
    /// Whole seconds spent in the transcoder
    pub encoding_time: Option<u64>,
    pub queued_at: DateTime<Utc>,
    pub started_encoding_at: Option<DateTime<Utc>>,
    pub encoded_at: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl Encoding {
    /// A fresh `queued` encoding of `video` under `profile`.
    pub fn new(video: &Video, profile: &Profile) -> Self {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        Self {
            filename: format!("{}.{}", id, profile.container),
            id,
            video_id: video.id.clone(),
            profile_id: profile.id.clone(),
            status: EncodingStatus::Queued,
            command: profile.command.clone(),
            width: profile.width,
            height: profile.height,
            duration: video.duration,
            encoding_time: None,
            queued_at: now,
            started_encoding_at: None,
            encoded_at: None,
            created: now,
            updated: now,
            error_message: None,
        }
    }

    pub fn touch(&mut self) {
        self.updated = Utc::now();
    }

    pub fn show_response(&self) -> ShowResponse {
        ShowResponse {
            video: EncodingView::from(self),
        }
    }
}

/// Flat, read-only field set reported for an encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingView {
    pub id: String,
    pub filename: String,
    pub video_id: String,
    pub status: EncodingStatus,
    pub profile_id: String,
    pub command: String,
    pub duration: Option<u64>,
    pub width: u32,
    pub height: u32,
    pub encoding_time: Option<u64>,
    pub queued_at: DateTime<Utc>,
    pub started_encoding_at: Option<DateTime<Utc>>,
    pub updated: DateTime<Utc>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowResponse {
    pub video: EncodingView,
}

impl From<&Encoding> for EncodingView {
    fn from(encoding: &Encoding) -> Self {
        Self {
            id: encoding.id.clone(),
            filename: encoding.filename.clone(),
            video_id: encoding.video_id.clone(),
            status: encoding.status,
            profile_id: encoding.profile_id.clone(),
            command: encoding.command.clone(),
            duration: encoding.duration,
            width: encoding.width,
            height: encoding.height,
            encoding_time: encoding.encoding_time,
            queued_at: encoding.queued_at,
            started_encoding_at: encoding.started_encoding_at,
            updated: encoding.updated,
            created: encoding.created,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn video(width: u32, height: u32) -> Video {
        Video {
            id: "video-1".to_string(),
            filename: "video-1.mov".to_string(),
            original_filename: Some("holiday.mov".to_string()),
            width,
            height,
            duration: Some(12_000),
            container: Some("mov".to_string()),
        }
    }

    pub fn profile(width: u32, height: u32) -> Profile {
        Profile {
            id: "profile-1".to_string(),
            title: "Flash video".to_string(),
            container: "flv".to_string(),
            width,
            height,
            command: "ffmpeg -i $input_file$ -ar 22050 $resolution_and_padding$ -y $output_file$"
                .to_string(),
        }
    }
}
