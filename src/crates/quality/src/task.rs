//! Task type and quality tier identifiers
//!
//! Both identifiers are closed enums: the task catalogue is the set of
//! generation steps the pipeline knows how to run, and tiers are exactly
//! `low`, `standard` and `high`. Everything serializes as the snake_case
//! wire string and parses back from it, so the same names appear in the
//! mapping file, on the REST surface and in CLI arguments.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::QualityError;

/// Generation task types the pipeline dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Still frame generation from a text prompt
    TextToImage,
    /// Animating a source frame into a video clip
    ImageToVideo,
    /// Music and sound effect generation from a text prompt
    TextToAudio,
    /// Re-voicing a dialogue track with a target voice model
    VoiceConversion,
    /// Matching character mouth movement to a dialogue track
    Lipsync,
}

impl TaskType {
    /// Every known task type, in catalogue order
    pub const ALL: [TaskType; 5] = [
        TaskType::TextToImage,
        TaskType::ImageToVideo,
        TaskType::TextToAudio,
        TaskType::VoiceConversion,
        TaskType::Lipsync,
    ];

    /// Wire name, identical to the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::TextToImage => "text_to_image",
            TaskType::ImageToVideo => "image_to_video",
            TaskType::TextToAudio => "text_to_audio",
            TaskType::VoiceConversion => "voice_conversion",
            TaskType::Lipsync => "lipsync",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = QualityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskType::ALL
            .iter()
            .copied()
            .find(|task| task.as_str() == s)
            .ok_or_else(|| QualityError::UnknownTaskType(s.to_string()))
    }
}

/// Quality tiers, ordered from cheapest to best
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Fast drafts for blocking and iteration
    Low,
    /// The default production setting
    Standard,
    /// Final renders, slowest
    High,
}

impl QualityTier {
    /// All tiers in ascending quality order
    pub const ALL: [QualityTier; 3] = [QualityTier::Low, QualityTier::Standard, QualityTier::High];

    /// Wire name, identical to the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Low => "low",
            QualityTier::Standard => "standard",
            QualityTier::High => "high",
        }
    }
}

impl Default for QualityTier {
    fn default() -> Self {
        QualityTier::Standard
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = QualityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QualityTier::ALL
            .iter()
            .copied()
            .find(|tier| tier.as_str() == s)
            .ok_or_else(|| QualityError::UnknownTier(s.to_string()))
    }
}
