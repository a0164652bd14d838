//! Scene slots: one per story beat, tracking the state of its illustration.

use crate::error::StoryError;
use crate::gateway::ImagePayload;
use crate::story::{Story, SCENE_COUNT};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scene number in `1..=SCENE_COUNT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SceneNumber(u32);

impl SceneNumber {
    pub fn new(n: u32) -> Result<Self, StoryError> {
        if (1..=SCENE_COUNT).contains(&n) {
            Ok(Self(n))
        } else {
            Err(StoryError::InvalidSceneNumber(n, SCENE_COUNT))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_last(self) -> bool {
        self.0 == SCENE_COUNT
    }
}

impl TryFrom<u32> for SceneNumber {
    type Error = StoryError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        SceneNumber::new(value)
    }
}

impl From<SceneNumber> for u32 {
    fn from(value: SceneNumber) -> Self {
        value.0
    }
}

impl fmt::Display for SceneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "image", rename_all = "snake_case")]
pub enum ImageState {
    Pending,
    Loading,
    Ready(ImagePayload),
    /// Exhausted retries; the slot shows the placeholder image
    Failed(ImagePayload),
}

impl ImageState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageState::Pending => "pending",
            ImageState::Loading => "loading",
            ImageState::Ready(_) => "ready",
            ImageState::Failed(_) => "failed",
        }
    }

    pub fn image(&self) -> Option<&ImagePayload> {
        match self {
            ImageState::Ready(image) | ImageState::Failed(image) => Some(image),
            ImageState::Pending | ImageState::Loading => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSlot {
    pub scene_number: SceneNumber,
    pub description: String,
    pub image_state: ImageState,
}

/// The full, ordered set of scene slots for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneBoard {
    slots: Vec<SceneSlot>,
}

impl SceneBoard {
    /// Build fresh Pending slots from a normalized story.
    pub fn from_story(story: &Story) -> Result<Self, StoryError> {
        let slots = story
            .scenes
            .iter()
            .map(|outline| {
                Ok(SceneSlot {
                    scene_number: SceneNumber::new(outline.scene_number)?,
                    description: outline.description.clone(),
                    image_state: ImageState::Pending,
                })
            })
            .collect::<Result<Vec<_>, StoryError>>()?;
        Ok(Self { slots })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[SceneSlot] {
        &self.slots
    }

    pub fn get(&self, scene: SceneNumber) -> Option<&SceneSlot> {
        self.slots.iter().find(|s| s.scene_number == scene)
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut SceneSlot> {
        self.slots.get_mut(index)
    }

    pub fn failed_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s.image_state, ImageState::Failed(_)))
            .count()
    }

    pub fn ready_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s.image_state, ImageState::Ready(_)))
            .count()
    }
}
