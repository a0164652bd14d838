//! Story payload returned by the gateway and its scene-count normalization.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Number of illustrated scenes in every story
pub const SCENE_COUNT: u32 = 20;

const CONTINUATION_DESCRIPTION: &str =
    "Continuation of the story where the characters conclude their adventure.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneOutline {
    pub scene_number: u32,
    pub description: String,
    /// Names of the characters appearing in the scene
    #[serde(default)]
    pub characters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub storyline: String,
    #[serde(default)]
    pub characters: Vec<Character>,
    #[serde(default)]
    pub scenes: Vec<SceneOutline>,
}

impl Story {
    /// Force exactly [`SCENE_COUNT`] scenes numbered 1..=SCENE_COUNT.
    ///
    /// Short stories are padded with continuation scenes featuring the first
    /// character; long ones are truncated. Returns true when anything changed.
    pub fn normalize_scenes(&mut self) -> bool {
        let target = SCENE_COUNT as usize;
        let original_len = self.scenes.len();
        let mut changed = false;

        if original_len != target {
            warn!(
                scene_count = original_len,
                expected = target,
                "Story does not have the expected number of scenes, adjusting"
            );
            changed = true;
        }

        if original_len < target {
            let lead: Vec<String> = self
                .characters
                .first()
                .map(|c| vec![c.name.clone()])
                .unwrap_or_default();
            for n in original_len + 1..=target {
                self.scenes.push(SceneOutline {
                    scene_number: n as u32,
                    description: CONTINUATION_DESCRIPTION.to_string(),
                    characters: lead.clone(),
                });
            }
        }
        self.scenes.truncate(target);

        for (i, scene) in self.scenes.iter_mut().enumerate() {
            let expected = i as u32 + 1;
            if scene.scene_number != expected {
                scene.scene_number = expected;
                changed = true;
            }
        }
        changed
    }
}
