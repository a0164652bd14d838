//! Scripted in-memory gateway for tests and dry runs.
//!
//! Each operation replays a queue of scripted results and falls back to a
//! canned success once the queue is empty. Every call is recorded. Scene calls
//! and cover/music calls each track how many are in flight at once.

use super::{GenerationGateway, ImagePayload};
use crate::error::GatewayError;
use crate::scene::SceneNumber;
use crate::story::{Character, SceneOutline, Story, SCENE_COUNT};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A request observed by [`ScriptedGateway`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Story(String),
    Music,
    CoverImage(String),
    SceneImage(u32),
}

#[derive(Default)]
pub struct ScriptedGateway {
    story: Mutex<VecDeque<Result<Story, GatewayError>>>,
    music: Mutex<VecDeque<Result<String, GatewayError>>>,
    cover: Mutex<VecDeque<Result<ImagePayload, GatewayError>>>,
    scenes: Mutex<HashMap<u32, VecDeque<Result<ImagePayload, GatewayError>>>>,
    calls: Mutex<Vec<GatewayCall>>,
    scenes_in_flight: AtomicUsize,
    max_scenes_in_flight: AtomicUsize,
    media_in_flight: AtomicUsize,
    max_media_in_flight: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Story returned when nothing is scripted: 20 scenes, one character.
    pub fn sample_story(theme: &str) -> Story {
        Story {
            storyline: format!("An adventure about {}.", theme),
            characters: vec![Character {
                name: "Pip".to_string(),
                description: "a small fox with a blue scarf".to_string(),
            }],
            scenes: (1..=SCENE_COUNT)
                .map(|n| SceneOutline {
                    scene_number: n,
                    description: format!("Scene {} of the {} adventure", n, theme),
                    characters: vec!["Pip".to_string()],
                })
                .collect(),
        }
    }

    pub fn sample_scene_image(scene: u32) -> ImagePayload {
        ImagePayload::new(format!("c2NlbmUt{}", scene))
    }

    pub fn with_story(self, story: Story) -> Self {
        self.story.lock().push_back(Ok(story));
        self
    }

    pub fn fail_story(self, err: GatewayError) -> Self {
        self.story.lock().push_back(Err(err));
        self
    }

    pub fn fail_music(self, err: GatewayError) -> Self {
        self.music.lock().push_back(Err(err));
        self
    }

    pub fn fail_cover(self, err: GatewayError) -> Self {
        self.cover.lock().push_back(Err(err));
        self
    }

    /// Queue results for one scene, consumed one per attempt.
    pub fn script_scene(
        self,
        scene: u32,
        results: Vec<Result<ImagePayload, GatewayError>>,
    ) -> Self {
        self.scenes
            .lock()
            .entry(scene)
            .or_default()
            .extend(results);
        self
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Scene numbers in the order they were requested, one entry per attempt
    pub fn scene_calls(&self) -> Vec<u32> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                GatewayCall::SceneImage(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    pub fn max_scenes_in_flight(&self) -> usize {
        self.max_scenes_in_flight.load(Ordering::SeqCst)
    }

    /// Peak number of cover and music requests awaiting a response together
    pub fn max_media_in_flight(&self) -> usize {
        self.max_media_in_flight.load(Ordering::SeqCst)
    }

    async fn media_round_trip(&self) {
        let now = self.media_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_media_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.media_in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn record(&self, call: GatewayCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl GenerationGateway for ScriptedGateway {
    async fn generate_story(&self, theme: &str) -> Result<Story, GatewayError> {
        self.record(GatewayCall::Story(theme.to_string()));
        tokio::task::yield_now().await;
        let scripted = self.story.lock().pop_front();
        scripted.unwrap_or_else(|| Ok(Self::sample_story(theme)))
    }

    async fn generate_music(&self) -> Result<String, GatewayError> {
        self.record(GatewayCall::Music);
        self.media_round_trip().await;
        let scripted = self.music.lock().pop_front();
        scripted.unwrap_or_else(|| Ok("https://cdn.example.com/music/track.mp3".to_string()))
    }

    async fn generate_cover_image(&self, theme: &str) -> Result<ImagePayload, GatewayError> {
        self.record(GatewayCall::CoverImage(theme.to_string()));
        self.media_round_trip().await;
        let scripted = self.cover.lock().pop_front();
        scripted.unwrap_or_else(|| Ok(ImagePayload::new("Y292ZXI=")))
    }

    async fn generate_scene_image(
        &self,
        scene: SceneNumber,
    ) -> Result<ImagePayload, GatewayError> {
        self.record(GatewayCall::SceneImage(scene.get()));
        let now = self.scenes_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_scenes_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.scenes_in_flight.fetch_sub(1, Ordering::SeqCst);

        let scripted = self
            .scenes
            .lock()
            .get_mut(&scene.get())
            .and_then(VecDeque::pop_front);
        scripted.unwrap_or_else(|| Ok(Self::sample_scene_image(scene.get())))
    }

    fn gateway_name(&self) -> &str {
        "scripted"
    }
}
