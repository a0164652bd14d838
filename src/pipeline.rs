//! Scene Image Pipeline
//!
//! Requests scene illustrations one at a time in ascending scene order, each
//! through the [`RetryingExecutor`]. A scene that exhausts its retries gets the
//! placeholder image and the pipeline moves on. Consecutive scene requests are
//! spaced by a fixed delay; there is no delay after the last scene.

use crate::gateway::{
    GenerationGateway, GenerationOutcome, GenerationPayload, GenerationRequest, ImagePayload,
};
use crate::pacing::{PacingConfig, Sleeper};
use crate::retry::{RetryPolicy, RetryingExecutor};
use crate::scene::{ImageState, SceneBoard, SceneNumber, SceneSlot};
use crate::sink::{PresentationEvent, PresentationSink};
use futures::stream::{self, BoxStream, StreamExt};
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct ScenePipeline<'a> {
    executor: RetryingExecutor<'a>,
    sink: &'a dyn PresentationSink,
    sleeper: &'a dyn Sleeper,
    max_retries: u32,
    spacing: Duration,
}

impl<'a> ScenePipeline<'a> {
    pub fn new(
        gateway: &'a dyn GenerationGateway,
        sink: &'a dyn PresentationSink,
        sleeper: &'a dyn Sleeper,
        pacing: &PacingConfig,
    ) -> Self {
        Self {
            executor: RetryingExecutor::new(
                gateway,
                sink,
                sleeper,
                RetryPolicy::from_pacing(pacing),
            ),
            sink,
            sleeper,
            max_retries: pacing.scene_max_retries,
            spacing: pacing.scene_spacing(),
        }
    }

    /// Lazily process every slot of `board`, yielding one outcome per scene.
    ///
    /// Nothing is requested until the stream is polled. Calling `run` again
    /// starts over from the first scene.
    pub fn run<'s>(
        &'s self,
        board: &'s mut SceneBoard,
    ) -> BoxStream<'s, (SceneNumber, GenerationOutcome)> {
        stream::unfold((self, board, 0usize), |(pipeline, board, index)| async move {
            if index >= board.len() {
                return None;
            }
            if index > 0 {
                debug!(
                    next_index = index,
                    wait_ms = pipeline.spacing.as_millis() as u64,
                    "spacing scene requests"
                );
                pipeline.sleeper.sleep(pipeline.spacing).await;
            }
            let slot = board.slot_mut(index)?;
            let item = pipeline.process(slot).await;
            Some((item, (pipeline, board, index + 1)))
        })
        .boxed()
    }

    async fn process(&self, slot: &mut SceneSlot) -> (SceneNumber, GenerationOutcome) {
        let scene_number = slot.scene_number;
        slot.image_state = ImageState::Loading;
        self.sink
            .emit(PresentationEvent::SceneLoading { scene_number });
        info!(scene_number = scene_number.get(), "generating scene image");

        let outcome = self
            .executor
            .execute(&GenerationRequest::scene_image(scene_number), self.max_retries)
            .await;

        match outcome.into_image() {
            Ok(image) => {
                slot.image_state = ImageState::Ready(image.clone());
                self.sink.emit(PresentationEvent::SceneReady {
                    scene_number,
                    image: image.clone(),
                });
                (
                    scene_number,
                    GenerationOutcome::Success(GenerationPayload::Image(image)),
                )
            }
            Err((kind, message)) => {
                let placeholder = ImagePayload::placeholder();
                slot.image_state = ImageState::Failed(placeholder.clone());
                warn!(
                    scene_number = scene_number.get(),
                    failure = kind.as_str(),
                    error = %message,
                    "scene image failed, using placeholder"
                );
                self.sink.emit(PresentationEvent::SceneFailed {
                    scene_number,
                    placeholder,
                    message: message.clone(),
                });
                (scene_number, GenerationOutcome::Failure { kind, message })
            }
        }
    }
}
