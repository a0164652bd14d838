//! Backoff and pacing observed through full runs.

use crate::integration::test_utils::{harness, harness_with_pacing};
use storyloom::gateway::ScriptedGateway;
use storyloom::pacing::PacingConfig;
use storyloom::scene::{ImageState, SceneNumber};
use storyloom::sink::PresentationEvent;
use storyloom::{FailureKind, GatewayError};

#[tokio::test]
async fn scene_five_rate_limited_twice_backs_off_then_succeeds() {
    let h = harness(ScriptedGateway::new().script_scene(
        5,
        vec![
            Err(GatewayError::rate_limited("Rate limit exceeded")),
            Err(GatewayError::rate_limited("Rate limit exceeded")),
        ],
    ));

    let report = h.orchestrator.start_run("pirates").await.unwrap();

    let backoffs: Vec<u64> = h
        .sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            PresentationEvent::RequestBackoff {
                wait_ms,
                reason: FailureKind::RateLimited,
                ..
            } => Some(wait_ms),
            _ => None,
        })
        .collect();
    assert_eq!(backoffs, vec![2000, 4000]);

    let five = report.scenes.get(SceneNumber::new(5).unwrap()).unwrap();
    assert!(matches!(&five.image_state, ImageState::Ready(img) if !img.is_placeholder()));
    assert_eq!(report.failed_scenes, 0);

    // 19 inter-scene gaps plus the two backoffs
    let waits = h.sleeper.waits_ms();
    assert_eq!(waits.len(), 21);
    assert_eq!(waits.iter().filter(|w| **w == 8000).count(), 19);
}

#[tokio::test]
async fn persistent_failures_use_at_most_the_budget() {
    let failures = (0..10)
        .map(|_| Err(GatewayError::transient("server error")))
        .collect();
    let pacing = PacingConfig {
        scene_max_retries: 4,
        ..PacingConfig::default()
    };
    let h = harness_with_pacing(ScriptedGateway::new().script_scene(12, failures), pacing);

    let report = h.orchestrator.start_run("owls").await.unwrap();

    let attempts_on_twelve = h.gateway.scene_calls().iter().filter(|n| **n == 12).count();
    assert_eq!(attempts_on_twelve, 4);
    assert_eq!(report.failed_scenes, 1);

    let error_pauses = h
        .sink
        .events()
        .into_iter()
        .filter(|e| {
            matches!(
                e,
                PresentationEvent::RequestBackoff {
                    reason: FailureKind::Transient,
                    wait_ms: 3000,
                    ..
                }
            )
        })
        .count();
    assert_eq!(error_pauses, 3);
}

#[tokio::test]
async fn no_spacing_after_the_last_scene() {
    let pacing = PacingConfig {
        scene_spacing_ms: 500,
        ..PacingConfig::default()
    };
    let h = harness_with_pacing(ScriptedGateway::new(), pacing);

    h.orchestrator.start_run("clouds").await.unwrap();

    assert_eq!(h.sleeper.waits_ms(), vec![500; 19]);
}

#[tokio::test]
async fn scenes_never_overlap() {
    let h = harness(ScriptedGateway::new().script_scene(
        3,
        vec![Err(GatewayError::rate_limited("busy"))],
    ));

    h.orchestrator.start_run("trains").await.unwrap();

    assert_eq!(h.gateway.max_scenes_in_flight(), 1);
    let calls = h.gateway.scene_calls();
    assert!(calls.windows(2).all(|w| w[0] <= w[1]));
}
