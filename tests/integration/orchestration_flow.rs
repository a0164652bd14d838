//! End-to-end runs against the scripted gateway.

use crate::integration::test_utils::{harness, harness_with_pacing};
use storyloom::gateway::{GatewayCall, ImagePayload, ScriptedGateway};
use storyloom::pacing::PacingConfig;
use storyloom::scene::ImageState;
use storyloom::sink::PresentationEvent;
use storyloom::story::{Character, SceneOutline, Story};
use storyloom::{GatewayError, Phase, StoryError};

fn position(events: &[PresentationEvent], event_type: &str) -> usize {
    events
        .iter()
        .position(|e| e.event_type() == event_type)
        .unwrap_or_else(|| panic!("missing {} event", event_type))
}

#[tokio::test]
async fn pirates_with_failed_music_reaches_done() {
    let h = harness(ScriptedGateway::new().fail_music(GatewayError::transient("no music today")));

    let report = h.orchestrator.start_run("pirates").await.unwrap();

    assert_eq!(h.orchestrator.snapshot().phase, Phase::Done);
    assert_eq!(report.failed_scenes, 0);
    assert_eq!(h.sink.count("music_unavailable"), 1);
    assert_eq!(h.sink.count("music_ready"), 0);
    assert_eq!(h.sink.count("scene_ready"), 20);
    assert_eq!(h.sink.count("run_complete"), 1);
    assert!(h
        .sink
        .events()
        .contains(&PresentationEvent::RunComplete { failed_count: 0 }));
}

#[tokio::test]
async fn events_follow_the_phase_order() {
    let h = harness(ScriptedGateway::new());

    h.orchestrator.start_run("lighthouses").await.unwrap();
    let events = h.sink.events();

    let story = position(&events, "story_ready");
    let cover = position(&events, "cover_ready");
    let music = position(&events, "music_ready");
    let first_scene = position(&events, "scene_loading");
    let complete = position(&events, "run_complete");

    assert!(story < cover && story < music);
    assert!(cover < first_scene && music < first_scene);
    assert_eq!(complete, events.len() - 1);

    let ready_order: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            PresentationEvent::SceneReady { scene_number, .. } => Some(scene_number.get()),
            _ => None,
        })
        .collect();
    assert_eq!(ready_order, (1..=20).collect::<Vec<_>>());
}

#[tokio::test]
async fn cover_and_music_requests_overlap() {
    let h = harness(ScriptedGateway::new());

    h.orchestrator.start_run("volcanoes").await.unwrap();
    let calls = h.gateway.calls();

    assert_eq!(calls[0], GatewayCall::Story("volcanoes".to_string()));
    let mut middle = calls[1..3].to_vec();
    middle.sort_by_key(|c| format!("{:?}", c));
    assert_eq!(
        middle,
        vec![
            GatewayCall::CoverImage("volcanoes".to_string()),
            GatewayCall::Music
        ]
    );
    assert_eq!(calls.len(), 23);
    assert_eq!(h.gateway.max_media_in_flight(), 2);
}

#[tokio::test]
async fn exhausted_scene_seven_degrades_without_stopping() {
    let failures = (0..3)
        .map(|_| Err(GatewayError::rate_limited("Rate limit exceeded")))
        .collect();
    let h = harness(ScriptedGateway::new().script_scene(7, failures));

    let report = h.orchestrator.start_run("pirates").await.unwrap();

    let seven = &report.scenes.slots()[6];
    assert_eq!(seven.image_state, ImageState::Failed(ImagePayload::placeholder()));
    assert!(report.scenes.slots()[7..]
        .iter()
        .all(|s| matches!(s.image_state, ImageState::Ready(_))));
    assert_eq!(report.failed_scenes, 1);
    assert!(h
        .sink
        .events()
        .contains(&PresentationEvent::RunComplete { failed_count: 1 }));
    assert_eq!(h.orchestrator.snapshot().current_scene_index, 20);
}

#[tokio::test]
async fn empty_theme_issues_no_requests() {
    for theme in ["", "   ", "\n\t"] {
        let h = harness(ScriptedGateway::new());

        let result = h.orchestrator.start_run(theme).await;

        assert!(matches!(result, Err(StoryError::Validation(_))));
        assert_eq!(h.gateway.call_count(), 0);
        assert_eq!(h.sink.events().len(), 1);
        assert_eq!(h.sink.count("validation_error"), 1);
    }
}

#[tokio::test]
async fn story_failure_renders_nothing_and_allows_a_new_run() {
    let h = harness(ScriptedGateway::new().fail_story(GatewayError::rate_limited(
        "Rate limit exceeded. Please try again later.",
    )));

    let err = h.orchestrator.start_run("pirates").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Story generation failed: Rate limit exceeded. Please try again later."
    );
    assert_eq!(h.gateway.call_count(), 1);
    assert_eq!(h.sink.count("story_ready"), 0);
    assert_eq!(h.sink.count("scene_loading"), 0);
    assert_eq!(h.orchestrator.snapshot().phase, Phase::Failed);

    h.sink.clear();
    let report = h.orchestrator.start_run("pirates").await.unwrap();
    assert_eq!(report.failed_scenes, 0);
    assert_eq!(h.orchestrator.snapshot().phase, Phase::Done);
}

#[tokio::test]
async fn short_story_is_padded_to_twenty_scenes() {
    let story = Story {
        storyline: "A brief tale.".to_string(),
        characters: vec![Character {
            name: "Mara".to_string(),
            description: "a lighthouse keeper".to_string(),
        }],
        scenes: (1..=12)
            .map(|n| SceneOutline {
                scene_number: n,
                description: format!("Beat {}", n),
                characters: vec!["Mara".to_string()],
            })
            .collect(),
    };
    let h = harness_with_pacing(ScriptedGateway::new().with_story(story), PacingConfig::default());

    let report = h.orchestrator.start_run("storms").await.unwrap();

    assert_eq!(report.scenes.len(), 20);
    assert_eq!(report.story.scenes[19].characters, vec!["Mara".to_string()]);
    assert_eq!(h.gateway.scene_calls(), (1..=20).collect::<Vec<_>>());
}

#[tokio::test]
async fn second_run_rebuilds_every_scene() {
    let h = harness(ScriptedGateway::new());

    h.orchestrator.start_run("first").await.unwrap();
    let second = h.orchestrator.start_run("second").await.unwrap();

    assert_eq!(second.scenes.ready_count(), 20);
    assert_eq!(h.gateway.scene_calls().len(), 40);
    assert_eq!(h.sink.count("run_complete"), 2);
}
