//! Headless frame loop
//!
//! Ticks the scene at the configured rate. Before each frame it applies any
//! updates sent by the font continuations, then advances the scene to the
//! elapsed time.

use anyhow::Result;
use bloom_core::{SceneContext, SceneUpdate};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::RenderConfig;

/// Apply pending updates and advance the scene one frame
pub fn step(
    scene: &mut SceneContext,
    updates: &mut mpsc::UnboundedReceiver<SceneUpdate>,
    elapsed: f32,
) {
    while let Ok(update) = updates.try_recv() {
        debug!(?update, "Applying scene update");
        scene.apply(update);
    }
    scene.update(elapsed);
}

/// Run frames until the frame budget is spent or Ctrl-C is pressed.
///
/// Returns the number of frames rendered.
pub async fn run(
    scene: &mut SceneContext,
    mut updates: mpsc::UnboundedReceiver<SceneUpdate>,
    render: &RenderConfig,
) -> Result<u64> {
    let fps = render.fps.max(1);
    let mut ticker = interval(Duration::from_secs_f64(1.0 / fps as f64));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(fps = fps, frames = render.frames, "Starting frame loop");

    let start = Instant::now();
    let mut frame: u64 = 0;

    loop {
        if render.frames != 0 && frame >= render.frames {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }

        let elapsed = start.elapsed().as_secs_f32();
        step(scene, &mut updates, elapsed);
        frame += 1;

        if frame % fps as u64 == 0 {
            debug!(
                frame = frame,
                elapsed = elapsed,
                headline = scene.headline.is_some(),
                "Frame"
            );
        }
    }

    info!(frames = frame, elapsed = start.elapsed().as_secs_f32(), "Frame loop finished");
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloom_core::{generate_sphere_params, Headline};

    #[test]
    fn test_step_applies_pending_updates_first() {
        let mut scene = SceneContext::new(generate_sphere_params(1, 2));
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(SceneUpdate::Placeholder).unwrap();

        step(&mut scene, &mut rx, 1.0);

        let headline = scene.headline.as_ref().unwrap();
        assert!(matches!(headline, Headline::Placeholder { .. }));
        // Animated in the same frame it was installed
        assert!((headline.transform().rotation[0] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_step_without_updates() {
        let mut scene = SceneContext::new(Vec::new());
        let (_tx, mut rx) = mpsc::unbounded_channel();

        step(&mut scene, &mut rx, 2.0);

        assert!(scene.headline.is_none());
        assert!((scene.group_rotation_y - 0.1).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_run_stops_after_frame_budget() {
        let mut scene = SceneContext::new(Vec::new());
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(SceneUpdate::Placeholder).unwrap();
        let render = RenderConfig { fps: 240, frames: 5 };

        let frames = run(&mut scene, rx, &render).await.unwrap();

        assert_eq!(frames, 5);
        assert!(scene.headline.is_some());
    }
}
