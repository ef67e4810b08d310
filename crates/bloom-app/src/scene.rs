//! Scene assembly - wires the font fallback chain into the scene context
//!
//! The headline font is loaded in the background while the frame loop is
//! already running. Its two continuations never touch the scene directly:
//! they send a [`SceneUpdate`] to the frame loop, which owns the scene.

use bloom_core::{
    generate_bubble_params, generate_sphere_params, measure_text, Acquire, FallbackLoader,
    LoadObserver, LoadReport, SceneContext, SceneUpdate, TypefaceFont,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::Config;

/// Seeds for the two particle fields derived from one scene seed
pub fn field_seeds(seed: u64) -> (u64, u64) {
    (seed, seed.wrapping_add(1))
}

/// Scene with the sphere field in place and no headline yet
pub fn initial_scene(config: &Config, seed: u64) -> SceneContext {
    let (sphere_seed, _) = field_seeds(seed);
    SceneContext::new(generate_sphere_params(sphere_seed, config.scene.sphere_count))
}

/// Start loading the headline font; the outcome arrives on `updates`
pub fn spawn_headline_load<A, O>(
    loader: &Arc<FallbackLoader<A, O>>,
    config: &Config,
    seed: u64,
    updates: mpsc::UnboundedSender<SceneUpdate>,
) -> JoinHandle<LoadReport>
where
    A: Acquire<Resource = TypefaceFont> + 'static,
    O: LoadObserver + 'static,
{
    let text = config.font.text.clone();
    let style = config.font.text_style();
    let (_, bubble_seed) = field_seeds(seed);
    let bubble_count = config.scene.bubble_count;
    let fallback_updates = updates.clone();

    loader.spawn_load(
        config.font.candidates(),
        move |font| {
            let bounds = measure_text(&font, &text, &style);
            info!(
                family = %font.family_name,
                width = bounds.size()[0],
                "Headline text created"
            );
            let bubbles = generate_bubble_params(bubble_seed, bubble_count);
            if updates.send(SceneUpdate::Text { bounds, bubbles }).is_err() {
                debug!("Frame loop finished before the font arrived");
            }
        },
        move || {
            info!("Showing placeholder headline");
            if fallback_updates.send(SceneUpdate::Placeholder).is_err() {
                debug!("Frame loop finished before the fallback was installed");
            }
        },
    )
}
