//! Scene update context - the state the frame loop animates
//!
//! The font continuations install the headline (and bubble ring) here, and
//! the frame loop receives the context by `&mut` every frame.

use serde::Serialize;

use crate::font::TextBounds;
use crate::particles::{BubbleParams, SphereParams};

/// Green used for the headline and its placeholder
pub const HEADLINE_COLOR: u32 = 0x00ff88;

/// Box shown when no font could be loaded
pub const PLACEHOLDER_SIZE: [f32; 3] = [1.0, 0.5, 0.1];

/// Base uniform scale of the headline
const HEADLINE_SCALE: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

impl Transform {
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn set_uniform_scale(&mut self, s: f32) {
        self.scale = [s; 3];
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloatingSphere {
    pub params: SphereParams,
    pub transform: Transform,
}

impl FloatingSphere {
    pub fn new(params: SphereParams) -> Self {
        let transform = Transform {
            position: params.position,
            rotation: params.rotation,
            scale: [params.scale; 3],
        };
        Self { params, transform }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bubble {
    pub params: BubbleParams,
    pub transform: Transform,
}

impl Bubble {
    pub fn new(params: BubbleParams) -> Self {
        let mut transform = Transform::at(params.position);
        transform.set_uniform_scale(params.scale);
        Self { params, transform }
    }
}

/// The centerpiece: real text when the font loaded, a box otherwise
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Headline {
    Text {
        transform: Transform,
        bounds: TextBounds,
        /// Translation baked into the geometry to center it
        offset: [f32; 3],
    },
    Placeholder {
        transform: Transform,
        size: [f32; 3],
    },
}

impl Headline {
    pub fn transform(&self) -> &Transform {
        match self {
            Headline::Text { transform, .. } | Headline::Placeholder { transform, .. } => transform,
        }
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        match self {
            Headline::Text { transform, .. } | Headline::Placeholder { transform, .. } => transform,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Headline::Placeholder { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointLight {
    pub color: u32,
    pub intensity: f32,
    pub distance: f32,
    pub position: [f32; 3],
}

fn default_lights() -> [PointLight; 3] {
    [
        PointLight {
            color: HEADLINE_COLOR,
            intensity: 1.0,
            distance: 15.0,
            position: [-5.0, 3.0, 5.0],
        },
        PointLight {
            color: 0x4ecdc4,
            intensity: 1.0,
            distance: 15.0,
            position: [5.0, -3.0, -5.0],
        },
        PointLight {
            color: 0xf9ca24,
            intensity: 0.8,
            distance: 12.0,
            position: [0.0, 5.0, 0.0],
        },
    ]
}

/// Change delivered to the frame loop by the font continuations
#[derive(Debug, Clone, PartialEq)]
pub enum SceneUpdate {
    Text {
        bounds: TextBounds,
        bubbles: Vec<BubbleParams>,
    },
    Placeholder,
}

/// Everything the frame loop animates
#[derive(Debug, Clone, Serialize)]
pub struct SceneContext {
    pub spheres: Vec<FloatingSphere>,
    pub group_rotation_y: f32,
    pub headline: Option<Headline>,
    pub bubbles: Option<Vec<Bubble>>,
    pub lights: [PointLight; 3],
}

impl SceneContext {
    pub fn new(spheres: Vec<SphereParams>) -> Self {
        Self {
            spheres: spheres.into_iter().map(FloatingSphere::new).collect(),
            group_rotation_y: 0.0,
            headline: None,
            bubbles: None,
            lights: default_lights(),
        }
    }

    /// Install loaded text and the bubble ring that accompanies it
    pub fn install_text(&mut self, bounds: TextBounds, bubbles: Vec<BubbleParams>) {
        let mut transform = Transform::default();
        transform.set_uniform_scale(HEADLINE_SCALE);
        self.headline = Some(Headline::Text {
            transform,
            offset: bounds.centering_offset(),
            bounds,
        });
        self.bubbles = Some(bubbles.into_iter().map(Bubble::new).collect());
    }

    /// Install the degraded stand-in; no bubbles accompany it
    pub fn install_placeholder(&mut self) {
        self.headline = Some(Headline::Placeholder {
            transform: Transform::default(),
            size: PLACEHOLDER_SIZE,
        });
    }

    pub fn apply(&mut self, update: SceneUpdate) {
        match update {
            SceneUpdate::Text { bounds, bubbles } => self.install_text(bounds, bubbles),
            SceneUpdate::Placeholder => self.install_placeholder(),
        }
    }

    /// Advance every animated object to `elapsed` seconds since start
    pub fn update(&mut self, elapsed: f32) {
        self.group_rotation_y = elapsed * 0.05;

        for (index, sphere) in self.spheres.iter_mut().enumerate() {
            let phase = index as f32;
            let p = &sphere.params;
            let t = &mut sphere.transform;
            for axis in 0..3 {
                t.rotation[axis] += p.spin[axis];
            }
            t.position[1] = p.position[1] + (elapsed * p.float_speed + phase).sin() * p.float_amplitude;
            t.position[0] = p.position[0] + (elapsed * 0.01 + phase).sin() * 0.5;
            t.position[2] = p.position[2] + (elapsed * 0.01 + phase).cos() * 0.5;
        }

        if let Some(headline) = &mut self.headline {
            let t = headline.transform_mut();
            t.rotation[0] = elapsed * 0.3;
            t.position[1] = (elapsed * 1.2).sin() * 0.5;
            t.set_uniform_scale(HEADLINE_SCALE + (elapsed * 0.5).sin() * 0.2);
        }

        if let Some(bubbles) = &mut self.bubbles {
            for (index, bubble) in bubbles.iter_mut().enumerate() {
                let p = &bubble.params;
                let t = &mut bubble.transform;
                t.position[1] =
                    p.position[1] + (elapsed * p.float_speed + index as f32).sin() * p.float_amplitude;
                t.rotation[0] += p.spin;
                t.rotation[1] += p.spin * 0.7;
                t.rotation[2] += p.spin * 0.3;
            }
        }

        let [first, second, third] = &mut self.lights;
        first.position[0] = -5.0 + (elapsed * 0.4).sin() * 2.0;
        first.position[2] = 5.0 + (elapsed * 0.4).cos() * 2.0;
        second.position[0] = 5.0 + (elapsed * 0.3).sin() * 1.5;
        second.position[2] = -5.0 + (elapsed * 0.3).cos() * 1.5;
        third.position[1] = 5.0 + (elapsed * 0.6).sin();
    }
}
