//! Seeded parameter generation for the floating sphere and bubble fields
//!
//! Both generators are pure: the same seed and count always produce the same
//! parameters, so a scene can be reproduced exactly from its seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// Number of matcap textures a sphere can pick from
pub const MATCAP_COUNT: usize = 8;

/// Side length of the cube the spheres are scattered in
const SPHERE_FIELD_EXTENT: f32 = 25.0;

/// Per-sphere parameters for the background field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SphereParams {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: f32,
    /// Rotation added every frame, per axis
    pub spin: [f32; 3],
    pub float_speed: f32,
    pub float_amplitude: f32,
    pub matcap_index: usize,
}

/// Per-bubble parameters for the ring around the headline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BubbleParams {
    pub position: [f32; 3],
    pub scale: f32,
    pub float_speed: f32,
    pub float_amplitude: f32,
    pub spin: f32,
}

/// Uniform value in [-half, half)
fn centered(rng: &mut StdRng, half: f32) -> f32 {
    rng.random_range(-half..half)
}

pub fn generate_sphere_params(seed: u64, count: usize) -> Vec<SphereParams> {
    let mut rng = StdRng::seed_from_u64(seed);
    let half = SPHERE_FIELD_EXTENT * 0.5;

    (0..count)
        .map(|_| {
            let position = [
                centered(&mut rng, half),
                centered(&mut rng, half),
                centered(&mut rng, half),
            ];
            let rotation = [rng.random_range(0.0..PI), rng.random_range(0.0..PI), 0.0];
            SphereParams {
                position,
                rotation,
                scale: rng.random_range(0.5..2.0),
                spin: [
                    centered(&mut rng, 0.01),
                    centered(&mut rng, 0.01),
                    centered(&mut rng, 0.01),
                ],
                float_speed: rng.random_range(0.005..0.015),
                float_amplitude: rng.random_range(1.0..3.0),
                matcap_index: rng.random_range(0..MATCAP_COUNT),
            }
        })
        .collect()
}

/// Bubbles are spread evenly around a ring with a random radius each
pub fn generate_bubble_params(seed: u64, count: usize) -> Vec<BubbleParams> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..count)
        .map(|i| {
            let radius = rng.random_range(2.0..5.0);
            let angle = (i as f32 / count as f32) * TAU;
            let y = centered(&mut rng, 2.0);
            BubbleParams {
                position: [angle.cos() * radius, y, angle.sin() * radius],
                scale: rng.random_range(0.5..2.0),
                float_speed: rng.random_range(0.5..1.5),
                float_amplitude: rng.random_range(0.3..0.8),
                spin: centered(&mut rng, 0.01),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_spheres() {
        assert_eq!(generate_sphere_params(7, 20), generate_sphere_params(7, 20));
    }

    #[test]
    fn test_different_seeds_differ() {
        assert_ne!(generate_sphere_params(1, 5), generate_sphere_params(2, 5));
        assert_ne!(generate_bubble_params(1, 5), generate_bubble_params(2, 5));
    }

    #[test]
    fn test_sphere_ranges() {
        for p in generate_sphere_params(42, 200) {
            assert!(p.position.iter().all(|v| (-12.5..12.5).contains(v)));
            assert!((0.0..PI).contains(&p.rotation[0]));
            assert!((0.0..PI).contains(&p.rotation[1]));
            assert!((0.5..2.0).contains(&p.scale));
            assert!(p.spin.iter().all(|v| v.abs() <= 0.01));
            assert!((0.005..0.015).contains(&p.float_speed));
            assert!((1.0..3.0).contains(&p.float_amplitude));
            assert!(p.matcap_index < MATCAP_COUNT);
        }
    }

    #[test]
    fn test_bubbles_form_a_ring() {
        let bubbles = generate_bubble_params(3, 20);
        assert_eq!(bubbles.len(), 20);

        for b in &bubbles {
            let radius = (b.position[0].powi(2) + b.position[2].powi(2)).sqrt();
            assert!((2.0 - 1e-4..5.0 + 1e-4).contains(&radius));
            assert!((-2.0..2.0).contains(&b.position[1]));
            assert!((0.3..0.8).contains(&b.float_amplitude));
        }

        // First bubble sits on the +x axis
        assert!(bubbles[0].position[2].abs() < 1e-6);
        assert!(bubbles[0].position[0] > 0.0);
    }

    #[test]
    fn test_zero_count_is_empty() {
        assert!(generate_sphere_params(1, 0).is_empty());
        assert!(generate_bubble_params(1, 0).is_empty());
    }
}
