//! Bloom Core - Resource fallback loading and scene update state
//!
//! This crate provides the pieces of the Bloom scene that do not depend on a
//! renderer:
//! - A fallback loader that tries candidate sources in order and degrades
//!   gracefully when all of them fail
//! - Typeface font parsing and text measurement
//! - Seeded parameter generation for the sphere and bubble fields
//! - The scene context animated by the frame loop
//! - An on-disk cache for fetched resources

pub mod animation;
pub mod cache;
pub mod error;
pub mod font;
pub mod loader;
pub mod particles;
pub mod request;

pub use animation::{Headline, SceneContext, SceneUpdate, Transform};
pub use cache::{sha256_hex, ResourceCache};
pub use error::{AcquisitionError, CacheError, FontError, RequestError};
pub use font::{measure_text, TextBounds, TextStyle, TypefaceFont};
pub use loader::{
    Acquire, AcquireEvent, AttemptOutcome, AttemptRecord, FallbackLoader, LoadObserver, LoadReport,
    Progress, TracingObserver,
};
pub use particles::{generate_bubble_params, generate_sphere_params, BubbleParams, SphereParams};
pub use request::{RequestState, ResourceRequest, SourceId};
