//! Thin HTTP clients for the three remote surfaces the dashboard depends on:
//! the camera server, the shot-detection inference API, and the coaching
//! service. Failures here are local and non-fatal; callers turn them into
//! empty results or logged warnings.

pub mod camera;
pub mod coaching;
pub mod inference;

pub use camera::{CameraClient, CameraFrame};
pub use coaching::CoachingClient;
pub use inference::{InferenceClient, InferenceResult, Prediction};
