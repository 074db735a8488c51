//! Camera input for the companion.
//!
//! A [`Camera`] yields [`Frame`]s one at a time; the controller polls
//! [`Camera::next_frame`] and decides which frames are worth the cost of
//! inference.

pub mod camera;
pub mod frame;

pub use camera::{Camera, CameraError, GlobCamera};
pub use frame::{mean_abs_delta, Frame};
