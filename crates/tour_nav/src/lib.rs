//! Grid-stepped viewpoint navigation for panoramic tours.
//!
//! Authored viewpoints are indexed on a regular grid. A [`TourController`]
//! turns keyboard, mouse and touch input into one of four intents per frame:
//!
//! - discrete steps to a neighbouring cell, relative to the camera heading
//! - look-drag rotation with clamped pitch
//! - pinch or wheel zoom, clamping the field of view
//! - tap-to-move, casting through the pointer into the scene
//!
//! Switching viewpoints overlaps the old and new node briefly, plays a blur
//! pulse through a [`ParameterSink`] and glides the camera to the new cell
//! center. Scene queries go through the host's [`Raycaster`].

pub mod camera;
pub mod controller;
pub mod device;
pub mod error;
pub mod gesture;
pub mod grid;
pub mod hover;
pub mod input;
pub mod node;
pub mod pulse;
pub mod scene;
pub mod settings;
pub mod views;

pub use camera::{CameraMotion, CameraPose, CameraSettings};
pub use controller::{TourController, TourParts};
pub use device::{classify_device, DeviceClass, DeviceProbe, DeviceProbeError};
pub use error::TourError;
pub use gesture::{GesturePhase, GestureSettings};
pub use grid::{GridCell, GridIndex, GridLayout, GridPlane};
pub use hover::{HoverProbe, HoverSettings, HoverTarget, SurfaceMarker};
pub use input::{ButtonSample, GestureEvent, InputFrame, MouseSample, TouchPhase, TouchPoint};
pub use node::{MaterialId, NodeId, ViewpointNode, Viewpoints};
pub use pulse::{ParameterSink, PulseSettings, TransitionPulse};
pub use scene::{LayerMask, Ray, RayHit, Raycaster};
pub use settings::TourSettings;
pub use views::ViewSwitcher;
