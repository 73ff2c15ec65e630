//! starmap: the data-to-screen core shared by the star map visualisers.
//!
//! - Loads point catalogues (HTTP, file, directory) or synthesises a seeded
//!   stand-in when the catalogue is unavailable.
//! - Resolves sparse records once, with documented per-field fallbacks.
//! - Projects every record into four 2D layouts in NDC (Sky, Scatter,
//!   Galactic, Histogram) and packs them into immutable render buffers.
//! - Drives the per-frame transition between layouts from a declarative phase
//!   schedule, or from user input through the interaction controller.
//! - Provides the seeded curl-noise field and particle system used by the
//!   flow-field variant.
//!
//! Nothing here touches a GPU or a window; the viewer crate uploads
//! [`buffers::RenderBuffers`] once and feeds [`frame::FrameUniforms`] every frame.

pub mod animation;
pub mod buffers;
pub mod camera;
pub mod easing;
pub mod error;
pub mod flow;
pub mod frame;
pub mod galactic;
pub mod layout;
pub mod loader;
pub mod noise;
pub mod palette;
pub mod record;
pub mod scheduler;
pub mod synth;
pub mod transition;

pub use animation::{AnimationState, FrameView};
pub use buffers::{RenderBuffers, StarInstance};
pub use camera::{CameraState, ControlMode, InteractionController};
pub use error::{BufferError, DataError, ScheduleError};
pub use frame::FrameUniforms;
pub use layout::{Layout, LayoutKind, LayoutSet};
pub use loader::{DataSource, Dataset, LoadOptions};
pub use record::{PointRecord, ResolvedPoint};
pub use scheduler::{DeviceClass, Phase, PhaseSchedule};
pub use transition::{LayoutWeights, TransitionState};
