//! Pipes growing through a bounded integer lattice.
//!
//! A [`Field`] spawns pipes at free random cells. Each [`Pipe`] walks the
//! [`Lattice`] in straight runs with occasional right-angle turns, claiming every
//! cell it enters, and stops for good once it is boxed in. Segments are handed
//! to a [`SegmentSink`] as they are created and destroyed again, oldest first,
//! once they outlive the configured lifetime.
//!
//! The host owns the clock: call [`Field::update`] once per frame with the
//! current time in seconds.

pub mod color;
pub mod config;
pub mod direction;
pub mod error;
pub mod field;
pub mod geometry;
pub mod lattice;
pub mod pipe;
pub mod schedule;
pub mod sink;

pub use color::PipeColor;
pub use config::PipesConfig;
pub use direction::{Dir, TurnOrder};
pub use error::ConfigError;
pub use field::{Field, FieldStats, FrameReport, SpawnOutcome};
pub use lattice::{GridCell, Lattice, MAX_GRID_SIZE};
pub use pipe::{GrowthCtx, Pipe, PipeId, PipeState, Segment, StepOutcome};
pub use schedule::Timer;
pub use sink::{EventLog, Scene, SegmentHandle, SegmentKind, SegmentSink, SegmentVisual, SinkEvent};
