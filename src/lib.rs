//! Spatial audio guidance engine for golf swing coaching.
//!
//! Live position/alignment/tempo deviations feed a periodic decision
//! loop; at most one correction per tick becomes a synthesized cue,
//! which is panned to its direction, shaded by a small HRTF bank, run
//! through the environment effects profile, and written to the output
//! sink as PCM16.

pub mod audio;
pub mod controller;
pub mod error;
pub mod events;
pub mod output;
pub mod state;

pub use controller::{
    evaluate, EngineConfig, GuidanceController, OverlapPolicy, ALIGNMENT_TOLERANCE,
    POSITION_TOLERANCE, TEMPO_TOLERANCE,
};
pub use error::{EngineError, SinkError};
pub use events::{CueLabel, GuidanceEvent, GuidanceKind};
pub use output::{CpalSink, MemorySink, OutputSink, SinkSpec};
pub use state::{EngineStats, Environment, GuidanceState, Orientation, Position3D};
