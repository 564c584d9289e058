//! Dataset generation runs.

pub mod frame_runner;

pub use frame_runner::{
    frame_stem, FrameError, FrameGenerator, FramePlan, FrameRecord, FrameState,
    GenerationSummary, SunPlan, MANIFEST_FILE,
};
