//! Shared components for the synthetic-imagery generator and validator.
//!
//! Holds the placement math, orientation helpers and pixel buffer I/O that
//! both the `simulator` and `validator` crates build on.

pub mod algo;
pub mod image_proc;
pub mod run_args;
pub mod vec3_arg;
