//! facegate-engine — Orchestration of the capture → detect → match flow.
//!
//! Owns the scan loop that feeds camera frames through the detector
//! into the scan-state machine, and the identify/register flows built
//! on top of it. Every outcome, including timeouts and hardware
//! failures, leaves this crate as a structured [`OperationResult`];
//! nothing propagates as an unhandled fault past the capture loop.

pub mod config;
pub mod engine;
pub mod result;

pub use config::Config;
pub use engine::{run_scan, Candidate, Engine, EngineError, NullObserver, ScanObserver, ScanOutcome};
pub use result::{Operation, OperationResult};
