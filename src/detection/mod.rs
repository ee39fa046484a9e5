/// This module contains the beat detection stages of the pipeline.
///
/// The available submodules are:
///
/// - `peaks`: Finds heartbeat peaks in a filtered waveform.
/// - `rr`: Converts peak indices into RR intervals.
pub mod peaks;
pub mod rr;
