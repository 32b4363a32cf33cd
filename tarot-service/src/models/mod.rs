//! Domain models for the tarot service.

pub mod reading;

pub use reading::{CardReading, OverallSummary, PairedCard, ReadingRequest, ReadingResult};
