//! Small helpers shared by the parsers and report writers.

pub mod validation;
