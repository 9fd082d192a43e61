//! Scenes implemented directly against the **Scene** interface.
//!
//! - AnalyticScene

pub mod analytic;
