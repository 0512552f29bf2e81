//! Prometheus counters for the request pipeline.
//!
//! Everything lives in a private registry owned by [`Metrics`]; the CLI
//! prints it with `--metrics`, embedders can scrape `render()` themselves.

mod recorder;

pub use recorder::{Metrics, MetricsRecorder};
