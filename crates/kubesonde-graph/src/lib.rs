//! Probe snapshot → connectivity graph engine. Everything here is synchronous
//! and works on owned copies of its inputs.

pub mod cleanup;
pub mod cluster;
pub mod color;
mod error;
pub mod explorer;
pub mod filter;
pub mod merge;
pub mod metrics;
pub mod netstat;
pub mod normalize;
pub mod ports;
pub mod table;

#[cfg(test)]
mod fixtures;

pub use cleanup::cleanup_probe_output;
pub use cluster::{cluster_all, cluster_selected, deployments};
pub use color::{build_color_map, colored, ColorMap, Palette, SeededPalette};
pub use error::ExplorerError;
pub use explorer::Explorer;
pub use merge::{merge_edges, merge_simple_edges};
pub use metrics::compute_metrics;
pub use normalize::{error_logs, normalize, pod_ip_mapping};
pub use ports::ports_report;
