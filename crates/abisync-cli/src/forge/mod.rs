//! Forge trace and artifact handling
//!
//! This module provides:
//! - Locating broadcast (trace) files for a deployment script
//! - Parsing broadcast files into the typed trace model
//! - Loading and merging ABIs from forge build output
//!
//! # Traits
//!
//! - [`TraceParser`] - For decoding trace files
//! - [`ArtifactLoader`] - For loading contract ABIs from various sources
//!
//! # Implementations
//!
//! - [`TraceLocator`] - Finds trace files in flat and per-chain layouts
//! - [`ForgeTraceParser`] - Parses forge script broadcast files
//! - [`FileSystemArtifactLoader`] - Loads ABIs from forge build output on disk

mod artifact;
mod broadcast;
mod locator;
mod types;

// Re-export traits
pub use artifact::ArtifactLoader;
pub use broadcast::TraceParser;

// Re-export implementations
pub use artifact::FileSystemArtifactLoader;
pub use broadcast::ForgeTraceParser;
pub use locator::{script_dir_name, TraceFile, TraceLocator, DEFAULT_TRACE_FILE};
