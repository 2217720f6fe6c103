//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`LandfallError`] covers the failure modes that can
//! abort initialization of an intro sequence:
//! - Surface / renderer creation failures reported by the host
//! - GPU adapter and device failures (wgpu backend)
//! - Geometry allocation failures while the scene is being built
//! - Invalid configuration
//!
//! Misuse of the lifecycle (double start, tick after completion, repeated
//! teardown) is never reported through this type: those calls are absorbed
//! as logged no-ops.
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, LandfallError>`.
//!
//! ```rust,ignore
//! use landfall::errors::{LandfallError, Result};
//!
//! fn create() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the intro sequencer.
#[derive(Error, Debug)]
pub enum LandfallError {
    // ========================================================================
    // Host & Surface Errors
    // ========================================================================
    /// The host could not create a rendering surface or renderer.
    #[error("Failed to create rendering surface: {0}")]
    SurfaceCreation(String),

    /// The mount point reported a viewport with a zero dimension.
    #[error("Invalid viewport: {width}x{height}")]
    InvalidViewport {
        /// Reported width in pixels
        width: u32,
        /// Reported height in pixels
        height: u32,
    },

    // ========================================================================
    // GPU Errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[cfg(feature = "wgpu-renderer")]
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    /// The backend refused to allocate a geometry while the scene was built.
    #[error("GPU allocation failed for '{label}': {reason}")]
    GpuAllocation {
        /// Label of the geometry that failed
        label: String,
        /// Backend supplied reason
        reason: String,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Settings failed validation.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Settings document could not be parsed.
    #[error("Config parse error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Alias for `Result<T, LandfallError>`.
pub type Result<T> = std::result::Result<T, LandfallError>;
