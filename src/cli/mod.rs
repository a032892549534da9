//! CLI infrastructure for the `qttt` binary
//!
//! This module provides the command-line interface for training, playing
//! against, and inspecting saved agents.

pub mod commands;
pub mod output;
