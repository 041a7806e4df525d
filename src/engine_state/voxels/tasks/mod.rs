//! # Voxel Task System
//!
//! This module contains tasks related to voxel world generation and processing.
//! These tasks are processed on worker threads to keep the frame loop smooth
//! while the actor crosses chunk borders and edits the world.

pub mod chunk_generation_task;
pub mod populated_blocks_task;
