//! Audio preprocessing modules
//!
//! This module contains utilities for preparing decoded audio for analysis:
//! - Channel mixing (multi-channel to mono)
//! - Sample-rate conversion

pub mod channel_mixer;
pub mod resample;
