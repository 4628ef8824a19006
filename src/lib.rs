//! ZackWeg listing client core.
//!
//! The interesting part lives in [`application::uploads`]: a per-form image
//! upload orchestrator that runs one task per image, tracks each item's state
//! and gates listing submission until every selected image is uploaded.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod util;
