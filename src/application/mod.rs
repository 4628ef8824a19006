//! Application services: the listing forms and the upload orchestration
//! they depend on.

pub mod error;
pub mod listings;
pub mod ports;
pub mod uploads;
