//! `dealerflow` - Vehicle workflow tracking for a car dealership
//!
//! Each vehicle carries a fixed four-step reconditioning checklist and a set
//! of per-stage status fields, stored as documents. Screens load a vehicle,
//! merge its stored checklist with the template, apply edits locally and
//! write the whole record back.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod auth;
pub mod checklist;
pub mod cli;
pub mod config;
pub mod error;
pub mod forms;
pub mod logging;
pub mod navigation;
pub mod organization;
pub mod process;
pub mod registry;
pub mod storage;
pub mod vehicle;
pub mod vin;

pub use auth::{Role, Session, SessionManager};
pub use checklist::{Step, Task};
pub use config::Config;
pub use error::{Error, Result};
pub use forms::{Stage, StageForm};
pub use logging::init_logging;
pub use navigation::Screen;
pub use process::{CarDetail, ProcessState};
pub use storage::{DocumentStore, SqliteStore, StoreStats};
pub use vehicle::{VehicleField, VehicleRecord};
