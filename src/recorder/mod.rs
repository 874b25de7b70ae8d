//! Recording module - captures a command's terminal output over time
//!
//! # Structure
//!
//! - [`timing`] - idle-capping timing model
//! - [`session`] - session lifecycle and the poll/read capture loop

mod session;
mod timing;

pub use session::{
    interrupted, request_stop, setup_ctrlc_handler, RecordOptions, Session,
};
pub use timing::{cap_intervals, RawEvent};
