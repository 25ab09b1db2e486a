//! Types and traits for recording training metrics.
//!
//! A [`Record`] is a set of key-value pairs emitted by environments, agents and the
//! [`Trainer`](crate::Trainer). Records are handed to a [`Recorder`], which either
//! writes them immediately or stores them and writes aggregated values on
//! [`Recorder::flush`].
//!
//! ```rust
//! use classic_rl_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("episode", RecordValue::Scalar(1.0));
//! record.insert("episode_return", RecordValue::Scalar(21.0));
//! record.insert("obs", RecordValue::Array1(vec![0.1, 0.2, 0.3, 0.4]));
//! assert_eq!(record.get_scalar("episode_return").unwrap(), 21.0);
//! ```
mod base;
mod buffered_recorder;
mod log_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use log_recorder::LogRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
pub use storage::RecordStorage;
