//! Records of training and evaluation metrics.
//!
//! A [`Record`] is a bag of named values. Environments return one per step,
//! agents return one per optimization step, and evaluators return one per
//! evaluation run. The [`Trainer`](crate::Trainer) merges them and hands them
//! to an [`AggregateRecorder`], which may keep them in memory
//! ([`BufferedRecorder`]) or drop them ([`NullRecorder`]).
//!
//! ```rust
//! use radio_rl_core::record::{Record, RecordValue};
//!
//! let mut record = Record::from_scalar("reward", -1.5);
//! record.insert("current_users", RecordValue::Scalar(12.0));
//! assert_eq!(record.get_scalar("reward").unwrap(), -1.5);
//! ```
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::AggregateRecorder;
pub use storage::RecordStorage;
