//! # galley
//!
//! A bounded admission queue shared by a pool of requesters and a pool of
//! workers.
//!
//! Requesters build [`WorkItem`]s and try to get them admitted into an
//! [`AdmissionQueue`] within a deadline. If the queue stays full for too
//! long they abandon the item and try again later. Workers take admitted
//! items in arrival order, run a [`Work`] function on them, and write a
//! [`Delivery`] into the item's reply slot. The [`Coordinator`] starts both
//! pools, waits for every requester to finish, closes the queue, and lets the
//! workers drain what was admitted.
//!
//! ```
//! use core::time::Duration;
//! use galley::{Coordinator, PipelineConfig, SimulatedWork, Simulator};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> galley::Result<()> {
//! let config = PipelineConfig {
//!     work_base: Duration::ZERO,
//!     consume_base: Duration::ZERO,
//!     abandon_base: Duration::ZERO,
//!     ..PipelineConfig::default()
//! };
//! let work = SimulatedWork::new(Simulator::instant(), config.work_base);
//!
//! let report = Coordinator::new(config, work)
//!     .with_simulator(Simulator::instant())
//!     .run()
//!     .await?;
//!
//! assert_eq!(report.stats.completed, 50);
//! assert!(report.high_water_mark <= report.capacity);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `tracing`: structured log events for every state change.
//! - `serde`: `Serialize`/`Deserialize` for ids and reports.
//! - `cache-padded`: pads the shared id counter to a cache line.

mod config;
mod coordinator;
mod error;
mod id;
mod item;
mod queue;
pub mod reply;
mod requester;
mod stats;
mod work;
mod worker;

pub use crate::config::*;
pub use crate::coordinator::*;
pub use crate::error::*;
pub use crate::id::*;
pub use crate::item::*;
pub use crate::queue::*;
pub use crate::reply::{PendingReply, Responder};
pub use crate::requester::*;
pub use crate::stats::*;
pub use crate::work::*;
pub use crate::worker::*;
