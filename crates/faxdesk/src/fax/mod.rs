//! Domain types for ingested faxes and their review state.

pub mod category;
pub mod record;
pub mod status;

pub use category::{CategoryInfo, FaxCategory};
pub use record::{FaxRecord, FeedbackRecord, NewFax, NewFeedback};
pub use status::FaxStatus;
