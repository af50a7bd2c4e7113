//! Summary generation.
//!
//! Local summarizers ([`percentage`], [`ranking`], [`fallback`]) are pure
//! functions; [`service::SummaryService`] adds the optional AI summarizer and
//! the time budgets used by the upload pipeline.

pub mod abstractive;
pub mod fallback;
pub mod multilingual;
pub mod percentage;
pub mod ranking;
pub mod service;

pub use service::{SummaryPair, SummaryService};
