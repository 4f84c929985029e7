//! Filter-and-aggregate pipeline behind the producer dashboard.
//!
//! The viewer binary (`src/main.rs`) only renders what this library
//! computes: a loaded [`data::RecordStore`], filtered with
//! [`data::FilterCriteria`] built from the sidebar, summed into an
//! [`data::Aggregation`] for the bar chart, and turned into map markers.

pub mod config;
pub mod data;
