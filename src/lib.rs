//! A small blocking Rust client for the ClimaCell weather API (v3).
//!
//! Each endpoint method sends one GET request and returns a
//! [`ClimacellResponse`]: the status and body exactly as received, plus a
//! [`ClimacellResponse::data`] decoder that turns the body into typed views.
//!
//! ## Quick start
//! - Pass an API key to [`Client::new`], or configure it via environment
//!   variables (`CLIMACELL_KEY`, optionally `CLIMACELL_URL`) or a
//!   `.climacellrc` file and call [`Client::from_env`].
//! - Unit systems are metric ([`UnitSystem::Si`]) unless asked otherwise.
//!
//! ```no_run
//! use anyhow::Result;
//! use climacell::{Client, Location, ResponseData, UnitSystem};
//!
//! fn main() -> Result<()> {
//!     let client = Client::from_env()?;
//!     let response = client.realtime(
//!         Location::new(42.36, -71.06),
//!         &["temp", "wind_gust"],
//!         UnitSystem::Us,
//!     )?;
//!
//!     match response.data()? {
//!         ResponseData::Observation(obs) => {
//!             for (field, m) in obs.measurements()? {
//!                 println!("{}: {:?} {:?}", field, m.value, m.units);
//!             }
//!         }
//!         ResponseData::Error(e) => eprintln!("{:?}: {:?}", e.error_code, e.error_message),
//!         _ => {}
//!     }
//!     Ok(())
//! }
//! ```
//!
//! API errors (any status other than 200) are data, not Rust errors: they
//! decode to [`ResponseData::Error`]. A 200 response that lacks a requested
//! field or carries a malformed timestamp is a [`DecodeError`].

#![forbid(unsafe_code)]

mod client;
mod config;
mod data;
mod error;
mod request;
mod response;
mod util;

pub use client::{Client, ClientConfig, DEFAULT_BASE_URL};
pub use data::{
    DailyMeasurement, DailyObservationData, ErrorData, Extremum, FireIndexData, Measurement,
    MeasurementValue, ObservationData, ResponseData, Shape,
};
pub use error::DecodeError;
pub use request::{Endpoint, EndpointCall, Location, TimeBound, TimeWindow, UnitSystem};
pub use response::ClimacellResponse;
