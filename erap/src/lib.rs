//! Weekly ERAP rental-assistance sync.
//!
//! Each run gets a fresh download folder from [`rotator`], pulls the payment
//! CSV into it, archives it, pushes the values to the hosted feature layer,
//! recomputes the map's color-ramp breaks, and mails a summary with the run's
//! log attached.
//!
//! The remote services are reached through the traits in [`collaborators`];
//! the hosting binary builds them from [`secrets::Secrets`] and passes them
//! to [`process::run_job`].

pub mod collaborators;
pub mod config;
pub mod logging;
pub mod process;
pub mod records;
pub mod secrets;
pub mod summary;
