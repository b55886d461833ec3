//! sv-isir-corrections library
//!
//! This crate provides the core functionality for the `sv-isir-corrections` binary,
//! which retrieves batched ISIR corrections from the StudentVerification API.
//!
//! ## Overview
//!
//! - [`dates`] - Validates the date range and formats dates for the API
//! - [`orchestrator`] - Sequences validation, authentication, fetch and reporting
//! - [`client`] - OAuth WRAP token client and StudentVerification corrections client
//! - [`logging`] - Console and rotating file logging with an explicit flush
//! - [`config`] - TOML configuration
//! - [`cli`] - Command-line interface
//! - [`models`] - Date range, token, correction file and run result types
//! - [`errors`] - Error types used throughout the application
//!
//! ## Example Usage
//!
//! ```no_run
//! use sv_isir_corrections::client::{SvApiClient, WrapTokenClient};
//! use sv_isir_corrections::config::Config;
//! use sv_isir_corrections::errors::AppResult;
//! use sv_isir_corrections::{logging, orchestrator::Orchestrator};
//! use std::path::Path;
//!
//! # async fn example() -> AppResult<()> {
//! let config = Config::from_toml_file(Path::new("sv-isir-corrections.toml"))?;
//! let log = logging::init(&config.logging)?;
//! let client = reqwest::Client::new();
//! let orchestrator = Orchestrator::new(
//!     config.oauth_wrap_request.clone(),
//!     config.sv_api.root_url.clone(),
//!     WrapTokenClient::new(client.clone()),
//!     SvApiClient::new(client),
//!     log,
//! );
//! let result = orchestrator
//!     .run(Some("2015-09-21"), Some("2015-09-22"), Path::new("/var/isirs"))
//!     .await;
//! std::process::exit(result.exit_code().into());
//! # }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod dates;
pub mod errors;
pub mod logging;
pub mod models;
pub mod orchestrator;
