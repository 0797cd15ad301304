//! GCP API interaction module
//!
//! Provider client used by the resolvers for batched Compute Engine list
//! calls. Transport failures are unrecoverable for the call in progress;
//! retries belong to the caller.
//!
//! # Module Structure
//!
//! - [`auth`] - GCP authentication using Application Default Credentials
//! - [`client`] - Compute Engine client with typed list responses
//! - [`http`] - HTTP utilities for REST API calls

pub mod auth;
pub mod client;
pub mod http;

pub use client::{ComputeClient, Image, Instance};
