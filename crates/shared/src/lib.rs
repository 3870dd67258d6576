//! Types shared between the integration client, the form controller and hosts.

pub mod domain;
pub mod error;
pub mod protocol;
