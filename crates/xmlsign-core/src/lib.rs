#![forbid(unsafe_code)]

//! Core types shared by every xmlsign crate: the error taxonomy,
//! XML namespace constants and algorithm identifier URIs.

pub mod algorithm;
pub mod error;
pub mod ns;

pub use error::{Error, InvalidSignature, Result};
