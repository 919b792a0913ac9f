//! Data types flowing through a list request.
//!
//! Everything here is rebuilt per request: the inbound envelope, the
//! configuration record, listed objects, the manifest and the response.

pub mod config_record;
pub mod manifest;
pub mod object;
pub mod request;
pub mod response;
