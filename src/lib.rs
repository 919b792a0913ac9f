//! Lists the files a user can download.
//!
//! A request names a user id; the service finds the data bucket through a
//! configuration table, lists `downloads/<uid>/` in that bucket and answers
//! with a manifest of the completed files, newest first.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
