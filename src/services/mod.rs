//! Request logic and the two external collaborators it talks to.

pub mod config_store;
pub mod dynamo_config;
pub mod list_service;
pub mod manifest;
pub mod object_lister;
pub mod sqlite_config;
