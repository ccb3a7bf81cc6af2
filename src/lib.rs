//! Backend for the app designer: layout storage, layout conversion and the
//! HTTP API the editor talks to.

pub mod api;
pub mod config;
pub mod editor;
pub mod error;
pub mod layout;
pub mod models;
pub mod repo;
pub mod validation;
