//! chef-core library
//!
//! Gesture-driven selection and session core. Exposes modules for
//! integration testing and embedding in a host UI.

pub mod domain;
pub mod infra;
pub mod io;
pub mod services;
