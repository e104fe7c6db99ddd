//! Backend thread owning the tokio runtime that drives the controller
//! transport.

pub mod runtime;
pub mod sink;
