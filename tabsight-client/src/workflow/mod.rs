//! Workflow orchestration
//!
//! The controller is the only owner of workflow state; the clients and the
//! validator it drives are stateless.

pub mod controller;

pub use controller::WorkflowController;
