#![doc = "payslip-redactor-core: orchestration logic for payslip-redactor."]

//! This crate holds everything between "a request arrived" and "an archive is ready":
//! upload validation, per-run staging, invocation of the external redaction program,
//! output collection and archiving. It knows nothing about HTTP; the binary crate
//! wires it to a web server and a CLI.
//!
//! # Usage
//! Build a [`config::PipelineConfig`], pick a [`contract::Redactor`] (usually
//! [`invoke::ExternalRedactor`]) and call [`pipeline::process_request`].

pub mod archive;
pub mod collect;
pub mod config;
pub mod contract;
pub mod invoke;
pub mod pipeline;
pub mod stage;
pub mod validate;
