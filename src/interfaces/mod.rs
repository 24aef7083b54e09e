//! Inbound and outbound adapters: the CSV event reader and replay driver,
//! the provider deposit webhook, and the final-state report renderer.

pub mod csv;
pub mod replay;
pub mod report;
pub mod webhook;
