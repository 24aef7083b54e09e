//! Domain layer: entities, value objects and the ports the application
//! layer is wired through.

pub mod asset;
pub mod dispute;
pub mod feedback;
pub mod gig;
pub mod ledger;
pub mod money;
pub mod order;
pub mod ports;
pub mod user;

pub type UserId = u64;
pub type GigId = u64;
pub type OrderId = u64;
pub type TxId = u64;
pub type DisputeId = u64;
pub type FeedbackId = u64;
