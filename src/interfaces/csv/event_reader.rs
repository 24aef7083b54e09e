use crate::error::{EscrowError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One marketplace event, as replayed from a CSV row.
///
/// The columns after `op` are optional; which ones an op requires is decided
/// by the replay driver, so a row missing a column it needs fails there with
/// a precise error instead of here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MarketEvent {
    pub op: EventOp,
    #[serde(default)]
    pub actor: Option<u64>,
    #[serde(default)]
    pub subject: Option<u64>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOp {
    /// Register (or refresh) a user. `reference` is their platform handle.
    User,
    /// Publish a gig for `actor`, priced at `amount`.
    Gig,
    /// Buyer `actor` orders gig `subject`.
    Buy,
    /// Confirm the deposit for order `subject` with chain ref `reference`.
    Fund,
    /// Buyer `actor` releases order `subject`.
    Release,
    /// Party `actor` opens a dispute on order `subject`.
    Dispute,
    /// Operator `actor` resolves order `subject` for `reference` (buyer/seller).
    Resolve,
    /// Credit user `subject` directly, outside any order.
    Deposit,
    /// Reviewer `actor` scores order `subject` with `amount` stars.
    Feedback,
}

/// Reads marketplace events from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over
/// `Result<MarketEvent>`. It handles whitespace trimming and flexible record
/// lengths automatically.
pub struct EventReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> EventReader<R> {
    /// Creates a new `EventReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes events, so
    /// large histories replay without loading the whole file.
    pub fn events(self) -> impl Iterator<Item = Result<MarketEvent>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(EscrowError::from))
    }
}
