use crate::domain::money::Amount;
use crate::domain::order::DepositAddress;
use crate::domain::ports::DepositVerifier;
use async_trait::async_trait;

/// Development verifier that accepts any non-empty transaction reference.
///
/// Stands in for the chain watcher in tests and replay runs; the real
/// provider integration terminates here as well, behind the same port.
pub struct AcceptAllVerifier;

#[async_trait]
impl DepositVerifier for AcceptAllVerifier {
    async fn verify(&self, _address: &DepositAddress, claimed_ref: &str, _expected: Amount) -> bool {
        let accepted = !claimed_ref.trim().is_empty();
        if !accepted {
            tracing::debug!("empty transaction reference");
        }
        accepted
    }
}

/// Verifier that rejects everything. Exercises the failure paths.
pub struct RejectAllVerifier;

#[async_trait]
impl DepositVerifier for RejectAllVerifier {
    async fn verify(&self, _address: &DepositAddress, _claimed_ref: &str, _expected: Amount) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn address() -> DepositAddress {
        DepositAddress {
            address: "TXYZdepositaddr".to_string(),
            memo: None,
        }
    }

    #[tokio::test]
    async fn test_accept_all_requires_a_reference() {
        let verifier = AcceptAllVerifier;
        let expected = Amount::new(dec!(10)).unwrap();
        assert!(verifier.verify(&address(), "txabc", expected).await);
        assert!(!verifier.verify(&address(), "  ", expected).await);
    }

    #[tokio::test]
    async fn test_reject_all() {
        let verifier = RejectAllVerifier;
        let expected = Amount::new(dec!(10)).unwrap();
        assert!(!verifier.verify(&address(), "txabc", expected).await);
    }
}
