use crate::domain::asset::AssetKind;
use crate::domain::order::DepositAddress;
use crate::domain::ports::DepositAddressProvider;
use crate::domain::OrderId;
use crate::error::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Derives deposit addresses from a local seed instead of a custody API.
///
/// The derivation is deterministic per order, so a crashed run that retries
/// order creation hands out the same address again. The output mimics the
/// shape of real addresses closely enough for logs and reports.
pub struct StaticAddressProvider {
    seed: String,
}

impl StaticAddressProvider {
    pub fn new() -> Self {
        Self::with_seed("dev")
    }

    pub fn with_seed(seed: impl Into<String>) -> Self {
        Self { seed: seed.into() }
    }

    fn derive(&self, order_id: OrderId, asset: AssetKind) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.seed.as_bytes());
        hasher.update(order_id.to_be_bytes());
        hasher.update(asset.code().as_bytes());
        let digest = hasher.finalize();

        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            let _ = write!(hex, "{byte:02x}");
        }
        match asset {
            AssetKind::UsdtTron => format!("T{}", &hex[..33]),
            AssetKind::Btc => format!("bc1q{}", &hex[..38]),
        }
    }
}

impl Default for StaticAddressProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DepositAddressProvider for StaticAddressProvider {
    async fn new_deposit_address(
        &self,
        order_id: OrderId,
        asset: AssetKind,
    ) -> Result<DepositAddress> {
        Ok(DepositAddress {
            address: self.derive(order_id, asset),
            memo: None,
        })
    }
}
