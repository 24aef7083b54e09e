use crate::error::EscrowError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Assets the platform can hold in custody.
///
/// This is a closed set: supporting a new asset means adding a variant and
/// wiring a verifier for it when the engine is built. Nothing resolves assets
/// by string at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    #[serde(rename = "USDT-TRON")]
    UsdtTron,
    #[serde(rename = "BTC")]
    Btc,
}

impl AssetKind {
    pub const ALL: [AssetKind; 2] = [AssetKind::UsdtTron, AssetKind::Btc];

    /// Fractional digits custody accounting uses for this asset.
    pub fn scale(&self) -> u32 {
        match self {
            AssetKind::UsdtTron => 2,
            AssetKind::Btc => 8,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AssetKind::UsdtTron => "USDT-TRON",
            AssetKind::Btc => "BTC",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for AssetKind {
    type Err = EscrowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USDT-TRON" => Ok(AssetKind::UsdtTron),
            "BTC" => Ok(AssetKind::Btc),
            other => Err(EscrowError::MalformedEvent(format!(
                "unknown asset '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_codes_round_trip() {
        for asset in AssetKind::ALL {
            assert_eq!(asset.code().parse::<AssetKind>().unwrap(), asset);
        }
    }

    #[test]
    fn test_asset_scale() {
        assert_eq!(AssetKind::UsdtTron.scale(), 2);
        assert_eq!(AssetKind::Btc.scale(), 8);
    }

    #[test]
    fn test_unknown_asset_rejected() {
        assert!("DOGE".parse::<AssetKind>().is_err());
    }
}
