use super::ids::IdSeq;
use crate::domain::asset::AssetKind;
use crate::domain::gig::{Gig, MAX_TITLE_LEN};
use crate::domain::money::Amount;
use crate::domain::ports::{GigStoreRef, UserStoreRef};
use crate::domain::{GigId, UserId};
use crate::error::{EscrowError, Result};
use rust_decimal::Decimal;

/// Gig offers: creation, deactivation and discovery.
pub struct Catalog {
    gigs: GigStoreRef,
    users: UserStoreRef,
    seq: IdSeq,
}

impl Catalog {
    pub async fn new(gigs: GigStoreRef, users: UserStoreRef) -> Result<Self> {
        let last_id = gigs.max_id().await?;
        Ok(Self {
            gigs,
            users,
            seq: IdSeq::starting_after(last_id),
        })
    }

    /// Publishes a gig. The price is quantized to the asset's scale before
    /// validation, so a sub-scale dust price is rejected rather than rounded
    /// into existence.
    pub async fn create_gig(
        &self,
        seller_id: UserId,
        title: &str,
        description: &str,
        price: Decimal,
        asset: AssetKind,
    ) -> Result<Gig> {
        if self.users.get(seller_id).await?.is_none() {
            return Err(EscrowError::UserNotFound { user_id: seller_id });
        }
        let title = title.trim();
        if title.is_empty() {
            return Err(EscrowError::InvalidInput("title must not be empty".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(EscrowError::InvalidInput(format!(
                "title exceeds {MAX_TITLE_LEN} characters"
            )));
        }
        let price = Amount::quantized(price, asset.scale())?;

        let gig = Gig::new(self.seq.next(), seller_id, title, description.trim(), price, asset);
        self.gigs.store(gig.clone()).await?;
        tracing::info!(gig_id = gig.id, seller_id, price = %price, "gig published");
        Ok(gig)
    }

    /// Takes a gig off the market. Seller only; existing orders keep their
    /// reference.
    pub async fn deactivate_gig(&self, gig_id: GigId, acting_user: UserId) -> Result<Gig> {
        let mut gig = self
            .gigs
            .get(gig_id)
            .await?
            .ok_or(EscrowError::GigNotFound { gig_id })?;
        if gig.seller_id != acting_user {
            return Err(EscrowError::NotAuthorized {
                user_id: acting_user,
                action: format!("deactivate gig {gig_id}"),
            });
        }
        gig.active = false;
        self.gigs.store(gig.clone()).await?;
        Ok(gig)
    }

    /// An active gig, or `GigNotFound`.
    pub async fn active_gig(&self, gig_id: GigId) -> Result<Gig> {
        self.gigs
            .get(gig_id)
            .await?
            .filter(|g| g.active)
            .ok_or(EscrowError::GigNotFound { gig_id })
    }

    pub async fn list_active(&self) -> Result<Vec<Gig>> {
        let mut gigs = self.gigs.active().await?;
        gigs.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(gigs)
    }

    pub async fn gigs_by_seller(&self, seller_id: UserId) -> Result<Vec<Gig>> {
        let mut gigs = self.gigs.by_seller(seller_id).await?;
        gigs.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(gigs)
    }

    /// Keyword search over active gigs. Title words weigh double description
    /// words; gigs matching no query token are dropped.
    pub async fn search(&self, query: &str) -> Result<Vec<Gig>> {
        let tokens: Vec<String> = query
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut ranked: Vec<(u32, Gig)> = self
            .gigs
            .active()
            .await?
            .into_iter()
            .filter_map(|gig| {
                let title = gig.title.to_lowercase();
                let description = gig.description.to_lowercase();
                let score: u32 = tokens
                    .iter()
                    .map(|t| {
                        let mut s = 0;
                        if title.contains(t.as_str()) {
                            s += 2;
                        }
                        if description.contains(t.as_str()) {
                            s += 1;
                        }
                        s
                    })
                    .sum();
                (score > 0).then_some((score, gig))
            })
            .collect();

        ranked.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.id.cmp(&a.1.id)));
        Ok(ranked.into_iter().map(|(_, gig)| gig).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::users::UserService;
    use crate::infrastructure::in_memory;
    use rust_decimal_macros::dec;

    async fn catalog_with_seller() -> (Catalog, UserId) {
        let stores = in_memory::stores();
        let users = UserService::new(stores.users.clone()).await.unwrap();
        let seller = users.get_or_create("tg:1", "seller").await.unwrap();
        let catalog = Catalog::new(stores.gigs, stores.users).await.unwrap();
        (catalog, seller.id)
    }

    #[tokio::test]
    async fn test_create_quantizes_price() {
        let (catalog, seller) = catalog_with_seller().await;
        let gig = catalog
            .create_gig(seller, "logo", "vector logo", dec!(10.005), AssetKind::UsdtTron)
            .await
            .unwrap();
        assert_eq!(gig.price.value(), dec!(10.00));
        assert!(gig.active);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let (catalog, seller) = catalog_with_seller().await;
        assert!(matches!(
            catalog
                .create_gig(seller, "", "d", dec!(1), AssetKind::UsdtTron)
                .await,
            Err(EscrowError::InvalidInput(_))
        ));
        let long_title = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(
            catalog
                .create_gig(seller, &long_title, "d", dec!(1), AssetKind::UsdtTron)
                .await
                .is_err()
        );
        assert!(matches!(
            catalog
                .create_gig(seller, "t", "d", dec!(0), AssetKind::UsdtTron)
                .await,
            Err(EscrowError::InvalidAmount(_))
        ));
        assert!(matches!(
            catalog
                .create_gig(99, "t", "d", dec!(1), AssetKind::UsdtTron)
                .await,
            Err(EscrowError::UserNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_deactivate_is_seller_only() {
        let (catalog, seller) = catalog_with_seller().await;
        let gig = catalog
            .create_gig(seller, "logo", "", dec!(10), AssetKind::UsdtTron)
            .await
            .unwrap();

        let err = catalog.deactivate_gig(gig.id, seller + 1).await.unwrap_err();
        assert!(matches!(err, EscrowError::NotAuthorized { .. }));

        let gig = catalog.deactivate_gig(gig.id, seller).await.unwrap();
        assert!(!gig.active);
        assert!(matches!(
            catalog.active_gig(gig.id).await,
            Err(EscrowError::GigNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_search_ranks_title_above_description() {
        let (catalog, seller) = catalog_with_seller().await;
        catalog
            .create_gig(seller, "logo design", "fast", dec!(10), AssetKind::UsdtTron)
            .await
            .unwrap();
        catalog
            .create_gig(seller, "banner", "includes logo", dec!(5), AssetKind::UsdtTron)
            .await
            .unwrap();
        catalog
            .create_gig(seller, "translation", "english", dec!(3), AssetKind::UsdtTron)
            .await
            .unwrap();

        let hits = catalog.search("logo").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "logo design");
        assert_eq!(hits[1].title, "banner");

        assert!(catalog.search("  ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_skips_inactive() {
        let (catalog, seller) = catalog_with_seller().await;
        let gig = catalog
            .create_gig(seller, "logo", "", dec!(10), AssetKind::UsdtTron)
            .await
            .unwrap();
        catalog.deactivate_gig(gig.id, seller).await.unwrap();
        assert!(catalog.search("logo").await.unwrap().is_empty());
    }
}
