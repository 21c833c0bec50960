use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Seed contract: every fixture product that must exist after a load.
const SEED_PRODUCTS: &[SeedProductContract] = &[
    SeedProductContract {
        id: "0b6f6a2e-1c1e-4a51-9b53-5f0d1c9e0a01",
        name: "Notebook A5",
        manufacture_date: "2023-01-01",
    },
    SeedProductContract {
        id: "0b6f6a2e-1c1e-4a51-9b53-5f0d1c9e0a02",
        name: "Gel Pen",
        manufacture_date: "2023-03-15",
    },
    SeedProductContract {
        id: "0b6f6a2e-1c1e-4a51-9b53-5f0d1c9e0a03",
        name: "Desk Lamp",
        manufacture_date: "2023-06-01",
    },
    SeedProductContract {
        id: "0b6f6a2e-1c1e-4a51-9b53-5f0d1c9e0a04",
        name: "Monitor Stand",
        manufacture_date: "2023-06-01",
    },
    SeedProductContract {
        id: "0b6f6a2e-1c1e-4a51-9b53-5f0d1c9e0a05",
        name: "Office Chair",
        manufacture_date: "2023-12-01",
    },
];

/// Deterministic demo catalog used by the `seed` command and end-to-end checks.
pub struct CatalogSeedDataset;

impl CatalogSeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/catalog_seed_data.sql");

    /// Loads the fixture rows. Existing rows with the same ids are left untouched.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let products_seeded = SEED_PRODUCTS
            .iter()
            .map(|product| SeedProductInfo { id: product.id, name: product.name })
            .collect::<Vec<_>>();

        Ok(SeedResult { products_seeded })
    }

    /// Checks every fixture row against the seed contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::with_capacity(SEED_PRODUCTS.len());

        for product in SEED_PRODUCTS {
            let present: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM product
                               WHERE id = ?1 AND name = ?2 AND manufacture_date = ?3)",
            )
            .bind(product.id)
            .bind(product.name)
            .bind(product.manufacture_date)
            .fetch_one(pool)
            .await?;
            checks.push((product.id, present == 1));
        }

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { all_present, checks })
    }

    /// Removes fixture rows only.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;
        for product in SEED_PRODUCTS {
            sqlx::query("DELETE FROM product WHERE id = ?1")
                .bind(product.id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

struct SeedProductContract {
    id: &'static str,
    name: &'static str,
    manufacture_date: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedProductInfo {
    pub id: &'static str,
    pub name: &'static str,
}

#[derive(Clone, Debug)]
pub struct SeedResult {
    pub products_seeded: Vec<SeedProductInfo>,
}

#[derive(Clone, Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::CatalogSeedDataset;
    use crate::repositories::SqlProductRepository;
    use crate::{connect_with_settings, migrations, ProductCatalog};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn load_then_verify_passes_and_is_idempotent() {
        let pool = setup().await;

        let first = CatalogSeedDataset::load(&pool).await.expect("first load");
        let second = CatalogSeedDataset::load(&pool).await.expect("second load");
        assert_eq!(first.products_seeded, second.products_seeded);

        let verification = CatalogSeedDataset::verify(&pool).await.expect("verify");
        assert!(verification.all_present);

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM product").fetch_one(&pool).await.expect("count");
        assert_eq!(count, 5);
    }

    #[tokio::test]
    async fn verify_reports_missing_rows_after_clean() {
        let pool = setup().await;
        CatalogSeedDataset::load(&pool).await.expect("load");
        CatalogSeedDataset::clean(&pool).await.expect("clean");

        let verification = CatalogSeedDataset::verify(&pool).await.expect("verify");
        assert!(!verification.all_present);
        assert!(verification.checks.iter().all(|(_, passed)| !passed));
    }

    #[tokio::test]
    async fn seeded_catalog_answers_date_range_search() {
        let pool = setup().await;
        CatalogSeedDataset::load(&pool).await.expect("load");
        let catalog = ProductCatalog::new(Arc::new(SqlProductRepository::new(pool)));

        let page = catalog
            .search(
                None,
                NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid date"),
                NaiveDate::from_ymd_opt(2023, 6, 1).expect("valid date"),
                catalog.page_request(Some(0), Some(10)).expect("page request"),
            )
            .await
            .expect("search");

        assert_eq!(page.total_elements, 4);
        assert!(page.content.iter().all(|product| product.name != "Office Chair"));
    }
}
