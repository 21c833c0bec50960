//! Product catalog service.
//!
//! Every operation is a thin pass-through to a [`ProductRepository`]. Missing
//! records surface as [`DomainError::ProductNotFound`]; store failures are
//! propagated as [`ApplicationError::Persistence`] and never folded into the
//! not-found kind.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use productservice_core::domain::product::{NewProduct, Product, ProductId};
use productservice_core::errors::{ApplicationError, DomainError};
use productservice_core::query::{Page, PageRequest, ProductSpecification};

use crate::repositories::ProductRepository;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Clone)]
pub struct ProductCatalog {
    repository: Arc<dyn ProductRepository>,
    default_page_size: u32,
}

impl ProductCatalog {
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self { repository, default_page_size: DEFAULT_PAGE_SIZE }
    }

    pub fn with_default_page_size(mut self, default_page_size: u32) -> Self {
        self.default_page_size = default_page_size;
        self
    }

    /// Builds a page request, filling unset values with page 0 and the configured size.
    ///
    /// A bad caller-supplied size is an invalid argument; a bad configured
    /// default is a configuration failure.
    pub fn page_request(
        &self,
        page: Option<u32>,
        size: Option<u32>,
    ) -> Result<PageRequest, ApplicationError> {
        let page = page.unwrap_or(0);
        match size {
            Some(size) => Ok(PageRequest::new(page, size)?),
            None => PageRequest::new(page, self.default_page_size).map_err(|error| {
                ApplicationError::Configuration(format!(
                    "catalog.default_page_size {} is unusable: {error}",
                    self.default_page_size
                ))
            }),
        }
    }

    pub async fn list_all(&self) -> Result<Vec<Product>, ApplicationError> {
        Ok(self.repository.find_all().await?)
    }

    pub async fn get_by_id(&self, id: &ProductId) -> Result<Product, ApplicationError> {
        self.find_existing(id).await
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Vec<Product>, ApplicationError> {
        Ok(self.repository.find_by_name(name).await?)
    }

    /// Products manufactured within `[date_from, date_to]`, optionally restricted
    /// to an exact name.
    pub async fn search(
        &self,
        name: Option<&str>,
        date_from: NaiveDate,
        date_to: NaiveDate,
        page: PageRequest,
    ) -> Result<Page<Product>, ApplicationError> {
        let specification = ProductSpecification::all()
            .name_equals_or_any(name)
            .manufactured_between(date_from, date_to);
        let result = self.repository.find_page(&specification, &page).await?;

        info!(
            event_name = "catalog.search.executed",
            name = name.unwrap_or("*"),
            date_from = %date_from,
            date_to = %date_to,
            page = page.page,
            size = page.size,
            total_elements = result.total_elements,
            "product search executed"
        );

        Ok(result)
    }

    /// An id takes priority over a manufacture date. Supplying neither is a
    /// not-found error rather than an empty result.
    pub async fn search_by_id_or_manufacture_date(
        &self,
        id: Option<ProductId>,
        manufacture_date: Option<NaiveDate>,
    ) -> Result<Vec<Product>, ApplicationError> {
        if let Some(id) = id {
            let specification = ProductSpecification::all().with_id(id);
            return Ok(self.repository.find_matching(&specification).await?);
        }

        if let Some(date) = manufacture_date {
            let specification = ProductSpecification::all().manufactured_on(date);
            let mut products = self.repository.find_matching(&specification).await?;
            // stable: equal dates keep store order
            products.sort_by(|a, b| b.manufacture_date.cmp(&a.manufacture_date));
            return Ok(products);
        }

        debug!(event_name = "catalog.product.not_found", "lookup without id or manufacture date");
        Err(DomainError::MissingLookupCriteria.into())
    }

    pub async fn create(&self, new_product: NewProduct) -> Result<Product, ApplicationError> {
        let id = new_product.id.unwrap_or_else(ProductId::generate);
        let product = self.repository.save(Product::from_new(id, new_product)).await?;

        info!(
            event_name = "catalog.product.created",
            product_id = %product.id,
            name = %product.name,
            "product created"
        );

        Ok(product)
    }

    pub async fn update(
        &self,
        id: &ProductId,
        replacement: NewProduct,
    ) -> Result<Product, ApplicationError> {
        let mut existing = self.find_existing(id).await?;
        existing.overwrite_with(&replacement);
        let updated = self.repository.save_and_flush(existing).await?;

        info!(
            event_name = "catalog.product.updated",
            product_id = %updated.id,
            "product updated"
        );

        Ok(updated)
    }

    pub async fn delete_by_id(&self, id: &ProductId) -> Result<(), ApplicationError> {
        let existing = self.find_existing(id).await?;
        self.repository.delete(&existing).await?;

        info!(event_name = "catalog.product.deleted", product_id = %id, "product deleted");

        Ok(())
    }

    async fn find_existing(&self, id: &ProductId) -> Result<Product, ApplicationError> {
        match self.repository.find_by_id(id).await? {
            Some(product) => Ok(product),
            None => {
                debug!(event_name = "catalog.product.not_found", product_id = %id, "product not found");
                Err(DomainError::ProductNotFound(*id).into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use productservice_core::domain::product::{NewProduct, Product, ProductId};
    use productservice_core::errors::{ApplicationError, DomainError};
    use productservice_core::query::{Page, PageRequest, ProductSpecification, MAX_PAGE_SIZE};

    use super::ProductCatalog;
    use crate::repositories::{InMemoryProductRepository, ProductRepository, RepositoryError};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn new_product(name: &str, manufacture_date: NaiveDate) -> NewProduct {
        NewProduct {
            id: None,
            name: name.to_string(),
            category: "kitchen".to_string(),
            price: Decimal::new(4_550, 2),
            manufacture_date,
            description: "stainless steel".to_string(),
            quantity: 7,
        }
    }

    fn catalog() -> (ProductCatalog, Arc<InMemoryProductRepository>) {
        let repository = Arc::new(InMemoryProductRepository::default());
        (ProductCatalog::new(repository.clone()), repository)
    }

    fn page(page: u32, size: u32) -> PageRequest {
        PageRequest::new(page, size).expect("valid page request")
    }

    fn assert_not_found<T: std::fmt::Debug>(result: Result<T, ApplicationError>) {
        match result {
            Err(error) => assert!(error.is_not_found(), "expected not found, got {error:?}"),
            Ok(value) => panic!("expected not found, got {value:?}"),
        }
    }

    #[tokio::test]
    async fn create_then_get_returns_equal_product() {
        let (catalog, _) = catalog();
        let input = new_product("Kettle", date(2023, 2, 2));

        let created = catalog.create(input.clone()).await.expect("create");
        let fetched = catalog.get_by_id(&created.id).await.expect("get");

        assert_eq!(fetched, Product::from_new(created.id, input));
    }

    #[tokio::test]
    async fn create_keeps_supplied_id() {
        let (catalog, _) = catalog();
        let id = ProductId::generate();
        let mut input = new_product("Toaster", date(2023, 2, 2));
        input.id = Some(id);

        let created = catalog.create(input).await.expect("create");

        assert_eq!(created.id, id);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found_for_get_update_and_delete() {
        let (catalog, _) = catalog();
        let missing = ProductId::generate();

        assert_not_found(catalog.get_by_id(&missing).await);
        assert_not_found(catalog.update(&missing, new_product("Pan", date(2023, 1, 1))).await);
        assert_not_found(catalog.delete_by_id(&missing).await);
    }

    #[tokio::test]
    async fn update_overwrites_all_mutable_fields_and_keeps_id() {
        let (catalog, _) = catalog();
        let created = catalog.create(new_product("Pan", date(2023, 1, 1))).await.expect("create");

        let replacement = NewProduct {
            id: Some(ProductId::generate()),
            name: "Frying Pan".to_string(),
            category: "cookware".to_string(),
            price: Decimal::new(3_000, 2),
            manufacture_date: date(2024, 4, 4),
            description: "non-stick".to_string(),
            quantity: 30,
        };
        let updated = catalog.update(&created.id, replacement.clone()).await.expect("update");
        let fetched = catalog.get_by_id(&created.id).await.expect("get");

        assert_eq!(updated, fetched);
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched, Product::from_new(created.id, replacement));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let (catalog, repository) = catalog();
        let created = catalog.create(new_product("Pot", date(2023, 1, 1))).await.expect("create");

        catalog.delete_by_id(&created.id).await.expect("delete");

        assert_not_found(catalog.get_by_id(&created.id).await);
        assert!(repository.is_empty().await);
    }

    #[tokio::test]
    async fn get_by_name_returns_exact_matches_or_empty() {
        let (catalog, _) = catalog();
        catalog.create(new_product("Spoon", date(2023, 1, 1))).await.expect("create");
        catalog.create(new_product("Spoon", date(2023, 1, 2))).await.expect("create");
        catalog.create(new_product("Teaspoon", date(2023, 1, 3))).await.expect("create");

        assert_eq!(catalog.get_by_name("Spoon").await.expect("by name").len(), 2);
        assert!(catalog.get_by_name("Fork").await.expect("by name").is_empty());
    }

    #[tokio::test]
    async fn search_returns_products_in_inclusive_range_with_total() {
        let (catalog, _) = catalog();
        let a = catalog.create(new_product("A", date(2023, 1, 1))).await.expect("create a");
        let b = catalog.create(new_product("B", date(2023, 6, 1))).await.expect("create b");
        catalog.create(new_product("C", date(2023, 12, 1))).await.expect("create c");

        let result = catalog
            .search(None, date(2023, 1, 1), date(2023, 6, 1), page(0, 10))
            .await
            .expect("search");

        assert_eq!(result.content, vec![a, b]);
        assert_eq!(result.total_elements, 2);
    }

    #[tokio::test]
    async fn search_caps_page_size_but_reports_full_total() {
        let (catalog, _) = catalog();
        for day in 1..=7 {
            catalog.create(new_product("Cup", date(2023, 5, day))).await.expect("create");
        }

        let result = catalog
            .search(None, date(2023, 5, 1), date(2023, 5, 31), page(0, 3))
            .await
            .expect("search");

        assert_eq!(result.content.len(), 3);
        assert_eq!(result.total_elements, 7);
        assert_eq!(result.total_pages, 3);
        assert!(result
            .content
            .iter()
            .all(|p| p.manufacture_date >= date(2023, 5, 1) && p.manufacture_date <= date(2023, 5, 31)));
    }

    #[tokio::test]
    async fn search_with_name_narrows_results() {
        let (catalog, _) = catalog();
        catalog.create(new_product("Bowl", date(2023, 3, 1))).await.expect("create");
        let plate = catalog.create(new_product("Plate", date(2023, 3, 2))).await.expect("create");

        let result = catalog
            .search(Some("Plate"), date(2023, 1, 1), date(2023, 12, 31), page(0, 10))
            .await
            .expect("search");

        assert_eq!(result.content, vec![plate]);
        assert_eq!(result.total_elements, 1);
    }

    #[tokio::test]
    async fn search_with_inverted_range_is_empty() {
        let (catalog, _) = catalog();
        catalog.create(new_product("Bowl", date(2023, 3, 1))).await.expect("create");

        let result = catalog
            .search(None, date(2023, 12, 31), date(2023, 1, 1), page(0, 10))
            .await
            .expect("search");

        assert!(result.content.is_empty());
        assert_eq!(result.total_elements, 0);
    }

    #[tokio::test]
    async fn lookup_without_criteria_is_not_found() {
        let (catalog, _) = catalog();
        let result = catalog.search_by_id_or_manufacture_date(None, None).await;

        assert_eq!(result, Err(ApplicationError::Domain(DomainError::MissingLookupCriteria)));
    }

    #[tokio::test]
    async fn lookup_by_id_wins_over_date() {
        let (catalog, _) = catalog();
        let target = catalog.create(new_product("Jar", date(2023, 8, 8))).await.expect("create");
        catalog.create(new_product("Lid", date(2023, 9, 9))).await.expect("create");

        let found = catalog
            .search_by_id_or_manufacture_date(Some(target.id), Some(date(2023, 9, 9)))
            .await
            .expect("lookup");
        assert_eq!(found, vec![target]);

        let missing = catalog
            .search_by_id_or_manufacture_date(Some(ProductId::generate()), None)
            .await
            .expect("lookup");
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn lookup_by_date_returns_exact_matches_in_store_order() {
        let (catalog, _) = catalog();
        let first = catalog.create(new_product("Mug", date(2023, 8, 8))).await.expect("create");
        catalog.create(new_product("Mug", date(2023, 8, 9))).await.expect("create");
        let second = catalog.create(new_product("Jug", date(2023, 8, 8))).await.expect("create");

        let found = catalog
            .search_by_id_or_manufacture_date(None, Some(date(2023, 8, 8)))
            .await
            .expect("lookup");

        assert_eq!(found, vec![first, second]);
    }

    #[tokio::test]
    async fn page_request_uses_configured_default_size() {
        let (catalog, _) = catalog();
        let catalog = catalog.with_default_page_size(5);

        assert_eq!(catalog.page_request(None, None).expect("default"), page(0, 5));
        assert_eq!(catalog.page_request(Some(2), Some(9)).expect("explicit"), page(2, 9));
        assert!(matches!(
            catalog.page_request(None, Some(0)),
            Err(ApplicationError::Domain(DomainError::InvalidArgument(_)))
        ));
    }

    #[tokio::test]
    async fn unusable_default_page_size_is_a_configuration_failure() {
        let (catalog, _) = catalog();
        let catalog = catalog.with_default_page_size(MAX_PAGE_SIZE + 1);

        assert!(matches!(
            catalog.page_request(Some(1), None),
            Err(ApplicationError::Configuration(message)) if message.contains("catalog.default_page_size")
        ));
        assert_eq!(catalog.page_request(Some(1), Some(3)).expect("explicit size"), page(1, 3));
    }

    struct FailingWrites {
        inner: InMemoryProductRepository,
    }

    #[async_trait::async_trait]
    impl ProductRepository for FailingWrites {
        async fn find_all(&self) -> Result<Vec<Product>, RepositoryError> {
            self.inner.find_all().await
        }

        async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
            self.inner.find_by_id(id).await
        }

        async fn find_by_name(&self, name: &str) -> Result<Vec<Product>, RepositoryError> {
            self.inner.find_by_name(name).await
        }

        async fn find_page(
            &self,
            specification: &ProductSpecification,
            page: &PageRequest,
        ) -> Result<Page<Product>, RepositoryError> {
            self.inner.find_page(specification, page).await
        }

        async fn find_matching(
            &self,
            specification: &ProductSpecification,
        ) -> Result<Vec<Product>, RepositoryError> {
            self.inner.find_matching(specification).await
        }

        async fn save(&self, _product: Product) -> Result<Product, RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn delete(&self, _product: &Product) -> Result<(), RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    #[tokio::test]
    async fn update_store_failure_is_persistence_not_not_found() {
        let existing = Product::from_new(ProductId::generate(), new_product("Sieve", date(2023, 1, 1)));
        let repository = FailingWrites {
            inner: InMemoryProductRepository::with_products(vec![existing.clone()]),
        };
        let catalog = ProductCatalog::new(Arc::new(repository));

        let result = catalog.update(&existing.id, new_product("Sieve", date(2023, 2, 1))).await;

        match result {
            Err(ApplicationError::Persistence(message)) => {
                assert!(message.contains("database error"), "unexpected message: {message}")
            }
            other => panic!("expected persistence failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_store_failure_is_persistence() {
        let existing = Product::from_new(ProductId::generate(), new_product("Whisk", date(2023, 1, 1)));
        let repository = FailingWrites {
            inner: InMemoryProductRepository::with_products(vec![existing.clone()]),
        };
        let catalog = ProductCatalog::new(Arc::new(repository));

        let result = catalog.delete_by_id(&existing.id).await;

        assert!(matches!(result, Err(ApplicationError::Persistence(_))));
    }
}
