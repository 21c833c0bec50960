use async_trait::async_trait;
use thiserror::Error;

use productservice_core::domain::product::{Product, ProductId};
use productservice_core::errors::ApplicationError;
use productservice_core::query::{Page, PageRequest, ProductSpecification};

pub mod memory;
pub mod product;

pub use memory::InMemoryProductRepository;
pub use product::SqlProductRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        ApplicationError::Persistence(value.to_string())
    }
}

/// Persistence capability behind the product catalog.
///
/// Implementations must return rows in a stable default order (insertion
/// order) so pagination over an unchanged store is repeatable.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn find_by_name(&self, name: &str) -> Result<Vec<Product>, RepositoryError>;

    async fn find_page(
        &self,
        specification: &ProductSpecification,
        page: &PageRequest,
    ) -> Result<Page<Product>, RepositoryError>;

    async fn find_matching(
        &self,
        specification: &ProductSpecification,
    ) -> Result<Vec<Product>, RepositoryError>;

    /// Inserts or fully replaces the row with the same id.
    async fn save(&self, product: Product) -> Result<Product, RepositoryError>;

    /// Like [`ProductRepository::save`], but the write is committed before returning.
    async fn save_and_flush(&self, product: Product) -> Result<Product, RepositoryError> {
        self.save(product).await
    }

    async fn delete(&self, product: &Product) -> Result<(), RepositoryError>;
}
