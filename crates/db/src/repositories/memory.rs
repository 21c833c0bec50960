use tokio::sync::RwLock;

use productservice_core::domain::product::{Product, ProductId};
use productservice_core::query::{Page, PageRequest, ProductSpecification};

use super::{ProductRepository, RepositoryError};

/// Insertion-ordered store used by tests and by callers that do not need durability.
#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<Vec<Product>>,
}

impl InMemoryProductRepository {
    pub fn with_products(products: Vec<Product>) -> Self {
        Self { products: RwLock::new(products) }
    }

    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.products.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_all(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.products.read().await.clone())
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.iter().find(|product| &product.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.iter().filter(|product| product.name == name).cloned().collect())
    }

    async fn find_page(
        &self,
        specification: &ProductSpecification,
        page: &PageRequest,
    ) -> Result<Page<Product>, RepositoryError> {
        let matching = self.find_matching(specification).await?;
        Ok(Page::from_all(matching, *page))
    }

    async fn find_matching(
        &self,
        specification: &ProductSpecification,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.iter().filter(|product| specification.matches(product)).cloned().collect())
    }

    async fn save(&self, product: Product) -> Result<Product, RepositoryError> {
        let mut products = self.products.write().await;
        match products.iter_mut().find(|existing| existing.id == product.id) {
            Some(existing) => *existing = product.clone(),
            None => products.push(product.clone()),
        }
        Ok(product)
    }

    async fn delete(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut products = self.products.write().await;
        products.retain(|existing| existing.id != product.id);
        Ok(())
    }
}
