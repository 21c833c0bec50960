use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Row, Sqlite};

use productservice_core::domain::product::{Product, ProductId};
use productservice_core::query::{Page, PageRequest, ProductSpecification};

use super::{ProductRepository, RepositoryError};
use crate::DbPool;

const PRODUCT_COLUMNS: &str =
    "SELECT id, name, category, price, manufacture_date, description, quantity FROM product";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let category: String =
        row.try_get("category").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let price_str: String =
        row.try_get("price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let manufacture_date_str: String =
        row.try_get("manufacture_date").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let description: String =
        row.try_get("description").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let quantity: i64 =
        row.try_get("quantity").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let id = ProductId::from_str(&id)
        .map_err(|e| RepositoryError::Decode(format!("invalid product id `{id}`: {e}")))?;
    let price = Decimal::from_str(&price_str)
        .map_err(|e| RepositoryError::Decode(format!("invalid price `{price_str}`: {e}")))?;
    let manufacture_date = NaiveDate::parse_from_str(&manufacture_date_str, DATE_FORMAT)
        .map_err(|e| {
            RepositoryError::Decode(format!("invalid manufacture date `{manufacture_date_str}`: {e}"))
        })?;
    let quantity = i32::try_from(quantity)
        .map_err(|_| RepositoryError::Decode(format!("quantity {quantity} out of range")))?;

    Ok(Product { id, name, category, price, manufacture_date, description, quantity })
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Appends the specification as a `WHERE` clause. Dates are stored as ISO text,
/// so lexical comparison matches calendar order.
fn push_specification(builder: &mut QueryBuilder<'_, Sqlite>, specification: &ProductSpecification) {
    builder.push(" WHERE 1=1");

    if let Some(id) = specification.id {
        builder.push(" AND id = ");
        builder.push_bind(id.to_string());
    }
    if let Some(name) = &specification.name {
        builder.push(" AND name = ");
        builder.push_bind(name.clone());
    }
    if let Some(date) = specification.manufacture_date {
        builder.push(" AND manufacture_date = ");
        builder.push_bind(format_date(date));
    }
    if let Some((from, to)) = specification.manufactured_between {
        builder.push(" AND manufacture_date BETWEEN ");
        builder.push_bind(format_date(from));
        builder.push(" AND ");
        builder.push_bind(format_date(to));
    }
}

async fn upsert<'e, E>(executor: E, product: &Product) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO product (id, name, category, price, manufacture_date, description,
                              quantity, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
             name = excluded.name,
             category = excluded.category,
             price = excluded.price,
             manufacture_date = excluded.manufacture_date,
             description = excluded.description,
             quantity = excluded.quantity,
             updated_at = excluded.updated_at",
    )
    .bind(product.id.to_string())
    .bind(&product.name)
    .bind(&product.category)
    .bind(product.price.to_string())
    .bind(format_date(product.manufacture_date))
    .bind(&product.description)
    .bind(i64::from(product.quantity))
    .bind(&now)
    .bind(&now)
    .execute(executor)
    .await?;

    Ok(())
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn find_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!("{PRODUCT_COLUMNS} ORDER BY rowid ASC"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_product).collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!("{PRODUCT_COLUMNS} WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_product(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!("{PRODUCT_COLUMNS} WHERE name = ? ORDER BY rowid ASC"))
            .bind(name)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_product).collect::<Result<Vec<_>, _>>()
    }

    async fn find_page(
        &self,
        specification: &ProductSpecification,
        page: &PageRequest,
    ) -> Result<Page<Product>, RepositoryError> {
        let mut count_builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM product");
        push_specification(&mut count_builder, specification);
        let total: i64 = count_builder.build_query_scalar().fetch_one(&self.pool).await?;

        let offset = i64::try_from(page.offset())
            .map_err(|_| RepositoryError::Decode("page offset out of range".to_string()))?;
        let mut builder = QueryBuilder::<Sqlite>::new(PRODUCT_COLUMNS);
        push_specification(&mut builder, specification);
        builder.push(" ORDER BY rowid ASC LIMIT ");
        builder.push_bind(i64::from(page.size));
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let rows = builder.build().fetch_all(&self.pool).await?;
        let content = rows.iter().map(row_to_product).collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(content, *page, u64::try_from(total).unwrap_or_default()))
    }

    async fn find_matching(
        &self,
        specification: &ProductSpecification,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut builder = QueryBuilder::<Sqlite>::new(PRODUCT_COLUMNS);
        push_specification(&mut builder, specification);
        builder.push(" ORDER BY rowid ASC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_product).collect::<Result<Vec<_>, _>>()
    }

    async fn save(&self, product: Product) -> Result<Product, RepositoryError> {
        upsert(&self.pool, &product).await?;
        Ok(product)
    }

    async fn save_and_flush(&self, product: Product) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        upsert(&mut *tx, &product).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn delete(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM product WHERE id = ?")
            .bind(product.id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
