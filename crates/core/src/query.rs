//! Filter and pagination types shared by every product store.
//!
//! A [`ProductSpecification`] is a conjunction of optional predicates. Stores
//! either evaluate it directly with [`ProductSpecification::matches`] or
//! translate it into their own query language; both must agree on the result.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::product::{Product, ProductId};
use crate::errors::DomainError;

pub const MAX_PAGE_SIZE: u32 = 1000;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductSpecification {
    pub id: Option<ProductId>,
    pub name: Option<String>,
    pub manufacture_date: Option<NaiveDate>,
    pub manufactured_between: Option<(NaiveDate, NaiveDate)>,
}

impl ProductSpecification {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: ProductId) -> Self {
        self.id = Some(id);
        self
    }

    /// Exact name match; `None` matches every name.
    pub fn name_equals_or_any(mut self, name: Option<&str>) -> Self {
        self.name = name.map(str::to_owned);
        self
    }

    pub fn manufactured_on(mut self, date: NaiveDate) -> Self {
        self.manufacture_date = Some(date);
        self
    }

    /// Inclusive on both ends. An inverted range matches nothing.
    pub fn manufactured_between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.manufactured_between = Some((from, to));
        self
    }

    pub fn matches(&self, product: &Product) -> bool {
        if self.id.is_some_and(|id| id != product.id) {
            return false;
        }
        if self.name.as_deref().is_some_and(|name| name != product.name) {
            return false;
        }
        if self.manufacture_date.is_some_and(|date| date != product.manufacture_date) {
            return false;
        }
        if let Some((from, to)) = self.manufactured_between {
            if product.manufacture_date < from || product.manufacture_date > to {
                return false;
            }
        }
        true
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Result<Self, DomainError> {
        if size == 0 {
            return Err(DomainError::InvalidArgument(
                "page size must be at least 1".to_string(),
            ));
        }
        if size > MAX_PAGE_SIZE {
            return Err(DomainError::InvalidArgument(format!(
                "page size must not exceed {MAX_PAGE_SIZE}"
            )));
        }
        Ok(Self { page, size })
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        let size = u64::from(request.size.max(1));
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages: total_elements.div_ceil(size),
        }
    }

    /// Slices an already filtered, fully materialized result set.
    pub fn from_all(items: Vec<T>, request: PageRequest) -> Self {
        let total = items.len() as u64;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let content =
            items.into_iter().skip(offset).take(request.size as usize).collect::<Vec<_>>();
        Self::new(content, request, total)
    }
}
