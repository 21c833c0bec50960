pub mod config;
pub mod domain;
pub mod errors;
pub mod query;

pub use domain::product::{NewProduct, Product, ProductId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use query::{Page, PageRequest, ProductSpecification, MAX_PAGE_SIZE};
