use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub Uuid);

impl ProductId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ProductId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim()).map(Self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub manufacture_date: NaiveDate,
    pub description: String,
    pub quantity: i32,
}

/// Insert and replacement payload. `id` is only honored on insert; the store
/// assigns one when it is absent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    #[serde(default)]
    pub id: Option<ProductId>,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub manufacture_date: NaiveDate,
    #[serde(default)]
    pub description: String,
    pub quantity: i32,
}

impl Product {
    pub fn from_new(id: ProductId, new: NewProduct) -> Self {
        Self {
            id,
            name: new.name,
            category: new.category,
            price: new.price,
            manufacture_date: new.manufacture_date,
            description: new.description,
            quantity: new.quantity,
        }
    }

    /// Copies every mutable field from `replacement`. The identifier never changes.
    pub fn overwrite_with(&mut self, replacement: &NewProduct) {
        self.name.clone_from(&replacement.name);
        self.category.clone_from(&replacement.category);
        self.price = replacement.price;
        self.manufacture_date = replacement.manufacture_date;
        self.description.clone_from(&replacement.description);
        self.quantity = replacement.quantity;
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{NewProduct, Product, ProductId};

    fn new_product(name: &str) -> NewProduct {
        NewProduct {
            id: None,
            name: name.to_string(),
            category: "tools".to_string(),
            price: Decimal::new(1999, 2),
            manufacture_date: NaiveDate::from_ymd_opt(2023, 6, 1).expect("valid date"),
            description: "cordless drill".to_string(),
            quantity: 4,
        }
    }

    #[test]
    fn overwrite_copies_mutable_fields_and_keeps_id() {
        let id = ProductId::generate();
        let mut product = Product::from_new(id, new_product("Drill"));

        let mut replacement = new_product("Drill v2");
        replacement.id = Some(ProductId::generate());
        replacement.category = "power-tools".to_string();
        replacement.price = Decimal::new(2499, 2);
        replacement.manufacture_date = NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid date");
        replacement.description = "brushless".to_string();
        replacement.quantity = 9;

        product.overwrite_with(&replacement);

        assert_eq!(product.id, id);
        assert_eq!(product.name, "Drill v2");
        assert_eq!(product.category, "power-tools");
        assert_eq!(product.price, Decimal::new(2499, 2));
        assert_eq!(product.manufacture_date, replacement.manufacture_date);
        assert_eq!(product.description, "brushless");
        assert_eq!(product.quantity, 9);
    }

    #[test]
    fn product_id_parses_and_displays_hyphenated() {
        let raw = "7f1d2c3e-4b5a-4c6d-8e9f-0a1b2c3d4e5f";
        let id: ProductId = raw.parse().expect("valid uuid");
        assert_eq!(id.to_string(), raw);
        assert!("not-a-uuid".parse::<ProductId>().is_err());
    }

    #[test]
    fn product_serializes_id_as_plain_string() {
        let id: ProductId = "7f1d2c3e-4b5a-4c6d-8e9f-0a1b2c3d4e5f".parse().expect("valid uuid");
        let product = Product::from_new(id, new_product("Drill"));
        let json = serde_json::to_value(&product).expect("serialize");

        assert_eq!(json["id"], "7f1d2c3e-4b5a-4c6d-8e9f-0a1b2c3d4e5f");
        assert_eq!(json["manufacture_date"], "2023-06-01");
    }

    #[test]
    fn new_product_accepts_missing_id_and_description() {
        let parsed: NewProduct = serde_json::from_str(
            r#"{"name":"Saw","category":"tools","price":"12.50","manufacture_date":"2023-01-01","quantity":2}"#,
        )
        .expect("deserialize");

        assert_eq!(parsed.id, None);
        assert_eq!(parsed.description, "");
        assert_eq!(parsed.price, Decimal::new(1250, 2));
    }
}
