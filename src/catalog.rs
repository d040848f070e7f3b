//! Product Catalog
//!
//! In-memory product storage standing in for the database layer, so the
//! cache has real routes to sit in front of.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::ProductRequest;

// == Product ==
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// RFC 3339 creation time
    pub created_at: String,
    /// RFC 3339 time of the last update
    pub updated_at: String,
}

// == Product Catalog ==
/// Products keyed by id, listed in id order.
#[derive(Debug, Default)]
pub struct ProductCatalog {
    products: BTreeMap<u64, Product>,
    last_id: u64,
}

impl ProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> Vec<Product> {
        self.products.values().cloned().collect()
    }

    pub fn get(&self, id: u64) -> Option<Product> {
        self.products.get(&id).cloned()
    }

    /// Adds a product and assigns the next id.
    pub fn create(&mut self, req: ProductRequest) -> Product {
        self.last_id += 1;
        let now = chrono::Utc::now().to_rfc3339();
        let product = Product {
            id: self.last_id,
            name: req.name,
            price: req.price,
            description: req.description,
            created_at: now.clone(),
            updated_at: now,
        };
        self.products.insert(product.id, product.clone());
        product
    }

    /// Replaces the fields of an existing product.
    pub fn update(&mut self, id: u64, req: ProductRequest) -> Option<Product> {
        let product = self.products.get_mut(&id)?;
        product.name = req.name;
        product.price = req.price;
        product.description = req.description;
        product.updated_at = chrono::Utc::now().to_rfc3339();
        Some(product.clone())
    }

    pub fn delete(&mut self, id: u64) -> bool {
        self.products.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, price: f64) -> ProductRequest {
        ProductRequest {
            name: name.to_string(),
            price,
            description: None,
        }
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let mut catalog = ProductCatalog::new();

        assert_eq!(catalog.create(request("lamp", 20.0)).id, 1);
        assert_eq!(catalog.create(request("desk", 150.0)).id, 2);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_update_and_get() {
        let mut catalog = ProductCatalog::new();
        let created = catalog.create(request("lamp", 20.0));

        let updated = catalog.update(created.id, request("lamp", 25.0)).unwrap();
        assert_eq!(updated.price, 25.0);
        assert_eq!(catalog.get(created.id).unwrap().price, 25.0);
        assert!(catalog.update(99, request("ghost", 1.0)).is_none());
    }

    #[test]
    fn test_delete_does_not_reuse_ids() {
        let mut catalog = ProductCatalog::new();
        let first = catalog.create(request("lamp", 20.0));

        assert!(catalog.delete(first.id));
        assert!(!catalog.delete(first.id));
        assert!(catalog.is_empty());
        assert_eq!(catalog.create(request("desk", 150.0)).id, 2);
    }

    #[test]
    fn test_list_in_id_order() {
        let mut catalog = ProductCatalog::new();
        catalog.create(request("a", 1.0));
        catalog.create(request("b", 2.0));

        let names: Vec<String> = catalog.list().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
