//! Request DTOs for the API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for creating or replacing a product
/// (POST /api/products, PUT /api/products/:id)
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRequest {
    /// Display name
    pub name: String,
    /// Unit price
    pub price: f64,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

impl ProductRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.name.trim().is_empty() {
            return Some("Name cannot be empty".to_string());
        }
        if self.name.len() > 256 {
            return Some("Name exceeds maximum length of 256 characters".to_string());
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Some("Price must be a non-negative number".to_string());
        }
        None
    }
}
