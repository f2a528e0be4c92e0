//! Catalog product grid.

use askama::Template;

use truffle_core::ProductId;

use crate::api::Product;

/// Image shown for products without one.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/150";

/// Product display data for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub image_url: String,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product
                .description
                .clone()
                .filter(|d| !d.trim().is_empty()),
            price: product.price.display(),
            image_url: product
                .image_url
                .clone()
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
        }
    }
}

/// Product grid fragment.
#[derive(Template)]
#[template(path = "catalog/products.html")]
pub struct ProductGridTemplate {
    pub products: Vec<ProductView>,
}

impl ProductGridTemplate {
    #[must_use]
    pub fn new(products: &[Product]) -> Self {
        Self {
            products: products.iter().map(ProductView::from).collect(),
        }
    }
}
