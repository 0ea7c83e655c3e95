use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Flower stem type held in stock, e.g. red Ecuador rose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowerVariant {
    pub id: String,
    pub flower_type: String,
    pub colour: String,
    pub stock: u32,
}

/// Stems of one variant consumed by a single unit of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeItem {
    pub variant_id: String,
    pub quantity: u32,
}

/// A sellable bouquet or arrangement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category_id: String,
    pub price: Decimal,
    pub stock_quantity: u32,
    pub recipe: Vec<RecipeItem>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct ProductCreate {
    pub name: String,
    pub category_id: String,
    pub price: Decimal,
    pub stock_quantity: u32,
    pub recipe: Vec<RecipeItem>,
}

#[derive(Debug, Clone)]
pub struct FlowerVariantCreate {
    pub flower_type: String,
    pub colour: String,
    pub stock: u32,
}

/// Quantity of a product an order takes from stock.
#[derive(Debug, Clone, PartialEq)]
pub struct StockLine {
    pub product_id: String,
    pub quantity: u32,
}
