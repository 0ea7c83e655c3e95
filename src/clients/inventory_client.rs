use tokio::sync::mpsc;

use crate::domain::{FlowerVariant, FlowerVariantCreate, Product, ProductCreate, StockLine};
use crate::inventory_actor::{InventoryError, StockDeduction};
use crate::messages::InventoryRequest;

#[derive(Clone)]
pub struct InventoryClient {
    sender: mpsc::Sender<InventoryRequest>,
}

impl InventoryClient {
    pub fn new(sender: mpsc::Sender<InventoryRequest>) -> Self {
        Self { sender }
    }

    pub async fn shutdown(&self) {
        let _ = self.sender.send(InventoryRequest::Shutdown).await;
    }
}

client_method!(InventoryClient => fn add_product(product: ProductCreate) -> String as InventoryRequest::AddProduct, Error = InventoryError);
client_method!(InventoryClient => fn add_variant(variant: FlowerVariantCreate) -> String as InventoryRequest::AddVariant, Error = InventoryError);
client_method!(InventoryClient => fn get_product(id: String) -> Option<Product> as InventoryRequest::GetProduct, Error = InventoryError);
client_method!(InventoryClient => fn list_products() -> Vec<Product> as InventoryRequest::ListProducts, Error = InventoryError);
client_method!(InventoryClient => fn list_variants() -> Vec<FlowerVariant> as InventoryRequest::ListVariants, Error = InventoryError);
client_method!(InventoryClient => fn variants_by_type(flower_type: String) -> Vec<FlowerVariant> as InventoryRequest::VariantsByType, Error = InventoryError);
client_method!(InventoryClient => fn restock_product(id: String, quantity: u32) -> u32 as InventoryRequest::RestockProduct, Error = InventoryError);
client_method!(InventoryClient => fn restock_variant(id: String, quantity: u32) -> u32 as InventoryRequest::RestockVariant, Error = InventoryError);
client_method!(InventoryClient => fn deduct_for_order(order_id: String, lines: Vec<StockLine>) -> StockDeduction as InventoryRequest::DeductForOrder, Error = InventoryError);
client_method!(InventoryClient => fn release_for_order(order_id: String) -> StockDeduction as InventoryRequest::ReleaseForOrder, Error = InventoryError);
