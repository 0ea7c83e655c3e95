use std::collections::{BTreeMap, HashMap};

use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use super::error::{InventoryError, Shortage};
use crate::clients::InventoryClient;
use crate::domain::{FlowerVariant, FlowerVariantCreate, Product, ProductCreate, StockLine};
use crate::messages::{InventoryRequest, ServiceResponse};

/// Stock taken for one order: product units and ingredient stems.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockDeduction {
    pub products: Vec<(String, u32)>,
    pub variants: Vec<(String, u32)>,
}

/// Inventory actor. Holds every product and flower variant and remembers what
/// each order took, so a second deduction for the same order is refused.
pub struct InventoryService {
    receiver: mpsc::Receiver<InventoryRequest>,
    products: BTreeMap<String, Product>,
    variants: BTreeMap<String, FlowerVariant>,
    deductions: HashMap<String, StockDeduction>,
    next_product_id: u64,
    next_variant_id: u64,
}

impl InventoryService {
    pub fn new(buffer_size: usize) -> (Self, InventoryClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self {
            receiver,
            products: BTreeMap::new(),
            variants: BTreeMap::new(),
            deductions: HashMap::new(),
            next_product_id: 1,
            next_variant_id: 1,
        };
        (service, InventoryClient::new(sender))
    }

    #[instrument(name = "inventory_service", skip(self))]
    pub async fn run(mut self) {
        info!("InventoryService starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                InventoryRequest::AddProduct { product, respond_to } => {
                    self.handle_add_product(product, respond_to);
                }
                InventoryRequest::AddVariant { variant, respond_to } => {
                    self.handle_add_variant(variant, respond_to);
                }
                InventoryRequest::GetProduct { id, respond_to } => {
                    let _ = respond_to.send(Ok(self.products.get(&id).cloned()));
                }
                InventoryRequest::ListProducts { respond_to } => {
                    let _ = respond_to.send(Ok(self.products.values().cloned().collect()));
                }
                InventoryRequest::ListVariants { respond_to } => {
                    let _ = respond_to.send(Ok(self.variants.values().cloned().collect()));
                }
                InventoryRequest::VariantsByType { flower_type, respond_to } => {
                    self.handle_variants_by_type(flower_type, respond_to);
                }
                InventoryRequest::RestockProduct { id, quantity, respond_to } => {
                    self.handle_restock_product(id, quantity, respond_to);
                }
                InventoryRequest::RestockVariant { id, quantity, respond_to } => {
                    self.handle_restock_variant(id, quantity, respond_to);
                }
                InventoryRequest::DeductForOrder { order_id, lines, respond_to } => {
                    self.handle_deduct_for_order(order_id, lines, respond_to);
                }
                InventoryRequest::ReleaseForOrder { order_id, respond_to } => {
                    self.handle_release_for_order(order_id, respond_to);
                }
                InventoryRequest::Shutdown => {
                    info!("InventoryService shutting down");
                    break;
                }
            }
        }
        info!("InventoryService stopped");
    }

    #[instrument(fields(product_name = %product.name), skip(self, product, respond_to))]
    fn handle_add_product(&mut self, product: ProductCreate, respond_to: ServiceResponse<String, InventoryError>) {
        if let Some(missing) = product
            .recipe
            .iter()
            .find(|item| !self.variants.contains_key(&item.variant_id))
        {
            let _ = respond_to.send(Err(InventoryError::VariantNotFound(missing.variant_id.clone())));
            return;
        }
        let id = format!("product_{}", self.next_product_id);
        self.next_product_id += 1;
        self.products.insert(
            id.clone(),
            Product {
                id: id.clone(),
                name: product.name,
                category_id: product.category_id,
                price: product.price,
                stock_quantity: product.stock_quantity,
                recipe: product.recipe,
                is_active: true,
            },
        );
        info!(product_id = %id, "Product added");
        let _ = respond_to.send(Ok(id));
    }

    #[instrument(fields(flower_type = %variant.flower_type, colour = %variant.colour), skip(self, variant, respond_to))]
    fn handle_add_variant(&mut self, variant: FlowerVariantCreate, respond_to: ServiceResponse<String, InventoryError>) {
        let id = format!("variant_{}", self.next_variant_id);
        self.next_variant_id += 1;
        self.variants.insert(
            id.clone(),
            FlowerVariant {
                id: id.clone(),
                flower_type: variant.flower_type,
                colour: variant.colour,
                stock: variant.stock,
            },
        );
        info!(variant_id = %id, "Flower variant added");
        let _ = respond_to.send(Ok(id));
    }

    fn handle_variants_by_type(&self, flower_type: String, respond_to: ServiceResponse<Vec<FlowerVariant>, InventoryError>) {
        let wanted = flower_type.trim().to_lowercase();
        let variants = self
            .variants
            .values()
            .filter(|v| v.flower_type.to_lowercase() == wanted)
            .cloned()
            .collect();
        let _ = respond_to.send(Ok(variants));
    }

    #[instrument(fields(product_id = %id), skip(self, respond_to))]
    fn handle_restock_product(&mut self, id: String, quantity: u32, respond_to: ServiceResponse<u32, InventoryError>) {
        let result = match self.products.get_mut(&id) {
            Some(product) => {
                product.stock_quantity = product.stock_quantity.saturating_add(quantity);
                Ok(product.stock_quantity)
            }
            None => Err(InventoryError::ProductNotFound(id)),
        };
        let _ = respond_to.send(result);
    }

    #[instrument(fields(variant_id = %id), skip(self, respond_to))]
    fn handle_restock_variant(&mut self, id: String, quantity: u32, respond_to: ServiceResponse<u32, InventoryError>) {
        let result = match self.variants.get_mut(&id) {
            Some(variant) => {
                variant.stock = variant.stock.saturating_add(quantity);
                Ok(variant.stock)
            }
            None => Err(InventoryError::VariantNotFound(id)),
        };
        let _ = respond_to.send(result);
    }

    #[instrument(fields(order_id = %order_id, lines = lines.len()), skip(self, lines, respond_to))]
    fn handle_deduct_for_order(
        &mut self,
        order_id: String,
        lines: Vec<StockLine>,
        respond_to: ServiceResponse<StockDeduction, InventoryError>,
    ) {
        debug!("Processing deduct_for_order request");
        let result = self.deduct(&order_id, &lines);
        match &result {
            Ok(deduction) => {
                info!(products = deduction.products.len(), variants = deduction.variants.len(), "Stock deducted");
                self.deductions.insert(order_id, deduction.clone());
            }
            Err(e) => warn!(error = %e, "Stock deduction refused"),
        }
        let _ = respond_to.send(result);
    }

    /// Checks every line and every ingredient first and only then mutates.
    fn deduct(&mut self, order_id: &str, lines: &[StockLine]) -> Result<StockDeduction, InventoryError> {
        if self.deductions.contains_key(order_id) {
            return Err(InventoryError::AlreadyDeducted(order_id.to_string()));
        }

        let mut product_needs: BTreeMap<&str, u32> = BTreeMap::new();
        let mut variant_needs: BTreeMap<&str, u32> = BTreeMap::new();
        for line in lines {
            if line.quantity == 0 {
                return Err(InventoryError::InvalidQuantity(0));
            }
            let product = self
                .products
                .get(&line.product_id)
                .ok_or_else(|| InventoryError::ProductNotFound(line.product_id.clone()))?;
            let overflow = || InventoryError::InvalidQuantity(line.quantity);
            let needed = product_needs.entry(product.id.as_str()).or_default();
            *needed = needed.checked_add(line.quantity).ok_or_else(overflow)?;
            for item in &product.recipe {
                let stems = item.quantity.checked_mul(line.quantity).ok_or_else(overflow)?;
                let needed = variant_needs.entry(item.variant_id.as_str()).or_default();
                *needed = needed.checked_add(stems).ok_or_else(overflow)?;
            }
        }

        let mut shortages = Vec::new();
        for (&id, &requested) in &product_needs {
            if let Some(product) = self.products.get(id) {
                if product.stock_quantity < requested {
                    shortages.push(Shortage {
                        id: id.to_string(),
                        name: product.name.clone(),
                        requested,
                        available: product.stock_quantity,
                    });
                }
            }
        }
        for (&id, &requested) in &variant_needs {
            let variant = self
                .variants
                .get(id)
                .ok_or_else(|| InventoryError::VariantNotFound(id.to_string()))?;
            if variant.stock < requested {
                shortages.push(Shortage {
                    id: id.to_string(),
                    name: format!("{} {}", variant.flower_type, variant.colour),
                    requested,
                    available: variant.stock,
                });
            }
        }
        if !shortages.is_empty() {
            return Err(InventoryError::Insufficient(shortages));
        }

        let deduction = StockDeduction {
            products: product_needs.iter().map(|(id, qty)| (id.to_string(), *qty)).collect(),
            variants: variant_needs.iter().map(|(id, qty)| (id.to_string(), *qty)).collect(),
        };
        for (id, qty) in &deduction.products {
            if let Some(product) = self.products.get_mut(id) {
                product.stock_quantity -= qty;
            }
        }
        for (id, qty) in &deduction.variants {
            if let Some(variant) = self.variants.get_mut(id) {
                variant.stock -= qty;
            }
        }
        Ok(deduction)
    }

    #[instrument(fields(order_id = %order_id), skip(self, respond_to))]
    fn handle_release_for_order(&mut self, order_id: String, respond_to: ServiceResponse<StockDeduction, InventoryError>) {
        let result = match self.deductions.remove(&order_id) {
            Some(deduction) => {
                for (id, qty) in &deduction.products {
                    if let Some(product) = self.products.get_mut(id) {
                        product.stock_quantity = product.stock_quantity.saturating_add(*qty);
                    }
                }
                for (id, qty) in &deduction.variants {
                    if let Some(variant) = self.variants.get_mut(id) {
                        variant.stock = variant.stock.saturating_add(*qty);
                    }
                }
                info!("Stock released");
                Ok(deduction)
            }
            None => Err(InventoryError::NothingToRelease(order_id)),
        };
        let _ = respond_to.send(result);
    }
}
