mod domain;
mod clients;
mod messages;

mod app_system;

#[cfg(test)]
mod mock_framework;
#[cfg(test)]
mod integration_tests;

mod actor_framework;
mod assignment;
mod chat_guard;
mod dashboard;
mod delivery_proof;
mod flash;
mod inventory_actor;
mod notifications;
mod order_actor;
mod promotion;
mod shipper_actor;
mod user_actor;

use rust_decimal::Decimal;
use tracing::{error, info, Instrument};

use crate::app_system::{setup_tracing, ShopConfig, ShopSystem};
use crate::clients::{CheckoutRequest, DeliveryProofUpload};
use crate::delivery_proof::ProofImage;
use crate::domain::{
    Caller, FlowerVariantCreate, GeoPoint, PaymentMethod, ProductCreate, RecipeItem, Role, ShipperProfileCreate,
    UserCreate,
};
use crate::flash::Flash;

#[tokio::main]
async fn main() -> Result<(), String> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config = ShopConfig::load().map_err(|e| e.to_string())?;
    info!(proof_folder = %config.proof_folder.display(), "Starting Bloomie order core");

    let system = ShopSystem::new(config).map_err(|e| e.to_string())?;

    let mut events = system.hub.subscribe();
    let listener = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event.to_json() {
                Ok(json) => info!(%json, "Push"),
                Err(e) => error!(error = %e, "Could not encode event"),
            }
        }
    });

    let span = tracing::info_span!("seed");
    let (customer, staff, shipper, product_id) = async {
        let mut ids = Vec::new();
        for (name, email, role) in [
            ("Nguyễn Lan", "lan@example.vn", Role::Customer),
            ("Trần Mai", "mai@bloomie.vn", Role::Staff),
            ("Lê Hùng", "hung@bloomie.vn", Role::Shipper),
        ] {
            let id = system
                .users
                .create_user(UserCreate { name: name.into(), email: email.into(), role })
                .await
                .map_err(|e| e.to_string())?;
            ids.push(id);
        }
        let [customer, staff, shipper]: [String; 3] = ids.try_into().map_err(|_| "seed accounts missing".to_string())?;
        system
            .shippers
            .create_shipper(ShipperProfileCreate {
                user_id: shipper.clone(),
                name: "Lê Hùng".into(),
                max_active_orders: 3,
                is_working: true,
            })
            .await
            .map_err(|e| e.to_string())?;

        let rose = system
            .inventory
            .add_variant(FlowerVariantCreate { flower_type: "Hoa hồng".into(), colour: "Đỏ".into(), stock: 100 })
            .await
            .map_err(|e| e.to_string())?;
        let product_id = system
            .inventory
            .add_product(ProductCreate {
                name: "Bó hồng đỏ 10 bông".into(),
                category_id: "bo-hoa".into(),
                price: Decimal::from(450_000),
                stock_quantity: 10,
                recipe: vec![RecipeItem { variant_id: rose, quantity: 10 }],
            })
            .await
            .map_err(|e| e.to_string())?;
        info!(%customer, %shipper, %product_id, "Catalogue and accounts ready");
        Ok::<_, String>((
            Caller::new(customer, Role::Customer),
            Caller::new(staff, Role::Staff),
            Caller::new(shipper, Role::Shipper),
            product_id,
        ))
    }
    .instrument(span)
    .await?;

    let span = tracing::info_span!("order_processing");
    let result = async {
        let order = system
            .orders
            .place_order(
                &customer,
                CheckoutRequest {
                    items: vec![(product_id, 1)],
                    payment_method: PaymentMethod::Cod,
                    prepaid: false,
                    shipping_fee: Decimal::from(30_000),
                    promo_code: None,
                    delivery_point: Some(GeoPoint::new(10.7769, 106.7009)),
                    note: "Giao giờ hành chính".into(),
                },
            )
            .await?;
        system.orders.confirm_order(&staff, &order.id).await?;
        system.orders.confirm_pickup(&shipper, &order.id).await?;
        system.orders.start_delivery(&shipper, &order.id, None).await?;
        let upload = DeliveryProofUpload {
            image: Some(ProofImage::new("proof.jpg", vec![0xFF, 0xD8, 0xFF, 0xE0])),
            cod_collected: true,
            location: Some(GeoPoint::new(10.7769, 106.7009)),
        };
        system.orders.complete_delivery(&shipper, &order.id, upload).await?;
        system.orders.mark_completed(&customer, &order.id).await
    }
    .instrument(span)
    .await;

    let flash = Flash::from_result(&result, "Đơn hàng đã hoàn thành");
    match &result {
        Ok(order) => info!(order_id = %order.id, total = %order.pricing.total, flash = %flash.message, "Order completed"),
        Err(e) => error!(error = %e, key = flash.key(), "Order processing failed"),
    }

    match system.manager_dashboard().await {
        Ok(dashboard) => info!(revenue = %dashboard.revenue, "Manager dashboard"),
        Err(e) => error!(error = %e, "Dashboard unavailable"),
    }

    // Shutdown system gracefully
    system.shutdown().await.map_err(|e| e.to_string())?;
    listener.abort();

    info!("Application completed successfully");
    Ok(())
}
