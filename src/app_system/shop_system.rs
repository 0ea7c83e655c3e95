use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::config::ShopConfig;
use super::error::SystemError;
use crate::actor_framework::{sequential_ids, ResourceActor};
use crate::assignment::AssignmentService;
use crate::chat_guard::{spawn_sweeper, ChatGuard};
use crate::clients::{
    AssignmentClient, DiscountClient, InventoryClient, OrderClient, OrderServices, PromotionClient, ShipperClient,
    UserClient,
};
use crate::dashboard::{
    admin_dashboard, manager_dashboard, shipper_dashboard, staff_dashboard, AdminDashboard, ManagerDashboard,
    ShipperDashboard, StaffDashboard,
};
use crate::delivery_proof::ProofStore;
use crate::domain::{Order, ProductDiscount, Promotion, ShipperProfile, User};
use crate::inventory_actor::InventoryService;
use crate::notifications::NotificationHub;

/// The running shop: every actor, the chat guard and its sweeper, and the
/// clients that front them.
///
/// Must be created inside a tokio runtime.
pub struct ShopSystem {
    pub config: ShopConfig,
    pub orders: OrderClient,
    pub users: UserClient,
    pub shippers: ShipperClient,
    pub inventory: InventoryClient,
    pub discounts: DiscountClient,
    pub promotions: PromotionClient,
    pub assignment: AssignmentClient,
    pub chat_guard: Arc<ChatGuard>,
    pub hub: NotificationHub,
    sweeper_shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl ShopSystem {
    pub fn new(config: ShopConfig) -> Result<Self, SystemError> {
        let buffer = config.actor_buffer;
        let hub = NotificationHub::new(config.notification_capacity);
        let mut handles = Vec::new();

        let (user_actor, user_inner) = ResourceActor::<User>::new(buffer, sequential_ids("user"));
        handles.push(tokio::spawn(user_actor.run()));
        let users = UserClient::new(user_inner);

        // Profiles are keyed by user id; the generator is only a fallback.
        let (shipper_actor, shipper_inner) = ResourceActor::<ShipperProfile>::new(buffer, sequential_ids("shipper"));
        handles.push(tokio::spawn(shipper_actor.run()));
        let shippers = ShipperClient::new(shipper_inner);

        let (discount_actor, discount_inner) =
            ResourceActor::<ProductDiscount>::new(buffer, sequential_ids("discount"));
        handles.push(tokio::spawn(discount_actor.run()));
        let discounts = DiscountClient::new(discount_inner);

        let (promotion_actor, promotion_inner) = ResourceActor::<Promotion>::new(buffer, sequential_ids("promotion"));
        handles.push(tokio::spawn(promotion_actor.run()));
        let promotions = PromotionClient::new(promotion_inner);

        let (inventory_service, inventory) = InventoryService::new(buffer);
        handles.push(tokio::spawn(inventory_service.run()));

        let (order_actor, order_inner) = ResourceActor::<Order>::new(buffer, sequential_ids("order"));
        handles.push(tokio::spawn(order_actor.run()));

        let (assignment_service, assignment) = AssignmentService::new(
            buffer,
            order_inner.clone(),
            shippers.clone(),
            hub.clone(),
            config.assignment_timeout(),
        );
        handles.push(tokio::spawn(assignment_service.run()));

        let orders = OrderClient::new(
            order_inner,
            OrderServices {
                inventory: inventory.clone(),
                users: users.clone(),
                assignment: assignment.clone(),
                discounts: discounts.clone(),
                promotions: promotions.clone(),
                proofs: ProofStore::from_config(&config),
                hub: hub.clone(),
                vnd_per_loyalty_point: config.vnd_per_loyalty_point,
            },
        );

        let chat_guard = Arc::new(ChatGuard::new(&config.chat, users.clone())?);
        let (sweeper_shutdown, shutdown_rx) = watch::channel(false);
        handles.push(spawn_sweeper(chat_guard.clone(), config.chat.sweep_interval(), shutdown_rx));

        info!(actors = handles.len(), "Shop system started");
        Ok(Self {
            config,
            orders,
            users,
            shippers,
            inventory,
            discounts,
            promotions,
            assignment,
            chat_guard,
            hub,
            sweeper_shutdown,
            handles,
        })
    }

    pub async fn shipper_dashboard(&self, shipper_id: &str) -> Result<ShipperDashboard, SystemError> {
        let orders = self.orders.list_orders().await?;
        Ok(shipper_dashboard(&orders, shipper_id, Utc::now().date_naive()))
    }

    pub async fn staff_dashboard(&self) -> Result<StaffDashboard, SystemError> {
        let orders = self.orders.list_orders().await?;
        let products = self.inventory.list_products().await?;
        let variants = self.inventory.list_variants().await?;
        Ok(staff_dashboard(&orders, &products, &variants, self.config.low_stock_threshold))
    }

    pub async fn manager_dashboard(&self) -> Result<ManagerDashboard, SystemError> {
        Ok(manager_dashboard(&self.orders.list_orders().await?))
    }

    pub async fn admin_dashboard(&self) -> Result<AdminDashboard, SystemError> {
        Ok(admin_dashboard(&self.users.list_users().await?))
    }

    /// Stops the hand-written actors and the sweeper, drops every client so the
    /// resource actors drain, then waits for all tasks.
    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down shop system...");
        let _ = self.sweeper_shutdown.send(true);
        self.assignment.shutdown().await;
        self.inventory.shutdown().await;

        drop(self.orders);
        drop(self.users);
        drop(self.shippers);
        drop(self.inventory);
        drop(self.discounts);
        drop(self.promotions);
        drop(self.assignment);
        drop(self.chat_guard);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(SystemError::TaskFailed(e.to_string()));
            }
        }

        info!("Shop system shutdown complete.");
        Ok(())
    }
}
