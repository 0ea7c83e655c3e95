use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use super::{AssignmentClient, DiscountClient, InventoryClient, PromotionClient, UserClient};
use crate::actor_framework::ResourceClient;
use crate::delivery_proof::{ProofImage, ProofStore};
use crate::domain::{
    AssignmentRecord, Caller, GeoPoint, Order, OrderCreate, OrderStatus, PaymentMethod, PaymentStatus, Role,
    StockLine,
};
use crate::inventory_actor::InventoryError;
use crate::notifications::{NotificationHub, ShopEvent};
use crate::order_actor::{OrderAction, OrderError, OrderPatch, OrderTransition};
use crate::promotion::price_checkout;

/// Largest quantity a single cart line may ask for.
pub const MAX_LINE_QUANTITY: u32 = 1_000;

/// Collaborators the order workflow calls into.
#[derive(Clone)]
pub struct OrderServices {
    pub inventory: InventoryClient,
    pub users: UserClient,
    pub assignment: AssignmentClient,
    pub discounts: DiscountClient,
    pub promotions: PromotionClient,
    pub proofs: ProofStore,
    pub hub: NotificationHub,
    pub vnd_per_loyalty_point: Decimal,
}

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Product id and quantity per cart line.
    pub items: Vec<(String, u32)>,
    pub payment_method: PaymentMethod,
    /// Set when an online payment already went through at the gateway.
    pub prepaid: bool,
    pub shipping_fee: Decimal,
    pub promo_code: Option<String>,
    pub delivery_point: Option<GeoPoint>,
    pub note: String,
}

/// What the shipper app sends when handing over a parcel.
#[derive(Debug, Clone)]
pub struct DeliveryProofUpload {
    pub image: Option<ProofImage>,
    pub cod_collected: bool,
    pub location: Option<GeoPoint>,
}

/// Role-checked order workflow on top of the order store.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
    services: OrderServices,
}

impl_client_methods!(OrderClient, Order, OrderError, order);

fn forbid(caller: &Caller, action: &'static str) -> OrderError {
    OrderError::Forbidden { role: caller.role, action }
}

fn require_back_office(caller: &Caller, action: &'static str) -> Result<(), OrderError> {
    if caller.role.is_back_office() {
        Ok(())
    } else {
        Err(forbid(caller, action))
    }
}

fn require_shipper_role(caller: &Caller, action: &'static str) -> Result<(), OrderError> {
    if caller.role == Role::Shipper {
        Ok(())
    } else {
        Err(forbid(caller, action))
    }
}

fn stock_error(err: InventoryError, status: OrderStatus) -> OrderError {
    match err {
        InventoryError::Insufficient(shortages) => OrderError::InsufficientStock(
            shortages.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", "),
        ),
        InventoryError::AlreadyDeducted(_) => OrderError::InvalidTransition { action: "confirm", status },
        InventoryError::ActorCommunicationError(msg) => OrderError::ActorCommunicationError(msg),
        other => OrderError::ValidationError(other.to_string()),
    }
}

impl OrderClient {
    pub fn new(inner: ResourceClient<Order>, services: OrderServices) -> Self {
        Self { inner, services }
    }

    async fn load(&self, order_id: &str) -> Result<Order, OrderError> {
        self.inner
            .get(order_id.to_string())
            .await?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))
    }

    async fn apply(&self, order_id: &str, action: OrderAction) -> Result<OrderTransition, OrderError> {
        let transition = self.inner.perform_action(order_id.to_string(), action).await?;
        self.publish_status(&transition.order);
        Ok(transition)
    }

    fn publish_status(&self, order: &Order) {
        self.services
            .hub
            .publish(ShopEvent::status_update(&order.id, order.status, order.shipper_id.as_deref()));
    }

    fn notify(&self, user_id: &str, message: String) {
        self.services.hub.publish(ShopEvent::notify(user_id, message));
    }

    /// Hands a confirmed order to the assignment service. An order nobody can
    /// take stays queued for staff, so failures here are logged only.
    async fn try_assign(&self, order_id: &str) -> Option<String> {
        match self.services.assignment.assign_order(order_id.to_string()).await {
            Ok(Some(shipper_id)) => Some(shipper_id),
            Ok(None) => {
                warn!(order_id, "No shipper available; order waits for manual assignment");
                None
            }
            Err(e) => {
                warn!(order_id, error = %e, "Automatic assignment failed");
                None
            }
        }
    }

    async fn refresh_shipper_stats(&self, shipper_id: &str) {
        if let Err(e) = self.services.assignment.update_shipper_stats(shipper_id.to_string()).await {
            warn!(shipper_id, error = %e, "Could not refresh shipper stats");
        }
    }

    /// Prices the cart, redeems the promotion code, and stores a new pending order.
    #[instrument(skip(self, request), fields(customer = %caller.user_id, items = request.items.len()))]
    pub async fn place_order(&self, caller: &Caller, request: CheckoutRequest) -> Result<Order, OrderError> {
        if request.items.is_empty() || request.items.iter().any(|(_, qty)| *qty == 0) {
            return Err(OrderError::EmptyOrder);
        }
        if let Some((product_id, qty)) = request.items.iter().find(|(_, qty)| *qty > MAX_LINE_QUANTITY) {
            return Err(OrderError::ValidationError(format!(
                "Quantity {} of product {} exceeds the limit of {} per line",
                qty, product_id, MAX_LINE_QUANTITY
            )));
        }
        let now = Utc::now();

        let mut items = Vec::with_capacity(request.items.len());
        for (product_id, quantity) in &request.items {
            let product = self
                .services
                .inventory
                .get_product(product_id.clone())
                .await
                .map_err(|e| OrderError::ActorCommunicationError(e.to_string()))?
                .filter(|p| p.is_active)
                .ok_or_else(|| OrderError::ValidationError(format!("Product {} is not available", product_id)))?;
            items.push((product, *quantity));
        }

        let discounts = self
            .services
            .discounts
            .live_discounts(now)
            .await
            .map_err(|e| OrderError::Pricing(e.to_string()))?;
        let promotion = match &request.promo_code {
            Some(code) => Some(
                self.services
                    .promotions
                    .find_by_code(code)
                    .await
                    .map_err(|e| OrderError::Pricing(e.to_string()))?,
            ),
            None => None,
        };
        let code = promotion.as_ref().zip(request.promo_code.as_deref());
        let (lines, pricing) = price_checkout(&items, &discounts, code, request.shipping_fee, now)
            .map_err(|e| OrderError::Pricing(e.to_string()))?;

        if let Some(code) = &pricing.promo_code {
            self.services
                .promotions
                .redeem_code(code, now)
                .await
                .map_err(|e| OrderError::Pricing(e.to_string()))?;
        }

        let payment_status = if request.prepaid && !request.payment_method.is_cod() {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Unpaid
        };
        let redeemed = pricing.promo_code.clone();
        let created = self
            .inner
            .create(OrderCreate {
                customer_id: caller.user_id.clone(),
                lines,
                payment_method: request.payment_method,
                payment_status,
                pricing,
                delivery_point: request.delivery_point,
                note: request.note,
                placed_at: now,
            })
            .await;
        let id = match created {
            Ok(id) => id,
            Err(e) => {
                if let Some(code) = redeemed {
                    if let Err(release) = self.services.promotions.release_code(&code).await {
                        warn!(code = %code, error = %release, "Could not give back promotion code use");
                    }
                }
                return Err(e.into());
            }
        };
        let order = self.load(&id).await?;
        info!(order_id = %id, total = %order.pricing.total, "Order placed");
        self.publish_status(&order);
        Ok(order)
    }

    /// Staff confirmation: takes stock for every line and ingredient, all or
    /// nothing, then starts shipper assignment.
    #[instrument(skip(self), fields(caller = %caller.user_id))]
    pub async fn confirm_order(&self, caller: &Caller, order_id: &str) -> Result<Order, OrderError> {
        require_back_office(caller, "confirm orders")?;
        let order = self.load(order_id).await?;
        if order.status != OrderStatus::Pending {
            return Err(OrderError::InvalidTransition { action: "confirm", status: order.status });
        }

        let lines = order
            .lines
            .iter()
            .map(|l| StockLine { product_id: l.product_id.clone(), quantity: l.quantity })
            .collect();
        self.services
            .inventory
            .deduct_for_order(order_id.to_string(), lines)
            .await
            .map_err(|e| stock_error(e, order.status))?;

        if let Err(e) = self.apply(order_id, OrderAction::Confirm { at: Utc::now() }).await {
            warn!(error = %e, "Confirmation failed after stock was taken; returning stock");
            if let Err(release) = self.services.inventory.release_for_order(order_id.to_string()).await {
                warn!(error = %release, "Stock release failed");
            }
            return Err(e);
        }
        self.notify(&order.customer_id, format!("Đơn hàng #{} đã được xác nhận", order_id));
        info!("Order confirmed");

        self.try_assign(order_id).await;
        self.load(order_id).await
    }

    /// Manual (re)assignment by staff for an order waiting on a shipper.
    #[instrument(skip(self), fields(caller = %caller.user_id))]
    pub async fn assign_shipper(&self, caller: &Caller, order_id: &str) -> Result<Option<String>, OrderError> {
        require_back_office(caller, "assign shippers")?;
        let shipper = self.services.assignment.assign_order(order_id.to_string()).await?;
        if shipper.is_some() {
            self.publish_status(&self.load(order_id).await?);
        }
        Ok(shipper)
    }

    #[instrument(skip(self), fields(shipper = %caller.user_id))]
    pub async fn confirm_pickup(&self, caller: &Caller, order_id: &str) -> Result<bool, OrderError> {
        require_shipper_role(caller, "confirm pickups")?;
        let confirmed = self
            .services
            .assignment
            .confirm_pickup(order_id.to_string(), caller.user_id.clone())
            .await?;
        if confirmed {
            self.publish_status(&self.load(order_id).await?);
        }
        Ok(confirmed)
    }

    /// Returns the shipper the order moved to, if any.
    #[instrument(skip(self), fields(shipper = %caller.user_id))]
    pub async fn reject_assignment(
        &self,
        caller: &Caller,
        order_id: &str,
        reason: &str,
    ) -> Result<Option<String>, OrderError> {
        require_shipper_role(caller, "reject assignments")?;
        let next = self
            .services
            .assignment
            .reject_assignment(order_id.to_string(), caller.user_id.clone(), reason.trim().to_string())
            .await?;
        self.publish_status(&self.load(order_id).await?);
        Ok(next)
    }

    #[instrument(skip(self), fields(shipper = %caller.user_id))]
    pub async fn start_delivery(
        &self,
        caller: &Caller,
        order_id: &str,
        location: Option<GeoPoint>,
    ) -> Result<Order, OrderError> {
        require_shipper_role(caller, "start deliveries")?;
        let transition = self
            .apply(
                order_id,
                OrderAction::StartDelivery { shipper_id: caller.user_id.clone(), location, at: Utc::now() },
            )
            .await?;
        self.notify(
            &transition.order.customer_id,
            format!("Đơn hàng #{} đang được giao", order_id),
        );
        Ok(transition.order)
    }

    /// Stores the proof image, then marks the order delivered. The image is
    /// removed again if the order update is refused.
    #[instrument(skip(self, upload), fields(shipper = %caller.user_id))]
    pub async fn complete_delivery(
        &self,
        caller: &Caller,
        order_id: &str,
        upload: DeliveryProofUpload,
    ) -> Result<Order, OrderError> {
        require_shipper_role(caller, "complete deliveries")?;
        let image = upload.image.ok_or(OrderError::MissingProofImage)?;

        let order = self.load(order_id).await?;
        if !order.is_assigned_to(&caller.user_id) {
            return Err(OrderError::NotAssignedShipper {
                order_id: order_id.to_string(),
                shipper_id: caller.user_id.clone(),
            });
        }
        if order.status != OrderStatus::InDelivery {
            return Err(OrderError::InvalidTransition { action: "complete delivery of", status: order.status });
        }

        let now = Utc::now();
        let path = self.services.proofs.save(order_id, &image, now).await?;
        let action = OrderAction::CompleteDelivery {
            shipper_id: caller.user_id.clone(),
            proof_image: path.to_string_lossy().into_owned(),
            cod_collected: upload.cod_collected,
            location: upload.location,
            at: now,
        };
        let transition = match self.apply(order_id, action).await {
            Ok(t) => t,
            Err(e) => {
                self.services.proofs.discard(&path).await;
                return Err(e);
            }
        };

        self.refresh_shipper_stats(&caller.user_id).await;
        self.notify(&order.customer_id, format!("Đơn hàng #{} đã được giao", order_id));
        info!(payment_status = %transition.order.payment_status.label(), "Delivery completed");
        Ok(transition.order)
    }

    /// Records a failed attempt: back to confirmed, shipper released, order
    /// queued for another assignment.
    #[instrument(skip(self), fields(shipper = %caller.user_id))]
    pub async fn fail_delivery(&self, caller: &Caller, order_id: &str, reason: &str) -> Result<Order, OrderError> {
        require_shipper_role(caller, "report failed deliveries")?;
        if reason.trim().is_empty() {
            return Err(OrderError::ValidationError("A failure reason is required".to_string()));
        }
        let transition = self
            .apply(
                order_id,
                OrderAction::FailDelivery {
                    shipper_id: caller.user_id.clone(),
                    reason: reason.to_string(),
                    at: Utc::now(),
                },
            )
            .await?;
        self.refresh_shipper_stats(&caller.user_id).await;
        self.notify(
            &transition.order.customer_id,
            format!("Giao đơn hàng #{} không thành công: {}", order_id, reason.trim()),
        );
        self.try_assign(order_id).await;
        self.load(order_id).await
    }

    /// Customer acknowledgement of receipt. Awards loyalty points.
    #[instrument(skip(self), fields(caller = %caller.user_id))]
    pub async fn mark_completed(&self, caller: &Caller, order_id: &str) -> Result<Order, OrderError> {
        let order = self.load(order_id).await?;
        if order.customer_id != caller.user_id && !caller.role.is_back_office() {
            return Err(forbid(caller, "complete this order"));
        }
        let transition = self.apply(order_id, OrderAction::MarkCompleted { at: Utc::now() }).await?;

        let points = (transition.order.pricing.total / self.services.vnd_per_loyalty_point)
            .floor()
            .to_u64()
            .unwrap_or(0);
        if points > 0 {
            match self.services.users.award_points(order.customer_id.clone(), points).await {
                Ok(balance) => {
                    debug!(points, balance, "Loyalty points awarded");
                    self.notify(
                        &order.customer_id,
                        format!("Bạn nhận được {} điểm thưởng từ đơn hàng #{}", points, order_id),
                    );
                }
                Err(e) => warn!(error = %e, "Could not award loyalty points"),
            }
        }
        Ok(transition.order)
    }

    /// Customers may cancel their own pending orders; staff may also cancel
    /// confirmed ones. Deducted stock is returned.
    #[instrument(skip(self), fields(caller = %caller.user_id))]
    pub async fn cancel_order(&self, caller: &Caller, order_id: &str, reason: &str) -> Result<Order, OrderError> {
        let order = self.load(order_id).await?;
        let is_owner = order.customer_id == caller.user_id;
        if !caller.role.is_back_office() {
            if !is_owner {
                return Err(forbid(caller, "cancel this order"));
            }
            if order.status != OrderStatus::Pending {
                return Err(OrderError::InvalidTransition { action: "cancel", status: order.status });
            }
        }

        let transition = self
            .apply(order_id, OrderAction::Cancel { reason: reason.to_string(), at: Utc::now() })
            .await?;
        if transition.stock_released {
            self.services
                .inventory
                .release_for_order(order_id.to_string())
                .await
                .map_err(|e| OrderError::ActorCommunicationError(e.to_string()))?;
        }
        if transition.previous == OrderStatus::Confirmed {
            self.services.assignment.release(order_id.to_string()).await?;
        }
        if let (Some(shipper_id), Some(_)) = (&order.shipper_id, order.shipper_status) {
            self.notify(shipper_id, format!("Đơn hàng #{} đã bị hủy", order_id));
        }
        info!(refunded = transition.order.payment_status == PaymentStatus::Refunded, "Order cancelled");
        Ok(transition.order)
    }

    #[instrument(skip(self), fields(caller = %caller.user_id))]
    pub async fn update_order(&self, caller: &Caller, order_id: &str, patch: OrderPatch) -> Result<Order, OrderError> {
        let order = self.load(order_id).await?;
        if order.customer_id != caller.user_id && !caller.role.is_back_office() {
            return Err(forbid(caller, "edit this order"));
        }
        Ok(self.inner.update(order_id.to_string(), patch).await?)
    }

    pub async fn orders_for_customer(&self, customer_id: &str) -> Result<Vec<Order>, OrderError> {
        let orders = self.inner.list().await?;
        Ok(orders.into_iter().filter(|o| o.customer_id == customer_id).collect())
    }

    pub async fn orders_for_shipper(&self, shipper_id: &str) -> Result<Vec<Order>, OrderError> {
        let orders = self.inner.list().await?;
        Ok(orders.into_iter().filter(|o| o.is_assigned_to(shipper_id)).collect())
    }

    pub async fn assignment_history(&self, order_id: &str) -> Result<Vec<AssignmentRecord>, OrderError> {
        Ok(self.services.assignment.history(order_id.to_string()).await?)
    }
}
