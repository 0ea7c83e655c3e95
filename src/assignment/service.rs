use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::error::AssignmentError;
use crate::actor_framework::{FrameworkError, ResourceClient};
use crate::clients::{AssignmentClient, ShipperClient};
use crate::domain::{AssignmentRecord, AssignmentResponse, Order, ShipperStatus};
use crate::messages::{AssignmentRequest, ServiceResponse};
use crate::notifications::{NotificationHub, ShopEvent};
use crate::order_actor::{OrderAction, OrderError};

struct PendingConfirmation {
    shipper_id: String,
    timer: JoinHandle<()>,
}

/// Assignment actor. Owns the assignment history and one confirmation timer per
/// order awaiting pickup confirmation. Timers report back through a weak handle
/// to this actor's own mailbox, so they never keep it alive.
pub struct AssignmentService {
    receiver: mpsc::Receiver<AssignmentRequest>,
    mailbox: mpsc::WeakSender<AssignmentRequest>,
    orders: ResourceClient<Order>,
    shippers: ShipperClient,
    hub: NotificationHub,
    confirm_timeout: Duration,
    pending: HashMap<String, PendingConfirmation>,
    history: Vec<AssignmentRecord>,
}

impl AssignmentService {
    pub fn new(
        buffer_size: usize,
        orders: ResourceClient<Order>,
        shippers: ShipperClient,
        hub: NotificationHub,
        confirm_timeout: Duration,
    ) -> (Self, AssignmentClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self {
            receiver,
            mailbox: sender.downgrade(),
            orders,
            shippers,
            hub,
            confirm_timeout,
            pending: HashMap::new(),
            history: Vec::new(),
        };
        (service, AssignmentClient::new(sender))
    }

    #[instrument(name = "assignment_service", skip(self))]
    pub async fn run(mut self) {
        info!(timeout_secs = self.confirm_timeout.as_secs(), "AssignmentService starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                AssignmentRequest::AssignOrder { order_id, respond_to } => {
                    let _ = respond_to.send(self.assign_order(&order_id).await);
                }
                AssignmentRequest::ConfirmPickup { order_id, shipper_id, respond_to } => {
                    let _ = respond_to.send(self.confirm_pickup(&order_id, &shipper_id).await);
                }
                AssignmentRequest::RejectAssignment { order_id, shipper_id, reason, respond_to } => {
                    let _ = respond_to.send(self.reject_assignment(&order_id, &shipper_id, reason).await);
                }
                AssignmentRequest::Release { order_id, respond_to } => {
                    self.handle_release(order_id, respond_to).await;
                }
                AssignmentRequest::UpdateShipperStats { shipper_id, respond_to } => {
                    let _ = respond_to.send(self.update_shipper_stats(&shipper_id).await);
                }
                AssignmentRequest::History { order_id, respond_to } => {
                    let records = self.history.iter().filter(|r| r.order_id == order_id).cloned().collect();
                    let _ = respond_to.send(Ok(records));
                }
                AssignmentRequest::TimedOut { order_id, shipper_id } => {
                    if let Err(e) = self.handle_timeout(&order_id, &shipper_id).await {
                        warn!(%order_id, %shipper_id, error = %e, "Timeout handling failed");
                    }
                }
                AssignmentRequest::Shutdown => {
                    info!("AssignmentService shutting down");
                    break;
                }
                #[cfg(test)]
                AssignmentRequest::PendingTimers { respond_to } => {
                    let _ = respond_to.send(Ok(self.pending.len()));
                }
            }
        }
        for (_, pending) in self.pending.drain() {
            pending.timer.abort();
        }
        info!("AssignmentService stopped");
    }

    /// Least-loaded working shipper with spare capacity who has not already
    /// declined this order. Ties go to the smallest id.
    #[instrument(skip(self))]
    async fn assign_order(&mut self, order_id: &str) -> Result<Option<String>, AssignmentError> {
        let order = self.load_order(order_id).await?;
        if !order.awaiting_shipper() {
            return Err(AssignmentError::NotAssignable {
                order_id: order_id.to_string(),
                reason: format!(
                    "status '{}', shipper status '{}'",
                    order.status,
                    order.shipper_status.map_or("none", |s| s.label())
                ),
            });
        }

        let declined: HashSet<&str> = self
            .history
            .iter()
            .filter(|r| r.order_id == order_id && r.declined())
            .map(|r| r.shipper_id.as_str())
            .collect();
        let loads = self.active_loads().await?;
        let candidate = self
            .shippers
            .list_shippers()
            .await?
            .into_iter()
            .filter(|s| s.is_working && !declined.contains(s.id.as_str()))
            .map(|s| {
                let load = loads.get(&s.id).copied().unwrap_or(0);
                (load, s)
            })
            .filter(|(load, s)| *load < s.max_active_orders)
            .min_by(|(a, sa), (b, sb)| a.cmp(b).then_with(|| sa.id.cmp(&sb.id)));

        let Some((_, shipper)) = candidate else {
            warn!("No shipper available");
            return Ok(None);
        };

        let now = Utc::now();
        self.orders
            .perform_action(
                order_id.to_string(),
                OrderAction::AssignShipper { shipper_id: shipper.id.clone(), at: now },
            )
            .await?;
        self.history.push(AssignmentRecord::pending(order_id, &shipper.id, now));
        self.update_shipper_stats(&shipper.id).await?;
        self.start_timer(order_id, &shipper.id);

        self.hub.publish(ShopEvent::notify(
            &shipper.id,
            format!("Bạn được phân công giao đơn hàng #{}", order_id),
        ));
        info!(shipper_id = %shipper.id, "Order assigned");
        Ok(Some(shipper.id))
    }

    #[instrument(skip(self))]
    async fn confirm_pickup(&mut self, order_id: &str, shipper_id: &str) -> Result<bool, AssignmentError> {
        let result = self
            .orders
            .perform_action(
                order_id.to_string(),
                OrderAction::ConfirmPickup { shipper_id: shipper_id.to_string(), at: Utc::now() },
            )
            .await;
        match result {
            Ok(_) => {}
            Err(FrameworkError::Entity(
                e @ (OrderError::NotAssignedShipper { .. }
                | OrderError::InvalidShipperState { .. }
                | OrderError::InvalidTransition { .. }),
            )) => {
                debug!(error = %e, "Pickup confirmation refused");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        }

        self.cancel_timer(order_id);
        self.close_attempt(order_id, shipper_id, AssignmentResponse::Accepted, None);
        self.update_shipper_stats(shipper_id).await?;
        info!("Pickup confirmed");
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn reject_assignment(
        &mut self,
        order_id: &str,
        shipper_id: &str,
        reason: String,
    ) -> Result<Option<String>, AssignmentError> {
        self.decline(order_id, shipper_id, AssignmentResponse::Rejected, Some(reason)).await?;
        self.assign_order(order_id).await
    }

    async fn handle_timeout(&mut self, order_id: &str, shipper_id: &str) -> Result<(), AssignmentError> {
        match self.pending.get(order_id) {
            Some(p) if p.shipper_id == shipper_id => {
                self.pending.remove(order_id);
            }
            _ => {
                debug!(order_id, shipper_id, "Stale confirmation timer");
                return Ok(());
            }
        }
        let order = self.load_order(order_id).await?;
        if !order.is_assigned_to(shipper_id) || order.shipper_status != Some(ShipperStatus::Assigned) {
            return Ok(());
        }
        warn!(order_id, shipper_id, "Shipper did not confirm in time");
        self.decline(order_id, shipper_id, AssignmentResponse::Timeout, None).await?;
        self.assign_order(order_id).await?;
        Ok(())
    }

    async fn decline(
        &mut self,
        order_id: &str,
        shipper_id: &str,
        response: AssignmentResponse,
        note: Option<String>,
    ) -> Result<(), AssignmentError> {
        self.orders
            .perform_action(
                order_id.to_string(),
                OrderAction::DeclineAssignment { shipper_id: shipper_id.to_string(), at: Utc::now() },
            )
            .await?;
        self.cancel_timer(order_id);
        self.close_attempt(order_id, shipper_id, response, note);
        self.update_shipper_stats(shipper_id).await?;
        Ok(())
    }

    async fn handle_release(&mut self, order_id: String, respond_to: ServiceResponse<(), AssignmentError>) {
        self.cancel_timer(&order_id);
        let shipper = self
            .history
            .iter()
            .rev()
            .find(|r| r.order_id == order_id)
            .map(|r| r.shipper_id.clone());
        let result = match shipper {
            Some(shipper_id) => self.update_shipper_stats(&shipper_id).await.map(|_| ()),
            None => Ok(()),
        };
        let _ = respond_to.send(result);
    }

    /// Recomputes the cached active-order count from the order store.
    #[instrument(skip(self))]
    async fn update_shipper_stats(&mut self, shipper_id: &str) -> Result<u32, AssignmentError> {
        let count = self.active_loads().await?.get(shipper_id).copied().unwrap_or(0);
        self.shippers.set_active_orders(shipper_id.to_string(), count).await?;
        debug!(count, "Shipper stats updated");
        Ok(count)
    }

    async fn active_loads(&self) -> Result<BTreeMap<String, u32>, AssignmentError> {
        let mut loads = BTreeMap::new();
        for order in self.orders.list().await? {
            if let (true, Some(shipper_id)) = (order.occupies_shipper(), order.shipper_id) {
                *loads.entry(shipper_id).or_insert(0) += 1;
            }
        }
        Ok(loads)
    }

    async fn load_order(&self, order_id: &str) -> Result<Order, AssignmentError> {
        self.orders
            .get(order_id.to_string())
            .await?
            .ok_or_else(|| AssignmentError::OrderNotFound(order_id.to_string()))
    }

    fn close_attempt(&mut self, order_id: &str, shipper_id: &str, response: AssignmentResponse, note: Option<String>) {
        if let Some(record) = self
            .history
            .iter_mut()
            .rev()
            .find(|r| r.order_id == order_id && r.shipper_id == shipper_id && r.response == AssignmentResponse::Pending)
        {
            record.response = response;
            record.responded_at = Some(Utc::now());
            record.note = note;
        }
    }

    fn start_timer(&mut self, order_id: &str, shipper_id: &str) {
        self.cancel_timer(order_id);
        let mailbox = self.mailbox.clone();
        let timeout = self.confirm_timeout;
        let (order, shipper) = (order_id.to_string(), shipper_id.to_string());
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(sender) = mailbox.upgrade() {
                let _ = sender
                    .send(AssignmentRequest::TimedOut { order_id: order, shipper_id: shipper })
                    .await;
            }
        });
        self.pending.insert(
            order_id.to_string(),
            PendingConfirmation { shipper_id: shipper_id.to_string(), timer },
        );
    }

    fn cancel_timer(&mut self, order_id: &str) {
        if let Some(pending) = self.pending.remove(order_id) {
            pending.timer.abort();
        }
    }
}
