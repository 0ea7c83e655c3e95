use chrono::{DateTime, Utc};

use super::actions::{OrderAction, OrderPatch, OrderTransition};
use super::error::OrderError;
use crate::actor_framework::Entity;
use crate::domain::{DeliveryFailure, Order, OrderCreate, OrderStatus, PaymentStatus, ShipperStatus};

impl Entity for Order {
    type Id = String;
    type CreateParams = OrderCreate;
    type UpdateParams = OrderPatch;
    type Action = OrderAction;
    type ActionResult = OrderTransition;
    type Error = OrderError;

    fn id(&self) -> &String {
        &self.id
    }

    /// Creates a new order in status "Chờ xác nhận".
    fn from_create_params(id: String, params: OrderCreate) -> Result<Self, OrderError> {
        if params.lines.is_empty() || params.lines.iter().any(|l| l.quantity == 0) {
            return Err(OrderError::EmptyOrder);
        }
        Ok(Self {
            id,
            customer_id: params.customer_id,
            lines: params.lines,
            status: OrderStatus::Pending,
            payment_status: params.payment_status,
            payment_method: params.payment_method,
            pricing: params.pricing,
            note: params.note,
            shipper_id: None,
            shipper_status: None,
            assigned_at: None,
            shipper_confirmed_at: None,
            delivery_point: params.delivery_point,
            pickup_point: None,
            delivered_point: None,
            delivery_started_at: None,
            delivered_at: None,
            completed_at: None,
            cancelled_at: None,
            proof_image: None,
            failed_attempts: 0,
            delivery_failures: Vec::new(),
            stock_deducted: false,
            created_at: params.placed_at,
            updated_at: params.placed_at,
        })
    }

    /// The delivery address can only change before the parcel leaves the shop.
    fn on_update(&mut self, patch: OrderPatch) -> Result<(), OrderError> {
        if let Some(point) = patch.delivery_point {
            self.require_status("change the delivery address of", &[OrderStatus::Pending, OrderStatus::Confirmed])?;
            self.delivery_point = Some(point);
        }
        if let Some(note) = patch.note {
            self.note = note;
        }
        Ok(())
    }

    /// Only cancelled orders may be purged.
    fn on_delete(&self) -> Result<(), OrderError> {
        self.require_status("delete", &[OrderStatus::Cancelled])
    }

    fn handle_action(&mut self, action: OrderAction) -> Result<OrderTransition, OrderError> {
        let name = action.name();
        let previous = self.status;
        let mut stock_released = false;

        match action {
            OrderAction::Confirm { at } => {
                self.require_status(name, &[OrderStatus::Pending])?;
                self.move_to(name, OrderStatus::Confirmed, at)?;
                self.stock_deducted = true;
            }
            OrderAction::AssignShipper { shipper_id, at } => {
                self.require_status(name, &[OrderStatus::Confirmed])?;
                if !self.awaiting_shipper() {
                    return Err(self.shipper_state_error(name));
                }
                self.shipper_id = Some(shipper_id);
                self.shipper_status = Some(ShipperStatus::Assigned);
                self.assigned_at = Some(at);
                self.shipper_confirmed_at = None;
                self.updated_at = at;
            }
            OrderAction::ConfirmPickup { shipper_id, at } => {
                self.require_shipper(&shipper_id)?;
                self.require_status(name, &[OrderStatus::Confirmed])?;
                self.require_shipper_status(name, ShipperStatus::Assigned)?;
                self.shipper_status = Some(ShipperStatus::Confirmed);
                self.shipper_confirmed_at = Some(at);
                self.updated_at = at;
            }
            OrderAction::DeclineAssignment { shipper_id, at } => {
                self.require_shipper(&shipper_id)?;
                self.require_status(name, &[OrderStatus::Confirmed])?;
                self.require_shipper_status(name, ShipperStatus::Assigned)?;
                self.shipper_status = Some(ShipperStatus::Rejected);
                self.updated_at = at;
            }
            OrderAction::StartDelivery { shipper_id, location, at } => {
                self.require_shipper(&shipper_id)?;
                self.require_status(name, &[OrderStatus::Confirmed])?;
                self.require_shipper_status(name, ShipperStatus::Confirmed)?;
                self.move_to(name, OrderStatus::InDelivery, at)?;
                self.pickup_point = location;
                self.delivery_started_at = Some(at);
            }
            OrderAction::CompleteDelivery {
                shipper_id,
                proof_image,
                cod_collected,
                location,
                at,
            } => {
                if proof_image.trim().is_empty() {
                    return Err(OrderError::MissingProofImage);
                }
                self.require_shipper(&shipper_id)?;
                self.require_status(name, &[OrderStatus::InDelivery])?;
                self.move_to(name, OrderStatus::Delivered, at)?;
                self.proof_image = Some(proof_image);
                self.delivered_point = location;
                self.delivered_at = Some(at);
                if self.payment_method.is_cod() {
                    self.payment_status = if cod_collected {
                        PaymentStatus::Paid
                    } else {
                        PaymentStatus::Unpaid
                    };
                }
            }
            OrderAction::FailDelivery { shipper_id, reason, at } => {
                self.require_shipper(&shipper_id)?;
                self.require_status(name, &[OrderStatus::InDelivery])?;
                self.move_to(name, OrderStatus::Confirmed, at)?;
                self.append_note(at, &format!("Giao thất bại: {}", reason.trim()));
                self.failed_attempts += 1;
                self.delivery_failures.push(DeliveryFailure {
                    shipper_id,
                    reason: reason.trim().to_string(),
                    at,
                });
                // Back in the queue for a fresh assignment.
                self.shipper_id = None;
                self.shipper_status = None;
                self.assigned_at = None;
                self.shipper_confirmed_at = None;
                self.delivery_started_at = None;
                self.pickup_point = None;
            }
            OrderAction::MarkCompleted { at } => {
                self.require_status(name, &[OrderStatus::Delivered])?;
                self.move_to(name, OrderStatus::Completed, at)?;
                self.completed_at = Some(at);
            }
            OrderAction::Cancel { reason, at } => {
                self.require_status(name, &[OrderStatus::Pending, OrderStatus::Confirmed])?;
                self.move_to(name, OrderStatus::Cancelled, at)?;
                self.append_note(at, &format!("Hủy đơn: {}", reason.trim()));
                self.cancelled_at = Some(at);
                stock_released = self.stock_deducted;
                self.stock_deducted = false;
                if self.payment_status == PaymentStatus::Paid {
                    self.payment_status = PaymentStatus::Refunded;
                }
            }
        }

        Ok(OrderTransition {
            previous,
            order: self.clone(),
            stock_released,
        })
    }
}

impl Order {
    fn require_status(&self, action: &'static str, allowed: &[OrderStatus]) -> Result<(), OrderError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(OrderError::InvalidTransition { action, status: self.status })
        }
    }

    fn require_shipper(&self, shipper_id: &str) -> Result<(), OrderError> {
        if self.is_assigned_to(shipper_id) {
            Ok(())
        } else {
            Err(OrderError::NotAssignedShipper {
                order_id: self.id.clone(),
                shipper_id: shipper_id.to_string(),
            })
        }
    }

    fn require_shipper_status(&self, action: &'static str, expected: ShipperStatus) -> Result<(), OrderError> {
        if self.shipper_status == Some(expected) {
            Ok(())
        } else {
            Err(self.shipper_state_error(action))
        }
    }

    fn shipper_state_error(&self, action: &'static str) -> OrderError {
        OrderError::InvalidShipperState {
            action,
            shipper_status: self.shipper_status,
        }
    }

    fn move_to(&mut self, action: &'static str, next: OrderStatus, at: DateTime<Utc>) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition { action, status: self.status });
        }
        self.status = next;
        self.updated_at = at;
        Ok(())
    }

    fn append_note(&mut self, at: DateTime<Utc>, entry: &str) {
        if !self.note.is_empty() {
            self.note.push('\n');
        }
        self.note.push_str(&format!("[{}] {}", at.format("%d/%m/%Y %H:%M"), entry));
    }
}
