use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Customer-facing order status.
///
/// Labels match the strings stored by the shop's back office, so existing rows
/// parse with [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    InDelivery,
    Delivered,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::InDelivery,
        OrderStatus::Delivered,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Chờ xác nhận",
            OrderStatus::Confirmed => "Đã xác nhận",
            OrderStatus::InDelivery => "Đang giao",
            OrderStatus::Delivered => "Đã giao",
            OrderStatus::Completed => "Hoàn thành",
            OrderStatus::Cancelled => "Đã hủy",
        }
    }

    /// Statuses reachable in one step. `InDelivery -> Confirmed` is the failed
    /// delivery loop.
    pub const fn allowed_next(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Confirmed, OrderStatus::Cancelled],
            OrderStatus::Confirmed => &[OrderStatus::InDelivery, OrderStatus::Cancelled],
            OrderStatus::InDelivery => &[OrderStatus::Delivered, OrderStatus::Confirmed],
            OrderStatus::Delivered => &[OrderStatus::Completed],
            OrderStatus::Completed | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_next().is_empty()
    }

    /// Delivered or completed: the order counts as revenue.
    pub fn is_fulfilled(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Completed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("Unknown status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Chờ xác nhận" => Ok(OrderStatus::Pending),
            "Đã xác nhận" => Ok(OrderStatus::Confirmed),
            "Đang giao" => Ok(OrderStatus::InDelivery),
            "Đã giao" => Ok(OrderStatus::Delivered),
            "Hoàn thành" => Ok(OrderStatus::Completed),
            "Đã hủy" | "Đã huỷ" => Ok(OrderStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Shipper acknowledgement of an assignment, separate from [`OrderStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipperStatus {
    Assigned,
    Confirmed,
    Rejected,
}

impl ShipperStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ShipperStatus::Assigned => "Đã phân công",
            ShipperStatus::Confirmed => "Confirmed",
            ShipperStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for ShipperStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ShipperStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Đã phân công" | "Assigned" => Ok(ShipperStatus::Assigned),
            "Confirmed" => Ok(ShipperStatus::Confirmed),
            "Rejected" => Ok(ShipperStatus::Rejected),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "Chưa thanh toán",
            PaymentStatus::Paid => "Đã thanh toán",
            PaymentStatus::Refunded => "Đã hoàn tiền",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cod,
    BankTransfer,
    EWallet,
}

impl PaymentMethod {
    pub fn is_cod(self) -> bool {
        self == PaymentMethod::Cod
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    /// Unit price after automatic product discounts.
    pub discounted_unit_price: Decimal,
}

impl OrderLine {
    pub fn line_total(&self) -> Decimal {
        self.discounted_unit_price * Decimal::from(self.quantity)
    }
}

/// How the order total was reached at checkout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub subtotal: Decimal,
    pub product_discount: Decimal,
    pub order_discount: Decimal,
    pub shipping_fee: Decimal,
    pub shipping_discount: Decimal,
    pub total: Decimal,
    pub applied_discounts: Vec<String>,
    pub promo_code: Option<String>,
}

impl PricingBreakdown {
    pub fn total_discount(&self) -> Decimal {
        self.product_discount + self.order_discount + self.shipping_discount
    }
}

/// A delivery attempt that ended without handing over the parcel.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryFailure {
    pub shipper_id: String,
    pub reason: String,
    pub at: DateTime<Utc>,
}

/// A customer order and its delivery workflow state.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    pub lines: Vec<OrderLine>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub pricing: PricingBreakdown,
    pub note: String,

    pub shipper_id: Option<String>,
    pub shipper_status: Option<ShipperStatus>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub shipper_confirmed_at: Option<DateTime<Utc>>,

    pub delivery_point: Option<GeoPoint>,
    pub pickup_point: Option<GeoPoint>,
    pub delivered_point: Option<GeoPoint>,

    pub delivery_started_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub proof_image: Option<String>,
    pub failed_attempts: u32,
    pub delivery_failures: Vec<DeliveryFailure>,
    pub stock_deducted: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a new order at checkout.
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub customer_id: String,
    pub lines: Vec<OrderLine>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub pricing: PricingBreakdown,
    pub delivery_point: Option<GeoPoint>,
    pub note: String,
    pub placed_at: DateTime<Utc>,
}

impl Order {
    pub fn is_assigned_to(&self, shipper_id: &str) -> bool {
        self.shipper_id.as_deref() == Some(shipper_id)
    }

    /// Whether the order occupies one of its shipper's active slots.
    pub fn occupies_shipper(&self) -> bool {
        matches!(self.status, OrderStatus::Confirmed | OrderStatus::InDelivery)
            && matches!(
                self.shipper_status,
                Some(ShipperStatus::Assigned) | Some(ShipperStatus::Confirmed)
            )
    }

    /// Confirmed orders waiting for a shipper (none yet, or the last one declined).
    pub fn awaiting_shipper(&self) -> bool {
        self.status == OrderStatus::Confirmed
            && matches!(self.shipper_status, None | Some(ShipperStatus::Rejected))
    }

    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}
