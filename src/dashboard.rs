//! Read-only per-role summaries over snapshots of the stores.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{
    FlowerVariant, Order, OrderStatus, PaymentStatus, Product, Role, ShipperStatus, User,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipperDashboard {
    /// Assigned, waiting for the shipper to confirm pickup.
    pub awaiting_confirmation: Vec<String>,
    /// Pickup confirmed, delivery not started.
    pub ready_to_start: Vec<String>,
    pub in_delivery: Vec<String>,
    pub delivered_today: usize,
    pub failed_today: usize,
    pub cod_collected_today: Decimal,
}

pub fn shipper_dashboard(orders: &[Order], shipper_id: &str, today: NaiveDate) -> ShipperDashboard {
    let mine = || orders.iter().filter(move |o| o.is_assigned_to(shipper_id));
    let ids = |pred: &dyn Fn(&Order) -> bool| -> Vec<String> {
        mine().filter(|o| pred(*o)).map(|o| o.id.clone()).collect()
    };
    let delivered_today: Vec<&Order> = mine()
        .filter(|o| o.status.is_fulfilled() && o.delivered_at.is_some_and(|t| t.date_naive() == today))
        .collect();

    ShipperDashboard {
        awaiting_confirmation: ids(&|o: &Order| {
            o.status == OrderStatus::Confirmed && o.shipper_status == Some(ShipperStatus::Assigned)
        }),
        ready_to_start: ids(&|o: &Order| {
            o.status == OrderStatus::Confirmed && o.shipper_status == Some(ShipperStatus::Confirmed)
        }),
        in_delivery: ids(&|o: &Order| o.status == OrderStatus::InDelivery),
        delivered_today: delivered_today.len(),
        failed_today: orders
            .iter()
            .flat_map(|o| &o.delivery_failures)
            .filter(|f| f.shipper_id == shipper_id && f.at.date_naive() == today)
            .count(),
        cod_collected_today: delivered_today
            .iter()
            .filter(|o| o.payment_method.is_cod() && o.payment_status == PaymentStatus::Paid)
            .map(|o| o.pricing.total)
            .sum(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaffDashboard {
    pub pending_confirmation: usize,
    pub confirmed_without_shipper: usize,
    pub in_delivery: usize,
    pub low_stock_products: Vec<String>,
    pub low_stock_variants: Vec<String>,
}

pub fn staff_dashboard(
    orders: &[Order],
    products: &[Product],
    variants: &[FlowerVariant],
    low_stock_threshold: u32,
) -> StaffDashboard {
    StaffDashboard {
        pending_confirmation: orders.iter().filter(|o| o.status == OrderStatus::Pending).count(),
        confirmed_without_shipper: orders.iter().filter(|o| o.awaiting_shipper()).count(),
        in_delivery: orders.iter().filter(|o| o.status == OrderStatus::InDelivery).count(),
        low_stock_products: products
            .iter()
            .filter(|p| p.is_active && p.stock_quantity <= low_stock_threshold)
            .map(|p| p.id.clone())
            .collect(),
        low_stock_variants: variants
            .iter()
            .filter(|v| v.stock <= low_stock_threshold)
            .map(|v| v.id.clone())
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagerDashboard {
    /// Totals after discounts of delivered and completed orders.
    pub revenue: Decimal,
    pub orders_by_status: Vec<(OrderStatus, usize)>,
    pub discount_granted: Decimal,
    pub average_order_value: Decimal,
}

pub fn manager_dashboard(orders: &[Order]) -> ManagerDashboard {
    let fulfilled: Vec<&Order> = orders.iter().filter(|o| o.status.is_fulfilled()).collect();
    let revenue: Decimal = fulfilled.iter().map(|o| o.pricing.total).sum();
    let average_order_value = if fulfilled.is_empty() {
        Decimal::ZERO
    } else {
        (revenue / Decimal::from(fulfilled.len())).round_dp(0)
    };

    ManagerDashboard {
        revenue,
        orders_by_status: OrderStatus::ALL
            .iter()
            .map(|s| (*s, orders.iter().filter(|o| o.status == *s).count()))
            .collect(),
        discount_granted: fulfilled.iter().map(|o| o.pricing.total_discount()).sum(),
        average_order_value,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminDashboard {
    pub users_by_role: Vec<(Role, usize)>,
    pub chat_blocked: Vec<String>,
}

pub fn admin_dashboard(users: &[User]) -> AdminDashboard {
    let roles = [Role::Admin, Role::Manager, Role::Staff, Role::Shipper, Role::Customer];
    AdminDashboard {
        users_by_role: roles
            .iter()
            .map(|r| (*r, users.iter().filter(|u| u.role == *r).count()))
            .collect(),
        chat_blocked: users.iter().filter(|u| u.is_chat_blocked()).map(|u| u.id.clone()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeliveryFailure, PaymentMethod, PricingBreakdown};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, day, hour, 0, 0).unwrap()
    }

    fn order(id: &str, status: OrderStatus, total: i64) -> Order {
        Order {
            id: id.into(),
            customer_id: "user_1".into(),
            lines: Vec::new(),
            status,
            payment_status: PaymentStatus::Unpaid,
            payment_method: PaymentMethod::Cod,
            pricing: PricingBreakdown {
                total: Decimal::from(total),
                product_discount: Decimal::from(10_000),
                ..PricingBreakdown::default()
            },
            note: String::new(),
            shipper_id: Some("shipper_1".into()),
            shipper_status: Some(ShipperStatus::Confirmed),
            assigned_at: None,
            shipper_confirmed_at: None,
            delivery_point: None,
            pickup_point: None,
            delivered_point: None,
            delivery_started_at: None,
            delivered_at: None,
            completed_at: None,
            cancelled_at: None,
            proof_image: None,
            failed_attempts: 0,
            delivery_failures: Vec::new(),
            stock_deducted: true,
            created_at: at(14, 8),
            updated_at: at(14, 8),
        }
    }

    #[test]
    fn shipper_sees_todays_work() {
        let mut assigned = order("o1", OrderStatus::Confirmed, 100_000);
        assigned.shipper_status = Some(ShipperStatus::Assigned);
        let ready = order("o2", OrderStatus::Confirmed, 100_000);
        let mut delivered = order("o3", OrderStatus::Delivered, 250_000);
        delivered.delivered_at = Some(at(14, 10));
        delivered.payment_status = PaymentStatus::Paid;
        let mut yesterday = order("o4", OrderStatus::Completed, 90_000);
        yesterday.delivered_at = Some(at(13, 10));
        yesterday.payment_status = PaymentStatus::Paid;
        let mut failed = order("o5", OrderStatus::Confirmed, 80_000);
        failed.shipper_id = None;
        failed.shipper_status = None;
        failed.delivery_failures.push(DeliveryFailure {
            shipper_id: "shipper_1".into(),
            reason: "Sai địa chỉ".into(),
            at: at(14, 9),
        });

        let dash = shipper_dashboard(
            &[assigned, ready, delivered, yesterday, failed],
            "shipper_1",
            at(14, 0).date_naive(),
        );
        assert_eq!(dash.awaiting_confirmation, vec!["o1".to_string()]);
        assert_eq!(dash.ready_to_start, vec!["o2".to_string()]);
        assert!(dash.in_delivery.is_empty());
        assert_eq!(dash.delivered_today, 1);
        assert_eq!(dash.failed_today, 1);
        assert_eq!(dash.cod_collected_today, Decimal::from(250_000));
    }

    #[test]
    fn manager_revenue_counts_only_fulfilled_orders() {
        let orders = [
            order("o1", OrderStatus::Delivered, 300_000),
            order("o2", OrderStatus::Completed, 200_001),
            order("o3", OrderStatus::Cancelled, 999_000),
            order("o4", OrderStatus::Pending, 50_000),
        ];
        let dash = manager_dashboard(&orders);
        assert_eq!(dash.revenue, Decimal::from(500_001));
        assert_eq!(dash.discount_granted, Decimal::from(20_000));
        assert_eq!(dash.average_order_value, Decimal::from(250_000));
        assert_eq!(dash.orders_by_status[0], (OrderStatus::Pending, 1));
        assert_eq!(dash.orders_by_status[5], (OrderStatus::Cancelled, 1));
    }

    #[test]
    fn staff_low_stock_uses_threshold() {
        let product = |id: &str, stock| Product {
            id: id.into(),
            name: id.into(),
            category_id: "c".into(),
            price: Decimal::ONE,
            stock_quantity: stock,
            recipe: Vec::new(),
            is_active: true,
        };
        let mut waiting = order("o1", OrderStatus::Confirmed, 1);
        waiting.shipper_status = Some(ShipperStatus::Rejected);
        let dash = staff_dashboard(
            &[waiting, order("o2", OrderStatus::Pending, 1)],
            &[product("p1", 5), product("p2", 6)],
            &[FlowerVariant { id: "v1".into(), flower_type: "Cúc".into(), colour: "Vàng".into(), stock: 0 }],
            5,
        );
        assert_eq!(dash.pending_confirmation, 1);
        assert_eq!(dash.confirmed_without_shipper, 1);
        assert_eq!(dash.low_stock_products, vec!["p1".to_string()]);
        assert_eq!(dash.low_stock_variants, vec!["v1".to_string()]);
    }
}
