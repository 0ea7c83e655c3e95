#[cfg(test)]
mod tests {
    use std::path::Path;

    use chrono::Utc;
    use rust_decimal::Decimal;
    use tokio::sync::mpsc;

    use crate::actor_framework::{Entity, FrameworkError, ResourceRequest};
    use crate::app_system::{ShopConfig, ShopSystem};
    use crate::chat_guard::ChatVerdict;
    use crate::clients::{
        AssignmentClient, CheckoutRequest, DeliveryProofUpload, DiscountClient, InventoryClient, OrderClient,
        OrderServices, PromotionClient, UserClient,
    };
    use crate::delivery_proof::{ProofImage, ProofStore};
    use crate::domain::{
        ActiveWindow, Caller, CodeTarget, CombineFlags, DiscountScope, DiscountType, FlowerVariantCreate, GeoPoint,
        Order, OrderCreate, OrderLine, OrderStatus, PaymentMethod, PaymentStatus, PricingBreakdown, Product,
        ProductCreate, ProductDiscount, ProductDiscountDraft, Promotion, PromotionCode, PromotionCreate, RecipeItem, Role,
        ShipperProfileCreate, ShipperStatus, UserCreate,
    };
    use crate::inventory_actor::{InventoryError, Shortage};
    use crate::messages::{AssignmentRequest, InventoryRequest};
    use crate::mock_framework::{create_mock_channel, create_mock_client, expect_action, expect_create, expect_get, expect_list};
    use crate::promotion::PromotionAction;
    use crate::notifications::{NotificationHub, ShopEvent};
    use crate::order_actor::OrderError;

    // -------------------------------------------------------------------------
    // Client logic against mocks
    // -------------------------------------------------------------------------

    struct MockEnds {
        inventory_rx: mpsc::Receiver<InventoryRequest>,
        _assignment_rx: mpsc::Receiver<AssignmentRequest>,
        discounts_rx: mpsc::Receiver<ResourceRequest<ProductDiscount>>,
        promotions_rx: mpsc::Receiver<ResourceRequest<Promotion>>,
    }

    fn mock_services(proof_dir: &Path) -> (OrderServices, MockEnds) {
        let (inventory_tx, inventory_rx) = create_mock_channel::<InventoryRequest>(10);
        let (assignment_tx, assignment_rx) = create_mock_channel::<AssignmentRequest>(10);
        let (users, _) = create_mock_client(10);
        let (discounts, discounts_rx) = create_mock_client(10);
        let (promotions, promotions_rx) = create_mock_client(10);
        let config = ShopConfig { proof_folder: proof_dir.to_path_buf(), ..ShopConfig::default() };
        let services = OrderServices {
            inventory: InventoryClient::new(inventory_tx),
            users: UserClient::new(users),
            assignment: AssignmentClient::new(assignment_tx),
            discounts: DiscountClient::new(discounts),
            promotions: PromotionClient::new(promotions),
            proofs: ProofStore::from_config(&config),
            hub: NotificationHub::new(16),
            vnd_per_loyalty_point: config.vnd_per_loyalty_point,
        };
        (services, MockEnds { inventory_rx, _assignment_rx: assignment_rx, discounts_rx, promotions_rx })
    }

    fn pending_order() -> Order {
        Order::from_create_params(
            "order_1".into(),
            OrderCreate {
                customer_id: "user_1".into(),
                lines: vec![OrderLine {
                    product_id: "product_1".into(),
                    product_name: "Hộp hoa hồng".into(),
                    quantity: 3,
                    unit_price: Decimal::from(600_000),
                    discounted_unit_price: Decimal::from(600_000),
                }],
                payment_method: PaymentMethod::Cod,
                payment_status: PaymentStatus::Unpaid,
                pricing: PricingBreakdown::default(),
                delivery_point: None,
                note: String::new(),
                placed_at: Utc::now(),
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn insufficient_stock_never_touches_the_order() {
        let dir = tempfile::tempdir().unwrap();
        let (services, mut ends) = mock_services(dir.path());
        let (order_inner, mut order_rx) = create_mock_client::<Order>(10);
        let client = OrderClient::new(order_inner, services);

        let task = tokio::spawn(async move {
            client.confirm_order(&Caller::new("user_2", Role::Staff), "order_1").await
        });

        let (id, responder) = expect_get(&mut order_rx).await.expect("Expected Order Get");
        assert_eq!(id, "order_1");
        responder.send(Ok(Some(pending_order()))).unwrap();

        match ends.inventory_rx.recv().await {
            Some(InventoryRequest::DeductForOrder { order_id, lines, respond_to }) => {
                assert_eq!(order_id, "order_1");
                assert_eq!(lines[0].quantity, 3);
                respond_to
                    .send(Err(InventoryError::Insufficient(vec![Shortage {
                        id: "variant_1".into(),
                        name: "Hoa hồng".into(),
                        requested: 30,
                        available: 12,
                    }])))
                    .unwrap();
            }
            other => panic!("Expected DeductForOrder, got {:?}", other),
        }

        let result = task.await.unwrap();
        assert_eq!(
            result,
            Err(OrderError::InsufficientStock("Hoa hồng (requested 30, available 12)".into()))
        );
        assert!(order_rx.try_recv().is_err(), "no order action may follow a failed deduction");
    }

    #[tokio::test]
    async fn completion_without_proof_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (services, mut ends) = mock_services(dir.path());
        let (order_inner, mut order_rx) = create_mock_client::<Order>(10);
        let client = OrderClient::new(order_inner, services);

        let upload = DeliveryProofUpload { image: None, cod_collected: true, location: None };
        let result = client
            .complete_delivery(&Caller::new("user_5", Role::Shipper), "order_1", upload)
            .await;
        assert_eq!(result.unwrap_err(), OrderError::MissingProofImage);
        assert!(order_rx.try_recv().is_err());
        assert!(ends.inventory_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn customers_cannot_run_staff_steps() {
        let dir = tempfile::tempdir().unwrap();
        let (services, _ends) = mock_services(dir.path());
        let (order_inner, mut order_rx) = create_mock_client::<Order>(10);
        let client = OrderClient::new(order_inner, services);

        let customer = Caller::new("user_1", Role::Customer);
        assert_eq!(
            client.confirm_order(&customer, "order_1").await.unwrap_err(),
            OrderError::Forbidden { role: Role::Customer, action: "confirm orders" }
        );
        assert!(matches!(
            client.start_delivery(&customer, "order_1", None).await.unwrap_err(),
            OrderError::Forbidden { .. }
        ));
        assert!(order_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn oversized_cart_lines_are_refused_at_checkout() {
        let dir = tempfile::tempdir().unwrap();
        let (services, mut ends) = mock_services(dir.path());
        let (order_inner, mut order_rx) = create_mock_client::<Order>(10);
        let client = OrderClient::new(order_inner, services);

        let err = client
            .place_order(&Caller::new("user_1", Role::Customer), checkout("product_1", 500_000_000, None))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::ValidationError(_)));
        assert!(ends.inventory_rx.try_recv().is_err());
        assert!(order_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn failed_order_creation_gives_the_code_use_back() {
        let dir = tempfile::tempdir().unwrap();
        let (services, mut ends) = mock_services(dir.path());
        let (order_inner, mut order_rx) = create_mock_client::<Order>(10);
        let client = OrderClient::new(order_inner, services);

        let task = tokio::spawn(async move {
            client
                .place_order(&Caller::new("user_1", Role::Customer), checkout("product_1", 1, Some("tet50")))
                .await
        });

        let product = Product {
            id: "product_1".into(),
            name: "Giỏ hoa Tết".into(),
            category_id: "gio-hoa".into(),
            price: Decimal::from(600_000),
            stock_quantity: 4,
            recipe: Vec::new(),
            is_active: true,
        };
        match ends.inventory_rx.recv().await {
            Some(InventoryRequest::GetProduct { respond_to, .. }) => respond_to.send(Ok(Some(product))).unwrap(),
            other => panic!("Expected GetProduct, got {:?}", other),
        }
        expect_list(&mut ends.discounts_rx).await.unwrap().send(Ok(Vec::new())).unwrap();

        let code = PromotionCode {
            code: "TET50".into(),
            target: CodeTarget::Order,
            discount_type: DiscountType::FixedAmount,
            value: Decimal::from(50_000),
            max_discount_amount: None,
            min_order_value: Decimal::ZERO,
            usage_limit: Some(5),
            used_count: 0,
        };
        let promotion = Promotion {
            id: "promotion_1".into(),
            name: "Tết".into(),
            window: ActiveWindow::default(),
            is_active: true,
            combine: CombineFlags { order: true, product: true, shipping: true },
            codes: vec![code.clone()],
        };
        // Pricing looks the code up, then redemption looks it up again.
        for _ in 0..2 {
            let respond_to = expect_list(&mut ends.promotions_rx).await.unwrap();
            respond_to.send(Ok(vec![promotion.clone()])).unwrap();
        }
        let (_, action, respond_to) = expect_action(&mut ends.promotions_rx).await.unwrap();
        assert!(matches!(action, PromotionAction::RedeemCode { .. }));
        respond_to.send(Ok(PromotionCode { used_count: 1, ..code.clone() })).unwrap();

        let (_, respond_to) = expect_create(&mut order_rx).await.expect("Expected Order Create");
        respond_to.send(Err(FrameworkError::ActorDropped)).unwrap();

        let respond_to = expect_list(&mut ends.promotions_rx).await.unwrap();
        respond_to.send(Ok(vec![promotion.clone()])).unwrap();
        let (id, action, respond_to) = expect_action(&mut ends.promotions_rx).await.unwrap();
        assert_eq!(id, "promotion_1");
        match action {
            PromotionAction::ReleaseCode { code: released } => assert_eq!(released, "TET50"),
            other => panic!("Expected ReleaseCode, got {:?}", other),
        }
        respond_to.send(Ok(code)).unwrap();

        assert!(task.await.unwrap().is_err());
    }

    // -------------------------------------------------------------------------
    // Whole system
    // -------------------------------------------------------------------------

    struct Seed {
        customer: Caller,
        staff: Caller,
        shippers: Vec<Caller>,
        bouquet: String,
        rose: String,
    }

    async fn seeded_system(proof_dir: &Path, bouquet_stock: u32, shipper_count: usize) -> (ShopSystem, Seed) {
        let config = ShopConfig { proof_folder: proof_dir.to_path_buf(), ..ShopConfig::default() };
        let system = ShopSystem::new(config).unwrap();

        let user = |name: &str, role| UserCreate {
            name: name.to_string(),
            email: format!("{}@bloomie.vn", name.to_lowercase()),
            role,
        };
        let customer = system.users.create_user(user("Lan", Role::Customer)).await.unwrap();
        let staff = system.users.create_user(user("Mai", Role::Staff)).await.unwrap();
        let mut shippers = Vec::new();
        for i in 0..shipper_count {
            let name = format!("Shipper{}", i);
            let id = system.users.create_user(user(&name, Role::Shipper)).await.unwrap();
            system
                .shippers
                .create_shipper(ShipperProfileCreate {
                    user_id: id.clone(),
                    name,
                    max_active_orders: 2,
                    is_working: true,
                })
                .await
                .unwrap();
            shippers.push(Caller::new(id, Role::Shipper));
        }

        let rose = system
            .inventory
            .add_variant(FlowerVariantCreate { flower_type: "Hoa hồng".into(), colour: "Đỏ".into(), stock: 30 })
            .await
            .unwrap();
        let bouquet = system
            .inventory
            .add_product(ProductCreate {
                name: "Bó hồng đỏ 10 bông".into(),
                category_id: "bo-hoa".into(),
                price: Decimal::from(400_000),
                stock_quantity: bouquet_stock,
                recipe: vec![RecipeItem { variant_id: rose.clone(), quantity: 10 }],
            })
            .await
            .unwrap();

        let seed = Seed {
            customer: Caller::new(customer, Role::Customer),
            staff: Caller::new(staff, Role::Staff),
            shippers,
            bouquet,
            rose,
        };
        (system, seed)
    }

    fn checkout(product_id: &str, quantity: u32, promo_code: Option<&str>) -> CheckoutRequest {
        CheckoutRequest {
            items: vec![(product_id.to_string(), quantity)],
            payment_method: PaymentMethod::Cod,
            prepaid: false,
            shipping_fee: Decimal::from(30_000),
            promo_code: promo_code.map(str::to_string),
            delivery_point: Some(GeoPoint::new(10.7769, 106.7009)),
            note: String::new(),
        }
    }

    #[tokio::test]
    async fn order_travels_from_checkout_to_completion() {
        let dir = tempfile::tempdir().unwrap();
        let (system, seed) = seeded_system(dir.path(), 3, 1).await;
        let shipper = &seed.shippers[0];
        let mut events = system.hub.subscribe();

        system
            .discounts
            .create_discount(ProductDiscountDraft {
                name: "Giảm 10% hoa hồng".into(),
                discount_type: DiscountType::Percent,
                value: Decimal::from(10),
                max_discount_amount: None,
                scope: DiscountScope::Categories(vec!["bo-hoa".into()]),
                window: ActiveWindow::default(),
                is_active: true,
                priority: 1,
                combine: CombineFlags { order: true, product: false, shipping: true },
            })
            .await
            .unwrap();
        system
            .promotions
            .create_promotion(PromotionCreate {
                name: "Khai trương".into(),
                window: ActiveWindow::default(),
                is_active: true,
                combine: CombineFlags { order: true, product: true, shipping: false },
                codes: vec![PromotionCode {
                    code: "BLOOMIE50".into(),
                    target: CodeTarget::Order,
                    discount_type: DiscountType::FixedAmount,
                    value: Decimal::from(50_000),
                    max_discount_amount: None,
                    min_order_value: Decimal::from(500_000),
                    usage_limit: Some(10),
                    used_count: 0,
                }],
            })
            .await
            .unwrap();

        // 800k - 80k product discount - 50k code + 30k shipping
        let order = system
            .orders
            .place_order(&seed.customer, checkout(&seed.bouquet, 2, Some("bloomie50")))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.pricing.product_discount, Decimal::from(80_000));
        assert_eq!(order.pricing.order_discount, Decimal::from(50_000));
        assert_eq!(order.pricing.total, Decimal::from(700_000));
        assert_eq!(order.pricing.applied_discounts, vec!["Giảm 10% hoa hồng".to_string()]);
        let promo = system.promotions.find_by_code("BLOOMIE50").await.unwrap();
        assert_eq!(promo.codes[0].used_count, 1);

        let confirmed = system.orders.confirm_order(&seed.staff, &order.id).await.unwrap();
        assert_eq!(confirmed.status, OrderStatus::Confirmed);
        assert_eq!(confirmed.shipper_id.as_deref(), Some(shipper.user_id.as_str()));
        assert_eq!(confirmed.shipper_status, Some(ShipperStatus::Assigned));
        let product = system.inventory.get_product(seed.bouquet.clone()).await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 1);
        let roses = system.inventory.list_variants().await.unwrap();
        assert_eq!(roses.iter().find(|v| v.id == seed.rose).unwrap().stock, 10);

        assert!(system.orders.confirm_pickup(shipper, &order.id).await.unwrap());
        let started = system
            .orders
            .start_delivery(shipper, &order.id, Some(GeoPoint::new(10.78, 106.69)))
            .await
            .unwrap();
        assert_eq!(started.status, OrderStatus::InDelivery);

        let no_proof = DeliveryProofUpload { image: None, cod_collected: true, location: None };
        assert_eq!(
            system.orders.complete_delivery(shipper, &order.id, no_proof).await.unwrap_err(),
            OrderError::MissingProofImage
        );

        let upload = DeliveryProofUpload {
            image: Some(ProofImage::new("giao-hang.JPG", vec![0xFF, 0xD8, 0xFF])),
            cod_collected: true,
            location: Some(GeoPoint::new(10.7769, 106.7009)),
        };
        let delivered = system.orders.complete_delivery(shipper, &order.id, upload).await.unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert_eq!(delivered.payment_status, PaymentStatus::Paid);
        let proof = delivered.proof_image.clone().unwrap();
        assert!(Path::new(&proof).exists());
        assert!(proof.ends_with(".jpg"));

        let completed = system.orders.mark_completed(&seed.customer, &order.id).await.unwrap();
        assert_eq!(completed.status, OrderStatus::Completed);
        let customer = system.users.get_user(seed.customer.user_id.clone()).await.unwrap().unwrap();
        assert_eq!(customer.loyalty_points, 70);

        let profile = system.shippers.get_shipper(shipper.user_id.clone()).await.unwrap().unwrap();
        assert_eq!(profile.current_active_orders, 0);
        let manager = system.manager_dashboard().await.unwrap();
        assert_eq!(manager.revenue, Decimal::from(700_000));
        let staff = system.staff_dashboard().await.unwrap();
        assert_eq!(staff.low_stock_products, vec![seed.bouquet.clone()]);

        let mut statuses = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let ShopEvent::OrderStatusUpdate { status, .. } = event {
                statuses.push(status);
            }
        }
        assert_eq!(statuses.last().map(String::as_str), Some("Hoàn thành"));
        assert!(statuses.iter().any(|s| s == "Đang giao"));

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn failed_delivery_requeues_and_cancellation_returns_stock() {
        let dir = tempfile::tempdir().unwrap();
        let (system, seed) = seeded_system(dir.path(), 3, 2).await;
        let order = system.orders.place_order(&seed.customer, checkout(&seed.bouquet, 1, None)).await.unwrap();

        let confirmed = system.orders.confirm_order(&seed.staff, &order.id).await.unwrap();
        let first = seed
            .shippers
            .iter()
            .find(|s| confirmed.is_assigned_to(&s.user_id))
            .unwrap();
        assert!(system.orders.confirm_pickup(first, &order.id).await.unwrap());
        system.orders.start_delivery(first, &order.id, None).await.unwrap();

        let requeued = system.orders.fail_delivery(first, &order.id, "Khách hẹn giao lại").await.unwrap();
        assert_eq!(requeued.status, OrderStatus::Confirmed);
        assert_eq!(requeued.failed_attempts, 1);
        assert!(requeued.note.contains("Giao thất bại: Khách hẹn giao lại"));
        assert_eq!(requeued.shipper_status, Some(ShipperStatus::Assigned));

        // Customers may only cancel before confirmation.
        assert!(matches!(
            system.orders.cancel_order(&seed.customer, &order.id, "Đổi ý").await.unwrap_err(),
            OrderError::InvalidTransition { status: OrderStatus::Confirmed, .. }
        ));
        let cancelled = system.orders.cancel_order(&seed.staff, &order.id, "Khách đổi ý").await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert!(!cancelled.stock_deducted);

        let product = system.inventory.get_product(seed.bouquet.clone()).await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 3);
        let roses = system.inventory.list_variants().await.unwrap();
        assert_eq!(roses.iter().find(|v| v.id == seed.rose).unwrap().stock, 30);
        for shipper in &seed.shippers {
            let profile = system.shippers.get_shipper(shipper.user_id.clone()).await.unwrap().unwrap();
            assert_eq!(profile.current_active_orders, 0);
        }

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_confirmations_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let (system, seed) = seeded_system(dir.path(), 1, 0).await;
        let a = system.orders.place_order(&seed.customer, checkout(&seed.bouquet, 1, None)).await.unwrap();
        let b = system.orders.place_order(&seed.customer, checkout(&seed.bouquet, 1, None)).await.unwrap();

        let (ra, rb) = tokio::join!(
            system.orders.confirm_order(&seed.staff, &a.id),
            system.orders.confirm_order(&seed.staff, &b.id)
        );
        let results = [ra, rb];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(OrderError::InsufficientStock(_)))));

        let product = system.inventory.get_product(seed.bouquet.clone()).await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 0);
        let pending = system.orders.list_orders().await.unwrap();
        assert_eq!(pending.iter().filter(|o| o.status == OrderStatus::Pending).count(), 1);

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn only_the_assigned_shipper_moves_the_order() {
        let dir = tempfile::tempdir().unwrap();
        let (system, seed) = seeded_system(dir.path(), 2, 2).await;
        let order = system.orders.place_order(&seed.customer, checkout(&seed.bouquet, 1, None)).await.unwrap();
        let confirmed = system.orders.confirm_order(&seed.staff, &order.id).await.unwrap();
        let other = seed
            .shippers
            .iter()
            .find(|s| !confirmed.is_assigned_to(&s.user_id))
            .unwrap();

        assert!(!system.orders.confirm_pickup(other, &order.id).await.unwrap());
        assert!(matches!(
            system.orders.start_delivery(other, &order.id, None).await.unwrap_err(),
            OrderError::NotAssignedShipper { .. }
        ));

        let assigned = seed.shippers.iter().find(|s| confirmed.is_assigned_to(&s.user_id)).unwrap();
        let next = system.orders.reject_assignment(assigned, &order.id, "Hết ca").await.unwrap();
        assert_eq!(next.as_deref(), Some(other.user_id.as_str()));
        assert_eq!(system.orders.assignment_history(&order.id).await.unwrap().len(), 2);

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn chat_guard_runs_inside_the_system() {
        let dir = tempfile::tempdir().unwrap();
        let (system, seed) = seeded_system(dir.path(), 1, 0).await;
        let guard = system.chat_guard.clone();
        let id = seed.customer.user_id.clone();

        let text = "Shop còn hoa cúc không?";
        assert!(guard.screen_message(&id, text).await.unwrap().is_accepted());
        assert!(guard.screen_message(&id, text).await.unwrap().is_accepted());
        assert!(matches!(
            guard.screen_message(&id, text).await.unwrap(),
            ChatVerdict::Spam { violations: 1, .. }
        ));
        assert!(matches!(
            guard.screen_message(&id, text).await.unwrap(),
            ChatVerdict::Spam { violations: 2, .. }
        ));
        assert!(matches!(
            guard.screen_message(&id, text).await.unwrap(),
            ChatVerdict::AccountBlocked { .. }
        ));
        // The block lives on the account, not in the guard.
        assert!(matches!(
            guard.screen_message(&id, "xin chào").await.unwrap(),
            ChatVerdict::AccountBlocked { .. }
        ));

        let admin = system.admin_dashboard().await.unwrap();
        assert_eq!(admin.chat_blocked, vec![id.clone()]);
        assert!(admin.users_by_role.contains(&(Role::Customer, 1)));

        drop(guard);
        system.shutdown().await.unwrap();
    }
}
