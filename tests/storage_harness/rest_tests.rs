//! HTTP-level order flow suite for storage backends.
//!
//! The `order_api_tests!` macro mounts the full router over a backend and
//! drives the order lifecycle through JSON requests, checking the stock
//! counts the backend holds after each step.
//!
//! # Generated Tests
//!
//! - `test_place_then_customer_cancel` - stock 5, order 3, cancel restores 5
//! - `test_place_rejected_when_stock_short` - stock 1, order 2, nothing stored
//! - `test_admin_delete_of_shipped_order_restores_stock`
//! - `test_repeated_cancel_does_not_restore_twice`
//! - `test_stock_adjustments_audit_trail`

/// Generate the order flow suite.
///
/// `$factory` must produce a store implementing every store trait plus
/// `Clone + 'static`.
#[macro_export]
macro_rules! order_api_tests {
    ($factory:expr) => {
        mod order_api_flow_tests {
            use super::*;
            use axum::http::{HeaderName, HeaderValue, StatusCode};
            use axum_test::{TestRequest, TestServer};
            use livewear::config::AppConfig;
            use livewear::core::service::CatalogStore;
            use livewear::entities::{Role, User};
            use livewear::server::ServerBuilder;
            use serde_json::{Value, json};
            use std::sync::Arc;

            struct Shop {
                server: TestServer,
                catalog: Arc<dyn CatalogStore>,
                admin: User,
                customer: User,
            }

            async fn open_shop() -> Shop {
                let store = $factory;
                let admin = seed_user(&store, "admin@livewear.test", Role::Admin).await;
                let customer = seed_user(&store, "awa@livewear.test", Role::Customer).await;
                let catalog: Arc<dyn CatalogStore> = Arc::new(store.clone());

                let router = ServerBuilder::new(AppConfig::default())
                    .with_store(store)
                    .build()
                    .unwrap();

                Shop {
                    server: TestServer::try_new(router).unwrap(),
                    catalog,
                    admin,
                    customer,
                }
            }

            fn as_user(request: TestRequest, user: &User) -> TestRequest {
                request.add_header(
                    HeaderName::from_static("x-user-id"),
                    HeaderValue::from_str(&user.id.to_string()).unwrap(),
                )
            }

            fn order_body(product: &uuid::Uuid, quantity: u32) -> Value {
                json!({
                    "items": [{ "product": product, "quantity": quantity, "size": "M" }],
                    "address": { "firstName": "Awa", "city": "Dakar", "country": "SN" },
                })
            }

            async fn place(shop: &Shop, user: &User, product: &uuid::Uuid, quantity: u32) -> Value {
                let response = as_user(shop.server.post("/orders"), user)
                    .json(&order_body(product, quantity))
                    .await;
                response.assert_status(StatusCode::CREATED);
                response.json::<Value>()["order"].clone()
            }

            #[tokio::test]
            async fn test_place_then_customer_cancel() {
                let shop = open_shop().await;
                let shirt = seed_product(shop.catalog.as_ref(), "Linen shirt", 25.0, 5).await;

                let order = place(&shop, &shop.customer, &shirt.id, 3).await;
                assert_eq!(order["status"], "pending");
                assert_eq!(order["finalPrice"], 75.0);
                assert_eq!(stock_of(shop.catalog.as_ref(), &shirt.id).await, 2);

                let path = format!("/orders/{}", order["id"].as_str().unwrap());
                let response = as_user(shop.server.delete(&path), &shop.customer).await;
                response.assert_status_ok();

                let body: Value = response.json();
                assert_eq!(body["message"], "Order cancelled successfully");
                assert_eq!(body["order"]["status"], "cancelled");
                assert_eq!(stock_of(shop.catalog.as_ref(), &shirt.id).await, 5);
            }

            #[tokio::test]
            async fn test_place_rejected_when_stock_short() {
                let shop = open_shop().await;
                let scarf = seed_product(shop.catalog.as_ref(), "Silk scarf", 15.0, 1).await;

                let response = as_user(shop.server.post("/orders"), &shop.customer)
                    .json(&order_body(&scarf.id, 2))
                    .await;
                response.assert_status(StatusCode::BAD_REQUEST);

                let body: Value = response.json();
                assert_eq!(body["success"], false);
                assert_eq!(body["code"], "INSUFFICIENT_STOCK");
                assert_eq!(body["details"]["available"], 1);
                assert_eq!(stock_of(shop.catalog.as_ref(), &scarf.id).await, 1);

                let list: Value = as_user(shop.server.get("/orders"), &shop.customer).await.json();
                assert_eq!(list["count"], 0);
            }

            #[tokio::test]
            async fn test_admin_delete_of_shipped_order_restores_stock() {
                let shop = open_shop().await;
                let dress = seed_product(shop.catalog.as_ref(), "Wax print dress", 45.0, 4).await;

                let order = place(&shop, &shop.customer, &dress.id, 4).await;
                assert_eq!(stock_of(shop.catalog.as_ref(), &dress.id).await, 0);
                let path = format!("/orders/{}", order["id"].as_str().unwrap());

                for status in ["confirmed", "shipped"] {
                    as_user(shop.server.put(&path), &shop.admin)
                        .json(&json!({ "status": status, "trackingNumber": "LW-42" }))
                        .await
                        .assert_status_ok();
                }

                let response = as_user(shop.server.delete(&path), &shop.admin).await;
                response.assert_status_ok();
                assert_eq!(response.json::<Value>()["message"], "Order deleted successfully");

                assert_eq!(stock_of(shop.catalog.as_ref(), &dress.id).await, 4);
                as_user(shop.server.get(&path), &shop.admin)
                    .await
                    .assert_status(StatusCode::NOT_FOUND);
            }

            #[tokio::test]
            async fn test_repeated_cancel_does_not_restore_twice() {
                let shop = open_shop().await;
                let shirt = seed_product(shop.catalog.as_ref(), "Linen shirt", 25.0, 5).await;

                let order = place(&shop, &shop.customer, &shirt.id, 2).await;
                let path = format!("/orders/{}", order["id"].as_str().unwrap());

                as_user(shop.server.put(&path), &shop.admin)
                    .json(&json!({ "status": "cancelled" }))
                    .await
                    .assert_status_ok();
                assert_eq!(stock_of(shop.catalog.as_ref(), &shirt.id).await, 5);

                // Same status again is accepted and moves nothing
                as_user(shop.server.put(&path), &shop.admin)
                    .json(&json!({ "status": "cancelled" }))
                    .await
                    .assert_status_ok();
                as_user(shop.server.delete(&path), &shop.admin)
                    .await
                    .assert_status_ok();

                assert_eq!(stock_of(shop.catalog.as_ref(), &shirt.id).await, 5);
            }

            #[tokio::test]
            async fn test_stock_adjustments_audit_trail() {
                let shop = open_shop().await;
                let shirt = seed_product(shop.catalog.as_ref(), "Linen shirt", 25.0, 5).await;

                let order = place(&shop, &shop.customer, &shirt.id, 2).await;
                let id = order["id"].as_str().unwrap();
                as_user(shop.server.delete(&format!("/orders/{}", id)), &shop.customer)
                    .await
                    .assert_status_ok();

                let path = format!("/orders/{}/stock-adjustments", id);
                as_user(shop.server.get(&path), &shop.customer)
                    .await
                    .assert_status(StatusCode::FORBIDDEN);

                let body: Value = as_user(shop.server.get(&path), &shop.admin).await.json();
                let adjustments = body["adjustments"].as_array().unwrap();
                assert_eq!(adjustments.len(), 2);
                assert_eq!(adjustments[0]["kind"], "reserve");
                assert_eq!(adjustments[0]["delta"], -2);
                assert_eq!(adjustments[1]["kind"], "release");
                assert_eq!(adjustments[1]["delta"], 2);
            }
        }
    };
}
