//! Macro-generated conformance suites for the store traits.
//!
//! - `stock_ledger_tests!` checks reservation, release and their idempotency,
//!   including concurrent callers racing on the same product
//! - `order_store_tests!` checks order persistence and per-owner listing
//! - `catalog_store_tests!` checks product filtering, search and pagination
//! - `user_store_tests!` checks email normalization and uniqueness
//!
//! `$factory` must evaluate to a fresh store. The stock ledger suite also
//! needs `Clone + 'static` so spawned tasks can share it.

/// Generate the `StockLedger` conformance suite.
#[macro_export]
macro_rules! stock_ledger_tests {
    ($factory:expr) => {
        mod stock_ledger_contract_tests {
            use super::*;
            use livewear::core::stock::{AdjustmentKind, StockError, StockLedger, StockLine};
            use uuid::Uuid;

            #[tokio::test]
            async fn test_reserve_decrements_stock() {
                let store = $factory;
                let shirt = seed_product(&store, "Linen shirt", 25.0, 5).await;
                let order_id = Uuid::new_v4();

                store
                    .reserve(&order_id, &[StockLine::new(shirt.id, 3)])
                    .await
                    .unwrap();

                assert_eq!(stock_of(&store, &shirt.id).await, 2);

                let adjustments = store.adjustments(&order_id).await.unwrap();
                assert_count(&adjustments, 1);
                assert_eq!(adjustments[0].kind, AdjustmentKind::Reserve);
                assert_eq!(adjustments[0].delta, -3);
                assert_eq!(adjustments[0].product_id, shirt.id);
            }

            #[tokio::test]
            async fn test_reserve_overflowing_lines_changes_nothing() {
                let store = $factory;
                let shirt = seed_product(&store, "Linen shirt", 25.0, 5).await;
                let order_id = Uuid::new_v4();

                let err = store
                    .reserve(
                        &order_id,
                        &[StockLine::new(shirt.id, u32::MAX), StockLine::new(shirt.id, 1)],
                    )
                    .await
                    .unwrap_err();

                assert!(matches!(err, StockError::QuantityOverflow { .. }));
                assert_eq!(stock_of(&store, &shirt.id).await, 5);
                assert!(store.adjustments(&order_id).await.unwrap().is_empty());
            }

            #[tokio::test]
            async fn test_reserve_twice_is_applied_once() {
                let store = $factory;
                let shirt = seed_product(&store, "Linen shirt", 25.0, 5).await;
                let order_id = Uuid::new_v4();
                let lines = [StockLine::new(shirt.id, 2)];

                store.reserve(&order_id, &lines).await.unwrap();
                store.reserve(&order_id, &lines).await.unwrap();

                assert_eq!(stock_of(&store, &shirt.id).await, 3);
                assert_count(&store.adjustments(&order_id).await.unwrap(), 1);
            }

            #[tokio::test]
            async fn test_reserve_merges_duplicate_lines() {
                let store = $factory;
                let shirt = seed_product(&store, "Linen shirt", 25.0, 5).await;
                let order_id = Uuid::new_v4();

                store
                    .reserve(
                        &order_id,
                        &[StockLine::new(shirt.id, 2), StockLine::new(shirt.id, 3)],
                    )
                    .await
                    .unwrap();

                assert_eq!(stock_of(&store, &shirt.id).await, 0);
            }

            #[tokio::test]
            async fn test_insufficient_stock_changes_nothing() {
                let store = $factory;
                let shirt = seed_product(&store, "Linen shirt", 25.0, 5).await;
                let scarf = seed_product(&store, "Silk scarf", 15.0, 1).await;
                let order_id = Uuid::new_v4();

                let err = store
                    .reserve(
                        &order_id,
                        &[StockLine::new(shirt.id, 2), StockLine::new(scarf.id, 2)],
                    )
                    .await
                    .unwrap_err();

                match err {
                    StockError::Insufficient {
                        product_id,
                        requested,
                        available,
                        ..
                    } => {
                        assert_eq!(product_id, scarf.id);
                        assert_eq!(requested, 2);
                        assert_eq!(available, 1);
                    }
                    other => panic!("Expected Insufficient, got {:?}", other),
                }

                assert_eq!(stock_of(&store, &shirt.id).await, 5);
                assert_eq!(stock_of(&store, &scarf.id).await, 1);
                assert!(store.adjustments(&order_id).await.unwrap().is_empty());

                // The failed attempt must not block a later valid reservation
                store
                    .reserve(&order_id, &[StockLine::new(scarf.id, 1)])
                    .await
                    .unwrap();
                assert_eq!(stock_of(&store, &scarf.id).await, 0);
            }

            #[tokio::test]
            async fn test_reserve_unknown_product() {
                let store = $factory;
                let missing = Uuid::new_v4();

                let err = store
                    .reserve(&Uuid::new_v4(), &[StockLine::new(missing, 1)])
                    .await
                    .unwrap_err();

                assert!(matches!(err, StockError::ProductNotFound { product_id } if product_id == missing));
            }

            #[tokio::test]
            async fn test_release_restores_once() {
                let store = $factory;
                let shirt = seed_product(&store, "Linen shirt", 25.0, 5).await;
                let order_id = Uuid::new_v4();

                store
                    .reserve(&order_id, &[StockLine::new(shirt.id, 3)])
                    .await
                    .unwrap();

                assert!(store.release(&order_id).await.unwrap());
                assert_eq!(stock_of(&store, &shirt.id).await, 5);

                assert!(!store.release(&order_id).await.unwrap());
                assert_eq!(stock_of(&store, &shirt.id).await, 5);

                let adjustments = store.adjustments(&order_id).await.unwrap();
                assert_count(&adjustments, 2);
                let net: i64 = adjustments.iter().map(|a| a.delta).sum();
                assert_eq!(net, 0);
            }

            #[tokio::test]
            async fn test_release_without_reservation_is_noop() {
                let store = $factory;
                let shirt = seed_product(&store, "Linen shirt", 25.0, 5).await;

                assert!(!store.release(&Uuid::new_v4()).await.unwrap());
                assert_eq!(stock_of(&store, &shirt.id).await, 5);
            }

            #[tokio::test]
            async fn test_concurrent_reservations_never_oversell() {
                let store = $factory;
                let shirt = seed_product(&store, "Linen shirt", 25.0, 5).await;

                let mut handles = vec![];
                for _ in 0..12 {
                    let store = store.clone();
                    let product_id = shirt.id;
                    handles.push(tokio::spawn(async move {
                        store
                            .reserve(&Uuid::new_v4(), &[StockLine::new(product_id, 1)])
                            .await
                            .is_ok()
                    }));
                }

                let mut succeeded = 0;
                for handle in handles {
                    if handle.await.unwrap() {
                        succeeded += 1;
                    }
                }

                assert_eq!(succeeded, 5);
                assert_eq!(stock_of(&store, &shirt.id).await, 0);
            }

            #[tokio::test]
            async fn test_concurrent_releases_restore_once() {
                let store = $factory;
                let shirt = seed_product(&store, "Linen shirt", 25.0, 4).await;
                let order_id = Uuid::new_v4();

                store
                    .reserve(&order_id, &[StockLine::new(shirt.id, 4)])
                    .await
                    .unwrap();
                assert_eq!(stock_of(&store, &shirt.id).await, 0);

                let mut handles = vec![];
                for _ in 0..8 {
                    let store = store.clone();
                    handles.push(tokio::spawn(async move { store.release(&order_id).await.unwrap() }));
                }

                let mut restored = 0;
                for handle in handles {
                    if handle.await.unwrap() {
                        restored += 1;
                    }
                }

                assert_eq!(restored, 1);
                assert_eq!(stock_of(&store, &shirt.id).await, 4);
            }
        }
    };
}

/// Generate the `OrderStore` conformance suite.
#[macro_export]
macro_rules! order_store_tests {
    ($factory:expr) => {
        mod order_store_contract_tests {
            use super::*;
            use livewear::core::service::OrderStore;
            use livewear::entities::OrderStatus;
            use uuid::Uuid;

            #[tokio::test]
            async fn test_insert_and_get() {
                let store = $factory;
                let product = sample_product("Linen shirt", 25.0, 5);
                let order = sample_order(Uuid::new_v4(), &product, 2, 0);

                let created = store.insert(order.clone()).await.unwrap();
                assert_eq!(created.id, order.id);

                let fetched = store.get(&order.id).await.unwrap().expect("order should exist");
                assert_eq!(fetched.user, order.user);
                assert_eq!(fetched.status, OrderStatus::Pending);
                assert_count(&fetched.items, 1);
                assert_eq!(fetched.items[0].quantity, 2);
                assert_price(fetched.final_price, 50.0);
                assert_eq!(fetched.shipping_address.city.as_deref(), Some("Dakar"));
            }

            #[tokio::test]
            async fn test_get_nonexistent() {
                let store = $factory;
                assert!(store.get(&Uuid::new_v4()).await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_list_newest_first() {
                let store = $factory;
                let product = sample_product("Linen shirt", 25.0, 5);
                let user = Uuid::new_v4();

                let oldest = store.insert(sample_order(user, &product, 1, 30)).await.unwrap();
                let newest = store.insert(sample_order(user, &product, 1, 0)).await.unwrap();
                let middle = store.insert(sample_order(user, &product, 1, 15)).await.unwrap();

                let ids: Vec<Uuid> = store.list(None).await.unwrap().iter().map(|o| o.id).collect();
                assert_eq!(ids, vec![newest.id, middle.id, oldest.id]);
            }

            #[tokio::test]
            async fn test_list_by_owner() {
                let store = $factory;
                let product = sample_product("Linen shirt", 25.0, 5);
                let alice = Uuid::new_v4();
                let bob = Uuid::new_v4();

                store.insert(sample_order(alice, &product, 1, 2)).await.unwrap();
                store.insert(sample_order(alice, &product, 1, 1)).await.unwrap();
                store.insert(sample_order(bob, &product, 1, 0)).await.unwrap();

                let mine = store.list(Some(&alice)).await.unwrap();
                assert_count(&mine, 2);
                assert!(mine.iter().all(|o| o.user == alice));
                assert_count(&store.list(None).await.unwrap(), 3);
            }

            #[tokio::test]
            async fn test_update_existing() {
                let store = $factory;
                let product = sample_product("Linen shirt", 25.0, 5);
                let mut order = store
                    .insert(sample_order(Uuid::new_v4(), &product, 1, 0))
                    .await
                    .unwrap();

                order.status = OrderStatus::Shipped;
                order.tracking_number = Some("LW-0001".to_string());
                store.update(order.clone()).await.unwrap();

                let fetched = store.get(&order.id).await.unwrap().unwrap();
                assert_eq!(fetched.status, OrderStatus::Shipped);
                assert_eq!(fetched.tracking_number.as_deref(), Some("LW-0001"));
            }

            #[tokio::test]
            async fn test_update_nonexistent() {
                let store = $factory;
                let product = sample_product("Linen shirt", 25.0, 5);
                let order = sample_order(Uuid::new_v4(), &product, 1, 0);

                assert!(store.update(order).await.is_err());
            }

            #[tokio::test]
            async fn test_delete() {
                let store = $factory;
                let product = sample_product("Linen shirt", 25.0, 5);
                let order = store
                    .insert(sample_order(Uuid::new_v4(), &product, 1, 0))
                    .await
                    .unwrap();

                assert!(store.delete(&order.id).await.unwrap());
                assert!(store.get(&order.id).await.unwrap().is_none());
                assert!(!store.delete(&order.id).await.unwrap());
            }
        }
    };
}

/// Generate the `CatalogStore` conformance suite.
#[macro_export]
macro_rules! catalog_store_tests {
    ($factory:expr) => {
        mod catalog_store_contract_tests {
            use super::*;
            use chrono::{Duration, Utc};
            use livewear::core::query::ProductFilter;
            use livewear::core::service::CatalogStore;
            use livewear::entities::Product;
            use uuid::Uuid;

            /// Save `product` as if created `age_secs` ago
            async fn save_aged<S: CatalogStore>(store: &S, mut product: Product, age_secs: i64) -> Product {
                product.created_at = Utc::now() - Duration::seconds(age_secs);
                product.updated_at = product.created_at;
                store.save_product(product).await.unwrap()
            }

            #[tokio::test]
            async fn test_save_and_get_product() {
                let store = $factory;
                let mut product = sample_product("Wax print dress", 45.0, 8);
                product.sizes = vec!["S".to_string(), "M".to_string()];
                product.discount_price = Some(39.0);

                store.save_product(product.clone()).await.unwrap();

                let fetched = store.get_product(&product.id).await.unwrap().unwrap();
                assert_eq!(fetched.name, "Wax print dress");
                assert_eq!(fetched.stock, 8);
                assert_eq!(fetched.sizes, vec!["S", "M"]);
                assert_eq!(fetched.discount_price, Some(39.0));
                assert!(store.get_product(&Uuid::new_v4()).await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_list_hides_inactive() {
                let store = $factory;
                let visible = seed_product(&store, "Linen shirt", 25.0, 5).await;
                let mut hidden = sample_product("Old stock", 5.0, 1);
                hidden.is_active = false;
                store.save_product(hidden.clone()).await.unwrap();

                let (products, total) = store
                    .list_products(&ProductFilter::default(), 0, 12)
                    .await
                    .unwrap();

                assert_eq!(total, 1);
                assert_eq!(products[0].id, visible.id);
                // Inactive products are still reachable by id
                assert!(store.get_product(&hidden.id).await.unwrap().is_some());
            }

            #[tokio::test]
            async fn test_list_paginates_newest_first() {
                let store = $factory;
                let mut ids = vec![];
                for i in 0..5 {
                    let product = sample_product(&format!("Item {}", i), 10.0, 1);
                    ids.push(save_aged(&store, product, 100 - i * 10).await.id);
                }
                ids.reverse();

                let filter = ProductFilter::default();
                let (first, total) = store.list_products(&filter, 0, 2).await.unwrap();
                let (last, _) = store.list_products(&filter, 4, 2).await.unwrap();

                assert_eq!(total, 5);
                assert_eq!(first.iter().map(|p| p.id).collect::<Vec<_>>(), ids[0..2].to_vec());
                assert_count(&last, 1);
                assert_eq!(last[0].id, ids[4]);
            }

            #[tokio::test]
            async fn test_filter_by_category_and_featured() {
                let store = $factory;
                let dresses = Uuid::new_v4();

                let mut dress = sample_product("Wax print dress", 45.0, 3);
                dress.category = dresses;
                dress.is_featured = true;
                store.save_product(dress.clone()).await.unwrap();

                let mut plain = sample_product("Plain dress", 30.0, 3);
                plain.category = dresses;
                store.save_product(plain).await.unwrap();

                seed_product(&store, "Linen shirt", 25.0, 5).await;

                let by_category = ProductFilter {
                    category: Some(dresses),
                    ..Default::default()
                };
                let (_, total) = store.list_products(&by_category, 0, 12).await.unwrap();
                assert_eq!(total, 2);

                let featured = ProductFilter {
                    category: Some(dresses),
                    featured_only: true,
                    ..Default::default()
                };
                let (products, total) = store.list_products(&featured, 0, 12).await.unwrap();
                assert_eq!(total, 1);
                assert_eq!(products[0].id, dress.id);
            }

            #[tokio::test]
            async fn test_search_ignores_case_and_escapes_input() {
                let store = $factory;
                let mut shirt = sample_product("Linen shirt", 25.0, 5);
                shirt.description = "Breathable LINEN for hot days".to_string();
                store.save_product(shirt.clone()).await.unwrap();
                seed_product(&store, "Silk scarf", 15.0, 2).await;

                let search = |term: &str| ProductFilter {
                    search: Some(term.to_string()),
                    ..Default::default()
                };

                let (products, total) = store.list_products(&search("hot DAYS"), 0, 12).await.unwrap();
                assert_eq!(total, 1);
                assert_eq!(products[0].id, shirt.id);

                let (_, total) = store.list_products(&search("s.*"), 0, 12).await.unwrap();
                assert_eq!(total, 0);
            }

            #[tokio::test]
            async fn test_categories_sorted_by_name() {
                let store = $factory;
                store.save_category(sample_category("Shoes")).await.unwrap();
                store.save_category(sample_category("Accessories")).await.unwrap();
                let mut retired = sample_category("Hats");
                retired.is_active = false;
                store.save_category(retired.clone()).await.unwrap();

                let names: Vec<String> = store
                    .list_categories()
                    .await
                    .unwrap()
                    .into_iter()
                    .map(|c| c.name)
                    .collect();
                assert_eq!(names, vec!["Accessories", "Shoes"]);
                assert!(store.get_category(&retired.id).await.unwrap().is_some());
            }

            #[tokio::test]
            async fn test_duplicate_category_name_rejected() {
                let store = $factory;
                store.save_category(sample_category("Dresses")).await.unwrap();

                assert!(store.save_category(sample_category("Dresses")).await.is_err());
                assert_count(&store.list_categories().await.unwrap(), 1);
            }
        }
    };
}

/// Generate the `UserStore` conformance suite.
#[macro_export]
macro_rules! user_store_tests {
    ($factory:expr) => {
        mod user_store_contract_tests {
            use super::*;
            use livewear::core::service::UserStore;
            use livewear::entities::Role;
            use uuid::Uuid;

            #[tokio::test]
            async fn test_insert_and_get() {
                let store = $factory;
                let user = seed_user(&store, "awa@livewear.test", Role::Customer).await;

                let fetched = store.get_user(&user.id).await.unwrap().unwrap();
                assert_eq!(fetched.email, "awa@livewear.test");
                assert_eq!(fetched.role, Role::Customer);
                assert!(fetched.is_active);
                assert!(store.get_user(&Uuid::new_v4()).await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_email_is_normalized() {
                let store = $factory;
                let user = store
                    .insert_user(sample_user("  Awa@LiveWear.TEST ", Role::Admin))
                    .await
                    .unwrap();
                assert_eq!(user.email, "awa@livewear.test");

                let found = store
                    .find_user_by_email("AWA@livewear.test")
                    .await
                    .unwrap()
                    .expect("lookup should ignore case");
                assert_eq!(found.id, user.id);
                assert!(store.find_user_by_email("nobody@livewear.test").await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_duplicate_email_rejected() {
                let store = $factory;
                seed_user(&store, "awa@livewear.test", Role::Customer).await;

                let result = store
                    .insert_user(sample_user("AWA@livewear.test", Role::Customer))
                    .await;
                assert!(result.is_err());
            }
        }
    };
}
