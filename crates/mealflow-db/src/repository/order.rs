//! # Order Repository (SQLite)
//!
//! SQLite implementation of the `OrderRepository` port.
//!
//! ## Write Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Order Write Paths                                  │
//! │                                                                         │
//! │  create(order)                                                         │
//! │    └── INSERT orders + order_items in one transaction                  │
//! │        └── UNIQUE(order_number) rejection → RepoError::UniqueViolation │
//! │                                                                         │
//! │  update(id, expected_revision, order)                                  │
//! │    └── UPDATE ... WHERE id = ? AND revision = expected                 │
//! │        ├── 1 row   → revision bumped, stored row returned              │
//! │        └── 0 rows  → row exists? Conflict : NotFound                   │
//! │                                                                         │
//! │  Items are immutable after creation; updates touch `orders` only.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The aggregate computes totals and timestamps before these calls; this
//! layer stores what it is given and never recomputes anything.

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbError;
use mealflow_core::{
    ContactInfo, DeliveryAddress, DeliveryType, EmailSource, Order, OrderFilter, OrderItem,
    OrderRepository, OrderStatus, Page, PaymentMethod, PaymentStatus, RepoError,
};

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct SqliteOrderRepository {
    pool: SqlitePool,
}

impl SqliteOrderRepository {
    /// Creates a new SqliteOrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SqliteOrderRepository { pool }
    }

    async fn items_for(&self, order_id: &str) -> Result<Vec<OrderItem>, DbError> {
        let rows: Vec<ItemRow> = sqlx::query_as(
            r#"
            SELECT name, unit_price_cents, quantity, image_ref, special_instructions,
                   item_total_cents
            FROM order_items
            WHERE order_id = ?
            ORDER BY position
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(rows.into_iter().map(ItemRow::into_item).collect())
    }
}

#[async_trait]
impl OrderRepository for SqliteOrderRepository {
    async fn create(&self, order: &Order) -> Result<Order, RepoError> {
        let mut stored = order.clone();
        stored.id = Uuid::new_v4().to_string();
        stored.revision = 0;

        debug!(id = %stored.id, order_number = %stored.order_number, "Inserting order");

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let address = stored.delivery_address.as_ref();
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number,
                user_id, user_email, email_source,
                restaurant_id, restaurant_name, restaurant_image,
                delivery_type, delivery_street, delivery_city, delivery_state,
                delivery_zip_code,
                contact_first_name, contact_last_name, contact_email, contact_phone,
                subtotal_cents, delivery_fee_cents, tax_cents, service_fee_cents,
                tip_cents, discount_cents, total_cents,
                status, payment_method, payment_status,
                created_at, updated_at, estimated_delivery, delivered_at,
                cancelled_at, cancellation_reason,
                rated, rating, review,
                revision
            ) VALUES (
                ?, ?,
                ?, ?, ?,
                ?, ?, ?,
                ?, ?, ?, ?,
                ?,
                ?, ?, ?, ?,
                ?, ?, ?, ?,
                ?, ?, ?,
                ?, ?, ?,
                ?, ?, ?, ?,
                ?, ?,
                ?, ?, ?,
                ?
            )
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.order_number)
        .bind(&stored.user_id)
        .bind(&stored.user_email)
        .bind(stored.email_source)
        .bind(&stored.restaurant_id)
        .bind(&stored.restaurant_name)
        .bind(&stored.restaurant_image)
        .bind(stored.delivery_type)
        .bind(address.map(|a| a.street.clone()))
        .bind(address.map(|a| a.city.clone()))
        .bind(address.map(|a| a.state.clone()))
        .bind(address.map(|a| a.zip_code.clone()))
        .bind(&stored.contact.first_name)
        .bind(&stored.contact.last_name)
        .bind(&stored.contact.email)
        .bind(&stored.contact.phone)
        .bind(stored.subtotal_cents)
        .bind(stored.delivery_fee_cents)
        .bind(stored.tax_cents)
        .bind(stored.service_fee_cents)
        .bind(stored.tip_cents)
        .bind(stored.discount_cents)
        .bind(stored.total_cents)
        .bind(stored.status)
        .bind(stored.payment_method)
        .bind(stored.payment_status)
        .bind(stored.created_at)
        .bind(stored.updated_at)
        .bind(stored.estimated_delivery)
        .bind(stored.delivered_at)
        .bind(stored.cancelled_at)
        .bind(&stored.cancellation_reason)
        .bind(stored.rated)
        .bind(stored.rating)
        .bind(&stored.review)
        .bind(stored.revision)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        for (position, item) in stored.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, position, name, unit_price_cents, quantity,
                    image_ref, special_instructions, item_total_cents
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&stored.id)
            .bind(position as i64)
            .bind(&item.name)
            .bind(item.unit_price_cents)
            .bind(item.quantity)
            .bind(&item.image_ref)
            .bind(&item.special_instructions)
            .bind(item.item_total_cents)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;
        }

        tx.commit().await.map_err(DbError::from)?;

        Ok(stored)
    }

    async fn find_by_id(&self, id: &str) -> Result<Order, RepoError> {
        let row: Option<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;

        let row = row.ok_or_else(|| RepoError::not_found("Order", id))?;
        let items = self.items_for(&row.id).await?;

        Ok(row.into_order(items))
    }

    async fn find(&self, filter: &OrderFilter, page: Page) -> Result<(Vec<Order>, u64), RepoError> {
        let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM orders");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;

        let mut list_query = QueryBuilder::new("SELECT * FROM orders");
        push_filters(&mut list_query, filter);
        list_query.push(" ORDER BY created_at DESC LIMIT ");
        list_query.push_bind(page.size as i64);
        list_query.push(" OFFSET ");
        list_query.push_bind(page.offset() as i64);

        let rows: Vec<OrderRow> = list_query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.items_for(&row.id).await?;
            orders.push(row.into_order(items));
        }

        Ok((orders, total as u64))
    }

    async fn update(
        &self,
        id: &str,
        expected_revision: i64,
        order: &Order,
    ) -> Result<Order, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                subtotal_cents = ?,
                delivery_fee_cents = ?,
                tax_cents = ?,
                service_fee_cents = ?,
                tip_cents = ?,
                discount_cents = ?,
                total_cents = ?,
                status = ?,
                payment_status = ?,
                updated_at = ?,
                estimated_delivery = ?,
                delivered_at = ?,
                cancelled_at = ?,
                cancellation_reason = ?,
                rated = ?,
                rating = ?,
                review = ?,
                revision = revision + 1
            WHERE id = ? AND revision = ?
            "#,
        )
        .bind(order.subtotal_cents)
        .bind(order.delivery_fee_cents)
        .bind(order.tax_cents)
        .bind(order.service_fee_cents)
        .bind(order.tip_cents)
        .bind(order.discount_cents)
        .bind(order.total_cents)
        .bind(order.status)
        .bind(order.payment_status)
        .bind(order.updated_at)
        .bind(order.estimated_delivery)
        .bind(order.delivered_at)
        .bind(order.cancelled_at)
        .bind(&order.cancellation_reason)
        .bind(order.rated)
        .bind(order.rating)
        .bind(&order.review)
        .bind(id)
        .bind(expected_revision)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            // distinguish a vanished row from a lost race
            let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM orders WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(DbError::from)?;

            return match exists {
                Some(_) => {
                    debug!(id = %id, expected_revision, "Conditional order update lost the race");
                    Err(RepoError::Conflict { id: id.to_string() })
                }
                None => Err(RepoError::not_found("Order", id)),
            };
        }

        self.find_by_id(id).await
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

/// Flat row shape for the `orders` table.
///
/// Kept separate from the domain `Order` so the aggregate never grows
/// database concerns; the nested address/contact blocks are flattened to
/// columns here and rebuilt on read.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    order_number: String,
    user_id: Option<String>,
    user_email: String,
    email_source: EmailSource,
    restaurant_id: String,
    restaurant_name: String,
    restaurant_image: Option<String>,
    delivery_type: DeliveryType,
    delivery_street: Option<String>,
    delivery_city: Option<String>,
    delivery_state: Option<String>,
    delivery_zip_code: Option<String>,
    contact_first_name: String,
    contact_last_name: String,
    contact_email: Option<String>,
    contact_phone: String,
    subtotal_cents: i64,
    delivery_fee_cents: i64,
    tax_cents: i64,
    service_fee_cents: i64,
    tip_cents: i64,
    discount_cents: i64,
    total_cents: i64,
    status: OrderStatus,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    estimated_delivery: Option<chrono::DateTime<chrono::Utc>>,
    delivered_at: Option<chrono::DateTime<chrono::Utc>>,
    cancelled_at: Option<chrono::DateTime<chrono::Utc>>,
    cancellation_reason: Option<String>,
    rated: bool,
    rating: Option<i64>,
    review: Option<String>,
    revision: i64,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        let delivery_address = self.delivery_street.map(|street| DeliveryAddress {
            street,
            city: self.delivery_city.unwrap_or_default(),
            state: self.delivery_state.unwrap_or_default(),
            zip_code: self.delivery_zip_code.unwrap_or_default(),
        });

        Order {
            id: self.id,
            order_number: self.order_number,
            user_id: self.user_id,
            user_email: self.user_email,
            email_source: self.email_source,
            restaurant_id: self.restaurant_id,
            restaurant_name: self.restaurant_name,
            restaurant_image: self.restaurant_image,
            items,
            delivery_type: self.delivery_type,
            delivery_address,
            contact: ContactInfo {
                first_name: self.contact_first_name,
                last_name: self.contact_last_name,
                email: self.contact_email,
                phone: self.contact_phone,
            },
            subtotal_cents: self.subtotal_cents,
            delivery_fee_cents: self.delivery_fee_cents,
            tax_cents: self.tax_cents,
            service_fee_cents: self.service_fee_cents,
            tip_cents: self.tip_cents,
            discount_cents: self.discount_cents,
            total_cents: self.total_cents,
            status: self.status,
            payment_method: self.payment_method,
            payment_status: self.payment_status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            estimated_delivery: self.estimated_delivery,
            delivered_at: self.delivered_at,
            cancelled_at: self.cancelled_at,
            cancellation_reason: self.cancellation_reason,
            rated: self.rated,
            rating: self.rating,
            review: self.review,
            revision: self.revision,
        }
    }
}

/// Row shape for the `order_items` table.
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    name: String,
    unit_price_cents: i64,
    quantity: i64,
    image_ref: Option<String>,
    special_instructions: Option<String>,
    item_total_cents: i64,
}

impl ItemRow {
    fn into_item(self) -> OrderItem {
        OrderItem {
            name: self.name,
            unit_price_cents: self.unit_price_cents,
            quantity: self.quantity,
            image_ref: self.image_ref,
            special_instructions: self.special_instructions,
            item_total_cents: self.item_total_cents,
        }
    }
}

// =============================================================================
// Query Helpers
// =============================================================================

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &OrderFilter) {
    let mut prefix = " WHERE ";

    if let Some(user_id) = &filter.user_id {
        query.push(prefix).push("user_id = ").push_bind(user_id.clone());
        prefix = " AND ";
    }

    if let Some(restaurant_id) = &filter.restaurant_id {
        query
            .push(prefix)
            .push("restaurant_id = ")
            .push_bind(restaurant_id.clone());
        prefix = " AND ";
    }

    if let Some(status) = filter.status {
        query.push(prefix).push("status = ").push_bind(status);
        prefix = " AND ";
    }

    if let Some(payment_status) = filter.payment_status {
        query
            .push(prefix)
            .push("payment_status = ")
            .push_bind(payment_status);
    }
}

// =============================================================================
// Integration Tests (in-memory SQLite)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, Utc};
    use mealflow_core::{NewOrder, TaxRate};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn sample_order(order_number: &str, user_id: Option<&str>) -> Order {
        let mut order = Order::place(NewOrder {
            user_id: user_id.map(str::to_string),
            account_email: None,
            restaurant_id: "rest-1".to_string(),
            restaurant_name: "Thai Garden".to_string(),
            restaurant_image: Some("thai.png".to_string()),
            items: vec![
                OrderItem::new("Pad Thai", 1699, 1, None, Some("extra spicy".to_string())),
                OrderItem::new("Spring Rolls", 699, 2, None, None),
            ],
            delivery_type: DeliveryType::Delivery,
            delivery_address: Some(DeliveryAddress {
                street: "1 Main St".to_string(),
                city: "Austin".to_string(),
                state: "TX".to_string(),
                zip_code: "78701".to_string(),
            }),
            contact: ContactInfo {
                first_name: "Ada".to_string(),
                last_name: "Nguyen".to_string(),
                email: Some("ada@example.com".to_string()),
                phone: "555-0100".to_string(),
            },
            payment_method: PaymentMethod::CreditCard,
            tax_rate: TaxRate::from_bps(800),
            delivery_fee_cents: 299,
            service_fee_cents: 0,
            tip_cents: 0,
            discount_cents: 0,
            estimated_delivery: None,
            client_total_cents: None,
        })
        .unwrap();
        order.order_number = order_number.to_string();
        order
    }

    #[tokio::test]
    async fn test_create_and_find_roundtrip() {
        let db = test_db().await;
        let repo = db.orders();

        let created = repo.create(&sample_order("ORD-1", Some("user-1"))).await.unwrap();
        assert!(!created.id.is_empty());
        assert_eq!(created.revision, 0);

        let found = repo.find_by_id(&created.id).await.unwrap();
        assert_eq!(found.order_number, "ORD-1");
        assert_eq!(found.user_id.as_deref(), Some("user-1"));
        assert_eq!(found.total_cents, 3644);
        assert_eq!(found.status, OrderStatus::Confirmed);

        // items come back in submission order with their snapshots intact
        assert_eq!(found.items.len(), 2);
        assert_eq!(found.items[0].name, "Pad Thai");
        assert_eq!(
            found.items[0].special_instructions.as_deref(),
            Some("extra spicy")
        );
        assert_eq!(found.items[1].quantity, 2);

        let address = found.delivery_address.expect("address survived the roundtrip");
        assert_eq!(address.zip_code, "78701");
    }

    #[tokio::test]
    async fn test_duplicate_order_number_is_a_unique_violation() {
        let db = test_db().await;
        let repo = db.orders();

        repo.create(&sample_order("ORD-DUP", None)).await.unwrap();
        let err = repo.create(&sample_order("ORD-DUP", None)).await.unwrap_err();

        assert!(err.is_order_number_collision(), "got {err:?}");
    }

    #[tokio::test]
    async fn test_find_by_id_not_found() {
        let db = test_db().await;
        let err = db.orders().find_by_id("missing").await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_is_compare_and_set() {
        let db = test_db().await;
        let repo = db.orders();

        let created = repo.create(&sample_order("ORD-CAS", None)).await.unwrap();

        // two readers grab the same revision
        let mut first = repo.find_by_id(&created.id).await.unwrap();
        let mut second = repo.find_by_id(&created.id).await.unwrap();

        first.transition_to(OrderStatus::Preparing).unwrap();
        let stored = repo.update(&created.id, first.revision, &first).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Preparing);
        assert_eq!(stored.revision, 1);

        // the stale writer loses with Conflict, not a silent overwrite
        second.cancel("changed my mind", false).unwrap();
        let err = repo
            .update(&created.id, second.revision, &second)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Conflict { .. }), "got {err:?}");

        let current = repo.find_by_id(&created.id).await.unwrap();
        assert_eq!(current.status, OrderStatus::Preparing);
    }

    #[tokio::test]
    async fn test_update_missing_order_is_not_found() {
        let db = test_db().await;
        let order = sample_order("ORD-GONE", None);

        let err = db.orders().update("missing", 0, &order).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_find_filters_and_paginates_newest_first() {
        let db = test_db().await;
        let repo = db.orders();

        let now = Utc::now();
        for (i, (number, user)) in [
            ("ORD-A1", Some("user-a")),
            ("ORD-A2", Some("user-a")),
            ("ORD-B1", Some("user-b")),
        ]
        .iter()
        .enumerate()
        {
            let mut order = sample_order(number, *user);
            order.created_at = now - Duration::minutes(i as i64);
            repo.create(&order).await.unwrap();
        }

        let filter = OrderFilter {
            user_id: Some("user-a".to_string()),
            ..OrderFilter::default()
        };

        let (orders, total) = repo.find(&filter, Page::default()).await.unwrap();
        assert_eq!(total, 2);
        // ORD-A1 has the latest created_at
        assert_eq!(orders[0].order_number, "ORD-A1");
        assert_eq!(orders[1].order_number, "ORD-A2");

        // one-per-page window still reports the full count
        let (page_one, total) = repo.find(&filter, Page::first(1)).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(page_one.len(), 1);

        let (page_two, _) = repo
            .find(&filter, Page { number: 2, size: 1 })
            .await
            .unwrap();
        assert_eq!(page_two[0].order_number, "ORD-A2");

        // status filter composes with the user filter
        let (confirmed, _) = repo
            .find(
                &OrderFilter {
                    user_id: Some("user-a".to_string()),
                    status: Some(OrderStatus::Confirmed),
                    ..OrderFilter::default()
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(confirmed.len(), 2);
    }
}
