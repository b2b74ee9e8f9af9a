use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
};
use sea_orm::sea_query::{Expr, LockType};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    catalog::is_stock_exempt,
    dto::orders::{CheckoutRequest, OrderWithItems, UserOrderItemView, UserOrderList, UserOrderView},
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems, Model as CartItemModel},
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel, OrderStatus},
        product_variants::{Column as VariantCol, Entity as ProductVariants},
        products::{Column as ProdCol, Entity as Products},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    notify::{OrderPlaced, PlacedItem},
    pricing::{CartPricing, LivePrice, OrderTotals, cart_total, referenced_ids},
    response::{ApiResponse, Meta},
    services::promo_service::{self, PROMO_CODE_LEN},
    shipping::{GovernorateRate, find_governorate, governorate_rates},
    state::AppState,
};

/// The stock row a cart line draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StockKey {
    Product(Uuid),
    Variant(Uuid),
}

impl StockKey {
    pub fn of(item: &CartItemModel) -> Self {
        match item.variant_id {
            Some(variant_id) => StockKey::Variant(variant_id),
            None => StockKey::Product(item.product_id),
        }
    }
}

/// Total quantity requested from each stock row. Lines that share a row
/// (same variant in two sizes, say) are summed.
pub fn stock_demand(items: &[CartItemModel]) -> BTreeMap<StockKey, (Uuid, i32)> {
    let mut demand = BTreeMap::new();
    for item in items {
        let entry = demand.entry(StockKey::of(item)).or_insert((item.product_id, 0));
        entry.1 += item.quantity;
    }
    demand
}

/// Empty or absent codes mean "no promo"; anything else must be exactly six characters.
pub fn checkout_promo_code(raw: Option<&str>) -> AppResult<Option<String>> {
    match raw.and_then(promo_service::normalize_code) {
        None => Ok(None),
        Some(code) if code.chars().count() == PROMO_CODE_LEN => Ok(Some(code)),
        Some(_) => Err(AppError::bad_request("Promo code must be 6 characters long")),
    }
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    payload.validate()?;
    let promo_code = checkout_promo_code(payload.promo_code.as_deref())?;

    let txn = state.orm.begin().await?;

    // Locking the cart serialises concurrent checkouts by the same customer.
    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::bad_request("Cart is empty."))?;

    let items = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .order_by_asc(CartItemCol::CreatedAt)
        .all(&txn)
        .await?;
    if items.is_empty() {
        return Err(AppError::bad_request("Cart is empty."));
    }

    let promo = match &promo_code {
        Some(code) => Some(
            promo_service::find_usable(&txn, code, user.user_id, Utc::now(), true)
                .await?
                .ok_or_else(|| AppError::bad_request("Invalid or expired promo code."))?,
        ),
        None => None,
    };

    let governorate = find_governorate(payload.governorate)
        .ok_or_else(|| AppError::bad_request("Invalid governorate"))?;

    let (product_ids, variant_ids) = referenced_ids(&items);
    let products = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .order_by_asc(ProdCol::Id)
        .lock(LockType::Update)
        .all(&txn)
        .await?;
    let variants = if variant_ids.is_empty() {
        Vec::new()
    } else {
        ProductVariants::find()
            .filter(VariantCol::Id.is_in(variant_ids))
            .order_by_asc(VariantCol::Id)
            .lock(LockType::Update)
            .all(&txn)
            .await?
    };
    let pricing = CartPricing::new(products, variants);

    let lines = pricing.lines(&items);
    let priced: Vec<(&CartItemModel, LivePrice)> = items
        .iter()
        .zip(&lines)
        .map(|(item, line)| {
            line.unit_price.map(|price| (item, price)).ok_or_else(|| {
                AppError::bad_request("A product in your cart is no longer available")
            })
        })
        .collect::<AppResult<_>>()?;

    let subtotal = cart_total(&lines);
    if subtotal.amount() != cart.total_price {
        tracing::warn!(
            cart_id = %cart.id,
            cached = %cart.total_price,
            recomputed = %subtotal.amount(),
            "cached cart total is stale; using recomputed subtotal"
        );
    }

    let demand = stock_demand(&items);
    for (key, (product_id, quantity)) in &demand {
        let Some(product) = pricing.products.get(product_id) else {
            continue;
        };
        if is_stock_exempt(product.product_type) {
            continue;
        }
        let available = match key {
            StockKey::Variant(id) => pricing.variants.get(id).map_or(0, |v| v.stock_quantity),
            StockKey::Product(_) => product.stock_quantity,
        };
        if *quantity > available {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for {}",
                product.name
            )));
        }
    }

    let discount_percent = promo.as_ref().map_or(0, |p| p.discount_percent);
    let totals = OrderTotals::compute(subtotal, discount_percent, governorate.shipping_cost());

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        order_date: Set(Utc::now().into()),
        subtotal: Set(totals.subtotal.amount()),
        discount_percent: Set(totals.discount_percent),
        shipping_cost: Set(totals.shipping_cost.amount()),
        total_amount: Set(totals.total_amount.amount()),
        address: Set(payload.address.trim().to_string()),
        apartment_no: Set(payload.apartment_no.trim().to_string()),
        city: Set(payload.city.trim().to_string()),
        governorate: Set(governorate.name.to_string()),
        phone_number: Set(payload.phone_number.clone()),
        status: Set(OrderStatus::Pending),
    }
    .insert(&txn)
    .await?;

    let mut order_items = Vec::with_capacity(priced.len());
    let mut placed = Vec::with_capacity(priced.len());
    for (item, unit_price) in &priced {
        let snapshot = unit_price.snapshot();
        let size = item.size.clone().or_else(|| {
            item.variant_id
                .and_then(|id| pricing.variants.get(&id))
                .and_then(|v| v.size.clone())
        });
        let row = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(item.product_id),
            variant_id: Set(item.variant_id),
            size: Set(size.clone()),
            quantity: Set(item.quantity),
            price: Set(snapshot.amount()),
        }
        .insert(&txn)
        .await?;

        if let Some(product) = pricing.products.get(&item.product_id) {
            placed.push(PlacedItem {
                product_type: product.product_type.label().to_string(),
                name: product.name.clone(),
                quantity: item.quantity,
                size,
                price: snapshot.amount(),
            });
        }
        order_items.push(OrderItem::from(row));
    }

    for (key, (_, quantity)) in &demand {
        match key {
            StockKey::Variant(id) => {
                ProductVariants::update_many()
                    .col_expr(
                        VariantCol::StockQuantity,
                        Expr::col(VariantCol::StockQuantity).sub(*quantity),
                    )
                    .filter(VariantCol::Id.eq(*id))
                    .exec(&txn)
                    .await?;
            }
            StockKey::Product(id) => {
                Products::update_many()
                    .col_expr(
                        ProdCol::StockQuantity,
                        Expr::col(ProdCol::StockQuantity).sub(*quantity),
                    )
                    .filter(ProdCol::Id.eq(*id))
                    .exec(&txn)
                    .await?;
            }
        }
    }

    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;
    let mut cart: CartActive = cart.into();
    cart.total_price = Set(Decimal::ZERO);
    cart.updated_at = Set(Utc::now().into());
    cart.update(&txn).await?;

    if let Some(promo) = &promo {
        promo_service::consume(&txn, promo, user.user_id).await?;
    }

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user.user_id,
        total = %order.total_amount,
        discount_percent = order.discount_percent,
        "order placed"
    );

    audit::record(
        &state.pool,
        user.user_id,
        "checkout",
        "orders",
        serde_json::json!({
            "order_id": order.id,
            "total_amount": order.total_amount,
            "promo_code": promo.as_ref().map(|p| p.code.clone()),
        }),
    )
    .await;

    notify_order_placed(state, user, &order, placed).await;

    Ok(ApiResponse::success(
        "Order placed successfully",
        OrderWithItems {
            order: Order::from(order),
            items: order_items,
        },
        Some(Meta::empty()),
    ))
}

async fn notify_order_placed(
    state: &AppState,
    user: &AuthUser,
    order: &OrderModel,
    items: Vec<PlacedItem>,
) {
    let customer = match Users::find_by_id(user.user_id).one(&state.orm).await {
        Ok(Some(customer)) => customer,
        Ok(None) => {
            tracing::warn!(user_id = %user.user_id, "customer vanished before notification");
            return;
        }
        Err(err) => {
            tracing::warn!(error = %err, "could not load customer for notification");
            return;
        }
    };

    let event = OrderPlaced {
        order_id: order.id,
        customer_name: customer.full_name(),
        customer_email: customer.email,
        delivery_address: format!(
            "{}, {}, {}, {}",
            order.address, order.apartment_no, order.city, order.governorate
        ),
        phone_number: order.phone_number.clone(),
        status: "Pending".into(),
        subtotal: order.subtotal,
        discount_percent: order.discount_percent,
        shipping_cost: order.shipping_cost,
        total_amount: order.total_amount,
        items,
    };
    state.notifiers.order_placed(&event).await;
}

#[derive(FromRow)]
struct OrderItemRow {
    order_id: Uuid,
    product_id: Uuid,
    name: Option<String>,
    quantity: i32,
    price: Decimal,
    size: Option<String>,
    image_url: Option<String>,
}

/// Numbers orders 1, 2, 3… from the customer's oldest, then lists newest first.
pub fn number_orders<T>(oldest_first: Vec<T>) -> Vec<(i64, T)> {
    let mut numbered: Vec<(i64, T)> = oldest_first
        .into_iter()
        .enumerate()
        .map(|(idx, order)| (idx as i64 + 1, order))
        .collect();
    numbered.reverse();
    numbered
}

pub async fn list_user_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<UserOrderList>> {
    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_asc(OrderCol::OrderDate)
        .order_by_asc(OrderCol::Id)
        .all(&state.orm)
        .await?;
    if orders.is_empty() {
        return Err(AppError::not_found("No orders found for this user."));
    }

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let rows = sqlx::query_as::<_, OrderItemRow>(
        r#"
        SELECT oi.order_id, oi.product_id, p.name, oi.quantity, oi.price, oi.size,
               img.image_url
        FROM order_items oi
        LEFT JOIN products p ON p.id = oi.product_id
        LEFT JOIN LATERAL (
            SELECT pi.image_url
            FROM product_images pi
            WHERE pi.product_id = oi.product_id
            ORDER BY pi.is_primary DESC, pi.created_at
            LIMIT 1
        ) img ON TRUE
        WHERE oi.order_id = ANY($1)
        ORDER BY oi.id
        "#,
    )
    .bind(&order_ids)
    .fetch_all(&state.pool)
    .await?;

    let mut items_by_order: BTreeMap<Uuid, Vec<UserOrderItemView>> = BTreeMap::new();
    for row in rows {
        items_by_order
            .entry(row.order_id)
            .or_default()
            .push(UserOrderItemView {
                product_id: row.product_id,
                name: row.name,
                quantity: row.quantity,
                price: row.price,
                size: row.size,
                image_url: row.image_url,
            });
    }

    let total = orders.len() as i64;
    let items = number_orders(orders)
        .into_iter()
        .map(|(order_number, order)| UserOrderView {
            order_number,
            order_id: order.id,
            order_date: order.order_date.with_timezone(&Utc),
            status: order.status,
            subtotal: order.subtotal,
            discount_percent: order.discount_percent,
            shipping_cost: order.shipping_cost,
            total_amount: order.total_amount,
            items: items_by_order.remove(&order.id).unwrap_or_default(),
        })
        .collect();

    Ok(ApiResponse::success(
        "Orders retrieved successfully",
        UserOrderList { items },
        Some(Meta::unpaged(total)),
    ))
}

pub async fn get_user_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: Order::from(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub fn list_governorates() -> ApiResponse<Vec<GovernorateRate>> {
    ApiResponse::success("OK", governorate_rates(), Some(Meta::empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: Uuid, variant_id: Option<Uuid>, quantity: i32) -> CartItemModel {
        CartItemModel {
            id: Uuid::new_v4(),
            cart_id: Uuid::new_v4(),
            product_id,
            variant_id,
            size: None,
            quantity,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn demand_sums_lines_sharing_a_stock_row() {
        let necklace = Uuid::new_v4();
        let chain = Uuid::new_v4();
        let variant = Uuid::new_v4();
        let items = vec![
            item(necklace, None, 2),
            item(chain, Some(variant), 1),
            item(necklace, None, 3),
            item(chain, Some(variant), 4),
        ];
        let demand = stock_demand(&items);
        assert_eq!(demand.len(), 2);
        assert_eq!(demand[&StockKey::Product(necklace)], (necklace, 5));
        assert_eq!(demand[&StockKey::Variant(variant)], (chain, 5));
    }

    #[test]
    fn blank_promo_means_none() {
        assert_eq!(checkout_promo_code(None).unwrap(), None);
        assert_eq!(checkout_promo_code(Some("")).unwrap(), None);
        assert_eq!(checkout_promo_code(Some("  ")).unwrap(), None);
    }

    #[test]
    fn promo_must_be_six_characters() {
        assert_eq!(
            checkout_promo_code(Some("bday20")).unwrap(),
            Some("BDAY20".to_string())
        );
        assert!(checkout_promo_code(Some("SHORT")).is_err());
        assert!(checkout_promo_code(Some("TOOLONG")).is_err());
    }

    #[test]
    fn orders_are_numbered_from_the_oldest() {
        let numbered = number_orders(vec!["first", "second", "third"]);
        assert_eq!(numbered, vec![(3, "third"), (2, "second"), (1, "first")]);
    }
}
