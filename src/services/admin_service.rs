use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use sea_orm::sea_query::LockType;
use sea_orm::ActiveValue::{NotSet, Set};
use uuid::Uuid;

use crate::{
    audit,
    catalog::{ALLOWED_SIZES, ProductType, requires_size},
    dto::{
        admin::{
            BulkAddProductsRequest, DeleteProductsRequest, DeletedCount, LowStockQuery,
            MonthlyOrderTotal, MonthlyOrderTotals, NewProduct, ProductList, UpdateOrderStatusRequest,
            UpdateProductRequest, UpdateSortOrderRequest, UpdatedCount, UserList,
            UserWithOrderCount,
        },
        orders::{OrderList, OrderWithItems},
    },
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        product_images::ActiveModel as ImageActive,
        product_variants::ActiveModel as VariantActive,
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderItem, Product},
    pricing::recalculate_cart_total,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, Pagination, SortOrder},
    state::AppState,
};

const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 5;

fn by_key(name: &str, product_type: ProductType) -> Condition {
    Condition::all()
        .add(ProdCol::Name.eq(name.trim()))
        .add(ProdCol::ProductType.eq(product_type))
}

async fn find_by_key<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    product_type: ProductType,
) -> AppResult<Option<ProductModel>> {
    Ok(Products::find()
        .filter(by_key(name, product_type))
        .one(conn)
        .await?)
}

/// Shape checks that need no database access.
pub fn validate_new_product(product: &NewProduct) -> AppResult<()> {
    if product.name.trim().is_empty() {
        return Err(AppError::bad_request("Product name is required"));
    }
    if product.variants.is_empty() && product.price.is_none() {
        return Err(AppError::BadRequest(format!(
            "Price is required for {} because it has no variants",
            product.name
        )));
    }
    let mut sizes = HashSet::new();
    for variant in &product.variants {
        if !sizes.insert(variant.size.as_deref()) {
            return Err(AppError::BadRequest(format!(
                "Duplicate variant size for {}",
                product.name
            )));
        }
        if requires_size(product.product_type, &product.name)
            && !variant
                .size
                .as_deref()
                .is_some_and(|s| ALLOWED_SIZES.contains(&s))
        {
            return Err(AppError::bad_request("Variant size must be 'S/M' or 'M/L'"));
        }
    }
    Ok(())
}

pub async fn bulk_add_products(
    state: &AppState,
    user: &AuthUser,
    payload: BulkAddProductsRequest,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    if payload.products.is_empty() {
        return Err(AppError::bad_request("No products supplied"));
    }

    let mut seen = HashSet::new();
    for product in &payload.products {
        validate_new_product(product)?;
        if !seen.insert((product.name.trim().to_string(), product.product_type)) {
            return Err(AppError::Conflict(format!(
                "Product {} ({}) appears twice in the request",
                product.name,
                product.product_type.label()
            )));
        }
    }

    let txn = state.orm.begin().await?;
    let mut created = Vec::with_capacity(payload.products.len());

    for new in payload.products {
        if find_by_key(&txn, &new.name, new.product_type).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Product {} ({}) already exists",
                new.name,
                new.product_type.label()
            )));
        }

        let product = ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(new.name.trim().to_string()),
            description: Set(new.description),
            product_type: Set(new.product_type),
            price: Set(new.price),
            stock_quantity: Set(new.stock_quantity),
            sort_order: Set(new.sort_order),
            is_new: Set(new.is_new),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&txn)
        .await?;

        for (idx, url) in new.image_urls.iter().enumerate() {
            ImageActive {
                id: Set(Uuid::new_v4()),
                product_id: Set(product.id),
                image_url: Set(url.clone()),
                is_primary: Set(idx == 0),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?;
        }

        for variant in new.variants {
            VariantActive {
                id: Set(Uuid::new_v4()),
                product_id: Set(product.id),
                size: Set(variant.size),
                color: Set(variant.color),
                price: Set(variant.price),
                stock_quantity: Set(variant.stock_quantity),
            }
            .insert(&txn)
            .await?;
        }

        created.push(product);
    }

    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "products_bulk_add",
        "products",
        serde_json::json!({ "product_ids": created.iter().map(|p| p.id).collect::<Vec<_>>() }),
    )
    .await;

    let items: Vec<Product> = created.into_iter().map(Product::from).collect();
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Products added",
        ProductList { items },
        Some(Meta::unpaged(total)),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.stock_quantity.is_some_and(|s| s < 0) {
        return Err(AppError::bad_request("stock_quantity cannot be negative"));
    }
    if payload.price.is_some_and(|p| p.is_sign_negative()) {
        return Err(AppError::bad_request("price cannot be negative"));
    }

    let txn = state.orm.begin().await?;
    let existing = Products::find()
        .filter(by_key(&payload.name, payload.product_type))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;

    let price_changed = payload.price.is_some_and(|p| Some(p) != existing.price);
    let mut active: ProductActive = existing.into();
    if let Some(stock) = payload.stock_quantity {
        active.stock_quantity = Set(stock);
    }
    if let Some(price) = payload.price {
        active.price = Set(Some(price));
    }
    if let Some(is_new) = payload.is_new {
        active.is_new = Set(is_new);
    }
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&txn).await?;

    if price_changed {
        let carts = carts_holding(&txn, &[product.id]).await?;
        for cart_id in carts {
            recalculate_cart_total(&txn, cart_id).await?;
        }
    }

    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product updated",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_products(
    state: &AppState,
    user: &AuthUser,
    payload: DeleteProductsRequest,
) -> AppResult<ApiResponse<DeletedCount>> {
    ensure_admin(user)?;
    if payload.products.is_empty() {
        return Err(AppError::bad_request("No products supplied"));
    }

    let mut condition = Condition::any();
    for key in &payload.products {
        condition = condition.add(by_key(&key.name, key.product_type));
    }

    let txn = state.orm.begin().await?;
    let ids: Vec<Uuid> = Products::find()
        .filter(condition)
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();
    if ids.is_empty() {
        return Err(AppError::not_found("No matching products found"));
    }

    let carts = carts_holding(&txn, &ids).await?;
    let result = Products::delete_many()
        .filter(ProdCol::Id.is_in(ids.clone()))
        .exec(&txn)
        .await?;
    for cart_id in carts {
        recalculate_cart_total(&txn, cart_id).await?;
    }
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "products_delete",
        "products",
        serde_json::json!({ "product_ids": ids }),
    )
    .await;

    Ok(ApiResponse::success(
        "Products deleted",
        DeletedCount {
            deleted: result.rows_affected,
        },
        Some(Meta::empty()),
    ))
}

/// Carts with at least one line for any of `product_ids`.
async fn carts_holding<C: ConnectionTrait>(conn: &C, product_ids: &[Uuid]) -> AppResult<Vec<Uuid>> {
    let carts: Vec<Uuid> = CartItems::find()
        .select_only()
        .column(CartItemCol::CartId)
        .filter(CartItemCol::ProductId.is_in(product_ids.to_vec()))
        .distinct()
        .into_tuple()
        .all(conn)
        .await?;
    Ok(carts)
}

pub async fn update_sort_order(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateSortOrderRequest,
) -> AppResult<ApiResponse<UpdatedCount>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;
    let mut updated = 0;
    for entry in &payload.entries {
        let result = Products::update_many()
            .col_expr(ProdCol::SortOrder, sea_orm::sea_query::Expr::value(entry.sort_order))
            .filter(by_key(&entry.name, entry.product_type))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            tracing::warn!(name = %entry.name, product_type = entry.product_type.label(), "sort order target not found");
        }
        updated += result.rows_affected;
    }
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "products_sort_order",
        "products",
        serde_json::json!({ "updated": updated }),
    )
    .await;

    Ok(ApiResponse::success(
        "Sort order updated",
        UpdatedCount { updated },
        Some(Meta::empty()),
    ))
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::OrderDate),
        SortOrder::Desc => finder.order_by_desc(OrderCol::OrderDate),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items: orders }, Some(meta)))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    let order = Orders::find_by_id(id)
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
        "Order found",
        OrderWithItems {
            order: Order::from(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;

    let existing = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;
    let previous = existing.status;

    let mut active: OrderActive = existing.into();
    active.status = Set(payload.status);
    let order = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "from": previous, "to": order.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

/// Order count and revenue per calendar month, newest month first.
/// Cancelled orders are left out.
pub async fn monthly_totals(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<MonthlyOrderTotals>> {
    ensure_admin(user)?;
    let items = sqlx::query_as::<_, MonthlyOrderTotal>(
        r#"
        SELECT to_char(date_trunc('month', order_date), 'YYYY-MM') AS month,
               COUNT(*) AS order_count,
               COALESCE(SUM(total_amount), 0) AS revenue
        FROM orders
        WHERE status <> 'Cancelled'
        GROUP BY 1
        ORDER BY 1 DESC
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Monthly totals",
        MonthlyOrderTotals { items },
        Some(Meta::empty()),
    ))
}

/// Accounts newest first, each with its order count.
pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let (total_users,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&state.pool)
        .await?;

    let items = sqlx::query_as::<_, UserWithOrderCount>(
        r#"
        SELECT u.id, u.email, u.first_name, u.last_name, u.birthday, u.role, u.created_at,
               COALESCE(o.order_count, 0) AS order_count
        FROM users u
        LEFT JOIN (
            SELECT user_id, COUNT(*) AS order_count
            FROM orders
            GROUP BY user_id
        ) o ON o.user_id = u.id
        ORDER BY u.created_at DESC, u.id
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let meta = Meta::new(page, limit, total_users);
    Ok(ApiResponse::success(
        "Users",
        UserList { total_users, items },
        Some(meta),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    let threshold = query.threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
    let (page, limit, offset) = query.pagination().normalize();

    let finder = Products::find()
        .filter(ProdCol::StockQuantity.lte(threshold))
        .order_by_asc(ProdCol::StockQuantity)
        .order_by_asc(ProdCol::Name);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Low stock", ProductList { items }, Some(meta)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::admin::NewVariant;
    use rust_decimal::Decimal;

    fn new_product(product_type: ProductType, price: Option<i64>) -> NewProduct {
        NewProduct {
            name: "Vertical Gleam".into(),
            description: None,
            product_type,
            price: price.map(Decimal::from),
            stock_quantity: 5,
            sort_order: 0,
            is_new: false,
            image_urls: vec![],
            variants: vec![],
        }
    }

    fn variant(size: Option<&str>) -> NewVariant {
        NewVariant {
            size: size.map(str::to_string),
            color: None,
            price: Decimal::from(300),
            stock_quantity: 2,
        }
    }

    #[test]
    fn plain_products_need_a_price() {
        assert!(validate_new_product(&new_product(ProductType::Necklaces, None)).is_err());
        assert!(validate_new_product(&new_product(ProductType::Necklaces, Some(200))).is_ok());
    }

    #[test]
    fn variant_sizes_follow_category_rules() {
        let mut p = new_product(ProductType::BodyChains, None);
        p.variants = vec![variant(Some("S/M")), variant(Some("M/L"))];
        assert!(validate_new_product(&p).is_ok());

        p.variants = vec![variant(Some("S/M")), variant(Some("S/M"))];
        assert!(validate_new_product(&p).is_err());

        p.variants = vec![variant(Some("XL"))];
        assert!(validate_new_product(&p).is_err());
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut p = new_product(ProductType::Rings, Some(90));
        p.name = "  ".into();
        assert!(validate_new_product(&p).is_err());
    }
}
