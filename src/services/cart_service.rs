use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, EntityTrait, QueryFilter,
    QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{LockType, OnConflict};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    catalog::{ensure_stock, merged_quantity, resolve_size},
    db::DbPool,
    dto::cart::{AddToCartRequest, CartItemChange, CartItemRequest, CartLineView, CartView},
    entity::{
        cart_items::{ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems, Model as CartItemModel},
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
        product_variants::{Column as VariantCol, Entity as ProductVariants},
        products::{Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::CartItem,
    pricing::{CartLine, LivePrice, cart_total, recalculate_cart_total},
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(FromRow)]
struct CartLineRow {
    cart_id: Uuid,
    cart_item_id: Uuid,
    product_id: Uuid,
    variant_id: Option<Uuid>,
    size: Option<String>,
    quantity: i32,
    name: Option<String>,
    product_type: Option<String>,
    product_price: Option<Decimal>,
    variant_product_id: Option<Uuid>,
    variant_size: Option<String>,
    color: Option<String>,
    variant_price: Option<Decimal>,
    image_url: Option<String>,
}

impl CartLineRow {
    fn unit_price(&self) -> Option<LivePrice> {
        match self.variant_id {
            Some(_) => self
                .variant_price
                .filter(|_| self.variant_product_id == Some(self.product_id))
                .map(LivePrice::new),
            None => self.product_price.map(LivePrice::new),
        }
    }
}

pub async fn get_cart(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let rows = sqlx::query_as::<_, CartLineRow>(
        r#"
        SELECT c.id AS cart_id, ci.id AS cart_item_id, ci.product_id, ci.variant_id,
               ci.size, ci.quantity,
               p.name, p.type AS product_type, p.price AS product_price,
               v.product_id AS variant_product_id, v.size AS variant_size, v.color,
               v.price AS variant_price,
               img.image_url
        FROM carts c
        JOIN cart_items ci ON ci.cart_id = c.id
        LEFT JOIN products p ON p.id = ci.product_id
        LEFT JOIN product_variants v ON v.id = ci.variant_id
        LEFT JOIN LATERAL (
            SELECT pi.image_url
            FROM product_images pi
            WHERE pi.product_id = ci.product_id
            ORDER BY pi.is_primary DESC, pi.created_at
            LIMIT 1
        ) img ON TRUE
        WHERE c.user_id = $1
        ORDER BY ci.created_at, ci.id
        "#,
    )
    .bind(user.user_id)
    .fetch_all(pool)
    .await?;

    let cart_id = match rows.first() {
        Some(row) => row.cart_id,
        None => return Err(AppError::not_found("Cart is empty")),
    };

    let lines: Vec<CartLine> = rows
        .iter()
        .map(|row| CartLine {
            item_id: row.cart_item_id,
            unit_price: row.unit_price(),
            quantity: row.quantity,
        })
        .collect();
    let total = cart_total(&lines);

    let items = rows
        .into_iter()
        .zip(lines.iter())
        .map(|(row, line)| CartLineView {
            cart_item_id: row.cart_item_id,
            product_id: row.product_id,
            variant_id: row.variant_id,
            name: row.name.unwrap_or_default(),
            product_type: row.product_type.unwrap_or_default(),
            image_url: row.image_url,
            size: row.size.or(row.variant_size),
            color: row.color,
            quantity: row.quantity,
            unit_price: line.unit_price.map(|p| p.amount()),
            line_total: line.line_total().amount(),
        })
        .collect();

    Ok(ApiResponse::success(
        "Cart retrieved successfully",
        CartView {
            cart_id,
            total_price: total.amount(),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartView>> {
    if payload.quantity <= 0 {
        return Err(AppError::bad_request("Quantity must be greater than 0"));
    }
    payload.validate()?;

    let txn = state.orm.begin().await?;

    let product = Products::find_by_id(payload.product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;

    let size = resolve_size(product.product_type, &product.name, payload.size.as_deref())?;
    let available = resolve_variant_stock(&txn, &product, payload.variant_id).await?;

    let cart = ensure_cart(&txn, user.user_id).await?;

    let existing = CartItems::find()
        .filter(line_key(cart.id, product.id, payload.variant_id, size.as_deref()))
        .lock(LockType::Update)
        .one(&txn)
        .await?;

    let quantity = merged_quantity(existing.as_ref().map_or(0, |item| item.quantity), payload.quantity)?;
    ensure_stock(product.product_type, available, quantity)?;

    match existing {
        Some(item) => {
            let mut active: CartItemActive = item.into();
            active.quantity = Set(quantity);
            active.update(&txn).await?;
        }
        None => {
            CartItemActive {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                product_id: Set(product.id),
                variant_id: Set(payload.variant_id),
                size: Set(size.clone()),
                quantity: Set(quantity),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?;
        }
    }

    recalculate_cart_total(&txn, cart.id).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "cart_add",
        "cart_items",
        serde_json::json!({
            "product_id": product.id,
            "variant_id": payload.variant_id,
            "size": size,
            "quantity": payload.quantity,
        }),
    )
    .await;

    let mut response = get_cart(&state.pool, user).await?;
    response.message = "Item added to cart".into();
    Ok(response)
}

pub async fn increment_item(
    state: &AppState,
    user: &AuthUser,
    payload: CartItemRequest,
) -> AppResult<ApiResponse<CartItemChange>> {
    let txn = state.orm.begin().await?;
    let item = owned_item(&txn, user, payload.cart_item_id).await?;

    let product = Products::find_by_id(item.product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;
    let available = resolve_variant_stock(&txn, &product, item.variant_id).await?;

    let quantity = merged_quantity(item.quantity, 1)?;
    ensure_stock(product.product_type, available, quantity)?;

    let cart_id = item.cart_id;
    let mut active: CartItemActive = item.into();
    active.quantity = Set(quantity);
    let item = active.update(&txn).await?;

    let total = recalculate_cart_total(&txn, cart_id).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "cart_increment",
        "cart_items",
        serde_json::json!({ "cart_item_id": item.id, "quantity": item.quantity }),
    )
    .await;

    Ok(ApiResponse::success(
        "Quantity increased",
        CartItemChange {
            item: Some(CartItem::from(item)),
            removed: false,
            cart_total: total.amount(),
        },
        Some(Meta::empty()),
    ))
}

/// Lowers the quantity by one; a line at quantity 1 is removed instead.
pub async fn decrement_item(
    state: &AppState,
    user: &AuthUser,
    payload: CartItemRequest,
) -> AppResult<ApiResponse<CartItemChange>> {
    let txn = state.orm.begin().await?;
    let item = owned_item(&txn, user, payload.cart_item_id).await?;
    let cart_id = item.cart_id;
    let item_id = item.id;

    let remaining = if item.quantity <= 1 {
        CartItems::delete_by_id(item.id).exec(&txn).await?;
        None
    } else {
        let quantity = item.quantity - 1;
        let mut active: CartItemActive = item.into();
        active.quantity = Set(quantity);
        Some(active.update(&txn).await?)
    };

    let total = recalculate_cart_total(&txn, cart_id).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "cart_decrement",
        "cart_items",
        serde_json::json!({
            "cart_item_id": item_id,
            "quantity": remaining.as_ref().map_or(0, |i| i.quantity),
        }),
    )
    .await;

    let message = if remaining.is_some() {
        "Quantity decreased"
    } else {
        "Item removed from cart"
    };
    Ok(ApiResponse::success(
        message,
        CartItemChange {
            removed: remaining.is_none(),
            item: remaining.map(CartItem::from),
            cart_total: total.amount(),
        },
        Some(Meta::empty()),
    ))
}

pub async fn delete_item(
    state: &AppState,
    user: &AuthUser,
    payload: CartItemRequest,
) -> AppResult<ApiResponse<CartItemChange>> {
    let txn = state.orm.begin().await?;
    let item = owned_item(&txn, user, payload.cart_item_id).await?;

    CartItems::delete_by_id(item.id).exec(&txn).await?;
    let total = recalculate_cart_total(&txn, item.cart_id).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "cart_remove",
        "cart_items",
        serde_json::json!({ "cart_item_id": item.id, "product_id": item.product_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Item removed from cart",
        CartItemChange {
            item: None,
            removed: true,
            cart_total: total.amount(),
        },
        Some(Meta::empty()),
    ))
}

/// Returns the user's cart, creating an empty one on first use. The cart row
/// stays locked until the transaction ends.
async fn ensure_cart(txn: &DatabaseTransaction, user_id: Uuid) -> AppResult<CartModel> {
    Carts::insert(CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        total_price: Set(Decimal::ZERO),
        updated_at: Set(Utc::now().into()),
    })
    .on_conflict(OnConflict::column(CartCol::UserId).do_nothing().to_owned())
    .exec_without_returning(txn)
    .await?;

    Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("cart for user {user_id} vanished")))
}

/// Loads a cart item for mutation, checking that it sits in the caller's cart.
async fn owned_item(
    txn: &DatabaseTransaction,
    user: &AuthUser,
    cart_item_id: Uuid,
) -> AppResult<CartItemModel> {
    let item = CartItems::find_by_id(cart_item_id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::not_found("Item not found"))?;

    let cart = Carts::find_by_id(item.cart_id)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::not_found("Item not found"))?;
    if cart.user_id != user.user_id {
        return Err(AppError::Forbidden);
    }
    Ok(item)
}

/// Stock available for the requested line: the variant's when the product
/// has variants, otherwise the product's own.
async fn resolve_variant_stock(
    txn: &DatabaseTransaction,
    product: &ProductModel,
    variant_id: Option<Uuid>,
) -> AppResult<i32> {
    let variants = ProductVariants::find()
        .filter(VariantCol::ProductId.eq(product.id))
        .all(txn)
        .await?;

    match (variants.is_empty(), variant_id) {
        (true, None) => Ok(product.stock_quantity),
        (true, Some(_)) => Err(AppError::bad_request("This product has no variants")),
        (false, None) => Err(AppError::bad_request("Variant is required for this product")),
        (false, Some(variant_id)) => variants
            .iter()
            .find(|v| v.id == variant_id)
            .map(|v| v.stock_quantity)
            .ok_or_else(|| AppError::bad_request("Variant does not belong to this product")),
    }
}

/// Lines merge on (cart, product, variant, size); absent parts match NULL.
fn line_key(cart_id: Uuid, product_id: Uuid, variant_id: Option<Uuid>, size: Option<&str>) -> Condition {
    let condition = Condition::all()
        .add(CartItemCol::CartId.eq(cart_id))
        .add(CartItemCol::ProductId.eq(product_id));
    let condition = match variant_id {
        Some(id) => condition.add(CartItemCol::VariantId.eq(id)),
        None => condition.add(CartItemCol::VariantId.is_null()),
    };
    match size {
        Some(size) => condition.add(CartItemCol::Size.eq(size)),
        None => condition.add(CartItemCol::Size.is_null()),
    }
}
