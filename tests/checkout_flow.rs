use chrono::{Duration, Utc};
use jewelry_shop_api::{
    catalog::ProductType,
    db::{create_orm_conn, run_migrations},
    dto::{
        cart::{AddToCartRequest, CartItemRequest},
        orders::CheckoutRequest,
        promo::ValidatePromoRequest,
    },
    entity::{
        carts::{Column as CartCol, Entity as Carts},
        orders::{Column as OrderCol, Entity as Orders},
        product_variants::{ActiveModel as VariantActive, Entity as ProductVariants, Model as VariantModel},
        products::{ActiveModel as ProductActive, Entity as Products, Model as ProductModel},
        promo_codes::{ActiveModel as PromoActive, Entity as PromoCodes, Model as PromoModel},
        users::ActiveModel as UserActive,
    },
    error::AppError,
    middleware::auth::{ADMIN_ROLE, AuthUser, USER_ROLE},
    notify::Notifiers,
    routes::params::Pagination,
    services::{admin_service, cart_service, order_service, promo_service},
    state::AppState,
};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use jewelry_shop_api::entity::cart_items::{Column as CartItemCol, Entity as CartItems};
use tokio::sync::OnceCell;
use uuid::Uuid;

static MIGRATED: OnceCell<()> = OnceCell::const_new();

// Integration flows run against Postgres and are skipped when no database is configured.
async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run checkout flow tests."
            );
            return Ok(None);
        }
    };

    let orm = create_orm_conn(&database_url).await?;
    MIGRATED
        .get_or_try_init(|| async { run_migrations(&orm).await.map(|_| ()) })
        .await?;
    Ok(Some(AppState::new(orm, Notifiers::default())))
}

async fn create_user(state: &AppState) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(format!("{}@example.com", Uuid::new_v4())),
        password_hash: Set("dummy".into()),
        first_name: Set(Some("Nour".into())),
        last_name: Set(Some("Adel".into())),
        birthday: Set(None),
        role: Set(USER_ROLE.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

async fn create_product(
    state: &AppState,
    product_type: ProductType,
    price: Option<i64>,
    stock: i32,
) -> anyhow::Result<ProductModel> {
    Ok(ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("Test {}", Uuid::new_v4())),
        description: Set(None),
        product_type: Set(product_type),
        price: Set(price.map(Decimal::from)),
        stock_quantity: Set(stock),
        sort_order: Set(0),
        is_new: Set(false),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?)
}

async fn create_variant(
    state: &AppState,
    product_id: Uuid,
    size: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<VariantModel> {
    Ok(VariantActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        size: Set(Some(size.into())),
        color: Set(None),
        price: Set(Decimal::from(price)),
        stock_quantity: Set(stock),
    }
    .insert(&state.orm)
    .await?)
}

async fn create_promo(
    state: &AppState,
    owner: Option<Uuid>,
    discount_percent: i32,
    expires_in: Duration,
) -> anyhow::Result<PromoModel> {
    Ok(PromoActive {
        id: Set(Uuid::new_v4()),
        code: Set(promo_service::generate_code()),
        user_id: Set(owner),
        discount_percent: Set(discount_percent),
        expiry_date: Set((Utc::now() + expires_in).into()),
        is_public: Set(owner.is_none()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?)
}

fn add(product_id: Uuid, variant_id: Option<Uuid>, quantity: i32, size: Option<&str>) -> AddToCartRequest {
    AddToCartRequest {
        product_id,
        variant_id,
        quantity,
        size: size.map(str::to_string),
    }
}

fn checkout_request(promo_code: Option<&str>) -> CheckoutRequest {
    CheckoutRequest {
        address: "12 Nile Street".into(),
        apartment_no: "4B".into(),
        city: "Cairo".into(),
        governorate: 1,
        phone_number: "+201012345678".into(),
        promo_code: promo_code.map(str::to_string),
    }
}

async fn cart_total(state: &AppState, user: &AuthUser) -> anyhow::Result<Decimal> {
    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("cart missing"))?;
    Ok(cart.total_price)
}

async fn order_count(state: &AppState, user: &AuthUser) -> anyhow::Result<u64> {
    Ok(Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .count(&state.orm)
        .await?)
}

#[tokio::test]
async fn product_price_times_quantity_is_cached_on_the_cart() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state).await?;
    let product = create_product(&state, ProductType::Necklaces, Some(250), 10).await?;

    cart_service::add_to_cart(&state, &user, add(product.id, None, 2, None)).await?;
    assert_eq!(cart_total(&state, &user).await?, Decimal::from(500));

    let first = cart_service::get_cart(&state.pool, &user).await?;
    let second = cart_service::get_cart(&state.pool, &user).await?;
    let (first, second) = (first.data.unwrap(), second.data.unwrap());
    assert_eq!(first.total_price, Decimal::from(500));
    assert_eq!(first.total_price, second.total_price);
    assert_eq!(first.items.len(), 1);
    assert_eq!(first.items[0].quantity, 2);
    Ok(())
}

#[tokio::test]
async fn variant_lines_merge_and_increment() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state).await?;
    let product = create_product(&state, ProductType::Rings, None, 0).await?;
    let variant = create_variant(&state, product.id, "7", 210, 10).await?;

    cart_service::add_to_cart(&state, &user, add(product.id, Some(variant.id), 2, None)).await?;
    let view = cart_service::add_to_cart(&state, &user, add(product.id, Some(variant.id), 1, None))
        .await?
        .data
        .unwrap();
    assert_eq!(view.items.len(), 1, "same variant merges into one line");
    assert_eq!(view.total_price, Decimal::from(630));

    let change = cart_service::increment_item(
        &state,
        &user,
        CartItemRequest {
            cart_item_id: view.items[0].cart_item_id,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(change.cart_total, Decimal::from(840));
    assert_eq!(cart_total(&state, &user).await?, Decimal::from(840));
    Ok(())
}

#[tokio::test]
async fn decrement_at_one_removes_the_line() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state).await?;
    let kept = create_product(&state, ProductType::Earrings, Some(150), 10).await?;
    let dropped = create_product(&state, ProductType::Bracelets, Some(90), 10).await?;

    cart_service::add_to_cart(&state, &user, add(kept.id, None, 1, None)).await?;
    let view = cart_service::add_to_cart(&state, &user, add(dropped.id, None, 1, None))
        .await?
        .data
        .unwrap();
    assert_eq!(view.total_price, Decimal::from(240));
    let line = view
        .items
        .iter()
        .find(|i| i.product_id == dropped.id)
        .unwrap();

    let change = cart_service::decrement_item(
        &state,
        &user,
        CartItemRequest {
            cart_item_id: line.cart_item_id,
        },
    )
    .await?
    .data
    .unwrap();
    assert!(change.removed);
    assert!(change.item.is_none());
    assert_eq!(change.cart_total, Decimal::from(150));
    Ok(())
}

#[tokio::test]
async fn other_users_cannot_touch_an_item() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let owner = create_user(&state).await?;
    let intruder = create_user(&state).await?;
    let product = create_product(&state, ProductType::Rings, Some(120), 10).await?;

    let view = cart_service::add_to_cart(&state, &owner, add(product.id, None, 1, None))
        .await?
        .data
        .unwrap();
    let request = CartItemRequest {
        cart_item_id: view.items[0].cart_item_id,
    };
    let err = cart_service::delete_item(&state, &intruder, request).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let missing = CartItemRequest {
        cart_item_id: Uuid::new_v4(),
    };
    let err = cart_service::increment_item(&state, &owner, missing).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn stock_boundary_and_exempt_categories() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state).await?;
    let necklace = create_product(&state, ProductType::Necklaces, Some(100), 5).await?;

    cart_service::add_to_cart(&state, &user, add(necklace.id, None, 5, None)).await?;
    let err = cart_service::add_to_cart(&state, &user, add(necklace.id, None, 1, None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let waist = create_product(&state, ProductType::WaistChains, None, 0).await?;
    let variant = create_variant(&state, waist.id, "S/M", 280, 0).await?;
    let err = cart_service::add_to_cart(&state, &user, add(waist.id, Some(variant.id), 1, None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "size is required");
    cart_service::add_to_cart(&state, &user, add(waist.id, Some(variant.id), 3, Some("S/M"))).await?;

    order_service::checkout(&state, &user, checkout_request(None)).await?;
    let variant = ProductVariants::find_by_id(variant.id).one(&state.orm).await?.unwrap();
    assert_eq!(variant.stock_quantity, -3, "made-to-order stock may go negative");
    let necklace = Products::find_by_id(necklace.id).one(&state.orm).await?.unwrap();
    assert_eq!(necklace.stock_quantity, 0);
    Ok(())
}

#[tokio::test]
async fn checkout_applies_discount_and_shipping() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state).await?;
    let product = create_product(&state, ProductType::Necklaces, Some(250), 10).await?;
    let promo = create_promo(&state, Some(user.user_id), 20, Duration::days(1)).await?;

    let discount = promo_service::validate_promo(
        &state,
        &user,
        ValidatePromoRequest {
            promo_code: promo.code.to_lowercase(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(discount.discount, 20);

    cart_service::add_to_cart(&state, &user, add(product.id, None, 2, None)).await?;
    let placed = order_service::checkout(&state, &user, checkout_request(Some(&promo.code)))
        .await?
        .data
        .unwrap();

    assert_eq!(placed.order.subtotal, Decimal::from(500));
    assert_eq!(placed.order.discount_percent, 20);
    assert_eq!(placed.order.shipping_cost, Decimal::from(80));
    assert_eq!(placed.order.total_amount, Decimal::from(480));
    assert_eq!(placed.order.governorate, "Cairo");
    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].price, Decimal::from(250));

    assert_eq!(cart_total(&state, &user).await?, Decimal::ZERO);
    let err = cart_service::get_cart(&state.pool, &user).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let product = Products::find_by_id(product.id).one(&state.orm).await?.unwrap();
    assert_eq!(product.stock_quantity, 8);

    // the private code is spent
    assert!(PromoCodes::find_by_id(promo.id).one(&state.orm).await?.is_none());
    cart_service::add_to_cart(&state, &user, add(product.id, None, 1, None)).await?;
    let err = order_service::checkout(&state, &user, checkout_request(Some(&promo.code)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(order_count(&state, &user).await?, 1);

    let history = order_service::list_user_orders(&state, &user).await?.data.unwrap();
    assert_eq!(history.items.len(), 1);
    assert_eq!(history.items[0].order_number, 1);
    Ok(())
}

#[tokio::test]
async fn invalid_promo_leaves_cart_untouched() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state).await?;
    let product = create_product(&state, ProductType::Earrings, Some(150), 10).await?;
    let expired = create_promo(&state, Some(user.user_id), 15, Duration::days(-1)).await?;

    cart_service::add_to_cart(&state, &user, add(product.id, None, 2, None)).await?;

    for code in [expired.code.as_str(), "NOPE00"] {
        let err = order_service::checkout(&state, &user, checkout_request(Some(code)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)), "{code}");
    }

    assert_eq!(order_count(&state, &user).await?, 0);
    assert_eq!(cart_total(&state, &user).await?, Decimal::from(300));
    let view = cart_service::get_cart(&state.pool, &user).await?.data.unwrap();
    assert_eq!(view.items[0].quantity, 2);
    let product = Products::find_by_id(product.id).one(&state.orm).await?.unwrap();
    assert_eq!(product.stock_quantity, 10);
    Ok(())
}

#[tokio::test]
async fn insufficient_stock_at_checkout_writes_nothing() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state).await?;
    let product = create_product(&state, ProductType::Bracelets, Some(100), 3).await?;

    cart_service::add_to_cart(&state, &user, add(product.id, None, 3, None)).await?;
    Products::update(ProductActive {
        id: Set(product.id),
        stock_quantity: Set(1),
        ..Default::default()
    })
    .exec(&state.orm)
    .await?;

    let err = order_service::checkout(&state, &user, checkout_request(None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(order_count(&state, &user).await?, 0);
    assert_eq!(cart_total(&state, &user).await?, Decimal::from(300));
    Ok(())
}

#[tokio::test]
async fn public_promo_is_once_per_customer() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let first = create_user(&state).await?;
    let second = create_user(&state).await?;
    let product = create_product(&state, ProductType::Rings, Some(100), 50).await?;
    let promo = create_promo(&state, None, 10, Duration::days(7)).await?;

    for user in [&first, &second] {
        cart_service::add_to_cart(&state, user, add(product.id, None, 1, None)).await?;
        let placed = order_service::checkout(&state, user, checkout_request(Some(&promo.code)))
            .await?
            .data
            .unwrap();
        assert_eq!(placed.order.total_amount, Decimal::from(170));
    }

    cart_service::add_to_cart(&state, &first, add(product.id, None, 1, None)).await?;
    let err = order_service::checkout(&state, &first, checkout_request(Some(&promo.code)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert!(PromoCodes::find_by_id(promo.id).one(&state.orm).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn empty_cart_and_unknown_governorate_are_rejected() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state).await?;
    let err = order_service::checkout(&state, &user, checkout_request(None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref m) if m == "Cart is empty."));

    let product = create_product(&state, ProductType::Rings, Some(100), 5).await?;
    cart_service::add_to_cart(&state, &user, add(product.id, None, 1, None)).await?;
    let mut request = checkout_request(None);
    request.governorate = 99;
    let err = order_service::checkout(&state, &user, request).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref m) if m == "Invalid governorate"));
    Ok(())
}

#[tokio::test]
async fn variant_rules_on_add() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state).await?;
    let ring = create_product(&state, ProductType::Rings, None, 0).await?;
    let variant = create_variant(&state, ring.id, "7", 210, 10).await?;
    let other = create_product(&state, ProductType::Rings, None, 0).await?;
    let foreign = create_variant(&state, other.id, "8", 220, 10).await?;
    let plain = create_product(&state, ProductType::Earrings, Some(150), 10).await?;

    let cases = [
        (add(ring.id, None, 1, None), "Variant is required for this product"),
        (add(plain.id, Some(variant.id), 1, None), "This product has no variants"),
        (add(ring.id, Some(foreign.id), 1, None), "Variant does not belong to this product"),
    ];
    for (request, expected) in cases {
        let err = cart_service::add_to_cart(&state, &user, request).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == expected), "{expected}");
    }

    let err = cart_service::get_cart(&state.pool, &user).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "rejected adds leave the cart empty");
    Ok(())
}

#[tokio::test]
async fn non_positive_quantity_is_rejected() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state).await?;
    let product = create_product(&state, ProductType::Necklaces, Some(250), 10).await?;

    for quantity in [0, -3] {
        let err = cart_service::add_to_cart(&state, &user, add(product.id, None, quantity, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)), "{quantity}");
    }
    Ok(())
}

#[tokio::test]
async fn exempt_line_quantity_is_capped() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state).await?;
    let waist = create_product(&state, ProductType::WaistChains, None, 0).await?;
    let variant = create_variant(&state, waist.id, "S/M", 1, 0).await?;

    let err = cart_service::add_to_cart(&state, &user, add(waist.id, Some(variant.id), i32::MAX, Some("S/M")))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let view = cart_service::add_to_cart(&state, &user, add(waist.id, Some(variant.id), 1000, Some("S/M")))
        .await?
        .data
        .unwrap();
    assert_eq!(view.items[0].quantity, 1000);

    let err = cart_service::add_to_cart(&state, &user, add(waist.id, Some(variant.id), 1, Some("S/M")))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let request = CartItemRequest {
        cart_item_id: view.items[0].cart_item_id,
    };
    let err = cart_service::increment_item(&state, &user, request).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(cart_total(&state, &user).await?, Decimal::from(1000));
    Ok(())
}

#[tokio::test]
async fn overlong_size_is_a_bad_request() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state).await?;
    let ring = create_product(&state, ProductType::Rings, Some(120), 10).await?;

    let err = cart_service::add_to_cart(&state, &user, add(ring.id, None, 1, Some("adjustable-open-band")))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let view = cart_service::add_to_cart(&state, &user, add(ring.id, None, 1, Some(" adjustable ")))
        .await?
        .data
        .unwrap();
    assert_eq!(view.items[0].size.as_deref(), Some("adjustable"));
    Ok(())
}

#[tokio::test]
async fn delete_item_recomputes_the_total() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state).await?;
    let kept = create_product(&state, ProductType::Earrings, Some(150), 10).await?;
    let removed = create_product(&state, ProductType::Bracelets, Some(90), 10).await?;

    cart_service::add_to_cart(&state, &user, add(kept.id, None, 2, None)).await?;
    let view = cart_service::add_to_cart(&state, &user, add(removed.id, None, 3, None))
        .await?
        .data
        .unwrap();
    assert_eq!(view.total_price, Decimal::from(570));
    let line = view
        .items
        .iter()
        .find(|i| i.product_id == removed.id)
        .unwrap();

    let change = cart_service::delete_item(
        &state,
        &user,
        CartItemRequest {
            cart_item_id: line.cart_item_id,
        },
    )
    .await?
    .data
    .unwrap();
    assert!(change.removed);
    assert_eq!(change.cart_total, Decimal::from(300));
    assert_eq!(cart_total(&state, &user).await?, Decimal::from(300));
    assert!(CartItems::find()
        .filter(CartItemCol::Id.eq(line.cart_item_id))
        .one(&state.orm)
        .await?
        .is_none());
    Ok(())
}

#[tokio::test]
async fn admin_lists_users_with_order_counts() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let buyer = create_user(&state).await?;
    let browser = create_user(&state).await?;
    let admin = AuthUser {
        user_id: buyer.user_id,
        role: ADMIN_ROLE.into(),
    };
    let product = create_product(&state, ProductType::Rings, Some(100), 10).await?;

    for _ in 0..2 {
        cart_service::add_to_cart(&state, &buyer, add(product.id, None, 1, None)).await?;
        order_service::checkout(&state, &buyer, checkout_request(None)).await?;
    }

    let err = admin_service::list_users(&state, &browser, Pagination::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let pagination = Pagination {
        page: Some(1),
        per_page: Some(100),
    };
    let list = admin_service::list_users(&state, &admin, pagination).await?.data.unwrap();
    assert!(list.total_users >= 2);
    let count_for = |id: Uuid| list.items.iter().find(|u| u.id == id).map(|u| u.order_count);
    assert_eq!(count_for(buyer.user_id), Some(2));
    assert_eq!(count_for(browser.user_id), Some(0));
    Ok(())
}
