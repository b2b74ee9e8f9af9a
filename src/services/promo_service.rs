use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QuerySelect, Set,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    audit,
    dto::promo::{CreatePublicPromoRequest, PromoDiscount, ValidatePromoRequest},
    entity::{
        promo_codes::{ActiveModel as PromoActive, Column as PromoCol, Entity as PromoCodes, Model as PromoModel},
        promo_redemptions::{ActiveModel as RedemptionActive, Column as RedemptionCol, Entity as PromoRedemptions},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::PromoCode,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const PROMO_CODE_LEN: usize = 6;

/// Codes are matched trimmed and uppercased. Empty input means "no code".
pub fn normalize_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_uppercase();
    (!code.is_empty()).then_some(code)
}

pub fn generate_code() -> String {
    Uuid::new_v4().simple().to_string()[..PROMO_CODE_LEN].to_uppercase()
}

pub fn is_well_formed(code: &str) -> bool {
    code.len() == PROMO_CODE_LEN && code.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Whether `promo` may be applied by `user_id` at `now`. Public codes are
/// usable once per customer; private codes only by their owner.
pub fn is_usable(promo: &PromoModel, user_id: Uuid, now: DateTime<Utc>, already_redeemed: bool) -> bool {
    let owner_ok = promo.is_public || promo.user_id == Some(user_id);
    let not_expired = promo.expiry_date.with_timezone(&Utc) >= now;
    let not_reused = !(promo.is_public && already_redeemed);
    owner_ok && not_expired && not_reused
}

/// Looks up a code the user may apply right now. With `lock` the row is held
/// `FOR UPDATE` until the surrounding transaction ends.
pub async fn find_usable<C: ConnectionTrait>(
    conn: &C,
    code: &str,
    user_id: Uuid,
    now: DateTime<Utc>,
    lock: bool,
) -> AppResult<Option<PromoModel>> {
    let mut finder = PromoCodes::find().filter(
        Condition::all()
            .add(PromoCol::Code.eq(code))
            .add(PromoCol::ExpiryDate.gte(now))
            .add(
                Condition::any()
                    .add(PromoCol::IsPublic.eq(true))
                    .add(PromoCol::UserId.eq(user_id)),
            ),
    );
    if lock {
        finder = finder.lock(LockType::Update);
    }

    let promo = match finder.one(conn).await? {
        Some(p) => p,
        None => return Ok(None),
    };

    let already_redeemed = promo.is_public && has_redeemed(conn, promo.id, user_id).await?;
    Ok(is_usable(&promo, user_id, now, already_redeemed).then_some(promo))
}

async fn has_redeemed<C: ConnectionTrait>(conn: &C, promo_id: Uuid, user_id: Uuid) -> AppResult<bool> {
    let count = PromoRedemptions::find()
        .filter(RedemptionCol::PromoCodeId.eq(promo_id))
        .filter(RedemptionCol::UserId.eq(user_id))
        .count(conn)
        .await?;
    Ok(count > 0)
}

/// Marks a promo as spent: private codes are deleted, public codes remember
/// the customer so they cannot apply it twice.
pub async fn consume<C: ConnectionTrait>(conn: &C, promo: &PromoModel, user_id: Uuid) -> AppResult<()> {
    if promo.is_public {
        RedemptionActive {
            id: Set(Uuid::new_v4()),
            promo_code_id: Set(promo.id),
            user_id: Set(user_id),
            redeemed_at: NotSet,
        }
        .insert(conn)
        .await?;
    } else {
        PromoCodes::delete_by_id(promo.id).exec(conn).await?;
    }
    Ok(())
}

/// Inserts a promo under a fresh random code, retrying on the rare collision.
pub async fn insert_generated<C: ConnectionTrait>(
    conn: &C,
    user_id: Option<Uuid>,
    discount_percent: i32,
    expiry_date: DateTime<Utc>,
) -> AppResult<PromoModel> {
    for _ in 0..5 {
        let code = generate_code();
        if code_exists(conn, &code).await? {
            continue;
        }
        return insert_promo(conn, code, user_id, discount_percent, expiry_date).await;
    }
    Err(AppError::Internal(anyhow::anyhow!("could not generate a unique promo code")))
}

async fn code_exists<C: ConnectionTrait>(conn: &C, code: &str) -> AppResult<bool> {
    let count = PromoCodes::find()
        .filter(PromoCol::Code.eq(code))
        .count(conn)
        .await?;
    Ok(count > 0)
}

async fn insert_promo<C: ConnectionTrait>(
    conn: &C,
    code: String,
    user_id: Option<Uuid>,
    discount_percent: i32,
    expiry_date: DateTime<Utc>,
) -> AppResult<PromoModel> {
    let promo = PromoActive {
        id: Set(Uuid::new_v4()),
        code: Set(code),
        user_id: Set(user_id),
        discount_percent: Set(discount_percent),
        expiry_date: Set(expiry_date.into()),
        is_public: Set(user_id.is_none()),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;
    Ok(promo)
}

pub async fn validate_promo(
    state: &AppState,
    user: &AuthUser,
    payload: ValidatePromoRequest,
) -> AppResult<ApiResponse<PromoDiscount>> {
    let code = normalize_code(&payload.promo_code)
        .ok_or_else(|| AppError::bad_request("Promo code is required"))?;

    let promo = find_usable(&state.orm, &code, user.user_id, Utc::now(), false)
        .await?
        .ok_or_else(|| AppError::not_found("Promo code is invalid or expired"))?;

    Ok(ApiResponse::success(
        "Promo code is valid",
        PromoDiscount {
            code: promo.code,
            discount: promo.discount_percent,
        },
        Some(Meta::empty()),
    ))
}

pub async fn create_public_promo(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePublicPromoRequest,
) -> AppResult<ApiResponse<PromoCode>> {
    ensure_admin(user)?;
    if !(1..=100).contains(&payload.discount_percent) {
        return Err(AppError::bad_request("discount_percent must be between 1 and 100"));
    }
    if payload.expiry_date <= Utc::now() {
        return Err(AppError::bad_request("expiry_date must be in the future"));
    }

    let promo = match payload.code.as_deref().and_then(normalize_code) {
        Some(code) => {
            if !is_well_formed(&code) {
                return Err(AppError::bad_request(
                    "Promo code must be exactly 6 letters or digits",
                ));
            }
            if code_exists(&state.orm, &code).await? {
                return Err(AppError::Conflict(format!("Promo code {code} already exists")));
            }
            insert_promo(&state.orm, code, None, payload.discount_percent, payload.expiry_date).await?
        }
        None => {
            insert_generated(&state.orm, None, payload.discount_percent, payload.expiry_date).await?
        }
    };

    audit::record(
        &state.pool,
        user.user_id,
        "promo_create",
        "promo_codes",
        serde_json::json!({ "promo_id": promo.id, "code": promo.code }),
    )
    .await;

    Ok(ApiResponse::success(
        "Promo code created",
        PromoCode::from(promo),
        Some(Meta::empty()),
    ))
}
