//! Category rules for the jewelry catalog: which products need a size and
//! which categories may be sold beyond their recorded stock.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ProductType {
    #[sea_orm(string_value = "Earrings")]
    Earrings,
    #[sea_orm(string_value = "Necklaces")]
    Necklaces,
    #[sea_orm(string_value = "Bracelets")]
    Bracelets,
    #[sea_orm(string_value = "Hand Chains")]
    #[serde(rename = "Hand Chains")]
    HandChains,
    #[sea_orm(string_value = "Back Chains")]
    #[serde(rename = "Back Chains")]
    BackChains,
    #[sea_orm(string_value = "Body Chains")]
    #[serde(rename = "Body Chains")]
    BodyChains,
    #[sea_orm(string_value = "Waist Chains")]
    #[serde(rename = "Waist Chains")]
    WaistChains,
    #[sea_orm(string_value = "Sets")]
    Sets,
    #[sea_orm(string_value = "Rings")]
    Rings,
    #[sea_orm(string_value = "Bags")]
    Bags,
}

impl ProductType {
    pub fn label(&self) -> &'static str {
        match self {
            ProductType::Earrings => "Earrings",
            ProductType::Necklaces => "Necklaces",
            ProductType::Bracelets => "Bracelets",
            ProductType::HandChains => "Hand Chains",
            ProductType::BackChains => "Back Chains",
            ProductType::BodyChains => "Body Chains",
            ProductType::WaistChains => "Waist Chains",
            ProductType::Sets => "Sets",
            ProductType::Rings => "Rings",
            ProductType::Bags => "Bags",
        }
    }
}

pub const ALLOWED_SIZES: [&str; 2] = ["S/M", "M/L"];

/// Width of the `size` columns on cart and order lines.
pub const MAX_SIZE_LEN: usize = 16;

/// Upper bound for a single cart line, exempt categories included.
pub const MAX_LINE_QUANTITY: i32 = 1000;

/// Back chains that are cut to fit and therefore sold in sizes.
const SIZED_BACK_CHAINS: [&str; 2] = ["The OG", "Vertical Gleam"];

pub fn requires_size(product_type: ProductType, name: &str) -> bool {
    match product_type {
        ProductType::WaistChains | ProductType::BodyChains => true,
        ProductType::BackChains => SIZED_BACK_CHAINS.contains(&name),
        _ => false,
    }
}

/// Waist chains are made to order and may be sold past recorded stock.
pub fn is_stock_exempt(product_type: ProductType) -> bool {
    matches!(product_type, ProductType::WaistChains)
}

/// Normalises the size carried by a cart line. Sized products must carry one
/// of [`ALLOWED_SIZES`]; other products keep whatever size the client sent.
pub fn resolve_size(
    product_type: ProductType,
    name: &str,
    size: Option<&str>,
) -> AppResult<Option<String>> {
    let size = size.map(str::trim).filter(|s| !s.is_empty());
    if size.is_some_and(|s| s.chars().count() > MAX_SIZE_LEN) {
        return Err(AppError::BadRequest(format!(
            "Size must be at most {MAX_SIZE_LEN} characters"
        )));
    }
    if !requires_size(product_type, name) {
        return Ok(size.map(str::to_string));
    }

    match size {
        None => Err(AppError::BadRequest(format!(
            "Size is required for {}",
            product_type.label()
        ))),
        Some(size) if ALLOWED_SIZES.contains(&size) => Ok(Some(size.to_string())),
        Some(_) => Err(AppError::bad_request("Size must be 'S/M' or 'M/L'")),
    }
}

/// Quantity of a line after adding `added` to `current`, capped at
/// [`MAX_LINE_QUANTITY`].
pub fn merged_quantity(current: i32, added: i32) -> AppResult<i32> {
    current
        .checked_add(added)
        .filter(|q| (1..=MAX_LINE_QUANTITY).contains(q))
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Quantity per item must be between 1 and {MAX_LINE_QUANTITY}"
            ))
        })
}

/// Rejects a line quantity that exceeds `available` unless the category is exempt.
pub fn ensure_stock(product_type: ProductType, available: i32, requested: i32) -> AppResult<()> {
    if is_stock_exempt(product_type) || requested <= available {
        return Ok(());
    }
    Err(AppError::bad_request("Not enough stock available"))
}
