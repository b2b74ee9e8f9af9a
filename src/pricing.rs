//! Cart and order arithmetic.
//!
//! Two kinds of money flow through the shop and they are kept apart by type:
//! [`LivePrice`] is derived from the current catalog and may be recomputed at
//! any time (cart totals, current unit prices), while [`SnapshotPrice`] is the
//! value frozen into an order at checkout and is never derived again.

use std::{collections::HashMap, iter::Sum};

use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems, Model as CartItemModel},
        carts::{ActiveModel as CartActive, Entity as Carts},
        product_variants::{Column as VariantCol, Entity as ProductVariants, Model as VariantModel},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
};

/// Currency amounts are kept to two decimal places.
pub const CURRENCY_SCALE: u32 = 2;

pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct LivePrice(Decimal);

impl LivePrice {
    pub fn new(amount: Decimal) -> Self {
        Self(round_currency(amount))
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn times(&self, quantity: i32) -> LivePrice {
        LivePrice::new(self.0 * Decimal::from(quantity))
    }

    /// Freezes the current value for storage on an order.
    pub fn snapshot(&self) -> SnapshotPrice {
        SnapshotPrice(self.0)
    }
}

impl Sum for LivePrice {
    fn sum<I: Iterator<Item = LivePrice>>(iter: I) -> Self {
        LivePrice::new(iter.map(|p| p.0).sum())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SnapshotPrice(Decimal);

impl SnapshotPrice {
    pub fn amount(&self) -> Decimal {
        self.0
    }
}

/// One cart line as seen by the pricing engine. `unit_price` is `None` when
/// the referenced product or variant no longer resolves to a price.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub item_id: Uuid,
    pub unit_price: Option<LivePrice>,
    pub quantity: i32,
}

impl CartLine {
    pub fn line_total(&self) -> LivePrice {
        self.unit_price
            .map(|p| p.times(self.quantity))
            .unwrap_or_else(LivePrice::zero)
    }
}

/// Σ unit price × quantity. Lines without a price contribute zero.
pub fn cart_total(lines: &[CartLine]) -> LivePrice {
    lines
        .iter()
        .map(|line| {
            if line.unit_price.is_none() {
                tracing::warn!(
                    cart_item_id = %line.item_id,
                    "cart line references a missing product or variant; counting it as zero"
                );
            }
            line.line_total()
        })
        .sum()
}

/// Catalog rows needed to price a set of cart items.
#[derive(Debug, Default)]
pub struct CartPricing {
    pub products: HashMap<Uuid, ProductModel>,
    pub variants: HashMap<Uuid, VariantModel>,
}

impl CartPricing {
    pub fn new(products: Vec<ProductModel>, variants: Vec<VariantModel>) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.id, p)).collect(),
            variants: variants.into_iter().map(|v| (v.id, v)).collect(),
        }
    }

    pub async fn load<C: ConnectionTrait>(conn: &C, items: &[CartItemModel]) -> AppResult<Self> {
        let (product_ids, variant_ids) = referenced_ids(items);
        let products = if product_ids.is_empty() {
            Vec::new()
        } else {
            Products::find()
                .filter(ProdCol::Id.is_in(product_ids))
                .all(conn)
                .await?
        };
        let variants = if variant_ids.is_empty() {
            Vec::new()
        } else {
            ProductVariants::find()
                .filter(VariantCol::Id.is_in(variant_ids))
                .all(conn)
                .await?
        };
        Ok(Self::new(products, variants))
    }

    /// Variant price when the item names a variant, otherwise the product price.
    pub fn unit_price(&self, item: &CartItemModel) -> Option<LivePrice> {
        match item.variant_id {
            Some(variant_id) => self
                .variants
                .get(&variant_id)
                .filter(|v| v.product_id == item.product_id)
                .map(|v| LivePrice::new(v.price)),
            None => self
                .products
                .get(&item.product_id)
                .and_then(|p| p.price)
                .map(LivePrice::new),
        }
    }

    pub fn lines(&self, items: &[CartItemModel]) -> Vec<CartLine> {
        items
            .iter()
            .map(|item| CartLine {
                item_id: item.id,
                unit_price: self.unit_price(item),
                quantity: item.quantity,
            })
            .collect()
    }
}

/// Distinct product ids and variant ids referenced by `items`.
pub fn referenced_ids(items: &[CartItemModel]) -> (Vec<Uuid>, Vec<Uuid>) {
    let mut product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    let mut variant_ids: Vec<Uuid> = items.iter().filter_map(|i| i.variant_id).collect();
    product_ids.sort();
    product_ids.dedup();
    variant_ids.sort();
    variant_ids.dedup();
    (product_ids, variant_ids)
}

/// Recomputes and persists `carts.total_price` from the cart's current lines.
/// Runs on the caller's connection so it shares the mutation's transaction.
pub async fn recalculate_cart_total<C: ConnectionTrait>(
    conn: &C,
    cart_id: Uuid,
) -> AppResult<LivePrice> {
    let cart = Carts::find_by_id(cart_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Cart not found"))?;

    let items = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart_id))
        .all(conn)
        .await?;
    let pricing = CartPricing::load(conn, &items).await?;
    let total = cart_total(&pricing.lines(&items));

    let mut active: CartActive = cart.into();
    active.total_price = Set(total.amount());
    active.updated_at = Set(Utc::now().into());
    active.update(conn).await?;

    tracing::debug!(%cart_id, total = %total.amount(), "cart total recalculated");
    Ok(total)
}

/// Financial breakdown of an order at the moment it is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: SnapshotPrice,
    pub discount_percent: i32,
    pub discount_amount: SnapshotPrice,
    pub shipping_cost: SnapshotPrice,
    pub total_amount: SnapshotPrice,
}

impl OrderTotals {
    /// `total = subtotal − subtotal × discount / 100 + shipping`, each rounded to cents.
    pub fn compute(subtotal: LivePrice, discount_percent: i32, shipping_cost: Decimal) -> Self {
        let subtotal = subtotal.amount();
        let discount_amount =
            round_currency(subtotal * Decimal::from(discount_percent) / Decimal::ONE_HUNDRED);
        let shipping_cost = round_currency(shipping_cost);
        let total_amount = round_currency(subtotal - discount_amount + shipping_cost);
        Self {
            subtotal: SnapshotPrice(subtotal),
            discount_percent,
            discount_amount: SnapshotPrice(discount_amount),
            shipping_cost: SnapshotPrice(shipping_cost),
            total_amount: SnapshotPrice(total_amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProductType;

    fn product(price: Option<i64>) -> ProductModel {
        ProductModel {
            id: Uuid::new_v4(),
            name: "Marly".into(),
            description: None,
            product_type: ProductType::Necklaces,
            price: price.map(Decimal::from),
            stock_quantity: 10,
            sort_order: 0,
            is_new: false,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn variant(product_id: Uuid, price: i64) -> VariantModel {
        VariantModel {
            id: Uuid::new_v4(),
            product_id,
            size: Some("S/M".into()),
            color: None,
            price: Decimal::from(price),
            stock_quantity: 10,
        }
    }

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
    fn product_price_times_quantity() {
        let p = product(Some(250));
        let items = vec![item(p.id, None, 2)];
        let pricing = CartPricing::new(vec![p], vec![]);
        assert_eq!(cart_total(&pricing.lines(&items)).amount(), Decimal::from(500));
    }

    #[test]
    fn variant_price_overrides_product_price() {
        let p = product(Some(999));
        let v = variant(p.id, 210);
        let mut items = vec![item(p.id, Some(v.id), 3)];
        let pricing = CartPricing::new(vec![p], vec![v]);
        assert_eq!(cart_total(&pricing.lines(&items)).amount(), Decimal::from(630));

        items[0].quantity += 1;
        assert_eq!(cart_total(&pricing.lines(&items)).amount(), Decimal::from(840));
    }

    #[test]
    fn missing_catalog_rows_count_as_zero() {
        let p = product(Some(100));
        let items = vec![
            item(p.id, None, 1),
            item(Uuid::new_v4(), None, 4),
            item(p.id, Some(Uuid::new_v4()), 2),
        ];
        let pricing = CartPricing::new(vec![p], vec![]);
        let lines = pricing.lines(&items);
        assert!(lines[1].unit_price.is_none());
        assert!(lines[2].unit_price.is_none());
        assert_eq!(cart_total(&lines).amount(), Decimal::from(100));
    }

    #[test]
    fn variant_of_another_product_does_not_price_the_line() {
        let p = product(Some(100));
        let other = variant(Uuid::new_v4(), 50);
        let items = vec![item(p.id, Some(other.id), 1)];
        let pricing = CartPricing::new(vec![p], vec![other]);
        assert!(pricing.unit_price(&items[0]).is_none());
    }

    #[test]
    fn decimal_sum_has_no_float_drift() {
        let p = product(None);
        let mut priced = p.clone();
        priced.price = Some(Decimal::new(10, 2));
        let items: Vec<_> = (0..1000).map(|_| item(priced.id, None, 1)).collect();
        let pricing = CartPricing::new(vec![priced], vec![]);
        assert_eq!(cart_total(&pricing.lines(&items)).amount(), Decimal::from(100));
    }

    #[test]
    fn empty_cart_totals_zero() {
        assert_eq!(cart_total(&[]), LivePrice::zero());
    }

    #[test]
    fn order_totals_apply_discount_then_shipping() {
        let totals = OrderTotals::compute(LivePrice::new(Decimal::from(500)), 20, Decimal::from(80));
        assert_eq!(totals.discount_amount.amount(), Decimal::from(100));
        assert_eq!(totals.total_amount.amount(), Decimal::from(480));
        assert_eq!(totals.subtotal.amount(), Decimal::from(500));
    }

    #[test]
    fn order_totals_round_to_cents() {
        // 333.33 × 15% = 49.9995 → 50.00
        let totals = OrderTotals::compute(LivePrice::new(Decimal::new(33333, 2)), 15, Decimal::from(90));
        assert_eq!(totals.discount_amount.amount(), Decimal::new(5000, 2));
        assert_eq!(totals.total_amount.amount(), Decimal::new(37333, 2));
    }

    #[test]
    fn no_discount_keeps_subtotal() {
        let totals = OrderTotals::compute(LivePrice::new(Decimal::from(250)), 0, Decimal::from(80));
        assert_eq!(totals.total_amount.amount(), Decimal::from(330));
    }

    #[test]
    fn referenced_ids_are_distinct() {
        let p = Uuid::new_v4();
        let v = Uuid::new_v4();
        let items = vec![item(p, Some(v), 1), item(p, Some(v), 2), item(p, None, 1)];
        let (products, variants) = referenced_ids(&items);
        assert_eq!(products, vec![p]);
        assert_eq!(variants, vec![v]);
    }
}
