use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    catalog::ProductType,
    entity::{
        cart_items::Model as CartItemModel, carts::Model as CartModel,
        order_items::Model as OrderItemModel, orders::Model as OrderModel, orders::OrderStatus,
        product_images::Model as ImageModel, product_variants::Model as VariantModel,
        products::Model as ProductModel, promo_codes::Model as PromoModel,
        users::Model as UserModel,
    },
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        Self {
            id: model.id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            birthday: model.birthday,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub product_type: ProductType,
    pub price: Option<Decimal>,
    pub stock_quantity: i32,
    pub sort_order: i32,
    pub is_new: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ProductModel> for Product {
    fn from(model: ProductModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            product_type: model.product_type,
            price: model.price,
            stock_quantity: model.stock_quantity,
            sort_order: model.sort_order,
            is_new: model.is_new,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductVariant {
    pub variant_id: Uuid,
    pub size: Option<String>,
    pub color: Option<String>,
    pub price: Decimal,
    pub stock_quantity: i32,
}

impl From<VariantModel> for ProductVariant {
    fn from(model: VariantModel) -> Self {
        Self {
            variant_id: model.id,
            size: model.size,
            color: model.color,
            price: model.price,
            stock_quantity: model.stock_quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductImage {
    pub image_url: String,
    pub is_primary: bool,
}

impl From<ImageModel> for ProductImage {
    fn from(model: ImageModel) -> Self {
        Self {
            image_url: model.image_url,
            is_primary: model.is_primary,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_price: Decimal,
}

impl From<CartModel> for Cart {
    fn from(model: CartModel) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            total_price: model.total_price,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub size: Option<String>,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl From<CartItemModel> for CartItem {
    fn from(model: CartItemModel) -> Self {
        Self {
            id: model.id,
            cart_id: model.cart_id,
            product_id: model.product_id,
            variant_id: model.variant_id,
            size: model.size,
            quantity: model.quantity,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_date: DateTime<Utc>,
    pub subtotal: Decimal,
    pub discount_percent: i32,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
    pub address: String,
    pub apartment_no: String,
    pub city: String,
    pub governorate: String,
    pub phone_number: String,
    pub status: OrderStatus,
}

impl From<OrderModel> for Order {
    fn from(model: OrderModel) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            order_date: model.order_date.with_timezone(&Utc),
            subtotal: model.subtotal,
            discount_percent: model.discount_percent,
            shipping_cost: model.shipping_cost,
            total_amount: model.total_amount,
            address: model.address,
            apartment_no: model.apartment_no,
            city: model.city,
            governorate: model.governorate,
            phone_number: model.phone_number,
            status: model.status,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub size: Option<String>,
    pub quantity: i32,
    pub price: Decimal,
}

impl From<OrderItemModel> for OrderItem {
    fn from(model: OrderItemModel) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            variant_id: model.variant_id,
            size: model.size,
            quantity: model.quantity,
            price: model.price,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PromoCode {
    pub id: Uuid,
    pub code: String,
    pub user_id: Option<Uuid>,
    pub discount_percent: i32,
    pub expiry_date: DateTime<Utc>,
    pub is_public: bool,
}

impl From<PromoModel> for PromoCode {
    fn from(model: PromoModel) -> Self {
        Self {
            id: model.id,
            code: model.code,
            user_id: model.user_id,
            discount_percent: model.discount_percent,
            expiry_date: model.expiry_date.with_timezone(&Utc),
            is_public: model.is_public,
        }
    }
}
