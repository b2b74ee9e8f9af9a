use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    entity::orders::OrderStatus,
    models::{Order, OrderItem},
};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CheckoutRequest {
    #[validate(length(min = 5, message = "Address should be at least 5 characters"))]
    pub address: String,
    #[validate(length(min = 1, message = "Apartment number cannot be empty"))]
    pub apartment_no: String,
    #[validate(length(min = 1, message = "City cannot be empty"))]
    pub city: String,
    /// Governorate id from `GET /api/governorates`.
    pub governorate: i32,
    #[validate(custom = "validate_phone_number")]
    pub phone_number: String,
    /// Six characters; an empty string means no promo.
    pub promo_code: Option<String>,
}

/// Egyptian mobile numbers: `+20` then `10`, `11`, `12` or `15`, then eight digits.
pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    let valid = phone.len() == 13
        && phone.starts_with("+201")
        && matches!(phone.as_bytes()[4], b'0' | b'1' | b'2' | b'5')
        && phone[5..].bytes().all(|b| b.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_number");
        err.message = Some(
            "Phone number must start with +2010, +2011, +2012, or +2015 and be 13 digits in total"
                .into(),
        );
        Err(err)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

/// An order as shown in the customer's history.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserOrderView {
    /// Position in the customer's own history, counted from their first order.
    pub order_number: i64,
    pub order_id: Uuid,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub discount_percent: i32,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
    pub items: Vec<UserOrderItemView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserOrderItemView {
    pub product_id: Uuid,
    pub name: Option<String>,
    pub quantity: i32,
    pub price: Decimal,
    pub size: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserOrderList {
    pub items: Vec<UserOrderView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(phone: &str) -> CheckoutRequest {
        CheckoutRequest {
            address: "12 Nile Street".into(),
            apartment_no: "4B".into(),
            city: "Cairo".into(),
            governorate: 1,
            phone_number: phone.into(),
            promo_code: None,
        }
    }

    #[test]
    fn accepts_egyptian_mobile_numbers() {
        for phone in ["+201012345678", "+201112345678", "+201212345678", "+201512345678"] {
            assert!(validate_phone_number(phone).is_ok(), "{phone}");
        }
    }

    #[test]
    fn rejects_other_numbers() {
        for phone in ["+201312345678", "01012345678", "+20101234567", "+2010123456789", "+20101234567a"] {
            assert!(validate_phone_number(phone).is_err(), "{phone}");
        }
    }

    #[test]
    fn checkout_request_validation() {
        assert!(request("+201012345678").validate().is_ok());
        assert!(request("12345").validate().is_err());

        let mut short_address = request("+201012345678");
        short_address.address = "Nile".into();
        assert!(short_address.validate().is_err());
    }
}
