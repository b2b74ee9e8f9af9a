pub mod cart_items;
pub mod carts;
pub mod order_items;
pub mod orders;
pub mod product_images;
pub mod product_variants;
pub mod products;
pub mod promo_codes;
pub mod promo_redemptions;
pub mod users;

pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use product_images::Entity as ProductImages;
pub use product_variants::Entity as ProductVariants;
pub use products::Entity as Products;
pub use promo_codes::Entity as PromoCodes;
pub use promo_redemptions::Entity as PromoRedemptions;
pub use users::Entity as Users;
