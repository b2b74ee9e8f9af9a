use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::{
    catalog::ProductType,
    db::OrmConn,
    dto::products::{ProductList, ProductView},
    entity::{
        product_images::{Column as ImageCol, Entity as ProductImages, Model as ImageModel},
        product_variants::{Column as VariantCol, Entity as ProductVariants, Model as VariantModel},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    models::{ProductImage, ProductVariant},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Storefront cards show at most this many images per product.
pub const MAX_IMAGES: usize = 4;
const FEATURED_LIMIT: i64 = 4;

pub async fn list_products(state: &AppState) -> AppResult<ApiResponse<ProductList>> {
    let products = Products::find()
        .order_by_asc(ProdCol::SortOrder)
        .order_by_asc(ProdCol::Name)
        .all(&state.orm)
        .await?;
    let items = load_views(&state.orm, products).await?;
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::unpaged(total)),
    ))
}

pub async fn list_by_type(
    state: &AppState,
    product_type: ProductType,
) -> AppResult<ApiResponse<ProductList>> {
    let products = Products::find()
        .filter(ProdCol::ProductType.eq(product_type))
        .order_by_asc(ProdCol::SortOrder)
        .order_by_asc(ProdCol::Name)
        .all(&state.orm)
        .await?;
    let items = load_views(&state.orm, products).await?;
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        format!("{} products", product_type.label()),
        ProductList { items },
        Some(Meta::unpaged(total)),
    ))
}

/// Best sellers among single-price products, by units ordered.
pub async fn featured(state: &AppState) -> AppResult<ApiResponse<ProductList>> {
    let ranked: Vec<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT p.id
        FROM products p
        JOIN order_items oi ON oi.product_id = p.id
        WHERE NOT EXISTS (SELECT 1 FROM product_variants v WHERE v.product_id = p.id)
        GROUP BY p.id
        ORDER BY SUM(oi.quantity) DESC, p.id
        LIMIT $1
        "#,
    )
    .bind(FEATURED_LIMIT)
    .fetch_all(&state.pool)
    .await?;
    let ranked: Vec<Uuid> = ranked.into_iter().map(|(id,)| id).collect();

    let mut products = if ranked.is_empty() {
        Vec::new()
    } else {
        Products::find()
            .filter(ProdCol::Id.is_in(ranked.clone()))
            .all(&state.orm)
            .await?
    };
    products.sort_by_key(|p| ranked.iter().position(|id| *id == p.id));

    let items = load_views(&state.orm, products).await?;
    Ok(ApiResponse::success(
        "Featured products",
        ProductList { items },
        Some(Meta::empty()),
    ))
}

pub async fn new_arrivals(state: &AppState) -> AppResult<ApiResponse<ProductList>> {
    let products = Products::find()
        .filter(ProdCol::IsNew.eq(true))
        .order_by_asc(ProdCol::Name)
        .all(&state.orm)
        .await?;
    let items = load_views(&state.orm, products).await?;
    Ok(ApiResponse::success(
        "New arrivals",
        ProductList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductView>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;

    let view = load_views(&state.orm, vec![product])
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found("Product not found"))?;
    Ok(ApiResponse::success("Product", view, Some(Meta::empty())))
}

async fn load_views(conn: &OrmConn, products: Vec<ProductModel>) -> AppResult<Vec<ProductView>> {
    if products.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();

    let variants = ProductVariants::find()
        .filter(VariantCol::ProductId.is_in(ids.clone()))
        .order_by_asc(VariantCol::Size)
        .all(conn)
        .await?;
    let images = ProductImages::find()
        .filter(ImageCol::ProductId.is_in(ids))
        .order_by_asc(ImageCol::CreatedAt)
        .all(conn)
        .await?;

    Ok(build_views(products, variants, images))
}

/// Joins products with their variants and images, keeping the product order.
pub fn build_views(
    products: Vec<ProductModel>,
    variants: Vec<VariantModel>,
    images: Vec<ImageModel>,
) -> Vec<ProductView> {
    let mut variants_by_product: HashMap<Uuid, Vec<ProductVariant>> = HashMap::new();
    for variant in variants {
        variants_by_product
            .entry(variant.product_id)
            .or_default()
            .push(ProductVariant::from(variant));
    }

    let mut images_by_product: HashMap<Uuid, Vec<ImageModel>> = HashMap::new();
    for image in images {
        images_by_product.entry(image.product_id).or_default().push(image);
    }

    products
        .into_iter()
        .map(|product| {
            let variants = variants_by_product.remove(&product.id).unwrap_or_default();
            let mut images = images_by_product.remove(&product.id).unwrap_or_default();
            // stable: primary first, upload order otherwise
            images.sort_by_key(|img| !img.is_primary);
            images.truncate(MAX_IMAGES);

            ProductView {
                product_id: product.id,
                name: product.name,
                description: product.description,
                product_type: product.product_type,
                price: if variants.is_empty() { product.price } else { None },
                stock_quantity: product.stock_quantity,
                sort_order: product.sort_order,
                is_new: product.is_new,
                images: images.into_iter().map(ProductImage::from).collect(),
                variants,
                created_at: product.created_at.with_timezone(&Utc),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn product(name: &str) -> ProductModel {
        ProductModel {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            product_type: ProductType::BodyChains,
            price: Some(Decimal::from(300)),
            stock_quantity: 3,
            sort_order: 0,
            is_new: true,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn image(product_id: Uuid, url: &str, is_primary: bool) -> ImageModel {
        ImageModel {
            id: Uuid::new_v4(),
            product_id,
            image_url: url.into(),
            is_primary,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn primary_image_first_and_capped() {
        let p = product("Marly");
        let images = vec![
            image(p.id, "a.jpg", false),
            image(p.id, "b.jpg", false),
            image(p.id, "c.jpg", true),
            image(p.id, "d.jpg", false),
            image(p.id, "e.jpg", false),
        ];
        let views = build_views(vec![p], vec![], images);
        let urls: Vec<_> = views[0].images.iter().map(|i| i.image_url.as_str()).collect();
        assert_eq!(urls, vec!["c.jpg", "a.jpg", "b.jpg", "d.jpg"]);
    }

    #[test]
    fn variant_prices_hide_the_product_price() {
        let with_variants = product("Vertical Gleam");
        let plain = product("Seashell");
        let variant = VariantModel {
            id: Uuid::new_v4(),
            product_id: with_variants.id,
            size: Some("M/L".into()),
            color: None,
            price: Decimal::from(320),
            stock_quantity: 2,
        };
        let views = build_views(vec![with_variants, plain], vec![variant], vec![]);
        assert_eq!(views[0].price, None);
        assert_eq!(views[0].variants.len(), 1);
        assert_eq!(views[1].price, Some(Decimal::from(300)));
        assert_eq!(views[1].name, "Seashell");
    }
}
