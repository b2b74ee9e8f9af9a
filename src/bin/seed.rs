use jewelry_shop_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations, sqlx_pool},
    services::auth_service::hash_password,
};
use rust_decimal::Decimal;
use uuid::Uuid;

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    product_type: &'static str,
    price: Option<i64>,
    stock: i32,
    is_new: bool,
    images: &'static [&'static str],
    variants: &'static [(&'static str, i64, i32)],
}

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Seashell",
        description: "Gold-plated seashell pendant on a fine chain",
        product_type: "Necklaces",
        price: Some(200),
        stock: 25,
        is_new: true,
        images: &["/images/seashell-1.jpg", "/images/seashell-2.jpg"],
        variants: &[],
    },
    SeedProduct {
        name: "Pearl Drop",
        description: "Freshwater pearl drop earrings",
        product_type: "Earrings",
        price: Some(150),
        stock: 40,
        is_new: false,
        images: &["/images/pearl-drop.jpg"],
        variants: &[],
    },
    SeedProduct {
        name: "Vertical Gleam",
        description: "Layered back chain cut to fit",
        product_type: "Back Chains",
        price: None,
        stock: 0,
        is_new: true,
        images: &["/images/vertical-gleam.jpg"],
        variants: &[("S/M", 300, 5), ("M/L", 320, 5)],
    },
    SeedProduct {
        name: "Marly",
        description: "Body chain with crystal accents",
        product_type: "Body Chains",
        price: None,
        stock: 0,
        is_new: false,
        images: &["/images/marly.jpg"],
        variants: &[("S/M", 350, 3), ("M/L", 350, 3)],
    },
    SeedProduct {
        name: "Sunset",
        description: "Made-to-order waist chain",
        product_type: "Waist Chains",
        price: None,
        stock: 0,
        is_new: false,
        images: &["/images/sunset.jpg"],
        variants: &[("S/M", 280, 0), ("M/L", 280, 0)],
    },
    SeedProduct {
        name: "Twist",
        description: "Stackable twisted band",
        product_type: "Rings",
        price: Some(120),
        stock: 60,
        is_new: false,
        images: &["/images/twist.jpg"],
        variants: &[],
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;
    let pool = sqlx_pool(&orm);

    let admin_id = ensure_user_with_role(&pool, "admin@example.com", "admin12345", "admin").await?;
    let user_id = ensure_user_with_role(&pool, "user@example.com", "user12345", "user").await?;
    seed_products(&pool).await?;
    seed_public_promo(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user_with_role(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password)?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, first_name, last_name, role)
        VALUES ($1, $2, $3, $4, 'Example', $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    for (idx, product) in PRODUCTS.iter().enumerate() {
        let inserted: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO products (id, name, description, type, price, stock_quantity, sort_order, is_new)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (name, type) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(product.name)
        .bind(product.description)
        .bind(product.product_type)
        .bind(product.price.map(Decimal::from))
        .bind(product.stock)
        .bind(idx as i32)
        .bind(product.is_new)
        .fetch_optional(pool)
        .await?;

        let Some((product_id,)) = inserted else {
            continue;
        };

        for (pos, url) in product.images.iter().enumerate() {
            sqlx::query(
                "INSERT INTO product_images (id, product_id, image_url, is_primary) VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::new_v4())
            .bind(product_id)
            .bind(*url)
            .bind(pos == 0)
            .execute(pool)
            .await?;
        }

        for (size, price, stock) in product.variants {
            sqlx::query(
                "INSERT INTO product_variants (id, product_id, size, price, stock_quantity) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(Uuid::new_v4())
            .bind(product_id)
            .bind(*size)
            .bind(Decimal::from(*price))
            .bind(*stock)
            .execute(pool)
            .await?;
        }
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_public_promo(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO promo_codes (id, code, discount_percent, expiry_date, is_public)
        VALUES ($1, 'WELCOM', 10, now() + interval '90 days', TRUE)
        ON CONFLICT (code) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .execute(pool)
    .await?;

    println!("Seeded public promo WELCOM");
    Ok(())
}
