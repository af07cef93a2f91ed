use sqlx::PgPool;

use crate::{
    error::Result,
    models::{
        page_params, CreateProductRequest, Pagination, Product, ProductQuery,
        ProductSearchResponse, UpdateProductRequest,
    },
};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(product)
}

pub async fn search_products(pool: &PgPool, params: ProductQuery) -> Result<ProductSearchResponse> {
    let (page, limit) = page_params(params.page, params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
    let offset = (page - 1) * limit;

    let mut query_builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(
        "SELECT *, COUNT(*) OVER() as total_count FROM products WHERE is_active = TRUE",
    );

    if let Some(ref search) = params.search {
        let pattern = format!("%{}%", search);
        query_builder.push(" AND (name ILIKE ");
        query_builder.push_bind(pattern.clone());
        query_builder.push(" OR brand ILIKE ");
        query_builder.push_bind(pattern.clone());
        query_builder.push(" OR model ILIKE ");
        query_builder.push_bind(pattern.clone());
        query_builder.push(" OR category ILIKE ");
        query_builder.push_bind(pattern);
        query_builder.push(")");
    }

    if let Some(ref category) = params.category {
        query_builder.push(" AND category = ");
        query_builder.push_bind(category);
    }

    query_builder.push(" ORDER BY created_at DESC");
    query_builder.push(" LIMIT ");
    query_builder.push_bind(limit);
    query_builder.push(" OFFSET ");
    query_builder.push_bind(offset);

    #[derive(sqlx::FromRow)]
    struct SearchResult {
        #[sqlx(flatten)]
        product: Product,
        total_count: i64,
    }

    let results = query_builder
        .build_query_as::<SearchResult>()
        .fetch_all(pool)
        .await?;

    let total = results.first().map(|r| r.total_count).unwrap_or(0);
    let products = results.into_iter().map(|r| r.product).collect();

    Ok(ProductSearchResponse {
        products,
        pagination: Pagination::new(page, limit, total),
    })
}

pub async fn create_product(
    pool: &PgPool,
    req: &CreateProductRequest,
    created_by: i32,
) -> Result<Product> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (
            name, description, category, brand, model,
            warranty_duration_months, image_url, specifications, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(&req.name)
    .bind(&req.description)
    .bind(&req.category)
    .bind(&req.brand)
    .bind(&req.model)
    .bind(req.warranty_duration_months)
    .bind(&req.image_url)
    .bind(
        req.specifications
            .as_ref()
            .unwrap_or(&serde_json::json!({})),
    )
    .bind(created_by)
    .fetch_one(pool)
    .await?;

    Ok(product)
}

pub async fn update_product(
    pool: &PgPool,
    id: i32,
    req: &UpdateProductRequest,
) -> Result<Product> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET
            name = COALESCE($1, name),
            description = COALESCE($2, description),
            category = COALESCE($3, category),
            brand = COALESCE($4, brand),
            model = COALESCE($5, model),
            warranty_duration_months = COALESCE($6, warranty_duration_months),
            image_url = COALESCE($7, image_url),
            specifications = COALESCE($8, specifications),
            updated_at = NOW()
        WHERE id = $9
        RETURNING *
        "#,
    )
    .bind(&req.name)
    .bind(&req.description)
    .bind(&req.category)
    .bind(&req.brand)
    .bind(&req.model)
    .bind(req.warranty_duration_months)
    .bind(&req.image_url)
    .bind(&req.specifications)
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(product)
}

// Products are soft-deleted so existing units keep a valid reference.
pub async fn deactivate_product(pool: &PgPool, id: i32) -> Result<u64> {
    let result =
        sqlx::query("UPDATE products SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

    Ok(result.rows_affected())
}
