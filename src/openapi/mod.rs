use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// Registers the bearer scheme referenced by `security(("Bearer" = []))`.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "0.1.0",
        description = r#"
# Storefront API

Catalog browsing, cart, checkout, orders, wishlist and admin product management
for a handcrafted-goods storefront.

## Authentication

Customer endpoints expect a JWT issued by the identity provider:

```
Authorization: Bearer <your-jwt-token>
```

Admin endpoints additionally require the `admin` role claim.

## Error Handling

Failures share one body shape; validation failures add per-field `details`:

```json
{
  "error": "Bad Request",
  "message": "Validation error: shipping_email: must be a valid email address",
  "details": {"shipping_email": ["must be a valid email address"]},
  "request_id": "2b8f...",
  "timestamp": "2026-01-01T00:00:00Z"
}
```

## Pagination

List endpoints accept `page` (1-based) and `per_page`; each endpoint has its
own default page size and `per_page` is capped server-side.
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "products", description = "Storefront product catalog"),
        (name = "catalog", description = "Categories and banners"),
        (name = "cart", description = "Shopping cart"),
        (name = "wishlist", description = "Saved products"),
        (name = "orders", description = "Checkout and order history"),
        (name = "payments", description = "Payment gateway stubs"),
        (name = "admin", description = "Product management")
    ),
    paths(
        // Catalog
        crate::handlers::products::list_products,
        crate::handlers::products::featured_products,
        crate::handlers::products::get_product,
        crate::handlers::products::related_products,
        crate::handlers::categories::list_categories,
        crate::handlers::categories::get_category,
        crate::handlers::banners::list_banners,

        // Cart
        crate::handlers::cart::get_cart,
        crate::handlers::cart::add_to_cart,
        crate::handlers::cart::update_cart_item,
        crate::handlers::cart::remove_cart_item,
        crate::handlers::cart::clear_cart,

        // Wishlist
        crate::handlers::wishlist::list_wishlist,
        crate::handlers::wishlist::add_to_wishlist,
        crate::handlers::wishlist::remove_from_wishlist,
        crate::handlers::wishlist::toggle_wishlist,

        // Orders & payments
        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::payments::create_gateway_order,
        crate::handlers::payments::verify_payment,

        // Admin
        crate::handlers::admin_products::list_products,
        crate::handlers::admin_products::get_product,
        crate::handlers::admin_products::create_product,
        crate::handlers::admin_products::update_product,
        crate::handlers::admin_products::delete_product,
    ),
    components(
        schemas(
            crate::ResponseMeta,
            crate::services::catalog::ProductView,
            crate::services::catalog::ProductImageView,
            crate::services::catalog::CategorySummary,
            crate::services::catalog::CategoryView,
            crate::services::catalog::CreateProductInput,
            crate::services::catalog::UpdateProductInput,
            crate::services::catalog::ProductSortBy,
            crate::services::catalog::SortOrder,
            crate::services::cart::AddToCartInput,
            crate::services::cart::UpdateCartItemInput,
            crate::services::cart::CartLine,
            crate::services::cart::CartView,
            crate::services::wishlist::AddToWishlistInput,
            crate::services::wishlist::WishlistStatus,
            crate::handlers::orders::CreateOrderRequest,
            crate::services::orders::OrderView,
            crate::services::orders::OrderItemView,
            crate::services::orders::ShippingAddressView,
            crate::services::payments::CreateGatewayOrderInput,
            crate::services::payments::GatewayOrder,
            crate::services::payments::VerifyPaymentInput,
            crate::entities::PaymentMethod,
            crate::entities::PaymentStatus,
            crate::entities::OrderStatus,
            crate::entities::banner::Model,

            // Error types
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
