use axum::Router;

pub mod products;
pub mod system;

/// Routes that anyone may call.
pub fn public_router() -> Router {
    products::public_router()
}

/// Routes that need an authenticated caller.
pub fn protected_router() -> Router {
    products::protected_router()
}
