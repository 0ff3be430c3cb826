pub mod auth;
pub mod bookings;
pub mod movies;
pub mod showtimes;
pub mod theaters;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(auth::routes())
        .merge(movies::routes())
        .merge(theaters::routes())
        .merge(showtimes::routes())
        .merge(bookings::routes())
}
