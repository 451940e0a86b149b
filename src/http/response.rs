//! Public response rendering.
//!
//! # Design Decisions
//! - Bodies are already buffered by the dispatcher, so rendering never streams
//! - Hop-by-hop headers were stripped when the backend response was read

use axum::body::Body;
use axum::response::{IntoResponse, Response};

use crate::response::PublicResponse;

impl IntoResponse for PublicResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
