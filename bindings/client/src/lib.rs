mod error;
mod request;
mod response;
mod users_api;

pub mod prelude {
    pub use crate::error::ClientError;
    pub use crate::request::{RequestSpec, UserPayload};
    pub use crate::response::{canonical_header_name, HttpResponse};
    pub use crate::users_api::UsersApiClient;
}
