//! HTTP API for the browser chat client

pub mod auth;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod users;

pub use auth::{AuthError, Claims, JwtAuth};
pub use middleware::AuthenticatedUser;
pub use routes::ApiState;
pub use server::{ApiServer, ApiServerConfig};
pub use users::{InMemoryUserStore, UserError, UserStore};
