use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{domain::role::Role, models::User};

/// Partial profile update. Only admins may change `role`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserList {
    pub items: Vec<User>,
}
