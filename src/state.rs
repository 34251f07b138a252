use std::sync::Arc;

use crate::{config::AuthSettings, db::OrmConn};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub auth: Arc<AuthSettings>,
    pub low_stock_threshold: i32,
}

impl AppState {
    pub fn new(orm: OrmConn, auth: AuthSettings, low_stock_threshold: i32) -> Self {
        Self {
            orm,
            auth: Arc::new(auth),
            low_stock_threshold,
        }
    }
}
