use crate::{
    db::{DbPool, OrmConn, sqlx_pool},
    notify::Notifiers,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub notifiers: Notifiers,
}

impl AppState {
    pub fn new(orm: OrmConn, notifiers: Notifiers) -> Self {
        Self {
            pool: sqlx_pool(&orm),
            orm,
            notifiers,
        }
    }
}
