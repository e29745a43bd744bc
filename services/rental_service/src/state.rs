use reqwest::Client;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub db_schema: Option<String>,
    pub env_name: String,
    pub payment_base_url: Option<String>,
    pub payment_key_id: String,
    pub payment_key_secret: String,
    pub payment_currency: String,
    pub http: Client,
}

impl AppState {
    pub fn table(&self, name: &str) -> String {
        match &self.db_schema {
            Some(s) => format!("{s}.{name}"),
            None => name.to_string(),
        }
    }

    pub fn payments_enabled(&self) -> bool {
        self.payment_base_url.as_deref().unwrap_or("").trim() != ""
    }
}
