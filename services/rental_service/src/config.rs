use regex::Regex;
use roadpass_common::secret_policy;
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub env_name: String,

    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,

    pub db_url: String,
    pub db_schema: Option<String>,

    pub require_gateway_auth: bool,
    pub gateway_auth_secret: Option<String>,

    pub allowed_hosts: Vec<String>,
    pub allowed_origins: Vec<String>,

    pub payment_base_url: Option<String>,
    pub payment_key_id: String,
    pub payment_key_secret: String,
    pub payment_currency: String,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(v) => {
            let v = v.trim().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        }
        Err(_) => None,
    }
}

fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn normalize_db_url(raw: &str) -> String {
    // Accept SQLAlchemy-style URLs like "postgresql+psycopg://..." by dropping
    // the "+driver" portion.
    if let Some(colon) = raw.find(':') {
        let (scheme, rest) = raw.split_at(colon);
        if let Some(plus) = scheme.find('+') {
            return format!("{}{}", &scheme[..plus], rest);
        }
    }
    raw.to_string()
}

fn validate_postgres_url(url: &str) -> Result<(), String> {
    let scheme = url
        .split_once(':')
        .map(|(s, _)| s.trim().to_lowercase())
        .unwrap_or_default();
    match scheme.as_str() {
        "postgres" | "postgresql" => Ok(()),
        _ => Err("RENTAL_DB_URL (or DB_URL) must be a postgres URL".to_string()),
    }
}

fn parse_required_bool_like(raw: &str) -> Option<bool> {
    let v = raw.trim().to_lowercase();
    if v.is_empty() {
        return None;
    }
    if matches!(v.as_str(), "0" | "false" | "no" | "off") {
        Some(false)
    } else {
        Some(true)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let env_name = env_or("ENV", "dev");
        let env_lower = env_name.trim().to_lowercase();

        let host = env_or("APP_HOST", "0.0.0.0");
        let port: u16 = env_or("APP_PORT", "8084")
            .parse()
            .map_err(|_| "APP_PORT must be a valid u16".to_string())?;

        let db_raw = env_opt("RENTAL_DB_URL")
            .or_else(|| env_opt("DB_URL"))
            .unwrap_or_else(|| "postgresql://roadpass:roadpass@db:5432/roadpass_rental".to_string());
        let db_url = normalize_db_url(&db_raw);
        validate_postgres_url(&db_url)?;

        let db_schema = env_opt("DB_SCHEMA");
        if let Some(s) = &db_schema {
            let re = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").map_err(|e| e.to_string())?;
            if !re.is_match(s) {
                return Err("DB_SCHEMA must match ^[A-Za-z_][A-Za-z0-9_]*$".to_string());
            }
        }

        let prod_like = matches!(env_lower.as_str(), "prod" | "production" | "staging");

        let require_gateway_auth = {
            let raw = env_or("RENTAL_REQUIRE_GATEWAY_AUTH", "");
            match parse_required_bool_like(&raw) {
                Some(v) => v,
                None => prod_like,
            }
        };
        if prod_like && !require_gateway_auth {
            return Err("RENTAL_REQUIRE_GATEWAY_AUTH must be true in prod/staging".to_string());
        }

        let gateway_auth_secret = env_opt("GATEWAY_AUTH_SECRET");
        if require_gateway_auth && gateway_auth_secret.as_deref().unwrap_or("").is_empty() {
            return Err(
                "GATEWAY_AUTH_SECRET must be set when RENTAL_REQUIRE_GATEWAY_AUTH is enabled"
                    .to_string(),
            );
        }
        secret_policy::enforce_value_policy_for_env(
            &env_name,
            "GATEWAY_AUTH_SECRET",
            gateway_auth_secret.as_deref(),
            false,
        )?;

        let mut allowed_hosts = parse_csv(&env_or("ALLOWED_HOSTS", ""));
        if allowed_hosts.is_empty() && matches!(env_lower.as_str(), "dev" | "test") {
            allowed_hosts = vec!["localhost".to_string(), "127.0.0.1".to_string()];
        }
        if matches!(env_lower.as_str(), "dev" | "test") {
            for extra in ["localhost", "127.0.0.1"] {
                if !allowed_hosts.iter().any(|h| h == extra) {
                    allowed_hosts.push(extra.to_string());
                }
            }
        }
        // Keep gateway-to-service calls working.
        for extra in ["rental"] {
            if !allowed_hosts.iter().any(|h| h == extra) {
                allowed_hosts.push(extra.to_string());
            }
        }
        if prod_like && allowed_hosts.iter().any(|h| h.trim() == "*") {
            return Err("ALLOWED_HOSTS must not contain '*' in prod/staging".to_string());
        }

        let mut allowed_origins = parse_csv(&env_or("ALLOWED_ORIGINS", ""));
        if allowed_origins.is_empty() {
            // Safe local default for development.
            allowed_origins = vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ];
        }
        if prod_like && allowed_origins.iter().any(|o| o.trim() == "*") {
            return Err("ALLOWED_ORIGINS must not contain '*' in prod/staging".to_string());
        }
        if prod_like
            && allowed_origins
                .iter()
                .any(|o| !o.trim().starts_with("https://"))
        {
            return Err("ALLOWED_ORIGINS must use https:// origins in prod/staging".to_string());
        }

        let max_body_bytes: usize = env_or("RENTAL_MAX_BODY_BYTES", "1048576")
            .parse()
            .map_err(|_| "RENTAL_MAX_BODY_BYTES must be an integer".to_string())?;
        let max_body_bytes = max_body_bytes.clamp(16 * 1024, 10 * 1024 * 1024);

        let payment_base_url = env_opt("PAYMENT_BASE_URL");
        let payment_key_id = env_or("PAYMENT_KEY_ID", "rzp_test_key");
        let payment_key_secret = env_or("PAYMENT_KEY_SECRET", "change-me-payment-key");
        if payment_base_url.is_some()
            && !matches!(env_lower.as_str(), "dev" | "test")
            && payment_key_secret.trim().is_empty()
        {
            return Err(
                "PAYMENT_KEY_SECRET must be set when PAYMENT_BASE_URL is configured".to_string(),
            );
        }
        secret_policy::enforce_value_policy_for_env(
            &env_name,
            "PAYMENT_KEY_SECRET",
            Some(payment_key_secret.as_str()),
            payment_base_url.is_some(),
        )?;

        let payment_currency = env_or("PAYMENT_CURRENCY", "INR")
            .trim()
            .to_ascii_uppercase();
        if payment_currency.len() != 3 || !payment_currency.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err("PAYMENT_CURRENCY must be a 3-letter ISO code".to_string());
        }

        Ok(Self {
            env_name,
            host,
            port,
            max_body_bytes,
            db_url,
            db_schema,
            require_gateway_auth,
            gateway_auth_secret,
            allowed_hosts,
            allowed_origins,
            payment_base_url,
            payment_key_id,
            payment_key_secret,
            payment_currency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    struct EnvGuard {
        saved: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new(keys: &[&str]) -> Self {
            let mut keys = keys.to_vec();
            for required in [
                "RENTAL_MAX_BODY_BYTES",
                "ALLOWED_HOSTS",
                "ALLOWED_ORIGINS",
                "PAYMENT_CURRENCY",
            ] {
                if !keys.contains(&required) {
                    keys.push(required);
                }
            }
            let mut saved = Vec::with_capacity(keys.len());
            for k in keys {
                let existing = env::var(k).ok();
                saved.push((k.to_string(), existing));
                env::remove_var(k);
            }
            env::set_var("ALLOWED_HOSTS", "api.roadpass.io");
            env::set_var("ALLOWED_ORIGINS", "https://app.roadpass.io");
            Self { saved }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (k, v) in self.saved.drain(..) {
                match v {
                    Some(val) => env::set_var(k, val),
                    None => env::remove_var(k),
                }
            }
        }
    }

    const KEYS: &[&str] = &[
        "ENV",
        "RENTAL_DB_URL",
        "DB_URL",
        "RENTAL_REQUIRE_GATEWAY_AUTH",
        "GATEWAY_AUTH_SECRET",
        "PAYMENT_BASE_URL",
        "PAYMENT_KEY_ID",
        "PAYMENT_KEY_SECRET",
    ];

    #[test]
    fn rejects_non_postgres_url() {
        let _g = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
        let _env = EnvGuard::new(KEYS);

        env::set_var("RENTAL_DB_URL", "sqlite:////tmp/rental.db");
        env::set_var("RENTAL_REQUIRE_GATEWAY_AUTH", "false");

        let res = Config::from_env();
        assert!(res.is_err());
    }

    #[test]
    fn sqlalchemy_style_driver_suffix_is_dropped() {
        let _g = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
        let _env = EnvGuard::new(KEYS);

        env::set_var(
            "RENTAL_DB_URL",
            "postgresql+psycopg://u:p@localhost:5432/rental",
        );
        env::set_var("RENTAL_REQUIRE_GATEWAY_AUTH", "false");

        let cfg = Config::from_env().expect("config");
        assert_eq!(cfg.db_url, "postgresql://u:p@localhost:5432/rental");
    }

    #[test]
    fn prod_requires_gateway_auth_secret() {
        let _g = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
        let _env = EnvGuard::new(KEYS);

        env::set_var("ENV", "prod");
        env::set_var("RENTAL_DB_URL", "postgresql://u:p@localhost:5432/rental");
        env::set_var("PAYMENT_KEY_SECRET", "ffffffffffffffffffffffffffffffff");

        let err = Config::from_env().expect_err("missing gateway secret must be rejected");
        assert!(err.contains("GATEWAY_AUTH_SECRET"));
    }

    #[test]
    fn prod_rejects_gateway_auth_toggle_off() {
        let _g = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
        let _env = EnvGuard::new(KEYS);

        env::set_var("ENV", "prod");
        env::set_var("RENTAL_DB_URL", "postgresql://u:p@localhost:5432/rental");
        env::set_var("RENTAL_REQUIRE_GATEWAY_AUTH", "false");

        let err = Config::from_env().expect_err("must reject disabled gateway auth in prod");
        assert!(err.contains("RENTAL_REQUIRE_GATEWAY_AUTH must be true in prod/staging"));
    }

    #[test]
    fn prod_rejects_default_payment_key_secret() {
        let _g = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
        let _env = EnvGuard::new(KEYS);

        env::set_var("ENV", "prod");
        env::set_var("RENTAL_DB_URL", "postgresql://u:p@localhost:5432/rental");
        env::set_var("GATEWAY_AUTH_SECRET", "cccccccccccccccccccccccccccccccc");
        env::set_var("PAYMENT_BASE_URL", "https://api.razorpay.com");

        let res = Config::from_env();
        assert!(res.is_err());
    }

    #[test]
    fn prod_rejects_wildcard_allowed_hosts() {
        let _g = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
        let _env = EnvGuard::new(KEYS);

        env::set_var("ENV", "prod");
        env::set_var("RENTAL_DB_URL", "postgresql://u:p@localhost:5432/rental");
        env::set_var("GATEWAY_AUTH_SECRET", "cccccccccccccccccccccccccccccccc");
        env::set_var("PAYMENT_KEY_SECRET", "ffffffffffffffffffffffffffffffff");
        env::set_var("ALLOWED_HOSTS", "*");

        let err = Config::from_env().expect_err("wildcard hosts must be rejected in prod");
        assert!(err.contains("ALLOWED_HOSTS"));
    }

    #[test]
    fn prod_rejects_non_https_allowed_origins() {
        let _g = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
        let _env = EnvGuard::new(KEYS);

        env::set_var("ENV", "prod");
        env::set_var("RENTAL_DB_URL", "postgresql://u:p@localhost:5432/rental");
        env::set_var("GATEWAY_AUTH_SECRET", "cccccccccccccccccccccccccccccccc");
        env::set_var("PAYMENT_KEY_SECRET", "ffffffffffffffffffffffffffffffff");
        env::set_var("ALLOWED_ORIGINS", "http://app.roadpass.io");

        let err = Config::from_env().expect_err("non-https origins must be rejected in prod");
        assert!(err.contains("ALLOWED_ORIGINS must use https:// origins"));
    }

    #[test]
    fn rejects_bad_currency_code() {
        let _g = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
        let _env = EnvGuard::new(KEYS);

        env::set_var("RENTAL_DB_URL", "postgresql://u:p@localhost:5432/rental");
        env::set_var("RENTAL_REQUIRE_GATEWAY_AUTH", "false");
        env::set_var("PAYMENT_CURRENCY", "RUPEES");

        let err = Config::from_env().expect_err("bad currency must be rejected");
        assert!(err.contains("PAYMENT_CURRENCY"));
    }

    #[test]
    fn body_limit_is_clamped_to_safe_bounds() {
        let _g = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
        let _env = EnvGuard::new(KEYS);

        env::set_var("ENV", "dev");
        env::set_var("RENTAL_DB_URL", "postgresql://u:p@localhost:5432/rental");
        env::set_var("RENTAL_REQUIRE_GATEWAY_AUTH", "false");

        env::set_var("RENTAL_MAX_BODY_BYTES", "1");
        let cfg = Config::from_env().expect("config");
        assert_eq!(cfg.max_body_bytes, 16 * 1024);

        env::set_var("RENTAL_MAX_BODY_BYTES", "999999999");
        let cfg = Config::from_env().expect("config");
        assert_eq!(cfg.max_body_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn currency_is_uppercased() {
        let _g = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
        let _env = EnvGuard::new(KEYS);

        env::set_var("RENTAL_DB_URL", "postgresql://u:p@localhost:5432/rental");
        env::set_var("RENTAL_REQUIRE_GATEWAY_AUTH", "false");
        env::set_var("PAYMENT_CURRENCY", "usd");

        let cfg = Config::from_env().expect("config");
        assert_eq!(cfg.payment_currency, "USD");
    }
}
