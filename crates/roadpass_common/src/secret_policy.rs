pub fn is_production_like(env_name: &str) -> bool {
    let env = env_name.trim().to_ascii_lowercase();
    matches!(env.as_str(), "prod" | "production" | "staging")
}

// Rejects missing, short, or placeholder-looking secrets in prod/staging.
// Dev and test environments are left alone.
pub fn enforce_value_policy_for_env(
    env_name: &str,
    key: &str,
    value: Option<&str>,
    required_in_prod: bool,
) -> Result<(), String> {
    if !is_production_like(env_name) {
        return Ok(());
    }

    let secret = value.map(str::trim).unwrap_or("");
    if secret.is_empty() {
        if required_in_prod {
            return Err(format!("{key} must be set in prod/staging"));
        }
        return Ok(());
    }

    if secret.len() < 16 {
        return Err(format!(
            "{key} must be at least 16 characters in prod/staging"
        ));
    }
    if looks_like_placeholder(secret) {
        return Err(format!(
            "{key} looks like a placeholder/default value; use a strong random secret"
        ));
    }
    Ok(())
}

fn looks_like_placeholder(secret: &str) -> bool {
    let s = secret.trim().to_ascii_lowercase();
    let banned_exact = [
        "change-me",
        "changeme",
        "replace-me",
        "secret",
        "password",
        "default",
        "dummy",
        "example",
        "test",
        "qwerty",
        "letmein",
    ];
    if banned_exact.iter().any(|v| *v == s) {
        return true;
    }

    let banned_fragments = [
        "change-me",
        "change_me",
        "replace-me",
        "replace_me",
        "set-me",
        "your-secret",
        "your_secret",
        "dev-secret",
        "dev_secret",
        "rzp_test",
    ];
    banned_fragments.iter().any(|v| s.contains(v))
}
