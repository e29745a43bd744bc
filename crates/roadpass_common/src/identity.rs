use axum::http::HeaderMap;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_PHONE_HEADER: &str = "x-user-phone";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::User
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

// Identity forwarded by the upstream gateway. The gateway-auth layer must
// have validated the caller before any of these headers are trusted.
#[derive(Clone, Debug)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
}

impl Identity {
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let id = header_str(headers, USER_ID_HEADER)?;
        if id.len() > 64 {
            return None;
        }
        let role = header_str(headers, USER_ROLE_HEADER)
            .map(|r| Role::parse(&r))
            .unwrap_or(Role::User);
        Some(Self {
            id,
            name: header_str(headers, USER_NAME_HEADER).unwrap_or_default(),
            email: header_str(headers, USER_EMAIL_HEADER).unwrap_or_default(),
            phone: header_str(headers, USER_PHONE_HEADER),
            role,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut out = HeaderMap::new();
        for (k, v) in pairs {
            out.insert(
                axum::http::header::HeaderName::try_from(*k).unwrap(),
                HeaderValue::from_str(v).unwrap(),
            );
        }
        out
    }

    #[test]
    fn missing_user_id_yields_no_identity() {
        let h = headers(&[(USER_NAME_HEADER, "Ada")]);
        assert!(Identity::from_headers(&h).is_none());
    }

    #[test]
    fn blank_user_id_yields_no_identity() {
        let h = headers(&[(USER_ID_HEADER, "   ")]);
        assert!(Identity::from_headers(&h).is_none());
    }

    #[test]
    fn role_defaults_to_user() {
        let h = headers(&[(USER_ID_HEADER, "u-1")]);
        let ident = Identity::from_headers(&h).expect("identity");
        assert_eq!(ident.role, Role::User);
        assert!(!ident.is_admin());
    }

    #[test]
    fn admin_role_is_case_insensitive() {
        let h = headers(&[(USER_ID_HEADER, "u-1"), (USER_ROLE_HEADER, "Admin")]);
        let ident = Identity::from_headers(&h).expect("identity");
        assert!(ident.is_admin());
    }

    #[test]
    fn unknown_role_falls_back_to_user() {
        let h = headers(&[(USER_ID_HEADER, "u-1"), (USER_ROLE_HEADER, "superuser")]);
        let ident = Identity::from_headers(&h).expect("identity");
        assert_eq!(ident.role, Role::User);
    }

    #[test]
    fn display_fields_are_trimmed() {
        let h = headers(&[
            (USER_ID_HEADER, " u-1 "),
            (USER_NAME_HEADER, " Ada Lovelace "),
            (USER_EMAIL_HEADER, "ada@example.com"),
            (USER_PHONE_HEADER, "+963999000111"),
        ]);
        let ident = Identity::from_headers(&h).expect("identity");
        assert_eq!(ident.id, "u-1");
        assert_eq!(ident.name, "Ada Lovelace");
        assert_eq!(ident.phone.as_deref(), Some("+963999000111"));
    }
}
