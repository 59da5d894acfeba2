use axum::http::{header, HeaderMap, Uri};

pub const COOKIE_NAME: &str = "parcel_api_key";
pub const MAX_AGE_SECS: u64 = 30 * 24 * 60 * 60;

/// `Set-Cookie` value carrying the API key.
pub fn encode(api_key: &str, secure: bool) -> String {
    format!(
        "{COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={MAX_AGE_SECS}{}",
        urlencoding::encode(api_key),
        secure_flag(secure)
    )
}

/// `Set-Cookie` value that expires the credential immediately.
pub fn clear(secure: bool) -> String {
    format!(
        "{COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0{}",
        secure_flag(secure)
    )
}

/// Reads the API key from the request's `Cookie` headers. A value that does
/// not percent-decode to UTF-8 counts as absent.
pub fn decode(headers: &HeaderMap) -> Option<String> {
    let raw = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(name, _)| *name == COOKIE_NAME)
        .map(|(_, value)| value)
        .last()?;

    if raw.is_empty() || !well_formed_escapes(raw) {
        return None;
    }

    urlencoding::decode(raw)
        .ok()
        .map(|value| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Whether the request arrived over HTTPS, directly or through a proxy.
pub fn is_secure(uri: &Uri, headers: &HeaderMap) -> bool {
    if uri.scheme_str() == Some("https") {
        return true;
    }

    headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}

/// Every `%` must start a two-digit hex escape.
fn well_formed_escapes(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'%' {
            let escape = bytes.get(index + 1..index + 3);
            if !escape.is_some_and(|pair| pair.iter().all(u8::is_ascii_hexdigit)) {
                return false;
            }
            index += 3;
        } else {
            index += 1;
        }
    }
    true
}

fn secure_flag(secure: bool) -> &'static str {
    if secure { "; Secure" } else { "" }
}
