use crate::base::profileerror::ProfileError;
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use url::Url;

/// A user-authored cookie, as stored in a profile.
///
/// Field names follow the browser cookie API (`httpOnly`, `expirationDate`,
/// `sameSite`, ...). The object a cookie was loaded from is kept alongside the
/// typed fields. Serializing writes that object back, changing only the
/// attributes whose typed value was edited, so loading and persisting a
/// profile leaves its attributes and their JSON types as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CookieDefinition {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    /// Seconds since the UNIX epoch. `None` for session cookies.
    pub expiration_date: Option<f64>,
    pub same_site: Option<SameSite>,
    pub host_only: Option<bool>,
    pub session: Option<bool>,
    pub store_id: Option<String>,
    stored: Map<String, Value>,
}

/// Wire names of the typed attributes.
const TYPED_KEYS: [&str; 11] = [
    "name",
    "value",
    "domain",
    "path",
    "secure",
    "httpOnly",
    "expirationDate",
    "sameSite",
    "hostOnly",
    "session",
    "storeId",
];

/// Typed view of the stored object.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CookieFields {
    name: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    domain: String,
    #[serde(default = "default_path")]
    path: String,
    #[serde(default)]
    secure: bool,
    #[serde(default)]
    http_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expiration_date: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    same_site: Option<SameSite>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    host_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    store_id: Option<String>,
}

fn default_path() -> String {
    "/".to_string()
}

/// Whether an attribute absent from the stored object reads back as `value`.
fn is_implied(key: &str, value: &Value) -> bool {
    match key {
        "value" | "domain" => value.as_str() == Some(""),
        "path" => value.as_str() == Some("/"),
        "secure" | "httpOnly" => value.as_bool() == Some(false),
        _ => false,
    }
}

/// Numbers compare by value so `1893456000` and `1893456000.0` are equal.
fn same_value(stored: &Value, typed: &Value) -> bool {
    match (stored, typed) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => stored == typed,
    }
}

impl Serialize for CookieDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = CookieFields {
            name: self.name.clone(),
            value: self.value.clone(),
            domain: self.domain.clone(),
            path: self.path.clone(),
            secure: self.secure,
            http_only: self.http_only,
            expiration_date: self.expiration_date,
            same_site: self.same_site,
            host_only: self.host_only,
            session: self.session,
            store_id: self.store_id.clone(),
        };
        let mut typed = match serde_json::to_value(&fields).map_err(S::Error::custom)? {
            Value::Object(map) => map,
            other => {
                return Err(S::Error::custom(format!(
                    "cookie serialized to a non-object: {}",
                    other
                )))
            }
        };

        let mut out = self.stored.clone();
        for key in TYPED_KEYS {
            let old = out.get(key).cloned();
            match (typed.remove(key), old) {
                (Some(value), Some(old)) if !same_value(&old, &value) => {
                    out.insert(key.to_string(), value);
                }
                (Some(_), Some(_)) => {}
                (Some(value), None) => {
                    if key == "name" || !is_implied(key, &value) {
                        out.insert(key.to_string(), value);
                    }
                }
                (None, Some(old)) if !old.is_null() => {
                    out.remove(key);
                }
                (None, _) => {}
            }
        }
        out.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CookieDefinition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stored = Map::<String, Value>::deserialize(deserializer)?;
        let fields: CookieFields =
            serde_json::from_value(Value::Object(stored.clone())).map_err(D::Error::custom)?;

        Ok(Self {
            name: fields.name,
            value: fields.value,
            domain: fields.domain,
            path: fields.path,
            secure: fields.secure,
            http_only: fields.http_only,
            expiration_date: fields.expiration_date,
            same_site: fields.same_site,
            host_only: fields.host_only,
            session: fields.session,
            store_id: fields.store_id,
            stored,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SameSite {
    Unspecified,
    NoRestriction,
    Lax,
    Strict,
}

impl CookieDefinition {
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: default_path(),
            secure: false,
            http_only: false,
            expiration_date: None,
            same_site: None,
            host_only: None,
            session: None,
            store_id: None,
            stored: Map::new(),
        }
    }

    /// Stored attributes this type has no field for (`partitionKey`, ...).
    pub fn extra(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.stored
            .iter()
            .filter(|(key, _)| !TYPED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.as_str(), value))
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn with_expiration(mut self, expiration_date: f64) -> Self {
        self.expiration_date = Some(expiration_date);
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    /// Expiration as a timestamp. Fractional seconds are truncated.
    pub fn expiration_time(&self) -> Option<OffsetDateTime> {
        self.expiration_date
            .filter(|secs| secs.is_finite())
            .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs.trunc() as i64).ok())
    }

    pub fn is_expired(&self, current_time: OffsetDateTime) -> bool {
        match self.expiration_time() {
            Some(expiry) => expiry < current_time,
            None => false,
        }
    }

    /// The `domain` attribute without its leading dot.
    pub fn host(&self) -> &str {
        self.domain.strip_prefix('.').unwrap_or(&self.domain)
    }

    /// URL the cookie is installed against: `https` for secure cookies,
    /// `http` otherwise, on the definition's own domain.
    pub fn install_url(&self) -> Result<Url, ProfileError> {
        let host = self.host();
        if host.is_empty() {
            return Err(ProfileError::invalid_cookie_url(&self.domain));
        }

        let scheme = if self.secure { "https" } else { "http" };
        let raw = format!("{}://{}/", scheme, host);
        Url::parse(&raw).map_err(|_| ProfileError::invalid_cookie_url(raw))
    }
}

/// A write request for a [`CookieSink`](crate::cookies::sink::CookieSink).
///
/// Carries the definition with `hostOnly` and `session` removed: sinks
/// derive both from the other attributes and reject them on write.
#[derive(Debug, Clone, PartialEq)]
pub struct CookieSetRequest {
    url: Url,
    cookie: CookieDefinition,
}

impl CookieSetRequest {
    pub fn from_definition(definition: &CookieDefinition) -> Result<Self, ProfileError> {
        let url = definition.install_url()?;
        let mut cookie = definition.clone();
        cookie.host_only = None;
        cookie.session = None;
        Ok(Self { url, cookie })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn cookie(&self) -> &CookieDefinition {
        &self.cookie
    }

    pub fn into_parts(self) -> (Url, CookieDefinition) {
        (self.url, self.cookie)
    }
}
