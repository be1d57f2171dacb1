//! A single mutable cookie string plus typed read/write helpers.
//!
//! [`CookieJar::assign`] and [`CookieJar::header`] behave like the setter and
//! getter of a browser's `document.cookie`; [`CookieJar::write`] and
//! [`CookieJar::read`] layer value encoding and expiry on top.

use crate::clock::{Clock, SystemClock};
use chrono::{DateTime, Duration, Utc};
use nestkit_core::error::{NestkitError, NestkitResult};
use serde_json::Value;
use std::sync::Arc;

/// `expires=` format, e.g. `Thu, 01 Jan 1970 00:00:00 GMT`.
const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// 9999-12-31T23:59:59Z, the last instant a four-digit HTTP date can carry.
const MAX_EXPIRY_SECS: i64 = 253_402_300_799;

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// Payload written to or read from a cookie.
#[derive(Debug, Clone, PartialEq)]
pub enum CookieValue {
    Text(String),
    Number(f64),
    /// Objects and arrays, stored as JSON text.
    Structured(Value),
}

impl CookieValue {
    /// JSON view of the payload, handy for deep lookup.
    pub fn to_json(&self) -> Value {
        match self {
            CookieValue::Text(s) => Value::String(s.clone()),
            CookieValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            CookieValue::Structured(v) => v.clone(),
        }
    }

    fn encode(&self) -> NestkitResult<String> {
        match self {
            CookieValue::Text(s) => Ok(urlencoding::encode(s).into_owned()),
            CookieValue::Number(n) if n.is_finite() => Ok(format_number(*n)),
            CookieValue::Number(n) => Err(NestkitError::InvalidInput(format!(
                "cookie number must be finite, got {n}"
            ))),
            CookieValue::Structured(v) => {
                let text = serde_json::to_string(v)
                    .map_err(|e| NestkitError::Internal(format!("cookie serialization: {e}")))?;
                Ok(urlencoding::encode(&text).into_owned())
            }
        }
    }

    /// Classifies decoded text: finite number, then JSON object/array, then text.
    fn classify(decoded: String) -> Self {
        let trimmed = decoded.trim();
        if !trimmed.is_empty() {
            if let Ok(n) = trimmed.parse::<f64>() {
                if n.is_finite() {
                    return CookieValue::Number(n);
                }
            }
            if let Ok(v @ (Value::Object(_) | Value::Array(_))) =
                serde_json::from_str::<Value>(trimmed)
            {
                return CookieValue::Structured(v);
            }
        }
        CookieValue::Text(decoded)
    }
}

impl From<&str> for CookieValue {
    fn from(s: &str) -> Self {
        CookieValue::Text(s.to_string())
    }
}

impl From<String> for CookieValue {
    fn from(s: String) -> Self {
        CookieValue::Text(s)
    }
}

impl From<f64> for CookieValue {
    fn from(n: f64) -> Self {
        CookieValue::Number(n)
    }
}

impl From<i64> for CookieValue {
    fn from(n: i64) -> Self {
        CookieValue::Number(n as f64)
    }
}

impl From<Value> for CookieValue {
    fn from(v: Value) -> Self {
        match v {
            Value::String(s) => CookieValue::Text(s),
            Value::Number(n) => CookieValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            other => CookieValue::Structured(other),
        }
    }
}

/// Integral values print without a fractional part.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Cookie lifetime: relative to now, or an absolute instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieAge {
    Relative(Duration),
    ExpiresAt(DateTime<Utc>),
}

// ---------------------------------------------------------------------------
// Jar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StoredCookie {
    name: String,
    value: String,
    expires: Option<DateTime<Utc>>,
}

/// Ordered cookie store. Replacing a cookie keeps its original position.
pub struct CookieJar {
    cookies: Vec<StoredCookie>,
    clock: Arc<dyn Clock>,
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieJar {
    pub fn new() -> Self {
        Self {
            cookies: Vec::new(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Applies one assignment such as `name=value; expires=...; path=/`.
    ///
    /// `max-age` wins over `expires`. An expiry at or before now deletes the
    /// cookie. `path`, `domain`, `secure` and `samesite` are accepted and
    /// ignored. Unparseable dates are ignored with a warning.
    pub fn assign(&mut self, raw: &str) -> NestkitResult<()> {
        let mut parts = raw.split(';');
        let pair = parts.next().unwrap_or_default();
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| NestkitError::Cookie(format!("missing '=' in {pair:?}")))?;
        let name = name.trim();
        validate_name(name)?;

        let now = self.clock.now();
        let mut expires = None;
        let mut max_age = None;

        for attr in parts {
            let (key, val) = attr.split_once('=').unwrap_or((attr, ""));
            let val = val.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "expires" => match DateTime::parse_from_rfc2822(val) {
                    Ok(t) => expires = Some(t.with_timezone(&Utc)),
                    Err(e) => {
                        tracing::warn!(cookie = name, value = val, error = %e, "ignoring bad expires")
                    }
                },
                "max-age" => match val.parse::<i64>() {
                    Ok(secs) => max_age = Some(secs),
                    Err(e) => {
                        tracing::warn!(cookie = name, value = val, error = %e, "ignoring bad max-age")
                    }
                },
                _ => {}
            }
        }

        if let Some(secs) = max_age {
            expires = Some(expiry_after(now, secs));
        }
        let expires = expires.map(clamp_expiry);

        if expires.is_some_and(|t| t <= now) {
            self.cookies.retain(|c| c.name != name);
            tracing::debug!(cookie = name, "cookie deleted");
            return Ok(());
        }

        let cookie = StoredCookie {
            name: name.to_string(),
            value: value.trim().to_string(),
            expires,
        };
        match self.cookies.iter_mut().find(|c| c.name == name) {
            Some(existing) => *existing = cookie,
            None => self.cookies.push(cookie),
        }
        Ok(())
    }

    /// Live cookies rendered as `a=1; b=2`.
    pub fn header(&self) -> String {
        let now = self.clock.now();
        self.cookies
            .iter()
            .filter(|c| is_live(c, now))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Encodes `payload` and stores it under `name` with `path=/`.
    pub fn write(
        &mut self,
        name: &str,
        payload: impl Into<CookieValue>,
        age: Option<CookieAge>,
    ) -> NestkitResult<()> {
        validate_name(name)?;
        let encoded = payload.into().encode()?;

        let mut raw = format!("{name}={encoded}");
        if let Some(age) = age {
            let at = match age {
                CookieAge::Relative(d) => {
                    self.clock.now().checked_add_signed(d).ok_or_else(|| {
                        NestkitError::InvalidInput(format!("cookie age {d} is out of range"))
                    })?
                }
                CookieAge::ExpiresAt(t) => t,
            };
            raw.push_str(&format!("; expires={}", clamp_expiry(at).format(HTTP_DATE)));
        }
        raw.push_str("; path=/");

        self.assign(&raw)
    }

    /// Decoded value of `name`, or `None` if absent or expired.
    pub fn read(&self, name: &str) -> Option<CookieValue> {
        let now = self.clock.now();
        let cookie = self
            .cookies
            .iter()
            .find(|c| c.name == name && is_live(c, now))?;
        let decoded = urlencoding::decode(&cookie.value)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| cookie.value.clone());
        Some(CookieValue::classify(decoded))
    }

    /// Expires `name` immediately.
    pub fn remove(&mut self, name: &str) -> NestkitResult<()> {
        validate_name(name)?;
        self.assign(&format!(
            "{name}=; expires=Thu, 01 Jan 1970 00:00:00 GMT; path=/"
        ))
    }
}

fn max_expiry() -> DateTime<Utc> {
    DateTime::from_timestamp(MAX_EXPIRY_SECS, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Keeps an expiry inside the range an HTTP date can express.
fn clamp_expiry(at: DateTime<Utc>) -> DateTime<Utc> {
    at.clamp(DateTime::<Utc>::default(), max_expiry())
}

/// `now + secs`, saturating at the ends of the cookie date range.
fn expiry_after(now: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
    match Duration::try_seconds(secs).and_then(|d| now.checked_add_signed(d)) {
        Some(at) => at,
        None if secs > 0 => max_expiry(),
        None => DateTime::<Utc>::default(),
    }
}

fn is_live(cookie: &StoredCookie, now: DateTime<Utc>) -> bool {
    cookie.expires.map_or(true, |t| t > now)
}

fn validate_name(name: &str) -> NestkitResult<()> {
    if name.is_empty() {
        return Err(NestkitError::InvalidInput("cookie name must not be empty".into()));
    }
    if name
        .chars()
        .any(|c| matches!(c, '=' | ';' | ',') || c.is_whitespace() || c.is_control())
    {
        return Err(NestkitError::InvalidInput(format!(
            "invalid cookie name {name:?}"
        )));
    }
    Ok(())
}
