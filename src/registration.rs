//! One-shot identity registration over HTTP.
//!
//! `POST {"secretWord": "<secret>"}` to the registration endpoint.  The
//! backend answers `201 Created` with the new id as the whole body, e.g.
//! `42` or `"42"`.  Every other outcome is a [`RegistrationError`]; the
//! caller retries on its own cadence.

use log::{info, warn};
use serde::Serialize;

use crate::app::ports::{HttpError, HttpPort};
use crate::error::RegistrationError;
use crate::identity::DeviceId;

const STATUS_CREATED: u16 = 201;

#[derive(Serialize)]
struct RegisterRequest<'a> {
    #[serde(rename = "secretWord")]
    secret_word: &'a str,
}

pub struct RegistrationClient<H> {
    http: H,
    url: heapless::String<128>,
    timeout_ms: u32,
}

impl<H: HttpPort> RegistrationClient<H> {
    pub fn new(http: H, url: &str, timeout_ms: u32) -> Self {
        let mut u = heapless::String::new();
        if u.push_str(url).is_err() {
            warn!(
                "Registration: endpoint URL over {} bytes, endpoint left empty",
                u.capacity()
            );
        }
        Self {
            http,
            url: u,
            timeout_ms,
        }
    }

    /// Perform one registration exchange.
    pub fn register(&mut self, secret: &str) -> Result<DeviceId, RegistrationError> {
        let body = serde_json::to_vec(&RegisterRequest {
            secret_word: secret,
        })
        .map_err(|_| RegistrationError::Encode)?;

        let resp = self
            .http
            .post_json(&self.url, &body, self.timeout_ms)
            .map_err(|e: HttpError| {
                warn!("Registration: request failed ({})", e);
                RegistrationError::Transport
            })?;

        if resp.status != STATUS_CREATED {
            warn!("Registration: unexpected status {}", resp.status);
            return Err(RegistrationError::UnexpectedStatus(resp.status));
        }

        let id = parse_id(&resp.body).ok_or_else(|| {
            warn!("Registration: malformed body {:?}", resp.body);
            RegistrationError::MalformedBody
        })?;
        info!("Registration: backend assigned id {}", id);
        Ok(id)
    }

    pub fn http(&self) -> &H {
        &self.http
    }

    pub fn http_mut(&mut self) -> &mut H {
        &mut self.http
    }
}

/// Decimal id, surrounding whitespace and one pair of quotes tolerated.
fn parse_id(body: &str) -> Option<DeviceId> {
    let trimmed = body.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
        .trim();
    unquoted.parse::<i64>().ok().and_then(DeviceId::from_raw)
}
