//! Blocking HTTP client adapter.
//!
//! Implements [`HttpPort`] for the one-shot registration request.
//!
//! - **`target_os = "espidf"`**: `EspHttpConnection` with the ESP-IDF
//!   certificate bundle attached, so `https://` endpoints work.
//! - **other targets**: a canned reply set with [`HttpClient::sim_set_reply`].

use log::debug;

use crate::app::ports::{HttpError, HttpPort, HttpResponse};

/// Response bodies are ids; anything longer is cut.
const MAX_BODY_LEN: usize = 256;

pub struct HttpClient {
    #[cfg(not(target_os = "espidf"))]
    sim_reply: Result<HttpResponse, HttpError>,
    #[cfg(not(target_os = "espidf"))]
    sim_requests: Vec<(String, Vec<u8>)>,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            sim_reply: Err(HttpError::Connect),
            #[cfg(not(target_os = "espidf"))]
            sim_requests: Vec::new(),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_reply(&mut self, reply: Result<HttpResponse, HttpError>) {
        self.sim_reply = reply;
    }

    /// Simulation: every request seen so far, as `(url, body)`.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_requests(&self) -> &[(String, Vec<u8>)] {
        &self.sim_requests
    }

    #[cfg(target_os = "espidf")]
    fn platform_post(
        &mut self,
        url: &str,
        body: &[u8],
        timeout_ms: u32,
    ) -> Result<HttpResponse, HttpError> {
        use core::time::Duration;
        use esp_idf_svc::http::Method;
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

        let config = Configuration {
            timeout: Some(Duration::from_millis(u64::from(timeout_ms))),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        };
        let mut conn = EspHttpConnection::new(&config).map_err(|_| HttpError::Connect)?;

        let len = body.len().to_string();
        let headers = [("Content-Type", "application/json"), ("Content-Length", len.as_str())];
        conn.initiate_request(Method::Post, url, &headers)
            .map_err(|_| HttpError::Connect)?;

        let mut written = 0;
        while written < body.len() {
            let n = conn.write(&body[written..]).map_err(|_| HttpError::Io)?;
            if n == 0 {
                return Err(HttpError::Io);
            }
            written += n;
        }

        conn.initiate_response().map_err(|_| HttpError::Timeout)?;
        let status = conn.status();

        let mut raw = Vec::with_capacity(64);
        let mut chunk = [0u8; 64];
        loop {
            let n = conn.read(&mut chunk).map_err(|_| HttpError::Io)?;
            if n == 0 {
                break;
            }
            let room = MAX_BODY_LEN.saturating_sub(raw.len());
            raw.extend_from_slice(&chunk[..n.min(room)]);
            if room <= n {
                break;
            }
        }

        Ok(HttpResponse {
            status,
            body: String::from_utf8_lossy(&raw).into_owned(),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_post(
        &mut self,
        url: &str,
        body: &[u8],
        _timeout_ms: u32,
    ) -> Result<HttpResponse, HttpError> {
        self.sim_requests.push((url.to_string(), body.to_vec()));
        self.sim_reply.clone().map(|mut r| {
            r.body.truncate(MAX_BODY_LEN);
            r
        })
    }
}

impl HttpPort for HttpClient {
    fn post_json(
        &mut self,
        url: &str,
        body: &[u8],
        timeout_ms: u32,
    ) -> Result<HttpResponse, HttpError> {
        debug!("HTTP: POST {} ({} bytes)", url, body.len());
        let resp = self.platform_post(url, body, timeout_ms)?;
        debug!("HTTP: {} ({} bytes)", resp.status, resp.body.len());
        Ok(resp)
    }
}
