use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;
use serde_json::{json, Value};
use std::env;
use tracing::info;

pub const APNS_HOST_SANDBOX: &str = "https://api.sandbox.push.apple.com";
pub const APNS_HOST_PRODUCTION: &str = "https://api.push.apple.com";

/// What APNs answered for one push. Relayed to callers verbatim; this client
/// never retries.
#[derive(Debug, Clone, Serialize)]
pub struct ApnsResponse {
    pub status_code: u16,
    pub apns_id: Option<String>,
    pub body: String,
}

impl ApnsResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

#[derive(Serialize)]
struct ApnsClaims {
    iss: String,
    iat: i64,
}

pub struct ApnsClient {
    client: reqwest::Client,
    team_id: String,
    key_id: String,
    private_key: EncodingKey,
    bundle_id: String,
    host: &'static str,
}

impl ApnsClient {
    /// Reads APNS_TEAM_ID, APNS_KEY_ID, APNS_P8_KEY_PATH, APNS_BUNDLE_ID and
    /// APNS_ENV (sandbox|production, default sandbox).
    pub fn from_env() -> Result<Self, String> {
        let team_id = env::var("APNS_TEAM_ID").map_err(|_| "APNS_TEAM_ID not set".to_string())?;
        let key_id = env::var("APNS_KEY_ID").map_err(|_| "APNS_KEY_ID not set".to_string())?;
        let key_path =
            env::var("APNS_P8_KEY_PATH").map_err(|_| "APNS_P8_KEY_PATH not set".to_string())?;
        let bundle_id =
            env::var("APNS_BUNDLE_ID").map_err(|_| "APNS_BUNDLE_ID not set".to_string())?;

        let pem = std::fs::read(&key_path)
            .map_err(|e| format!("failed to read APNs key {}: {}", key_path, e))?;
        let private_key = EncodingKey::from_ec_pem(&pem)
            .map_err(|e| format!("invalid APNs .p8 key {}: {}", key_path, e))?;

        let host = match env::var("APNS_ENV").as_deref() {
            Ok("production") => APNS_HOST_PRODUCTION,
            _ => APNS_HOST_SANDBOX,
        };

        info!("APNs client ready: host={}, bundle_id={}", host, bundle_id);

        Ok(Self {
            client: reqwest::Client::new(),
            team_id,
            key_id,
            private_key,
            bundle_id,
            host,
        })
    }

    pub fn bundle_id(&self) -> &str {
        &self.bundle_id
    }

    pub fn host(&self) -> &str {
        self.host
    }

    /// VoIP topic is the bundle id with a fixed suffix.
    pub fn voip_topic(&self) -> String {
        format!("{}.voip", self.bundle_id)
    }

    // Signed fresh for every push. Apple accepts a token for up to an hour,
    // so a cache would only save a signature, not change correctness.
    fn auth_token(&self) -> Result<String, String> {
        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.key_id.clone());
        let claims = ApnsClaims {
            iss: self.team_id.clone(),
            iat: chrono::Utc::now().timestamp(),
        };
        jsonwebtoken::encode(&header, &claims, &self.private_key)
            .map_err(|e| format!("failed to sign APNs token: {}", e))
    }

    /// Silent wake push: no alert UI, content-available only. The device is
    /// expected to call back for its assistant config.
    pub async fn send_voip_push(
        &self,
        device_token: &str,
        data: Value,
    ) -> Result<ApnsResponse, String> {
        self.post(device_token, &self.voip_topic(), "voip", voip_payload(data))
            .await
    }

    /// User-visible alert push.
    pub async fn send_alert_push(
        &self,
        device_token: &str,
        title: &str,
        body: &str,
    ) -> Result<ApnsResponse, String> {
        self.post(device_token, &self.bundle_id, "alert", alert_payload(title, body))
            .await
    }

    async fn post(
        &self,
        device_token: &str,
        topic: &str,
        push_type: &str,
        payload: Value,
    ) -> Result<ApnsResponse, String> {
        let token = self.auth_token()?;
        let url = format!("{}/3/device/{}", self.host, device_token);

        // APNs only speaks HTTP/2; reqwest negotiates it via ALPN.
        let resp = self
            .client
            .post(&url)
            .header("authorization", format!("bearer {}", token))
            .header("apns-topic", topic)
            .header("apns-push-type", push_type)
            .header("apns-priority", "10")
            .json(&payload)
            .send()
            .await
            .map_err(|e| format!("APNs request failed: {}", e))?;

        let status_code = resp.status().as_u16();
        let apns_id = resp
            .headers()
            .get("apns-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = resp.text().await.unwrap_or_default();

        Ok(ApnsResponse {
            status_code,
            apns_id,
            body,
        })
    }
}

pub fn voip_payload(data: Value) -> Value {
    json!({
        "aps": {
            "content-available": 1
        },
        "data": data
    })
}

pub fn alert_payload(title: &str, body: &str) -> Value {
    json!({
        "aps": {
            "alert": {
                "title": title,
                "body": body,
            },
            "sound": "default",
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voip_payload_is_silent_wake() {
        let payload = voip_payload(json!({"elder_id": 7, "elder_name": "김순자"}));
        assert_eq!(payload["aps"]["content-available"], 1);
        assert!(payload["aps"].get("alert").is_none());
        assert_eq!(payload["data"]["elder_id"], 7);
    }

    #[test]
    fn alert_payload_carries_title_body_and_sound() {
        let payload = alert_payload("안부 전화", "오늘 통화가 예정되어 있어요");
        assert_eq!(payload["aps"]["alert"]["title"], "안부 전화");
        assert_eq!(payload["aps"]["alert"]["body"], "오늘 통화가 예정되어 있어요");
        assert_eq!(payload["aps"]["sound"], "default");
        assert!(payload["aps"].get("content-available").is_none());
    }

    #[test]
    fn success_window_is_2xx() {
        let ok = ApnsResponse {
            status_code: 200,
            apns_id: None,
            body: String::new(),
        };
        let gone = ApnsResponse {
            status_code: 410,
            apns_id: None,
            body: r#"{"reason":"Unregistered"}"#.to_string(),
        };
        assert!(ok.is_success());
        assert!(!gone.is_success());
    }
}
