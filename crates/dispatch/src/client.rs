//! 수집 엔드포인트 클라이언트 -- 인시던트의 JSON POST 전송
//!
//! [`IngestClient`]는 인시던트를 고정된 와이어 스키마로 직렬화해
//! 설정된 URL로 전송합니다. 재시도는 없습니다. 2xx 이외의 응답은
//! [`DispatchError::ServerStatus`]로 보고됩니다.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use tracehound_core::event::IncidentEvent;

use crate::error::DispatchError;

/// 인시던트 와이어 페이로드
///
/// 필드명은 수집 서버와의 계약입니다. 변경하지 마세요.
#[derive(Debug, Serialize)]
pub struct IncidentPayload {
    /// 트레이스를 종결한 에러 라인
    pub error_line: String,
    /// 방출 시각 (RFC3339, UTC)
    pub timestamp: String,
    /// 감시 호스트 식별자
    pub hostname: String,
    /// 저장소 식별자 (비어있으면 생략)
    #[serde(skip_serializing_if = "String::is_empty")]
    pub repo_url: String,
    /// 인시던트 전체 라인 (순서 보존)
    pub context: Vec<String>,
}

/// 수집 엔드포인트 클라이언트
pub struct IngestClient {
    /// 수집 엔드포인트 URL
    server_url: String,
    /// 페이로드에 포함할 저장소 식별자
    repo_url: String,
    /// 감시 호스트 식별자
    hostname: String,
    /// 재사용되는 HTTP 클라이언트
    http: reqwest::Client,
}

impl IngestClient {
    /// 새 클라이언트를 생성합니다.
    pub fn new(
        server_url: impl Into<String>,
        repo_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DispatchError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            server_url: server_url.into(),
            repo_url: repo_url.into(),
            hostname: resolve_hostname(),
            http,
        })
    }

    /// 인시던트를 수집 엔드포인트로 전송합니다.
    ///
    /// 성공은 2xx 응답뿐입니다. 그 외 상태와 네트워크 오류는 에러로
    /// 반환되며, 호출 측은 로깅 후 다음 인시던트로 진행합니다.
    pub async fn send(&self, event: &IncidentEvent) -> Result<(), DispatchError> {
        let payload = self.payload_for(event);

        let response = self
            .http
            .post(&self.server_url)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::ServerStatus {
                code: status.as_u16(),
            });
        }

        Ok(())
    }

    /// 인시던트를 와이어 페이로드로 변환합니다.
    pub fn payload_for(&self, event: &IncidentEvent) -> IncidentPayload {
        let emitted_at: DateTime<Utc> = event.metadata.timestamp.into();

        IncidentPayload {
            error_line: event.error_line.clone(),
            timestamp: emitted_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            hostname: self.hostname.clone(),
            repo_url: self.repo_url.clone(),
            context: event.context.clone(),
        }
    }

    /// 감시 호스트 식별자를 반환합니다.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// 수집 엔드포인트 URL을 반환합니다.
    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}

/// 호스트명을 결정합니다.
///
/// 환경 변수, `/etc/hostname` 순으로 시도하고 모두 실패하면 "unknown".
fn resolve_hostname() -> String {
    if let Ok(name) = std::env::var("HOSTNAME")
        && !name.trim().is_empty()
    {
        return name.trim().to_owned();
    }

    if let Ok(name) = std::fs::read_to_string("/etc/hostname")
        && !name.trim().is_empty()
    {
        return name.trim().to_owned();
    }

    "unknown".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> IngestClient {
        IngestClient::new(
            "http://localhost:3000/api/webhook",
            "https://github.com/acme/app",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn sample_event() -> IncidentEvent {
        IncidentEvent::new(
            "ZeroDivisionError: division by zero",
            vec![
                "Traceback (most recent call last):".to_owned(),
                "    return a / b".to_owned(),
                "ZeroDivisionError: division by zero".to_owned(),
            ],
        )
    }

    #[test]
    fn hostname_is_never_empty() {
        let client = client();
        assert!(!client.hostname().is_empty());
    }

    #[test]
    fn payload_uses_exact_wire_field_names() {
        let payload = client().payload_for(&sample_event());
        let json = serde_json::to_value(&payload).unwrap();

        assert!(json.get("error_line").is_some());
        assert!(json.get("timestamp").is_some());
        assert!(json.get("hostname").is_some());
        assert!(json.get("repo_url").is_some());
        assert!(json.get("context").is_some());
        assert_eq!(
            json["error_line"].as_str().unwrap(),
            "ZeroDivisionError: division by zero"
        );
        assert_eq!(json["context"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn payload_timestamp_is_rfc3339_utc() {
        let payload = client().payload_for(&sample_event());
        assert!(payload.timestamp.ends_with('Z'));
        // 파싱 가능해야 함
        let parsed: DateTime<Utc> = payload.timestamp.parse().unwrap();
        assert!(parsed <= Utc::now());
    }

    #[test]
    fn empty_repo_url_is_omitted_from_wire() {
        let client = IngestClient::new(
            "http://localhost:3000/api/webhook",
            "",
            Duration::from_secs(5),
        )
        .unwrap();
        let json = serde_json::to_value(client.payload_for(&sample_event())).unwrap();
        assert!(json.get("repo_url").is_none());
    }

    #[test]
    fn context_preserves_order_and_indentation() {
        let payload = client().payload_for(&sample_event());
        assert_eq!(payload.context[0], "Traceback (most recent call last):");
        assert_eq!(payload.context[1], "    return a / b");
    }

    #[tokio::test]
    async fn send_to_unreachable_server_is_http_error() {
        let client = IngestClient::new(
            // 예약 포트: 아무도 리슨하지 않음
            "http://127.0.0.1:1/api/webhook",
            "https://github.com/acme/app",
            Duration::from_millis(500),
        )
        .unwrap();

        let err = client.send(&sample_event()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Http(_)));
    }
}
