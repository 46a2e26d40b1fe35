//! 전송 설정
//!
//! [`DispatchConfig`]는 core의 [`DeliveryConfig`](tracehound_core::config::DeliveryConfig)를
//! 기반으로 전송 전용 튜닝 값을 제공합니다.

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// 전송 설정
///
/// core의 `DeliveryConfig`에서 파생되며, 전송 파이프라인 내부에서
/// 사용하는 추가 설정을 포함합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// 수집 엔드포인트 URL
    pub server_url: String,
    /// 페이로드에 포함할 저장소 식별자
    pub repo_url: String,

    // --- 확장 설정 (core에 없는 추가 필드) ---
    /// HTTP 요청 전체 타임아웃 (초)
    pub http_timeout_secs: u64,
    /// 같은 인시던트의 재전송을 억제하는 쿨다운 (초)
    pub cooldown_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            repo_url: String::new(),
            http_timeout_secs: 5,
            cooldown_secs: 30,
        }
    }
}

impl DispatchConfig {
    /// core의 `DeliveryConfig`에서 전송 설정을 생성합니다.
    ///
    /// core 설정에 없는 확장 필드는 기본값이 적용됩니다.
    pub fn from_core(core: &tracehound_core::config::DeliveryConfig) -> Self {
        Self {
            server_url: core.server_url.clone(),
            repo_url: core.repo_url.clone(),
            ..Self::default()
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), DispatchError> {
        const MAX_HTTP_TIMEOUT_SECS: u64 = 300;
        const MAX_COOLDOWN_SECS: u64 = 86_400;

        if self.server_url.is_empty() {
            return Err(DispatchError::Config {
                field: "server_url".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if !self.server_url.starts_with("http://") && !self.server_url.starts_with("https://") {
            return Err(DispatchError::Config {
                field: "server_url".to_owned(),
                reason: "must be an http:// or https:// URL".to_owned(),
            });
        }

        // 수집 라우트 경로까지 포함해야 함 (호스트만으로는 불충분)
        let without_scheme = self
            .server_url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or("");
        match without_scheme.split_once('/') {
            Some((_, path)) if !path.is_empty() => {}
            _ => {
                return Err(DispatchError::Config {
                    field: "server_url".to_owned(),
                    reason: "must include the ingestion route path".to_owned(),
                });
            }
        }

        if self.repo_url.is_empty() {
            return Err(DispatchError::Config {
                field: "repo_url".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.http_timeout_secs == 0 || self.http_timeout_secs > MAX_HTTP_TIMEOUT_SECS {
            return Err(DispatchError::Config {
                field: "http_timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_HTTP_TIMEOUT_SECS}"),
            });
        }

        if self.cooldown_secs == 0 || self.cooldown_secs > MAX_COOLDOWN_SECS {
            return Err(DispatchError::Config {
                field: "cooldown_secs".to_owned(),
                reason: format!("must be 1-{MAX_COOLDOWN_SECS}"),
            });
        }

        Ok(())
    }
}

/// 전송 설정 빌더
#[derive(Default)]
pub struct DispatchConfigBuilder {
    config: DispatchConfig,
}

impl DispatchConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 수집 엔드포인트 URL을 설정합니다.
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server_url = url.into();
        self
    }

    /// 저장소 식별자를 설정합니다.
    pub fn repo_url(mut self, url: impl Into<String>) -> Self {
        self.config.repo_url = url.into();
        self
    }

    /// HTTP 타임아웃(초)을 설정합니다.
    pub fn http_timeout_secs(mut self, secs: u64) -> Self {
        self.config.http_timeout_secs = secs;
        self
    }

    /// 중복 억제 쿨다운(초)을 설정합니다.
    pub fn cooldown_secs(mut self, secs: u64) -> Self {
        self.config.cooldown_secs = secs;
        self
    }

    /// 설정을 검증하고 `DispatchConfig`를 생성합니다.
    pub fn build(self) -> Result<DispatchConfig, DispatchError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> DispatchConfig {
        DispatchConfig {
            server_url: "http://localhost:3000/api/webhook".to_owned(),
            repo_url: "https://github.com/acme/app".to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn default_tuning_values() {
        let config = DispatchConfig::default();
        assert_eq!(config.http_timeout_secs, 5);
        assert_eq!(config.cooldown_secs, 30);
    }

    #[test]
    fn valid_config_passes() {
        valid_config().validate().unwrap();
    }

    #[test]
    fn from_core_preserves_urls() {
        let core = tracehound_core::config::DeliveryConfig {
            server_url: "https://ingest.example.com/api/webhook".to_owned(),
            repo_url: "https://github.com/acme/app".to_owned(),
        };
        let config = DispatchConfig::from_core(&core);
        assert_eq!(config.server_url, "https://ingest.example.com/api/webhook");
        // 확장 필드는 기본값
        assert_eq!(config.cooldown_secs, 30);
    }

    #[test]
    fn validate_rejects_empty_server_url() {
        let mut config = valid_config();
        config.server_url.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_http_scheme() {
        let mut config = valid_config();
        config.server_url = "file:///tmp/ingest".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_missing_route_path() {
        for url in ["http://localhost:3000", "http://localhost:3000/"] {
            let mut config = valid_config();
            config.server_url = url.to_owned();
            assert!(
                config.validate().is_err(),
                "url without route path should be rejected: {url}"
            );
        }
    }

    #[test]
    fn validate_rejects_zero_cooldown() {
        let mut config = valid_config();
        config.cooldown_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn builder_creates_valid_config() {
        let config = DispatchConfigBuilder::new()
            .server_url("http://localhost:3000/api/webhook")
            .repo_url("https://github.com/acme/app")
            .cooldown_secs(1)
            .build()
            .unwrap();
        assert_eq!(config.cooldown_secs, 1);
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let result = DispatchConfigBuilder::new()
            .server_url("http://localhost:3000/api/webhook")
            .build();
        assert!(result.is_err()); // repo_url missing
    }
}
