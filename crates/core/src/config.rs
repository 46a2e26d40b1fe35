//! 설정 관리 — tracehound.toml 파싱 및 검증
//!
//! 설정 파일은 외부 도구(설치 스크립트, 대화형 셋업)가 생성하며,
//! 데몬은 이 모듈을 통해 검증된 설정 레코드만 전달받습니다.
//! 필수 필드가 비어 있으면 `"{field} is required"` 메시지로 기동이 실패합니다.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tracehound 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TracehoundConfig {
    /// 일반 설정
    pub general: GeneralConfig,
    /// 로그 감시 설정
    pub watcher: WatcherConfig,
    /// 인시던트 전송 설정
    pub delivery: DeliveryConfig,
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 로그 감시 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// 감시할 로그 파일 경로 (필수)
    pub log_path: String,
}

/// 인시던트 전송 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// 수집 엔드포인트 URL (필수, http/https)
    pub server_url: String,
    /// 페이로드에 포함할 저장소 식별자 (필수)
    pub repo_url: String,
}

impl TracehoundConfig {
    /// 설정 파일을 읽고 파싱한 뒤 검증합니다.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::FileNotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&raw).map_err(|e| ConfigError::ParseFailed {
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 필수 필드 누락은 `MissingField`로, 형식 오류는 `InvalidValue`로 보고합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.watcher.log_path.is_empty() {
            return Err(ConfigError::MissingField {
                field: "log_path".to_owned(),
            });
        }

        if self.delivery.server_url.is_empty() {
            return Err(ConfigError::MissingField {
                field: "server_url".to_owned(),
            });
        }

        if self.delivery.repo_url.is_empty() {
            return Err(ConfigError::MissingField {
                field: "repo_url".to_owned(),
            });
        }

        if !self.delivery.server_url.starts_with("http://")
            && !self.delivery.server_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue {
                field: "server_url".to_owned(),
                reason: "must be an http:// or https:// URL".to_owned(),
            });
        }

        // 수집 라우트 경로까지 포함해야 함 (호스트만으로는 불충분)
        let without_scheme = self
            .delivery
            .server_url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or("");
        match without_scheme.split_once('/') {
            Some((_, path)) if !path.is_empty() => {}
            _ => {
                return Err(ConfigError::InvalidValue {
                    field: "server_url".to_owned(),
                    reason: "must include the ingestion route path".to_owned(),
                });
            }
        }

        match self.general.log_format.as_str() {
            "json" | "pretty" => {}
            other => {
                return Err(ConfigError::InvalidValue {
                    field: "log_format".to_owned(),
                    reason: format!("unknown format '{other}', expected 'json' or 'pretty'"),
                });
            }
        }

        Ok(())
    }
}
