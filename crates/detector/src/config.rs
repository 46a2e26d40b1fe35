//! 탐지기 설정
//!
//! [`DetectorConfig`]는 core의 [`WatcherConfig`](tracehound_core::config::WatcherConfig)를
//! 기반으로 탐지기 전용 튜닝 값을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use tracehound_core::config::TracehoundConfig;
//! use tracehound_detector::config::DetectorConfig;
//!
//! let core_config = TracehoundConfig::default();
//! let config = DetectorConfig::from_core(&core_config.watcher);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::DetectorError;

/// 탐지기 설정
///
/// core의 `WatcherConfig`에서 파생되며, 탐지기 내부에서
/// 사용하는 추가 설정을 포함합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// 감시할 로그 파일 경로
    pub log_path: String,

    // --- 확장 설정 (core에 없는 추가 필드) ---
    /// 롤링 컨텍스트 버퍼 용량 (라인 수)
    pub buffer_size: usize,
    /// 트레이스 시작점 역방향 탐색 범위 (라인 수)
    pub context_backscan: usize,
    /// 트레이스 종결 타임아웃 (밀리초)
    pub trace_timeout_ms: u64,
    /// EOF 도달 시 재시도 간격 (밀리초)
    pub poll_interval_ms: u64,
    /// 단일 트레이스 최대 라인 수 — 도달 시 즉시 인시던트를 확정합니다
    pub max_trace_lines: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            log_path: String::new(),
            buffer_size: 50,
            context_backscan: 10,
            trace_timeout_ms: 300,
            poll_interval_ms: 50,
            max_trace_lines: 500,
        }
    }
}

impl DetectorConfig {
    /// core의 `WatcherConfig`에서 탐지기 설정을 생성합니다.
    ///
    /// core 설정에 없는 확장 필드는 기본값이 적용됩니다.
    pub fn from_core(core: &tracehound_core::config::WatcherConfig) -> Self {
        Self {
            log_path: core.log_path.clone(),
            ..Self::default()
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), DetectorError> {
        const MAX_BUFFER_SIZE: usize = 10_000;
        const MAX_TRACE_TIMEOUT_MS: u64 = 60_000;
        const MAX_POLL_INTERVAL_MS: u64 = 10_000;

        if self.log_path.is_empty() {
            return Err(DetectorError::Config {
                field: "log_path".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.buffer_size == 0 || self.buffer_size > MAX_BUFFER_SIZE {
            return Err(DetectorError::Config {
                field: "buffer_size".to_owned(),
                reason: format!("must be 1-{MAX_BUFFER_SIZE}"),
            });
        }

        if self.context_backscan == 0 || self.context_backscan > self.buffer_size {
            return Err(DetectorError::Config {
                field: "context_backscan".to_owned(),
                reason: format!("must be 1-{} (buffer_size)", self.buffer_size),
            });
        }

        if self.trace_timeout_ms == 0 || self.trace_timeout_ms > MAX_TRACE_TIMEOUT_MS {
            return Err(DetectorError::Config {
                field: "trace_timeout_ms".to_owned(),
                reason: format!("must be 1-{MAX_TRACE_TIMEOUT_MS}"),
            });
        }

        if self.poll_interval_ms == 0 || self.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            return Err(DetectorError::Config {
                field: "poll_interval_ms".to_owned(),
                reason: format!("must be 1-{MAX_POLL_INTERVAL_MS}"),
            });
        }

        if self.max_trace_lines < self.context_backscan {
            return Err(DetectorError::Config {
                field: "max_trace_lines".to_owned(),
                reason: "must be at least context_backscan".to_owned(),
            });
        }

        Ok(())
    }
}

/// 탐지기 설정 빌더
#[derive(Default)]
pub struct DetectorConfigBuilder {
    config: DetectorConfig,
}

impl DetectorConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 감시할 로그 파일 경로를 설정합니다.
    pub fn log_path(mut self, path: impl Into<String>) -> Self {
        self.config.log_path = path.into();
        self
    }

    /// 롤링 버퍼 용량을 설정합니다.
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size;
        self
    }

    /// 트레이스 시작점 역방향 탐색 범위를 설정합니다.
    pub fn context_backscan(mut self, lines: usize) -> Self {
        self.config.context_backscan = lines;
        self
    }

    /// 트레이스 종결 타임아웃(밀리초)을 설정합니다.
    pub fn trace_timeout_ms(mut self, ms: u64) -> Self {
        self.config.trace_timeout_ms = ms;
        self
    }

    /// EOF 재시도 간격(밀리초)을 설정합니다.
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// 단일 트레이스 최대 라인 수를 설정합니다.
    pub fn max_trace_lines(mut self, lines: usize) -> Self {
        self.config.max_trace_lines = lines;
        self
    }

    /// 설정을 검증하고 `DetectorConfig`를 생성합니다.
    pub fn build(self) -> Result<DetectorConfig, DetectorError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
