//! 이벤트 시스템 — 모듈 간 통신의 기본 단위
//!
//! 탐지 파이프라인이 생성한 인시던트는 [`IncidentEvent`]로 포장되어
//! `tokio::mpsc` 채널을 통해 전송 파이프라인으로 전달됩니다.
//! [`EventMetadata`]는 발생 시각과 생성 모듈, 추적 ID를 담습니다.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

// --- 모듈명 상수 ---

/// 탐지 파이프라인 모듈명
pub const MODULE_DETECTOR: &str = "detector";
/// 전송 파이프라인 모듈명
pub const MODULE_DISPATCH: &str = "dispatch";

/// 이벤트 메타데이터 — 발생 시각, 생성 모듈, 추적 ID
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// 이벤트 발생 시각 (인시던트의 방출 시각)
    pub timestamp: SystemTime,
    /// 이벤트를 생성한 모듈명
    pub source_module: String,
    /// 추적 ID — 같은 흐름의 로그를 연결합니다
    pub trace_id: String,
}

impl EventMetadata {
    /// 기존 trace_id를 사용하여 새 메타데이터를 생성합니다.
    pub fn new(source_module: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: trace_id.into(),
        }
    }

    /// 새로운 UUID v4 trace_id를 생성하여 메타데이터를 만듭니다.
    pub fn with_new_trace(source_module: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// 재조립된 인시던트 이벤트
///
/// 에러 트레이스 하나와 그 주변 컨텍스트 라인을 담습니다.
/// `error_line`은 항상 `context`의 마지막 라인과 같습니다.
#[derive(Debug, Clone)]
pub struct IncidentEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터 — timestamp는 방출 시각입니다
    pub metadata: EventMetadata,
    /// 트레이스를 종결한 에러 라인
    pub error_line: String,
    /// 인시던트에 포함된 전체 라인 (순서 보존, error_line 포함)
    pub context: Vec<String>,
}

impl IncidentEvent {
    /// 새 인시던트 이벤트를 생성합니다.
    pub fn new(error_line: impl Into<String>, context: Vec<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::with_new_trace(MODULE_DETECTOR),
            error_line: error_line.into(),
            context,
        }
    }
}

impl fmt::Display for IncidentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IncidentEvent[{}] lines={} error={}",
            &self.id[..8.min(self.id.len())],
            self.context.len(),
            self.error_line,
        )
    }
}
