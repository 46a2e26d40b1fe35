//! 탐지 파이프라인 에러 타입
//!
//! [`DetectorError`]는 탐지 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<DetectorError> for TracehoundError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use tracehound_core::error::{PipelineError, TracehoundError};

/// 탐지 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    /// 로그 파일 열기/읽기 실패
    #[error("tail error: {path}: {reason}")]
    Tail {
        /// 감시 대상 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DetectorError> for TracehoundError {
    fn from(err: DetectorError) -> Self {
        TracehoundError::Pipeline(PipelineError::InitFailed(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_error_display() {
        let err = DetectorError::Tail {
            path: "/var/log/app.log".to_owned(),
            reason: "permission denied".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/var/log/app.log"));
        assert!(msg.contains("permission denied"));
    }

    #[test]
    fn converts_to_tracehound_error() {
        let err = DetectorError::Channel("receiver closed".to_owned());
        let top: TracehoundError = err.into();
        assert!(matches!(top, TracehoundError::Pipeline(_)));
    }
}
