//! 전송 파이프라인 에러 타입

use tracehound_core::error::{PipelineError, TracehoundError};

/// 전송 파이프라인 도메인 에러
///
/// 전송 실패는 파이프라인을 중단시키지 않습니다. 로깅 후 다음
/// 인시던트로 진행하며, 억제 상태도 변경하지 않습니다.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// HTTP 요청 실패 (연결, 타임아웃 등)
    #[error("send failed: {0}")]
    Http(#[from] reqwest::Error),

    /// 서버가 2xx 이외의 상태를 반환함
    #[error("server returned {code}")]
    ServerStatus {
        /// HTTP 상태 코드
        code: u16,
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
}

impl From<DispatchError> for TracehoundError {
    fn from(err: DispatchError) -> Self {
        TracehoundError::Pipeline(PipelineError::InitFailed(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_status_display_matches_diagnostic_format() {
        let err = DispatchError::ServerStatus { code: 503 };
        assert_eq!(err.to_string(), "server returned 503");
    }

    #[test]
    fn config_error_display() {
        let err = DispatchError::Config {
            field: "server_url".to_owned(),
            reason: "must not be empty".to_owned(),
        };
        assert!(err.to_string().contains("server_url"));
    }

    #[test]
    fn converts_to_tracehound_error() {
        let err = DispatchError::Channel("sender dropped".to_owned());
        let top: TracehoundError = err.into();
        assert!(matches!(top, TracehoundError::Pipeline(_)));
    }
}
