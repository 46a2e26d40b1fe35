//! 에러 타입 — 도메인별 에러 정의

/// Tracehound 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum TracehoundError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 필수 필드 누락 — 메시지 형식은 외부 도구가 그대로 파싱합니다
    #[error("{field} is required")]
    MissingField { field: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 채널 전송 실패
    #[error("channel send failed: {0}")]
    ChannelSend(String),

    /// 채널 수신 실패
    #[error("channel receive failed: {0}")]
    ChannelRecv(String),

    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 이미 실행 중
    #[error("pipeline already running")]
    AlreadyRunning,

    /// 실행 중이 아님
    #[error("pipeline not running")]
    NotRunning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_message_is_exact() {
        let err = ConfigError::MissingField {
            field: "log_path".to_owned(),
        };
        assert_eq!(err.to_string(), "log_path is required");
    }

    #[test]
    fn config_error_wraps_into_top_level() {
        let err: TracehoundError = ConfigError::ParseFailed {
            reason: "bad toml".to_owned(),
        }
        .into();
        assert!(matches!(err, TracehoundError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn pipeline_error_display() {
        assert_eq!(
            PipelineError::AlreadyRunning.to_string(),
            "pipeline already running"
        );
        assert!(
            PipelineError::ChannelSend("receiver dropped".to_owned())
                .to_string()
                .contains("receiver dropped")
        );
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: TracehoundError = io.into();
        assert!(matches!(err, TracehoundError::Io(_)));
    }
}
