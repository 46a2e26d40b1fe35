//! 파이프라인 오케스트레이션 -- 테일링/재조립의 전체 흐름을 관리합니다.
//!
//! [`DetectorPipeline`]은 core의 [`Pipeline`] trait을 구현하여
//! `tracehound-daemon`에서 다른 모듈과 동일한 생명주기로 관리됩니다.
//!
//! # 내부 아키텍처
//! ```text
//! LogTailer -> TraceReassembler -> mpsc -> downstream (dispatch)
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use tracehound_core::error::{PipelineError, TracehoundError};
use tracehound_core::event::IncidentEvent;
use tracehound_core::pipeline::{HealthStatus, Pipeline};

use crate::config::DetectorConfig;
use crate::error::DetectorError;
use crate::reassembler::TraceReassembler;
use crate::tailer::LogTailer;

/// 파이프라인 실행 상태
#[derive(Debug, Clone, PartialEq, Eq)]
enum PipelineState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// 탐지 파이프라인
///
/// 시작 시 로그 파일을 열어 끝으로 이동하고 (열기 실패는 기동 실패로
/// 전파됩니다), 테일 태스크를 스폰합니다. 태스크가 끝나면 인시던트
/// 송신측이 드롭되어 하위 채널이 닫힙니다.
pub struct DetectorPipeline {
    /// 파이프라인 설정
    config: DetectorConfig,
    /// 현재 상태
    state: PipelineState,
    /// 인시던트 전송 채널 (시작 시 태스크로 이동)
    incident_tx: Option<mpsc::Sender<IncidentEvent>>,
    /// graceful shutdown을 위한 취소 토큰
    cancel: CancellationToken,
    /// 테일 태스크 핸들
    task: Option<tokio::task::JoinHandle<Result<(), DetectorError>>>,
    /// 처리된 라인 카운터 (공유)
    lines_processed: Arc<AtomicU64>,
    /// 방출된 인시던트 카운터 (공유)
    incidents_emitted: Arc<AtomicU64>,
}

impl DetectorPipeline {
    /// 현재 상태를 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            PipelineState::Initialized => "initialized",
            PipelineState::Running => "running",
            PipelineState::Stopped => "stopped",
        }
    }

    /// 처리된 라인 수를 반환합니다.
    pub fn lines_processed(&self) -> u64 {
        self.lines_processed.load(Ordering::Relaxed)
    }

    /// 방출된 인시던트 수를 반환합니다.
    pub fn incidents_emitted(&self) -> u64 {
        self.incidents_emitted.load(Ordering::Relaxed)
    }
}

impl Pipeline for DetectorPipeline {
    async fn start(&mut self) -> Result<(), TracehoundError> {
        if self.state == PipelineState::Running {
            return Err(PipelineError::AlreadyRunning.into());
        }
        if self.state == PipelineState::Stopped {
            // 테일 위치가 소비된 뒤라 재시작을 지원하지 않습니다.
            return Err(PipelineError::InitFailed(
                "detector pipeline is not restartable".to_owned(),
            )
            .into());
        }

        tracing::info!(path = %self.config.log_path, "starting detector pipeline");

        // 1. 파일 열기 — 실패는 기동 실패 (데몬이 종료 코드 1로 끝남)
        let tailer = LogTailer::open(&self.config.log_path, self.config.poll_interval_ms)
            .await
            .map_err(TracehoundError::from)?;

        // 2. 재조립기 준비
        let reassembler = TraceReassembler::new(&self.config);

        // 3. 테일 태스크 스폰
        let tx = self
            .incident_tx
            .take()
            .ok_or(TracehoundError::Pipeline(PipelineError::AlreadyRunning))?;
        let cancel = self.cancel.clone();
        let lines = Arc::clone(&self.lines_processed);
        let incidents = Arc::clone(&self.incidents_emitted);

        let task = tokio::spawn(async move {
            let result = tailer.run(reassembler, tx, cancel, lines, incidents).await;
            if let Err(ref e) = result {
                tracing::error!(error = %e, "tailer terminated with error");
            }
            result
        });

        self.task = Some(task);
        self.state = PipelineState::Running;
        tracing::info!("detector pipeline started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), TracehoundError> {
        if self.state != PipelineState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        tracing::info!("stopping detector pipeline");
        self.cancel.cancel();

        if let Some(task) = self.task.take() {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "tailer exited with error"),
                Err(e) => tracing::warn!(error = %e, "tailer task join failed"),
            }
        }

        self.state = PipelineState::Stopped;
        tracing::info!("detector pipeline stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            PipelineState::Running => match &self.task {
                Some(task) if !task.is_finished() => HealthStatus::Healthy,
                _ => HealthStatus::Unhealthy("tailer terminated".to_owned()),
            },
            PipelineState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            PipelineState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// 탐지 파이프라인 빌더
///
/// 파이프라인을 구성하고 필요한 채널을 생성합니다.
pub struct DetectorPipelineBuilder {
    config: DetectorConfig,
    incident_tx: Option<mpsc::Sender<IncidentEvent>>,
    incident_channel_capacity: usize,
}

impl DetectorPipelineBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: DetectorConfig::default(),
            incident_tx: None,
            incident_channel_capacity: 100,
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: DetectorConfig) -> Self {
        self.config = config;
        self
    }

    /// 외부 인시던트 전송 채널을 설정합니다.
    ///
    /// 설정하지 않으면 빌더가 새 채널을 생성합니다.
    pub fn incident_sender(mut self, tx: mpsc::Sender<IncidentEvent>) -> Self {
        self.incident_tx = Some(tx);
        self
    }

    /// 인시던트 채널 용량을 설정합니다 (외부 채널 미사용 시).
    pub fn incident_channel_capacity(mut self, capacity: usize) -> Self {
        self.incident_channel_capacity = capacity;
        self
    }

    /// 파이프라인을 빌드합니다.
    ///
    /// # Returns
    /// - `DetectorPipeline`: 파이프라인 인스턴스
    /// - `Option<mpsc::Receiver<IncidentEvent>>`: 인시던트 수신 채널
    ///   (외부 incident_sender를 설정한 경우 None)
    pub fn build(
        self,
    ) -> Result<(DetectorPipeline, Option<mpsc::Receiver<IncidentEvent>>), DetectorError> {
        self.config.validate()?;

        let (incident_tx, incident_rx) = if let Some(tx) = self.incident_tx {
            (tx, None)
        } else {
            let (tx, rx) = mpsc::channel(self.incident_channel_capacity);
            (tx, Some(rx))
        };

        let pipeline = DetectorPipeline {
            config: self.config,
            state: PipelineState::Initialized,
            incident_tx: Some(incident_tx),
            cancel: CancellationToken::new(),
            task: None,
            lines_processed: Arc::new(AtomicU64::new(0)),
            incidents_emitted: Arc::new(AtomicU64::new(0)),
        };

        Ok((pipeline, incident_rx))
    }
}

impl Default for DetectorPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builder_creates_pipeline() {
        let config = DetectorConfig {
            log_path: "/tmp/test.log".to_owned(),
            ..Default::default()
        };
        let (pipeline, incident_rx) = DetectorPipelineBuilder::new()
            .config(config)
            .build()
            .unwrap();
        assert_eq!(pipeline.state_name(), "initialized");
        assert!(incident_rx.is_some());
    }

    #[test]
    fn builder_with_external_sender() {
        let config = DetectorConfig {
            log_path: "/tmp/test.log".to_owned(),
            ..Default::default()
        };
        let (tx, _rx) = mpsc::channel(10);
        let (_pipeline, rx) = DetectorPipelineBuilder::new()
            .config(config)
            .incident_sender(tx)
            .build()
            .unwrap();
        assert!(rx.is_none()); // no internal receiver when external sender is provided
    }

    #[test]
    fn builder_with_invalid_config_fails() {
        // log_path가 비어있으므로 빌드 실패
        let result = DetectorPipelineBuilder::new().build();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn start_fails_for_missing_file() {
        let config = DetectorConfig {
            log_path: "/nonexistent/dir/app.log".to_owned(),
            ..Default::default()
        };
        let (mut pipeline, _rx) = DetectorPipelineBuilder::new()
            .config(config)
            .build()
            .unwrap();

        let result = pipeline.start().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn lifecycle_with_real_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pre-existing line").unwrap();
        file.flush().unwrap();

        let config = DetectorConfig {
            log_path: file.path().display().to_string(),
            poll_interval_ms: 10,
            ..Default::default()
        };
        let (mut pipeline, _rx) = DetectorPipelineBuilder::new()
            .config(config)
            .build()
            .unwrap();

        assert!(pipeline.health_check().await.is_unhealthy());

        pipeline.start().await.unwrap();
        assert_eq!(pipeline.state_name(), "running");
        assert!(pipeline.health_check().await.is_healthy());

        // 중복 시작 시 에러
        assert!(pipeline.start().await.is_err());

        pipeline.stop().await.unwrap();
        assert_eq!(pipeline.state_name(), "stopped");
        assert!(pipeline.health_check().await.is_unhealthy());

        // 중복 정지 시 에러
        assert!(pipeline.stop().await.is_err());
    }

    #[tokio::test]
    async fn stop_before_start_fails() {
        let config = DetectorConfig {
            log_path: "/tmp/test.log".to_owned(),
            ..Default::default()
        };
        let (mut pipeline, _rx) = DetectorPipelineBuilder::new()
            .config(config)
            .build()
            .unwrap();
        assert!(pipeline.stop().await.is_err());
    }

    #[tokio::test]
    async fn counters_start_at_zero() {
        let config = DetectorConfig {
            log_path: "/tmp/test.log".to_owned(),
            ..Default::default()
        };
        let (pipeline, _rx) = DetectorPipelineBuilder::new()
            .config(config)
            .build()
            .unwrap();
        assert_eq!(pipeline.lines_processed(), 0);
        assert_eq!(pipeline.incidents_emitted(), 0);
    }
}
