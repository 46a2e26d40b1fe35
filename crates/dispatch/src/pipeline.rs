//! 파이프라인 오케스트레이션 -- 인시던트 소비/억제/전송 흐름을 관리합니다.
//!
//! [`DispatchPipeline`]은 core의 [`Pipeline`] trait을 구현하여
//! `tracehound-daemon`에서 다른 모듈과 동일한 생명주기로 관리됩니다.
//!
//! # 전송 규율
//! - 전송은 순차적입니다 (병렬 POST 없음). 인시던트 순서가 보존되고
//!   억제 상태 접근이 경합 없이 단순해집니다.
//! - 종료 신호는 업스트림에서 옵니다: 탐지기가 멈추면 송신측이 드롭되어
//!   채널이 닫히고, 큐에 남은 인시던트를 모두 드레인한 뒤 종료합니다.
//!   전체 대기 시간은 데몬의 shutdown grace가 제한합니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, mpsc};

use tracehound_core::error::{PipelineError, TracehoundError};
use tracehound_core::event::IncidentEvent;
use tracehound_core::pipeline::{HealthStatus, Pipeline};

use crate::client::IngestClient;
use crate::config::DispatchConfig;
use crate::dedup::DuplicateSuppressor;
use crate::error::DispatchError;

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

/// 전송 파이프라인
pub struct DispatchPipeline {
    /// 파이프라인 설정
    config: DispatchConfig,
    /// 현재 상태
    state: PipelineState,
    /// 인시던트 수신 채널 (시작 시 태스크로 이동)
    incident_rx: Option<mpsc::Receiver<IncidentEvent>>,
    /// 수집 엔드포인트 클라이언트 (공유)
    client: Arc<IngestClient>,
    /// 중복 억제기 (공유 — 전송 태스크만 변경)
    suppressor: Arc<Mutex<DuplicateSuppressor>>,
    /// 전송 태스크 핸들
    task: Option<tokio::task::JoinHandle<()>>,
    /// 전송 성공 카운터 (공유)
    delivered_count: Arc<AtomicU64>,
    /// 전송 실패 카운터 (공유)
    failed_count: Arc<AtomicU64>,
}

impl DispatchPipeline {
    /// 현재 상태를 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            PipelineState::Initialized => "initialized",
            PipelineState::Running => "running",
            PipelineState::Stopped => "stopped",
        }
    }

    /// 전송 성공한 인시던트 수를 반환합니다.
    pub fn delivered_count(&self) -> u64 {
        self.delivered_count.load(Ordering::Relaxed)
    }

    /// 전송 실패한 인시던트 수를 반환합니다.
    pub fn failed_count(&self) -> u64 {
        self.failed_count.load(Ordering::Relaxed)
    }

    /// 억제된 인시던트 수를 반환합니다.
    pub async fn suppressed_count(&self) -> u64 {
        self.suppressor.lock().await.suppressed_count()
    }

    /// 인시던트 하나를 억제 판별 후 전송합니다.
    ///
    /// 억제 상태는 2xx 응답을 받았을 때만 갱신됩니다. 전송 실패가
    /// 억제 상태를 남기면 다음 재발이 조용히 묻히기 때문입니다.
    async fn process(
        client: &IngestClient,
        suppressor: &Mutex<DuplicateSuppressor>,
        delivered: &AtomicU64,
        failed: &AtomicU64,
        event: IncidentEvent,
    ) {
        let hash = DuplicateSuppressor::fingerprint(&event);
        let now = Instant::now();

        {
            let mut guard = suppressor.lock().await;
            if guard.is_duplicate(&hash, now) {
                guard.mark_suppressed();
                tracing::warn!(
                    event_id = %event.id,
                    hash = %hash,
                    "skipping duplicate incident within cooldown"
                );
                return;
            }
        }

        match client.send(&event).await {
            Ok(()) => {
                suppressor.lock().await.record(hash, now);
                delivered.fetch_add(1, Ordering::Relaxed);
                tracing::info!(
                    event_id = %event.id,
                    error_line = %event.error_line,
                    "incident delivered"
                );
            }
            Err(e) => {
                failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    event_id = %event.id,
                    error = %e,
                    "failed to deliver incident"
                );
            }
        }
    }
}

impl Pipeline for DispatchPipeline {
    async fn start(&mut self) -> Result<(), TracehoundError> {
        if self.state == PipelineState::Running {
            return Err(PipelineError::AlreadyRunning.into());
        }

        tracing::info!(server_url = %self.config.server_url, "starting dispatch pipeline");

        let mut incident_rx = self
            .incident_rx
            .take()
            .ok_or(TracehoundError::Pipeline(PipelineError::AlreadyRunning))?;

        let client = Arc::clone(&self.client);
        let suppressor = Arc::clone(&self.suppressor);
        let delivered = Arc::clone(&self.delivered_count);
        let failed = Arc::clone(&self.failed_count);

        // 채널이 닫힐 때까지 순수 드레인 루프. 별도의 취소 분기를 두면
        // 이미 큐에 쌓인 인시던트와 종료 신호가 경합하므로 두지 않습니다.
        let task = tokio::spawn(async move {
            while let Some(event) = incident_rx.recv().await {
                Self::process(&client, &suppressor, &delivered, &failed, event).await;
            }
            tracing::debug!("incident channel closed, dispatcher exiting");
        });

        self.task = Some(task);
        self.state = PipelineState::Running;
        tracing::info!("dispatch pipeline started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), TracehoundError> {
        if self.state != PipelineState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        tracing::info!("stopping dispatch pipeline");

        // 업스트림 송신측이 모두 드롭되어 채널이 닫히면 드레인이 끝납니다.
        // 탐지기를 먼저 정지시키는 오케스트레이터의 순서가 이를 보장하고,
        // 전체 대기 시간은 데몬의 shutdown grace가 제한합니다.
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            tracing::warn!(error = %e, "dispatcher task join failed");
        }

        self.state = PipelineState::Stopped;
        tracing::info!("dispatch pipeline stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            PipelineState::Running => match &self.task {
                Some(task) if !task.is_finished() => HealthStatus::Healthy,
                _ => HealthStatus::Unhealthy("dispatcher terminated".to_owned()),
            },
            PipelineState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            PipelineState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// 전송 파이프라인 빌더
pub struct DispatchPipelineBuilder {
    config: DispatchConfig,
    incident_rx: Option<mpsc::Receiver<IncidentEvent>>,
}

impl DispatchPipelineBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: DispatchConfig::default(),
            incident_rx: None,
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// 탐지 파이프라인의 인시던트 수신 채널을 설정합니다.
    pub fn incident_receiver(mut self, rx: mpsc::Receiver<IncidentEvent>) -> Self {
        self.incident_rx = Some(rx);
        self
    }

    /// 파이프라인을 빌드합니다.
    pub fn build(self) -> Result<DispatchPipeline, DispatchError> {
        self.config.validate()?;

        let incident_rx = self.incident_rx.ok_or_else(|| DispatchError::Config {
            field: "incident_receiver".to_owned(),
            reason: "an incident receiver channel is required".to_owned(),
        })?;

        let client = IngestClient::new(
            self.config.server_url.clone(),
            self.config.repo_url.clone(),
            Duration::from_secs(self.config.http_timeout_secs),
        )?;

        let suppressor = DuplicateSuppressor::new(Duration::from_secs(self.config.cooldown_secs));

        Ok(DispatchPipeline {
            config: self.config,
            state: PipelineState::Initialized,
            incident_rx: Some(incident_rx),
            client: Arc::new(client),
            suppressor: Arc::new(Mutex::new(suppressor)),
            task: None,
            delivered_count: Arc::new(AtomicU64::new(0)),
            failed_count: Arc::new(AtomicU64::new(0)),
        })
    }
}

impl Default for DispatchPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
