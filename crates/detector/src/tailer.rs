//! 파일 테일러 -- `tail -f` 방식의 라인 수집기
//!
//! 로그 파일을 읽기 전용으로 열고 끝으로 이동한 뒤, 이후에 추가되는
//! 완성된 라인만 재조립기에 공급합니다. EOF에 도달하면 짧게 대기했다가
//! 재시도하며, 취소 토큰이 발화되면 다음 루프 경계에서 깨끗하게 종료합니다.
//!
//! # 비목표
//! 파일 로테이션/트렁케이션 감지는 수행하지 않습니다. 파일이 줄어들면
//! 동작은 정의되지 않습니다.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader, SeekFrom};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tracehound_core::event::IncidentEvent;

use crate::error::DetectorError;
use crate::reassembler::TraceReassembler;

/// 테일러 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailerStatus {
    /// 실행 대기 중
    Idle,
    /// 실행 중
    Running,
    /// 에러로 중단됨
    Error(String),
    /// 정상 종료됨
    Stopped,
}

/// 파일 테일러
///
/// [`open`](LogTailer::open)에서 파일을 열고 끝으로 이동하므로,
/// 열기 실패는 파이프라인 기동 단계에서 바로 드러납니다.
pub struct LogTailer {
    /// 감시 대상 파일 경로
    path: PathBuf,
    /// EOF 재시도 간격
    poll_interval: Duration,
    /// 열린 파일 리더
    reader: BufReader<File>,
    /// 완성되지 않은 라인 조각 (다음 읽기에서 이어붙임)
    carry: String,
    /// 현재 상태
    status: TailerStatus,
}

impl LogTailer {
    /// 파일을 읽기 전용으로 열고 끝으로 이동한 테일러를 생성합니다.
    pub async fn open(
        path: impl Into<PathBuf>,
        poll_interval_ms: u64,
    ) -> Result<Self, DetectorError> {
        let path = path.into();

        let file = File::open(&path).await.map_err(|e| DetectorError::Tail {
            path: path.display().to_string(),
            reason: format!("failed to open: {e}"),
        })?;

        let mut reader = BufReader::new(file);
        reader
            .seek(SeekFrom::End(0))
            .await
            .map_err(|e| DetectorError::Tail {
                path: path.display().to_string(),
                reason: format!("failed to seek to end: {e}"),
            })?;

        Ok(Self {
            path,
            poll_interval: Duration::from_millis(poll_interval_ms),
            reader,
            carry: String::new(),
            status: TailerStatus::Idle,
        })
    }

    /// 테일 루프를 실행합니다.
    ///
    /// 읽은 라인을 재조립기에 공급하고, 방출된 인시던트를 채널로 전송합니다.
    /// 채널이 가득 차면 전송이 완료될 때까지 블록되어 소스 쪽으로
    /// 배압이 전달됩니다. 취소될 때까지 실행됩니다.
    pub async fn run(
        mut self,
        mut reassembler: TraceReassembler,
        tx: mpsc::Sender<IncidentEvent>,
        cancel: CancellationToken,
        lines_processed: Arc<AtomicU64>,
        incidents_emitted: Arc<AtomicU64>,
    ) -> Result<(), DetectorError> {
        self.status = TailerStatus::Running;
        info!(path = %self.path.display(), "tailer started");

        let mut chunk = String::new();

        loop {
            if cancel.is_cancelled() {
                break;
            }

            chunk.clear();
            let bytes_read =
                self.reader
                    .read_line(&mut chunk)
                    .await
                    .map_err(|e| DetectorError::Tail {
                        path: self.path.display().to_string(),
                        reason: format!("read failed: {e}"),
                    })?;

            if bytes_read == 0 {
                // EOF: 수집 중이던 트레이스의 타임아웃 검사 후 대기
                if let Some(event) = reassembler.tick(Instant::now()) {
                    Self::forward(&tx, event, &incidents_emitted).await?;
                }

                tokio::select! {
                    _ = sleep(self.poll_interval) => {}
                    _ = cancel.cancelled() => break,
                }
                continue;
            }

            if !chunk.ends_with('\n') {
                // 쓰는 쪽이 아직 라인을 끝내지 않음: 조각을 보관하고 재시도
                self.carry.push_str(&chunk);
                continue;
            }

            // 끝쪽 공백만 제거합니다. 들여쓰기는 트레이스 연속 판별의
            // 핵심 신호이므로 앞쪽 공백은 보존합니다.
            let line = if self.carry.is_empty() {
                chunk.trim_end().to_owned()
            } else {
                self.carry.push_str(&chunk);
                let full = self.carry.trim_end().to_owned();
                self.carry.clear();
                full
            };

            if line.trim().is_empty() {
                continue;
            }

            lines_processed.fetch_add(1, Ordering::Relaxed);

            if let Some(event) = reassembler.offer(&line, Instant::now()) {
                Self::forward(&tx, event, &incidents_emitted).await?;
            }
        }

        if reassembler.is_collecting() {
            // 종료 시점에 미완성 트레이스는 버립니다.
            warn!("shutdown while collecting, discarding partial trace");
        }

        self.status = TailerStatus::Stopped;
        info!(path = %self.path.display(), "tailer stopped");
        Ok(())
    }

    /// 인시던트를 채널로 전송합니다.
    async fn forward(
        tx: &mpsc::Sender<IncidentEvent>,
        event: IncidentEvent,
        incidents_emitted: &AtomicU64,
    ) -> Result<(), DetectorError> {
        debug!(event = %event, "forwarding incident");
        tx.send(event)
            .await
            .map_err(|e| DetectorError::Channel(e.to_string()))?;
        incidents_emitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// 감시 대상 경로를 반환합니다.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// 현재 상태를 반환합니다.
    pub fn status(&self) -> &TailerStatus {
        &self.status
    }
}
