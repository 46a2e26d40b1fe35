//! 트레이스 재조립 -- Idle/Collecting 상태 기계
//!
//! [`TraceReassembler`]는 수집기가 넘겨주는 라인을 하나씩 받아
//! 에러 버스트의 시작/연속/종결을 온라인으로 판정하고,
//! 완성된 트레이스를 [`IncidentEvent`]로 방출합니다.
//!
//! # 상태 전이
//! ```text
//! Idle       --(에러 라인)-->        Collecting (버퍼 꼬리에서 트레이스 시작)
//! Collecting --(연속 라인)-->        Collecting (누적, 데드라인 연장)
//! Collecting --(그 외 라인)-->       Idle       (인시던트 방출, 라인은 버퍼로)
//! Collecting --(데드라인 경과)-->    Idle       (인시던트 방출)
//! ```
//!
//! 종결 라인은 트레이스에 포함되지 않습니다. 따라서 모든 인시던트의
//! `error_line`은 마지막으로 누적된 라인과 같습니다.

use std::time::{Duration, Instant};

use tracehound_core::event::IncidentEvent;

use crate::buffer::{ContextBuffer, RawLine};
use crate::classify::LineClassifier;
use crate::config::DetectorConfig;

/// 재조립기 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TraceState {
    /// 에러를 기다리는 중
    Idle,
    /// 트레이스 수집 중
    Collecting,
}

/// 트레이스 재조립기
///
/// 버퍼와 누적기를 단독 소유하며, 단일 태스크에서만 구동됩니다.
/// I/O가 없으므로 시각을 인자로 받아 결정적으로 테스트할 수 있습니다.
pub struct TraceReassembler {
    /// 라인 분류기
    classifier: LineClassifier,
    /// 롤링 컨텍스트 버퍼
    buffer: ContextBuffer,
    /// 현재 상태
    state: TraceState,
    /// 수집 중인 트레이스 라인 (Collecting 상태에서만 비어있지 않음)
    trace_lines: Vec<RawLine>,
    /// 트레이스 종결 데드라인 (Collecting 상태에서만 Some)
    deadline: Option<Instant>,
    /// 트레이스 종결 타임아웃
    trace_timeout: Duration,
    /// 트레이스 시작점 역방향 탐색 범위
    context_backscan: usize,
    /// 단일 트레이스 최대 라인 수
    max_trace_lines: usize,
    /// 방출된 인시던트 카운터
    emitted_count: u64,
}

impl TraceReassembler {
    /// 설정에서 재조립기를 생성합니다.
    pub fn new(config: &DetectorConfig) -> Self {
        Self::with_classifier(config, LineClassifier::with_defaults())
    }

    /// 주어진 분류기로 재조립기를 생성합니다.
    ///
    /// 테스트에서 축소된 패턴 목록을 주입할 때 사용합니다.
    pub fn with_classifier(config: &DetectorConfig, classifier: LineClassifier) -> Self {
        Self {
            classifier,
            buffer: ContextBuffer::new(config.buffer_size),
            state: TraceState::Idle,
            trace_lines: Vec::new(),
            deadline: None,
            trace_timeout: Duration::from_millis(config.trace_timeout_ms),
            context_backscan: config.context_backscan,
            max_trace_lines: config.max_trace_lines,
            emitted_count: 0,
        }
    }

    /// 새 라인을 상태 기계에 투입합니다.
    ///
    /// 라인 하나당 최대 하나의 인시던트가 방출됩니다.
    pub fn offer(&mut self, text: &str, now: Instant) -> Option<IncidentEvent> {
        match self.state {
            TraceState::Idle => {
                self.buffer.push(RawLine::new(text));
                if self.classifier.is_error_line(text) {
                    self.start_trace(now);
                }
                None
            }
            TraceState::Collecting => {
                if self.classifier.is_trace_continuation(text) {
                    self.trace_lines.push(RawLine::new(text));
                    self.deadline = Some(now + self.trace_timeout);
                    if self.trace_lines.len() >= self.max_trace_lines {
                        tracing::warn!(
                            lines = self.trace_lines.len(),
                            "trace reached line cap, finalizing early"
                        );
                        return self.emit();
                    }
                    None
                } else {
                    // 트레이스 종결: 먼저 방출하고, 종결 라인은 버퍼로 되돌립니다.
                    let incident = self.emit();
                    self.buffer.push(RawLine::new(text));
                    if self.classifier.is_error_line(text) {
                        self.start_trace(now);
                    }
                    incident
                }
            }
        }
    }

    /// 새 라인 없이 시각만 흐른 경우의 타임아웃 검사입니다.
    ///
    /// EOF 상태에서 수집기가 주기적으로 호출합니다. 일부 런타임은 트레이스를
    /// 프레임 라인으로만 끝내므로, 종결 라인 없이도 데드라인 경과 시 방출해야 합니다.
    pub fn tick(&mut self, now: Instant) -> Option<IncidentEvent> {
        if self.state == TraceState::Collecting
            && let Some(deadline) = self.deadline
            && now > deadline
        {
            return self.emit();
        }
        None
    }

    /// 수집 중인지 확인합니다.
    pub fn is_collecting(&self) -> bool {
        self.state == TraceState::Collecting
    }

    /// 지금까지 방출한 인시던트 수를 반환합니다.
    pub fn emitted_count(&self) -> u64 {
        self.emitted_count
    }

    /// 롤링 버퍼에 대한 읽기 참조를 반환합니다.
    pub fn buffer(&self) -> &ContextBuffer {
        &self.buffer
    }

    /// 버퍼 꼬리에서 트레이스를 시작합니다.
    ///
    /// 트리거 라인은 이미 버퍼에 들어있으며 초기 슬라이스의 끝이 됩니다.
    fn start_trace(&mut self, now: Instant) {
        let start = self.find_trace_start();
        self.trace_lines = self.buffer.lines_from(start);
        self.state = TraceState::Collecting;
        self.deadline = Some(now + self.trace_timeout);
    }

    /// 트레이스 시작 인덱스를 찾습니다.
    ///
    /// 버퍼의 마지막 `context_backscan`개 라인 중 트레이스 시작 마커를
    /// 만족하는 가장 오래된 인덱스를 사용합니다. `Traceback (most recent
    /// call last):` 같은 프레이밍 라인은 자체로는 에러 라인이 아니어도
    /// 이 탐색으로 컨텍스트에 포함됩니다. 마커가 없으면 창의 시작점입니다.
    fn find_trace_start(&self) -> usize {
        let len = self.buffer.len();
        let window_start = len.saturating_sub(self.context_backscan);

        for i in window_start..len {
            if let Some(line) = self.buffer.at(i)
                && self.classifier.is_trace_start(&line.text)
            {
                return i;
            }
        }

        window_start
    }

    /// 누적된 트레이스를 인시던트로 방출하고 Idle로 복귀합니다.
    fn emit(&mut self) -> Option<IncidentEvent> {
        self.state = TraceState::Idle;
        self.deadline = None;

        if self.trace_lines.is_empty() {
            return None;
        }

        let lines = std::mem::take(&mut self.trace_lines);
        let context: Vec<String> = lines.into_iter().map(|l| l.text).collect();
        let error_line = context
            .last()
            .cloned()
            .unwrap_or_default();

        self.emitted_count += 1;
        tracing::debug!(
            lines = context.len(),
            error_line = %error_line,
            "incident reassembled"
        );

        Some(IncidentEvent::new(error_line, context))
    }
}
