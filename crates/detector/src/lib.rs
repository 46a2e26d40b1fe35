#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`buffer`]: 최근 라인을 보관하는 고정 용량 롤링 버퍼
//! - [`classify`]: 에러/트레이스 시작/트레이스 연속 판별 휴리스틱
//! - [`tailer`]: 파일 끝에서부터 새 라인을 읽는 수집기
//! - [`reassembler`]: Idle/Collecting 상태 기계로 트레이스를 재조립
//! - [`pipeline`]: 전체 탐지 흐름 오케스트레이션 (Pipeline trait 구현)
//! - [`config`]: 탐지기 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! LogTailer -> (line, LineClassifier) -> TraceReassembler -> mpsc -> downstream
//!                                            |
//!                                       ContextBuffer
//! ```

pub mod buffer;
pub mod classify;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod reassembler;
pub mod tailer;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{DetectorPipeline, DetectorPipelineBuilder};

// 설정
pub use config::{DetectorConfig, DetectorConfigBuilder};

// 에러
pub use error::DetectorError;

// 분류기
pub use classify::LineClassifier;

// 버퍼
pub use buffer::{ContextBuffer, RawLine};

// 재조립기
pub use reassembler::TraceReassembler;

// 수집기
pub use tailer::{LogTailer, TailerStatus};
