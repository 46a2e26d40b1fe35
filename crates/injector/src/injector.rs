//! 로그 주입기 -- 지정된 파일에 정상 로그와 에러 버스트를 덧붙입니다.
//!
//! 기동 직후 정상 로그 25~35개를 흘리고, 5초 뒤 첫 버스트를 씁니다.
//! 이후 30분마다 정상 로그 15~25개, 2초 대기, 버스트를 반복합니다.
//! 모든 간격은 설정 필드라 테스트에서 짧게 줄일 수 있습니다.

use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::template::{BURST_TEMPLATES, BurstTemplate, NORMAL_LOGS};

/// 주입기 에러
#[derive(Debug, thiserror::Error)]
pub enum InjectorError {
    /// 로그 파일 열기/쓰기 실패
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 주입기 설정
#[derive(Debug, Clone)]
pub struct InjectorConfig {
    /// 덧붙일 로그 파일 경로
    pub log_path: PathBuf,
    /// 기동 직후 정상 로그 최소 개수
    pub startup_lines_min: usize,
    /// 기동 직후 정상 로그 개수의 랜덤 추가 범위
    pub startup_lines_span: usize,
    /// 기동 후 첫 버스트까지의 대기
    pub startup_delay: Duration,
    /// 버스트 사이 간격
    pub burst_interval: Duration,
    /// 버스트 전 정상 로그 최소 개수
    pub interlude_lines_min: usize,
    /// 버스트 전 정상 로그 개수의 랜덤 추가 범위
    pub interlude_lines_span: usize,
    /// 버스트 직전 대기
    pub interlude_delay: Duration,
    /// 정상 로그 사이 최소 지연 (밀리초)
    pub normal_delay_min_ms: u64,
    /// 정상 로그 사이 지연의 랜덤 추가 범위 (밀리초)
    pub normal_delay_span_ms: u64,
    /// 버스트 내 정상 로그 간격 (밀리초)
    pub burst_log_delay_ms: u64,
    /// 트레이스백 라인 간격 (밀리초)
    pub trace_line_delay_ms: u64,
}

impl InjectorConfig {
    /// 운영 데모용 기본 케이던스로 설정을 생성합니다.
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
            startup_lines_min: 25,
            startup_lines_span: 10,
            startup_delay: Duration::from_secs(5),
            burst_interval: Duration::from_secs(30 * 60),
            interlude_lines_min: 15,
            interlude_lines_span: 10,
            interlude_delay: Duration::from_secs(2),
            normal_delay_min_ms: 100,
            normal_delay_span_ms: 400,
            burst_log_delay_ms: 100,
            trace_line_delay_ms: 50,
        }
    }

    /// 테스트용으로 모든 지연을 최소화한 설정을 생성합니다.
    pub fn fast(log_path: impl Into<PathBuf>) -> Self {
        Self {
            startup_lines_min: 3,
            startup_lines_span: 2,
            startup_delay: Duration::from_millis(10),
            burst_interval: Duration::from_millis(200),
            interlude_lines_min: 2,
            interlude_lines_span: 2,
            interlude_delay: Duration::from_millis(10),
            normal_delay_min_ms: 1,
            normal_delay_span_ms: 2,
            burst_log_delay_ms: 1,
            trace_line_delay_ms: 1,
            ..Self::new(log_path)
        }
    }
}

/// 합성 로그 주입기
pub struct LogInjector {
    /// 주입기 설정
    config: InjectorConfig,
    /// 지금까지 덧붙인 라인 수
    appended_lines: u64,
}

impl LogInjector {
    /// 새 주입기를 생성합니다.
    pub fn new(config: InjectorConfig) -> Self {
        Self {
            config,
            appended_lines: 0,
        }
    }

    /// 주입 루프를 실행합니다. 취소될 때까지 반복합니다.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), InjectorError> {
        let mut file = self.open_append().await?;

        // 기동 직후 정상 로그
        let count = self.random_count(
            self.config.startup_lines_min,
            self.config.startup_lines_span,
        );
        self.append_normal_lines(&mut file, count, &cancel).await?;

        // 첫 버스트
        if !self.pause(self.config.startup_delay, &cancel).await {
            return Ok(());
        }
        self.write_random_burst(&mut file).await?;

        // 이후 주기적 버스트
        loop {
            if !self.pause(self.config.burst_interval, &cancel).await {
                return Ok(());
            }

            let count = self.random_count(
                self.config.interlude_lines_min,
                self.config.interlude_lines_span,
            );
            self.append_normal_lines(&mut file, count, &cancel).await?;

            if !self.pause(self.config.interlude_delay, &cancel).await {
                return Ok(());
            }
            self.write_random_burst(&mut file).await?;
        }
    }

    /// 버스트 하나만 쓰고 종료합니다. 테스트와 `--once` 모드에서 사용합니다.
    pub async fn run_once(&mut self) -> Result<(), InjectorError> {
        let template = BURST_TEMPLATES[rand::thread_rng().gen_range(0..BURST_TEMPLATES.len())];
        self.run_once_with(&template).await
    }

    /// 지정된 템플릿으로 버스트 하나만 씁니다.
    pub async fn run_once_with(&mut self, template: &BurstTemplate) -> Result<(), InjectorError> {
        let mut file = self.open_append().await?;
        self.write_burst(&mut file, template).await
    }

    /// 지금까지 덧붙인 라인 수를 반환합니다.
    pub fn appended_lines(&self) -> u64 {
        self.appended_lines
    }

    /// 로그 파일을 append 모드로 엽니다 (없으면 생성).
    async fn open_append(&self) -> Result<File, InjectorError> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.config.log_path)
            .await?;
        Ok(file)
    }

    /// 일반 정상 로그를 무작위로 골라 덧붙입니다.
    async fn append_normal_lines(
        &mut self,
        file: &mut File,
        count: usize,
        cancel: &CancellationToken,
    ) -> Result<(), InjectorError> {
        for _ in 0..count {
            if cancel.is_cancelled() {
                return Ok(());
            }

            let log = NORMAL_LOGS[rand::thread_rng().gen_range(0..NORMAL_LOGS.len())];
            self.append_line(file, log).await?;

            let delay = self.config.normal_delay_min_ms
                + rand::thread_rng().gen_range(0..=self.config.normal_delay_span_ms);
            sleep(Duration::from_millis(delay)).await;
        }
        file.flush().await?;
        Ok(())
    }

    /// 무작위 템플릿으로 버스트를 씁니다.
    async fn write_random_burst(&mut self, file: &mut File) -> Result<(), InjectorError> {
        let template = BURST_TEMPLATES[rand::thread_rng().gen_range(0..BURST_TEMPLATES.len())];
        self.write_burst(file, &template).await
    }

    /// 에러 버스트 하나를 씁니다.
    ///
    /// 버스트의 모든 라인은 버스트 시작 시점의 타임스탬프를 공유합니다.
    async fn write_burst(
        &mut self,
        file: &mut File,
        template: &BurstTemplate,
    ) -> Result<(), InjectorError> {
        info!(language = template.language, "injecting error burst");

        let timestamp = Self::timestamp();

        for log in template.normal_logs {
            self.append_stamped_line(file, &timestamp, log).await?;
            sleep(Duration::from_millis(self.config.burst_log_delay_ms)).await;
        }

        for line in template.traceback {
            self.append_stamped_line(file, &timestamp, line).await?;
            sleep(Duration::from_millis(self.config.trace_line_delay_ms)).await;
        }

        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }

    /// 현재 시각의 타임스탬프를 붙여 한 라인을 덧붙입니다.
    async fn append_line(&mut self, file: &mut File, log: &str) -> Result<(), InjectorError> {
        let timestamp = Self::timestamp();
        self.append_stamped_line(file, &timestamp, log).await
    }

    /// 주어진 타임스탬프를 붙여 한 라인을 덧붙입니다.
    async fn append_stamped_line(
        &mut self,
        file: &mut File,
        timestamp: &str,
        log: &str,
    ) -> Result<(), InjectorError> {
        let line = format!("{timestamp} {log}\n");
        file.write_all(line.as_bytes()).await?;
        self.appended_lines += 1;
        Ok(())
    }

    /// min + rand(0..=span) 범위의 개수를 고릅니다.
    fn random_count(&self, min: usize, span: usize) -> usize {
        min + rand::thread_rng().gen_range(0..=span)
    }

    /// 로그 라인 접두 타임스탬프를 만듭니다.
    fn timestamp() -> String {
        chrono::Local::now()
            .format("%Y-%m-%d %H:%M:%S%.3f")
            .to_string()
    }

    /// 취소 가능한 대기. 취소되면 false를 반환합니다.
    async fn pause(&self, duration: Duration, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = sleep(duration) => true,
            _ = cancel.cancelled() => false,
        }
    }
}
