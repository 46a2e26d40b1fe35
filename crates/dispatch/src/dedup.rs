//! 중복 억제 -- 구조적으로 같은 인시던트의 쿨다운 내 재전송 차단
//!
//! 소스 애플리케이션의 같은 버그는 같은 에러 라인과 같은 트레이스 머리를
//! 반복 생성합니다. [`DuplicateSuppressor`]는 에러 라인과 앞쪽 컨텍스트의
//! 해시를 기억해 쿨다운 안의 재발을 걸러냅니다.
//!
//! 상태는 전송 파이프라인이 단독 소유하며, 전송이 성공했을 때만
//! 갱신됩니다. 실패한 전송은 억제 상태를 남기지 않으므로 다음 재발이
//! 다시 전송 기회를 얻습니다.

use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use tracehound_core::event::IncidentEvent;

/// 해시에 포함할 컨텍스트 앞쪽 라인 수
const FINGERPRINT_CONTEXT_LINES: usize = 3;

/// 해시에서 사용할 다이제스트 길이 (바이트)
const FINGERPRINT_BYTES: usize = 8;

/// 중복 억제기
///
/// `(마지막 해시, 마지막 전송 시각)` 한 쌍만 기억합니다.
/// 인시던트는 `hash == last_hash && now - last_seen < cooldown`일 때만
/// 억제됩니다.
pub struct DuplicateSuppressor {
    /// 쿨다운 윈도우
    cooldown: Duration,
    /// 마지막으로 전송된 인시던트의 해시
    last_hash: Option<String>,
    /// 마지막 전송 시각
    last_seen: Option<Instant>,
    /// 억제된 인시던트 수
    suppressed_count: u64,
    /// 기록된 (전송 성공한) 인시던트 수
    recorded_count: u64,
}

impl DuplicateSuppressor {
    /// 새 억제기를 생성합니다.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_hash: None,
            last_seen: None,
            suppressed_count: 0,
            recorded_count: 0,
        }
    }

    /// 인시던트의 중복 판별용 지문을 계산합니다.
    ///
    /// 에러 라인과 컨텍스트 앞쪽 최대 3개 라인을 이어붙여 SHA-256을
    /// 계산하고, 앞 8바이트를 16진수로 인코딩합니다 (16자).
    pub fn fingerprint(event: &IncidentEvent) -> String {
        let mut hasher = Sha256::new();
        hasher.update(event.error_line.as_bytes());

        for line in event.context.iter().take(FINGERPRINT_CONTEXT_LINES) {
            hasher.update(line.as_bytes());
        }

        let digest = hasher.finalize();
        hex::encode(&digest[..FINGERPRINT_BYTES])
    }

    /// 주어진 지문이 쿨다운 내 중복인지 확인합니다.
    ///
    /// 판별만 수행하며 상태를 변경하지 않습니다.
    pub fn is_duplicate(&self, hash: &str, now: Instant) -> bool {
        if let (Some(last_hash), Some(last_seen)) = (&self.last_hash, self.last_seen)
            && last_hash == hash
            && now.duration_since(last_seen) < self.cooldown
        {
            return true;
        }
        false
    }

    /// 억제 카운터를 증가시킵니다.
    pub fn mark_suppressed(&mut self) {
        self.suppressed_count += 1;
    }

    /// 전송 성공한 인시던트의 지문과 시각을 기록합니다.
    pub fn record(&mut self, hash: String, now: Instant) {
        self.last_hash = Some(hash);
        self.last_seen = Some(now);
        self.recorded_count += 1;
    }

    /// 억제된 인시던트 수를 반환합니다.
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed_count
    }

    /// 기록된 인시던트 수를 반환합니다.
    pub fn recorded_count(&self) -> u64 {
        self.recorded_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(error_line: &str, context: &[&str]) -> IncidentEvent {
        IncidentEvent::new(
            error_line,
            context.iter().map(|l| (*l).to_owned()).collect(),
        )
    }

    fn python_event() -> IncidentEvent {
        event(
            "ZeroDivisionError: division by zero",
            &[
                "Traceback (most recent call last):",
                "  File \"app.py\", line 45, in calculate",
                "    return a / b",
                "ZeroDivisionError: division by zero",
            ],
        )
    }

    #[test]
    fn fingerprint_is_16_hex_chars() {
        let hash = DuplicateSuppressor::fingerprint(&python_event());
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let first = DuplicateSuppressor::fingerprint(&python_event());
        let second = DuplicateSuppressor::fingerprint(&python_event());
        assert_eq!(first, second);
    }

    #[test]
    fn fingerprint_differs_for_different_errors() {
        let a = DuplicateSuppressor::fingerprint(&python_event());
        let b = DuplicateSuppressor::fingerprint(&event(
            "KeyError: 'user_id'",
            &["Traceback (most recent call last):"],
        ));
        assert_ne!(a, b);
    }

    #[test]
    fn fingerprint_covers_at_most_three_context_lines() {
        // 앞 3개 라인이 같으면 뒤쪽 컨텍스트가 달라도 같은 지문
        let a = event("E: boom", &["l1", "l2", "l3", "tail-a"]);
        let b = event("E: boom", &["l1", "l2", "l3", "tail-b"]);
        assert_eq!(
            DuplicateSuppressor::fingerprint(&a),
            DuplicateSuppressor::fingerprint(&b)
        );

        // 앞 3개 안에서 다르면 지문도 다름
        let c = event("E: boom", &["l1", "DIFFERENT", "l3", "tail-a"]);
        assert_ne!(
            DuplicateSuppressor::fingerprint(&a),
            DuplicateSuppressor::fingerprint(&c)
        );
    }

    #[test]
    fn fingerprint_handles_short_context() {
        // 컨텍스트가 3개 미만이어도 동작
        let short = event("E: boom", &["only"]);
        let hash = DuplicateSuppressor::fingerprint(&short);
        assert_eq!(hash.len(), 16);
    }

    #[test]
    fn suppresses_same_hash_within_cooldown() {
        let mut suppressor = DuplicateSuppressor::new(Duration::from_secs(30));
        let hash = DuplicateSuppressor::fingerprint(&python_event());
        let now = Instant::now();

        // 기록 전에는 중복이 아님
        assert!(!suppressor.is_duplicate(&hash, now));

        suppressor.record(hash.clone(), now);
        assert!(suppressor.is_duplicate(&hash, now + Duration::from_secs(5)));
        assert_eq!(suppressor.recorded_count(), 1);
    }

    #[test]
    fn allows_same_hash_after_cooldown() {
        let mut suppressor = DuplicateSuppressor::new(Duration::from_secs(30));
        let hash = DuplicateSuppressor::fingerprint(&python_event());
        let now = Instant::now();

        suppressor.record(hash.clone(), now);
        assert!(!suppressor.is_duplicate(&hash, now + Duration::from_secs(31)));
    }

    #[test]
    fn allows_different_hash_within_cooldown() {
        let mut suppressor = DuplicateSuppressor::new(Duration::from_secs(30));
        let now = Instant::now();

        suppressor.record("aaaa000011112222".to_owned(), now);
        assert!(!suppressor.is_duplicate("bbbb000011112222", now + Duration::from_secs(1)));
    }

    #[test]
    fn is_duplicate_does_not_mutate_state() {
        let mut suppressor = DuplicateSuppressor::new(Duration::from_secs(30));
        let now = Instant::now();
        suppressor.record("aaaa000011112222".to_owned(), now);

        // 다른 해시를 확인해도 기록된 해시는 그대로
        assert!(!suppressor.is_duplicate("bbbb000011112222", now));
        assert!(suppressor.is_duplicate("aaaa000011112222", now + Duration::from_secs(1)));
    }

    #[test]
    fn counters_track_suppressions_and_records() {
        let mut suppressor = DuplicateSuppressor::new(Duration::from_secs(30));
        assert_eq!(suppressor.suppressed_count(), 0);
        assert_eq!(suppressor.recorded_count(), 0);

        suppressor.record("aaaa000011112222".to_owned(), Instant::now());
        suppressor.mark_suppressed();
        suppressor.mark_suppressed();

        assert_eq!(suppressed_and_recorded(&suppressor), (2, 1));
    }

    fn suppressed_and_recorded(s: &DuplicateSuppressor) -> (u64, u64) {
        (s.suppressed_count(), s.recorded_count())
    }
}
