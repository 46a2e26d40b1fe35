//! 에러 버스트 템플릿 -- 언어별 정상 로그와 트레이스백의 고정 데이터
//!
//! 각 템플릿은 (언어 태그, 선행 정상 로그, 대표 에러 라인, 트레이스백)의
//! 고정 아리티 변형입니다. 분류기의 교차 언어 휴리스틱이 실제로
//! 마주치는 형태를 그대로 재현합니다.

/// 에러 버스트 템플릿
#[derive(Debug, Clone, Copy)]
pub struct BurstTemplate {
    /// 언어 태그 (로그 표시에 사용)
    pub language: &'static str,
    /// 에러 직전에 흘러가는 언어 특유의 정상 로그
    pub normal_logs: &'static [&'static str],
    /// 대표 에러 라인
    pub error_line: &'static str,
    /// 트레이스백 라인 (원본 들여쓰기 보존)
    pub traceback: &'static [&'static str],
}

/// 기본 버스트 템플릿 세트 — 여섯 개 언어를 포괄합니다.
pub const BURST_TEMPLATES: &[BurstTemplate] = &[
    // Python — ZeroDivisionError
    BurstTemplate {
        language: "Python",
        normal_logs: &[
            "[INFO] Flask app starting on port 5000...",
            "[INFO] Loading configuration from config.yaml",
            "[INFO] Database connection established",
            "[INFO] Registering routes...",
            "[INFO] Route /api/calculate registered",
            "[DEBUG] Request received: GET /api/calculate",
            "[DEBUG] Processing calculation request...",
        ],
        error_line: "ZeroDivisionError: division by zero",
        traceback: &[
            "ERROR in app: Exception on /api/calculate [GET]",
            "Traceback (most recent call last):",
            "  File \"python/app.py\", line 45, in calculate",
            "    result = divide(numerator, denominator)",
            "  File \"python/app.py\", line 12, in divide",
            "    return a / b",
            "ZeroDivisionError: division by zero",
        ],
    },
    // JavaScript — 속성 접근 TypeError
    BurstTemplate {
        language: "JavaScript",
        normal_logs: &[
            "[INFO] Server starting on port 3001...",
            "[INFO] Loading environment variables",
            "[INFO] Connecting to MongoDB...",
            "[INFO] MongoDB connected successfully",
            "[DEBUG] Registering middleware...",
            "[DEBUG] Request received: POST /api/users",
            "[DEBUG] Parsing request body...",
        ],
        error_line: "TypeError: Cannot read properties of undefined (reading 'email')",
        traceback: &[
            "Error: TypeError: Cannot read properties of undefined (reading 'email')",
            "    at processUser (javascript/index.js:34:25)",
            "    at Router.handle (javascript/index.js:18:5)",
            "    at Layer.handle [as handle_request] (node_modules/express/lib/router/layer.js:95:5)",
            "    at next (node_modules/express/lib/router/route.js:144:13)",
            "TypeError: Cannot read properties of undefined (reading 'email')",
        ],
    },
    // Go — nil 포인터 역참조 panic
    BurstTemplate {
        language: "Go",
        normal_logs: &[
            "INFO: Starting HTTP server on :8080",
            "INFO: Loading configuration from config.json",
            "INFO: Initializing database connection pool",
            "INFO: Database pool initialized with 10 connections",
            "DEBUG: Incoming request: GET /api/profile",
            "DEBUG: Fetching user profile from database",
        ],
        error_line: "panic: runtime error: invalid memory address or nil pointer dereference",
        traceback: &[
            "panic: runtime error: invalid memory address or nil pointer dereference",
            "[signal SIGSEGV: segmentation violation code=0x1 addr=0x0 pc=0x4a2f8c]",
            "",
            "goroutine 1 [running]:",
            "main.handleProfile(0xc0000a6000)",
            "        go/main.go:42 +0x1c",
            "main.main()",
            "        go/main.go:28 +0x85",
        ],
    },
    // Java — NullPointerException
    BurstTemplate {
        language: "Java",
        normal_logs: &[
            "INFO: Application starting with Spring Boot 3.2.0",
            "INFO: Initializing DispatcherServlet 'dispatcherServlet'",
            "INFO: Tomcat started on port 8080",
            "INFO: Started Application in 2.345 seconds",
            "DEBUG: Request received: GET /api/order/123",
            "DEBUG: Fetching order from OrderService",
        ],
        error_line: "java.lang.NullPointerException: Cannot invoke method on null object",
        traceback: &[
            "ERROR 2024-01-17 12:00:00.000 --- [nio-8080-exec-1] o.a.c.c.C.[.[.[/].[dispatcherServlet]",
            "java.lang.NullPointerException: Cannot invoke method getTotal() on null object",
            "        at com.example.OrderService.calculateTotal(OrderService.java:45)",
            "        at com.example.OrderController.getOrder(OrderController.java:23)",
            "        at sun.reflect.NativeMethodAccessorImpl.invoke0(Native Method)",
            "        at org.springframework.web.servlet.FrameworkServlet.service(FrameworkServlet.java:897)",
        ],
    },
    // Rust — unwrap panic
    BurstTemplate {
        language: "Rust",
        normal_logs: &[
            "INFO: Starting Rust HTTP server on :8081",
            "INFO: Loading configuration from config.toml",
            "INFO: Database connection pool initialized",
            "DEBUG: Incoming request: GET /api/user?id=999",
            "DEBUG: Fetching user from database",
        ],
        error_line: "thread 'main' panicked at 'called `Option::unwrap()` on a `None` value'",
        traceback: &[
            "thread 'main' panicked at 'called `Option::unwrap()` on a `None` value', rust/main.rs:35:5",
            "stack backtrace:",
            "   0: rust_begin_unwind",
            "             at /rustc/a28077b28/library/std/src/panicking.rs:597:5",
            "   1: core::panicking::panic_fmt",
            "             at /rustc/a28077b28/library/core/src/panicking.rs:72:14",
            "   2: core::panicking::panic",
            "             at /rustc/a28077b28/library/core/src/panicking.rs:127:5",
            "   3: core::option::Option<T>::unwrap",
            "             at /rustc/a28077b28/library/core/src/option.rs:935:21",
            "   4: main::get_user_email",
            "             at ./rust/main.rs:35:5",
            "   5: main::handle_request",
            "             at ./rust/main.rs:54:25",
        ],
    },
    // Dart — null check 연산자 실패
    BurstTemplate {
        language: "Dart",
        normal_logs: &[
            "INFO: Starting Dart service...",
            "INFO: Initializing UserService",
            "INFO: Loading user data from cache",
            "DEBUG: Request received: getUserEmail(999)",
            "DEBUG: Looking up user in database",
        ],
        error_line: "Null check operator used on a null value",
        traceback: &[
            "Unhandled exception:",
            "Null check operator used on a null value",
            "#0      UserService.getUserEmail (package:app/dart/main.dart:38:17)",
            "#1      main (package:app/dart/main.dart:78:42)",
            "#2      _delayEntrypointInvocation.<anonymous closure> (dart:isolate-patch/isolate_patch.dart:295:33)",
            "#3      _RawReceivePort._handleMessage (dart:isolate-patch/isolate_patch.dart:184:12)",
        ],
    },
];

/// 버스트 사이에 흘러가는 일반 정상 로그
pub const NORMAL_LOGS: &[&str] = &[
    "[INFO] Health check passed",
    "[INFO] Metrics collected successfully",
    "[DEBUG] Cache hit for key: user_session_abc123",
    "[INFO] Request processed in 45ms",
    "[DEBUG] Connection pool: 8/10 active",
    "[INFO] Scheduled job completed: cleanup_temp_files",
    "[DEBUG] Memory usage: 256MB / 512MB",
    "[INFO] Request received: GET /api/status",
    "[INFO] Response sent: 200 OK",
    "[DEBUG] Database query executed in 12ms",
    "[INFO] WebSocket connection established",
    "[DEBUG] Session validated for user: demo_user",
    "[INFO] File uploaded: document.pdf (1.2MB)",
    "[DEBUG] Rate limit check passed",
    "[INFO] Email notification queued",
];
