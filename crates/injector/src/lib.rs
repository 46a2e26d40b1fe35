#![doc = include_str!("../README.md")]

pub mod injector;
pub mod template;

// --- 주요 타입 re-export ---

pub use injector::{InjectorConfig, InjectorError, LogInjector};
pub use template::{BURST_TEMPLATES, BurstTemplate, NORMAL_LOGS};
