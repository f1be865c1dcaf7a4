//! Usage: Tracing initialization (stderr + daily rolling file in the app dotdir).

use crate::infra::app_paths;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "PACKCRAFT_LAUNCHER_LOG";
const LOG_FILE_PREFIX: &str = "packcraft-launcher.log";

static INITIALIZED: AtomicBool = AtomicBool::new(false);
// Keeps the background writer alive for the process lifetime.
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

pub fn init(app: &tauri::AppHandle) {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));

    if let Err(err) = tracing_log::LogTracer::init() {
        eprintln!("log 桥接初始化失败: {err}");
    }

    let stderr_layer = tracing_subscriber::fmt::layer().with_target(false);
    let registry = tracing_subscriber::registry().with(filter).with(stderr_layer);

    match app_paths::log_dir(app) {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = LOG_GUARD.set(guard);

            let file_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            if registry.with(file_layer).try_init().is_err() {
                eprintln!("日志订阅器重复初始化，已忽略");
            }
        }
        Err(err) => {
            // No log dir: stderr-only logging still beats none.
            eprintln!("日志目录不可用，仅输出到 stderr: {err}");
            if registry.try_init().is_err() {
                eprintln!("日志订阅器重复初始化，已忽略");
            }
        }
    }
}
