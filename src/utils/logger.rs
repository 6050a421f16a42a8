//! Structured logging helpers
//!
//! Thin wrappers over the `log` facade so that operations across the app
//! (settings, hotkey registration, rewrites) share one greppable format:
//! `[OPERATION] STARTED`, `[OPERATION] COMPLETED in Xms`, `[OPERATION] FAILED: ...`.

use log::Level;

/// Mark the start of a named operation
pub fn log_start(operation: &str) {
    log::debug!("▶️  [{}] STARTED", operation);
}

/// Mark the successful end of a named operation
pub fn log_complete(operation: &str, duration_ms: u64) {
    log::info!("✅ [{}] COMPLETED in {}ms", operation, duration_ms);
}

/// Mark a failed operation
pub fn log_failed(operation: &str, error: &str) {
    log::error!("❌ [{}] FAILED: {}", operation, error);
}

/// Log a message followed by `key=value` context pairs
pub fn log_with_context(level: Level, message: &str, context: &[(&str, &str)]) {
    if !log::log_enabled!(level) {
        return;
    }
    log::log!(level, "{} {}", message, format_context(context));
}

/// Application lifecycle marker (start, shutdown, first run)
pub fn log_lifecycle_event(event: &str, version: Option<&str>, details: Option<&str>) {
    match (version, details) {
        (Some(v), Some(d)) => log::info!("🔄 LIFECYCLE {} v{} | {}", event, v, d),
        (Some(v), None) => log::info!("🔄 LIFECYCLE {} v{}", event, v),
        (None, Some(d)) => log::info!("🔄 LIFECYCLE {} | {}", event, d),
        (None, None) => log::info!("🔄 LIFECYCLE {}", event),
    }
}

/// Result of a file system operation
pub fn log_file_operation(
    operation: &str,
    path: &str,
    success: bool,
    size_bytes: Option<u64>,
    error: Option<&str>,
) {
    let size = size_bytes
        .map(|s| format!(" ({} bytes)", s))
        .unwrap_or_default();
    if success {
        log::debug!("📁 FILE {} {}{}", operation, path, size);
    } else {
        log::warn!(
            "📁 FILE {} {} failed: {}",
            operation,
            path,
            error.unwrap_or("unknown error")
        );
    }
}

/// Timing for an operation that is not worth a start/complete pair
pub fn log_performance(operation: &str, duration_ms: u64, details: Option<&str>) {
    match details {
        Some(d) => log::info!("⏱️  PERF {} took {}ms ({})", operation, duration_ms, d),
        None => log::info!("⏱️  PERF {} took {}ms", operation, duration_ms),
    }
}

/// State machine transition
pub fn log_state_transition(
    component: &str,
    from: &str,
    to: &str,
    accepted: bool,
    reason: Option<&str>,
) {
    if accepted {
        log::debug!("🔀 {} {} -> {}", component, from, to);
    } else {
        log::warn!(
            "🔀 {} transition {} -> {} REJECTED: {}",
            component,
            from,
            to,
            reason.unwrap_or("no reason given")
        );
    }
}

fn format_context(context: &[(&str, &str)]) -> String {
    context
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_context() {
        assert_eq!(format_context(&[]), "");
        assert_eq!(
            format_context(&[("backend", "groq"), ("count", "3")]),
            "backend=groq count=3"
        );
    }
}
