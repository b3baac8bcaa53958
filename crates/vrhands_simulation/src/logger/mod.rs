use once_cell::sync::Lazy;
use std::sync::Mutex;

// Глобальный logger: host (Godot/Unity bridge, тесты, headless bin) подставляет свой printer
static LOGGER: Lazy<Mutex<Option<Box<dyn LogPrinter>>>> = Lazy::new(|| Mutex::new(None));

pub static LOGGER_LEVEL: Lazy<Mutex<LogLevel>> = Lazy::new(|| Mutex::new(LogLevel::Debug));

pub fn set_logger(logger: Box<dyn LogPrinter>) {
    if let Ok(mut slot) = LOGGER.lock() {
        *slot = Some(logger);
    }
}

pub fn set_log_level(level: LogLevel) {
    if let Ok(mut current) = LOGGER_LEVEL.lock() {
        *current = level;
    }
}

pub fn set_logger_if_needed(logger: Box<dyn LogPrinter>) {
    if let Ok(mut slot) = LOGGER.lock() {
        if slot.is_none() {
            *slot = Some(logger);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

pub trait LogPrinter: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

pub fn log(message: &str) {
    log_with_level(LogLevel::Debug, message);
}

pub fn log_info(message: &str) {
    log_with_level(LogLevel::Info, message);
}

pub fn log_warning(message: &str) {
    log_with_level(LogLevel::Warning, message);
}

pub fn log_error(message: &str) {
    log_with_level(LogLevel::Error, message);
}

pub fn log_with_level(level: LogLevel, message: &str) {
    let min_level = LOGGER_LEVEL.lock().map(|l| *l).unwrap_or(LogLevel::Debug);
    if level < min_level {
        return;
    }

    // timestamp добавляем здесь, не в printer
    if let Ok(slot) = LOGGER.lock() {
        if let Some(logger) = slot.as_ref() {
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            logger.log(level, &format!("[{}] {}", timestamp, message));
        }
    }
}

pub struct ConsoleLogger;

impl LogPrinter for ConsoleLogger {
    fn log(&self, level: LogLevel, message: &str) {
        println!("[{}] {}", level.as_str(), message);
    }
}

pub fn init_logger() {
    set_logger_if_needed(Box::new(ConsoleLogger));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Printer, который складывает сообщения в общий буфер
    struct CapturePrinter(Arc<Mutex<Vec<(LogLevel, String)>>>);

    impl LogPrinter for CapturePrinter {
        fn log(&self, level: LogLevel, message: &str) {
            if let Ok(mut lines) = self.0.lock() {
                lines.push((level, message.to_string()));
            }
        }
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
        assert_eq!(LogLevel::Warning.as_str(), "WARNING");
    }

    #[test]
    fn test_set_log_level_filters_lower_levels() {
        let captured = Arc::new(Mutex::new(Vec::new()));
        set_logger(Box::new(CapturePrinter(captured.clone())));

        // Другие тесты логируют параллельно: смотрим только свои маркеры
        let marked = |marker: &str| -> Vec<LogLevel> {
            captured
                .lock()
                .map(|lines| {
                    lines
                        .iter()
                        .filter(|(_, message)| message.ends_with(marker))
                        .map(|(level, _)| *level)
                        .collect()
                })
                .unwrap_or_default()
        };

        set_log_level(LogLevel::Warning);
        log("level-filter#1");
        log_info("level-filter#1");
        log_warning("level-filter#1");
        log_error("level-filter#1");

        set_log_level(LogLevel::Debug);
        log("level-filter#2");

        set_logger(Box::new(ConsoleLogger));

        assert_eq!(marked("level-filter#1"), vec![LogLevel::Warning, LogLevel::Error]);
        assert_eq!(marked("level-filter#2"), vec![LogLevel::Debug]);
    }
}
