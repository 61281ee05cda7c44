use tracing::Level;

pub fn init_logging() {
    init_logging_with_level(Level::INFO);
}

/// 重复调用无副作用：已安装订阅者时直接返回。
pub fn init_logging_with_level(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}
