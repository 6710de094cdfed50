use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};
use std::env;
use std::fs;
use std::io;

const LOG_FILE: &str = "log.txt";

/// Initialize logging: console plus a per-session `log.txt`.
pub fn init_logging() {
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let enable_wgpu_logging = env::var("WGPU_LOG").map(|v| v == "1").unwrap_or(false);
    let enable_backtrace = env::var("RUST_BACKTRACE").map(|v| v == "1").unwrap_or(false);

    // Remove the previous session's log
    if let Err(e) = fs::remove_file(LOG_FILE) {
        if e.kind() != io::ErrorKind::NotFound {
            eprintln!("Warning: Failed to remove existing {}: {}", LOG_FILE, e);
        }
    }
    let log_file = match fs::File::create(LOG_FILE) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Warning: File logging disabled, cannot create {}: {}", LOG_FILE, e);
            None
        }
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = EnvFilter::new(&log_level);

        if enable_wgpu_logging {
            for directive in ["wgpu=debug", "wgpu_core=debug", "wgpu_hal=debug", "naga=debug"] {
                if let Ok(directive) = directive.parse() {
                    filter = filter.add_directive(directive);
                }
            }
        }
        if let Ok(directive) = "terrain_viewer=debug".parse() {
            filter = filter.add_directive(directive);
        }
        filter
    });

    let file_layer = log_file.map(|file| {
        fmt::layer()
            .with_writer(file)
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false) // No ANSI codes in file
            .boxed()
    });

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(true)
        )
        .with(file_layer);

    if subscriber.try_init().is_err() {
        // A subscriber is already installed (e.g. by a test harness).
        return;
    }

    std::panic::set_hook(Box::new(move |panic_info| {
        tracing::error!("Panic occurred: {}", panic_info);

        if let Some(location) = panic_info.location() {
            tracing::error!(
                "Panic location: {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            );
        }

        if enable_backtrace {
            tracing::error!("Backtrace:\n{:?}", std::backtrace::Backtrace::capture());
        }
    }));

    tracing::info!("Logging initialized with level: {}", log_level);
    tracing::info!("File logging: {}", LOG_FILE);
    tracing::info!("WGPU logging enabled: {}", enable_wgpu_logging);
}

/// Log system information for debugging
pub fn log_system_info() {
    tracing::info!("=== System Information ===");
    tracing::info!("OS: {}", std::env::consts::OS);
    tracing::info!("Architecture: {}", std::env::consts::ARCH);
    tracing::info!("{} version: {}", crate::APP_NAME, crate::VERSION);

    if let Ok(backend) = env::var("WGPU_BACKEND") {
        tracing::info!("WGPU Backend: {}", backend);
    }
    tracing::info!("==========================");
}

/// Log wgpu adapter information
pub fn log_adapter_info(adapter: &wgpu::Adapter) {
    let info = adapter.get_info();
    tracing::info!("=== WGPU Adapter Information ===");
    tracing::info!("Name: {}", info.name);
    tracing::info!("Backend: {:?}", info.backend);
    tracing::info!("Device Type: {:?}", info.device_type);
    tracing::info!("Driver: {} {}", info.driver, info.driver_info);
    tracing::info!(
        "Line polygon mode: {}",
        adapter.features().contains(wgpu::Features::POLYGON_MODE_LINE)
    );
    tracing::info!("=================================");
}
