// Logging setup. In the browser, events go to the devtools console.

/// Installs panic reporting and the console subscriber. Safe to call twice.
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    use tracing_subscriber::prelude::*;
    use tracing_wasm::{WASMLayer, WASMLayerConfigBuilder};

    console_error_panic_hook::set_once();

    let max_level = if cfg!(debug_assertions) {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let config = WASMLayerConfigBuilder::new()
        .set_max_level(max_level)
        .set_report_logs_in_timings(false)
        .build();
    let _ = tracing_subscriber::registry()
        .with(WASMLayer::new(config))
        .try_init();
}

#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {}
