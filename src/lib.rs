pub mod app;
pub mod demo;
pub mod renderer;
pub mod scene;
pub mod settings;

use app::App;
use settings::RenderSettings;
use winit::event_loop::EventLoop;

/// Installs `env_logger` at `Info`, overridable with `RUST_LOG`. Safe to call more than once.
pub fn init_logging() {
    let _ = logger_builder(env_logger::DEFAULT_FILTER_ENV).try_init();
}

/// `filter_var` wins over the `info` default when set.
fn logger_builder(filter_var: &str) -> env_logger::Builder {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or(filter_var, "info"))
}

pub fn run() -> Result<(), winit::error::EventLoopError> {
    init_logging();

    let settings = RenderSettings::load();
    log::info!("Starting kamikaze renderer ({:?} shading)", settings.shading);

    let event_loop = EventLoop::new()?;
    let mut app = App::new(settings);

    let result = event_loop.run_app(&mut app);

    if let Err(ref err) = result {
        log::error!("Application error: {}", err);
    }

    log::info!("Application shutdown complete");

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logger_defaults_to_info() {
        let logger = logger_builder("KAMIKAZE_TEST_LOG_UNSET").build();
        assert_eq!(logger.filter(), log::LevelFilter::Info);
    }

    #[test]
    fn filter_variable_overrides_default_level() {
        std::env::set_var("KAMIKAZE_TEST_LOG_DEBUG", "debug");
        let logger = logger_builder("KAMIKAZE_TEST_LOG_DEBUG").build();
        assert_eq!(logger.filter(), log::LevelFilter::Debug);
    }
}
