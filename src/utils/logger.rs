use env_logger::{Builder, Env, Target};

/// Initialise the global logger. `RUST_LOG` takes precedence over `default_level`.
pub fn setup_logger(default_level: &str) {
    Builder::from_env(Env::default().default_filter_or(default_level))
        .target(Target::Stdout)
        .init();
}
