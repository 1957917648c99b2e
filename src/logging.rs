//! Logging initialisation for the `vcspull` binary.
//!
//! Verbosity is layered the same way the CLI surface describes it:
//! `RUST_LOG` wins if set, otherwise a repeated `-v`/`-q` count picks a
//! default filter level.

/// Build the default level string from a verbosity delta.
///
/// `delta` is `verbose_count - quiet_count`. 0 is "warn" (errors and
/// warnings only); each `-v` raises one step, each `-q` lowers one.
fn default_filter(delta: i32) -> &'static str {
    match delta {
        i32::MIN..=-1 => "off",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initialise `env_logger` honouring `RUST_LOG` over the computed default.
pub fn init(verbose: u8, quiet: u8) {
    let delta = verbose as i32 - quiet as i32;
    let filter = env_logger::Env::default().default_filter_or(default_filter(delta));
    env_logger::Builder::from_env(filter)
        .format_timestamp_millis()
        .init();
}

#[cfg(test)]
mod tests {
    use super::default_filter;

    #[test]
    fn quiet_disables_logging() {
        assert_eq!(default_filter(-1), "off");
    }

    #[test]
    fn default_is_warn() {
        assert_eq!(default_filter(0), "warn");
    }

    #[test]
    fn verbose_steps_up_through_trace() {
        assert_eq!(default_filter(1), "info");
        assert_eq!(default_filter(2), "debug");
        assert_eq!(default_filter(5), "trace");
    }
}
