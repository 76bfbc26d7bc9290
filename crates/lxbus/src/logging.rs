use clap::ValueEnum;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> tracing::level_filters::LevelFilter {
        match self {
            LogLevel::Error => tracing::level_filters::LevelFilter::ERROR,
            LogLevel::Warn => tracing::level_filters::LevelFilter::WARN,
            LogLevel::Info => tracing::level_filters::LevelFilter::INFO,
            LogLevel::Debug => tracing::level_filters::LevelFilter::DEBUG,
            LogLevel::Trace => tracing::level_filters::LevelFilter::TRACE,
        }
    }

    /// Level needed to see the bus diagnostics requested on the command line.
    /// Bus diagnostics are emitted at `debug`, per-byte traces at `trace`.
    pub fn raised_for(self, bus_verbose: bool, trace_bytes: bool) -> Self {
        let needed = if trace_bytes {
            LogLevel::Trace
        } else if bus_verbose {
            LogLevel::Debug
        } else {
            LogLevel::Error
        };
        self.max(needed)
    }
}

pub fn init_logging(format: LogFormat, level: LogLevel) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level.as_filter())
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_flags_raise_level() {
        assert_eq!(LogLevel::Warn.raised_for(false, false), LogLevel::Warn);
        assert_eq!(LogLevel::Warn.raised_for(true, false), LogLevel::Debug);
        assert_eq!(LogLevel::Warn.raised_for(true, true), LogLevel::Trace);
        assert_eq!(LogLevel::Trace.raised_for(true, false), LogLevel::Trace);
    }
}
