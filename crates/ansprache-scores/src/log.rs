//! Logging-Shims: mit `telemetry` über `tracing`, sonst `eprintln!`.

macro_rules! warn_event {
    ($($arg:tt)*) => {{
        #[cfg(feature = "telemetry")]
        tracing::warn!($($arg)*);
        #[cfg(not(feature = "telemetry"))]
        eprintln!("warning: {}", format_args!($($arg)*));
    }};
}

macro_rules! debug_event {
    ($($arg:tt)*) => {{
        #[cfg(feature = "telemetry")]
        tracing::debug!($($arg)*);
        #[cfg(not(feature = "telemetry"))]
        let _ = format_args!($($arg)*);
    }};
}

pub(crate) use debug_event;
pub(crate) use warn_event;
