use std::io;

use chrono::Local;
use fern::Dispatch;
use log::LevelFilter;

fn logging_level() -> LevelFilter {
    match std::env::var("VMC_DEBUG").as_deref() {
        Ok("trace") => LevelFilter::Trace,
        Ok("debug") => LevelFilter::Debug,
        Ok("info") => LevelFilter::Info,
        Ok("warn") => LevelFilter::Warn,
        Ok("error") => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

/// Route the `log` macros to stdout. Info level stays compact; every other
/// level adds a timestamp.
pub fn setup_logger() {
    let level_filter = logging_level();

    if let Err(e) = Dispatch::new()
        .format(move |out, message, record| {
            let file = record.file().unwrap_or("unknown_file");
            let line = record.line().unwrap_or(0);

            if level_filter == LevelFilter::Info {
                out.finish(format_args!(
                    "[{}]: {} <{}:{}>",
                    record.level(),
                    message,
                    file,
                    line,
                ));
            } else {
                out.finish(format_args!(
                    "[{}][{}]: {} <{}:{}>",
                    Local::now().format("%b-%d-%Y %H:%M:%S.%f"),
                    record.level(),
                    message,
                    file,
                    line,
                ));
            }
        })
        .level(level_filter)
        .chain(io::stdout())
        .apply()
    {
        eprintln!("Logger initialization failed: {e}");
    }
}
