use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::BoxError;

/// JSON logs up to `level`. Records from crates that use `log` (teloxide,
/// sqlx) are routed into the same subscriber.
pub fn init_tracing(level: Level) -> Result<(), BoxError> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .json()
        .with_span_events(FmtSpan::ENTER)
        .log_internal_errors(true)
        .with_line_number(true)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;

    Ok(())
}
