use std::collections::BTreeMap;
use std::sync::Mutex;

use eyre::Result;
use tracing::{
    Level,
    field::{Field, Visit},
};
use tracing_subscriber::Layer;

static RECORD_MUTEX: Mutex<Vec<LogMessage>> = Mutex::new(vec![]);

/// A log event kept in memory so a host can show what the engine dropped or
/// clamped alongside the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    pub name: String,
    pub msg: String,
    pub level: Level,
}

struct RecordingLogger {}

struct FieldVisitor<'a>(&'a mut BTreeMap<String, String>);

impl Visit for FieldVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0
            .insert(field.name().to_string(), format!("{value:?}"));
    }
}

impl<S> Layer<S> for RecordingLogger
where
    S: tracing::Subscriber,
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut fields = BTreeMap::new();
        event.record(&mut FieldVisitor(&mut fields));

        if let Ok(mut records) = RECORD_MUTEX.lock() {
            records.push(LogMessage {
                name: event.metadata().module_path().unwrap_or("-").to_string(),
                msg: fields.get("message").cloned().unwrap_or("-".to_string()),
                level: *event.metadata().level(),
            });
        }
    }
}

/// Drains recorded messages at `level` or more severe.
pub fn take_recorded(level: Level) -> Vec<LogMessage> {
    let Ok(mut records) = RECORD_MUTEX.lock() else {
        return vec![];
    };
    records
        .drain(..)
        .filter(|record| record.level <= level)
        .collect()
}

/// Starts logging to stderr, filtered by `RUST_LOG` (default `info`), and
/// records warnings and errors for [`take_recorded`].
pub fn start_logging() -> Result<()> {
    use std::io::stderr;

    use tracing_subscriber::{Registry, filter::LevelFilter, fmt, layer::SubscriberExt};

    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let subscriber = Registry::default()
        .with(
            fmt::layer()
                .without_time()
                .with_writer(stderr)
                .with_filter(filter),
        )
        .with(RecordingLogger {}.with_filter(LevelFilter::WARN));

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use tracing::{info, subscriber::with_default, warn};
    use tracing_subscriber::{Registry, layer::SubscriberExt};

    use super::*;

    #[test]
    fn recorder_keeps_message_and_level() {
        let subscriber = Registry::default().with(RecordingLogger {});
        with_default(subscriber, || {
            info!("page clamped");
            warn!(column = "qty", "dropping filter");
        });

        let recorded = take_recorded(Level::TRACE);
        let ours: Vec<&LogMessage> = recorded
            .iter()
            .filter(|record| record.name.ends_with("logs::tests"))
            .collect();
        assert_eq!(ours.len(), 2);
        assert_eq!(ours[0].msg, "page clamped");
        assert_eq!(ours[1].level, Level::WARN);
        assert_eq!(ours[1].msg, "dropping filter");
    }
}
