use serde::Serialize;

/// Result of a pipeline stage that may have fallen back to a cheaper path.
///
/// Stages never hide a fallback: a `Degraded` value carries the reason the
/// preferred path was abandoned, so callers can report it.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Full(T),
    Degraded { value: T, reason: String },
}

impl<T> Outcome<T> {
    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        Outcome::Degraded {
            value,
            reason: reason.into(),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Outcome::Full(value) | Outcome::Degraded { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Full(value) | Outcome::Degraded { value, .. } => value,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Full(_) => None,
            Outcome::Degraded { reason, .. } => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Full(value) => Outcome::Full(f(value)),
            Outcome::Degraded { value, reason } => Outcome::Degraded {
                value: f(value),
                reason,
            },
        }
    }
}

/// How an uploaded document made it through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Processing {
    Full,
    Degraded,
    ShortDocument,
}

/// Collects degradation reasons from several stages.
#[derive(Debug, Default)]
pub struct StageNotes {
    notes: Vec<String>,
}

impl StageNotes {
    /// Record the outcome's reason (if any) under `stage` and hand back the value.
    pub fn take<T>(&mut self, stage: &str, outcome: Outcome<T>) -> T {
        if let Some(reason) = outcome.reason() {
            tracing::warn!(stage, reason, "stage degraded");
            self.notes.push(format!("{stage}: {reason}"));
        }
        outcome.into_value()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notes_only_collect_degraded_stages() {
        let mut notes = StageNotes::default();
        let a = notes.take("extract", Outcome::Full(1));
        let b = notes.take("summary", Outcome::degraded(2, "timed out"));
        assert_eq!((a, b), (1, 2));
        assert_eq!(notes.into_vec(), vec!["summary: timed out".to_string()]);
    }

    #[test]
    fn map_keeps_reason() {
        let out = Outcome::degraded("abc", "fallback").map(str::len);
        assert_eq!(out.reason(), Some("fallback"));
        assert_eq!(*out.value(), 3);
    }
}
