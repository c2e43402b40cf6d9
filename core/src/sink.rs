use crate::diff::{ChangeRecord, DiffError};

/// Trait for streaming change records to a consumer (a renderer, a
/// collector, a writer).
pub trait ChangeSink {
    /// Called once before any records are emitted.
    ///
    /// Default is a no-op so sinks that don't need setup can ignore it.
    fn begin(&mut self) -> Result<(), DiffError> {
        Ok(())
    }

    fn emit(&mut self, change: ChangeRecord) -> Result<(), DiffError>;

    fn finish(&mut self) -> Result<(), DiffError> {
        Ok(())
    }
}

/// A sink that collects records into a Vec.
#[derive(Debug, Default)]
pub struct VecSink {
    changes: Vec<ChangeRecord>,
}

impl VecSink {
    pub fn new() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    pub fn into_changes(self) -> Vec<ChangeRecord> {
        self.changes
    }
}

impl ChangeSink for VecSink {
    fn emit(&mut self, change: ChangeRecord) -> Result<(), DiffError> {
        self.changes.push(change);
        Ok(())
    }
}

/// A sink that forwards records to a callback.
pub struct CallbackSink<F: FnMut(ChangeRecord)> {
    f: F,
}

impl<F: FnMut(ChangeRecord)> CallbackSink<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F: FnMut(ChangeRecord)> ChangeSink for CallbackSink<F> {
    fn emit(&mut self, change: ChangeRecord) -> Result<(), DiffError> {
        (self.f)(change);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{ChangeKind, diff_stores_streaming};
    use crate::model::{Parameter, ParameterStore};

    struct FailingSink {
        begun: bool,
    }

    impl ChangeSink for FailingSink {
        fn begin(&mut self) -> Result<(), DiffError> {
            self.begun = true;
            Ok(())
        }

        fn emit(&mut self, _change: ChangeRecord) -> Result<(), DiffError> {
            Err(DiffError::SinkError {
                message: "rejected".to_string(),
            })
        }
    }

    #[test]
    fn callback_sink_sees_every_change_in_order() {
        let old: ParameterStore = vec![Parameter::new(2, "a")].into_iter().collect();
        let new: ParameterStore = vec![Parameter::new(1, "b")].into_iter().collect();

        let mut seen = Vec::new();
        let mut sink = CallbackSink::new(|change: ChangeRecord| seen.push((change.key(), change.kind)));
        let summary = diff_stores_streaming(&old, &new, &mut sink).expect("diff");

        assert_eq!(summary.total(), 2);
        assert_eq!(
            seen,
            vec![
                ("1".to_string(), ChangeKind::Added),
                ("2".to_string(), ChangeKind::Removed)
            ]
        );
    }

    #[test]
    fn sink_errors_propagate() {
        let old = ParameterStore::new();
        let new: ParameterStore = vec![Parameter::new(1, "b")].into_iter().collect();
        let mut sink = FailingSink { begun: false };

        let err = diff_stores_streaming(&old, &new, &mut sink).expect_err("sink should fail");
        assert!(sink.begun);
        assert!(matches!(err, DiffError::SinkError { .. }));
    }

    #[test]
    fn no_changes_still_begins_and_finishes() {
        let store: ParameterStore = vec![Parameter::new(1, "b")].into_iter().collect();
        let mut sink = VecSink::new();
        let summary = diff_stores_streaming(&store, &store, &mut sink).expect("diff");
        assert_eq!(summary.total(), 0);
        assert!(sink.into_changes().is_empty());
    }
}
