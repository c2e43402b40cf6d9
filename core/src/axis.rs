//! Human-readable axis labels.
//!
//! Parameter 1013 holds the axis name for each axis qualifier (`N1013A1PX`
//! names axis 1 "X"). Axes without a name fall back to `A<n>`.

use std::collections::BTreeMap;

use crate::model::ParameterStore;

pub const AXIS_NAME_PARAMETER: u64 = 1013;
pub const MAX_AXIS: u64 = 9;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AxisLabels {
    labels: BTreeMap<u64, String>,
}

impl AxisLabels {
    pub fn from_store(store: &ParameterStore) -> Self {
        let labels = (1..=MAX_AXIS)
            .map(|axis| {
                let key = format!("{AXIS_NAME_PARAMETER}_A{axis}");
                let label = match store.get(&key) {
                    Some(param) if !param.value.is_empty() => param.value.clone(),
                    _ => format!("A{axis}"),
                };
                (axis, label)
            })
            .collect();
        Self { labels }
    }

    /// Label for `axis`; axes outside 1..=9 render as their number.
    pub fn label(&self, axis: u64) -> String {
        self.labels
            .get(&axis)
            .cloned()
            .unwrap_or_else(|| axis.to_string())
    }
}
