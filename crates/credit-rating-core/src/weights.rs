use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Quantitative vs qualitative blend weights.
///
/// With both weights configured they are used verbatim. Otherwise the
/// blend is weighted by the number of items that actually scored on each
/// side, falling back to `(0, 0)` when neither side produced an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantitative: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualitative: Option<Decimal>,
}

impl WeightPolicy {
    /// True when both weights are pinned in configuration.
    pub fn is_fixed(&self) -> bool {
        self.quantitative.is_some() && self.qualitative.is_some()
    }

    /// Effective (quantitative, qualitative) weights for one run.
    pub fn effective_weights(&self, n_quant: usize, n_qual: usize) -> (Decimal, Decimal) {
        if let (Some(wq), Some(wl)) = (self.quantitative, self.qualitative) {
            return (wq, wl);
        }

        let total = n_quant + n_qual;
        if total == 0 {
            return (Decimal::ZERO, Decimal::ZERO);
        }
        let total = Decimal::from(total as u64);
        (
            Decimal::from(n_quant as u64) / total,
            Decimal::from(n_qual as u64) / total,
        )
    }
}
