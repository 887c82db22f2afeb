//! Rotating pool of gate endpoints.

use rand::Rng;

/// Gate used when no list is configured.
pub const DEFAULT_GATE: &str = "gate-001.up.railway.app";

/// Immutable set of gate endpoints, one of which is drawn per dispatch.
///
/// Built once from the comma-separated `VARCO_GATE_LIST` spec; refreshing
/// the pool means building a new one and swapping it at the owner.
#[derive(Debug, Clone)]
pub struct GatePool {
    gates: Vec<String>,
}

impl GatePool {
    /// Parse a comma-separated endpoint list into a pool.
    ///
    /// Entries are trimmed and empty entries dropped; a missing or
    /// effectively empty spec yields a pool holding only [`DEFAULT_GATE`],
    /// so the pool is never empty.
    #[must_use]
    pub fn from_spec(spec: Option<&str>) -> Self {
        let gates: Vec<String> = spec
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|gate| !gate.is_empty())
            .map(str::to_string)
            .collect();

        if gates.is_empty() {
            Self {
                gates: vec![DEFAULT_GATE.to_string()],
            }
        } else {
            Self { gates }
        }
    }

    /// Pick one gate uniformly at random.
    #[must_use]
    pub fn select(&self) -> &str {
        let index = rand::thread_rng().gen_range(0..self.gates.len());

        &self.gates[index]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }
}
