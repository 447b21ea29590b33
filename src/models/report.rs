use serde::Serialize;
use std::fmt;

/// Tri-state result of a liveness probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Liveness {
    Alive,
    Dead,
    /// Transient failure; callers treat it as still alive
    Unknown,
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Liveness::Alive => write!(f, "alive"),
            Liveness::Dead => write!(f, "dead"),
            Liveness::Unknown => write!(f, "unknown"),
        }
    }
}

/// Upstream source that supplied a replacement stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchSource {
    Fuzzy,
    Exact,
}

impl fmt::Display for MatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchSource::Fuzzy => write!(f, "fuzzy"),
            MatchSource::Exact => write!(f, "exact"),
        }
    }
}

/// One stream replacement performed during reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamChange {
    pub channel: String,
    pub old_url: String,
    pub new_url: String,
    pub source: MatchSource,
}

/// Outcome of a reconciliation run
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub updated_fuzzy: usize,
    pub updated_exact: usize,
    pub unchanged: usize,
    /// Placeholder entries no source could repair
    pub unresolved: Vec<String>,
    /// Live entries that no upstream source knows about
    pub unmatched: Vec<String>,
    /// Channel ids whose dead-ledger record was removed
    pub cleared: Vec<String>,
    pub changes: Vec<StreamChange>,
}

impl ReconcileReport {
    pub fn updated(&self) -> usize {
        self.updated_fuzzy + self.updated_exact
    }
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "════════════════════════════════════")?;
        writeln!(
            f,
            "Updated:    {} channels ({} fuzzy, {} exact)",
            self.updated(),
            self.updated_fuzzy,
            self.updated_exact
        )?;
        writeln!(f, "Unchanged:  {} channels", self.unchanged)?;
        writeln!(f, "Unresolved: {} placeholder channels", self.unresolved.len())?;
        write!(f, "Cleared:    {} dead-ledger records", self.cleared.len())?;

        if !self.unresolved.is_empty() {
            write!(f, "\n\nNo replacement found for these placeholder channels:")?;
            for name in &self.unresolved {
                write!(f, "\n  - {}", name)?;
            }
        }

        if !self.unmatched.is_empty() {
            write!(f, "\n\nNot found in any upstream source (URL kept):")?;
            for name in &self.unmatched {
                write!(f, "\n  - {}", name)?;
            }
        }

        Ok(())
    }
}

/// A stream confirmed dead by the probing flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadStream {
    pub channel: String,
    pub url: String,
}

/// Outcome of a probing run
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    pub total: usize,
    pub skipped: usize,
    pub alive: usize,
    pub dead: usize,
    pub unknown: usize,
    pub dead_streams: Vec<DeadStream>,
    /// Channel ids whose recorded dead URL answered again
    pub recovered: Vec<String>,
    pub ledger_size: usize,
}

impl ProbeReport {
    pub fn record(&mut self, liveness: Liveness) {
        match liveness {
            Liveness::Alive => self.alive += 1,
            Liveness::Dead => self.dead += 1,
            Liveness::Unknown => self.unknown += 1,
        }
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "════════════════════════════════════")?;
        writeln!(
            f,
            "Alive: {}  Dead (set to placeholder): {}  Unknown (kept): {}  Skipped: {}",
            self.alive, self.dead, self.unknown, self.skipped
        )?;
        write!(
            f,
            "Dead ledger now holds {} records ({} recovered this run)",
            self.ledger_size,
            self.recovered.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_report_record() {
        let mut report = ProbeReport::default();
        report.record(Liveness::Alive);
        report.record(Liveness::Dead);
        report.record(Liveness::Unknown);
        report.record(Liveness::Unknown);

        assert_eq!(report.alive, 1);
        assert_eq!(report.dead, 1);
        assert_eq!(report.unknown, 2);
    }

    #[test]
    fn test_reconcile_report_display() {
        let report = ReconcileReport {
            updated_fuzzy: 2,
            updated_exact: 1,
            unchanged: 7,
            unresolved: vec!["CCTV-5 (CCTV5.cn)".to_string()],
            ..Default::default()
        };

        let text = report.to_string();
        assert!(text.contains("Updated:    3 channels (2 fuzzy, 1 exact)"));
        assert!(text.contains("Unchanged:  7 channels"));
        assert!(text.contains("  - CCTV-5 (CCTV5.cn)"));
        assert!(!text.contains("Not found in any upstream source"));
    }

    #[test]
    fn test_liveness_serialize() {
        let json = serde_json::to_string(&Liveness::Unknown).unwrap();
        assert_eq!(json, "\"unknown\"");
    }
}
