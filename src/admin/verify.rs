use std::path::Path;

use serde::Serialize;

use crate::admin::util::open_existing;
use crate::admin::Result;
use crate::storage::llrb::Tree;
use crate::storage::options::StoreOptions;
use crate::storage::record::Record;
use crate::types::StoreError;

/// Indicates the severity level of a verification finding.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifySeverity {
    /// Informational message about the verification process.
    Info,
    /// Critical issue indicating data corruption or integrity failure.
    Error,
}

/// Represents a single issue discovered during verification.
#[derive(Clone, Debug, Serialize)]
pub struct VerifyFinding {
    /// The severity level of this finding.
    pub severity: VerifySeverity,
    /// Human-readable description of the issue.
    pub message: String,
}

impl VerifyFinding {
    fn info(message: impl Into<String>) -> Self {
        Self {
            severity: VerifySeverity::Info,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: VerifySeverity::Error,
            message: message.into(),
        }
    }
}

/// Record counts gathered while verifying.
#[derive(Clone, Debug, Default, Serialize)]
pub struct VerifyCounts {
    /// Flights decoded from the file.
    pub flights: usize,
    /// Customers decoded from the file.
    pub customers: usize,
}

/// Complete report of a verification operation.
#[derive(Clone, Debug, Serialize)]
pub struct VerifyReport {
    /// Whether verification finished without any error-level finding.
    pub success: bool,
    /// List of issues discovered during verification.
    pub findings: Vec<VerifyFinding>,
    /// Number of records examined per store.
    pub counts: VerifyCounts,
}

/// Decodes the database at `path` and checks both stores against the
/// red-black invariants.
///
/// Corrupt files are reported as findings rather than errors; only a missing
/// file or an I/O failure is returned as `Err`.
pub fn verify(path: impl AsRef<Path>, opts: &StoreOptions) -> Result<VerifyReport> {
    let relaxed = opts.verify_on_load(false);
    let mut findings = Vec::new();
    let mut counts = VerifyCounts::default();

    match open_existing(path.as_ref(), &relaxed) {
        Ok(db) => {
            counts.flights = db.flights().len();
            counts.customers = db.customers().len();
            check_store("flights", db.flights(), &mut findings);
            check_store("customers", db.customers(), &mut findings);
            findings.push(VerifyFinding::info(format!(
                "decoded {} flights and {} customers",
                counts.flights, counts.customers
            )));
        }
        Err(crate::admin::AdminError::Store(StoreError::CorruptData(msg))) => {
            findings.push(VerifyFinding::error(format!("decode failed: {msg}")));
        }
        Err(err) => return Err(err),
    }

    let success = !findings
        .iter()
        .any(|f| matches!(f.severity, VerifySeverity::Error));
    Ok(VerifyReport {
        success,
        findings,
        counts,
    })
}

fn check_store<R: Record>(name: &str, tree: &Tree<R>, findings: &mut Vec<VerifyFinding>) {
    if let Err(err) = tree.verify() {
        findings.push(VerifyFinding::error(format!("{name}: {err}")));
    }
}
