//! The order's production document and its pure transformations.
//!
//! An [`OrderDocument`] groups every sub-record the workflow touches: production
//! steps, design approval, QC, packing, shipping proofs and issue notes. It is
//! stored as one JSON column on the order.
//!
//! Every `with_*` / `without_*` method borrows the current document and returns a
//! new one, so callers never see their own copy change. Workflow rules that guard
//! a mutation (approval before production, QC before packing, ...) are enforced
//! here; computing the resulting status is left to
//! [`crate::core::status::resolve_status`].

use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What completing a step requires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    /// Completed by uploading a document (e.g. a print file)
    UploadDocument,
    /// Completed by uploading a photo
    UploadImage,
    /// Completed by ticking it off
    MarkComplete,
}

impl StepKind {
    /// Whether completing the step needs a file reference.
    #[must_use]
    pub const fn requires_file(self) -> bool {
        matches!(self, Self::UploadDocument | Self::UploadImage)
    }
}

/// One entry of a production type's step template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTemplate {
    /// Step name (e.g. "Print film")
    pub name: String,
    /// Completion kind
    pub kind: StepKind,
}

/// A production step copied into an order from its type's template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Position-based id, starting at 1
    pub id: u32,
    /// Step name
    pub name: String,
    /// Completion kind
    pub kind: StepKind,
    /// Whether the step is done
    #[serde(default)]
    pub completed: bool,
    /// Who completed it
    #[serde(default)]
    pub completed_by: Option<String>,
    /// When it was completed
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Uploaded file, for upload kinds
    #[serde(default)]
    pub file_reference: Option<String>,
}

/// Customer design approval. Production may not start without it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    /// Approved design file
    pub file_reference: Option<String>,
    /// Who uploaded the approval
    pub approved_by: String,
    /// When it was uploaded
    pub approved_at: DateTime<Utc>,
}

/// Quality-control decision. `passed == false` with empty notes means "not checked yet".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QcRecord {
    /// Whether the goods passed QC
    pub passed: bool,
    /// Revision notes when QC failed
    pub notes: String,
    /// Who ran the check
    pub checked_by: Option<String>,
    /// When the check ran
    pub checked_at: Option<DateTime<Utc>>,
}

/// Packing state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackingRecord {
    /// Whether the goods are packed
    pub packed: bool,
    /// Optional photo of the packed goods
    pub file_reference: Option<String>,
    /// Who packed
    pub packed_by: Option<String>,
    /// When it was packed
    pub packed_at: Option<DateTime<Utc>>,
}

/// An uploaded proof (shipment receipt, delivery confirmation).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofRecord {
    /// Uploaded file
    pub file_reference: String,
    /// Who uploaded it
    pub uploaded_by: String,
    /// When it was uploaded
    pub uploaded_at: DateTime<Utc>,
}

/// Shipping proofs; shipment and receipt are recorded independently.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingRecord {
    /// Proof the parcel was handed to the courier
    pub proof_of_shipment: Option<ProofRecord>,
    /// Proof the customer received it
    pub proof_of_receipt: Option<ProofRecord>,
}

/// A reported production problem ("kendala"). Open issues block the order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueNote {
    /// Id unique within the order
    pub id: u32,
    /// What went wrong
    pub note: String,
    /// Who reported it
    pub reported_by: String,
    /// When it was reported
    pub reported_at: DateTime<Utc>,
    /// Whether it has been dealt with
    #[serde(default)]
    pub resolved: bool,
    /// Who resolved it
    #[serde(default)]
    pub resolved_by: Option<String>,
    /// When it was resolved
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    /// Photo of the problem or of the fix
    #[serde(default)]
    pub evidence_file_reference: Option<String>,
}

/// Everything about an order's production progress.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderDocument {
    /// Ordered production steps
    pub steps: Vec<Step>,
    /// Design approval
    pub approval: Option<ApprovalRecord>,
    /// QC decision
    pub qc: QcRecord,
    /// Packing state
    pub packing: PackingRecord,
    /// Shipping proofs
    pub shipping: ShippingRecord,
    /// Issue notes, open and resolved
    pub issues: Vec<IssueNote>,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn require_file(file_reference: &str, what: &str) -> Result<String> {
    non_empty(file_reference).ok_or_else(|| Error::Validation {
        message: format!("{what} requires a file"),
    })
}

fn blocked(message: &str) -> Error {
    Error::InvalidTransition {
        message: message.to_string(),
    }
}

impl OrderDocument {
    /// Builds a fresh document with one open step per template entry.
    #[must_use]
    pub fn from_template(templates: &[StepTemplate]) -> Self {
        let steps = templates
            .iter()
            .zip(1..)
            .map(|(template, id)| Step {
                id,
                name: template.name.clone(),
                kind: template.kind,
                completed: false,
                completed_by: None,
                completed_at: None,
                file_reference: None,
            })
            .collect();

        Self {
            steps,
            ..Self::default()
        }
    }

    /// Whether an approval with a file is on record.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.approval
            .as_ref()
            .and_then(|approval| approval.file_reference.as_deref())
            .is_some_and(|file| !file.trim().is_empty())
    }

    /// Whether every step is complete. Vacuously true without steps.
    #[must_use]
    pub fn all_steps_complete(&self) -> bool {
        self.steps.iter().all(|step| step.completed)
    }

    /// Number of unresolved issue notes.
    #[must_use]
    pub fn open_issue_count(&self) -> usize {
        self.issues.iter().filter(|issue| !issue.resolved).count()
    }

    /// QC failed with revision notes.
    #[must_use]
    pub fn qc_failed_with_notes(&self) -> bool {
        !self.qc.passed && !self.qc.notes.trim().is_empty()
    }

    /// Whether a proof of receipt with a file is on record.
    #[must_use]
    pub fn has_receipt(&self) -> bool {
        self.shipping
            .proof_of_receipt
            .as_ref()
            .is_some_and(|proof| !proof.file_reference.trim().is_empty())
    }

    /// Looks up a step by id.
    #[must_use]
    pub fn step(&self, step_id: u32) -> Option<&Step> {
        self.steps.iter().find(|step| step.id == step_id)
    }

    /// Records the customer's design approval.
    ///
    /// # Errors
    /// `Validation` when the file reference is blank.
    pub fn with_approval(&self, file_reference: &str, by: &str, at: DateTime<Utc>) -> Result<Self> {
        let file = require_file(file_reference, "Approval")?;
        let mut next = self.clone();
        next.approval = Some(ApprovalRecord {
            file_reference: Some(file),
            approved_by: by.to_string(),
            approved_at: at,
        });
        Ok(next)
    }

    /// Marks a step complete. Steps may be completed in any order, but only
    /// after the design is approved.
    ///
    /// # Errors
    /// - `InvalidTransition` without approval or when the step is already done
    /// - `StepNotFound` for an unknown step id
    /// - `Validation` when an upload step gets no file
    pub fn with_step_completed(
        &self,
        step_id: u32,
        file_reference: Option<&str>,
        by: &str,
        at: DateTime<Utc>,
    ) -> Result<Self> {
        if !self.is_approved() {
            return Err(blocked("production cannot start before the design is approved"));
        }

        let mut next = self.clone();
        let step = next
            .steps
            .iter_mut()
            .find(|step| step.id == step_id)
            .ok_or(Error::StepNotFound { step_id })?;

        if step.completed {
            return Err(Error::InvalidTransition {
                message: format!("step '{}' is already complete", step.name),
            });
        }

        let file = file_reference.and_then(non_empty);
        if step.kind.requires_file() && file.is_none() {
            return Err(Error::Validation {
                message: format!("step '{}' requires an uploaded file", step.name),
            });
        }

        step.completed = true;
        step.completed_by = Some(by.to_string());
        step.completed_at = Some(at);
        step.file_reference = file;
        Ok(next)
    }

    /// Removes a step's uploaded file. Upload steps become open again since
    /// their completion depended on the file.
    ///
    /// Returns the new document and the removed file reference.
    ///
    /// # Errors
    /// `StepNotFound` for an unknown id, `Validation` when the step has no file.
    pub fn without_step_file(&self, step_id: u32) -> Result<(Self, String)> {
        let mut next = self.clone();
        let step = next
            .steps
            .iter_mut()
            .find(|step| step.id == step_id)
            .ok_or(Error::StepNotFound { step_id })?;

        let removed = step.file_reference.take().ok_or_else(|| Error::Validation {
            message: format!("step '{}' has no file", step.name),
        })?;

        if step.kind.requires_file() {
            step.completed = false;
            step.completed_by = None;
            step.completed_at = None;
        }
        Ok((next, removed))
    }

    /// Records a QC decision. A failing decision must carry revision notes.
    ///
    /// # Errors
    /// `InvalidTransition` while steps are open, `Validation` for a failure without notes.
    pub fn with_qc(&self, passed: bool, notes: &str, by: &str, at: DateTime<Utc>) -> Result<Self> {
        if !self.all_steps_complete() {
            return Err(blocked("QC needs every production step to be complete"));
        }
        let notes = notes.trim();
        if !passed && notes.is_empty() {
            return Err(Error::Validation {
                message: "a failed QC needs revision notes".to_string(),
            });
        }

        let mut next = self.clone();
        next.qc = QcRecord {
            passed,
            notes: notes.to_string(),
            checked_by: Some(by.to_string()),
            checked_at: Some(at),
        };
        Ok(next)
    }

    /// Closes a requested revision: the QC record goes back to "not checked"
    /// so the goods can be checked again.
    ///
    /// # Errors
    /// `InvalidTransition` unless QC failed with notes.
    pub fn with_revision_completed(&self) -> Result<Self> {
        if !self.qc_failed_with_notes() {
            return Err(blocked("no revision has been requested for this order"));
        }
        let mut next = self.clone();
        next.qc = QcRecord::default();
        Ok(next)
    }

    /// Marks the goods packed.
    ///
    /// # Errors
    /// `InvalidTransition` unless QC passed.
    pub fn with_packing(
        &self,
        file_reference: Option<&str>,
        by: &str,
        at: DateTime<Utc>,
    ) -> Result<Self> {
        if !self.qc.passed {
            return Err(blocked("packing needs a passed QC"));
        }
        let mut next = self.clone();
        next.packing = PackingRecord {
            packed: true,
            file_reference: file_reference.and_then(non_empty),
            packed_by: Some(by.to_string()),
            packed_at: Some(at),
        };
        Ok(next)
    }

    fn proof(&self, file_reference: &str, by: &str, at: DateTime<Utc>) -> Result<ProofRecord> {
        if !self.packing.packed {
            return Err(blocked("shipping proofs need the order to be packed"));
        }
        Ok(ProofRecord {
            file_reference: require_file(file_reference, "Shipping proof")?,
            uploaded_by: by.to_string(),
            uploaded_at: at,
        })
    }

    /// Records proof that the parcel left the shop.
    ///
    /// # Errors
    /// `InvalidTransition` before packing, `Validation` for a blank file.
    pub fn with_shipment_proof(
        &self,
        file_reference: &str,
        by: &str,
        at: DateTime<Utc>,
    ) -> Result<Self> {
        let proof = self.proof(file_reference, by, at)?;
        let mut next = self.clone();
        next.shipping.proof_of_shipment = Some(proof);
        Ok(next)
    }

    /// Records proof that the customer received the goods.
    ///
    /// # Errors
    /// `InvalidTransition` before packing, `Validation` for a blank file.
    pub fn with_receipt_proof(
        &self,
        file_reference: &str,
        by: &str,
        at: DateTime<Utc>,
    ) -> Result<Self> {
        let proof = self.proof(file_reference, by, at)?;
        let mut next = self.clone();
        next.shipping.proof_of_receipt = Some(proof);
        Ok(next)
    }

    /// Adds an open issue note and returns its id.
    ///
    /// # Errors
    /// `Validation` for a blank note.
    pub fn with_issue(
        &self,
        note: &str,
        evidence: Option<&str>,
        by: &str,
        at: DateTime<Utc>,
    ) -> Result<(Self, u32)> {
        let note = non_empty(note).ok_or_else(|| Error::Validation {
            message: "issue note cannot be empty".to_string(),
        })?;
        let id = self.issues.iter().map(|issue| issue.id).max().unwrap_or(0) + 1;

        let mut next = self.clone();
        next.issues.push(IssueNote {
            id,
            note,
            reported_by: by.to_string(),
            reported_at: at,
            resolved: false,
            resolved_by: None,
            resolved_at: None,
            evidence_file_reference: evidence.and_then(non_empty),
        });
        Ok((next, id))
    }

    /// Resolves an open issue. A new evidence file replaces the old one.
    ///
    /// # Errors
    /// `IssueNotFound` for an unknown id, `InvalidTransition` if already resolved.
    pub fn with_issue_resolved(
        &self,
        issue_id: u32,
        evidence: Option<&str>,
        by: &str,
        at: DateTime<Utc>,
    ) -> Result<Self> {
        let mut next = self.clone();
        let issue = next
            .issues
            .iter_mut()
            .find(|issue| issue.id == issue_id)
            .ok_or(Error::IssueNotFound { issue_id })?;

        if issue.resolved {
            return Err(Error::InvalidTransition {
                message: format!("issue {issue_id} is already resolved"),
            });
        }

        issue.resolved = true;
        issue.resolved_by = Some(by.to_string());
        issue.resolved_at = Some(at);
        if let Some(file) = evidence.and_then(non_empty) {
            issue.evidence_file_reference = Some(file);
        }
        Ok(next)
    }

    /// Drops an issue note entirely.
    ///
    /// # Errors
    /// `IssueNotFound` for an unknown id.
    pub fn without_issue(&self, issue_id: u32) -> Result<Self> {
        if !self.issues.iter().any(|issue| issue.id == issue_id) {
            return Err(Error::IssueNotFound { issue_id });
        }
        let mut next = self.clone();
        next.issues.retain(|issue| issue.id != issue_id);
        Ok(next)
    }

    /// Every file the document points at, for storage cleanup.
    #[must_use]
    pub fn file_references(&self) -> Vec<String> {
        let approval = self
            .approval
            .iter()
            .filter_map(|approval| approval.file_reference.clone());
        let steps = self
            .steps
            .iter()
            .filter_map(|step| step.file_reference.clone());
        let packing = self.packing.file_reference.clone();
        let shipping = [
            &self.shipping.proof_of_shipment,
            &self.shipping.proof_of_receipt,
        ]
        .into_iter()
        .flatten()
        .map(|proof| proof.file_reference.clone());
        let issues = self
            .issues
            .iter()
            .filter_map(|issue| issue.evidence_file_reference.clone());

        approval
            .chain(steps)
            .chain(packing)
            .chain(shipping)
            .chain(issues)
            .collect()
    }
}
