//! Order status resolution.
//!
//! [`resolve_status`] derives the single canonical [`OrderStatus`] from an order's
//! production document. It is pure: the stored `status` column is only a cache of
//! its result and is refreshed by every workflow mutation in [`crate::core::order`].
//! Nothing recomputes it on read.

use crate::{core::document::OrderDocument, entities::OrderStatus};

/// Computes the status of an order. The first matching rule wins:
///
/// 1. an unresolved issue note → `Has Issue`
/// 2. no approval file → `Order Received`
/// 3. open production steps → `In Process`
/// 4. QC not passed or not packed → `Needs Revision` if QC failed with notes,
///    otherwise `Finishing`
/// 5. no proof of receipt → `Shipping`
/// 6. otherwise → `Completed`
#[must_use]
pub fn resolve_status(document: &OrderDocument) -> OrderStatus {
    if document.open_issue_count() > 0 {
        return OrderStatus::HasIssue;
    }

    if !document.is_approved() {
        return OrderStatus::OrderReceived;
    }

    if !document.all_steps_complete() {
        return OrderStatus::InProcess;
    }

    if !document.qc.passed || !document.packing.packed {
        // A failed QC without notes is not a revision request
        if document.qc_failed_with_notes() {
            return OrderStatus::NeedsRevision;
        }
        return OrderStatus::Finishing;
    }

    if !document.has_receipt() {
        return OrderStatus::Shipping;
    }

    OrderStatus::Completed
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::document::{
        ApprovalRecord, IssueNote, PackingRecord, ProofRecord, QcRecord, StepKind, StepTemplate,
    };
    use chrono::{DateTime, TimeZone, Utc};

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 8, 30, 0).unwrap()
    }

    fn proof(file: &str) -> ProofRecord {
        ProofRecord {
            file_reference: file.to_string(),
            uploaded_by: "courier".to_string(),
            uploaded_at: at(),
        }
    }

    fn open_issue(id: u32) -> IssueNote {
        IssueNote {
            id,
            note: "screen torn".to_string(),
            reported_by: "op".to_string(),
            reported_at: at(),
            resolved: false,
            resolved_by: None,
            resolved_at: None,
            evidence_file_reference: None,
        }
    }

    /// A "dtf" order (two steps) that has gone all the way to receipt.
    fn completed_dtf() -> OrderDocument {
        let mut doc = OrderDocument::from_template(&[
            StepTemplate {
                name: "Print film".to_string(),
                kind: StepKind::UploadImage,
            },
            StepTemplate {
                name: "Press".to_string(),
                kind: StepKind::MarkComplete,
            },
        ]);
        doc.approval = Some(ApprovalRecord {
            file_reference: Some("design.pdf".to_string()),
            approved_by: "admin".to_string(),
            approved_at: at(),
        });
        for step in &mut doc.steps {
            step.completed = true;
        }
        doc.qc = QcRecord {
            passed: true,
            ..QcRecord::default()
        };
        doc.packing = PackingRecord {
            packed: true,
            ..PackingRecord::default()
        };
        doc.shipping.proof_of_shipment = Some(proof("resi.jpg"));
        doc.shipping.proof_of_receipt = Some(proof("received.jpg"));
        doc
    }

    #[test]
    fn test_completed_order() {
        assert_eq!(resolve_status(&completed_dtf()), OrderStatus::Completed);
    }

    #[test]
    fn test_unpacked_order_is_finishing() {
        let mut doc = completed_dtf();
        doc.packing.packed = false;
        assert_eq!(resolve_status(&doc), OrderStatus::Finishing);
    }

    #[test]
    fn test_failed_qc_with_notes_needs_revision() {
        let mut doc = completed_dtf();
        doc.qc = QcRecord {
            passed: false,
            notes: "colors bled".to_string(),
            checked_by: Some("qc".to_string()),
            checked_at: Some(at()),
        };
        assert_eq!(resolve_status(&doc), OrderStatus::NeedsRevision);
    }

    #[test]
    fn test_failed_qc_without_notes_is_finishing() {
        let mut doc = completed_dtf();
        doc.qc = QcRecord {
            passed: false,
            notes: "  ".to_string(),
            checked_by: Some("qc".to_string()),
            checked_at: Some(at()),
        };
        assert_eq!(resolve_status(&doc), OrderStatus::Finishing);
    }

    #[test]
    fn test_open_issue_overrides_every_state() {
        let mut variants = vec![OrderDocument::default(), completed_dtf()];
        let mut in_process = completed_dtf();
        in_process.steps[0].completed = false;
        variants.push(in_process);
        let mut revision = completed_dtf();
        revision.qc.passed = false;
        revision.qc.notes = "misaligned".to_string();
        variants.push(revision);

        for mut doc in variants {
            doc.issues.push(open_issue(1));
            assert_eq!(resolve_status(&doc), OrderStatus::HasIssue);
        }
    }

    #[test]
    fn test_missing_approval_is_order_received() {
        let mut doc = completed_dtf();
        doc.approval = None;
        assert_eq!(resolve_status(&doc), OrderStatus::OrderReceived);

        let mut doc = completed_dtf();
        doc.approval = Some(ApprovalRecord {
            file_reference: None,
            approved_by: "admin".to_string(),
            approved_at: at(),
        });
        assert_eq!(resolve_status(&doc), OrderStatus::OrderReceived);
    }

    #[test]
    fn test_open_step_is_in_process() {
        let mut doc = completed_dtf();
        doc.steps[1].completed = false;
        assert_eq!(resolve_status(&doc), OrderStatus::InProcess);
    }

    #[test]
    fn test_zero_steps_fall_through_to_qc() {
        let mut doc = completed_dtf();
        doc.steps.clear();
        doc.qc = QcRecord::default();
        assert_eq!(resolve_status(&doc), OrderStatus::Finishing);
    }

    #[test]
    fn test_missing_receipt_is_shipping() {
        let mut doc = completed_dtf();
        doc.shipping.proof_of_receipt = None;
        assert_eq!(resolve_status(&doc), OrderStatus::Shipping);

        // Shipment proof alone does not count as received
        doc.shipping.proof_of_shipment = None;
        assert_eq!(resolve_status(&doc), OrderStatus::Shipping);
    }

    #[test]
    fn test_resolving_last_issue_falls_back_to_natural_state() {
        let mut doc = completed_dtf();
        doc.packing.packed = false;
        doc.issues.push(open_issue(1));
        assert_eq!(resolve_status(&doc), OrderStatus::HasIssue);

        doc.issues[0].resolved = true;
        assert_eq!(resolve_status(&doc), OrderStatus::Finishing);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let mut doc = completed_dtf();
        doc.issues.push(open_issue(3));
        let first = resolve_status(&doc);
        let second = resolve_status(&doc);
        assert_eq!(first, second);
        assert_eq!(resolve_status(&completed_dtf()), resolve_status(&completed_dtf()));
    }
}
