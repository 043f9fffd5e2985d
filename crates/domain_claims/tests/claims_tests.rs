//! Claims Domain Service Tests
//!
//! Drives `ClaimService` against the in-memory gateway in both approval
//! modes.

use std::sync::Arc;

use core_kernel::{ApprovalStatus, LifecycleStatus, ShopId, WarrantyId, WarrantyPartId};
use domain_claims::{ClaimApprovalMode, ClaimChange, ClaimError, ClaimPartChange, ClaimService};
use test_utils::{
    car_part, date, new_claim, new_claim_part, seed_claim, seed_shop, seed_warranty, MemoryGateway,
    WriteKind,
};

use ApprovalStatus::{Approved, Pending, Rejected};
use LifecycleStatus::{Closed, Open};

// ============================================================================
// TEST FIXTURES
// ============================================================================

struct Setup {
    gateway: MemoryGateway,
    shop: ShopId,
    warranty: WarrantyId,
    parts: Vec<WarrantyPartId>,
}

/// Shop JH01 with warranty JH01-24112501 covering FWS, R1 and L1
async fn setup() -> Setup {
    let gateway = MemoryGateway::new();
    let shop = seed_shop(&gateway, "JH01").await.unwrap();
    let (warranty, parts) = seed_warranty(
        &gateway,
        shop,
        "JH01-24112501",
        Approved,
        &[
            (car_part("FWS"), Approved),
            (car_part("R1"), Approved),
            (car_part("L1"), Approved),
        ],
    )
    .await
    .unwrap();
    Setup {
        gateway,
        shop,
        warranty,
        parts,
    }
}

fn service(gateway: &MemoryGateway, mode: ClaimApprovalMode) -> ClaimService {
    ClaimService::new(Arc::new(gateway.clone()), mode)
}

fn part_change(
    id: Option<core_kernel::ClaimPartId>,
    warranty_part: WarrantyPartId,
) -> ClaimPartChange {
    ClaimPartChange {
        id,
        warranty_part_id: warranty_part,
        damaged_image_url: "https://cdn.example.com/damaged_images/new.jpg".into(),
        remarks: None,
        resolution_date: Some(date(2024, 12, 10)),
        resolution_image_url: Some("https://cdn.example.com/resolution_images/done.jpg".into()),
    }
}

// ============================================================================
// FILING
// ============================================================================

mod filing {
    use super::*;

    #[tokio::test]
    async fn test_claim_numbers_follow_warranty_and_date() {
        let s = setup().await;
        let claims = service(&s.gateway, ClaimApprovalMode::TriState);

        let first = claims
            .create_claim(
                new_claim(s.warranty, date(2024, 12, 1)),
                vec![new_claim_part(s.parts[0])],
            )
            .await
            .unwrap();
        let preview = claims
            .preview_claim_no("JH01-24112501", date(2024, 12, 1))
            .await
            .unwrap();
        let second = claims
            .create_claim(
                new_claim(s.warranty, date(2024, 12, 1)),
                vec![new_claim_part(s.parts[1])],
            )
            .await
            .unwrap();

        assert_eq!(first.parent.claim_no, "C241201-JH01-24112501-01");
        assert_eq!(preview, "C241201-JH01-24112501-02");
        assert_eq!(second.parent.claim_no, preview);
    }

    #[tokio::test]
    async fn test_preview_ignores_warranty_number_case() {
        let s = setup().await;
        let claims = service(&s.gateway, ClaimApprovalMode::TriState);
        claims
            .create_claim(
                new_claim(s.warranty, date(2024, 12, 1)),
                vec![new_claim_part(s.parts[0])],
            )
            .await
            .unwrap();

        let preview = claims
            .preview_claim_no(" jh01-24112501 ", date(2024, 12, 1))
            .await
            .unwrap();
        assert_eq!(preview, "C241201-JH01-24112501-02");
    }

    #[tokio::test]
    async fn test_new_claim_starts_pending_and_open() {
        let s = setup().await;
        let claims = service(&s.gateway, ClaimApprovalMode::TriState);

        let filed = claims
            .create_claim(
                new_claim(s.warranty, date(2024, 12, 1)),
                vec![new_claim_part(s.parts[0]), new_claim_part(s.parts[1])],
            )
            .await
            .unwrap();

        assert_eq!(filed.parent.approval_status, Pending);
        assert_eq!(filed.parent.status, Open);
        assert!(filed
            .children
            .iter()
            .all(|p| p.claim_id == filed.parent.id && p.status == Open));
    }

    #[tokio::test]
    async fn test_part_of_other_warranty_rejected() {
        let s = setup().await;
        let (_, other_parts) = seed_warranty(
            &s.gateway,
            s.shop,
            "JH01-24112502",
            Pending,
            &[(car_part("FWS"), Pending)],
        )
        .await
        .unwrap();
        let claims = service(&s.gateway, ClaimApprovalMode::TriState);

        let err = claims
            .create_claim(
                new_claim(s.warranty, date(2024, 12, 1)),
                vec![new_claim_part(s.parts[0]), new_claim_part(other_parts[0])],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ClaimError::ForeignWarrantyPart { .. }));
        assert_eq!(s.gateway.claim_count().await, 0);
    }

    #[tokio::test]
    async fn test_failed_part_insert_leaves_nothing() {
        let s = setup().await;
        let claims = service(&s.gateway, ClaimApprovalMode::TriState);
        s.gateway.fail_on(WriteKind::InsertClaimPart, 2);

        let result = claims
            .create_claim(
                new_claim(s.warranty, date(2024, 12, 1)),
                s.parts.iter().map(|p| new_claim_part(*p)).collect(),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(s.gateway.claim_count().await, 0);
        assert_eq!(s.gateway.claim_part_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_warranty_is_not_found() {
        let s = setup().await;
        let claims = service(&s.gateway, ClaimApprovalMode::TriState);

        let err = claims
            .create_claim(new_claim(WarrantyId::new(999), date(2024, 12, 1)), vec![])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_claims_listed_by_shop() {
        let s = setup().await;
        seed_claim(
            &s.gateway,
            s.warranty,
            "C241201-JH01-24112501-01",
            (Pending, Open),
            &[(s.parts[0], Pending, Open)],
        )
        .await
        .unwrap();
        let claims = service(&s.gateway, ClaimApprovalMode::TriState);

        assert_eq!(claims.list_by_shop(s.shop).await.unwrap().len(), 1);
        assert!(claims
            .list_by_shop(ShopId::new(12345))
            .await
            .unwrap()
            .is_empty());
    }
}

// ============================================================================
// OPEN / CLOSED STATUS
// ============================================================================

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn test_closing_last_open_part_closes_claim() {
        let s = setup().await;
        let (claim, parts) = seed_claim(
            &s.gateway,
            s.warranty,
            "C241201-JH01-24112501-01",
            (Pending, Open),
            &[(s.parts[0], Pending, Open), (s.parts[1], Pending, Open)],
        )
        .await
        .unwrap();
        let claims = service(&s.gateway, ClaimApprovalMode::TriState);

        let after_first = claims.set_part_status(parts[0], Closed).await.unwrap();
        assert_eq!(after_first.parent.status, Open);

        let after_second = claims.set_part_status(parts[1], Closed).await.unwrap();
        assert_eq!(after_second.parent.id, claim);
        assert_eq!(after_second.parent.status, Closed);
    }

    #[tokio::test]
    async fn test_reopening_any_part_reopens_claim() {
        let s = setup().await;
        let (claim, parts) = seed_claim(
            &s.gateway,
            s.warranty,
            "C241201-JH01-24112501-01",
            (Pending, Closed),
            &[(s.parts[0], Pending, Closed), (s.parts[1], Pending, Closed)],
        )
        .await
        .unwrap();
        let claims = service(&s.gateway, ClaimApprovalMode::TriState);

        claims.set_part_status(parts[1], Open).await.unwrap();

        assert_eq!(s.gateway.claim(claim).await.unwrap().status, Open);
    }

    #[tokio::test]
    async fn test_closing_claim_closes_every_part() {
        let s = setup().await;
        let (claim, _) = seed_claim(
            &s.gateway,
            s.warranty,
            "C241201-JH01-24112501-01",
            (Pending, Open),
            &[(s.parts[0], Pending, Open), (s.parts[1], Pending, Closed)],
        )
        .await
        .unwrap();
        let claims = service(&s.gateway, ClaimApprovalMode::TriState);

        let closed = claims.set_status(claim, Closed).await.unwrap();

        assert_eq!(closed.parent.status, Closed);
        assert!(closed.children.iter().all(|p| p.status == Closed));
    }

    #[tokio::test]
    async fn test_failed_status_cascade_changes_nothing() {
        let s = setup().await;
        let (claim, _) = seed_claim(
            &s.gateway,
            s.warranty,
            "C241201-JH01-24112501-01",
            (Pending, Open),
            &[(s.parts[0], Pending, Open), (s.parts[1], Pending, Open)],
        )
        .await
        .unwrap();
        let claims = service(&s.gateway, ClaimApprovalMode::TriState);
        s.gateway.fail_on(WriteKind::SetClaimPartStatus, 2);

        assert!(claims.set_status(claim, Closed).await.is_err());
        assert_eq!(s.gateway.claim(claim).await.unwrap().status, Open);
        assert!(s
            .gateway
            .claim_parts(claim)
            .await
            .iter()
            .all(|p| p.status == Open));
    }

    #[tokio::test]
    async fn test_adding_part_reopens_closed_claim() {
        let s = setup().await;
        let (claim, _) = seed_claim(
            &s.gateway,
            s.warranty,
            "C241201-JH01-24112501-01",
            (Pending, Closed),
            &[(s.parts[0], Pending, Closed)],
        )
        .await
        .unwrap();
        let claims = service(&s.gateway, ClaimApprovalMode::TriState);

        claims
            .add_part(claim, new_claim_part(s.parts[2]))
            .await
            .unwrap();

        assert_eq!(s.gateway.claim(claim).await.unwrap().status, Open);
    }
}

// ============================================================================
// APPROVAL
// ============================================================================

mod approval {
    use super::*;

    #[tokio::test]
    async fn test_tri_state_child_path() {
        let s = setup().await;
        let (claim, parts) = seed_claim(
            &s.gateway,
            s.warranty,
            "C241201-JH01-24112501-01",
            (Pending, Open),
            &[(s.parts[0], Approved, Open), (s.parts[1], Pending, Open)],
        )
        .await
        .unwrap();
        let claims = service(&s.gateway, ClaimApprovalMode::TriState);

        let approved = claims.set_part_approval(parts[1], Approved).await.unwrap();
        assert_eq!(approved.parent.approval_status, Approved);

        let mixed = claims.set_part_approval(parts[0], Rejected).await.unwrap();
        assert_eq!(mixed.parent.id, claim);
        assert_eq!(mixed.parent.approval_status, Pending);
    }

    #[tokio::test]
    async fn test_tri_state_rejection_cascades() {
        let s = setup().await;
        let (claim, _) = seed_claim(
            &s.gateway,
            s.warranty,
            "C241201-JH01-24112501-01",
            (Pending, Open),
            &[(s.parts[0], Approved, Open), (s.parts[1], Pending, Open)],
        )
        .await
        .unwrap();
        let claims = service(&s.gateway, ClaimApprovalMode::TriState);

        let rejected = claims.set_approval(claim, Rejected).await.unwrap();
        assert_eq!(rejected.parent.approval_status, Rejected);
        assert!(rejected.children.iter().all(|p| p.approval_status == Rejected));
    }

    #[tokio::test]
    async fn test_boolean_mode_refuses_rejected() {
        let s = setup().await;
        let (claim, parts) = seed_claim(
            &s.gateway,
            s.warranty,
            "C241201-JH01-24112501-01",
            (Pending, Open),
            &[(s.parts[0], Pending, Open)],
        )
        .await
        .unwrap();
        let claims = service(&s.gateway, ClaimApprovalMode::Boolean);

        let parent = claims.set_approval(claim, Rejected).await.unwrap_err();
        let child = claims.set_part_approval(parts[0], Rejected).await.unwrap_err();

        assert!(matches!(parent, ClaimError::Validation(_)));
        assert!(matches!(child, ClaimError::Validation(_)));
        assert_eq!(s.gateway.writes(WriteKind::SetClaimApproval), 1);
    }

    #[tokio::test]
    async fn test_boolean_mode_needs_every_part_approved() {
        let s = setup().await;
        let (claim, parts) = seed_claim(
            &s.gateway,
            s.warranty,
            "C241201-JH01-24112501-01",
            (Pending, Open),
            &[
                (s.parts[0], Pending, Open),
                (s.parts[1], Rejected, Open),
            ],
        )
        .await
        .unwrap();
        let claims = service(&s.gateway, ClaimApprovalMode::Boolean);

        // A stored REJECTED reads as not approved
        let partial = claims.set_part_approval(parts[0], Approved).await.unwrap();
        assert_eq!(partial.parent.approval_status, Pending);

        let full = claims.set_part_approval(parts[1], Approved).await.unwrap();
        assert_eq!(full.parent.id, claim);
        assert_eq!(full.parent.approval_status, Approved);
    }

    #[tokio::test]
    async fn test_boolean_mode_withdrawal_cascades_as_pending() {
        let s = setup().await;
        let (claim, _) = seed_claim(
            &s.gateway,
            s.warranty,
            "C241201-JH01-24112501-01",
            (Approved, Open),
            &[(s.parts[0], Approved, Open), (s.parts[1], Approved, Open)],
        )
        .await
        .unwrap();
        let claims = service(&s.gateway, ClaimApprovalMode::Boolean);

        let withdrawn = claims.set_approval(claim, Pending).await.unwrap();
        assert_eq!(withdrawn.parent.approval_status, Pending);
        assert!(withdrawn.children.iter().all(|p| p.approval_status == Pending));
    }
}

// ============================================================================
// COMPOSITE UPDATE
// ============================================================================

mod composite_update {
    use super::*;

    #[tokio::test]
    async fn test_dropping_open_part_closes_claim() {
        let s = setup().await;
        let (claim, parts) = seed_claim(
            &s.gateway,
            s.warranty,
            "C241201-JH01-24112501-01",
            (Pending, Open),
            &[(s.parts[0], Approved, Closed), (s.parts[1], Pending, Open)],
        )
        .await
        .unwrap();
        let claims = service(&s.gateway, ClaimApprovalMode::TriState);

        let updated = claims
            .update_claim(
                claim,
                ClaimChange {
                    claim_date: date(2024, 12, 2),
                },
                vec![part_change(Some(parts[0]), s.parts[0])],
            )
            .await
            .unwrap();

        assert_eq!(updated.children.len(), 1);
        assert_eq!(updated.parent.claim_date, date(2024, 12, 2));
        assert_eq!(updated.parent.status, Closed);
        assert_eq!(updated.parent.approval_status, Approved);
        assert_eq!(updated.parent.claim_no, "C241201-JH01-24112501-01");
        assert_eq!(updated.children[0].resolution_date, Some(date(2024, 12, 10)));
    }

    #[tokio::test]
    async fn test_foreign_part_in_update_rolls_back() {
        let s = setup().await;
        let (_, other_parts) = seed_warranty(
            &s.gateway,
            s.shop,
            "JH01-24112502",
            Pending,
            &[(car_part("FWS"), Pending)],
        )
        .await
        .unwrap();
        let (claim, parts) = seed_claim(
            &s.gateway,
            s.warranty,
            "C241201-JH01-24112501-01",
            (Pending, Open),
            &[(s.parts[0], Pending, Open)],
        )
        .await
        .unwrap();
        let claims = service(&s.gateway, ClaimApprovalMode::TriState);

        let err = claims
            .update_claim(
                claim,
                ClaimChange {
                    claim_date: date(2024, 12, 2),
                },
                vec![
                    part_change(Some(parts[0]), s.parts[0]),
                    part_change(None, other_parts[0]),
                ],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ClaimError::ForeignWarrantyPart { .. }));
        assert_eq!(
            s.gateway.claim(claim).await.unwrap().claim_date,
            date(2024, 12, 1)
        );
    }

    #[tokio::test]
    async fn test_deleting_claimed_warranty_part_conflicts() {
        let s = setup().await;
        seed_claim(
            &s.gateway,
            s.warranty,
            "C241201-JH01-24112501-01",
            (Pending, Open),
            &[(s.parts[1], Pending, Open)],
        )
        .await
        .unwrap();
        let warranties = domain_warranty::WarrantyService::new(Arc::new(s.gateway.clone()));

        let err = warranties
            .update_warranty(
                s.warranty,
                test_utils::warranty_change(date(2024, 11, 25)),
                vec![test_utils::warranty_part_change(Some(s.parts[0]), car_part("FWS"))],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, domain_warranty::WarrantyError::Port(ref e) if e.is_conflict()));
        assert_eq!(s.gateway.warranty_parts(s.warranty).await.len(), 3);
    }
}
