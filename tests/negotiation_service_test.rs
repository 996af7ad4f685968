use chrono::NaiveDate;
use negotiation_billing::config::Config;
use negotiation_billing::db::init_db;
use negotiation_billing::domain::{
    CaseRef, Decimal, GenerationFlags, InstallmentKind, InstallmentPatch, NegotiationId,
    NegotiationPatch, NegotiationTerms, NewNegotiation, Page,
};
use negotiation_billing::{NegotiationService, Repository, ServiceError};
use std::sync::Arc;
use tempfile::TempDir;

async fn setup() -> (NegotiationService, Arc<Repository>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();

    let pool = init_db(&db_path, 5).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));
    let service = NegotiationService::new(repo.clone(), Config::for_database(db_path));
    (service, repo, temp_dir)
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn flat_terms(debtor: &str) -> NegotiationTerms {
    NegotiationTerms::monthly(
        CaseRef::new(debtor)
            .with_case_number("0001234-56.2023.8.26.0100")
            .with_contract("CT-77"),
        dec("12000"),
        dec("0"),
        10,
        date(2024, 1, 1),
    )
}

#[tokio::test]
async fn test_create_generates_monthly_schedule() {
    let (service, repo, _temp) = setup().await;

    let created = service
        .create(NewNegotiation::new(flat_terms("ACME Ltda")))
        .await
        .unwrap();

    let report = created.generation.expect("generation should succeed");
    assert!(report.is_complete());
    assert_eq!(report.saved_count(), 10);
    assert_eq!(created.negotiation.flags, GenerationFlags::done());
    assert_eq!(created.negotiation.computed_installment_amount, dec("1200.00"));

    let stored = service.get(created.negotiation.id).await.unwrap();
    assert_eq!(stored.flags, GenerationFlags::done());
    assert_eq!(stored.computed_installment_amount, dec("1200.00"));

    let rows = repo.query_installments(created.negotiation.id).await.unwrap();
    assert_eq!(rows.len(), 10);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row.kind, InstallmentKind::Contract);
        assert_eq!(row.sequence_number, i as u32 + 1);
        assert_eq!(row.due_date, date(2024, i as u32 + 1, 2));
        assert_eq!(row.amount, dec("1200.00"));
        assert!(!row.is_paid);
        assert!(row.paid_amount.is_none());
    }
}

#[tokio::test]
async fn test_interest_bearing_schedule_amount() {
    let (service, repo, _temp) = setup().await;

    let terms = NegotiationTerms::monthly(
        CaseRef::new("Maria Souza"),
        dec("10000"),
        dec("2"),
        12,
        date(2024, 3, 15),
    );
    let created = service.create(NewNegotiation::new(terms)).await.unwrap();

    assert_eq!(created.negotiation.computed_installment_amount, dec("945.60"));
    let rows = repo.query_installments(created.negotiation.id).await.unwrap();
    assert_eq!(rows.len(), 12);
    assert!(rows.iter().all(|r| r.amount == dec("945.60")));
    assert_eq!(rows[0].due_date, date(2024, 3, 16));
    assert_eq!(rows[11].due_date, date(2025, 2, 16));
}

#[tokio::test]
async fn test_down_payment_schedule_is_persisted() {
    let (service, repo, _temp) = setup().await;

    let terms = flat_terms("Joao Silva").with_down_payment(dec("3000"), 3, date(2023, 12, 1));
    let created = service.create(NewNegotiation::new(terms)).await.unwrap();

    let report = created.generation.unwrap();
    assert_eq!(report.saved_count(), 13);

    let rows = repo.query_installments(created.negotiation.id).await.unwrap();
    let entries: Vec<_> = rows
        .iter()
        .filter(|r| r.kind == InstallmentKind::DownPayment)
        .collect();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|r| r.amount == dec("1000.00")));
    assert_eq!(entries[0].due_date, date(2023, 12, 2));
    assert_eq!(entries[1].due_date, date(2024, 1, 2));
    assert_eq!(entries[2].due_date, date(2024, 2, 2));

    // Down-payment entries do not touch the contract installment amount.
    assert_eq!(created.negotiation.computed_installment_amount, dec("1200.00"));
}

#[tokio::test]
async fn test_zero_down_payment_count_generates_nothing_but_clears_flag() {
    let (service, repo, _temp) = setup().await;

    let terms = flat_terms("Empresa X").with_down_payment(dec("500"), 0, date(2024, 1, 1));
    let created = service.create(NewNegotiation::new(terms)).await.unwrap();

    let rows = repo.query_installments(created.negotiation.id).await.unwrap();
    assert!(rows.iter().all(|r| r.kind == InstallmentKind::Contract));
    assert_eq!(rows.len(), 10);
    assert!(!created.negotiation.flags.needs_down_payment_schedule);
}

#[tokio::test]
async fn test_processing_twice_adds_no_rows() {
    let (service, repo, _temp) = setup().await;

    let created = service
        .create(NewNegotiation::new(flat_terms("ACME Ltda")))
        .await
        .unwrap();

    let report = service.retry_generation(created.negotiation.id).await.unwrap();
    assert!(report.is_noop());

    let rows = repo.query_installments(created.negotiation.id).await.unwrap();
    assert_eq!(rows.len(), 10);
}

#[tokio::test]
async fn test_invalid_terms_are_rejected_before_insert() {
    let (service, repo, _temp) = setup().await;

    let mut terms = flat_terms("ACME Ltda");
    terms.installment_count = 0;
    let result = service.create(NewNegotiation::new(terms)).await;
    assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));

    let mut terms = flat_terms("ACME Ltda");
    terms.first_installment_date = None;
    let result = service.create(NewNegotiation::new(terms)).await;
    assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));

    let page = repo.list_negotiations(None, Page::default()).await.unwrap();
    assert_eq!(page.total_records, 0);
}

#[tokio::test]
async fn test_duplicate_case_is_a_conflict() {
    let (service, _repo, _temp) = setup().await;

    service
        .create(NewNegotiation::new(flat_terms("ACME Ltda")))
        .await
        .unwrap();
    let result = service
        .create(NewNegotiation::new(flat_terms("ACME Ltda")))
        .await;
    assert!(matches!(result, Err(ServiceError::Conflict(_))));

    // Same debtor under another contract is a different case.
    let mut other = flat_terms("ACME Ltda");
    other.case.contract = Some("CT-78".to_string());
    service.create(NewNegotiation::new(other)).await.unwrap();
}

#[tokio::test]
async fn test_update_keeps_generation_state() {
    let (service, repo, _temp) = setup().await;

    let created = service
        .create(NewNegotiation::new(flat_terms("ACME Ltda")))
        .await
        .unwrap();
    let id = created.negotiation.id;

    let patch = NegotiationPatch {
        notes: Some("acordo homologado".to_string()),
        is_extrajudicial_homologation: Some(true),
        ..Default::default()
    };
    let updated = service.update(id, patch).await.unwrap();

    assert_eq!(updated.terms.notes.as_deref(), Some("acordo homologado"));
    assert!(updated.status.is_extrajudicial_homologation);
    assert_eq!(updated.flags, GenerationFlags::done());
    assert_eq!(updated.computed_installment_amount, dec("1200.00"));
    assert_eq!(repo.query_installments(id).await.unwrap().len(), 10);
}

#[tokio::test]
async fn test_update_rejects_invalid_values() {
    let (service, _repo, _temp) = setup().await;

    let created = service
        .create(NewNegotiation::new(flat_terms("ACME Ltda")))
        .await
        .unwrap();

    let patch = NegotiationPatch {
        discount: Some(dec("-1")),
        ..Default::default()
    };
    let result = service.update(created.negotiation.id, patch).await;
    assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));

    let result = service
        .update(NegotiationId::new(999), NegotiationPatch::default())
        .await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn test_update_into_existing_case_is_a_conflict() {
    let (service, _repo, _temp) = setup().await;

    service
        .create(NewNegotiation::new(flat_terms("ACME Ltda")))
        .await
        .unwrap();
    let other = service
        .create(NewNegotiation::new(flat_terms("Beta SA")))
        .await
        .unwrap();

    let patch = NegotiationPatch {
        debtor: Some("ACME Ltda".to_string()),
        ..Default::default()
    };
    let result = service.update(other.negotiation.id, patch).await;
    assert!(matches!(result, Err(ServiceError::Conflict(_))));
}

#[tokio::test]
async fn test_delete_cascades_to_installments() {
    let (service, repo, _temp) = setup().await;

    let created = service
        .create(NewNegotiation::new(flat_terms("ACME Ltda")))
        .await
        .unwrap();
    let id = created.negotiation.id;
    let first = repo.query_installments(id).await.unwrap()[0].id;

    service.delete(id).await.unwrap();

    assert!(matches!(service.get(id).await, Err(ServiceError::NotFound(_))));
    assert!(repo.query_installments(id).await.unwrap().is_empty());
    assert!(repo.get_installment(first).await.unwrap().is_none());
    assert!(matches!(service.delete(id).await, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn test_search_and_pagination() {
    let (service, _repo, _temp) = setup().await;

    for debtor in ["ACME Ltda", "Acme Comercio", "Beta SA", "Gama ME"] {
        service
            .create(NewNegotiation::new(flat_terms(debtor)))
            .await
            .unwrap();
    }

    let all = service.list(None, None).await.unwrap();
    assert_eq!(all.total_records, 4);
    // Newest first.
    assert_eq!(all.rows[0].terms.case.debtor, "Gama ME");

    let acme = service.list(Some("acme"), None).await.unwrap();
    assert_eq!(acme.total_records, 2);

    let by_contract = service.list(Some("CT-77"), None).await.unwrap();
    assert_eq!(by_contract.total_records, 4);

    let page = service.list(None, Some(Page::new(2, 3))).await.unwrap();
    assert_eq!(page.total_records, 4);
    assert_eq!(page.rows.len(), 1);
    assert_eq!(page.rows[0].terms.case.debtor, "ACME Ltda");

    // Wildcards in the search term match literally.
    let none = service.list(Some("%"), None).await.unwrap();
    assert_eq!(none.total_records, 0);
}

#[tokio::test]
async fn test_installment_listing_by_kind() {
    let (service, _repo, _temp) = setup().await;

    let terms = flat_terms("Joao Silva").with_down_payment(dec("900"), 2, date(2023, 12, 1));
    let created = service.create(NewNegotiation::new(terms)).await.unwrap();
    let id = created.negotiation.id;

    let contract = service
        .list_installments(id, InstallmentKind::Contract, Some(Page::new(1, 4)))
        .await
        .unwrap();
    assert_eq!(contract.total_records, 10);
    assert_eq!(contract.rows.len(), 4);
    assert_eq!(contract.rows[0].sequence_number, 1);

    let entries = service
        .list_installments(id, InstallmentKind::DownPayment, None)
        .await
        .unwrap();
    assert_eq!(entries.total_records, 2);
    assert!(entries.rows.iter().all(|r| r.amount == dec("450.00")));
}

#[tokio::test]
async fn test_record_payment() {
    let (service, repo, _temp) = setup().await;

    let created = service
        .create(NewNegotiation::new(flat_terms("ACME Ltda")))
        .await
        .unwrap();
    let installment = repo.query_installments(created.negotiation.id).await.unwrap()[0].clone();

    let patch = InstallmentPatch {
        paid_amount: Some(dec("1200.00")),
        paid_date: Some(date(2024, 1, 2)),
        payment_notes: Some("pix".to_string()),
        is_paid: Some(true),
        ..Default::default()
    };
    let paid = service.record_payment(installment.id, patch).await.unwrap();
    assert!(paid.is_paid);

    let stored = service.get_installment(installment.id).await.unwrap();
    assert!(stored.is_paid);
    assert_eq!(stored.paid_amount, Some(dec("1200.00")));
    assert_eq!(stored.paid_date, Some(date(2024, 1, 2)));
    assert_eq!(stored.payment_notes.as_deref(), Some("pix"));
    assert_eq!(stored.amount, installment.amount);
    assert_eq!(stored.due_date, installment.due_date);

    let negative = InstallmentPatch {
        paid_amount: Some(dec("-5")),
        ..Default::default()
    };
    let result = service.record_payment(installment.id, negative).await;
    assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_paid_amount_returned_equals_stored() {
    let (service, repo, _temp) = setup().await;

    let created = service
        .create(NewNegotiation::new(flat_terms("ACME Ltda")))
        .await
        .unwrap();
    let installment = repo.query_installments(created.negotiation.id).await.unwrap()[1].clone();

    let fractional = InstallmentPatch {
        paid_amount: Some(dec("102.505")),
        ..Default::default()
    };
    let result = service.record_payment(installment.id, fractional).await;
    assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));
    let untouched = service.get_installment(installment.id).await.unwrap();
    assert!(untouched.paid_amount.is_none());

    let patch = InstallmentPatch {
        paid_amount: Some(dec("102.5")),
        ..Default::default()
    };
    let returned = service.record_payment(installment.id, patch).await.unwrap();
    let stored = service.get_installment(installment.id).await.unwrap();
    assert_eq!(returned.paid_amount, stored.paid_amount);
    assert_eq!(stored.paid_amount, Some(dec("102.50")));
}

#[tokio::test]
async fn test_payments_keep_schedule_contiguous() {
    let (service, repo, _temp) = setup().await;

    let created = service
        .create(NewNegotiation::new(flat_terms("ACME Ltda")))
        .await
        .unwrap();
    let id = created.negotiation.id;

    for row in repo.query_installments(id).await.unwrap().iter().take(4) {
        let patch = InstallmentPatch {
            paid_amount: Some(row.amount),
            paid_date: Some(row.due_date),
            is_paid: Some(true),
            ..Default::default()
        };
        service.record_payment(row.id, patch).await.unwrap();
    }

    let rows = service
        .list_installments(id, InstallmentKind::Contract, Some(Page::new(1, 100)))
        .await
        .unwrap();
    assert_eq!(rows.total_records, 10);
    let sequences: Vec<u32> = rows.rows.iter().map(|r| r.sequence_number).collect();
    assert_eq!(sequences, (1..=10).collect::<Vec<_>>());
    assert_eq!(rows.rows.iter().filter(|r| r.is_paid).count(), 4);
}

#[tokio::test]
async fn test_oversized_installment_count_is_rejected() {
    let (service, repo, _temp) = setup().await;

    let mut terms = flat_terms("ACME Ltda");
    terms.principal = dec("1000000000");
    terms.installment_count = u32::MAX;
    let result = service.create(NewNegotiation::new(terms)).await;
    assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));

    let terms = flat_terms("Beta SA").with_down_payment(dec("500"), 5000, date(2024, 1, 1));
    let result = service.create(NewNegotiation::new(terms)).await;
    assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));

    let page = repo.list_negotiations(None, Page::default()).await.unwrap();
    assert_eq!(page.total_records, 0);
}
