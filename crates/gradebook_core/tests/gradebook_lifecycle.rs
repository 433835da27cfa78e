use chrono::NaiveDate;
use gradebook_core::db::open_db_in_memory;
use gradebook_core::{
    Category, CategoryPayload, ErrorKind, GradebookEntity, GradebookService, GradebookStore,
    InMemoryGradebookStore, LineItem, LineItemPayload, ListQuery, PageRequest, ResultPayload,
    ScopeSet, ScoreStatus, SqliteGradebookStore, Status,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::str::FromStr;
use uuid::Uuid;

fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

fn window<E>(offset: u32, limit: u32) -> ListQuery<E> {
    ListQuery::from(PageRequest::new(offset, limit).unwrap())
}

fn query<E: GradebookEntity>(filter: Option<&str>, sort: Option<&str>) -> ListQuery<E> {
    ListQuery::parse(PageRequest::default(), filter, sort, None).unwrap()
}

fn category(title: &str) -> CategoryPayload {
    CategoryPayload {
        title: Some(title.to_string()),
        ..CategoryPayload::default()
    }
}

fn line_item(title: &str, category: Option<&str>) -> LineItemPayload {
    LineItemPayload {
        title: Some(title.to_string()),
        category_sourced_id: category.map(str::to_string),
        ..LineItemPayload::default()
    }
}

fn result(student_id: &str, line_item: &str) -> ResultPayload {
    ResultPayload {
        student_id: Some(student_id.to_string()),
        line_item_sourced_id: Some(line_item.to_string()),
        ..ResultPayload::default()
    }
}

fn sqlite_service(conn: &Connection) -> GradebookService<SqliteGradebookStore<'_>> {
    GradebookService::new(SqliteGradebookStore::try_new(conn).unwrap())
}

fn memory_service() -> GradebookService<InMemoryGradebookStore> {
    GradebookService::new(InMemoryGradebookStore::new())
}

fn roundtrip_keeps_supplied_fields<S: GradebookStore>(service: &GradebookService<S>) {
    let scopes = ScopeSet::all();
    let payload = CategoryPayload {
        sourced_id: Some("cat-1".to_string()),
        title: Some("Homework".to_string()),
        weight: Some(dec("0.30")),
        metadata: Some(r#"{"term":"fall"}"#.to_string()),
    };
    let created = service.create_category(&scopes, &payload).unwrap();
    let loaded = service.get_category(&scopes, "cat-1").unwrap();

    assert_eq!(loaded, created);
    assert_eq!(loaded.title, "Homework");
    assert_eq!(loaded.weight, Some(dec("0.30")));
    assert_eq!(loaded.base.metadata.as_deref(), Some(r#"{"term":"fall"}"#));
    assert_eq!(loaded.base.status, Status::Active);
}

#[test]
fn create_then_get_roundtrips_on_sqlite() {
    let conn = open_db_in_memory().unwrap();
    roundtrip_keeps_supplied_fields(&sqlite_service(&conn));
}

#[test]
fn create_then_get_roundtrips_in_memory() {
    roundtrip_keeps_supplied_fields(&memory_service());
}

fn explicit_duplicate_id_is_rejected<S: GradebookStore>(service: &GradebookService<S>) {
    let scopes = ScopeSet::all();
    let mut payload = category("Homework");
    payload.sourced_id = Some("cat-dup".to_string());

    service.create_category(&scopes, &payload).unwrap();
    service.delete_category(&scopes, "cat-dup").unwrap();

    let err = service.create_category(&scopes, &payload).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateResource);
    assert_eq!(
        err.to_string(),
        "Category with sourcedId already exists: cat-dup"
    );
}

#[test]
fn duplicate_sourced_id_fails_on_sqlite() {
    let conn = open_db_in_memory().unwrap();
    explicit_duplicate_id_is_rejected(&sqlite_service(&conn));
}

#[test]
fn duplicate_sourced_id_fails_in_memory() {
    explicit_duplicate_id_is_rejected(&memory_service());
}

fn generated_ids_are_fresh_uuids<S: GradebookStore>(service: &GradebookService<S>) {
    let scopes = ScopeSet::all();
    let mut seen = HashSet::new();
    for index in 0..5 {
        let created = service
            .create_category(&scopes, &category(&format!("c{index}")))
            .unwrap();
        assert!(Uuid::parse_str(&created.base.sourced_id).is_ok());
        assert!(seen.insert(created.base.sourced_id));
    }

    let empty_id = CategoryPayload {
        sourced_id: Some(String::new()),
        ..category("empty id")
    };
    let created = service.create_category(&scopes, &empty_id).unwrap();
    assert!(Uuid::parse_str(&created.base.sourced_id).is_ok());
}

#[test]
fn default_identity_on_sqlite() {
    let conn = open_db_in_memory().unwrap();
    generated_ids_are_fresh_uuids(&sqlite_service(&conn));
}

#[test]
fn default_identity_in_memory() {
    generated_ids_are_fresh_uuids(&memory_service());
}

fn numeric_bounds_are_enforced<S: GradebookStore>(service: &GradebookService<S>) {
    let scopes = ScopeSet::all();

    let too_heavy = CategoryPayload {
        weight: Some(dec("1.5")),
        ..category("Heavy")
    };
    let err = service.create_category(&scopes, &too_heavy).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    assert_eq!(
        err.field_errors().unwrap().get("weight"),
        Some("Weight must be at most 1.0")
    );

    let fine = CategoryPayload {
        weight: Some(dec("0.5")),
        ..category("Fine")
    };
    service.create_category(&scopes, &fine).unwrap();

    let item = service
        .create_line_item(&scopes, &line_item("Quiz", None))
        .unwrap();

    let over = ResultPayload {
        score_percent: Some(dec("1.2")),
        ..result("s1", &item.base.sourced_id)
    };
    let err = service.create_result(&scopes, &over).unwrap_err();
    assert_eq!(
        err.field_errors().unwrap().get("scorePercent"),
        Some("Score percent must be at most 1.0")
    );

    let within = ResultPayload {
        score_percent: Some(dec("0.9")),
        ..result("s1", &item.base.sourced_id)
    };
    service.create_result(&scopes, &within).unwrap();

    let negative = LineItemPayload {
        score_maximum: Some(dec("-1")),
        ..line_item("Negative", None)
    };
    let err = service.create_line_item(&scopes, &negative).unwrap_err();
    assert_eq!(
        err.field_errors().unwrap().get("scoreMaximum"),
        Some("Score maximum must be at least 0.0")
    );
}

#[test]
fn bounds_on_sqlite() {
    let conn = open_db_in_memory().unwrap();
    numeric_bounds_are_enforced(&sqlite_service(&conn));
}

#[test]
fn bounds_in_memory() {
    numeric_bounds_are_enforced(&memory_service());
}

fn references_must_resolve<S: GradebookStore>(service: &GradebookService<S>) {
    let scopes = ScopeSet::all();

    let err = service
        .create_line_item(&scopes, &line_item("Orphan", Some("does-not-exist")))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "Category not found: does-not-exist");

    let loose = service
        .create_line_item(&scopes, &line_item("Loose", None))
        .unwrap();
    assert_eq!(loose.category_sourced_id, None);

    let missing = ResultPayload {
        student_id: Some("s1".to_string()),
        ..ResultPayload::default()
    };
    let err = service.create_result(&scopes, &missing).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    assert_eq!(
        err.field_errors().unwrap().get("lineItemSourcedId"),
        Some("Line item sourced ID is required")
    );

    let err = service
        .create_result(&scopes, &result("s1", "li-missing"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let page = service
        .list_results(&scopes, &ListQuery::default())
        .unwrap();
    assert_eq!(page.total_count, 0);
}

#[test]
fn referential_integrity_on_sqlite() {
    let conn = open_db_in_memory().unwrap();
    references_must_resolve(&sqlite_service(&conn));
}

#[test]
fn referential_integrity_in_memory() {
    references_must_resolve(&memory_service());
}

fn delete_is_idempotent_and_does_not_cascade<S: GradebookStore>(service: &GradebookService<S>) {
    let scopes = ScopeSet::all();
    let parent = service
        .create_category(&scopes, &category("Homework"))
        .unwrap();
    let child = service
        .create_line_item(
            &scopes,
            &line_item("Quiz", Some(parent.base.sourced_id.as_str())),
        )
        .unwrap();

    service
        .delete_category(&scopes, &parent.base.sourced_id)
        .unwrap();
    let first = service
        .get_category(&scopes, &parent.base.sourced_id)
        .unwrap();
    service
        .delete_category(&scopes, &parent.base.sourced_id)
        .unwrap();
    let second = service
        .get_category(&scopes, &parent.base.sourced_id)
        .unwrap();

    assert_eq!(first.base.status, Status::ToBeDeleted);
    assert_eq!(second.base.status, Status::ToBeDeleted);
    assert!(second.base.date_last_modified >= first.base.date_last_modified);

    let child_after = service
        .get_line_item(&scopes, &child.base.sourced_id)
        .unwrap();
    assert_eq!(child_after.base.status, Status::Active);
    assert_eq!(
        child_after.category_sourced_id.as_deref(),
        Some(parent.base.sourced_id.as_str())
    );

    let listed = service
        .list_categories(&scopes, &ListQuery::default())
        .unwrap();
    assert_eq!(listed.total_count, 1);

    let err = service.delete_category(&scopes, "missing").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn soft_delete_on_sqlite() {
    let conn = open_db_in_memory().unwrap();
    delete_is_idempotent_and_does_not_cascade(&sqlite_service(&conn));
}

#[test]
fn soft_delete_in_memory() {
    delete_is_idempotent_and_does_not_cascade(&memory_service());
}

fn sparse_update_keeps_omitted_fields<S: GradebookStore>(service: &GradebookService<S>) {
    let scopes = ScopeSet::all();
    let item = service
        .create_line_item(&scopes, &line_item("Quiz", None))
        .unwrap();
    let created = service
        .create_result(
            &scopes,
            &ResultPayload {
                score: Some(dec("7.5")),
                score_status: Some(ScoreStatus::EarnedPartial),
                ..result("s1", &item.base.sourced_id)
            },
        )
        .unwrap();

    let patch = ResultPayload {
        comment: Some("x".to_string()),
        ..ResultPayload::default()
    };
    let updated = service
        .update_result(&scopes, &created.base.sourced_id, &patch)
        .unwrap();

    assert_eq!(updated.comment.as_deref(), Some("x"));
    assert_eq!(updated.score, Some(dec("7.5")));
    assert_eq!(updated.score_status, Some(ScoreStatus::EarnedPartial));
    assert_eq!(updated.line_item_sourced_id, item.base.sourced_id);
    assert_eq!(updated.student_id, "s1");
    assert!(updated.base.date_last_modified >= created.base.date_last_modified);
}

#[test]
fn sparse_update_on_sqlite() {
    let conn = open_db_in_memory().unwrap();
    sparse_update_keeps_omitted_fields(&sqlite_service(&conn));
}

#[test]
fn sparse_update_in_memory() {
    sparse_update_keeps_omitted_fields(&memory_service());
}

fn failed_update_leaves_record_untouched<S: GradebookStore>(service: &GradebookService<S>) {
    let scopes = ScopeSet::all();
    let home = service
        .create_category(&scopes, &category("Homework"))
        .unwrap();
    let exams = service.create_category(&scopes, &category("Exams")).unwrap();
    let item = service
        .create_line_item(
            &scopes,
            &line_item("Quiz", Some(home.base.sourced_id.as_str())),
        )
        .unwrap();

    let bad_reference = LineItemPayload {
        title: Some("Renamed".to_string()),
        category_sourced_id: Some("nope".to_string()),
        ..LineItemPayload::default()
    };
    let err = service
        .update_line_item(&scopes, &item.base.sourced_id, &bad_reference)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let unchanged = service
        .get_line_item(&scopes, &item.base.sourced_id)
        .unwrap();
    assert_eq!(unchanged, item);

    let blank_title = LineItemPayload {
        title: Some("  ".to_string()),
        ..LineItemPayload::default()
    };
    let err = service
        .update_line_item(&scopes, &item.base.sourced_id, &blank_title)
        .unwrap_err();
    assert_eq!(
        err.field_errors().unwrap().get("title"),
        Some("Title is required")
    );

    let repoint = LineItemPayload {
        title: Some("Midterm".to_string()),
        category_sourced_id: Some(exams.base.sourced_id.clone()),
        ..LineItemPayload::default()
    };
    let moved = service
        .update_line_item(&scopes, &item.base.sourced_id, &repoint)
        .unwrap();
    assert_eq!(moved.title, "Midterm");
    assert_eq!(
        moved.category_sourced_id.as_deref(),
        Some(exams.base.sourced_id.as_str())
    );

    let empty_reference = LineItemPayload {
        category_sourced_id: Some(String::new()),
        ..LineItemPayload::default()
    };
    let kept = service
        .update_line_item(&scopes, &item.base.sourced_id, &empty_reference)
        .unwrap();
    assert_eq!(kept.category_sourced_id, moved.category_sourced_id);

    let err = service
        .update_line_item(&scopes, "missing", &repoint)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn update_is_all_or_nothing_on_sqlite() {
    let conn = open_db_in_memory().unwrap();
    failed_update_leaves_record_untouched(&sqlite_service(&conn));
}

#[test]
fn update_is_all_or_nothing_in_memory() {
    failed_update_leaves_record_untouched(&memory_service());
}

fn pagination_follows_creation_order<S: GradebookStore>(service: &GradebookService<S>) {
    let scopes = ScopeSet::all();
    for id in ["c1", "c2", "c3"] {
        let payload = CategoryPayload {
            sourced_id: Some(id.to_string()),
            ..category(id)
        };
        service.create_category(&scopes, &payload).unwrap();
    }

    let page = service
        .list_categories(&scopes, &window(1, 1))
        .unwrap();
    assert_eq!(page.total_count, 3);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].base.sourced_id, "c2");

    let snapped = service
        .list_categories(&scopes, &window(3, 2))
        .unwrap();
    let ids: Vec<_> = snapped
        .items
        .iter()
        .map(|item| item.base.sourced_id.as_str())
        .collect();
    assert_eq!(ids, vec!["c3"]);

    let past_end = service
        .list_categories(&scopes, &window(10, 5))
        .unwrap();
    assert!(past_end.items.is_empty());
    assert_eq!(past_end.total_count, 3);
}

#[test]
fn pagination_on_sqlite() {
    let conn = open_db_in_memory().unwrap();
    pagination_follows_creation_order(&sqlite_service(&conn));
}

#[test]
fn pagination_in_memory() {
    pagination_follows_creation_order(&memory_service());
}

fn child_listings_filter_by_reference<S: GradebookStore>(service: &GradebookService<S>) {
    let scopes = ScopeSet::all();
    let home = service
        .create_category(&scopes, &category("Homework"))
        .unwrap();
    let quiz = service
        .create_line_item(
            &scopes,
            &line_item("Quiz", Some(home.base.sourced_id.as_str())),
        )
        .unwrap();
    let essay = service
        .create_line_item(&scopes, &line_item("Essay", None))
        .unwrap();
    for (student, item) in [("s1", &quiz), ("s2", &quiz), ("s1", &essay)] {
        service
            .create_result(&scopes, &result(student, &item.base.sourced_id))
            .unwrap();
    }

    let items = service
        .list_line_items_for_category(&scopes, &home.base.sourced_id, &ListQuery::default())
        .unwrap();
    assert_eq!(items.total_count, 1);
    assert_eq!(items.items[0].title, "Quiz");

    let for_quiz = service
        .list_results_for_line_item(&scopes, &quiz.base.sourced_id, &ListQuery::default())
        .unwrap();
    assert_eq!(for_quiz.total_count, 2);

    let for_s1 = service
        .list_results_for_student(&scopes, "s1", &ListQuery::default())
        .unwrap();
    let graded: Vec<_> = for_s1
        .items
        .iter()
        .map(|result| result.line_item_sourced_id.as_str())
        .collect();
    assert_eq!(
        graded,
        vec![quiz.base.sourced_id.as_str(), essay.base.sourced_id.as_str()]
    );

    let unknown = service
        .list_line_items_for_category(&scopes, "unknown", &ListQuery::default())
        .unwrap();
    assert!(unknown.items.is_empty());
    assert_eq!(unknown.total_count, 0);
}

#[test]
fn child_listings_on_sqlite() {
    let conn = open_db_in_memory().unwrap();
    child_listings_filter_by_reference(&sqlite_service(&conn));
}

#[test]
fn child_listings_in_memory() {
    child_listings_filter_by_reference(&memory_service());
}

fn scopes_gate_every_operation<S: GradebookStore>(service: &GradebookService<S>) {
    let core_only = ScopeSet::from_claim(
        "https://purl.imsglobal.org/spec/or/v1p2/scope/roster-core.createput",
    );
    let err = service
        .list_categories(&core_only, &ListQuery::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let created = service
        .create_line_item(&core_only, &line_item("Quiz", None))
        .unwrap();

    let err = service
        .create_result(&core_only, &result("s1", &created.base.sourced_id))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let read_only =
        ScopeSet::from_claim("https://purl.imsglobal.org/spec/or/v1p2/scope/roster.readonly");
    service
        .get_line_item(&read_only, &created.base.sourced_id)
        .unwrap();
    let err = service
        .delete_line_item(&read_only, &created.base.sourced_id)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = service
        .get_line_item(&ScopeSet::default(), "missing")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[test]
fn scope_gating_on_sqlite() {
    let conn = open_db_in_memory().unwrap();
    scopes_gate_every_operation(&sqlite_service(&conn));
}

#[test]
fn scope_gating_in_memory() {
    scopes_gate_every_operation(&memory_service());
}

fn gradebook_scenario<S: GradebookStore>(service: &GradebookService<S>) {
    let scopes = ScopeSet::all();
    let cat = service
        .create_category(
            &scopes,
            &CategoryPayload {
                weight: Some(dec("0.3")),
                ..category("Homework")
            },
        )
        .unwrap();
    let item = service
        .create_line_item(
            &scopes,
            &LineItemPayload {
                score_maximum: Some(dec("100.00")),
                ..line_item("Quiz 1", Some(cat.base.sourced_id.as_str()))
            },
        )
        .unwrap();
    let created = service
        .create_result(
            &scopes,
            &ResultPayload {
                score: Some(dec("85.50")),
                score_percent: Some(dec("0.8550")),
                score_status: Some(ScoreStatus::EarnedFull),
                ..result("s1", &item.base.sourced_id)
            },
        )
        .unwrap();

    let loaded = service
        .get_result(&scopes, &created.base.sourced_id)
        .unwrap();
    assert_eq!(loaded.score, Some(dec("85.50")));
    assert_eq!(loaded.score_percent, Some(dec("0.8550")));
    assert_eq!(loaded.score_status, Some(ScoreStatus::EarnedFull));
    assert_eq!(loaded.line_item_sourced_id, item.base.sourced_id);

    let item = service
        .get_line_item(&scopes, &item.base.sourced_id)
        .unwrap();
    assert_eq!(item.score_maximum, Some(dec("100.00")));
}

#[test]
fn end_to_end_scenario_on_sqlite() {
    let conn = open_db_in_memory().unwrap();
    gradebook_scenario(&sqlite_service(&conn));
}

#[test]
fn end_to_end_scenario_in_memory() {
    gradebook_scenario(&memory_service());
}

fn category_update_rules<S: GradebookStore>(service: &GradebookService<S>) {
    let scopes = ScopeSet::all();
    let created = service
        .create_category(
            &scopes,
            &CategoryPayload {
                weight: Some(dec("0.4")),
                metadata: Some(r#"{"term":"fall"}"#.to_string()),
                ..category("Homework")
            },
        )
        .unwrap();
    let id = created.base.sourced_id.as_str();

    let too_heavy = CategoryPayload {
        weight: Some(dec("1.5")),
        ..CategoryPayload::default()
    };
    let err = service.update_category(&scopes, id, &too_heavy).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    assert_eq!(
        err.field_errors().unwrap().get("weight"),
        Some("Weight must be at most 1.0")
    );
    assert_eq!(service.get_category(&scopes, id).unwrap(), created);

    let rename = CategoryPayload {
        title: Some("Assignments".to_string()),
        ..CategoryPayload::default()
    };
    let renamed = service.update_category(&scopes, id, &rename).unwrap();
    assert_eq!(renamed.title, "Assignments");
    assert_eq!(renamed.weight, Some(dec("0.4")));
    assert_eq!(renamed.base.metadata.as_deref(), Some(r#"{"term":"fall"}"#));
    assert_eq!(renamed.base.status, Status::Active);
    assert_eq!(service.get_category(&scopes, id).unwrap(), renamed);
}

#[test]
fn category_update_rules_on_sqlite() {
    let conn = open_db_in_memory().unwrap();
    category_update_rules(&sqlite_service(&conn));
}

#[test]
fn category_update_rules_in_memory() {
    category_update_rules(&memory_service());
}

fn result_line_item_can_be_repointed<S: GradebookStore>(service: &GradebookService<S>) {
    let scopes = ScopeSet::all();
    let quiz = service
        .create_line_item(&scopes, &line_item("Quiz", None))
        .unwrap();
    let exam = service
        .create_line_item(&scopes, &line_item("Exam", None))
        .unwrap();
    let created = service
        .create_result(&scopes, &result("s1", &quiz.base.sourced_id))
        .unwrap();
    let id = created.base.sourced_id.as_str();

    let dangling = ResultPayload {
        line_item_sourced_id: Some("nope".to_string()),
        comment: Some("x".to_string()),
        ..ResultPayload::default()
    };
    let err = service.update_result(&scopes, id, &dangling).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "LineItem not found: nope");
    let unchanged = service.get_result(&scopes, id).unwrap();
    assert_eq!(unchanged.line_item_sourced_id, quiz.base.sourced_id);
    assert_eq!(unchanged.comment, None);

    let repoint = ResultPayload {
        line_item_sourced_id: Some(exam.base.sourced_id.clone()),
        ..ResultPayload::default()
    };
    let moved = service.update_result(&scopes, id, &repoint).unwrap();
    assert_eq!(moved.line_item_sourced_id, exam.base.sourced_id);
    assert_eq!(moved.student_id, "s1");

    let for_quiz = service
        .list_results_for_line_item(&scopes, &quiz.base.sourced_id, &ListQuery::default())
        .unwrap();
    assert_eq!(for_quiz.total_count, 0);
    let for_exam = service
        .list_results_for_line_item(&scopes, &exam.base.sourced_id, &ListQuery::default())
        .unwrap();
    assert_eq!(for_exam.total_count, 1);
}

#[test]
fn result_repoint_on_sqlite() {
    let conn = open_db_in_memory().unwrap();
    result_line_item_can_be_repointed(&sqlite_service(&conn));
}

#[test]
fn result_repoint_in_memory() {
    result_line_item_can_be_repointed(&memory_service());
}

fn listing_filters_and_sorts<S: GradebookStore>(service: &GradebookService<S>) {
    let scopes = ScopeSet::all();
    for (id, title, weight) in [
        ("c1", "Homework", Some("0.3")),
        ("c2", "Exams", Some("0.5")),
        ("c3", "Labs", None),
        ("c4", "Homework extra", Some("0.50")),
    ] {
        let payload = CategoryPayload {
            sourced_id: Some(id.to_string()),
            weight: weight.map(dec),
            ..category(title)
        };
        service.create_category(&scopes, &payload).unwrap();
    }
    let ids = |listing: ListQuery<Category>| -> Vec<String> {
        service
            .list_categories(&scopes, &listing)
            .unwrap()
            .items
            .into_iter()
            .map(|category| category.base.sourced_id)
            .collect()
    };

    assert_eq!(ids(query(Some("weight>'0.2'"), None)), ["c1", "c2", "c4"]);
    assert_eq!(ids(query(Some("weight=0.5"), None)), ["c2", "c4"]);
    assert_eq!(ids(query(Some("title~'HOME'"), None)), ["c1", "c4"]);
    assert_eq!(
        ids(query(Some("weight>='0.5' AND title~'extra'"), None)),
        ["c4"]
    );
    assert_eq!(ids(query(Some("title!='Labs'"), None)), ["c1", "c2", "c4"]);
    assert_eq!(ids(query(Some("title~'100%'"), None)), Vec::<String>::new());
    assert_eq!(ids(query(None, Some("weight DESC"))), ["c2", "c4", "c1", "c3"]);
    assert_eq!(ids(query(None, Some("weight"))), ["c3", "c1", "c2", "c4"]);
    assert_eq!(ids(query(None, Some("-title"))), ["c3", "c4", "c1", "c2"]);

    let page = service
        .list_categories(
            &scopes,
            &ListQuery::parse(
                PageRequest::new(1, 1).unwrap(),
                Some("weight>'0.2'"),
                Some("weight DESC"),
                None,
            )
            .unwrap(),
        )
        .unwrap();
    assert_eq!(page.total_count, 3);
    assert_eq!(page.items[0].base.sourced_id, "c4");

    service.delete_category(&scopes, "c3").unwrap();
    assert_eq!(ids(query(Some("status='tobedeleted'"), None)), ["c3"]);

    let item = |title: &str, due: Option<NaiveDate>| LineItemPayload {
        due_date: due,
        ..line_item(title, Some("c1"))
    };
    let oct = NaiveDate::from_ymd_opt(2026, 10, 20);
    let nov = NaiveDate::from_ymd_opt(2026, 11, 15);
    for payload in [item("Early", oct), item("Late", nov), item("Undated", None)] {
        service.create_line_item(&scopes, &payload).unwrap();
    }
    let due_before: ListQuery<LineItem> = query(Some("dueDate<'2026-11-01'"), None);
    let early = service
        .list_line_items_for_category(&scopes, "c1", &due_before)
        .unwrap();
    assert_eq!(early.total_count, 1);
    assert_eq!(early.items[0].title, "Early");

    let latest_first: ListQuery<LineItem> = query(None, Some("dueDate DESC"));
    let titles: Vec<_> = service
        .list_line_items(&scopes, &latest_first)
        .unwrap()
        .items
        .into_iter()
        .map(|item| item.title)
        .collect();
    assert_eq!(titles, ["Late", "Early", "Undated"]);
}

#[test]
fn listing_query_on_sqlite() {
    let conn = open_db_in_memory().unwrap();
    listing_filters_and_sorts(&sqlite_service(&conn));
}

#[test]
fn listing_query_in_memory() {
    listing_filters_and_sorts(&memory_service());
}

#[test]
fn listing_query_rejects_unknown_fields() {
    let err = ListQuery::<Category>::parse(
        PageRequest::default(),
        Some("password='x'"),
        None,
        None,
    )
    .unwrap_err();
    assert_eq!(err.get("filter"), Some("Unknown field: password"));
}
