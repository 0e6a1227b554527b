//! End-to-end scrape runs against scripted pages and an in-memory store

mod support;

use chrono::{TimeZone, Utc};
use std::sync::Arc;

use local_guides_scraper_lib::application::{ReconciliationWriter, ScrapeError, ScrapeOrchestrator};
use local_guides_scraper_lib::domain::{MetricStore, PeriodKey, ProfileReference, ProfileStatus, WorklistProvider};
use local_guides_scraper_lib::infrastructure::{BrowserError, ProfileExtractor, SqliteGuideRepository};

use support::{
    EMPTY_VIEW, PHOTOS_VIEW, REVIEWS_VIEW, RejectingStore, ScriptedBrowser, UnreadableWorklist, contrib_url,
    immediate_config, memory_repository, record,
};

fn orchestrator(browser: Arc<ScriptedBrowser>, repository: &Arc<SqliteGuideRepository>) -> ScrapeOrchestrator {
    ScrapeOrchestrator::new(
        browser,
        repository.clone(),
        repository.clone(),
        ProfileExtractor::new().unwrap(),
        immediate_config(),
    )
}

#[tokio::test]
async fn growth_since_last_sync_is_recorded() {
    let repository = Arc::new(memory_repository().await);
    repository
        .register_guide("g1", &contrib_url("111", "reviews"), Some("Jane Doe"))
        .await
        .unwrap();

    // previous state: level 4, 100 points, 1,000 views over 10 photos
    let writer = ReconciliationWriter::new(repository.clone());
    writer.reconcile("g1", None, &record(4, 100, 10, 1_000)).await.unwrap();

    let worklist = repository.fetch_worklist().await.unwrap();
    let previous = worklist[0].current_record.unwrap();
    assert_eq!(previous.points, 100);

    let next = record(5, 150, 10, 1_500);
    let result = writer.reconcile("g1", Some(&previous), &next).await.unwrap();

    assert_eq!(result.deltas.points_change, 50);
    assert_eq!(result.deltas.photo_views_change, 500);
    assert_eq!(result.derived.avg_views_per_photo, 150);
    assert!(result.flags.leveled_up);

    let stored = repository.load_current("g1").await.unwrap().unwrap();
    assert_eq!(stored, next);
}

#[tokio::test]
async fn first_sync_activates_the_guide() {
    let repository = Arc::new(memory_repository().await);
    repository
        .register_guide("g1", &contrib_url("111", "reviews"), None)
        .await
        .unwrap();
    assert_eq!(repository.load_status("g1").await.unwrap(), ProfileStatus::Pending);

    let writer = ReconciliationWriter::new(repository.clone());
    let result = writer.reconcile("g1", None, &record(1, 10, 0, 0)).await.unwrap();

    assert_eq!(result.deltas.points_change, 10);
    assert_eq!(result.derived.avg_views_per_photo, 0);
    assert_eq!(repository.load_status("g1").await.unwrap(), ProfileStatus::Active);
}

#[tokio::test]
async fn reconciling_twice_in_a_month_converges() {
    let repository = Arc::new(memory_repository().await);
    repository
        .register_guide("g1", &contrib_url("111", "reviews"), None)
        .await
        .unwrap();
    let writer = ReconciliationWriter::new(repository.clone());
    let next = record(3, 640, 20, 9_000);

    writer.reconcile_with_stored("g1", &next).await.unwrap();
    let second = writer.reconcile_with_stored("g1", &next).await.unwrap();

    assert_eq!(second.deltas.points_change, 0);
    assert_eq!(second.deltas.photo_views_change, 0);
    assert_eq!(repository.count_snapshots("g1").await.unwrap(), 1);

    let snapshot = repository
        .load_snapshot("g1", &PeriodKey::month_of(Utc::now()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.points, 640);
    assert_eq!(snapshot.points_change, 0);
}

#[tokio::test]
async fn snapshots_are_kept_per_month() {
    let repository = Arc::new(memory_repository().await);
    repository
        .register_guide("g1", &contrib_url("111", "reviews"), None)
        .await
        .unwrap();
    let writer = ReconciliationWriter::new(repository.clone());

    let march = Utc.with_ymd_and_hms(2024, 3, 31, 23, 0, 0).unwrap();
    let april = Utc.with_ymd_and_hms(2024, 4, 1, 1, 0, 0).unwrap();
    let first = record(2, 200, 0, 0);
    writer.reconcile_at("g1", None, &first, march).await.unwrap();
    writer.reconcile_at("g1", Some(&first), &record(2, 260, 0, 0), april).await.unwrap();

    assert_eq!(repository.count_snapshots("g1").await.unwrap(), 2);
    let april_snapshot = repository
        .load_snapshot("g1", &PeriodKey::from("2024-04"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(april_snapshot.points_change, 60);
}

#[tokio::test]
async fn full_run_merges_both_views() {
    let repository = Arc::new(memory_repository().await);
    repository
        .register_guide("g1", &contrib_url("111", "reviews"), Some("Jane Doe"))
        .await
        .unwrap();

    let browser = Arc::new(
        ScriptedBrowser::new()
            .page(&contrib_url("111", "photos"), PHOTOS_VIEW)
            .page(&contrib_url("111", "reviews"), REVIEWS_VIEW),
    );
    let summary = orchestrator(browser.clone(), &repository).run().await.unwrap();

    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.fail_count, 0);
    assert_eq!(
        browser.visits(),
        vec![contrib_url("111", "photos"), contrib_url("111", "reviews")]
    );

    let stored = repository.load_current("g1").await.unwrap().unwrap();
    assert_eq!(stored.level, 5);
    assert_eq!(stored.points, 1_500);
    // primary value wins where both views have one
    assert_eq!(stored.review_count, 40);
    assert_eq!(stored.photo_views, 15_000);
    // secondary fills what the primary lacks
    assert_eq!(stored.edits, 8);
    assert_eq!(stored.questions_answered, 6);
}

#[tokio::test]
async fn secondary_view_rescues_an_empty_primary() {
    let repository = Arc::new(memory_repository().await);
    repository
        .register_guide("g1", &contrib_url("111", "reviews"), None)
        .await
        .unwrap();

    let browser = Arc::new(
        ScriptedBrowser::new()
            .page(&contrib_url("111", "photos"), EMPTY_VIEW)
            .page(&contrib_url("111", "reviews"), REVIEWS_VIEW),
    );
    let summary = orchestrator(browser, &repository).run().await.unwrap();
    assert_eq!(summary.success_count, 1);

    let stored = repository.load_current("g1").await.unwrap().unwrap();
    assert_eq!(stored.points, 1_500);
    assert_eq!(stored.review_count, 42);
    assert_eq!(stored.photo_count, 0);
}

#[tokio::test]
async fn missing_points_leave_the_store_untouched() {
    let repository = Arc::new(memory_repository().await);
    repository
        .register_guide("g1", &contrib_url("111", "reviews"), None)
        .await
        .unwrap();

    let browser = Arc::new(
        ScriptedBrowser::new()
            .page(&contrib_url("111", "photos"), EMPTY_VIEW)
            .page(&contrib_url("111", "reviews"), EMPTY_VIEW),
    );
    let summary = orchestrator(browser, &repository).run().await.unwrap();

    assert_eq!(summary.fail_count, 1);
    assert_eq!(summary.failures[0].kind, "extraction");
    assert!(repository.load_current("g1").await.unwrap().is_none());
    assert_eq!(repository.load_status("g1").await.unwrap(), ProfileStatus::Pending);
    assert_eq!(repository.count_snapshots("g1").await.unwrap(), 0);
}

#[tokio::test]
async fn one_failing_profile_does_not_stop_the_run() {
    let repository = Arc::new(memory_repository().await);
    for (id, contrib) in [("g1", "111"), ("g2", "222"), ("g3", "333")] {
        repository
            .register_guide(id, &contrib_url(contrib, "reviews"), None)
            .await
            .unwrap();
    }

    let browser = Arc::new(
        ScriptedBrowser::new()
            .page(&contrib_url("111", "photos"), PHOTOS_VIEW)
            .page(&contrib_url("111", "reviews"), REVIEWS_VIEW)
            .failing(
                &contrib_url("222", "photos"),
                BrowserError::Timeout {
                    url: contrib_url("222", "photos"),
                    timeout_ms: 60_000,
                },
            )
            .page(&contrib_url("333", "photos"), PHOTOS_VIEW)
            .page(&contrib_url("333", "reviews"), REVIEWS_VIEW),
    );
    let summary = orchestrator(browser, &repository).run().await.unwrap();

    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.fail_count, 1);
    assert_eq!(summary.total(), 3);
    assert_eq!(summary.failures[0].profile_id, "g2");
    assert_eq!(summary.failures[0].kind, "navigation");

    assert!(repository.load_current("g1").await.unwrap().is_some());
    assert!(repository.load_current("g2").await.unwrap().is_none());
    assert!(repository.load_current("g3").await.unwrap().is_some());
}

#[tokio::test]
async fn short_link_resolves_after_the_first_navigation() {
    let short = "https://maps.app.goo.gl/AbC123xyz";
    let repository = Arc::new(memory_repository().await);
    repository.register_guide("g1", short, None).await.unwrap();

    let browser = Arc::new(
        ScriptedBrowser::new()
            .redirect(
                short,
                "https://www.google.com/maps/contrib/555/photos?entry=ttu",
                PHOTOS_VIEW,
            )
            .page(&contrib_url("555", "reviews"), REVIEWS_VIEW),
    );
    let summary = orchestrator(browser.clone(), &repository).run().await.unwrap();

    assert_eq!(summary.success_count, 1);
    assert_eq!(browser.visits(), vec![short.to_string(), contrib_url("555", "reviews")]);
    assert_eq!(repository.load_current("g1").await.unwrap().unwrap().edits, 8);
}

#[tokio::test]
async fn unresolvable_link_uses_the_single_view() {
    let odd = "https://example.com/some/profile";
    let repository = Arc::new(memory_repository().await);
    repository.register_guide("g1", odd, None).await.unwrap();

    let browser = Arc::new(ScriptedBrowser::new().page(odd, PHOTOS_VIEW));
    let summary = orchestrator(browser.clone(), &repository).run().await.unwrap();

    assert_eq!(summary.success_count, 1);
    assert_eq!(browser.visits(), vec![odd.to_string()]);
    assert_eq!(repository.load_current("g1").await.unwrap().unwrap().points, 1_500);
}

#[tokio::test]
async fn only_scrapeable_guides_are_visited() {
    let repository = Arc::new(memory_repository().await);
    repository
        .register_guide("g1", &contrib_url("111", "reviews"), None)
        .await
        .unwrap();
    repository
        .register_guide("g2", &contrib_url("222", "reviews"), None)
        .await
        .unwrap();
    repository.set_status("g2", ProfileStatus::Rejected).await.unwrap();

    let browser = Arc::new(
        ScriptedBrowser::new()
            .page(&contrib_url("111", "photos"), PHOTOS_VIEW)
            .page(&contrib_url("111", "reviews"), REVIEWS_VIEW),
    );
    let summary = orchestrator(browser.clone(), &repository).run().await.unwrap();

    assert_eq!(summary.total(), 1);
    assert!(browser.visits().iter().all(|url| !url.contains("222")));
}

#[tokio::test]
async fn single_profile_scrape_returns_the_reconciliation() {
    let repository = Arc::new(memory_repository().await);
    repository
        .register_guide("g1", &contrib_url("111", "reviews"), None)
        .await
        .unwrap();

    let browser = Arc::new(
        ScriptedBrowser::new()
            .page(&contrib_url("111", "photos"), PHOTOS_VIEW)
            .page(&contrib_url("111", "reviews"), REVIEWS_VIEW),
    );
    let profile =
        ProfileReference::new("g1", contrib_url("111", "reviews")).with_current_record(record(4, 1_000, 10, 12_000));

    let result = orchestrator(browser, &repository).scrape_profile(&profile).await.unwrap();

    assert_eq!(result.deltas.points_change, 500);
    assert_eq!(result.deltas.photo_views_change, 3_000);
    assert_eq!(result.derived.avg_views_per_photo, 1_500);
    assert!(result.flags.leveled_up);
}

#[tokio::test]
async fn failed_store_write_counts_as_a_failure_and_the_run_continues() {
    let repository = Arc::new(memory_repository().await);
    for (id, contrib) in [("g1", "111"), ("g2", "222")] {
        repository
            .register_guide(id, &contrib_url(contrib, "reviews"), None)
            .await
            .unwrap();
    }

    let browser = Arc::new(
        ScriptedBrowser::new()
            .page(&contrib_url("111", "photos"), PHOTOS_VIEW)
            .page(&contrib_url("111", "reviews"), REVIEWS_VIEW)
            .page(&contrib_url("222", "photos"), PHOTOS_VIEW)
            .page(&contrib_url("222", "reviews"), REVIEWS_VIEW),
    );
    let store = Arc::new(RejectingStore::new(repository.clone(), &["g1"]));
    let orchestrator = ScrapeOrchestrator::new(
        browser.clone(),
        repository.clone(),
        store,
        ProfileExtractor::new().unwrap(),
        immediate_config(),
    );
    let summary = orchestrator.run().await.unwrap();

    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.fail_count, 1);
    assert_eq!(summary.failures[0].profile_id, "g1");
    assert_eq!(summary.failures[0].kind, "persistence");
    // both profiles were fetched; only the write for g1 failed
    assert_eq!(browser.visits().len(), 4);
    assert!(repository.load_current("g1").await.unwrap().is_none());
    assert_eq!(repository.load_current("g2").await.unwrap().unwrap().points, 1_500);
}

#[tokio::test]
async fn unreadable_worklist_aborts_the_run() {
    let repository = Arc::new(memory_repository().await);
    let browser = Arc::new(ScriptedBrowser::new());
    let orchestrator = ScrapeOrchestrator::new(
        browser.clone(),
        Arc::new(UnreadableWorklist),
        repository,
        ProfileExtractor::new().unwrap(),
        immediate_config(),
    );

    let err = orchestrator.run().await.unwrap_err();

    assert!(matches!(err, ScrapeError::Worklist(_)));
    assert!(err.is_fatal());
    assert_eq!(err.kind(), "worklist");
    assert!(browser.visits().is_empty());
}
