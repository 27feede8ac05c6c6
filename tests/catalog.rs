use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use coursecache::{
    BackendError, CacheSettings, CatalogCache, CatalogOptions, FetchError, LoadState, Origin,
    Query, Reply, RetryPolicy, ScriptedBackend,
};
use coursecache::cache::SettingsError;

fn options() -> CatalogOptions {
    CatalogOptions {
        cache: CacheSettings::default(),
        retry: RetryPolicy::default()
            .max_attempts(3)
            .base_delay(Duration::from_millis(100))
            .max_delay(Duration::from_millis(300))
            .attempt_timeout(Duration::from_millis(500)),
        ..Default::default()
    }
}

fn catalog(backend: &Arc<ScriptedBackend>) -> CatalogCache {
    CatalogCache::new(Arc::clone(backend) as _, options()).unwrap()
}

fn down() -> Reply {
    Reply::Error(BackendError::new("503", "service unavailable"))
}

#[tokio::test(start_paused = true)]
async fn test_courses_are_fetched_once_then_cached() {
    let backend = Arc::new(ScriptedBackend::new());
    let query = Query::courses("admin", true);
    backend.respond(query.clone(), vec![json!({ "id": "c1", "title": "Onboarding" })]);
    let catalog = catalog(&backend);

    let first = catalog.get_courses("admin", true).await;
    assert_eq!(first.data.len(), 1);
    assert_eq!(first.data[0].id, "c1");
    assert!(first.error.is_none());
    assert_eq!(first.origin, Origin::Live);

    let second = catalog.get_courses("admin", true).await;
    assert_eq!(second.data, first.data);
    assert_eq!(backend.calls(&query), 1);
}

#[tokio::test(start_paused = true)]
async fn test_scopes_do_not_share_entries() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.respond(
        Query::courses("u1", true),
        vec![json!({ "id": "draft", "title": "Draft" })],
    );
    backend.respond(Query::courses("u1", false), Vec::new());
    let catalog = catalog(&backend);

    assert_eq!(catalog.get_courses("u1", true).await.data.len(), 1);
    assert!(catalog.get_courses("u1", false).await.data.is_empty());
    assert_eq!(backend.total_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_videos_succeed_after_two_timeouts() {
    let backend = Arc::new(ScriptedBackend::new());
    let query = Query::videos("course-x");
    backend.push(query.clone(), Reply::Hang);
    backend.push(query.clone(), Reply::Hang);
    backend.respond(
        query.clone(),
        vec![json!({ "id": "v1", "course_id": "course-x", "title": "Welcome" })],
    );
    let catalog = catalog(&backend);

    let videos = catalog.get_videos("course-x").await;

    assert_eq!(videos.origin, Origin::Live);
    assert_eq!(videos.data[0].id, "v1");
    assert_eq!(backend.calls(&query), 3);
}

#[tokio::test(start_paused = true)]
async fn test_outage_serves_fallback_with_short_ttl() {
    let backend = Arc::new(ScriptedBackend::new());
    let query = Query::courses("u1", false);
    backend.reply(query.clone(), down());
    let catalog = catalog(&backend);

    let courses = catalog.get_courses("u1", false).await;

    assert_eq!(courses.origin, Origin::Fallback);
    assert!(!courses.data.is_empty());
    assert!(courses.data.iter().all(|c| c.id.starts_with("fallback-")));
    assert!(matches!(
        courses.error.as_ref().map(FetchError::root),
        Some(FetchError::Backend(err)) if err.code == "503"
    ));
    assert_eq!(backend.calls(&query), 3);

    let key = coursecache::facades::CourseCache::key("u1", false);
    let remaining = catalog.store().remaining_ttl(&key).unwrap();
    assert!(remaining <= catalog.settings().fallback_ttl);
    assert!(catalog.settings().fallback_ttl < catalog.settings().courses_ttl);

    // Cached placeholder keeps its provenance and costs no new request.
    let again = catalog.get_courses("u1", false).await;
    assert_eq!(again.origin, Origin::Fallback);
    assert!(again.error.is_none());
    assert_eq!(backend.calls(&query), 3);
}

#[tokio::test(start_paused = true)]
async fn test_live_data_replaces_fallback_after_recovery() {
    let backend = Arc::new(ScriptedBackend::new());
    let query = Query::courses("u1", false);
    backend.reply(query.clone(), down());
    let catalog = catalog(&backend);

    assert!(catalog.get_courses("u1", false).await.is_fallback());

    backend.respond(query.clone(), vec![json!({ "id": "c1", "title": "Real" })]);
    tokio::time::advance(catalog.settings().fallback_ttl + Duration::from_secs(1)).await;

    let recovered = catalog.get_courses("u1", false).await;
    assert_eq!(recovered.origin, Origin::Live);
    assert_eq!(recovered.data[0].id, "c1");
}

#[tokio::test(start_paused = true)]
async fn test_progress_key_ignores_course_order() {
    let backend = Arc::new(ScriptedBackend::new());
    let query = Query::progress("u1", &["c1", "c2"]);
    backend.respond(
        query.clone(),
        vec![
            json!({ "id": "p1", "user_id": "u1", "course_id": "c1", "progress_percent": 40 }),
            json!({ "id": "p2", "user_id": "u1", "course_id": "c2", "completed": true }),
        ],
    );
    let catalog = catalog(&backend);

    let first = catalog.get_user_progress("u1", &["c2", "c1"]).await;
    let second = catalog.get_user_progress("u1", &["c1", "c2"]).await;

    assert_eq!(first.data.len(), 2);
    assert_eq!(first.data, second.data);
    assert_eq!(backend.calls(&query), 1);
}

#[tokio::test(start_paused = true)]
async fn test_profile_fallback_keeps_shape() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.reply(Query::profiles("u1", false), down());
    let catalog = catalog(&backend);

    let profiles = catalog.get_profiles("u1", false).await;

    assert!(profiles.is_fallback());
    assert_eq!(profiles.data.len(), 1);
    assert!(!profiles.data[0].is_admin());
}

#[tokio::test(start_paused = true)]
async fn test_load_multiple_courses_includes_cached_ids() {
    let backend = Arc::new(ScriptedBackend::new());
    for id in ["a", "b", "c"] {
        backend.respond(
            Query::videos(id),
            vec![json!({ "id": format!("v-{id}"), "course_id": id, "title": "Lesson" })],
        );
    }
    let catalog = catalog(&backend);
    catalog.get_videos("b").await;

    let videos = catalog.load_multiple_courses(&["a", "b", "c"], 2).await;

    assert_eq!(videos.len(), 3);
    for id in ["a", "b", "c"] {
        assert_eq!(videos[id][0].course_id, id);
        assert_eq!(backend.calls(&Query::videos(id)), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_invalidate_and_stats() {
    let backend = Arc::new(ScriptedBackend::new());
    let catalog = catalog(&backend);

    catalog.get_courses("u1", true).await;
    catalog.get_courses("u1", false).await;
    catalog.get_user_progress("u1", &["c1"]).await;
    catalog.get_courses("u2", false).await;
    assert_eq!(catalog.stats().active, 4);

    assert_eq!(catalog.invalidate("u1"), 3);
    let stats = catalog.stats();
    assert_eq!(stats.active, 1);
    assert_eq!(stats.total, 1);

    tokio::time::advance(catalog.settings().courses_ttl + Duration::from_secs(1)).await;
    let stats = catalog.stats();
    assert_eq!((stats.active, stats.expired, stats.total), (0, 1, 1));

    catalog.clear_all();
    assert_eq!(catalog.stats().total, 0);
}

#[tokio::test(start_paused = true)]
async fn test_sweeper_reclaims_expired_entries() {
    let backend = Arc::new(ScriptedBackend::new());
    let settings = CacheSettings::default()
        .progress_ttl(Duration::from_secs(600))
        .sweep_interval(Duration::from_secs(1800));
    let catalog = CatalogCache::new(
        Arc::clone(&backend) as _,
        CatalogOptions {
            cache: settings,
            ..options()
        },
    )
    .unwrap();
    catalog.start_sweeper();
    catalog.start_sweeper();

    catalog.get_user_progress("u1", &["c1"]).await;
    assert_eq!(catalog.stats().total, 1);

    tokio::time::sleep(Duration::from_secs(1801)).await;
    assert_eq!(catalog.stats().total, 0);

    catalog.dispose();
}

#[test]
fn test_fallback_ttl_longer_than_live_is_rejected() {
    let backend = Arc::new(ScriptedBackend::new());
    let settings = CacheSettings::default()
        .courses_ttl(Duration::from_secs(60))
        .fallback_ttl(Duration::from_secs(86_400));

    let result = CatalogCache::new(
        backend as _,
        CatalogOptions {
            cache: settings,
            ..options()
        },
    );

    assert!(matches!(
        result,
        Err(SettingsError::FallbackTooLong { resource: "courses", .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_clear_all_discards_running_load() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.reply(
        Query::videos("c1"),
        Reply::delayed(
            Duration::from_millis(200),
            Reply::Rows(vec![json!({ "id": "v1", "course_id": "c1", "title": "Lesson" })]),
        ),
    );
    let catalog = Arc::new(catalog(&backend));

    let running = {
        let catalog = Arc::clone(&catalog);
        tokio::spawn(async move { catalog.loader().load_one("c1").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    catalog.clear_all();

    // Callers still get their answer; the cache stays empty.
    assert_eq!(running.await.unwrap().len(), 1);
    assert_eq!(catalog.stats().total, 0);
    assert_eq!(catalog.loader().state("c1"), LoadState::NotStarted);
}

#[tokio::test(start_paused = true)]
async fn test_invalidate_discards_running_load() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.reply(
        Query::videos("c1"),
        Reply::delayed(Duration::from_millis(200), Reply::Rows(Vec::new())),
    );
    backend.respond(Query::videos("c2"), Vec::new());
    let catalog = Arc::new(catalog(&backend));

    let running = {
        let catalog = Arc::clone(&catalog);
        tokio::spawn(async move { catalog.load_multiple_courses(&["c1", "c2"], 2).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    catalog.invalidate("c1");

    assert_eq!(running.await.unwrap().len(), 2);
    assert!(catalog.videos().get("c1").is_none());
    assert!(catalog.videos().get("c2").is_some());

    // The next read starts a fresh load.
    catalog.get_videos("c1").await;
    assert_eq!(backend.calls(&Query::videos("c1")), 2);
}

#[tokio::test(start_paused = true)]
async fn test_get_videos_shares_running_load() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.reply(
        Query::videos("c1"),
        Reply::delayed(
            Duration::from_millis(200),
            Reply::Rows(vec![json!({ "id": "v1", "course_id": "c1", "title": "Lesson" })]),
        ),
    );
    let catalog = catalog(&backend);

    let (direct, loaded) = tokio::join!(
        catalog.get_videos("c1"),
        catalog.loader().load_one("c1")
    );

    assert_eq!(direct.origin, Origin::Live);
    assert_eq!(direct.data, loaded);
    assert_eq!(backend.calls(&Query::videos("c1")), 1);
}

#[tokio::test(start_paused = true)]
async fn test_get_videos_outage_serves_fallback() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.reply(Query::videos("c1"), down());
    let catalog = catalog(&backend);

    let videos = catalog.get_videos("c1").await;

    assert!(videos.is_fallback());
    assert_eq!(videos.data[0].course_id, "c1");
    assert!(videos.error.is_some());
    assert!(catalog.get_videos("c1").await.is_fallback());
    assert_eq!(backend.calls(&Query::videos("c1")), 3);
}
