mod support;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use quarry_core::cache::{
    BuildCommencedTimeProvider, CachePolicy, CachingModuleComponentRepository,
    InMemoryModuleCacheStore, ModuleCacheStore, ModuleIdExtractor,
};
use quarry_core::lock::DefaultCacheLockingManager;
use quarry_core::model::{
    ArtifactResult, ArtifactSetResult, ArtifactType, ComponentMetadata, ComponentMetadataResult,
    ModuleVersionListingResult, RepositoryId,
};
use quarry_core::repository::{ModuleComponentRepository, ModuleMetadataProcessor};

use support::{MockRepository, RecordingLockManager, component, component_id, dependency, jar};

/// Marks every component it sees so tests can tell raw from processed metadata.
struct MarkProcessed;

impl ModuleMetadataProcessor for MarkProcessed {
    fn process(&self, metadata: &mut ComponentMetadata) {
        metadata.status = "processed".to_string();
    }
}

fn commenced() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

struct Fixture {
    repo: MockRepository,
    store: Arc<InMemoryModuleCacheStore>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            repo: MockRepository::remote("central"),
            store: Arc::new(InMemoryModuleCacheStore::new()),
        }
    }

    fn caching_at(&self, now: DateTime<Utc>, extractor: ModuleIdExtractor) -> CachingModuleComponentRepository {
        self.caching_with(CachePolicy::default(), now, extractor)
    }

    fn caching_with(
        &self,
        policy: CachePolicy,
        now: DateTime<Utc>,
        extractor: ModuleIdExtractor,
    ) -> CachingModuleComponentRepository {
        CachingModuleComponentRepository::new(
            Arc::new(self.repo.clone()),
            self.store.clone(),
            policy,
            Arc::new(BuildCommencedTimeProvider::at(now)),
            Arc::new(MarkProcessed),
            extractor,
            Arc::new(DefaultCacheLockingManager::new()),
        )
    }

    fn caching(&self) -> CachingModuleComponentRepository {
        self.caching_at(commenced(), ModuleIdExtractor::PerModule)
    }
}

fn resolve_locally(repo: &CachingModuleComponentRepository, version: &str) -> ComponentMetadataResult {
    let mut result = ComponentMetadataResult::new();
    repo.local_access()
        .resolve_component_metadata(
            &dependency("org", "lib", version),
            &component_id("org", "lib", version),
            &mut result,
        )
        .unwrap();
    result
}

fn resolve_remotely(repo: &CachingModuleComponentRepository, version: &str) -> ComponentMetadataResult {
    let mut result = ComponentMetadataResult::new();
    repo.remote_access()
        .resolve_component_metadata(
            &dependency("org", "lib", version),
            &component_id("org", "lib", version),
            &mut result,
        )
        .unwrap();
    result
}

#[test]
fn remote_metadata_is_answered_locally_afterwards() {
    let fixture = Fixture::new();
    fixture.repo.remote.add_component(component("org", "lib", "1.0"));
    let caching = fixture.caching();

    assert!(!resolve_locally(&caching, "1.0").has_result());
    let fetched = resolve_remotely(&caching, "1.0");
    let cached = resolve_locally(&caching, "1.0");

    assert_eq!(fetched.value().unwrap().status, "processed");
    assert_eq!(cached.value().unwrap().status, "processed");
    assert_eq!(fixture.repo.remote.call_count(), 1);
    assert_eq!(fixture.repo.local.call_count(), 2);
}

#[test]
fn store_keeps_unprocessed_metadata() {
    let fixture = Fixture::new();
    fixture.repo.remote.add_component(component("org", "lib", "1.0"));
    resolve_remotely(&fixture.caching(), "1.0");

    let entry = fixture
        .store
        .component_metadata(&RepositoryId::new("central"), &component_id("org", "lib", "1.0"))
        .unwrap();
    assert_eq!(entry.cached_at, commenced());
    assert_eq!(entry.value.unwrap().status, "release");
}

#[test]
fn delegate_local_answer_wins_over_store() {
    let fixture = Fixture::new();
    fixture.repo.local.add_component(component("org", "lib", "1.0"));
    fixture.store.store_component_metadata(
        &RepositoryId::new("central"),
        component_id("org", "lib", "1.0"),
        Some(component("org", "lib", "1.0").with_dependency(dependency("org", "util", "2.0"))),
        commenced(),
    );

    let result = resolve_locally(&fixture.caching(), "1.0");
    let lib = result.value().unwrap();
    assert!(lib.dependencies.is_empty());
    assert_eq!(lib.status, "processed");
}

#[test]
fn changing_modules_expire() {
    let fixture = Fixture::new();
    let mut snapshot = component("org", "lib", "1.0-SNAPSHOT");
    snapshot.changing = true;
    fixture.store.store_component_metadata(
        &RepositoryId::new("central"),
        snapshot.id.clone(),
        Some(snapshot),
        commenced(),
    );
    fixture.store.store_component_metadata(
        &RepositoryId::new("central"),
        component_id("org", "lib", "1.0"),
        Some(component("org", "lib", "1.0")),
        commenced(),
    );

    let next_day = fixture.caching_at(commenced() + Duration::hours(25), ModuleIdExtractor::PerModule);
    assert!(!resolve_locally(&next_day, "1.0-SNAPSHOT").has_result());
    assert!(resolve_locally(&next_day, "1.0").value().is_some());

    let same_day = fixture.caching_at(commenced() + Duration::hours(1), ModuleIdExtractor::PerModule);
    assert!(resolve_locally(&same_day, "1.0-SNAPSHOT").value().is_some());
}

#[test]
fn changing_dependency_expires_static_metadata() {
    let fixture = Fixture::new();
    fixture.store.store_component_metadata(
        &RepositoryId::new("central"),
        component_id("org", "lib", "1.0"),
        Some(component("org", "lib", "1.0")),
        commenced(),
    );
    let next_day = fixture.caching_at(commenced() + Duration::hours(25), ModuleIdExtractor::PerModule);

    let mut result = ComponentMetadataResult::new();
    next_day
        .local_access()
        .resolve_component_metadata(
            &dependency("org", "lib", "1.0").changing(),
            &component_id("org", "lib", "1.0"),
            &mut result,
        )
        .unwrap();
    assert!(!result.has_result());
}

#[test]
fn missing_modules_are_remembered_until_expiry() {
    let fixture = Fixture::new();
    let remote = resolve_remotely(&fixture.caching(), "9.9");
    assert!(!remote.has_result());

    // The mock leaves the result untouched, so nothing is recorded for it.
    assert!(
        fixture
            .store
            .component_metadata(&RepositoryId::new("central"), &component_id("org", "lib", "9.9"))
            .is_none()
    );

    fixture.store.store_component_metadata(
        &RepositoryId::new("central"),
        component_id("org", "lib", "9.9"),
        None,
        commenced(),
    );
    assert!(resolve_locally(&fixture.caching(), "9.9").is_missing());

    let next_day = fixture.caching_at(commenced() + Duration::hours(25), ModuleIdExtractor::PerModule);
    assert!(!resolve_locally(&next_day, "9.9").has_result());
}

#[test]
fn per_version_listings_do_not_answer_other_selectors() {
    let fixture = Fixture::new();
    fixture.repo.remote.set_versions(&["1.0", "1.1"]);
    let caching = fixture.caching_at(commenced(), ModuleIdExtractor::PerVersion);

    caching
        .remote_access()
        .list_module_versions(&dependency("org", "lib", "1.+"), &mut ModuleVersionListingResult::new())
        .unwrap();

    let mut same = ModuleVersionListingResult::new();
    caching
        .local_access()
        .list_module_versions(&dependency("org", "lib", "1.+"), &mut same)
        .unwrap();
    let mut other = ModuleVersionListingResult::new();
    caching
        .local_access()
        .list_module_versions(&dependency("org", "lib", "2.+"), &mut other)
        .unwrap();

    assert_eq!(same.value(), Some(&vec!["1.0".to_string(), "1.1".to_string()]));
    assert!(!other.has_result());
}

#[test]
fn per_module_listings_answer_every_selector() {
    let fixture = Fixture::new();
    fixture.repo.remote.set_versions(&["1.0", "2.0"]);
    let caching = fixture.caching();

    caching
        .remote_access()
        .list_module_versions(&dependency("org", "lib", "1.+"), &mut ModuleVersionListingResult::new())
        .unwrap();

    let mut other = ModuleVersionListingResult::new();
    caching
        .local_access()
        .list_module_versions(&dependency("org", "lib", "2.+"), &mut other)
        .unwrap();
    assert!(other.has_result());

    let next_day = fixture.caching_at(commenced() + Duration::hours(25), ModuleIdExtractor::PerModule);
    let mut expired = ModuleVersionListingResult::new();
    next_day
        .local_access()
        .list_module_versions(&dependency("org", "lib", "2.+"), &mut expired)
        .unwrap();
    assert!(!expired.has_result());
}

#[test]
fn artifact_sets_are_cached_per_type() {
    let fixture = Fixture::new();
    let lib = component("org", "lib", "1.0");
    fixture.repo.remote.set_artifacts(vec![jar(&lib)]);
    let caching = fixture.caching();

    caching
        .remote_access()
        .resolve_module_artifacts_by_type(&lib, ArtifactType::Sources, &mut ArtifactSetResult::new())
        .unwrap();

    let mut sources = ArtifactSetResult::new();
    caching
        .local_access()
        .resolve_module_artifacts_by_type(&lib, ArtifactType::Sources, &mut sources)
        .unwrap();
    let mut javadoc = ArtifactSetResult::new();
    caching
        .local_access()
        .resolve_module_artifacts_by_type(&lib, ArtifactType::Javadoc, &mut javadoc)
        .unwrap();

    assert_eq!(sources.value(), Some(&vec![jar(&lib)]));
    assert!(!javadoc.has_result());
}

#[test]
fn store_access_runs_under_the_cache_lock() {
    let fixture = Fixture::new();
    fixture.repo.remote.add_component(component("org", "lib", "1.0"));
    let lock = RecordingLockManager::new();
    let caching = CachingModuleComponentRepository::new(
        Arc::new(fixture.repo.clone()),
        fixture.store.clone(),
        CachePolicy::default(),
        Arc::new(BuildCommencedTimeProvider::at(commenced())),
        Arc::new(MarkProcessed),
        ModuleIdExtractor::PerModule,
        lock.clone(),
    );

    resolve_remotely(&caching, "1.0");
    resolve_locally(&caching, "1.0");

    assert_eq!(
        lock.events(),
        vec![
            "use_cache: Store metadata of org:lib:1.0 in cache",
            "use_cache: Read metadata of org:lib:1.0 from cache",
        ]
    );
}

fn download(repo: &CachingModuleComponentRepository) -> ArtifactResult {
    let mut result = ArtifactResult::new();
    repo.resolve_artifact(&jar(&component("org", "lib", "1.0")), None, &mut result)
        .unwrap();
    result
}

#[test]
fn downloaded_artifacts_are_served_from_the_location_index() {
    let fixture = Fixture::new();

    let first = download(&fixture.caching());
    let next_week = download(&fixture.caching_at(commenced() + Duration::days(7), ModuleIdExtractor::PerModule));

    let expected = PathBuf::from("/cache/central/lib.jar");
    assert_eq!(first.value(), Some(&expected));
    assert_eq!(next_week.value(), Some(&expected));
    assert_eq!(fixture.repo.downloads.call_count(), 1);

    let entry = fixture
        .store
        .artifact_location(&RepositoryId::new("central"), &jar(&component("org", "lib", "1.0")))
        .unwrap();
    assert_eq!(entry.value, Some(expected));
}

#[test]
fn refresh_downloads_again() {
    let fixture = Fixture::new();
    download(&fixture.caching());

    let refresh = CachePolicy {
        refresh_all: true,
        ..CachePolicy::default()
    };
    let refreshed = download(&fixture.caching_with(refresh, commenced(), ModuleIdExtractor::PerModule));

    assert!(refreshed.value().is_some());
    assert_eq!(fixture.repo.downloads.call_count(), 2);
}

#[test]
fn recorded_absence_skips_download_until_expiry() {
    let fixture = Fixture::new();
    fixture.store.store_artifact_location(
        &RepositoryId::new("central"),
        jar(&component("org", "lib", "1.0")),
        None,
        commenced(),
    );

    assert!(download(&fixture.caching()).is_missing());
    assert_eq!(fixture.repo.downloads.call_count(), 0);

    let next_day = fixture.caching_at(commenced() + Duration::hours(25), ModuleIdExtractor::PerModule);
    assert!(download(&next_day).value().is_some());
    assert_eq!(fixture.repo.downloads.call_count(), 1);
}

#[test]
fn artifact_index_access_runs_under_the_cache_lock() {
    let fixture = Fixture::new();
    let lock = RecordingLockManager::new();
    let caching = CachingModuleComponentRepository::new(
        Arc::new(fixture.repo.clone()),
        fixture.store.clone(),
        CachePolicy::default(),
        Arc::new(BuildCommencedTimeProvider::at(commenced())),
        Arc::new(MarkProcessed),
        ModuleIdExtractor::PerModule,
        lock.clone(),
    );

    download(&caching);

    assert_eq!(
        lock.events(),
        vec![
            "use_cache: Read location of lib.jar (org:lib:1.0) from cache",
            "use_cache: Store location of lib.jar (org:lib:1.0) in cache",
        ]
    );
}
