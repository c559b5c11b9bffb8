use grantthrive::clock::Clock;
use grantthrive::store::MemoryStore;
use grantthrive::workflows::applications::ApplicationService;
use grantthrive::workflows::features::FeatureToggleService;
use grantthrive::workflows::grants::GrantService;
use grantthrive::workflows::ListingConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// The three workflow services sharing one store and clock.
pub(crate) struct Services<C> {
    pub(crate) grants: Arc<GrantService<MemoryStore, C>>,
    pub(crate) applications: Arc<ApplicationService<MemoryStore, C>>,
    pub(crate) features: Arc<FeatureToggleService<MemoryStore, C>>,
}

impl<C: Clock + 'static> Services<C> {
    pub(crate) fn in_memory(clock: Arc<C>, listing: ListingConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            grants: Arc::new(GrantService::new(store.clone(), clock.clone(), listing)),
            applications: Arc::new(ApplicationService::new(
                store.clone(),
                clock.clone(),
                listing,
            )),
            features: Arc::new(FeatureToggleService::new(store, clock)),
        }
    }
}
