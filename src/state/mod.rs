pub mod clock;
pub mod match_state;
pub mod state_machine;

use std::{future::Future, sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::fixture_store::FixtureStore,
    error::ServiceError,
    state::{
        match_state::MatchState,
        state_machine::{MatchStateMachine, MatchStatus, MatchTransition},
    },
};

pub use self::state_machine::{AbortError, ApplyError, Plan, PlanError, PlanId, Snapshot};

pub type SharedState = Arc<AppState>;

/// Central application state: storage handle, configuration and the
/// per-fixture gates that serialise match mutations.
pub struct AppState {
    store: RwLock<Option<Arc<dyn FixtureStore>>>,
    config: Arc<AppConfig>,
    degraded: watch::Sender<bool>,
    fixture_gates: DashMap<Uuid, Arc<Mutex<()>>>,
    transition_timeout: Option<Duration>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let transition_timeout = Some(config.transition_timeout).filter(|limit| !limit.is_zero());
        Arc::new(Self {
            store: RwLock::new(None),
            config: Arc::new(config),
            degraded: degraded_tx,
            fixture_gates: DashMap::new(),
            transition_timeout,
        })
    }

    /// Obtain a handle to the current fixture store, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn FixtureStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Current fixture store.
    ///
    /// Fails with [`ServiceError::Degraded`] when none is installed or when
    /// the supervisor has flagged the installed one as unhealthy.
    pub async fn require_store(&self) -> Result<Arc<dyn FixtureStore>, ServiceError> {
        if self.is_degraded().await {
            return Err(ServiceError::Degraded);
        }
        self.store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new fixture store implementation and leave degraded mode.
    pub async fn set_store(&self, store: Arc<dyn FixtureStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current fixture store and enter degraded mode.
    pub async fn clear_store(&self) {
        {
            let mut guard = self.store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        let changed = self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
        if changed {
            info!(degraded = value, "degraded mode changed");
        }
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Gate serialising every mutation of one fixture's match state.
    pub fn fixture_gate(&self, fixture_id: Uuid) -> Arc<Mutex<()>> {
        self.fixture_gates
            .entry(fixture_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the gate of a deleted fixture.
    pub fn forget_fixture(&self, fixture_id: Uuid) {
        self.fixture_gates.remove(&fixture_id);
    }

    /// Plan `transition` against the fixture's persisted status, run the
    /// side-effect `work`, then apply the plan. On work failure or timeout
    /// the plan is aborted and the persisted status is left unchanged.
    ///
    /// `work` receives the current state and the plan; it runs while the
    /// fixture gate is held and must not try to take it again.
    pub async fn run_transition<F, Fut, T>(
        &self,
        fixture_id: Uuid,
        transition: MatchTransition,
        work: F,
    ) -> Result<(T, MatchStatus), ServiceError>
    where
        F: FnOnce(MatchState, Plan) -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let gate = self.fixture_gate(fixture_id);
        let _guard = gate.lock().await;

        let store = self.require_store().await?;
        let current: MatchState = store
            .find_match_state(fixture_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("fixture `{fixture_id}`")))?
            .into();

        let mut machine = MatchStateMachine::restore(current.status, current.version);
        let plan = machine.plan(transition)?;
        let plan_id = plan.id;

        let work_future = work(current, plan);
        let outcome = if let Some(limit) = self.transition_timeout {
            match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => {
                    if let Err(abort_err) = machine.abort(plan_id) {
                        warn!(
                            fixture_id = %fixture_id,
                            transition = ?transition,
                            plan_id = %plan_id,
                            error = ?abort_err,
                            "failed to abort transition after timeout"
                        );
                    }
                    return Err(ServiceError::Timeout);
                }
            }
        } else {
            work_future.await
        };

        match outcome {
            Ok(value) => {
                let next = machine.apply(plan_id)?;
                info!(fixture_id = %fixture_id, transition = ?transition, status = ?next, "match transition applied");
                Ok((value, next))
            }
            Err(err) => {
                if let Err(abort_err) = machine.abort(plan_id) {
                    warn!(
                        fixture_id = %fixture_id,
                        transition = ?transition,
                        plan_id = %plan_id,
                        error = ?abort_err,
                        "failed to abort transition after work error"
                    );
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::{fixture_store::MemoryFixtureStore, models::MatchStateEntity};

    async fn state_with_fixture() -> (SharedState, Uuid) {
        let state = AppState::new(AppConfig::default());
        let store = MemoryFixtureStore::new();
        let fixture_id = Uuid::new_v4();
        store
            .save_match_state(MatchStateEntity::from(MatchState::new(fixture_id)))
            .await
            .unwrap();
        state.set_store(Arc::new(store)).await;
        (state, fixture_id)
    }

    #[tokio::test]
    async fn starts_degraded_until_store_installed() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded().await);
        assert!(matches!(
            state.require_store().await,
            Err(ServiceError::Degraded)
        ));

        state.set_store(Arc::new(MemoryFixtureStore::new())).await;
        assert!(!state.is_degraded().await);

        state.clear_store().await;
        assert!(state.is_degraded().await);
    }

    #[tokio::test]
    async fn degraded_flag_refuses_installed_store() {
        let (state, fixture_id) = state_with_fixture().await;
        assert!(state.require_store().await.is_ok());

        state.update_degraded(true).await;
        assert!(state.store().await.is_some());
        assert!(matches!(
            state.require_store().await,
            Err(ServiceError::Degraded)
        ));
        let refused = state
            .run_transition(fixture_id, MatchTransition::Start, |_, _| async { Ok(()) })
            .await;
        assert!(refused.is_err());

        state.update_degraded(false).await;
        assert!(state.require_store().await.is_ok());
    }

    #[tokio::test]
    async fn successful_work_applies_plan() {
        let (state, fixture_id) = state_with_fixture().await;
        let ((), next) = state
            .run_transition(fixture_id, MatchTransition::Start, |current, plan| async move {
                assert_eq!(current.status, MatchStatus::NotStarted);
                assert_eq!(plan.version_next, 1);
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(next, MatchStatus::InProgress);
    }

    #[tokio::test]
    async fn failing_work_surfaces_error() {
        let (state, fixture_id) = state_with_fixture().await;
        let err = state
            .run_transition(fixture_id, MatchTransition::Start, |_, _| async {
                Err::<(), _>(ServiceError::Precondition(vec!["missing".into()]))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Precondition(_)));
    }

    #[tokio::test]
    async fn invalid_transition_never_runs_work() {
        let (state, fixture_id) = state_with_fixture().await;
        let mut ran = false;
        let err = state
            .run_transition(fixture_id, MatchTransition::Pause, |_, _| {
                ran = true;
                async { Ok::<(), ServiceError>(()) }
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert!(!ran);
    }

    #[tokio::test]
    async fn unknown_fixture_is_not_found() {
        let (state, _) = state_with_fixture().await;
        let err = state
            .run_transition(Uuid::new_v4(), MatchTransition::Start, |_, _| async {
                Ok::<(), ServiceError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_work_times_out() {
        let (state, fixture_id) = state_with_fixture().await;
        let err = state
            .run_transition(fixture_id, MatchTransition::Start, |_, _| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<(), ServiceError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Timeout));
    }
}
