use dashmap::DashMap;
use governor::{
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{num::NonZeroU32, sync::Arc, time::Duration};
use uuid::Uuid;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Scopes limited independently per user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitScope {
    IntentCreate,
    Confirmation,
}

impl LimitScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitScope::IntentCreate => "intent_create",
            LimitScope::Confirmation => "confirmation",
        }
    }
}

#[derive(Clone, Default)]
pub struct KeyedLimiters {
    // (scope, user) -> limiter
    limiters: Arc<DashMap<(LimitScope, Uuid), Arc<DirectLimiter>>>,
}

impl KeyedLimiters {
    pub fn new() -> Self {
        Self::default()
    }

    fn limiter_for(&self, scope: LimitScope, user_id: Uuid, per_min: u32) -> Arc<DirectLimiter> {
        self.limiters
            .entry((scope, user_id))
            .or_insert_with(|| {
                let per_min = NonZeroU32::new(per_min.max(1)).unwrap_or(NonZeroU32::MIN);
                let quota = Quota::per_minute(per_min).allow_burst(per_min);
                Arc::new(RateLimiter::direct(quota))
            })
            .clone()
    }

    /// `Err` carries how long the caller should wait
    pub fn check(&self, scope: LimitScope, user_id: Uuid, per_min: u32) -> Result<(), Duration> {
        let lim = self.limiter_for(scope, user_id, per_min);
        lim.check()
            .map_err(|n| n.wait_time_from(DefaultClock::default().now()))
    }
}
