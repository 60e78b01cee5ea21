use chrono::Duration;
use std::sync::Arc;

use storage::{BankStore, InMemorySessionStore, SessionStore};

use crate::quiz_service::QuizService;
use crate::sessions::{EngineConfig, SessionEngine};
use crate::Clock;

/// Startup knobs for [`AppServices`].
#[derive(Debug, Clone, Default)]
pub struct ServiceOptions {
    pub clock: Clock,
    /// Fixed RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Idle-session TTL; `None` disables eviction.
    pub idle_ttl: Option<Duration>,
}

/// Assembles the session engine and the quiz boundary over a loaded bank store.
#[derive(Clone)]
pub struct AppServices {
    banks: Arc<BankStore>,
    engine: Arc<SessionEngine>,
    quiz: Arc<QuizService>,
}

impl AppServices {
    /// Wire services with an in-memory session store.
    #[must_use]
    pub fn in_memory(banks: BankStore, options: ServiceOptions) -> Self {
        Self::with_store(banks, Arc::new(InMemorySessionStore::new()), options)
    }

    #[must_use]
    pub fn with_store(
        banks: BankStore,
        sessions: Arc<dyn SessionStore>,
        options: ServiceOptions,
    ) -> Self {
        let banks = Arc::new(banks);
        let mut engine = SessionEngine::new(Arc::clone(&banks), sessions, options.clock)
            .with_config(EngineConfig {
                idle_ttl: options.idle_ttl,
            });
        if let Some(seed) = options.seed {
            engine = engine.with_seed(seed);
        }
        let engine = Arc::new(engine);
        let quiz = Arc::new(QuizService::new(Arc::clone(&engine)));

        Self {
            banks,
            engine,
            quiz,
        }
    }

    #[must_use]
    pub fn banks(&self) -> Arc<BankStore> {
        Arc::clone(&self.banks)
    }

    #[must_use]
    pub fn engine(&self) -> Arc<SessionEngine> {
        Arc::clone(&self.engine)
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizService> {
        Arc::clone(&self.quiz)
    }
}
