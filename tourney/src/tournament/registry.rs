//! Registry spawning one tournament actor per active tournament.

use super::{
    EngineConfig, TournamentId,
    actor::{TournamentActor, TournamentHandle},
    engine::TournamentEngine,
};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

/// Tournament registry
///
/// Actors are spawned lazily on first use, so commands for the same
/// tournament are applied one at a time while different tournaments run
/// independently.
#[derive(Clone)]
pub struct TournamentRegistry {
    engine: TournamentEngine,
    config: EngineConfig,
    actors: Arc<RwLock<HashMap<TournamentId, TournamentHandle>>>,
}

impl TournamentRegistry {
    /// Create a new registry
    pub fn new(engine: TournamentEngine, config: EngineConfig) -> Self {
        Self {
            engine,
            config,
            actors: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Shared engine, for reads that need no serialization
    pub fn engine(&self) -> &TournamentEngine {
        &self.engine
    }

    /// Handle to the actor of `tournament_id`, spawning it if needed
    pub async fn handle(&self, tournament_id: TournamentId) -> TournamentHandle {
        {
            let actors = self.actors.read().await;
            if let Some(handle) = actors.get(&tournament_id)
                && !handle.is_closed()
            {
                return handle.clone();
            }
        }

        let mut actors = self.actors.write().await;
        if let Some(handle) = actors.get(&tournament_id)
            && !handle.is_closed()
        {
            return handle.clone();
        }

        let (actor, handle) = TournamentActor::new(
            tournament_id,
            self.engine.clone(),
            self.config.default_max_seats,
            self.config.inbox_capacity,
        );
        tokio::spawn(async move {
            actor.run().await;
        });

        log::info!("Spawned actor for tournament {}", tournament_id);
        actors.insert(tournament_id, handle.clone());
        handle
    }

    /// Stop the actor of a tournament; returns whether one was running
    pub async fn shutdown(&self, tournament_id: TournamentId) -> bool {
        let handle = self.actors.write().await.remove(&tournament_id);
        match handle {
            Some(handle) => {
                if handle.shutdown().await.is_err() {
                    log::debug!("Actor of tournament {} already stopped", tournament_id);
                }
                true
            }
            None => false,
        }
    }

    /// Stop every actor
    pub async fn shutdown_all(&self) {
        let handles: Vec<TournamentHandle> = self.actors.write().await.drain().map(|(_, h)| h).collect();
        for handle in handles {
            let _ = handle.shutdown().await;
        }
    }

    /// Number of running actors
    pub async fn active_count(&self) -> usize {
        self.actors
            .read()
            .await
            .values()
            .filter(|h| !h.is_closed())
            .count()
    }
}
