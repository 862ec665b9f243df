//! Single-owner scheduler actor.
//!
//! All timetable operations run one at a time on a blocking worker that
//! owns the [`TimetableService`]. Handles send commands over a channel and
//! wait for the reply, so two allocations can never interleave. A
//! generation run occupies the actor until it finishes or its event
//! receiver is dropped.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::{CallerRole, LocomotiveAvailability, TimetableService, TrainRequest};
use crate::conflict::ConflictReport;
use crate::domain::{ClockTime, LocomotiveId, StationId, Train};
use crate::error::EngineError;
use crate::generation::{GenerationConfig, GenerationEvent, GenerationPreview};
use crate::network::RouteResult;
use crate::repair::CapacityRepair;
use crate::store::{Backend, StoreError};

/// Commands waiting in the actor's queue.
const QUEUE_DEPTH: usize = 64;

type Reply<T> = oneshot::Sender<Result<T, EngineError>>;

enum Command {
    ValidateRoute {
        role: CallerRole,
        from: StationId,
        to: StationId,
        reply: Reply<RouteResult>,
    },
    Preview {
        role: CallerRole,
        request: GenerationConfig,
        reply: Reply<GenerationPreview>,
    },
    Generate {
        role: CallerRole,
        request: GenerationConfig,
        events: mpsc::UnboundedSender<GenerationEvent>,
        accepted: Reply<()>,
    },
    CheckConflicts {
        role: CallerRole,
        reply: Reply<ConflictReport>,
    },
    ResolveConflicts {
        role: CallerRole,
        reply: Reply<CapacityRepair>,
    },
    ClearAutoGenerated {
        role: CallerRole,
        reply: Reply<usize>,
    },
    ClearAll {
        role: CallerRole,
        reply: Reply<usize>,
    },
    CreateTrain {
        role: CallerRole,
        request: TrainRequest,
        reply: Reply<Train>,
    },
    ListTrains {
        role: CallerRole,
        reply: Reply<Vec<Train>>,
    },
    LocomotiveAvailability {
        role: CallerRole,
        locomotive: LocomotiveId,
        time: ClockTime,
        reply: Reply<LocomotiveAvailability>,
    },
}

/// Cloneable handle to the scheduler actor.
#[derive(Clone)]
pub struct Dispatcher {
    commands: mpsc::Sender<Command>,
}

fn stopped() -> EngineError {
    EngineError::Persistence(StoreError::Unavailable {
        message: "scheduler is not running".to_string(),
    })
}

impl Dispatcher {
    /// Start the actor on the blocking pool. Must be called from within a
    /// tokio runtime.
    pub fn spawn<S: Backend + ?Sized + 'static>(service: TimetableService<S>) -> Self {
        let (commands, mut rx) = mpsc::channel(QUEUE_DEPTH);
        let service = Arc::new(service);

        tokio::task::spawn_blocking(move || {
            while let Some(command) = rx.blocking_recv() {
                handle(&service, command);
            }
            debug!("scheduler actor stopped");
        });

        Self { commands }
    }

    async fn call<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<T, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| stopped())?;
        rx.await.map_err(|_| stopped())?
    }

    pub async fn validate_route(
        &self,
        role: CallerRole,
        from: StationId,
        to: StationId,
    ) -> Result<RouteResult, EngineError> {
        self.call(|reply| Command::ValidateRoute {
            role,
            from,
            to,
            reply,
        })
        .await
    }

    pub async fn preview_generation(
        &self,
        role: CallerRole,
        request: GenerationConfig,
    ) -> Result<GenerationPreview, EngineError> {
        self.call(|reply| Command::Preview {
            role,
            request,
            reply,
        })
        .await
    }

    /// Start a generation run.
    ///
    /// Resolves once the request has been accepted; rejected requests
    /// return their error instead of a stream. Dropping the receiver
    /// cancels the rest of the run.
    pub async fn generate(
        &self,
        role: CallerRole,
        request: GenerationConfig,
    ) -> Result<mpsc::UnboundedReceiver<GenerationEvent>, EngineError> {
        let (events, rx) = mpsc::unbounded_channel();
        self.call(|accepted| Command::Generate {
            role,
            request,
            events,
            accepted,
        })
        .await?;
        Ok(rx)
    }

    pub async fn check_conflicts(&self, role: CallerRole) -> Result<ConflictReport, EngineError> {
        self.call(|reply| Command::CheckConflicts { role, reply }).await
    }

    pub async fn resolve_conflicts(&self, role: CallerRole) -> Result<CapacityRepair, EngineError> {
        self.call(|reply| Command::ResolveConflicts { role, reply }).await
    }

    pub async fn clear_auto_generated(&self, role: CallerRole) -> Result<usize, EngineError> {
        self.call(|reply| Command::ClearAutoGenerated { role, reply }).await
    }

    pub async fn clear_all(&self, role: CallerRole) -> Result<usize, EngineError> {
        self.call(|reply| Command::ClearAll { role, reply }).await
    }

    pub async fn create_train(&self, role: CallerRole, request: TrainRequest) -> Result<Train, EngineError> {
        self.call(|reply| Command::CreateTrain {
            role,
            request,
            reply,
        })
        .await
    }

    pub async fn list_trains(&self, role: CallerRole) -> Result<Vec<Train>, EngineError> {
        self.call(|reply| Command::ListTrains { role, reply }).await
    }

    pub async fn locomotive_availability(
        &self,
        role: CallerRole,
        locomotive: LocomotiveId,
        time: ClockTime,
    ) -> Result<LocomotiveAvailability, EngineError> {
        self.call(|reply| Command::LocomotiveAvailability {
            role,
            locomotive,
            time,
            reply,
        })
        .await
    }
}

fn handle<S: Backend + ?Sized>(service: &TimetableService<S>, command: Command) {
    // A dropped reply receiver means the caller went away; nothing to do.
    match command {
        Command::ValidateRoute {
            role,
            from,
            to,
            reply,
        } => {
            let _ = reply.send(service.validate_route(role, &from, &to));
        }
        Command::Preview {
            role,
            request,
            reply,
        } => {
            let _ = reply.send(service.preview_generation(role, &request));
        }
        Command::Generate {
            role,
            request,
            events,
            accepted,
        } => {
            let mut accepted = Some(accepted);
            let result = service.generate(role, &request, |event| {
                if let Some(tx) = accepted.take() {
                    let _ = tx.send(Ok(()));
                }
                events.send(event).is_ok()
            });
            match (result, accepted.take()) {
                (Err(e), Some(tx)) => {
                    let _ = tx.send(Err(e));
                }
                (Err(e), None) => warn!(error = %e, "generation failed after it started"),
                (Ok(stats), tx) => {
                    if let Some(tx) = tx {
                        let _ = tx.send(Ok(()));
                    }
                    debug!(?stats, "generation command done");
                }
            }
        }
        Command::CheckConflicts { role, reply } => {
            let _ = reply.send(service.check_conflicts(role));
        }
        Command::ResolveConflicts { role, reply } => {
            let _ = reply.send(service.resolve_conflicts(role));
        }
        Command::ClearAutoGenerated { role, reply } => {
            let _ = reply.send(service.clear_auto_generated(role));
        }
        Command::ClearAll { role, reply } => {
            let _ = reply.send(service.clear_all(role));
        }
        Command::CreateTrain {
            role,
            request,
            reply,
        } => {
            let _ = reply.send(service.create_train(role, request));
        }
        Command::ListTrains { role, reply } => {
            let _ = reply.send(service.list_trains(role));
        }
        Command::LocomotiveAvailability {
            role,
            locomotive,
            time,
            reply,
        } => {
            let _ = reply.send(service.locomotive_availability(role, locomotive, time));
        }
    }
}
