use crate::error::LeadsError;
use crate::service::workflow::Workflow;
use crate::types::run::{RunId, RunParams, RunSnapshot, RunStatus, WorkflowOutput};

use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Public messages handled by the runs actor.
#[derive(Debug)]
pub enum RunsActorMessage {
    /// Register a run and start executing it in the background.
    Create(RunParams, RpcReplyPort<RunSnapshot>),
    /// Look up the status of a run. `None` when unknown or evicted.
    Get(RunId, RpcReplyPort<Option<RunStatus>>),

    // Internal messages (sent by spawned run tasks)
    Started {
        id: RunId,
    },
    Finished {
        id: RunId,
        result: Result<WorkflowOutput, String>,
    },
}

/// Handle for interacting with the runs actor.
#[derive(Clone)]
pub struct RunsHandle {
    actor: ActorRef<RunsActorMessage>,
}

impl RunsHandle {
    pub async fn create(&self, params: RunParams) -> Result<RunSnapshot, LeadsError> {
        ractor::call!(self.actor, RunsActorMessage::Create, params)
            .map_err(|e| LeadsError::Ractor(format!("Create RPC failed: {e}")))
    }

    pub async fn get(&self, id: RunId) -> Result<Option<RunStatus>, LeadsError> {
        ractor::call!(self.actor, RunsActorMessage::Get, id)
            .map_err(|e| LeadsError::Ractor(format!("Get RPC failed: {e}")))
    }
}

struct RunRecord {
    params: RunParams,
    status: RunStatus,
}

struct RunsActorState {
    workflow: Arc<Workflow>,
    runs: HashMap<RunId, RunRecord>,
    finished: VecDeque<RunId>,
    retention: usize,
}

struct RunsActor;

#[ractor::async_trait]
impl Actor for RunsActor {
    type Msg = RunsActorMessage;
    type State = RunsActorState;
    type Arguments = (Arc<Workflow>, usize);

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        arguments: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let (workflow, retention) = arguments;
        info!(retention, "RunsActor started");
        Ok(RunsActorState {
            workflow,
            runs: HashMap::new(),
            finished: VecDeque::new(),
            retention,
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            RunsActorMessage::Create(params, rp) => {
                let snapshot = self.handle_create(state, &myself, params);
                let _ = rp.send(snapshot);
            }
            RunsActorMessage::Get(id, rp) => {
                let status = state.runs.get(&id).map(|r| r.status.clone());
                let _ = rp.send(status);
            }
            RunsActorMessage::Started { id } => {
                if let Some(record) = state.runs.get_mut(&id) {
                    record.status = RunStatus::Running;
                }
            }
            RunsActorMessage::Finished { id, result } => {
                self.handle_finished(state, id, result);
            }
        }
        Ok(())
    }
}

impl RunsActor {
    fn handle_create(
        &self,
        state: &mut RunsActorState,
        myself: &ActorRef<RunsActorMessage>,
        params: RunParams,
    ) -> RunSnapshot {
        let id = Uuid::new_v4();
        state.runs.insert(
            id,
            RunRecord {
                params: params.clone(),
                status: RunStatus::Queued,
            },
        );
        info!(run_id = %id, user_email = %params.user_email, "run created");

        let workflow = state.workflow.clone();
        let me = myself.clone();
        tokio::spawn(async move {
            let _ = ractor::cast!(me, RunsActorMessage::Started { id });
            let result = workflow.run(&params).await.map_err(|e| e.to_string());
            let _ = ractor::cast!(me, RunsActorMessage::Finished { id, result });
        });

        RunSnapshot {
            id,
            details: RunStatus::Queued,
        }
    }

    fn handle_finished(
        &self,
        state: &mut RunsActorState,
        id: RunId,
        result: Result<WorkflowOutput, String>,
    ) {
        let Some(record) = state.runs.get_mut(&id) else {
            return;
        };
        record.status = match result {
            Ok(output) => {
                info!(run_id = %id, messages = output.messages.len(), "run complete");
                RunStatus::Complete { output }
            }
            Err(error) => {
                error!(run_id = %id, user_email = %record.params.user_email, %error, "run errored");
                RunStatus::Errored { error }
            }
        };

        state.finished.push_back(id);
        while state.finished.len() > state.retention {
            if let Some(evicted) = state.finished.pop_front() {
                state.runs.remove(&evicted);
                debug!(run_id = %evicted, "finished run evicted");
            }
        }
    }
}

/// Spawn the runs actor and return a handle.
pub async fn spawn(workflow: Arc<Workflow>, retention: usize) -> Result<RunsHandle, LeadsError> {
    let (actor, _jh) = Actor::spawn(None, RunsActor, (workflow, retention))
        .await
        .map_err(|e| LeadsError::Ractor(format!("failed to spawn RunsActor: {e}")))?;
    Ok(RunsHandle { actor })
}
