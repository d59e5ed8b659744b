// Background request thread.
//
// The UI thread owns the Workflow and never blocks on the network: accepted
// requests are handed to this thread, and outcomes come back over a channel
// tagged with their ticket. Jobs run one at a time in submission order.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use tesisview_client::{AnalysisService, ClientError};
use tesisview_core::{PendingQuery, PendingUpload, Ticket};
use tesisview_protocol::{QueryResponse, UploadResponse};

pub enum Job {
    Upload(PendingUpload),
    Query(PendingQuery),
}

pub enum Outcome {
    Upload(Ticket, Result<UploadResponse, ClientError>),
    Query(Ticket, Result<QueryResponse, ClientError>),
}

pub struct Worker {
    jobs: Sender<Job>,
    outcomes: Receiver<Outcome>,
}

impl Worker {
    /// Start the thread. It exits once the `Worker` is dropped and the
    /// current job (if any) has finished.
    pub fn spawn<S>(service: S) -> Result<Self, String>
    where
        S: AnalysisService + Send + 'static,
    {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (outcome_tx, outcome_rx) = mpsc::channel::<Outcome>();

        thread::Builder::new()
            .name("tesisview-requests".to_string())
            .spawn(move || {
                for job in job_rx {
                    let outcome = match job {
                        Job::Upload(pending) => {
                            log::debug!("worker: upload #{}", pending.ticket.seq());
                            Outcome::Upload(pending.ticket, service.upload(&pending.document))
                        }
                        Job::Query(pending) => {
                            log::debug!("worker: query #{}", pending.ticket.seq());
                            Outcome::Query(
                                pending.ticket,
                                service.query(&pending.handle, &pending.question),
                            )
                        }
                    };
                    if outcome_tx.send(outcome).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| format!("failed to start request thread: {}", e))?;

        Ok(Self { jobs: job_tx, outcomes: outcome_rx })
    }

    pub fn submit(&self, job: Job) -> Result<(), String> {
        self.jobs
            .send(job)
            .map_err(|_| "request thread stopped".to_string())
    }

    /// Next finished outcome, if any. Never blocks.
    pub fn try_recv(&self) -> Option<Outcome> {
        self.outcomes.try_recv().ok()
    }

    /// Wait up to `timeout` for the next outcome.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Outcome> {
        match self.outcomes.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}
