//! Concurrent fan-out of one request to every configured model

use std::sync::Arc;
use log::{debug, error, info, trace};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::deadline::Deadline;
use crate::error::Error;
use crate::registry::ProviderRegistry;
use crate::request::{ModelResult, Request, Response, StreamEvent};

/// Dispatches requests against a read-only provider registry
#[derive(Debug, Clone)]
pub struct Orchestrator
{   registry: Arc<ProviderRegistry>
}

impl Orchestrator
{   pub fn new(registry: ProviderRegistry) -> Self
    {   debug!("Creating Orchestrator with {} providers", registry.len());
        Orchestrator
        {   registry: Arc::new(registry)
        }
    }

    /// Orchestrator over the built-in providers
    pub fn with_defaults() -> Self
    {   Orchestrator::new(ProviderRegistry::with_defaults())
    }

    /// Registry shared by every dispatch
    pub fn registry(&self) -> &ProviderRegistry
    {   &self.registry
    }

    /// Batched mode.
    ///
    /// Waits for every model, successful or not, and returns results
    /// index-aligned with `request.models`.
    pub async fn run(
      &self
    , deadline: &Deadline
    , request: Arc<Request>
    ) -> Response
    {   info!(
          "Dispatching {} models (batched), {:?} left",
          request.models.len(), deadline.remaining()
        );

        let handles: Vec<JoinHandle<ModelResult>>
          = (0..request.models.len())
            .map(|index| self.spawn_invocation(deadline, &request, index))
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (index, handle) in handles.into_iter().enumerate()
        {   let result = match handle.await
            {   Ok(result) => result
              , Err(e) => {
                  error!("Task for models[{}] failed: {}", index, e);
                  ModelResult::failed(
                    &request.models[index]
                  , format!("task failed: {}", e)
                  )
                }
            };
            results.push(result);
        }

        debug!("Batched dispatch complete");
        Response { results }
    }

    /// Streaming mode over any async sink.
    ///
    /// Writes one JSON line per result in completion order, then a
    /// single `done` line. A failed write aborts the stream.
    pub async fn run_stream<W>(
      &self
    , deadline: &Deadline
    , request: Arc<Request>
    , sink: &mut W
    ) -> Result<(), Error>
    where
      W: AsyncWrite + Unpin
    {   info!(
          "Dispatching {} models (streaming), {:?} left",
          request.models.len(), deadline.remaining()
        );

        let mut results = self.stream_results(deadline, request);
        while let Some(result) = results.recv().await
        {   trace!("Streaming result for: {}", result.name);
            write_event(sink, &StreamEvent::Result(result)).await?;
        }

        debug!("All results delivered, writing done");
        write_event(sink, &StreamEvent::Done).await
    }

    /// Results in completion order.
    ///
    /// The channel closes once every per-model task has exited. A task
    /// still waiting to deliver when the deadline ends drops its result.
    pub fn stream_results(
      &self
    , deadline: &Deadline
    , request: Arc<Request>
    ) -> mpsc::Receiver<ModelResult>
    {   let (tx, rx) = mpsc::channel(1);

        let producers: Vec<JoinHandle<()>>
          = (0..request.models.len())
            .map(|index| {
              let invocation
                = self.spawn_invocation(deadline, &request, index);
              let tx = tx.clone();
              let deadline = deadline.clone();
              let request = request.clone();
              tokio::spawn(async move {
                let result = match invocation.await
                {   Ok(result) => result
                  , Err(e) => {
                      error!("Task for models[{}] failed: {}", index, e);
                      ModelResult::failed(
                        &request.models[index]
                      , format!("task failed: {}", e)
                      )
                    }
                };
                deliver(&tx, &deadline, result).await;
              })
            })
            .collect();

        // Supervisor: the last sender goes away once every producer exits
        tokio::spawn(async move {
          for producer in producers
          {   if let Err(e) = producer.await
              {   error!("Stream producer failed: {}", e);
              }
          }
          trace!("All producers finished, closing result channel");
          drop(tx);
        });

        rx
    }

    fn spawn_invocation(
      &self
    , deadline: &Deadline
    , request: &Arc<Request>
    , index: usize
    ) -> JoinHandle<ModelResult>
    {   let registry = self.registry.clone();
        let deadline = deadline.clone();
        let request = request.clone();
        tokio::spawn(async move {
          invoke(&registry, &deadline, &request, index).await
        })
    }
}

/// Run one configured model; every failure lands in its result
async fn invoke(
  registry: &ProviderRegistry
, deadline: &Deadline
, request: &Request
, index: usize
) -> ModelResult
{   let cfg = &request.models[index];

    let provider = match registry.resolve(&cfg.provider)
    {   Some(provider) => provider
      , None => {
          error!("Unknown provider for {}: {}", cfg.name, cfg.provider);
          return ModelResult::failed(
            cfg
          , Error::UnknownProvider(cfg.provider.clone())
          );
        }
    };

    debug!("Calling {} for: {}", provider.id(), cfg.name);
    let outcome = deadline
      .run(provider.call(deadline, cfg, &request.prompt, &request.code))
      .await;

    match outcome
    {   Ok(text) => ModelResult::ok(cfg, text)
      , Err(e) => {
          debug!("Model {} failed: {}", cfg.name, e);
          ModelResult::failed(cfg, e)
        }
    }
}

async fn deliver(
  tx: &mpsc::Sender<ModelResult>
, deadline: &Deadline
, result: ModelResult
)
{   let name = result.name.clone();
    tokio::select!
    { biased;
      sent = tx.send(result) => {
        if sent.is_err()
        {   debug!("Receiver gone, dropping result for: {}", name);
        }
      }
    , _ = deadline.done() => {
        debug!("Deadline ended before delivery, dropping: {}", name);
      }
    }
}

async fn write_event<W>(sink: &mut W, event: &StreamEvent)
  -> Result<(), Error>
where
  W: AsyncWrite + Unpin
{   let mut line = serde_json::to_vec(event)?;
    line.push(b'\n');
    sink.write_all(&line).await.map_err(|e| {
      error!("Failed to write stream event: {}", e);
      Error::from(e)
    })?;
    sink.flush().await.map_err(Error::from)
}
