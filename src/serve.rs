//! Stdio transport: JSON-lines requests in, JSON-lines responses out.
//!
//! Every request runs on its own task. Responses for tabs that no longer
//! have a context are dropped, except the `ack` for a closed tab.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use pagemind_protocols::{Request, Response};
use pagemind_runtime::{Dispatcher, ExtensionState};

/// Serve until `input` is exhausted and every in-flight request finished.
///
/// `responses` must feed `outbound`; the dispatcher's progress updates are
/// expected to use the same channel.
pub(crate) async fn serve<R, W>(
    dispatcher: Dispatcher,
    responses: UnboundedSender<Response>,
    outbound: UnboundedReceiver<Response>,
    mut input: R,
    output: W,
) -> io::Result<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let writer = tokio::spawn(write_responses(
        dispatcher.state().clone(),
        outbound,
        output,
    ));
    let dispatcher = Arc::new(dispatcher);
    let mut tasks = JoinSet::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(e) => {
                warn!("Ignoring request that is not UTF-8: {}", e);
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }

        let request: Request = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                warn!("Ignoring malformed request: {}", e);
                continue;
            }
        };

        let dispatcher = dispatcher.clone();
        let responses = responses.clone();
        tasks.spawn(async move {
            if let Some(response) = dispatcher.handle(request).await {
                let _ = responses.send(response);
            }
        });

        while let Some(result) = tasks.try_join_next() {
            if let Err(e) = result {
                error!("Request task failed: {}", e);
            }
        }
    }

    info!("Input closed, waiting for {} in-flight requests", tasks.len());
    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
            error!("Request task failed: {}", e);
        }
    }

    drop(responses);
    drop(dispatcher);
    writer.await.map_err(io::Error::other)?
}

async fn write_responses<W>(
    state: Arc<ExtensionState>,
    mut outbound: UnboundedReceiver<Response>,
    mut output: W,
) -> io::Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = outbound.recv().await {
        let addressed =
            matches!(response, Response::Ack { .. }) || state.get(response.tab_id()).is_some();
        if !addressed {
            debug!("Dropping response for closed {}", response.tab_id());
            continue;
        }

        let mut line = serde_json::to_string(&response)?;
        line.push('\n');
        output.write_all(line.as_bytes()).await?;
        output.flush().await?;
    }
    Ok(output)
}
