//! # stdio Transport
//!
//! Line-delimited JSON-RPC over stdin/stdout: one JSON value per line in,
//! one per line out. The default transport when the server is launched
//! with no subcommand, for MCP clients that spawn the server as a child
//! process and speak JSON-RPC over its pipes directly.

use crate::error::CaptureError;
use crate::protocol::{DispatchOutcome, JsonRpcRequest, JsonRpcResponse, ProtocolDispatcher, ServerContext};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{error, warn};

/// Run the stdio transport against the process's real stdin/stdout.
pub async fn run(ctx: ServerContext) -> anyhow::Result<()> {
    run_with(tokio::io::stdin(), tokio::io::stdout(), ctx).await
}

/// Run the stdio transport over arbitrary reader/writer halves. Split out
/// from [`run`] so tests can drive it over an in-process duplex pipe instead
/// of the process's real stdin/stdout.
pub async fn run_with<R, W>(reader: R, mut writer: W, ctx: ServerContext) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                warn!(error = %e, "failed to parse JSON-RPC request");
                let err = CaptureError::protocol_parse(e.to_string());
                let resp = JsonRpcResponse::err(serde_json::Value::Null, &err);
                write_line(&mut writer, &resp).await?;
                continue;
            }
        };

        match ProtocolDispatcher::dispatch(&ctx, request, false).await {
            DispatchOutcome::Response(resp) => write_line(&mut writer, &resp).await?,
            DispatchOutcome::BinaryResource { ack, .. } => write_line(&mut writer, &ack).await?,
            DispatchOutcome::NoResponse => {}
        }
    }
    Ok(())
}

async fn write_line<W: AsyncWrite + Unpin, T: serde::Serialize>(
    writer: &mut W,
    value: &T,
) -> anyhow::Result<()> {
    let mut line = serde_json::to_string(value)?;
    line.push('\n');
    if let Err(e) = writer.write_all(line.as_bytes()).await {
        error!(error = %e, "failed to write response to stdout");
        return Err(e.into());
    }
    writer.flush().await?;
    Ok(())
}
