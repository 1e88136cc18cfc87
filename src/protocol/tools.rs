//! # MCP Tool Handlers
//!
//! The nine tools exposed over `tools/list`/`tools/call`: `capture_screen`,
//! `create_stream`, `stop_stream`, `list_streams`, `get_stream_info`,
//! `list_windows`, `capture_window`, `get_system_status`, and
//! `get_performance_metrics`. Each handler returns the structured result
//! value directly; the dispatcher wraps it in the
//! `content: [{type: "text", ...}]` envelope `tools/call` always returns.

use crate::capture::{CaptureSource, Region};
use crate::core::Mime;
use crate::error::{CaptureError, CaptureResult};
use crate::protocol::ServerContext;
use crate::session::manager::CreateStreamParams;
use serde_json::{json, Value};
use uuid::Uuid;

/// Static tool-name -> (description, input schema) table, served verbatim
/// by `tools/list`.
pub fn tool_list() -> Vec<Value> {
    vec![
        json!({
            "name": "capture_screen",
            "description": "Capture the current screen (or a sub-region) and return an opaque resource URI for the encoded image.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "display_id": {"type": "integer", "description": "Display id, 0 for primary", "default": 0},
                    "format": {"type": "string", "enum": ["png", "jpeg"], "default": "png"},
                    "quality": {"type": "integer", "minimum": 1, "maximum": 100, "default": 85},
                    "region": {"type": "object", "description": "Optional crop: {x,y,w,h}"}
                }
            }
        }),
        json!({
            "name": "create_stream",
            "description": "Start a new continuous capture stream and return its id.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "display_id": {"type": "integer", "default": 0},
                    "fps": {"type": "integer", "default": 10},
                    "quality": {"type": "integer", "default": 80},
                    "format": {"type": "string", "enum": ["png", "jpeg"], "default": "jpeg"},
                    "adaptive_quality": {"type": "boolean", "default": false},
                    "frame_skip": {"type": "boolean", "default": true},
                    "region": {"type": "object"}
                }
            }
        }),
        json!({
            "name": "stop_stream",
            "description": "Stop a running stream by id.",
            "inputSchema": {
                "type": "object",
                "properties": {"stream_id": {"type": "string"}},
                "required": ["stream_id"]
            }
        }),
        json!({
            "name": "list_streams",
            "description": "List all streams and their current state.",
            "inputSchema": {"type": "object", "properties": {}}
        }),
        json!({
            "name": "get_stream_info",
            "description": "Get detailed info and metrics for one stream.",
            "inputSchema": {
                "type": "object",
                "properties": {"stream_id": {"type": "string"}},
                "required": ["stream_id"]
            }
        }),
        json!({
            "name": "list_windows",
            "description": "Enumerate open windows available for window capture.",
            "inputSchema": {"type": "object", "properties": {}}
        }),
        json!({
            "name": "capture_window",
            "description": "Capture a specific window by handle and return an opaque resource URI.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "window_handle": {"type": "integer"},
                    "format": {"type": "string", "enum": ["png", "jpeg"], "default": "png"},
                    "quality": {"type": "integer", "default": 85}
                },
                "required": ["window_handle"]
            }
        }),
        json!({
            "name": "get_system_status",
            "description": "Report the active capture backend, stream count, and cache occupancy.",
            "inputSchema": {"type": "object", "properties": {}}
        }),
        json!({
            "name": "get_performance_metrics",
            "description": "Report frame timing percentiles and counters, optionally scoped to one stream.",
            "inputSchema": {
                "type": "object",
                "properties": {"stream_id": {"type": "string"}}
            }
        }),
    ]
}

pub async fn call(ctx: &ServerContext, name: &str, arguments: &Value) -> CaptureResult<Value> {
    match name {
        "capture_screen" => capture_screen(ctx, arguments).await,
        "create_stream" => create_stream(ctx, arguments).await,
        "stop_stream" => stop_stream(ctx, arguments).await,
        "list_streams" => Ok(list_streams(ctx)),
        "get_stream_info" => get_stream_info(ctx, arguments),
        "list_windows" => list_windows(ctx).await,
        "capture_window" => capture_window(ctx, arguments).await,
        "get_system_status" => Ok(get_system_status(ctx)),
        "get_performance_metrics" => get_performance_metrics(ctx, arguments),
        other => Err(CaptureError::method_not_found(format!("tools/call:{other}"))),
    }
}

fn parse_region(arguments: &Value) -> Option<Region> {
    let r = arguments.get("region")?;
    Some(Region {
        x: r.get("x")?.as_i64()? as i32,
        y: r.get("y")?.as_i64()? as i32,
        w: r.get("w")?.as_u64()? as u32,
        h: r.get("h")?.as_u64()? as u32,
    })
}

fn parse_format(arguments: &Value, default: Mime) -> Mime {
    match arguments.get("format").and_then(Value::as_str) {
        Some("jpeg") | Some("jpg") => Mime::Jpeg,
        Some("png") => Mime::Png,
        _ => default,
    }
}

/// `quality` outside `[1,100]` is `InvalidArgument` per spec boundary
/// behavior, not a silent clamp.
fn validate_quality(quality: u32) -> CaptureResult<u32> {
    if (1..=100).contains(&quality) {
        Ok(quality)
    } else {
        Err(CaptureError::validation(
            "quality",
            "must be in [1,100]",
            quality.to_string(),
        ))
    }
}

/// `fps=0` or `fps>120` is `InvalidArgument`.
fn validate_fps(fps: u32) -> CaptureResult<u32> {
    if (1..=120).contains(&fps) {
        Ok(fps)
    } else {
        Err(CaptureError::validation(
            "fps",
            "must be in [1,120]",
            fps.to_string(),
        ))
    }
}

/// A `display` id that isn't currently enumerated by the active backend is
/// `InvalidArgument` rather than being captured as an empty/garbage frame.
async fn validate_display(ctx: &ServerContext, display: u32) -> CaptureResult<u32> {
    let backend = ctx.registry.active();
    let displays = backend.enumerate_displays().await?;
    if displays.iter().any(|d| d.id == display) {
        Ok(display)
    } else {
        Err(CaptureError::validation(
            "display",
            "no display with this id is currently connected",
            display.to_string(),
        ))
    }
}

async fn capture_screen(ctx: &ServerContext, arguments: &Value) -> CaptureResult<Value> {
    let display = arguments.get("display_id").and_then(Value::as_u64).unwrap_or(0) as u32;
    let display = validate_display(ctx, display).await?;
    let format = parse_format(arguments, Mime::Png);
    let quality = validate_quality(
        arguments
            .get("quality")
            .and_then(Value::as_u64)
            .unwrap_or(85) as u32,
    )?;
    let region = parse_region(arguments);

    let backend = ctx.registry.active();
    let raw = backend
        .capture(&CaptureSource::Display(display), region)
        .await?;
    let bytes = ctx.encoder.encode(&raw, format, quality).await?;
    let uri = crate::core::ResourceCache::derive_uri(
        raw.monotonic_capture_ns,
        backend.name(),
        raw.width,
        raw.height,
    );
    let uri = ctx.cache.insert(
        uri,
        crate::core::EncodedFrame {
            bytes,
            mime: format,
            metadata: crate::core::FrameMetadata {
                width: raw.width,
                height: raw.height,
                quality,
                captured_at_unix_ms: chrono::Utc::now().timestamp_millis() as u64,
                source: backend.name().to_string(),
            },
        },
    );
    let entry = ctx.cache.get(&uri)?;
    Ok(json!({
        "success": true,
        "resource_uri": uri,
        "mime": entry.mime.as_str(),
        "metadata": {
            "width": entry.metadata.width,
            "height": entry.metadata.height,
            "quality": entry.metadata.quality,
            "sizeBytes": entry.bytes.len(),
            "captured_at_unix_ms": entry.metadata.captured_at_unix_ms,
        },
    }))
}

async fn capture_window(ctx: &ServerContext, arguments: &Value) -> CaptureResult<Value> {
    let handle = arguments
        .get("window_handle")
        .and_then(Value::as_u64)
        .ok_or_else(|| CaptureError::validation("window_handle", "required integer", "missing"))?;
    let format = parse_format(arguments, Mime::Png);
    let quality = validate_quality(
        arguments
            .get("quality")
            .and_then(Value::as_u64)
            .unwrap_or(85) as u32,
    )?;

    let backend = ctx.registry.active();
    let raw = backend.capture(&CaptureSource::Window(handle), None).await?;
    let bytes = ctx.encoder.encode(&raw, format, quality).await?;
    let uri = crate::core::ResourceCache::derive_uri(
        raw.monotonic_capture_ns,
        backend.name(),
        raw.width,
        raw.height,
    );
    let uri = ctx.cache.insert(
        uri,
        crate::core::EncodedFrame {
            bytes,
            mime: format,
            metadata: crate::core::FrameMetadata {
                width: raw.width,
                height: raw.height,
                quality,
                captured_at_unix_ms: chrono::Utc::now().timestamp_millis() as u64,
                source: backend.name().to_string(),
            },
        },
    );
    let entry = ctx.cache.get(&uri)?;
    Ok(json!({
        "success": true,
        "resource_uri": uri,
        "mime": entry.mime.as_str(),
        "metadata": {
            "width": entry.metadata.width,
            "height": entry.metadata.height,
            "quality": entry.metadata.quality,
            "sizeBytes": entry.bytes.len(),
            "captured_at_unix_ms": entry.metadata.captured_at_unix_ms,
        },
    }))
}

async fn create_stream(ctx: &ServerContext, arguments: &Value) -> CaptureResult<Value> {
    let display = arguments.get("display_id").and_then(Value::as_u64).unwrap_or(0) as u32;
    let display = validate_display(ctx, display).await?;
    let fps = validate_fps(
        arguments
            .get("fps")
            .and_then(Value::as_u64)
            .unwrap_or(ctx.config.default_stream_fps as u64) as u32,
    )?;
    let quality = validate_quality(
        arguments
            .get("quality")
            .and_then(Value::as_u64)
            .unwrap_or(ctx.config.default_stream_quality as u64) as u32,
    )?;
    let params = CreateStreamParams {
        source: CaptureSource::Display(display),
        region: parse_region(arguments),
        format: parse_format(arguments, Mime::Jpeg),
        fps,
        quality,
        adaptive_quality: arguments
            .get("adaptive_quality")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        frame_skip: arguments
            .get("frame_skip")
            .and_then(Value::as_bool)
            .unwrap_or(true),
    };
    let session = ctx.manager.create(params)?;
    Ok(stream_info_json(&session.get_info()))
}

async fn stop_stream(ctx: &ServerContext, arguments: &Value) -> CaptureResult<Value> {
    let id = parse_stream_id(arguments)?;
    ctx.manager.stop(id).await?;
    Ok(json!({"stream_id": id.to_string(), "stopped": true}))
}

fn list_streams(ctx: &ServerContext) -> Value {
    json!({
        "streams": ctx.manager.list().iter().map(stream_info_json).collect::<Vec<_>>()
    })
}

fn get_stream_info(ctx: &ServerContext, arguments: &Value) -> CaptureResult<Value> {
    let id = parse_stream_id(arguments)?;
    Ok(stream_info_json(&ctx.manager.info(id)?))
}

async fn list_windows(ctx: &ServerContext) -> CaptureResult<Value> {
    let windows = ctx.registry.active().enumerate_windows().await?;
    Ok(json!({
        "windows": windows.iter().map(|w| json!({
            "handle": w.handle,
            "title": w.title,
            "pid": w.pid,
            "x": w.x, "y": w.y, "w": w.w, "h": w.h,
            "visible": w.visible,
            "minimized": w.minimized,
        })).collect::<Vec<_>>()
    }))
}

fn get_system_status(ctx: &ServerContext) -> Value {
    json!({
        "backend": ctx.registry.active_backend_name(),
        "active_streams": ctx.manager.list().iter().filter(|s| s.state != crate::session::SessionState::Stopped).count(),
        "cache_entries": ctx.cache.len(),
        "cache_capacity": ctx.cache.capacity(),
        "server_name": ctx.config.server_name,
        "server_version": ctx.config.server_version,
    })
}

fn get_performance_metrics(ctx: &ServerContext, arguments: &Value) -> CaptureResult<Value> {
    if let Some(id) = arguments.get("stream_id").and_then(Value::as_str) {
        let id = Uuid::parse_str(id)
            .map_err(|e| CaptureError::validation("stream_id", "uuid", e.to_string()))?;
        let info = ctx.manager.info(id)?;
        return Ok(json!({"stream_id": id.to_string(), "metrics": info.metrics}));
    }
    let streams = ctx.manager.list();
    let (mut processed, mut dropped, mut skipped) = (0u64, 0u64, 0u64);
    let mut fps_sum = 0.0;
    for s in &streams {
        processed += s.metrics.processed;
        dropped += s.metrics.dropped;
        skipped += s.metrics.skipped;
        fps_sum += s.metrics.fps;
    }
    let avg_fps = if streams.is_empty() {
        0.0
    } else {
        fps_sum / streams.len() as f64
    };
    Ok(json!({
        "stream_count": streams.len(),
        "processed": processed,
        "dropped": dropped,
        "skipped": skipped,
        "average_fps": avg_fps,
    }))
}

fn parse_stream_id(arguments: &Value) -> CaptureResult<Uuid> {
    let raw = arguments
        .get("stream_id")
        .and_then(Value::as_str)
        .ok_or_else(|| CaptureError::validation("stream_id", "required string", "missing"))?;
    Uuid::parse_str(raw).map_err(|e| CaptureError::validation("stream_id", "uuid", e.to_string()))
}

fn stream_info_json(info: &crate::session::StreamInfo) -> Value {
    serde_json::to_value(info).unwrap_or_else(|_| json!({"id": info.id.to_string()}))
}
