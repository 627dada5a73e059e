use std::convert::Infallible;

use log::error;
use serde::Serialize;
use serde_json::json;
use warp::http::{header, StatusCode};
use warp::hyper::Body;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::AppState;

pub fn api_routes(
    state: AppState,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let sessions_list = warp::path!("api" / "sessions")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(list_sessions);

    let session_get = warp::path!("api" / "sessions" / i64)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(get_session);

    let session_delete = warp::path!("api" / "sessions" / i64)
        .and(warp::delete())
        .and(with_state(state.clone()))
        .and_then(delete_session);

    let live_snapshot = warp::path!("api" / "live")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(live_snapshot);

    let live_start = warp::path!("api" / "live" / "start")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and_then(live_start);

    let live_pause = warp::path!("api" / "live" / "pause")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and_then(live_pause);

    let live_resume = warp::path!("api" / "live" / "resume")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and_then(live_resume);

    let live_finish = warp::path!("api" / "live" / "finish")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and_then(live_finish);

    let live_discard = warp::path!("api" / "live" / "discard")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and_then(live_discard);

    let live_frame = warp::path!("api" / "live" / "frame")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(live_frame);

    let status = warp::path!("api" / "status")
        .and(warp::get())
        .and(with_state(state))
        .and_then(service_status);

    sessions_list
        .or(session_get)
        .or(session_delete)
        .or(live_snapshot)
        .or(live_start)
        .or(live_pause)
        .or(live_resume)
        .or(live_finish)
        .or(live_discard)
        .or(live_frame)
        .or(status)
}

fn with_state(
    state: AppState,
) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn ok_json<T: Serialize>(value: &T) -> Response {
    warp::reply::json(value).into_response()
}

fn error_json(status: StatusCode, message: String) -> Response {
    warp::reply::with_status(warp::reply::json(&json!({ "error": message })), status)
        .into_response()
}

async fn list_sessions(state: AppState) -> Result<Response, Infallible> {
    match state.db.list_sessions().await {
        Ok(summaries) => Ok(ok_json(&summaries)),
        Err(err) => {
            error!("failed to list sessions: {err:#}");
            Ok(error_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to list sessions".to_string(),
            ))
        }
    }
}

async fn get_session(session_id: i64, state: AppState) -> Result<Response, Infallible> {
    match state.db.get_session(session_id).await {
        Ok(Some(record)) => Ok(ok_json(&record)),
        Ok(None) => Ok(error_json(
            StatusCode::NOT_FOUND,
            format!("session {session_id} not found"),
        )),
        Err(err) => {
            error!("failed to load session {session_id}: {err:#}");
            Ok(error_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to load session".to_string(),
            ))
        }
    }
}

async fn delete_session(session_id: i64, state: AppState) -> Result<Response, Infallible> {
    match state.db.delete_session(session_id).await {
        Ok(true) => Ok(warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT)
            .into_response()),
        Ok(false) => Ok(error_json(
            StatusCode::NOT_FOUND,
            format!("session {session_id} not found"),
        )),
        Err(err) => {
            error!("failed to delete session {session_id}: {err:#}");
            Ok(error_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to delete session".to_string(),
            ))
        }
    }
}

async fn live_snapshot(state: AppState) -> Result<Response, Infallible> {
    Ok(ok_json(&state.live.snapshot().await))
}

async fn live_start(state: AppState) -> Result<Response, Infallible> {
    match state.live.start().await {
        Ok(snapshot) => Ok(ok_json(&snapshot)),
        Err(err) => Ok(error_json(StatusCode::CONFLICT, format!("{err:#}"))),
    }
}

async fn live_pause(state: AppState) -> Result<Response, Infallible> {
    match state.live.pause().await {
        Ok(snapshot) => Ok(ok_json(&snapshot)),
        Err(err) => Ok(error_json(StatusCode::CONFLICT, format!("{err:#}"))),
    }
}

async fn live_resume(state: AppState) -> Result<Response, Infallible> {
    match state.live.resume().await {
        Ok(snapshot) => Ok(ok_json(&snapshot)),
        Err(err) => Ok(error_json(StatusCode::CONFLICT, format!("{err:#}"))),
    }
}

async fn live_finish(state: AppState) -> Result<Response, Infallible> {
    match state.live.finish().await {
        Ok(record) => Ok(ok_json(&record)),
        Err(err) => Ok(error_json(StatusCode::CONFLICT, format!("{err:#}"))),
    }
}

async fn live_discard(state: AppState) -> Result<Response, Infallible> {
    match state.live.discard().await {
        Ok(()) => Ok(warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT)
            .into_response()),
        Err(err) => Ok(error_json(StatusCode::CONFLICT, format!("{err:#}"))),
    }
}

/// Proxies the camera's newest JPEG for the live feed panel, so the browser
/// never talks to the camera tunnel directly.
async fn live_frame(state: AppState) -> Result<Response, Infallible> {
    match state.camera.latest_frame().await {
        Ok(jpeg) => {
            let response = warp::http::Response::builder()
                .header(header::CONTENT_TYPE, "image/jpeg")
                .header(header::CACHE_CONTROL, "no-store")
                .body(Body::from(jpeg));
            match response {
                Ok(response) => Ok(response),
                Err(err) => {
                    error!("failed to build frame response: {err}");
                    Ok(error_json(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "failed to build frame response".to_string(),
                    ))
                }
            }
        }
        Err(err) => Ok(error_json(
            StatusCode::BAD_GATEWAY,
            format!("camera feed unavailable: {err:#}"),
        )),
    }
}

async fn service_status(state: AppState) -> Result<Response, Infallible> {
    let telemetry = state.telemetry.snapshot().await;
    let live = state.live.snapshot().await;
    Ok(ok_json(&json!({
        "live": { "status": live.status, "shotCount": live.shot_count },
        "telemetry": telemetry,
    })))
}
