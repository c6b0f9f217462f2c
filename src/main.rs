use std::convert::Infallible;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use hotel_reservation::api::{
    BookingPayload, BookingQuery, ErrorBody, RejectPayload, ReservePayload, RoomQuery,
};
use hotel_reservation::{
    load_room_forms, ApiError, BookingService, ErrorKind, HotelApi, HotelConfig, HotelService,
    InMemoryInventory, NewRoomType,
};

type Api = Arc<HotelService<InMemoryInventory>>;

const MAX_BODY_BYTES: u64 = 64 * 1024;

fn with_api(api: Api) -> impl Filter<Extract = (Api,), Error = Infallible> + Clone {
    warp::any().map(move || api.clone())
}

fn into_reply<T: Serialize>(result: Result<T, ApiError>, ok: StatusCode) -> warp::reply::Response {
    match result {
        Ok(body) => warp::reply::with_status(warp::reply::json(&body), ok).into_response(),
        Err(err) => {
            let status = StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            warp::reply::with_status(warp::reply::json(&err.body()), status).into_response()
        }
    }
}

// Malformed bodies and unknown routes still get the JSON error shape
async fn handle_rejection(rejection: Rejection) -> Result<warp::reply::Response, Infallible> {
    let (status, kind, message) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, ErrorKind::NotFound, "Not found".to_string())
    } else if let Some(err) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
        (
            StatusCode::BAD_REQUEST,
            ErrorKind::InvalidInput,
            format!("Invalid request body: {}", err),
        )
    } else if let Some(err) = rejection.find::<warp::reject::InvalidQuery>() {
        (
            StatusCode::BAD_REQUEST,
            ErrorKind::InvalidInput,
            format!("Invalid query: {}", err),
        )
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            ErrorKind::InvalidInput,
            "Method not allowed".to_string(),
        )
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::InvalidInput,
            "Request body too large".to_string(),
        )
    } else {
        warn!(?rejection, "unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Internal,
            "Internal error".to_string(),
        )
    };

    let body = ErrorBody {
        success: false,
        message,
        kind,
    };
    Ok(warp::reply::with_status(warp::reply::json(&body), status).into_response())
}

fn routes(api: Api) -> impl Filter<Extract = (warp::reply::Response,), Error = Rejection> + Clone {
    let list_rooms = warp::path!("api" / "rooms")
        .and(warp::get())
        .and(warp::query::<RoomQuery>())
        .and(with_api(api.clone()))
        .then(|query: RoomQuery, api: Api| async move {
            into_reply(api.list_rooms(query).await, StatusCode::OK)
        });

    let add_room = warp::path!("api" / "rooms" / "addRooms")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_api(api.clone()))
        .then(|form: NewRoomType, api: Api| async move {
            into_reply(api.add_room(form).await, StatusCode::CREATED)
        });

    let validate = warp::path!("api" / "booking" / "validate")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_api(api.clone()))
        .then(|payload: BookingPayload, api: Api| async move {
            into_reply(api.validate_booking(payload).await, StatusCode::OK)
        });

    let reserve = warp::path!("api" / "booking" / "reserve")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_api(api.clone()))
        .then(|payload: ReservePayload, api: Api| async move {
            into_reply(api.reserve(payload).await, StatusCode::CREATED)
        });

    let confirm = warp::path!("api" / "booking" / String / "confirm")
        .and(warp::post())
        .and(with_api(api.clone()))
        .then(|id: String, api: Api| async move {
            into_reply(api.confirm_booking(&id).await, StatusCode::OK)
        });

    let reject = warp::path!("api" / "booking" / String / "reject")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_api(api.clone()))
        .then(|id: String, payload: RejectPayload, api: Api| async move {
            into_reply(api.reject_booking(&id, payload).await, StatusCode::OK)
        });

    let view = warp::path!("api" / "booking" / "view")
        .and(warp::get())
        .and(warp::query::<BookingQuery>())
        .and(with_api(api))
        .then(|query: BookingQuery, api: Api| async move {
            into_reply(api.view_bookings(query).await, StatusCode::OK)
        });

    list_rooms
        .or(add_room)
        .unify()
        .or(validate)
        .unify()
        .or(reserve)
        .unify()
        .or(confirm)
        .unify()
        .or(reject)
        .unify()
        .or(view)
        .unify()
}

fn app(api: Api) -> impl Filter<Extract = (warp::reply::Response,), Error = Infallible> + Clone {
    routes(api).recover(handle_rejection).unify()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = HotelConfig::from_env().context("invalid configuration")?;
    let bind_addr = config.bind_addr;
    let rooms_file = config.rooms_file.clone();

    let bookings = BookingService::new(Arc::new(InMemoryInventory::new()), config);

    if let Some(path) = rooms_file {
        let opening = Utc::now().date_naive();
        let forms = load_room_forms(&path)?;
        for form in &forms {
            let room = bookings
                .add_room_type(form, opening)
                .with_context(|| format!("cannot add room {}", form.room_type))?;
            info!(room_type = %room.id, "room type loaded");
        }
        info!(count = forms.len(), path = %path.display(), "rooms loaded");
    }

    let api: Api = Arc::new(HotelService::new(Arc::new(bookings)));

    let app = app(api).with(warp::trace::request());

    let (addr, server) = warp::serve(app).bind_with_graceful_shutdown(bind_addr, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(%err, "failed to listen for shutdown signal");
        }
    });
    info!(%addr, "hotel server listening");
    server.await;
    info!("hotel server stopped");

    Ok(())
}
