mod admin;
mod api;
mod pages;
mod views;

use std::sync::Arc;

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

use crate::booking::BookingEngine;
use crate::config;
use crate::models::Settings;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) engine: BookingEngine,
    pub(crate) settings: Arc<Settings>,
}

pub(crate) fn router(state: AppState) -> Router {
    let static_dir = ServeDir::new(&state.settings.service.static_dir);
    Router::new()
        .route("/", get(pages::landing_handler))
        .route("/reservas/{negocio}", get(pages::business_handler))
        .route("/reservas/{negocio}/admin", get(admin::admin_handler))
        .route("/reservas/{negocio}/admin/config", post(admin::save_config_handler))
        .route(
            "/disponibilidad/{negocio}/{calendario}",
            get(api::availability_handler),
        )
        .route("/reservar", post(api::book_handler))
        .route("/hora-servidor", get(api::server_time_handler))
        .nest_service("/static", static_dir)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(settings: Settings, addr: &str) -> Result<()> {
    let engine = config::open_engine(&settings)?;
    let state = AppState {
        engine,
        settings: Arc::new(settings),
    };

    let app = router(state);
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::models::{BusinessConfig, CalendarConfig};
    use crate::store::JsonFileStore;

    fn test_state(dir: &tempfile::TempDir) -> AppState {
        let tz = config::parse_timezone("America/Montevideo").unwrap();
        let engine = BookingEngine::new(Arc::new(JsonFileStore::new(dir.path())), tz);
        let mut cfg = BusinessConfig::default();
        cfg.calendarios.insert(
            "1".into(),
            CalendarConfig {
                nombre: "Sillón 1".into(),
                horario_inicio: 9,
                horario_fin: 10,
                duracion_turno_min: 30,
                dias_habiles: BTreeSet::from([0]),
                ..Default::default()
            },
        );
        engine.save_config("barberia", &cfg).unwrap();
        AppState {
            engine,
            settings: Arc::new(Settings::default()),
        }
    }

    async fn body_string(resp: axum::response::Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn book_request(hora: &str) -> Request<Body> {
        let body = serde_json::json!({
            "idNegocio": "barberia",
            "idCalendario": 1,
            "fecha": "2024-06-03",
            "hora": hora,
            "usuario": "ana",
        });
        Request::post("/reservar")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_book_then_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(&dir));

        let resp = app.clone().oneshot(book_request("09:00")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp).await.contains("Reserva creada exitosamente!"));

        let resp = app.clone().oneshot(book_request("09:00")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_string(resp).await;
        assert!(body.contains("detail") && body.contains("ya está reservado"), "{body}");

        let resp = app.oneshot(book_request("11:00")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_availability_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(&dir));

        let resp = app
            .clone()
            .oneshot(Request::get("/disponibilidad/barberia/1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(json["bloques_por_dia_semana"]["0"][1]["hora"], "09:30");
        assert!(json["dias"].is_object());

        let resp = app
            .oneshot(Request::get("/disponibilidad/barberia/7").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(body_string(resp).await.contains("Calendario no encontrado"));
    }

    #[tokio::test]
    async fn test_server_time() {
        let dir = tempfile::tempdir().unwrap();
        let resp = router(test_state(&dir))
            .oneshot(Request::get("/hora-servidor").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(json["hora"].as_str().unwrap().len(), "2024-06-03 10:00:00".len());
    }

    #[tokio::test]
    async fn test_admin_save_and_pages() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let app = router(state.clone());

        let form = "max_calendarios=2&nombre_calendario_1=Sill%C3%B3n+A&horario_inicio_1=8\
                    &horario_fin_1=12&duracion_turno_min_1=20&dias_habiles_1=0&dias_habiles_1=2\
                    &fecha_maxima_reserva_1=&nombre_calendario_2=Sill%C3%B3n+B";
        let resp = app
            .clone()
            .oneshot(
                Request::post("/reservas/barberia/admin/config")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(form))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp).await.contains("Configuración guardada exitosamente!"));

        let cfg = state.engine.load_config("barberia").unwrap();
        assert_eq!(cfg.max_calendarios, 2);
        let a = cfg.calendar(1).unwrap();
        assert_eq!(a.nombre, "Sillón A");
        assert_eq!((a.horario_inicio, a.horario_fin, a.duracion_turno_min), (8, 12, 20));
        assert_eq!(a.dias_habiles, BTreeSet::from([0, 2]));
        assert_eq!(a.fecha_maxima_reserva, None);
        let b = cfg.calendar(2).unwrap();
        assert_eq!(b.nombre, "Sillón B");
        assert!(b.dias_habiles.is_empty());

        let resp = app
            .clone()
            .oneshot(Request::get("/reservas/barberia").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp).await.contains("Sillón A"));

        let resp = app
            .oneshot(Request::get("/reservas/barberia/admin").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp).await.contains("Sillón B"));
    }

    #[tokio::test]
    async fn test_admin_rejects_bad_hours() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let resp = router(state.clone())
            .oneshot(
                Request::post("/reservas/barberia/admin/config")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("max_calendarios=1&horario_inicio_1=nueve"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let cfg = state.engine.load_config("barberia").unwrap();
        assert_eq!(cfg.calendar(1).unwrap().nombre, "Sillón 1");
    }

    #[tokio::test]
    async fn test_storage_failure_is_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(&dir));
        std::fs::write(dir.path().join("reservas"), "not a directory").unwrap();

        let resp = app.oneshot(book_request("09:00")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_string(resp).await;
        assert!(body.contains("Error interno del servidor"), "{body}");
    }
}
