//! Route table.
//!
//! Everything is nested under `/api/`. Login is the only unauthenticated
//! route; the rest go through the bearer-token middleware which injects
//! `AuthContext`. CORS is open (the dashboard is served from a different
//! origin) and request bodies are capped at 10 MB.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub fn api_router(ctx: ApiContext) -> Router {
    // Layers apply bottom-up: Extension (outermost) → auth → trace → handler
    let protected = Router::new()
        .route("/auth/register", post(endpoints::auth::register))
        .route(
            "/profile",
            get(endpoints::auth::get_profile).put(endpoints::auth::update_profile),
        )
        .route(
            "/lab/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route(
            "/lab/patients/:id",
            get(endpoints::patients::get)
                .put(endpoints::patients::update)
                .delete(endpoints::patients::delete),
        )
        .route(
            "/labtech/samples",
            get(endpoints::samples::list).post(endpoints::samples::create),
        )
        .route(
            "/labtech/samples/:id",
            get(endpoints::samples::get)
                .put(endpoints::samples::update)
                .delete(endpoints::samples::delete),
        )
        .route(
            "/labtech/samples/:id/results",
            put(endpoints::samples::put_results),
        )
        .route(
            "/labtech/samples/:id/interpretation",
            put(endpoints::samples::put_interpretation),
        )
        .route("/labtech/samples/:id/report", get(endpoints::samples::report))
        .route(
            "/tests",
            get(endpoints::tests::list).post(endpoints::tests::create),
        )
        .route(
            "/tests/:id",
            get(endpoints::tests::get)
                .put(endpoints::tests::update)
                .delete(endpoints::tests::delete),
        )
        .route(
            "/settings",
            get(endpoints::settings::get).put(endpoints::settings::put_identity),
        )
        .route(
            "/settings/report-template",
            put(endpoints::settings::put_report_template),
        )
        .route(
            "/lab/inventory",
            get(endpoints::inventory::list).post(endpoints::inventory::create),
        )
        .route("/lab/inventory/low-stock", get(endpoints::inventory::low_stock))
        .route("/lab/inventory/value", get(endpoints::inventory::stock_value))
        .route(
            "/lab/inventory/:id",
            put(endpoints::inventory::update).delete(endpoints::inventory::delete),
        )
        .route(
            "/lab/suppliers",
            get(endpoints::suppliers::list).post(endpoints::suppliers::create),
        )
        .route(
            "/lab/suppliers/:id",
            put(endpoints::suppliers::update).delete(endpoints::suppliers::delete),
        )
        .route(
            "/lab/suppliers/:id/payments",
            post(endpoints::suppliers::record_payment),
        )
        .route(
            "/lab/staff",
            get(endpoints::staff::list).post(endpoints::staff::create),
        )
        .route(
            "/lab/staff/:id",
            put(endpoints::staff::update).delete(endpoints::staff::delete),
        )
        .route("/lab/staff/:id/salaries", get(endpoints::staff::list_salaries))
        .route("/lab/staff/salaries", post(endpoints::staff::pay_salary))
        .route(
            "/lab/attendance",
            get(endpoints::staff::list_attendance).post(endpoints::staff::mark_attendance),
        )
        .route(
            "/finance",
            get(endpoints::finance::list).post(endpoints::finance::create),
        )
        .route("/finance/summary", get(endpoints::finance::summary))
        .route("/finance/:id", delete(endpoints::finance::delete))
        .route("/lab/dashboard", get(endpoints::dashboard::stats))
        .route(
            "/notifications",
            get(endpoints::notifications::list).post(endpoints::notifications::create),
        )
        .route(
            "/notifications/:id/read",
            put(endpoints::notifications::mark_read),
        )
        .route(
            "/appointments",
            get(endpoints::appointments::list).post(endpoints::appointments::create),
        )
        .route(
            "/appointments/:id",
            put(endpoints::appointments::update).delete(endpoints::appointments::delete),
        )
        .route("/admin/users", get(endpoints::admin::list_users))
        .route("/admin/users/:id/access", put(endpoints::admin::update_access))
        .route("/admin/users/:id", delete(endpoints::admin::delete_user))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::trace::log_request))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx.clone()));

    let unprotected = Router::new()
        .route("/auth/login", post(endpoints::auth::login))
        .with_state(ctx.clone())
        .layer(axum::Extension(ctx));

    Router::new()
        .nest("/api", protected)
        .nest("/api", unprotected)
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::auth::{hash_password, issue_token};
    use crate::config::AppConfig;
    use crate::db::repository::{patient, sample, test_catalog, user};
    use crate::db::open_database;
    use crate::models::{
        ModulePermission, OrderedTest, Patient, Sample, SampleResult, SampleStatus, User,
    };

    const SECRET: &str = "router-test-secret";

    struct TestApp {
        ctx: ApiContext,
        _db: tempfile::NamedTempFile,
    }

    impl TestApp {
        fn new() -> Self {
            let db = tempfile::NamedTempFile::new().unwrap();
            let config = AppConfig {
                db_path: db.path().to_path_buf(),
                jwt_secret: SECRET.to_string(),
                port: 0,
            };
            let ctx = ApiContext::new(config);
            // Run migrations up front
            ctx.open_db().unwrap();
            Self { ctx, _db: db }
        }

        fn router(&self) -> Router {
            api_router(self.ctx.clone())
        }

        fn seed_user(&self, username: &str, role: &str, permissions: Vec<ModulePermission>) -> User {
            let conn = self.ctx.open_db().unwrap();
            let seeded = User {
                id: Uuid::new_v4(),
                username: username.to_string(),
                password_hash: hash_password("password1").unwrap(),
                full_name: username.to_string(),
                role: role.to_string(),
                permissions,
                created_at: Utc::now(),
            };
            user::insert_user(&conn, &seeded).unwrap();
            seeded
        }

        fn token_for(&self, seeded: &User) -> String {
            issue_token(
                SECRET,
                &seeded.id.to_string(),
                &seeded.username,
                &seeded.role,
                &seeded.permissions,
            )
            .unwrap()
        }
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header("Authorization", format!("Bearer {t}"));
        }
        match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_json(response: axum::http::Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: axum::http::Response<Body>) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn protected_route_requires_token() {
        let app = TestApp::new();
        let response = app
            .router()
            .oneshot(request("GET", "/api/lab/patients", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Authentication required");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::new();
        let response = app
            .router()
            .oneshot(request("GET", "/api/lab/patients", Some("nonsense"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_round_trip() {
        let app = TestApp::new();
        app.seed_user("asha", "admin", vec![]);

        let response = app
            .router()
            .oneshot(request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"username": "asha", "password": "password1"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let token = json["token"].as_str().unwrap().to_string();
        assert!(!token.is_empty());
        assert_eq!(json["user"]["username"], "asha");
        assert!(json["user"].get("password_hash").is_none());

        // The issued token works on a protected route
        let response = app
            .router()
            .oneshot(request("GET", "/api/lab/patients", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn wrong_password_is_401() {
        let app = TestApp::new();
        app.seed_user("asha", "admin", vec![]);

        let response = app
            .router()
            .oneshot(request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"username": "asha", "password": "wrong"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_routes_reject_non_admin() {
        let app = TestApp::new();
        let tech = app.seed_user("tech", "technician", vec![]);
        let token = app.token_for(&tech);

        let response = app
            .router()
            .oneshot(request("GET", "/api/admin/users", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn supervisor_spelling_counts_as_admin() {
        let app = TestApp::new();
        let boss = app.seed_user("boss", "Lab-Supervisor", vec![]);
        let token = app.token_for(&boss);

        let response = app
            .router()
            .oneshot(request("GET", "/api/admin/users", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_grant_allows_view_but_not_edit() {
        let app = TestApp::new();
        let tech = app.seed_user("tech", "technician", vec![]);
        let token = app.token_for(&tech);

        let response = app
            .router()
            .oneshot(request("GET", "/api/lab/patients", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .router()
            .oneshot(request(
                "POST",
                "/api/lab/patients",
                Some(&token),
                Some(json!({"name": "Asha Verma"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn explicit_grant_allows_edit() {
        let app = TestApp::new();
        let tech = app.seed_user(
            "tech",
            "technician",
            vec![ModulePermission {
                module: "patients".into(),
                view: true,
                edit: true,
                delete: false,
            }],
        );
        let token = app.token_for(&tech);

        let response = app
            .router()
            .oneshot(request(
                "POST",
                "/api/lab/patients",
                Some(&token),
                Some(json!({"name": "Asha Verma"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Edit grant does not imply delete
        let created = body_json(response).await;
        let id = created["id"].as_str().unwrap().to_string();
        let response = app
            .router()
            .oneshot(request(
                "DELETE",
                &format!("/api/lab/patients/{id}"),
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn grant_module_spelling_is_case_insensitive() {
        let app = TestApp::new();
        let tech = app.seed_user(
            "tech",
            "technician",
            vec![ModulePermission {
                module: "Patients".into(),
                view: true,
                edit: true,
                delete: false,
            }],
        );
        let token = app.token_for(&tech);

        let response = app
            .router()
            .oneshot(request(
                "POST",
                "/api/lab/patients",
                Some(&token),
                Some(json!({"name": "Meera Nair"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn validation_envelope_carries_all_errors() {
        let app = TestApp::new();
        let admin = app.seed_user("root", "admin", vec![]);
        let token = app.token_for(&admin);

        let response = app
            .router()
            .oneshot(request(
                "POST",
                "/api/lab/patients",
                Some(&token),
                Some(json!({"name": "", "email": "not-an-email"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "name is required");
        assert_eq!(json["errors"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_username_is_409() {
        let app = TestApp::new();
        let admin = app.seed_user("root", "admin", vec![]);
        let token = app.token_for(&admin);

        let payload = json!({
            "username": "root",
            "password": "password1",
            "full_name": "Root Again",
            "role": "technician"
        });
        let response = app
            .router()
            .oneshot(request("POST", "/api/auth/register", Some(&token), Some(payload)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn report_template_round_trips_over_http() {
        let app = TestApp::new();
        let admin = app.seed_user("root", "admin", vec![]);
        let token = app.token_for(&admin);

        let template = json!({
            "components": [
                {"id": "c1", "type": "header-text", "data": {"title": "Lab Report"}},
                {"id": "c2", "type": "made-up-kind", "data": {"whatever": true}}
            ],
            "styles": {"fontSize": 13},
            "unknown_field": [1, 2, 3]
        });

        let response = app
            .router()
            .oneshot(request(
                "PUT",
                "/api/settings/report-template",
                Some(&token),
                Some(json!({"report_template": template})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let saved = body_json(response).await;
        assert_eq!(saved["revision"], 1);

        let response = app
            .router()
            .oneshot(request("GET", "/api/settings", Some(&token), None))
            .await
            .unwrap();
        let settings = body_json(response).await;
        assert_eq!(settings["report_template"], template);
    }

    #[tokio::test]
    async fn stale_template_revision_is_409() {
        let app = TestApp::new();
        let admin = app.seed_user("root", "admin", vec![]);
        let token = app.token_for(&admin);

        let save = |template: Value, expected: Option<i64>| {
            let mut body = json!({ "report_template": template });
            if let Some(rev) = expected {
                body["expected_revision"] = json!(rev);
            }
            request("PUT", "/api/settings/report-template", Some(&token), Some(body))
        };

        let response = app
            .router()
            .oneshot(save(json!({"components": []}), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .router()
            .oneshot(save(json!({"components": [1]}), Some(0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn template_must_be_an_object() {
        let app = TestApp::new();
        let admin = app.seed_user("root", "admin", vec![]);
        let token = app.token_for(&admin);

        let response = app
            .router()
            .oneshot(request(
                "PUT",
                "/api/settings/report-template",
                Some(&token),
                Some(json!({"report_template": "just a string"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    fn seed_reportable_sample(app: &TestApp) -> Sample {
        let conn = app.ctx.open_db().unwrap();

        let seeded_patient = Patient {
            id: Uuid::new_v4(),
            name: "Asha Verma".into(),
            age: Some(34),
            gender: Some("F".into()),
            phone: None,
            email: None,
            address: None,
            created_at: Utc::now(),
        };
        patient::insert_patient(&conn, &seeded_patient).unwrap();

        let seeded_sample = Sample {
            id: Uuid::new_v4(),
            patient_id: seeded_patient.id,
            sample_no: "S-1001".into(),
            tests: vec![
                OrderedTest {
                    test_id: "cbc".into(),
                    test_name: "CBC".into(),
                },
                OrderedTest {
                    test_id: "lipid".into(),
                    test_name: "Lipid Profile".into(),
                },
            ],
            status: SampleStatus::Completed,
            priority: None,
            referred_by: None,
            collected_at: Utc::now(),
        };
        sample::insert_sample(&conn, &seeded_sample).unwrap();

        let results = vec![
            SampleResult {
                id: Uuid::new_v4(),
                sample_id: seeded_sample.id,
                parameter_id: "cbc::hb".into(),
                value: "12.5".into(),
                unit: Some("g/dL".into()),
                flag: None,
                entered_by: None,
                entered_at: Utc::now(),
            },
            SampleResult {
                id: Uuid::new_v4(),
                sample_id: seeded_sample.id,
                parameter_id: "lipid::ldl".into(),
                value: "110".into(),
                unit: None,
                flag: None,
                entered_by: None,
                entered_at: Utc::now(),
            },
        ];
        sample::replace_results(&conn, &seeded_sample.id, &results).unwrap();

        seeded_sample
    }

    #[tokio::test]
    async fn report_endpoint_returns_html_with_one_page_per_test() {
        let app = TestApp::new();
        let admin = app.seed_user("root", "admin", vec![]);
        let token = app.token_for(&admin);
        let seeded = seed_reportable_sample(&app);

        let response = app
            .router()
            .oneshot(request(
                "GET",
                &format!("/api/labtech/samples/{}/report", seeded.id),
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/html"));

        let html = body_text(response).await;
        assert_eq!(html.matches("class=\"report-page\"").count(), 2);
        assert!(html.contains("CBC"));
        assert!(html.contains("Lipid Profile"));
        assert!(html.contains("Asha Verma"));
    }

    #[tokio::test]
    async fn report_degrades_to_slip_when_patient_is_gone() {
        let app = TestApp::new();
        let admin = app.seed_user("root", "admin", vec![]);
        let token = app.token_for(&admin);
        let seeded = seed_reportable_sample(&app);

        {
            let conn = app.ctx.open_db().unwrap();
            patient::delete_patient(&conn, &seeded.patient_id.to_string()).unwrap();
        }

        let response = app
            .router()
            .oneshot(request(
                "GET",
                &format!("/api/labtech/samples/{}/report", seeded.id),
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains("class=\"slip\""));
        assert!(html.contains("S-1001"));
        assert!(!html.contains("class=\"report-page\""));
    }

    #[tokio::test]
    async fn result_entry_replaces_the_sheet_and_advances_status() {
        let app = TestApp::new();
        let admin = app.seed_user("root", "admin", vec![]);
        let token = app.token_for(&admin);

        let conn = app.ctx.open_db().unwrap();
        let seeded_patient = Patient {
            id: Uuid::new_v4(),
            name: "Ravi Iyer".into(),
            age: None,
            gender: None,
            phone: None,
            email: None,
            address: None,
            created_at: Utc::now(),
        };
        patient::insert_patient(&conn, &seeded_patient).unwrap();
        let seeded_sample = Sample {
            id: Uuid::new_v4(),
            patient_id: seeded_patient.id,
            sample_no: "S-2001".into(),
            tests: vec![OrderedTest {
                test_id: "glu".into(),
                test_name: "Glucose".into(),
            }],
            status: SampleStatus::Pending,
            priority: None,
            referred_by: None,
            collected_at: Utc::now(),
        };
        sample::insert_sample(&conn, &seeded_sample).unwrap();
        drop(conn);

        let response = app
            .router()
            .oneshot(request(
                "PUT",
                &format!("/api/labtech/samples/{}/results", seeded_sample.id),
                Some(&token),
                Some(json!({"results": [
                    {"parameter_id": "glu::fasting", "value": "95", "unit": "mg/dL"}
                ]})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let conn = app.ctx.open_db().unwrap();
        let stored = sample::get_sample(&conn, &seeded_sample.id.to_string()).unwrap();
        assert_eq!(stored.status, SampleStatus::Processing);
        let results = sample::get_results(&conn, &seeded_sample.id.to_string()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entered_by.as_deref(), Some("root"));
    }

    #[tokio::test]
    async fn duplicate_test_name_is_409() {
        let app = TestApp::new();
        let admin = app.seed_user("root", "admin", vec![]);
        let token = app.token_for(&admin);

        {
            let conn = app.ctx.open_db().unwrap();
            test_catalog::insert_test(
                &conn,
                &crate::models::LabTest {
                    id: Uuid::new_v4(),
                    name: "CBC".into(),
                    code: None,
                    category: None,
                    price: 300.0,
                    sample_type: None,
                    parameters: vec![],
                    turnaround_hours: None,
                },
            )
            .unwrap();
        }

        let response = app
            .router()
            .oneshot(request(
                "POST",
                "/api/tests",
                Some(&token),
                Some(json!({"name": "CBC", "price": 350.0})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = TestApp::new();
        let response = app
            .router()
            .oneshot(request("GET", "/api/nope", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn dashboard_reports_counts() {
        let app = TestApp::new();
        let admin = app.seed_user("root", "admin", vec![]);
        let token = app.token_for(&admin);
        seed_reportable_sample(&app);

        let response = app
            .router()
            .oneshot(request("GET", "/api/lab/dashboard", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["total_patients"], 1);
        assert_eq!(json["samples_completed"], 1);
        assert_eq!(json["samples_per_day"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn open_database_runs_migrations_for_fresh_file() {
        let db = tempfile::NamedTempFile::new().unwrap();
        let conn = open_database(db.path()).unwrap();
        let tables = crate::db::count_tables(&conn).unwrap();
        assert!(tables >= 16);
    }
}
