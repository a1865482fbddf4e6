mod common;

use actix_web::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use actix_web::http::StatusCode;
use actix_web::{test, web, App, HttpResponse, HttpServer};
use common::{env, env_with_lms, token_in, zip_entry, TestEnv, ADMIN_TOKEN, LMS_URL};
use scormhub::db::{assignments, learners};
use scormhub::packaging::codec::LaunchIdentity;
use scormhub::services;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

const BOUNDARY: &str = "scormhub-test-boundary";
const CLIENT_KEY: &str = "client-key";

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

fn multipart_body(meta: &Value, file_name: &str, file: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"json\"\r\n\r\n{meta}\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/zip\r\n\r\n",
            b = BOUNDARY,
        )
        .as_bytes(),
    );
    body.extend_from_slice(file);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

macro_rules! app {
    ($env:expr) => {
        test::init_service(
            App::new()
                .app_data($env.state.clone())
                .configure(services::configure),
        )
        .await
    };
}

/// Creates a client and an uploaded asset, and assigns it with `seats`.
/// Returns `(client_id, asset_id, assignment)`.
macro_rules! seed {
    ($app:expr, $seats:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/clients")
            .insert_header(bearer(ADMIN_TOKEN))
            .set_json(json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": "ada@example.com",
                "company": "Analytical",
                "domains": "lms.example.com, learn.example.com",
                "lms_api_key": CLIENT_KEY,
            }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let client: Value = test::read_body_json(resp).await;
        let client_id = client["id"].as_i64().unwrap();

        let meta = json!({ "title": "Fire Safety", "scorm_id": "9001" });
        let req = test::TestRequest::post()
            .uri("/api/scorm/upload")
            .insert_header(bearer(ADMIN_TOKEN))
            .insert_header((
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(multipart_body(&meta, "fire.zip", b"PK-not-inspected"))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let asset: Value = test::read_body_json(resp).await;
        let asset_id = asset["id"].as_i64().unwrap();

        let req = test::TestRequest::post()
            .uri(&format!("/api/scorm/assign/{}", client_id))
            .insert_header(bearer(ADMIN_TOKEN))
            .set_json(json!({ "scorms": [asset_id], "number_of_seats": $seats }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let assigned: Vec<Value> = test::read_body_json(resp).await;
        (client_id, asset_id, assigned[0].clone())
    }};
}

fn launch(token: &str, referring: &str, learner: &str) -> Value {
    json!({
        "id": token,
        "referringurl": referring,
        "learner_id": learner,
        "name": learner,
    })
}

/// Gives a learner an LMS account up front so launching never calls the LMS.
fn seat_ready_learner(env: &TestEnv, client_id: i64, learner_id: &str) {
    let conn = env.state.db.connect().unwrap();
    let learner = learners::get_or_create(&conn, client_id, learner_id, learner_id).unwrap();
    learners::set_cloudscorm_user_id(&conn, learner.id, &format!("cs-{}", learner_id)).unwrap();
}

#[actix_web::test]
async fn admin_routes_require_a_bearer_token() {
    let env = env();
    let app = app!(env);

    let req = test::TestRequest::get().uri("/api/clients").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::get()
        .uri("/api/clients")
        .insert_header(bearer("nobody"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn client_admins_are_limited_to_their_client() {
    let env = env();
    let app = app!(env);
    let (client_id, asset_id, _) = seed!(app, 2);

    let req = test::TestRequest::get()
        .uri("/api/clients")
        .insert_header(bearer(CLIENT_KEY))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri(&format!("/api/clients/{}", client_id))
        .insert_header(bearer(CLIENT_KEY))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let details: Value = test::read_body_json(resp).await;
    assert_eq!(details["assignments"].as_array().unwrap().len(), 1);
    assert!(details.get("lms_api_key").is_none());

    let req = test::TestRequest::get()
        .uri(&format!("/api/scorm/download/{}/{}", client_id + 1, asset_id))
        .insert_header(bearer(CLIENT_KEY))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn assigned_package_downloads_with_a_decodable_token() {
    let env = env();
    let app = app!(env);
    let (client_id, asset_id, assignment) = seed!(app, 2);
    assert!(assignment["package_md5"].is_string());
    assert_eq!(
        assignment["package_url"],
        format!("/media/{}", assignment["client_scorm_file"].as_str().unwrap())
    );

    let req = test::TestRequest::get()
        .uri(&format!("/api/scorm/download/{}/{}", client_id, asset_id))
        .insert_header(bearer(CLIENT_KEY))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"Ada_Fire Safety.zip\""
    );
    let bytes = test::read_body(resp).await;

    let identity = env.state.pipeline.codec().decode(&token_in(&bytes)).unwrap();
    assert_eq!(identity, LaunchIdentity::new(client_id as u64, "9001"));
    assert!(zip_entry(&bytes, "imsmanifest.xml").contains("<title>Fire Safety</title>"));
}

#[actix_web::test]
async fn duplicate_lms_ids_are_rejected() {
    let env = env();
    let app = app!(env);
    seed!(app, 1);

    let meta = json!({ "title": "Fire Safety again", "scorm_id": "9001" });
    let req = test::TestRequest::post()
        .uri("/api/scorm/upload")
        .insert_header(bearer(ADMIN_TOKEN))
        .insert_header((
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body(&meta, "other.zip", b"other bytes"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn regenerate_keeps_the_package_name() {
    let env = env();
    let app = app!(env);
    let (_, _, assignment) = seed!(app, 1);

    let req = test::TestRequest::post()
        .uri(&format!(
            "/api/scorm/assignments/{}/regenerate",
            assignment["id"].as_i64().unwrap()
        ))
        .insert_header(bearer(ADMIN_TOKEN))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let regenerated: Value = test::read_body_json(resp).await;
    assert_eq!(regenerated["client_scorm_file"], assignment["client_scorm_file"]);
}

#[actix_web::test]
async fn launch_enforces_domain_and_seats() {
    let env = env();
    let app = app!(env);
    let (client_id, _, _) = seed!(app, 1);
    let token = env
        .state
        .pipeline
        .codec()
        .encode(&LaunchIdentity::new(client_id as u64, "9001"))
        .unwrap();
    seat_ready_learner(&env, client_id, "alice");
    seat_ready_learner(&env, client_id, "bob");

    let req = test::TestRequest::post()
        .uri("/api/validate-and-launch")
        .set_json(launch(&token, "https://evil.example.net/course", "alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid referring domain");

    let req = test::TestRequest::post()
        .uri("/api/validate-and-launch")
        .set_json(launch(&token, "https://LMS.example.com/player", "alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["cloudscorm_user_id"], "cs-alice");
    assert_eq!(
        body["launch_url"],
        format!("{}/course/9001/cs-alice/online/0-0-0-0-0", LMS_URL)
    );

    let req = test::TestRequest::post()
        .uri("/api/validate-and-launch")
        .set_json(launch(&token, "learn.example.com", "bob"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Seats limit exceeded");

    // The seated learner keeps access.
    let req = test::TestRequest::post()
        .uri("/api/validate-and-launch")
        .set_json(launch(&token, "learn.example.com", "alice"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn launch_rejects_bad_input_before_any_lookup() {
    let env = env();
    let app = app!(env);

    let req = test::TestRequest::post()
        .uri("/api/validate-and-launch")
        .set_json(json!({ "id": "abc", "referringurl": "lms.example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Missing required data");

    let req = test::TestRequest::post()
        .uri("/api/validate-and-launch")
        .set_json(launch("not-a-token!", "lms.example.com", "alice"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let token = env
        .state
        .pipeline
        .codec()
        .encode(&LaunchIdentity::new(77, "9001"))
        .unwrap();
    let req = test::TestRequest::post()
        .uri("/api/validate-and-launch")
        .set_json(launch(&token, "lms.example.com", "alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid client identifier");
}

#[actix_web::test]
async fn client_keys_must_be_unique_and_not_the_admin_token() {
    let env = env();
    let app = app!(env);
    seed!(app, 1);

    for key in [CLIENT_KEY, ADMIN_TOKEN] {
        let req = test::TestRequest::post()
            .uri("/api/clients")
            .insert_header(bearer(ADMIN_TOKEN))
            .set_json(json!({
                "first_name": "Grace",
                "last_name": "Hopper",
                "email": "grace@example.com",
                "company": "Navy",
                "lms_api_key": key,
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().starts_with("lms_api_key"));
    }
}

/// LMS signup endpoint that answers slowly, leaving launches in flight together.
async fn slow_signup(form: web::Form<HashMap<String, String>>) -> HttpResponse {
    actix_web::rt::time::sleep(Duration::from_millis(200)).await;
    HttpResponse::Ok().json(json!({ "user_id": format!("cs-{}", form["website_user_id"]) }))
}

#[actix_web::test]
async fn concurrent_launches_cannot_exceed_seats() {
    let lms = HttpServer::new(|| App::new().route("/user/signup", web::post().to(slow_signup)))
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
    let lms_addr = lms.addrs()[0];
    actix_web::rt::spawn(lms.run());

    let env = env_with_lms(&format!("http://{}", lms_addr));
    let app = app!(env);
    let (client_id, _, assignment) = seed!(app, 1);
    let token = env
        .state
        .pipeline
        .codec()
        .encode(&LaunchIdentity::new(client_id as u64, "9001"))
        .unwrap();

    let alice = test::TestRequest::post()
        .uri("/api/validate-and-launch")
        .set_json(launch(&token, "lms.example.com", "alice"))
        .to_request();
    let bob = test::TestRequest::post()
        .uri("/api/validate-and-launch")
        .set_json(launch(&token, "lms.example.com", "bob"))
        .to_request();
    let (alice, bob) = tokio::join!(test::call_service(&app, alice), test::call_service(&app, bob));

    let mut statuses = vec![alice.status(), bob.status()];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::BAD_REQUEST]);

    let conn = env.state.db.connect().unwrap();
    let assignment_id = assignment["id"].as_i64().unwrap();
    assert_eq!(assignments::seats_taken(&conn, assignment_id).unwrap(), 1);
}

#[actix_web::test]
async fn oversized_upload_metadata_is_rejected() {
    let env = env();
    let app = app!(env);

    let meta = json!({ "title": "Big", "description": "x".repeat(services::JSON_LIMIT) });
    let req = test::TestRequest::post()
        .uri("/api/scorm/upload")
        .insert_header(bearer(ADMIN_TOKEN))
        .insert_header((
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body(&meta, "big.zip", b"zip"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "SCORM metadata is too large");
}
