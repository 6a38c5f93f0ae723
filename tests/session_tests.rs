//! Command sessions against a mock panel, including admin-scoped runs.

use marzban_manager::cli::commands::{Scope, Session};
use marzban_manager::clients::PanelClient;
use marzban_manager::domain::UserStatus;
use marzban_manager::services::{AccessContext, FilterSpec, Job};
use serde_json::json;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session(server: &MockServer) -> Session {
    let client = PanelClient::new(Url::parse(&server.uri()).unwrap(), Duration::from_secs(5))
        .unwrap();
    let access = AccessContext::bearer("root", "root-token").unwrap();
    Session::new(client, access, chrono_tz::Asia::Tehran)
}

fn admin_scope(password: &str) -> Scope {
    Scope {
        prefix: String::new(),
        admin: Some(("reseller".to_string(), password.to_string())),
    }
}

async fn mount_admin_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/admin/token"))
        .and(body_string_contains("username=reseller"))
        .and(body_string_contains("password=pw"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access_token": "reseller-token"})),
        )
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/admin/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Incorrect"})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_admin_scope_runs_with_admin_token() {
    let server = MockServer::start().await;
    mount_admin_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/users"))
        .and(header("authorization", "Bearer reseller-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{"username": "r1", "status": "active"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/user/r1"))
        .and(header("authorization", "Bearer reseller-token"))
        .and(body_json(json!({"status": "disabled"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let filter = FilterSpec::default().with_status(Some(UserStatus::Active));
    let report = session(&server)
        .run(&admin_scope("pw"), Job::SetStatus(UserStatus::Disabled), filter)
        .await
        .unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(report.total, 1);
}

#[tokio::test]
async fn test_wrong_admin_password_mutates_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Incorrect"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"users": []})))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = session(&server)
        .run(&admin_scope("wrong"), Job::Delete, FilterSpec::default())
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("reseller"), "{err:#}");
}

#[tokio::test]
async fn test_admin_stats_report_the_admin() {
    let server = MockServer::start().await;
    mount_admin_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/users"))
        .and(header("authorization", "Bearer reseller-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [
                {"username": "r1", "status": "active", "data_limit": 1_073_741_824},
                {"username": "r2", "status": "expired"}
            ]
        })))
        .mount(&server)
        .await;

    let report = session(&server).stats(&admin_scope("pw")).await.unwrap();

    assert_eq!(report.admin_username, "reseller");
    assert_eq!(report.all_users, 2);
    assert_eq!(report.expired, 1);
    assert!((report.all_traffic_limit - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_default_scope_reuses_session_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .and(header("authorization", "Bearer root-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{"username": "shop_1", "status": "active"}, {"username": "x", "status": "active"}]
        })))
        .mount(&server)
        .await;

    let scope = Scope {
        prefix: "shop_".to_string(),
        admin: None,
    };
    let report = session(&server).stats(&scope).await.unwrap();

    assert_eq!(report.admin_username, "root");
    assert_eq!(report.all_users, 1);
}
