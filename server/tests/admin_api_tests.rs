mod common;

use common::{admin_client, register, spawn_test_server, spawn_with_key, ADMIN_KEY};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

#[tokio::test]
async fn admin_routes_require_api_key() {
    let base = spawn_test_server().await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{}/api/admin/users", base)).send().await.unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": true, "message": "Valid API key required" }));

    let resp = client
        .get(format!("{}/api/admin/users", base))
        .header("x-api-key", "wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client
        .get(format!("{}/api/admin/analytics", base))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn admin_routes_fail_closed_without_configured_key() {
    let base = spawn_with_key(None).await;
    let resp = reqwest::Client::new()
        .get(format!("{}/api/admin/users", base))
        .header("x-api-key", "")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Device-facing routes stay open.
    assert_eq!(register(&base, "dev-1").await.status(), 201);
}

#[tokio::test]
async fn list_and_detail() {
    let base = spawn_test_server().await;
    register(&base, "office-1").await;
    register(&base, "office-2").await;
    let admin = admin_client();

    let resp = admin
        .get(format!("{}/api/admin/users?search=office&limit=10", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 2);
    assert_eq!(body["devices"][0]["graceStatus"], "active");
    assert!(body["devices"][0]["deviceId"].is_string());

    let resp = admin
        .get(format!("{}/api/admin/users/office-1", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["device"]["deviceId"], "office-1");
    assert_eq!(body["device"]["appVersion"], "1.4.0");
    assert_eq!(body["activityLogs"], json!([]));
    assert_eq!(body["stats"]["activityCount"], 0);

    let resp = admin
        .get(format!("{}/api/admin/users/missing", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Device not found");
}

#[tokio::test]
async fn invalid_list_parameters_are_bad_requests() {
    let base = spawn_test_server().await;
    let admin = admin_client();
    for query in ["status=banned", "limit=lots"] {
        let resp = admin
            .get(format!("{}/api/admin/users?{}", base, query))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "{query}");
    }
}

#[tokio::test]
async fn lock_toggle_and_conflict() {
    let base = spawn_test_server().await;
    register(&base, "abc123").await;
    let admin = admin_client();
    let lock_url = format!("{}/api/admin/users/abc123/lock", base);

    let resp = admin
        .post(&lock_url)
        .json(&json!({ "currentStatus": "active" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "locked");

    let check: Value = reqwest::get(format!("{}/api/devices/abc123/license", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(check["isValid"], false);
    assert_eq!(check["status"], "locked");

    // A second operator acting on the stale view loses.
    let resp = admin
        .post(&lock_url)
        .json(&json!({ "currentStatus": "active" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    // No body toggles from the stored status.
    let resp = admin.post(&lock_url).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "active");

    let check: Value = reqwest::get(format!("{}/api/devices/abc123/license", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(check["isValid"], true);
}

#[tokio::test]
async fn patch_updates_fields() {
    let base = spawn_test_server().await;
    register(&base, "dev-1").await;
    let admin = admin_client();
    let url = format!("{}/api/admin/users/dev-1", base);

    let resp = admin
        .patch(&url)
        .json(&json!({
            "licenseExpiry": "2020-01-01T00:00:00Z",
            "controls": { "canPrint": false },
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Device updated successfully");
    assert_eq!(body["device"]["licenseExpiry"], "2020-01-01T00:00:00.000Z");

    let check: Value = reqwest::get(format!("{}/api/devices/dev-1/license", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(check["status"], "expired");
    assert_eq!(check["expiresAt"], "2020-01-01T00:00:00.000Z");

    let resp = admin.patch(&url).json(&json!({ "licenseExpiry": null })).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["device"]["licenseExpiry"], Value::Null);

    let resp = admin.patch(&url).json(&json!({ "status": "banned" })).send().await.unwrap();
    assert_eq!(resp.status(), 400);

    let resp = admin.patch(&url).json(&json!({})).send().await.unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn force_check_marks_device() {
    let base = spawn_test_server().await;
    register(&base, "dev-1").await;
    let admin = admin_client();

    let resp = admin
        .post(format!("{}/api/admin/users/dev-1/force-check", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "success": true }));

    let detail: Value = admin
        .get(format!("{}/api/admin/users/dev-1", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["device"]["forceCheck"], true);

    let resp = admin
        .post(format!("{}/api/admin/users/ghost/force-check", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn analytics_report() {
    let base = spawn_test_server().await;
    register(&base, "dev-1").await;
    register(&base, "dev-2").await;
    let admin = admin_client();
    admin
        .post(format!("{}/api/admin/users/dev-2/lock", base))
        .send()
        .await
        .unwrap();

    let resp = admin.get(format!("{}/api/admin/analytics", base)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    let analytics = &body["analytics"];
    assert_eq!(analytics["totalDevices"], 2);
    assert_eq!(analytics["activeToday"], 2);
    assert_eq!(analytics["lockedDevices"], 1);
    assert_eq!(analytics["statusBreakdown"], json!({ "active": 1, "locked": 1, "expired": 0 }));
    assert_eq!(analytics["versionDistribution"], json!({ "1.4.0": 2 }));
    assert_eq!(body["recentActivity"], json!([]));
}

#[tokio::test]
async fn lock_with_empty_body_toggles_stored_status() {
    let base = spawn_test_server().await;
    register(&base, "dev-1").await;
    let admin = admin_client();
    let lock_url = format!("{}/api/admin/users/dev-1/lock", base);

    let resp = admin.post(&lock_url).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "locked");
    assert_eq!(body["lockReason"], "Admin manual lock");

    let resp = admin
        .post(&lock_url)
        .header("content-type", "application/json")
        .body("  ")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "active");

    let resp = admin.post(&lock_url).body("{oops").send().await.unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn publish_and_poll_updates() {
    let base = spawn_test_server().await;
    let admin = admin_client();
    let url = format!("{}/api/admin/updates", base);
    let release = json!({
        "version": "1.5.0",
        "buildNumber": 15,
        "apkUrl": "https://cdn.example.com/app-15.apk",
        "fileSize": 24_000_000,
        "releaseNotes": "Faster sync",
        "forceUpdate": true,
    });

    let resp = reqwest::Client::new().post(&url).json(&release).send().await.unwrap();
    assert_eq!(resp.status(), 401);

    let resp = admin.post(&url).json(&release).send().await.unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Update created successfully");
    assert!(body["id"].is_i64());

    let older = json!({
        "version": "1.4.9",
        "buildNumber": 14,
        "apkUrl": "https://cdn.example.com/app-14.apk",
        "fileSize": 23_000_000,
    });
    assert_eq!(admin.post(&url).json(&older).send().await.unwrap().status(), 201);

    let body: Value = reqwest::get(format!("{}/api/updates/latest", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["hasUpdate"], true);
    let update = &body["update"];
    assert_eq!(update["version"], "1.5.0");
    assert_eq!(update["buildNumber"], 15);
    assert_eq!(update["apkUrl"], "https://cdn.example.com/app-15.apk");
    assert_eq!(update["fileSize"], 24_000_000);
    assert_eq!(update["releaseNotes"], "Faster sync");
    assert_eq!(update["forceUpdate"], true);
    assert_eq!(update["skipAllowed"], false);
    assert!(update["createdAt"].is_string());

    let body: Value = admin.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["count"], 2);
    assert_eq!(body["updates"][0]["buildNumber"], 15);
    assert_eq!(body["updates"][1]["version"], "1.4.9");

    let resp = admin
        .post(&url)
        .json(&json!({ "version": "2.0.0" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}
