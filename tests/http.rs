use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct FiltersResponse {
    filters: Filters,
    options: Value,
}

#[derive(Debug, Deserialize, PartialEq)]
struct Filters {
    period: String,
    state: String,
    product: String,
    account_manager: String,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::Once;
    use std::sync::atomic::{AtomicI32, Ordering};

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/filters")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_sales_dashboard"))
        .env("PORT", port.to_string())
        .env("DASHBOARD_PERIOD", "YTD")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn get_json(client: &Client, url: String) -> Value {
    let response = client.get(url).send().await.unwrap();
    assert!(response.status().is_success(), "status {}", response.status());
    response.json().await.unwrap()
}

async fn current_filters(client: &Client, server: &TestServer) -> Filters {
    let response: FiltersResponse = client
        .get(format!("{}/api/filters", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    response.filters
}

async fn reset_filters(client: &Client, server: &TestServer) {
    let response = client
        .post(format!("{}/api/filters", server.base_url))
        .json(&json!({
            "period": "YTD",
            "state": "All",
            "product": "All",
            "account_manager": "All"
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
}

fn default_filters() -> Filters {
    Filters {
        period: "YTD".to_string(),
        state: "All".to_string(),
        product: "All".to_string(),
        account_manager: "All".to_string(),
    }
}

#[tokio::test]
async fn http_filters_expose_snapshot_and_options() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response: FiltersResponse = client
        .get(format!("{}/api/filters", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(response.filters, default_filters());
    assert_eq!(response.options["periods"], json!(["MTD", "QTD", "YTD", "12M"]));
    assert_eq!(response.options["states"][0], "All");
    assert_eq!(response.options["account_managers"].as_array().unwrap().len(), 16);
}

#[tokio::test]
async fn http_dashboard_defaults() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let view = get_json(&client, format!("{}/api/dashboard", server.base_url)).await;

    assert_eq!(view["kpis"]["ytd_revenue"], 5_236_000);
    assert_eq!(view["kpis"]["mtd_revenue"], 508_000);
    assert_eq!(view["kpis"]["active_accounts"], 29_800);
    assert_eq!(view["top_ams"].as_array().unwrap().len(), 10);
    assert_eq!(view["growth_ams"].as_array().unwrap().len(), 5);
    assert_eq!(view["dormant_partners"].as_array().unwrap().len(), 3);
    assert_eq!(view["top_partners"].as_array().unwrap().len(), 20);
    assert_eq!(view["revenue_trend"][0]["month"], "Sep 24");
    assert_eq!(view["churn_accounts_1m"][0]["window"], "1M");
}

#[tokio::test]
async fn http_dashboard_query_overlays_without_storing() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let view = get_json(
        &client,
        format!("{}/api/dashboard?state=NSW&period=MTD", server.base_url),
    )
    .await;

    let states = view["state_sales"].as_array().unwrap();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0]["state"], "NSW");
    let top_ams = view["top_ams"].as_array().unwrap();
    assert!(!top_ams.is_empty());
    assert!(top_ams.iter().all(|am| am["state"] == "NSW"));
    assert_eq!(view["kpis"]["ytd_revenue"], 1_151_920);

    assert_eq!(current_filters(&client, &server).await, default_filters());
}

#[tokio::test]
async fn http_post_filters_replaces_snapshot() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let view: Value = client
        .post(format!("{}/api/filters", server.base_url))
        .json(&json!({ "product": "SMS" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["filters"]["product"], "SMS");
    assert_eq!(view["product_sales"].as_array().unwrap().len(), 1);

    let churn = get_json(&client, format!("{}/api/churn?window=6M", server.base_url)).await;
    let accounts = churn["summary"]["accounts"].as_array().unwrap();
    assert!(!accounts.is_empty());
    assert!(accounts.iter().all(|a| a["product"] == "SMS" && a["window"] == "6M"));
    assert_eq!(churn["breakdown"]["breakdown"], "state");

    let filters = current_filters(&client, &server).await;
    assert_eq!(filters.product, "SMS");
    assert_eq!(filters.state, "All");

    reset_filters(&client, &server).await;
    assert_eq!(current_filters(&client, &server).await, default_filters());
}

#[tokio::test]
async fn http_form_submit_redirects_to_overview() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/filters", server.base_url))
        .form(&[
            ("period", "QTD"),
            ("state", "VIC"),
            ("product", "All"),
            ("account_manager", "All"),
        ])
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let html = response.text().await.unwrap();
    assert!(html.contains("Sales Dashboard"));
    assert!(html.contains("Mia Zhang"));

    let filters = current_filters(&client, &server).await;
    assert_eq!(filters.period, "QTD");
    assert_eq!(filters.state, "VIC");

    reset_filters(&client, &server).await;
}

#[tokio::test]
async fn http_rejects_unknown_period() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/api/dashboard?period=weekly", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text().await.unwrap(), "unknown period 'weekly'");

    let response = client
        .post(format!("{}/api/filters", server.base_url))
        .json(&json!({ "period": "weekly", "state": "VIC" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(current_filters(&client, &server).await, default_filters());

    let response = client
        .get(format!("{}/?am_tab=bogus", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_unknown_filter_value_is_empty_not_error() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let view = get_json(&client, format!("{}/api/dashboard?state=TAS", server.base_url)).await;
    assert!(view["state_sales"].as_array().unwrap().is_empty());
    assert!(view["top_ams"].as_array().unwrap().is_empty());
    assert!(view["churn_accounts_3m"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn http_am_performance_detail() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let detail = get_json(
        &client,
        format!("{}/api/am-performance?growth_period=6M&sort=margin", server.base_url),
    )
    .await;
    assert_eq!(detail["growth_period"], "6M");
    assert_eq!(detail["growth_caption"], "vs 6 Months");
    assert_eq!(detail["sort"], "margin");
    assert_eq!(detail["summary"]["active"], 10);
    assert_eq!(detail["ranked"][0]["name"], "Harish CK");
    assert_eq!(detail["growth_leaders"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn http_am_profile_lookup() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let profile = get_json(
        &client,
        format!("{}/api/am-profiles/Benson%20Yin", server.base_url),
    )
    .await;
    assert_eq!(profile["name"], "Benson Yin");
    assert_eq!(profile["state"], "NSW");
    assert_eq!(profile["product_shares"].as_array().unwrap().len(), 3);
    assert_eq!(profile["product_shares"][0]["relative"], 100.0);

    let response = client
        .get(format!("{}/api/am-profiles/Nobody", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
