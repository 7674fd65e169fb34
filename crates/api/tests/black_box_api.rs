use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use catalog_api::app::{AppServices, build_app};
use catalog_auth::{AccessClaims, Hs256TokenValidator, Role};
use catalog_core::UserId;
use catalog_infra::InMemoryCatalogRepository;
use catalog_infra::media::InMemoryMediaHost;
use catalog_products::VendorAccount;

const JWT_SECRET: &str = "black-box-secret";

struct TestServer {
    base_url: String,
    repo: Arc<InMemoryCatalogRepository>,
    media: Arc<InMemoryMediaHost>,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        catalog_observability::init_pretty();

        let repo = Arc::new(InMemoryCatalogRepository::new());
        let media = Arc::new(InMemoryMediaHost::new());
        let services = AppServices::in_memory(repo.clone(), media.clone(), "file-upload");
        let validator = Arc::new(Hs256TokenValidator::new(JWT_SECRET));

        // Same router as prod, bound to an ephemeral port.
        let app = build_app(Arc::new(services), validator);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            repo,
            media,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn create(&self, token: &str, body: Value) -> Value {
        let res = self
            .client
            .post(self.url("/products"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        res.json::<Value>().await.unwrap()["product"].clone()
    }

    async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(user: UserId) -> String {
    let now = Utc::now();
    let claims = AccessClaims {
        sub: user,
        role: Role::new("vendor"),
        iat: now.timestamp(),
        exp: (now + ChronoDuration::minutes(10)).timestamp(),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn product_body(name: &str, brand: &str) -> Value {
    json!({
        "name": name,
        "description": "Solid choice",
        "category": "electronics",
        "brand": brand,
        "price": 49_900
    })
}

fn account(first: &str) -> VendorAccount {
    VendorAccount {
        id: UserId::new(),
        first_name: first.to_string(),
        last_name: "Vendor".to_string(),
        email: format!("{}@example.com", first.to_lowercase()),
        role: "vendor".to_string(),
        password: "$argon2id$hash".to_string(),
        confirm_password: Some("$argon2id$hash".to_string()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn health_is_public() {
    let server = TestServer::spawn().await;
    let res = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn writes_require_a_valid_bearer_token() {
    let server = TestServer::spawn().await;

    let res = server
        .client
        .post(server.url("/products"))
        .json(&product_body("Phone", "Acme"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server
        .client
        .post(server.url("/products"))
        .bearer_auth("not-a-jwt")
        .json(&product_body("Phone", "Acme"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server
        .client
        .delete(server.url(&format!("/products/{}", UserId::new())))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Reads stay public.
    let (status, body) = server.get_json("/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"], json!([]));
}

#[tokio::test]
async fn create_forces_caller_as_vendor_and_zero_ratings() {
    let server = TestServer::spawn().await;
    let caller = UserId::new();
    let token = mint_jwt(caller);

    let mut body = product_body("Phone X", "Acme");
    body["vendor"] = json!(UserId::new().to_string());
    body["averageRating"] = json!(5);
    body["numberOfReviews"] = json!(99);

    let product = server.create(&token, body).await;
    assert_eq!(product["vendor"], json!(caller.to_string()));
    assert_eq!(product["averageRating"], json!(0.0));
    assert_eq!(product["numberOfReviews"], json!(0));
    assert!(product["createdAt"].is_string());
}

#[tokio::test]
async fn create_rejects_invalid_documents() {
    let server = TestServer::spawn().await;
    let token = mint_jwt(UserId::new());

    let res = server
        .client
        .post(server.url("/products"))
        .bearer_auth(&token)
        .json(&product_body("   ", "Acme"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = server
        .client
        .post(server.url("/products"))
        .bearer_auth(&token)
        .json(&json!({ "name": "No brand", "category": "misc", "price": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_filters_sorts_and_paginates() {
    let server = TestServer::spawn().await;
    let token = mint_jwt(UserId::new());

    let mut phones = Vec::new();
    for i in 0..10 {
        let p = server.create(&token, product_body(&format!("Phone {i}"), "Acme")).await;
        phones.push(p["id"].as_str().unwrap().to_string());
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
    server.create(&token, product_body("Laptop", "Acme")).await;

    let (status, body) = server.get_json("/products?search=PHONE&sort=latest&page=2").await;
    assert_eq!(status, StatusCode::OK);
    let items = body["product"].as_array().unwrap();
    let ids: Vec<&str> = items.iter().map(|p| p["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec![phones[2].as_str(), phones[1].as_str(), phones[0].as_str()]);
    assert!(items.iter().all(|p| p.get("createdAt").is_none() && p.get("updatedAt").is_none()));

    let (_, first) = server.get_json("/products?page=abc").await;
    assert_eq!(first["product"].as_array().unwrap().len(), 7);

    let (_, none) = server.get_json("/products?category=garden").await;
    assert_eq!(none["product"], json!([]));
}

#[tokio::test]
async fn get_expands_vendor_and_hides_credentials() {
    let server = TestServer::spawn().await;
    let vendor = account("Ada");
    server.repo.put_account(vendor.clone()).unwrap();
    let token = mint_jwt(vendor.id);

    let created = server.create(&token, product_body("Kettle", "Brew")).await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = server.get_json(&format!("/products/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    let product = &body["product"];
    assert_eq!(product["vendor"]["firstName"], "Ada");
    assert_eq!(product["vendor"]["role"], "vendor");
    assert!(product["vendor"].get("password").is_none());
    assert!(product["vendor"].get("id").is_none());
    assert!(product.get("createdAt").is_none());
    assert_eq!(product["reviews"], json!([]));
    assert!(!body.to_string().contains("argon2id"));
}

#[tokio::test]
async fn get_distinguishes_bad_ids_from_missing_products() {
    let server = TestServer::spawn().await;

    let (status, body) = server.get_json("/products/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");

    let (status, body) = server.get_json(&format!("/products/{}", UserId::new())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn update_validates_and_reports_missing() {
    let server = TestServer::spawn().await;
    let token = mint_jwt(UserId::new());
    let created = server.create(&token, product_body("Lamp", "Glow")).await;
    let id = created["id"].as_str().unwrap();

    let res = server
        .client
        .patch(server.url(&format!("/products/{id}")))
        .bearer_auth(&token)
        .json(&json!({ "price": 1_000, "vendor": UserId::new().to_string() }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["product"]["price"], json!(1_000));
    assert_eq!(body["product"]["vendor"], created["vendor"]);

    let res = server
        .client
        .patch(server.url(&format!("/products/{id}")))
        .bearer_auth(&token)
        .json(&json!({ "name": "x".repeat(101) }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = server
        .client
        .patch(server.url(&format!("/products/{}", UserId::new())))
        .bearer_auth(&token)
        .json(&json!({ "price": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_returns_snapshot_then_not_found() {
    let server = TestServer::spawn().await;
    let token = mint_jwt(UserId::new());
    let created = server.create(&token, product_body("Mug", "Cup")).await;
    let url = server.url(&format!("/products/{}", created["id"].as_str().unwrap()));

    let res = server.client.delete(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["product"]["id"], created["id"]);

    let res = server.client.delete(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_image_hosts_images_only() {
    let server = TestServer::spawn().await;
    let token = mint_jwt(UserId::new());

    let part = reqwest::multipart::Part::bytes(b"\x89PNG pixels".to_vec())
        .file_name("photo.png")
        .mime_str("image/png")
        .unwrap();
    let res = server
        .client
        .post(server.url("/products/upload-image"))
        .bearer_auth(&token)
        .multipart(reqwest::multipart::Form::new().part("image", part))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["image"]["src"], "memory://file-upload/photo.png");
    assert_eq!(server.media.uploads().len(), 1);

    let part = reqwest::multipart::Part::bytes(b"%PDF-1.7".to_vec())
        .file_name("doc.pdf")
        .mime_str("application/pdf")
        .unwrap();
    let res = server
        .client
        .post(server.url("/products/upload-image"))
        .bearer_auth(&token)
        .multipart(reqwest::multipart::Form::new().part("image", part))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "please upload image");
    assert_eq!(server.media.uploads().len(), 1);
}

#[tokio::test]
async fn analytics_endpoints_use_their_envelopes() {
    let server = TestServer::spawn().await;
    let known = account("Grace");
    server.repo.put_account(known.clone()).unwrap();
    let known_token = mint_jwt(known.id);
    let ghost_token = mint_jwt(UserId::new());

    let star = server.create(&known_token, product_body("Star", "Duo")).await;
    server.create(&known_token, product_body("Plain", "Duo")).await;
    server.create(&ghost_token, product_body("Other", "Solo")).await;

    let star_id = star["id"].as_str().unwrap().parse().unwrap();
    server.repo.set_rating(star_id, 4.5, 12).unwrap();

    let (status, body) = server.get_json("/products/top-ranked").await;
    assert_eq!(status, StatusCode::OK);
    let ranked = body["topRanks"].as_array().unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0]["id"], star["id"]);

    let (_, body) = server.get_json("/products/top-brands").await;
    assert_eq!(
        body["topBrands"],
        json!([{ "brandName": "Duo" }, { "brandName": "Solo" }])
    );

    let (_, body) = server.get_json("/products/new-arrival").await;
    assert_eq!(body["newArrival"].as_array().unwrap().len(), 3);

    let (_, body) = server.get_json("/products/recommended").await;
    let picks = body["recommended"].as_array().unwrap();
    assert_eq!(picks.len(), 3);
    assert!(picks.iter().all(|p| p.get("createdAt").is_none()));

    let (_, body) = server.get_json("/products/top-vendors").await;
    let vendors = body["topVendors"].as_array().unwrap();
    assert_eq!(vendors.len(), 2);
    assert_eq!(vendors[0]["productCount"], json!(2));
    assert_eq!(vendors[0]["vendor"]["firstName"], "Grace");
    assert!(vendors[0]["vendor"].get("role").is_none());
    assert!(vendors[1]["vendor"].is_null());
}

#[tokio::test]
async fn analytics_on_empty_catalog_are_empty() {
    let server = TestServer::spawn().await;
    for (path, key) in [
        ("/products/top-ranked", "topRanks"),
        ("/products/top-brands", "topBrands"),
        ("/products/new-arrival", "newArrival"),
        ("/products/recommended", "recommended"),
        ("/products/top-vendors", "topVendors"),
    ] {
        let (status, body) = server.get_json(path).await;
        assert_eq!(status, StatusCode::OK, "{path}");
        assert_eq!(body[key], json!([]), "{path}");
    }
}
