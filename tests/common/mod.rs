// Shared harness for the HTTP integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use bloodlink_backend::config::{Config, WebConfig};
use bloodlink_backend::models::db_operations::users_db_operations;
use bloodlink_backend::models::{NewUser, Role, UserStatus};
use bloodlink_backend::services::identity::{IdentityError, IdentityVerifier, VerifiedIdentity};
use bloodlink_backend::services::payments::{PaymentError, PaymentGateway, PaymentIntent};
use bloodlink_backend::setup::db_setup;
use bloodlink_backend::DbPool;
use actix_web::test::TestRequest;
use actix_web::web;
use r2d2_sqlite::SqliteConnectionManager;
use redb::Database;
use rusqlite::Connection;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Accepts credentials of the form `token:<email>`.
pub struct StaticTokenVerifier;

#[async_trait]
impl IdentityVerifier for StaticTokenVerifier {
    async fn verify(&self, credential: &str) -> Result<VerifiedIdentity, IdentityError> {
        credential
            .strip_prefix("token:")
            .map(|email| VerifiedIdentity { subject: format!("uid-{}", email), email: email.to_string() })
            .ok_or_else(|| IdentityError::Rejected("unknown token".to_string()))
    }
}

#[derive(Default)]
pub struct FakePaymentGateway {
    pub calls: Mutex<Vec<(i64, String)>>,
}

#[async_trait]
impl PaymentGateway for FakePaymentGateway {
    async fn create_payment_intent(
        &self,
        amount_minor_units: i64,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        self.calls.lock().unwrap().push((amount_minor_units, currency.to_string()));
        Ok(PaymentIntent { client_secret: format!("pi_{}_secret", amount_minor_units) })
    }
}

pub struct TestHarness {
    pub pool: web::Data<DbPool>,
    pub db: web::Data<Database>,
    pub config: web::Data<Config>,
    pub verifier: web::Data<dyn IdentityVerifier>,
    pub gateway: Arc<FakePaymentGateway>,
    pub gateway_data: web::Data<dyn PaymentGateway>,
    dir: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("bloodlink-it-{}", Uuid::new_v4()));
        std::fs::create_dir_all(dir.join("users")).unwrap();
        std::fs::create_dir_all(dir.join("records")).unwrap();

        let users_path = dir.join("users").join("users.db");
        let mut conn = Connection::open(&users_path).unwrap();
        db_setup::setup_users_db(&mut conn).unwrap();
        drop(conn);
        let pool = r2d2::Pool::builder()
            .max_size(4)
            .build(SqliteConnectionManager::file(&users_path))
            .unwrap();

        let db = Database::create(dir.join("records").join("records.db")).unwrap();
        db_setup::setup_records_db(&db).unwrap();

        let config = Config {
            web: WebConfig { host: "127.0.0.1".to_string(), port: 0 },
            database_path: dir.display().to_string(),
            allowed_origins: String::new(),
            log_level: "warn".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_issuer: None,
            jwt_audience: None,
            stripe_secret_key: "sk_test".to_string(),
            payment_currency: "usd".to_string(),
            payment_api_base: "http://127.0.0.1:9".to_string(),
        };

        let gateway = Arc::new(FakePaymentGateway::default());
        let gateway_dyn: Arc<dyn PaymentGateway> = gateway.clone();
        let verifier: Arc<dyn IdentityVerifier> = Arc::new(StaticTokenVerifier);

        TestHarness {
            pool: web::Data::new(pool),
            db: web::Data::new(db),
            config: web::Data::new(config),
            verifier: web::Data::from(verifier),
            gateway,
            gateway_data: web::Data::from(gateway_dyn),
            dir,
        }
    }

    /// Checks a user in the way `/add-user` does, then assigns the role.
    pub fn register(&self, email: &str, role: Role) -> Uuid {
        let conn = self.pool.get().unwrap();
        let new_user = NewUser {
            email: email.to_string(),
            name: email.split('@').next().unwrap_or(email).to_string(),
            photo_url: None,
            blood_group: None,
            district: Some("Dhaka".to_string()),
            upazila: None,
            phone: None,
        };
        let (user, _) = users_db_operations::upsert_user_on_login(&conn, &new_user).unwrap();
        users_db_operations::update_role(&conn, &user.id, role).unwrap();
        user.id
    }

    pub fn set_role(&self, email: &str, role: Role) {
        let conn = self.pool.get().unwrap();
        assert_eq!(users_db_operations::update_role_by_email(&conn, email, role).unwrap(), 1);
    }

    pub fn user_id(&self, email: &str) -> Uuid {
        let conn = self.pool.get().unwrap();
        users_db_operations::read_user_by_email(&conn, email).unwrap().unwrap().id
    }

    pub fn user_status(&self, email: &str) -> UserStatus {
        let conn = self.pool.get().unwrap();
        users_db_operations::read_user_by_email(&conn, email).unwrap().unwrap().status
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

/// Builds the full application against a harness.
macro_rules! test_app {
    ($harness:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($harness.pool.clone())
                .app_data($harness.db.clone())
                .app_data($harness.config.clone())
                .app_data($harness.verifier.clone())
                .app_data($harness.gateway_data.clone())
                .configure(bloodlink_backend::routes::configure),
        )
        .await
    };
}

pub fn bearer(email: &str) -> (actix_web::http::header::HeaderName, String) {
    (actix_web::http::header::AUTHORIZATION, format!("Bearer token:{}", email))
}

pub fn get(uri: &str, caller: Option<&str>) -> TestRequest {
    let req = TestRequest::get().uri(uri);
    match caller {
        Some(email) => req.insert_header(bearer(email)),
        None => req,
    }
}

pub fn send(method: &str, uri: &str, caller: Option<&str>, body: Value) -> TestRequest {
    let req = match method {
        "POST" => TestRequest::post(),
        "PATCH" => TestRequest::patch(),
        "DELETE" => TestRequest::delete(),
        other => panic!("unsupported method {}", other),
    }
    .uri(uri)
    .set_json(body);
    match caller {
        Some(email) => req.insert_header(bearer(email)),
        None => req,
    }
}

pub fn new_user_body(email: &str, name: &str) -> Value {
    json!({
        "email": email,
        "name": name,
        "bloodGroup": "O+",
        "district": "Dhaka",
        "upazila": "Savar",
    })
}

pub fn donation_request_body(recipient: &str) -> Value {
    json!({
        "recipientName": recipient,
        "recipientDistrict": "Dhaka",
        "recipientUpazila": "Savar",
        "hospitalName": "Dhaka Medical College",
        "fullAddress": "Secretariat Rd, Dhaka",
        "bloodGroup": "A+",
        "donationDate": "2026-11-02",
        "donationTime": "10:30",
        "requestMessage": "Urgent surgery",
    })
}
