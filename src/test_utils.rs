#[cfg(test)]
pub mod test_utils {
    use crate::config::Settings;
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::Router;
    use axum::http::{HeaderName, HeaderValue, header};
    use axum_test::TestServer;
    use migration::{Migrator, MigratorTrait};
    use model::entities::{ingredient, tag};
    use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};
    use serde_json::{Value, json};
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    /// 1x1 transparent PNG as a data URI.
    pub const PNG_DATA_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");
        db.execute_unprepared("PRAGMA foreign_keys = ON;")
            .await
            .expect("Failed to enable foreign keys");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// AppState with the catalog seeded: tags `breakfast`, `lunch`, `dinner`
    /// and ingredients `eggs (pcs)`, `milk (ml)`, `flour (g)`.
    pub async fn setup_test_app_state() -> AppState {
        let db = setup_test_db().await;

        for (name, color, slug) in [
            ("Breakfast", "#E26C2D", "breakfast"),
            ("Lunch", "#49B64E", "lunch"),
            ("Dinner", "#8775D2", "dinner"),
        ] {
            tag::ActiveModel {
                name: Set(name.to_string()),
                color: Set(color.to_string()),
                slug: Set(slug.to_string()),
                ..Default::default()
            }
            .insert(&db)
            .await
            .expect("Failed to create test tag");
        }

        for (name, unit) in [("eggs", "pcs"), ("milk", "ml"), ("flour", "g")] {
            ingredient::ActiveModel {
                name: Set(name.to_string()),
                measurement_unit: Set(unit.to_string()),
                ..Default::default()
            }
            .insert(&db)
            .await
            .expect("Failed to create test ingredient");
        }

        AppState::new(db, Settings::default())
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level comes from RUST_LOG and defaults to WARN.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| level.parse::<Level>().ok())
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create axum app for testing
    pub async fn setup_test_app() -> Router {
        let _guard = init_test_tracing();
        let state = setup_test_app_state().await;
        create_router(state)
    }

    pub async fn setup_test_server() -> TestServer {
        TestServer::new(setup_test_app().await).expect("Failed to start test server")
    }

    /// Registers a user and logs them in. Returns the user's id and the
    /// Authorization header to send.
    pub async fn register_and_login(server: &TestServer, username: &str) -> (i64, HeaderValue) {
        let email = format!("{username}@example.com");
        let password = "s3cret-password";

        let created = server
            .post("/api/users/")
            .json(&json!({
                "email": email,
                "username": username,
                "first_name": username,
                "last_name": "Tester",
                "password": password,
            }))
            .await;
        created.assert_status(axum::http::StatusCode::CREATED);
        let id = created.json::<Value>()["id"].as_i64().expect("user id");

        let login = server
            .post("/api/auth/token/login/")
            .json(&json!({ "email": email, "password": password }))
            .await;
        login.assert_status_ok();
        let token = login.json::<Value>()["auth_token"]
            .as_str()
            .expect("auth token")
            .to_string();

        let header = HeaderValue::from_str(&format!("Token {token}")).expect("header value");
        (id, header)
    }

    pub fn auth_header() -> HeaderName {
        header::AUTHORIZATION
    }

    /// A valid recipe body using the seeded catalog (ids 1..=3).
    pub fn recipe_body(name: &str, tags: &[i64], ingredients: &[(i64, i64)]) -> Value {
        json!({
            "ingredients": ingredients
                .iter()
                .map(|(id, amount)| json!({ "id": id, "amount": amount }))
                .collect::<Vec<_>>(),
            "tags": tags,
            "image": PNG_DATA_URI,
            "name": name,
            "text": "Mix, cook, serve.",
            "cooking_time": 10,
        })
    }
}
