use super::fakes::{FakeChat, FakeEmbedder};
use autocrm::bootstrap::build_app_state_with_providers;
use autocrm::config::Config;
use autocrm::domain::entities::{Role, User};
use autocrm::domain::ports::UserRepository;
use autocrm::domain::services::{hash_password, Actor};
use autocrm::infrastructure::http::middleware::AppState;
use autocrm::infrastructure::persistence::Database;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tempfile::TempDir;

pub const TEST_PASSWORD: &str = "password123";

/// File-backed SQLite database in its own temp directory, migrated.
/// The directory is removed when this value is dropped.
pub struct TestDb {
    db: Database,
    dir: TempDir,
}

impl TestDb {
    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

pub async fn setup_test_db() -> TestDb {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());

    let db = Database::connect(&db_url)
        .await
        .expect("Failed to connect to test database");
    db.run_migrations().await.expect("Failed to run migrations");

    TestDb { db, dir }
}

/// Argon2 is slow in debug builds, so every test user shares one hash.
fn shared_password_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(TEST_PASSWORD).expect("Failed to hash password"))
}

pub async fn create_test_user(db: &Database, email: &str, role: Role) -> User {
    let name = email.split('@').next().unwrap_or(email).to_string();
    let user = User::new(email.to_string(), name, role);
    db.create_user(&user, shared_password_hash())
        .await
        .expect("Failed to create user");
    user
}

pub fn actor(user: &User) -> Actor {
    Actor::from(user)
}

pub fn test_config(docs_path: &Path) -> Config {
    Config {
        docs_path: docs_path.to_path_buf(),
        ai_timeout_secs: 1,
        ..Config::default()
    }
}

/// Services wired against a fresh database and in-process model fakes.
pub struct TestApp {
    pub test_db: TestDb,
    pub state: AppState,
    pub chat: Arc<FakeChat>,
    pub embedder: Arc<FakeEmbedder>,
}

impl TestApp {
    pub fn db(&self) -> &Database {
        self.test_db.db()
    }

    pub fn docs_path(&self) -> std::path::PathBuf {
        self.test_db.path().join("help-docs")
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with_chat(FakeChat::replying(r#"{"reply": "Thanks for reaching out."}"#)).await
}

pub async fn setup_test_app_with_chat(chat: Arc<FakeChat>) -> TestApp {
    setup_test_app_with(chat, Arc::new(FakeEmbedder::default())).await
}

pub async fn setup_test_app_with_embedder(embedder: Arc<FakeEmbedder>) -> TestApp {
    setup_test_app_with(
        FakeChat::replying(r#"{"reply": "Thanks for reaching out."}"#),
        embedder,
    )
    .await
}

pub async fn setup_test_app_with(chat: Arc<FakeChat>, embedder: Arc<FakeEmbedder>) -> TestApp {
    let test_db = setup_test_db().await;
    let config = test_config(&test_db.path().join("help-docs"));

    let state = build_app_state_with_providers(
        test_db.db().clone(),
        &config,
        chat.clone(),
        embedder.clone(),
    );

    TestApp {
        test_db,
        state,
        chat,
        embedder,
    }
}

/// Write `help-docs/<category>/<slug>.md` under the app's docs root.
pub fn write_doc(app: &TestApp, category: &str, slug: &str, content: &str) {
    let dir = app.docs_path().join(category);
    std::fs::create_dir_all(&dir).expect("Failed to create category dir");
    std::fs::write(dir.join(format!("{}.md", slug)), content).expect("Failed to write doc");
}
