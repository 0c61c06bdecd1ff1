#[cfg(test)]
pub mod test_utils {
    use crate::auth::TokenManager;
    use crate::mailer::Mailer;
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::Router;
    use migration::{Migrator, MigratorTrait};
    use model::entities::user::{self, Role};
    use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};
    use std::sync::{Arc, Mutex};
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    /// A message captured by the recording mailer
    #[derive(Clone, Debug)]
    pub struct OutboundMail {
        pub recipient: String,
        pub subject: String,
        pub body: String,
    }

    /// Mailer that records everything sent so tests can read the
    /// confirmation code back out.
    #[derive(Debug, Default)]
    pub struct RecordingMailer {
        sent: Mutex<Vec<OutboundMail>>,
    }

    impl RecordingMailer {
        pub fn sent(&self) -> Vec<OutboundMail> {
            self.sent.lock().unwrap().clone()
        }

        /// The confirmation code from the most recent message.
        pub fn last_code(&self) -> String {
            let mail = self
                .sent()
                .last()
                .cloned()
                .expect("no mail was sent");
            mail.body
                .rsplit(' ')
                .next()
                .expect("mail body had no code")
                .to_string()
        }
    }

    impl Mailer for RecordingMailer {
        fn send(&self, recipient: &str, subject: &str, body: &str) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(OutboundMail {
                recipient: recipient.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
            Ok(())
        }
    }

    /// A fully wired application over an in-memory database, with the
    /// state and mailer exposed for direct inspection.
    pub struct TestApp {
        pub router: Router,
        pub state: AppState,
        pub mailer: Arc<RecordingMailer>,
    }

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        db.execute_unprepared("PRAGMA foreign_keys = ON;")
            .await
            .expect("Failed to enable foreign keys");

        // Run migrations
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Create the application for testing
    pub async fn setup_test_app() -> TestApp {
        let _ = init_test_tracing();

        let db = setup_test_db().await;
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState {
            db,
            tokens: TokenManager::new("test-secret"),
            mailer: mailer.clone(),
        };
        let router = create_router(state.clone());

        TestApp {
            router,
            state,
            mailer,
        }
    }

    /// Insert a user directly, bypassing the registration flow
    pub async fn create_user(
        db: &DatabaseConnection,
        username: &str,
        role: Role,
        is_superuser: bool,
    ) -> user::Model {
        user::ActiveModel {
            username: Set(username.to_string()),
            email: Set(format!("{username}@example.com")),
            first_name: Set(String::new()),
            last_name: Set(String::new()),
            bio: Set(String::new()),
            role: Set(role),
            is_superuser: Set(is_superuser),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create test user")
    }

    /// Mint a bearer token for a user
    pub fn token_for(state: &AppState, user: &user::Model) -> String {
        state.tokens.mint(user.id).expect("Failed to mint token")
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is determined by the RUST_LOG environment variable,
    /// defaulting to WARN if not set.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}
