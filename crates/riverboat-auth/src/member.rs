use riverboat_core::ID;
use riverboat_core::Unique;

/// Authenticated user with verified identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Member {
    id: ID<Self>,
    username: String,
}

impl Member {
    pub fn new(id: ID<Self>, username: String) -> Self {
        Self { id, username }
    }
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl Unique for Member {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

mod schema {
    use super::*;
    use riverboat_pg::*;

    /// Schema for the users table.
    /// `hashword` and `diamonds` are database-only fields: credential
    /// issuance and balance mutation happen outside the game core.
    impl Schema for Member {
        fn name() -> &'static str {
            USERS
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                USERS,
                " (
                    id          UUID PRIMARY KEY,
                    username    VARCHAR(32) UNIQUE NOT NULL,
                    email       VARCHAR(255) UNIQUE NOT NULL,
                    hashword    TEXT NOT NULL,
                    diamonds    BIGINT NOT NULL DEFAULT 0
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_users_username ON ",
                USERS,
                " (username);"
            )
        }
    }
}
