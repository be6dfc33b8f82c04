use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult};
use tracing::info;
use uuid::Uuid;

const SESSION_TTL_SECS: u64 = 24 * 60 * 60;

pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

fn questions_key(session_id: &str) -> String {
    format!("session:{session_id}:questions")
}

/// How many research runs a session may start.
#[derive(Debug, Clone)]
pub struct QuotaPolicy {
    pub max_questions: u32,
    pub admin_session_id: String,
}

impl QuotaPolicy {
    pub fn is_admin(&self, session_id: &str) -> bool {
        !self.admin_session_id.is_empty() && session_id == self.admin_session_id
    }

    /// Decision on the counter value after this request was counted.
    pub fn admits(&self, session_id: &str, count_after_increment: u32) -> bool {
        self.is_admin(session_id) || count_after_increment <= self.max_questions
    }
}

/// Per-session question counters kept in Redis.
#[derive(Clone)]
pub struct SessionStore {
    connection: ConnectionManager,
    policy: QuotaPolicy,
}

impl SessionStore {
    pub async fn new(redis_url: &str, policy: QuotaPolicy) -> RedisResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let connection = client.get_tokio_connection_manager().await?;
        Ok(Self { connection, policy })
    }

    /// Counts a new question against the session. `false` when the quota is spent.
    ///
    /// INCR runs before the check; each request decides on its own count.
    pub async fn try_start_question(&mut self, session_id: &str) -> RedisResult<bool> {
        if self.policy.is_admin(session_id) {
            return Ok(true);
        }

        let key = questions_key(session_id);
        let (count,): (u32,) = redis::pipe()
            .atomic()
            .cmd("INCR")
            .arg(&key)
            .cmd("EXPIRE")
            .arg(&key)
            .arg(SESSION_TTL_SECS)
            .ignore()
            .query_async(&mut self.connection)
            .await?;

        if self.policy.admits(session_id, count) {
            return Ok(true);
        }

        self.connection.decr::<_, _, i64>(&key, 1).await?;
        info!(session_id, asked = count - 1, "Session question limit reached");
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> QuotaPolicy {
        QuotaPolicy {
            max_questions: 3,
            admin_session_id: "ADMIN-OVERRIDE".to_string(),
        }
    }

    #[test]
    fn regular_session_is_capped_on_incremented_count() {
        let policy = policy();
        assert!(policy.admits("abc", 1));
        assert!(policy.admits("abc", 3));
        assert!(!policy.admits("abc", 4));
    }

    #[test]
    fn concurrent_requests_cannot_both_take_the_last_slot() {
        let policy = policy();
        // Two requests arrive with 2 already asked; INCR hands them 3 and 4.
        let first = policy.admits("abc", 3);
        let second = policy.admits("abc", 4);
        assert!(first);
        assert!(!second);
    }

    #[test]
    fn admin_session_is_never_capped() {
        let policy = policy();
        assert!(policy.is_admin("ADMIN-OVERRIDE"));
        assert!(policy.admits("ADMIN-OVERRIDE", 1_000));
    }

    #[test]
    fn empty_admin_id_grants_nothing() {
        let policy = QuotaPolicy {
            max_questions: 1,
            admin_session_id: String::new(),
        };
        assert!(!policy.is_admin(""));
        assert!(!policy.admits("", 2));
    }

    #[test]
    fn session_ids_are_unique_uuids() {
        let a = new_session_id();
        assert_ne!(a, new_session_id());
        assert!(Uuid::parse_str(&a).is_ok());
    }
}
