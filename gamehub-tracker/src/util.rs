use std::{future::Future, time::Duration};

use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::DatabaseError;

/// Returns a random string of lowercase letters and digits
pub fn random_string(length: usize) -> String {
    let mut rng = thread_rng();

    std::iter::repeat(())
        .map(|_| rng.sample(Alphanumeric) as char)
        .map(|c| c.to_ascii_lowercase())
        .take(length)
        .collect()
}

/// Runs a database operation, giving up after `limit`.
///
/// Dropping the operation rolls back any transaction it had open,
/// so a timeout never leaves a partial write behind.
pub async fn with_timeout<T, F>(limit: Duration, operation: F) -> Result<T, DatabaseError>
where
    F: Future<Output = Result<T, DatabaseError>>,
{
    tokio::time::timeout(limit, operation)
        .await
        .map_err(|_| DatabaseError::Unavailable(format!("no answer within {:?}", limit)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_strings_are_lowercase_alphanumeric() {
        let value = random_string(64);

        assert_eq!(value.len(), 64);
        assert!(value
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[tokio::test]
    async fn times_out_slow_operations() {
        let result: Result<(), _> = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(DatabaseError::Unavailable(_))));
    }
}
