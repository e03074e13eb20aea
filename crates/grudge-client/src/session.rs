//! Session token persistence, stored next to the mirror collections in the
//! same key/value backend.

use anyhow::Result;

use grudge_mirror::storage::LocalStorage;

pub const SESSION_KEY: &str = "grudge_session";

pub fn save_token(storage: &dyn LocalStorage, token: &str) -> Result<()> {
    storage.write(SESSION_KEY, token)
}

pub fn load_token(storage: &dyn LocalStorage) -> Result<Option<String>> {
    storage.read(SESSION_KEY)
}

pub fn clear_token(storage: &dyn LocalStorage) -> Result<()> {
    storage.remove(SESSION_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grudge_mirror::storage::MemoryStorage;

    #[test]
    fn token_round_trip_and_clear() {
        let storage = MemoryStorage::new();
        assert_eq!(load_token(&storage).unwrap(), None);

        save_token(&storage, "jwt-goes-here").unwrap();
        assert_eq!(load_token(&storage).unwrap().as_deref(), Some("jwt-goes-here"));

        clear_token(&storage).unwrap();
        assert_eq!(load_token(&storage).unwrap(), None);
    }
}
