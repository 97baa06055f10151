use chrono::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{post_key, user_key, username_key, POST_PREFIX};
use crate::core::errors::ApiError;
use crate::core::helpers::{hash_password, is_valid_username, now, validate_uuid};
use crate::models::{Identity, Post, Role, User};
use crate::store::{Store, StoreError, StoreExt};

pub fn find_user_by_id(store: &dyn Store, id: &str) -> Result<Option<User>, StoreError> {
    if !validate_uuid(id) {
        return Ok(None);
    }
    store.get_json::<User>(&user_key(id))
}

pub fn find_user_by_username(store: &dyn Store, username: &str) -> Result<Option<User>, StoreError> {
    if !is_valid_username(username) {
        return Ok(None);
    }
    match store.get_json::<String>(&username_key(username))? {
        Some(id) => find_user_by_id(store, &id),
        None => Ok(None),
    }
}

/// Creates a user with a freshly hashed password.
///
/// Uniqueness is claimed through the username index before the user document is
/// written, so two concurrent registrations of one name cannot both succeed.
pub fn create_user(store: &dyn Store, username: &str, password: &str) -> Result<User, ApiError> {
    let user = User {
        id: Uuid::new_v4().to_string(),
        username: username.to_string(),
        password_hash: hash_password(password)?,
        description: String::new(),
        role: Role::Standard,
        join_date: now(),
        last_login: None,
    };

    let index_key = username_key(username);
    if !store.insert_json(&index_key, &user.id)? {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }

    if let Err(err) = store.set_json(&user_key(&user.id), &user) {
        // release the name so the user can retry
        let _ = store.delete(&index_key);
        return Err(err.into());
    }

    debug!(user_id = %user.id, username = %user.username, "user created");
    Ok(user)
}

/// Writes an existing user back. Returns `false` if the user vanished meanwhile.
pub fn save_user(store: &dyn Store, user: &User) -> Result<bool, StoreError> {
    store.replace_json(&user_key(&user.id), user)
}

pub fn set_role(store: &dyn Store, username: &str, role: Role) -> Result<User, ApiError> {
    let mut user = find_user_by_username(store, username)?
        .ok_or_else(|| ApiError::not_found("User"))?;
    user.role = role;
    if !save_user(store, &user)? {
        return Err(ApiError::not_found("User"));
    }
    info!(username = %user.username, role = ?role, "role changed");
    Ok(user)
}

/// All posts, optionally restricted to one author, newest first.
pub fn list_posts(store: &dyn Store, username: Option<&str>) -> Result<Vec<Post>, StoreError> {
    let mut posts = Vec::new();
    for key in store.get_keys(POST_PREFIX)? {
        // a post deleted between listing and reading is simply skipped
        if let Some(post) = store.get_json::<Post>(&key)? {
            if username.map_or(true, |name| post.username == name) {
                posts.push(post);
            }
        }
    }
    posts.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    Ok(posts)
}

pub fn insert_post(store: &dyn Store, post: &Post) -> Result<(), ApiError> {
    if !store.insert_json(&post_key(&post.id), post)? {
        return Err(ApiError::Internal(format!("post id collision: {}", post.id)));
    }
    Ok(())
}

/// Seeds a few demo accounts and posts. Safe to call repeatedly.
pub fn seed_demo_data(store: &dyn Store) -> Result<(), ApiError> {
    let demo: [(&str, &str, &[&str]); 3] = [
        ("test", "Test user bio", &["This is my first post!"]),
        (
            "alice",
            "Hello, I'm Alice!",
            &[
                "Welcome to my board! Excited to share thoughts here.",
                "Just finished an amazing project. Feeling productive today!",
            ],
        ),
        (
            "bob",
            "Bob's corner of the internet",
            &["Hey everyone! Just joined, looking forward to connecting with you all."],
        ),
    ];

    for (username, description, contents) in demo {
        if find_user_by_username(store, username)?.is_some() {
            continue;
        }

        let mut user = create_user(store, username, username)?;
        user.description = description.to_string();
        save_user(store, &user)?;

        let owner = Identity::from(&user);
        let base = now();
        for (offset, content) in contents.iter().enumerate() {
            let post = Post::new(&owner, content.to_string(), base + Duration::seconds(offset as i64));
            insert_post(store, &post)?;
        }
        info!(username, posts = contents.len(), "seeded demo user");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn usernames_are_unique_and_case_sensitive() {
        let store = MemoryStore::new();
        create_user(&store, "alice", "pw").unwrap();
        assert!(matches!(
            create_user(&store, "alice", "other"),
            Err(ApiError::Conflict(_))
        ));
        assert!(create_user(&store, "Alice", "pw").is_ok());
    }

    #[test]
    fn lookup_by_username_and_id() {
        let store = MemoryStore::new();
        let user = create_user(&store, "alice", "pw").unwrap();

        let by_name = find_user_by_username(&store, "alice").unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        let by_id = find_user_by_id(&store, &user.id).unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        assert!(find_user_by_username(&store, "ghost").unwrap().is_none());
        assert!(find_user_by_username(&store, "../../x").unwrap().is_none());
        assert!(find_user_by_id(&store, "not-a-uuid").unwrap().is_none());
    }

    #[test]
    fn stored_credential_is_not_plaintext() {
        let store = MemoryStore::new();
        let user = create_user(&store, "alice", "secret1").unwrap();
        let stored = find_user_by_id(&store, &user.id).unwrap().unwrap();
        assert_ne!(stored.password_hash, "secret1");
    }

    #[test]
    fn list_posts_is_newest_first_and_filters_by_username() {
        let store = MemoryStore::new();
        let alice = Identity::from(&create_user(&store, "alice", "pw").unwrap());
        let bob = Identity::from(&create_user(&store, "bob", "pw").unwrap());

        let t0 = now();
        let first = Post::new(&alice, "first".into(), t0);
        let second = Post::new(&bob, "second".into(), t0 + Duration::seconds(1));
        let third = Post::new(&alice, "third".into(), t0 + Duration::seconds(2));
        for post in [&first, &second, &third] {
            insert_post(&store, post).unwrap();
        }

        let all: Vec<String> = list_posts(&store, None)
            .unwrap()
            .into_iter()
            .map(|p| p.content)
            .collect();
        assert_eq!(all, vec!["third", "second", "first"]);

        let alices: Vec<String> = list_posts(&store, Some("alice"))
            .unwrap()
            .into_iter()
            .map(|p| p.content)
            .collect();
        assert_eq!(alices, vec!["third", "first"]);
        assert!(list_posts(&store, Some("carol")).unwrap().is_empty());
    }

    #[test]
    fn set_role_promotes_existing_user() {
        let store = MemoryStore::new();
        create_user(&store, "alice", "pw").unwrap();
        let user = set_role(&store, "alice", Role::Admin).unwrap();
        assert_eq!(user.role, Role::Admin);
        let reloaded = find_user_by_username(&store, "alice").unwrap().unwrap();
        assert_eq!(reloaded.role, Role::Admin);

        assert!(matches!(
            set_role(&store, "ghost", Role::Admin),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn seeding_is_idempotent() {
        let store = MemoryStore::new();
        seed_demo_data(&store).unwrap();
        let count = list_posts(&store, None).unwrap().len();
        seed_demo_data(&store).unwrap();
        assert_eq!(list_posts(&store, None).unwrap().len(), count);
        assert_eq!(count, 4);
        assert!(find_user_by_username(&store, "bob").unwrap().is_some());
    }
}
