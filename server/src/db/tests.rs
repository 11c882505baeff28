//! Database Integration Tests
//!
//! Each test gets a fresh database with migrations applied.

#[cfg(test)]
mod postgres_tests {
    use super::super::*;
    use sqlx::PgPool;
    use uuid::Uuid;

    fn profile(name: &str) -> ProfileFields {
        ProfileFields {
            full_name: name.to_string(),
            bio: "Learning every day".to_string(),
            native_language: "english".to_string(),
            learning_language: "spanish".to_string(),
            location: "Lisbon".to_string(),
            profile_pic: None,
        }
    }

    // ========================================================================
    // User Tests
    // ========================================================================

    #[sqlx::test]
    async fn test_create_and_find_user(pool: PgPool) {
        let user = create_user(&pool, "Ana@Example.com", "Ana", "hash", "pic.png")
            .await
            .expect("Failed to create user");

        assert_eq!(user.email, "ana@example.com");
        assert_eq!(user.full_name, "Ana");
        assert_eq!(user.profile_pic, "pic.png");
        assert!(!user.is_onboarded);

        let found = find_user_by_id(&pool, user.id)
            .await
            .expect("Query failed")
            .expect("User not found");
        assert_eq!(found.id, user.id);

        let found = find_user_by_email(&pool, "ANA@example.com")
            .await
            .expect("Query failed")
            .expect("User not found");
        assert_eq!(found.id, user.id);

        assert!(email_exists(&pool, "ana@EXAMPLE.com").await.unwrap());
        assert!(!email_exists(&pool, "bob@example.com").await.unwrap());
        assert!(user_exists(&pool, user.id).await.unwrap());
        assert!(!user_exists(&pool, Uuid::now_v7()).await.unwrap());
    }

    #[sqlx::test]
    async fn test_email_uniqueness(pool: PgPool) {
        create_user(&pool, "dup@example.com", "One", "hash", "")
            .await
            .expect("Failed to create first user");

        let result = create_user(&pool, "DUP@example.com", "Two", "hash", "").await;
        assert!(result.is_err(), "Should fail on duplicate email");
    }

    #[sqlx::test]
    async fn test_complete_onboarding(pool: PgPool) {
        let user = create_user(&pool, "onboard@example.com", "Temp", "hash", "old.png")
            .await
            .unwrap();

        let updated = complete_onboarding(&pool, user.id, &profile("Maria"))
            .await
            .unwrap()
            .expect("User should exist");

        assert!(updated.is_onboarded);
        assert_eq!(updated.full_name, "Maria");
        assert_eq!(updated.native_language, "english");
        assert_eq!(updated.learning_language, "spanish");
        assert_eq!(updated.location, "Lisbon");
        // No avatar supplied keeps the existing one
        assert_eq!(updated.profile_pic, "old.png");

        let mut with_pic = profile("Maria");
        with_pic.profile_pic = Some("new.png".to_string());
        let updated = complete_onboarding(&pool, user.id, &with_pic)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.profile_pic, "new.png");
    }

    #[sqlx::test]
    async fn test_complete_onboarding_missing_user(pool: PgPool) {
        let result = complete_onboarding(&pool, Uuid::now_v7(), &profile("Ghost"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    // ========================================================================
    // Friend Set Tests
    // ========================================================================

    #[sqlx::test]
    async fn test_friend_set_queries(pool: PgPool) {
        let a = create_user(&pool, "a@example.com", "Alice", "hash", "")
            .await
            .unwrap();
        let b = create_user(&pool, "b@example.com", "Bruno", "hash", "")
            .await
            .unwrap();

        assert!(list_friend_ids(&pool, a.id).await.unwrap().is_empty());
        assert!(!are_friends(&pool, a.id, b.id).await.unwrap());

        sqlx::query("INSERT INTO user_friends (user_id, friend_id) VALUES ($1, $2), ($2, $1)")
            .bind(a.id)
            .bind(b.id)
            .execute(&pool)
            .await
            .unwrap();

        assert_eq!(list_friend_ids(&pool, a.id).await.unwrap(), vec![b.id]);
        assert!(are_friends(&pool, b.id, a.id).await.unwrap());

        let friends = list_friends(&pool, a.id).await.unwrap();
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].id, b.id);
        assert_eq!(friends[0].full_name, "Bruno");
    }

    #[sqlx::test]
    async fn test_friend_set_rejects_self(pool: PgPool) {
        let a = create_user(&pool, "self@example.com", "Self", "hash", "")
            .await
            .unwrap();

        let result = sqlx::query("INSERT INTO user_friends (user_id, friend_id) VALUES ($1, $1)")
            .bind(a.id)
            .execute(&pool)
            .await;
        assert!(result.is_err(), "Self-friendship must violate the check constraint");
    }
}
