use acetour::{
    domain::{CreateUserRequest, UserRole},
    error::AppError,
    repository::{SqliteUserRepository, UserRepository},
};
use sqlx::SqlitePool;

#[tokio::test]
async fn test_user_crud() -> anyhow::Result<()> {
    // Create an in-memory SQLite database
    let pool = SqlitePool::connect(":memory:").await?;

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await?;

    let repo = SqliteUserRepository::new(pool.clone());

    // Test Create
    let user = repo.create(CreateUserRequest {
        email: "Admin@AceTour.com".to_string(),
        name: Some("Admin".to_string()),
        password: "secure_password123".to_string(),
        role: UserRole::Admin,
    }).await?;
    assert_eq!(user.email, "admin@acetour.com");
    assert!(user.is_admin());

    // Test Find by ID
    let found = repo.find_by_id(user.id).await?;
    assert_eq!(found.map(|u| u.id), Some(user.id));

    // Test Find by Email, which ignores case
    let found_by_email = repo.find_by_email("ADMIN@acetour.com").await?;
    assert!(found_by_email.is_some());

    // Test duplicate email
    let duplicate = repo.create(CreateUserRequest {
        email: "admin@acetour.com".to_string(),
        name: None,
        password: "another_password".to_string(),
        role: UserRole::User,
    }).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    // Test Delete
    repo.delete(user.id).await?;
    assert!(repo.find_by_id(user.id).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_password_reset() -> anyhow::Result<()> {
    use acetour::auth::AuthService;

    let pool = SqlitePool::connect(":memory:").await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    let repo = SqliteUserRepository::new(pool);

    let user = repo.create(CreateUserRequest {
        email: "ops@acetour.com".to_string(),
        name: None,
        password: "first_password".to_string(),
        role: UserRole::Admin,
    }).await?;

    let hash = repo.password_hash("ops@acetour.com").await?.expect("hash stored");
    assert!(AuthService::verify_password("first_password", &hash).await?);

    repo.set_password(user.id, "second_password").await?;
    let hash = repo.password_hash("ops@acetour.com").await?.expect("hash stored");
    assert!(AuthService::verify_password("second_password", &hash).await?);
    assert!(!AuthService::verify_password("first_password", &hash).await?);

    assert!(repo.password_hash("missing@acetour.com").await?.is_none());

    Ok(())
}
