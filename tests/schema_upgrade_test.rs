use careers_backend::database::{pool, schema};

async fn v1_database() -> sqlx::SqlitePool {
    let db = pool::connect("sqlite::memory:").await.expect("pool");
    schema::init_up_to(&db, 1).await.expect("v1 schema");
    db
}

#[tokio::test]
async fn fresh_database_lands_on_latest_version() {
    let db = pool::connect("sqlite::memory:").await.unwrap();
    schema::init(&db).await.unwrap();
    assert_eq!(schema::current_version(&db).await.unwrap(), 3);

    // Re-running is a no-op.
    schema::init(&db).await.unwrap();
    assert_eq!(schema::current_version(&db).await.unwrap(), 3);
}

#[tokio::test]
async fn v1_database_upgrades_in_place_keeping_data() {
    let db = v1_database().await;
    assert_eq!(schema::current_version(&db).await.unwrap(), 1);

    sqlx::query(
        r#"
        INSERT INTO users (name, email, role, created_at, updated_at)
        VALUES ('Old User', 'old@example.com', 'candidate', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')
        "#,
    )
    .execute(&db)
    .await
    .unwrap();
    sqlx::query(
        r#"
        INSERT INTO jobs (title, status, created_at, updated_at)
        VALUES ('Legacy Job', 'active', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')
        "#,
    )
    .execute(&db)
    .await
    .unwrap();
    sqlx::query(
        r#"
        INSERT INTO job_applications (job_id, user_id, status, score, created_at, updated_at)
        VALUES (1, 1, 'new', 0, '2024-01-02T00:00:00Z', '2024-01-02T00:00:00Z')
        "#,
    )
    .execute(&db)
    .await
    .unwrap();
    sqlx::query(
        r#"
        INSERT INTO content_items (kind, title, published, created_at, updated_at)
        VALUES ('slider', 'Old banner', 1, '2024-01-03T00:00:00Z', '2024-01-03T00:00:00Z')
        "#,
    )
    .execute(&db)
    .await
    .unwrap();

    schema::init(&db).await.unwrap();
    assert_eq!(schema::current_version(&db).await.unwrap(), 3);

    // Old rows survive and the new columns are usable.
    let (status, offer): (String, Option<String>) = sqlx::query_as(
        "SELECT status, offer_letter_url FROM job_applications WHERE id = 1",
    )
    .fetch_one(&db)
    .await
    .unwrap();
    assert_eq!(status, "new");
    assert!(offer.is_none());

    sqlx::query("UPDATE job_applications SET offer_letter_url = '/uploads/letters/x.docx' WHERE id = 1")
        .execute(&db)
        .await
        .unwrap();
    let (sort_order,): (i64,) =
        sqlx::query_as("SELECT sort_order FROM content_items WHERE id = 1")
            .fetch_one(&db)
            .await
            .unwrap();
    assert_eq!(sort_order, 0);
}

#[tokio::test]
async fn duplicate_active_applications_are_blocked_by_the_index() {
    let db = pool::connect("sqlite::memory:").await.unwrap();
    schema::init(&db).await.unwrap();

    sqlx::query(
        r#"
        INSERT INTO users (name, email, role, created_at, updated_at)
        VALUES ('Dup User', 'dup@example.com', 'candidate', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')
        "#,
    )
    .execute(&db)
    .await
    .unwrap();
    for status in ["rejected", "withdrawn", "hired"] {
        sqlx::query(
            "INSERT INTO job_applications (job_id, user_id, status, score, created_at, updated_at)
             VALUES (1, 1, ?, 0, '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
        )
        .bind(status)
        .execute(&db)
        .await
        .expect("terminal rows never collide");
    }

    sqlx::query(
        "INSERT INTO job_applications (job_id, user_id, status, score, created_at, updated_at)
         VALUES (1, 1, 'new', 0, '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
    )
    .execute(&db)
    .await
    .expect("first live row");

    let err = sqlx::query(
        "INSERT INTO job_applications (job_id, user_id, status, score, created_at, updated_at)
         VALUES (2, 1, 'reviewed', 0, '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
    )
    .execute(&db)
    .await
    .unwrap_err();
    assert!(err.to_string().contains("UNIQUE"));
}
