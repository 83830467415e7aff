use sqlx::SqliteConnection;


/// Records a session id; repeats are ignored since ids only ever grow.
pub async fn insert_session(conn: &mut SqliteConnection, id: u64) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO sessions (id) VALUES (?)")
        .bind(id as i64)
        .execute(conn)
        .await?;
    Ok(())
}


pub async fn count_sessions(conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(conn)
        .await?;
    Ok(count as u64)
}


pub async fn session_exists(conn: &mut SqliteConnection, id: u64) -> Result<bool, sqlx::Error> {
    let row: Option<i64> = sqlx::query_scalar("SELECT id FROM sessions WHERE id = ?")
        .bind(id as i64)
        .fetch_optional(conn)
        .await?;
    Ok(row.is_some())
}
