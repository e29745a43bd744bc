use sqlx::postgres::{PgPool, PgPoolOptions};

fn table_name(schema: &Option<String>, name: &str) -> String {
    match schema {
        Some(s) => format!("{s}.{name}"),
        None => name.to_string(),
    }
}

pub async fn connect(db_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(db_url)
        .await
}

pub async fn ensure_schema(pool: &PgPool, db_schema: &Option<String>) -> Result<(), sqlx::Error> {
    if let Some(schema) = db_schema {
        let ddl = format!("CREATE SCHEMA IF NOT EXISTS {schema}");
        let _ = sqlx::query(&ddl).execute(pool).await;
    }

    let cars = table_name(db_schema, "cars");
    let users = table_name(db_schema, "users");
    let bookings = table_name(db_schema, "bookings");

    let ddls = [
        format!(
            "CREATE TABLE IF NOT EXISTS {cars} (\
             id VARCHAR(36) PRIMARY KEY,\
             brand VARCHAR(64) NOT NULL,\
             model VARCHAR(64) NOT NULL,\
             year INTEGER NOT NULL,\
             price_per_day BIGINT NOT NULL,\
             price_per_hour BIGINT NOT NULL,\
             fuel_type VARCHAR(16) NOT NULL,\
             transmission VARCHAR(16) NOT NULL,\
             seats INTEGER NOT NULL,\
             is_available INTEGER NOT NULL DEFAULT 1,\
             booking_count BIGINT NOT NULL DEFAULT 0,\
             rating DOUBLE PRECISION NOT NULL DEFAULT 0,\
             image_url VARCHAR(1024),\
             description VARCHAR(2048),\
             created_at TEXT\
             )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {users} (\
             id VARCHAR(64) PRIMARY KEY,\
             name VARCHAR(120),\
             email VARCHAR(254),\
             phone VARCHAR(32),\
             role VARCHAR(16) NOT NULL DEFAULT 'user',\
             created_at TEXT\
             )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {bookings} (\
             id VARCHAR(36) PRIMARY KEY,\
             booking_ref VARCHAR(36) NOT NULL,\
             car_id VARCHAR(36) NOT NULL,\
             user_id VARCHAR(64) NOT NULL,\
             user_name VARCHAR(120),\
             user_email VARCHAR(254),\
             user_phone VARCHAR(32),\
             booking_type VARCHAR(8) NOT NULL DEFAULT 'daily',\
             start_at TEXT NOT NULL,\
             end_at TEXT NOT NULL,\
             duration BIGINT NOT NULL,\
             total_amount BIGINT NOT NULL,\
             status VARCHAR(16) NOT NULL DEFAULT 'pending',\
             payment_status VARCHAR(16) NOT NULL DEFAULT 'pending',\
             payment_order_id VARCHAR(64),\
             payment_id VARCHAR(64),\
             pickup_location VARCHAR(254),\
             dropoff_location VARCHAR(254),\
             created_at TEXT\
             )"
        ),
        // booking_ref uniqueness backs the regenerate-on-conflict assignment.
        format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS uq_bookings_booking_ref ON {bookings}(booking_ref)"
        ),
        format!("CREATE INDEX IF NOT EXISTS idx_cars_brand ON {cars}(brand)"),
        format!("CREATE INDEX IF NOT EXISTS idx_cars_created_at ON {cars}(created_at)"),
        format!("CREATE INDEX IF NOT EXISTS idx_bookings_car ON {bookings}(car_id)"),
        format!("CREATE INDEX IF NOT EXISTS idx_bookings_user ON {bookings}(user_id)"),
        format!("CREATE INDEX IF NOT EXISTS idx_bookings_status ON {bookings}(status)"),
        format!("CREATE INDEX IF NOT EXISTS idx_bookings_created_at ON {bookings}(created_at)"),
    ];

    for ddl in ddls {
        let _ = sqlx::query(&ddl).execute(pool).await;
    }

    let _ = sqlx::query(&format!(
        "ALTER TABLE {cars} ADD COLUMN IF NOT EXISTS rating DOUBLE PRECISION DEFAULT 0"
    ))
    .execute(pool)
    .await;
    let _ = sqlx::query(&format!(
        "ALTER TABLE {cars} ADD COLUMN IF NOT EXISTS booking_count BIGINT DEFAULT 0"
    ))
    .execute(pool)
    .await;
    let _ = sqlx::query(&format!(
        "ALTER TABLE {bookings} ADD COLUMN IF NOT EXISTS pickup_location VARCHAR(254)"
    ))
    .execute(pool)
    .await;
    let _ = sqlx::query(&format!(
        "ALTER TABLE {bookings} ADD COLUMN IF NOT EXISTS dropoff_location VARCHAR(254)"
    ))
    .execute(pool)
    .await;

    Ok(())
}
