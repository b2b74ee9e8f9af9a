use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    notify::PromoIssued,
    services::promo_service,
    state::AppState,
};

pub const BIRTHDAY_DISCOUNT_PERCENT: i32 = 20;

#[derive(FromRow)]
struct BirthdayRow {
    id: Uuid,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
}

/// Birthday codes are good for the rest of the day plus one hour of grace.
pub fn birthday_expiry(today: NaiveDate) -> Option<DateTime<Utc>> {
    let tomorrow = today.succ_opt()?;
    let one_am = NaiveTime::from_hms_opt(1, 0, 0)?;
    Some(tomorrow.and_time(one_am).and_utc())
}

/// Issues a private birthday code to every customer born on `today`'s month
/// and day. Customers who already hold today's code are skipped, so a second
/// run on the same day issues nothing.
pub async fn issue_birthday_promos(state: &AppState, today: NaiveDate) -> AppResult<usize> {
    let expiry = birthday_expiry(today)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("no day after {today}")))?;

    let users = sqlx::query_as::<_, BirthdayRow>(
        r#"
        SELECT u.id, u.email, u.first_name, u.last_name
        FROM users u
        WHERE u.birthday IS NOT NULL
          AND EXTRACT(MONTH FROM u.birthday) = $1
          AND EXTRACT(DAY FROM u.birthday) = $2
          AND NOT EXISTS (
              SELECT 1 FROM promo_codes pc
              WHERE pc.user_id = u.id AND pc.expiry_date = $3
          )
        "#,
    )
    .bind(today.month() as i32)
    .bind(today.day() as i32)
    .bind(expiry)
    .fetch_all(&state.pool)
    .await?;

    let mut issued = 0;
    for user in users {
        let promo = promo_service::insert_generated(
            &state.orm,
            Some(user.id),
            BIRTHDAY_DISCOUNT_PERCENT,
            expiry,
        )
        .await?;
        issued += 1;

        let customer_name = [user.first_name.as_deref(), user.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        state
            .notifiers
            .promo_issued(&PromoIssued {
                email: user.email,
                customer_name,
                code: promo.code,
                discount_percent: promo.discount_percent,
                expiry_date: expiry,
            })
            .await;
    }

    tracing::info!(%today, issued, "birthday promos issued");
    Ok(issued)
}

/// Runs the birthday job once at startup and then every 24 hours.
pub fn spawn_birthday_job(state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(24 * 60 * 60));
        loop {
            interval.tick().await;
            let today = Utc::now().date_naive();
            if let Err(err) = issue_birthday_promos(&state, today).await {
                tracing::error!(error = %err, %today, "birthday promo job failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_at_one_am_the_next_day() {
        let today = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let expiry = birthday_expiry(today).unwrap();
        assert_eq!(expiry.to_rfc3339(), "2025-01-01T01:00:00+00:00");
    }
}
