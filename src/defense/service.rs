use sqlx::PgPool;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time};
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;

use super::dto::SlotCreate;
use super::repo::{self, DefenseRegistration, DefenseSlot};

const SLOT_MINUTES: i64 = 30;

/// Start and end of a slot derived from the day's first slot time. Slots are
/// back to back, thirty minutes each.
pub fn slot_times(date: Date, first_slot_time: Time, slot_index: i32) -> (OffsetDateTime, OffsetDateTime) {
    let first = PrimitiveDateTime::new(date, first_slot_time).assume_utc();
    let start = first + Duration::minutes(SLOT_MINUTES * i64::from(slot_index));
    (start, start + Duration::minutes(SLOT_MINUTES))
}

/// A slot index is valid when it falls inside [0, max_slots).
fn check_slot_index(max_slots: i32, slot_index: i32) -> Result<(), ApiError> {
    if slot_index < 0 || slot_index >= max_slots {
        return Err(ApiError::Validation(format!(
            "slot_index must be between 0 and {}",
            max_slots - 1
        )));
    }
    Ok(())
}

/// Registration rules, separated from the transaction plumbing: a user
/// registers at most once per slot, and a slot never exceeds its capacity.
fn check_registration(already_registered: bool, taken: i64, capacity: i32) -> Result<(), ApiError> {
    if already_registered {
        return Err(ApiError::conflict("already registered for this slot"));
    }
    if taken >= i64::from(capacity) {
        return Err(ApiError::conflict("slot is full"));
    }
    Ok(())
}

pub async fn create_slot(db: &PgPool, data: &SlotCreate) -> Result<DefenseSlot, ApiError> {
    repo::find_project_type(db, data.project_type_id)
        .await?
        .ok_or_else(|| ApiError::not_found("project type not found"))?;

    let day = repo::find_day(db, data.defense_day_id)
        .await?
        .ok_or_else(|| ApiError::not_found("defense day not found"))?;

    check_slot_index(day.max_slots, data.slot_index)?;
    if data.capacity < 1 {
        return Err(ApiError::Validation("capacity must be at least 1".into()));
    }

    if repo::find_slot_by_day_and_index(db, day.id, data.slot_index)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict("slot index already taken for this day"));
    }

    let (start_at, end_at) = slot_times(day.date, day.first_slot_time, data.slot_index);

    let slot = repo::create_slot(
        db,
        day.id,
        data.slot_index,
        data.project_type_id,
        &data.title,
        start_at,
        end_at,
        data.location.as_deref(),
        data.capacity,
    )
    .await?;

    info!(slot_id = %slot.id, day_id = %day.id, index = slot.slot_index, "defense slot created");
    Ok(slot)
}

/// Register a user for a slot. The slot row is locked for the whole
/// transaction so the capacity check cannot race with a concurrent insert;
/// the unique (slot_id, user_id) constraint backs up the duplicate check.
pub async fn register(
    db: &PgPool,
    user_id: Uuid,
    slot_id: Uuid,
) -> Result<DefenseRegistration, ApiError> {
    let mut tx = db.begin().await?;

    let slot = repo::lock_slot(&mut tx, slot_id)
        .await?
        .ok_or_else(|| ApiError::not_found("defense slot not found"))?;

    let already_registered = repo::registration_exists(&mut tx, slot_id, user_id).await?;
    let taken = repo::count_registrations(&mut tx, slot_id).await?;
    check_registration(already_registered, taken, slot.capacity)?;

    let registration = repo::insert_registration(&mut tx, slot_id, user_id).await?;
    tx.commit().await?;

    info!(registration_id = %registration.id, slot_id = %slot_id, user_id = %user_id, "registered for defense slot");
    Ok(registration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, time};

    #[test]
    fn first_slot_starts_at_the_day_start() {
        let (start, end) = slot_times(date!(2025 - 06 - 10), time!(10:00), 0);
        assert_eq!(start, PrimitiveDateTime::new(date!(2025 - 06 - 10), time!(10:00)).assume_utc());
        assert_eq!(end - start, Duration::minutes(30));
    }

    #[test]
    fn later_slots_are_offset_by_half_hours() {
        let (start, end) = slot_times(date!(2025 - 06 - 10), time!(10:00), 2);
        assert_eq!(start, PrimitiveDateTime::new(date!(2025 - 06 - 10), time!(11:00)).assume_utc());
        assert_eq!(end, PrimitiveDateTime::new(date!(2025 - 06 - 10), time!(11:30)).assume_utc());
    }

    #[test]
    fn slot_times_cross_into_the_afternoon() {
        let (start, _) = slot_times(date!(2025 - 06 - 10), time!(11:30), 5);
        assert_eq!(start, PrimitiveDateTime::new(date!(2025 - 06 - 10), time!(14:00)).assume_utc());
    }

    #[test]
    fn slot_index_must_fall_within_the_day() {
        assert!(check_slot_index(10, 0).is_ok());
        assert!(check_slot_index(10, 9).is_ok());
        assert!(matches!(
            check_slot_index(10, 10),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            check_slot_index(10, -1),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn third_registration_into_a_two_seat_slot_is_rejected() {
        assert!(check_registration(false, 0, 2).is_ok());
        assert!(check_registration(false, 1, 2).is_ok());
        let err = check_registration(false, 2, 2).expect_err("slot is full");
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(err.to_string(), "slot is full");
    }

    #[test]
    fn duplicate_registration_is_rejected_before_the_capacity_check() {
        let err = check_registration(true, 0, 2).expect_err("duplicate");
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(err.to_string(), "already registered for this slot");
    }
}
