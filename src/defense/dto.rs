use serde::Deserialize;
use time::{macros::time, Date, Time};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ProjectTypeCreate {
    pub name: String,
    pub description: Option<String>,
}

fn default_first_slot_time() -> Time {
    time!(10:00)
}

fn default_max_slots() -> i32 {
    10
}

#[derive(Debug, Deserialize)]
pub struct DefenseDayCreate {
    pub date: Date,
    #[serde(default = "default_max_slots")]
    pub max_slots: i32,
    #[serde(default = "default_first_slot_time")]
    pub first_slot_time: Time,
}

fn default_capacity() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct SlotCreate {
    pub defense_day_id: Uuid,
    pub slot_index: i32,
    pub project_type_id: Uuid,
    pub title: String,
    pub location: Option<String>,
    #[serde(default = "default_capacity")]
    pub capacity: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct SlotFilter {
    pub date: Option<Date>,
    pub project_type_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct RegistrationCreate {
    pub slot_id: Uuid,
}
