use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::User;

#[derive(Debug, Deserialize)]
pub struct UserCreate {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub isu_number: Option<i32>,
    pub tg_nickname: Option<String>,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub isu_number: Option<i32>,
    pub tg_nickname: Option<String>,
}

/// Public view of a user, without the password hash.
#[derive(Debug, Serialize)]
pub struct UserFull {
    pub id: Uuid,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub isu_number: Option<i32>,
    pub tg_nickname: Option<String>,
    pub role: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for UserFull {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name,
            middle_name: u.middle_name,
            last_name: u.last_name,
            email: u.email,
            isu_number: u.isu_number,
            tg_nickname: u.tg_nickname,
            role: u.role,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}
