//! Fixtures shared by the domain service tests

use chrono::{TimeZone, Utc};
use shared::{CreateRabbitRequest, Gender, HealthStatus, RabbitStatus, User, UserRole};

pub fn user(id: i64, role: UserRole, assigned: &[&str]) -> User {
    User {
        id,
        username: format!("user{}", id),
        password: None,
        full_name: format!("User {}", id),
        role,
        is_active: true,
        created_at: None,
        last_login: None,
        assigned_rabbits: assigned.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn admin() -> User {
    user(1, UserRole::Admin, &[])
}

pub fn manager() -> User {
    user(2, UserRole::Manager, &[])
}

pub fn worker(id: i64, assigned: &[&str]) -> User {
    user(id, UserRole::Worker, assigned)
}

pub fn rabbit_request(tag: &str) -> CreateRabbitRequest {
    CreateRabbitRequest {
        tag_id: tag.to_string(),
        breed: "New Zealand White".to_string(),
        gender: Gender::Female,
        birth_date: None,
        acquired_date: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
        status: RabbitStatus::Active,
        weight: Some(3200),
        cage_number: None,
        parent_male_id: None,
        parent_female_id: None,
        notes: None,
        health_status: HealthStatus::Healthy,
    }
}
