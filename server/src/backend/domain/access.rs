//! Role-based access rules.
//!
//! Admins may do everything. Managers may do everything except manage users
//! and import data. Workers only see and change records tied to the rabbits
//! listed in their `assignedRabbits`, plus the tasks assigned to them.

use anyhow::Result;
use shared::{BreedingRecord, HealthRecord, Rabbit, Task, User, UserRole};

use super::errors::DomainError;

fn is_staff(user: &User) -> bool {
    matches!(user.role, UserRole::Admin | UserRole::Manager)
}

/// Workers are limited to their assignments
pub fn is_restricted(user: &User) -> bool {
    user.role == UserRole::Worker
}

pub fn can_manage_users(user: &User) -> bool {
    user.role == UserRole::Admin
}

pub fn can_import(user: &User) -> bool {
    user.role == UserRole::Admin
}

pub fn can_export(user: &User) -> bool {
    is_staff(user)
}

pub fn can_manage_feed_inventory(user: &User) -> bool {
    is_staff(user)
}

pub fn can_create_tasks(user: &User) -> bool {
    is_staff(user)
}

pub fn can_view_activities(user: &User) -> bool {
    is_staff(user)
}

pub fn can_see_rabbit_tag(user: &User, tag_id: &str) -> bool {
    !is_restricted(user) || user.is_assigned(tag_id)
}

pub fn can_see_rabbit(user: &User, rabbit: &Rabbit) -> bool {
    can_see_rabbit_tag(user, &rabbit.tag_id)
}

/// Visible when either parent is assigned
pub fn can_see_breeding(user: &User, record: &BreedingRecord) -> bool {
    !is_restricted(user) || user.is_assigned(&record.male_id) || user.is_assigned(&record.female_id)
}

/// Workers may only record a breeding between two rabbits they look after
pub fn can_record_breeding(user: &User, male_id: &str, female_id: &str) -> bool {
    !is_restricted(user) || (user.is_assigned(male_id) && user.is_assigned(female_id))
}

pub fn can_see_health(user: &User, record: &HealthRecord) -> bool {
    can_see_rabbit_tag(user, &record.rabbit_id)
}

pub fn can_see_task(user: &User, task: &Task) -> bool {
    !is_restricted(user) || task.assigned_to == Some(user.id)
}

/// Turn a rule outcome into a `Forbidden` error
pub fn ensure(allowed: bool, message: &str) -> Result<()> {
    if allowed {
        Ok(())
    } else {
        Err(DomainError::Forbidden(message.to_string()).into())
    }
}
