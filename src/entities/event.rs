//! Event entity - Calendar entries shown on the dashboard agenda.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle state of an event.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(12))")]
pub enum EventStatus {
    /// Not yet happened or acted on
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Done
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Called off
    #[sea_orm(string_value = "canceled")]
    Canceled,
}

/// Importance used to order reminders.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(12))")]
pub enum EventImportance {
    /// Low importance
    #[sea_orm(string_value = "low")]
    Low,
    /// Default importance
    #[sea_orm(string_value = "medium")]
    Medium,
    /// High importance
    #[sea_orm(string_value = "high")]
    High,
    /// Critical importance
    #[sea_orm(string_value = "critical")]
    Critical,
}

/// Event database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "events")]
pub struct Model {
    /// Unique identifier for the event
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of this event
    pub owner_id: i64,
    /// Event title
    pub title: String,
    /// Who created the event; defaults to the owner's display name
    pub creator_name: String,
    /// When the event starts
    pub starts_at: DateTimeUtc,
    /// When the event ends; must not precede `starts_at`
    pub ends_at: Option<DateTimeUtc>,
    /// Optional free-form description
    pub description: String,
    /// Optional location
    pub location: String,
    /// Hex color used by the calendar UI
    pub color: String,
    /// Lifecycle state
    pub status: EventStatus,
    /// Importance level
    pub importance: EventImportance,
    /// Minutes before `starts_at` to fire a reminder
    pub reminder_minutes_before: i32,
    /// Whether the event spans the whole day
    pub all_day: bool,
    /// When the record was created
    pub created_at: DateTimeUtc,
    /// When the record was last modified
    pub updated_at: DateTimeUtc,
}

/// Event has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
