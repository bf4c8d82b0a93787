//! Calendar event management.

use crate::clock::Clock;
use crate::entities::event::{self, EventImportance, EventStatus};
use crate::entities::Event;
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

/// Caller-supplied fields for creating or updating an event.
#[derive(Debug, Clone)]
pub struct EventInput {
    /// Title (trimmed; must not be empty)
    pub title: String,
    /// Creator display name; falls back to `default_creator` when empty
    pub creator_name: String,
    /// Start of the event
    pub starts_at: DateTime<Utc>,
    /// Optional end; must not precede the start
    pub ends_at: Option<DateTime<Utc>>,
    /// Description (trimmed; may be empty)
    pub description: String,
    /// Location (trimmed; may be empty)
    pub location: String,
    /// Hex color for the calendar UI
    pub color: String,
    /// Lifecycle state
    pub status: EventStatus,
    /// Importance level
    pub importance: EventImportance,
    /// Minutes before the start to fire a reminder
    pub reminder_minutes_before: i32,
    /// Whether the event spans the whole day
    pub all_day: bool,
}

fn clean_input(mut input: EventInput, default_creator: &str) -> Result<EventInput> {
    input.title = input.title.trim().to_string();
    input.creator_name = input.creator_name.trim().to_string();
    input.description = input.description.trim().to_string();
    input.location = input.location.trim().to_string();

    if input.title.is_empty() {
        return Err(Error::validation("title", "title cannot be empty"));
    }
    if input.reminder_minutes_before < 0 {
        return Err(Error::validation(
            "reminder_minutes_before",
            "reminder must not be negative",
        ));
    }
    if let Some(ends_at) = input.ends_at {
        if ends_at < input.starts_at {
            return Err(Error::validation("ends_at", "end cannot precede the start"));
        }
    }
    if input.creator_name.is_empty() {
        input.creator_name = default_creator.trim().to_string();
    }
    Ok(input)
}

/// Creates an event for the caller.
pub async fn create(
    db: &DatabaseConnection,
    owner_id: i64,
    input: EventInput,
    default_creator: &str,
    clock: &dyn Clock,
) -> Result<event::Model> {
    let input = clean_input(input, default_creator)?;

    let now = clock.now();
    let model = event::ActiveModel {
        owner_id: Set(owner_id),
        title: Set(input.title),
        creator_name: Set(input.creator_name),
        starts_at: Set(input.starts_at),
        ends_at: Set(input.ends_at),
        description: Set(input.description),
        location: Set(input.location),
        color: Set(input.color),
        status: Set(input.status),
        importance: Set(input.importance),
        reminder_minutes_before: Set(input.reminder_minutes_before),
        all_day: Set(input.all_day),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Applies a full update to an existing event.
pub async fn update(
    db: &DatabaseConnection,
    owner_id: i64,
    event_id: i64,
    input: EventInput,
    default_creator: &str,
    clock: &dyn Clock,
) -> Result<event::Model> {
    let input = clean_input(input, default_creator)?;

    let existing = find_owned(db, owner_id, event_id).await?;
    let mut active: event::ActiveModel = existing.into();
    active.title = Set(input.title);
    active.creator_name = Set(input.creator_name);
    active.starts_at = Set(input.starts_at);
    active.ends_at = Set(input.ends_at);
    active.description = Set(input.description);
    active.location = Set(input.location);
    active.color = Set(input.color);
    active.status = Set(input.status);
    active.importance = Set(input.importance);
    active.reminder_minutes_before = Set(input.reminder_minutes_before);
    active.all_day = Set(input.all_day);
    active.updated_at = Set(clock.now());
    active.update(db).await.map_err(Into::into)
}

/// Deletes an event, returning its id.
pub async fn delete(db: &DatabaseConnection, owner_id: i64, event_id: i64) -> Result<i64> {
    let existing = find_owned(db, owner_id, event_id).await?;
    Event::delete_by_id(existing.id).exec(db).await?;
    Ok(existing.id)
}

/// Lists the caller's events in chronological order.
pub async fn list(db: &DatabaseConnection, owner_id: i64) -> Result<Vec<event::Model>> {
    Event::find()
        .filter(event::Column::OwnerId.eq(owner_id))
        .order_by_asc(event::Column::StartsAt)
        .order_by_asc(event::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn find_owned<C>(db: &C, owner_id: i64, event_id: i64) -> Result<event::Model>
where
    C: ConnectionTrait,
{
    Event::find_by_id(event_id)
        .filter(event::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?
        .ok_or(Error::NotFound { entity: "event" })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn create_fills_creator_from_default() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = test_clock();

        let mut input = event_input("Reuniao banco", &clock);
        input.creator_name = "  ".to_string();
        let created = create(&db, OWNER, input, "maria", &clock).await?;

        assert_eq!(created.creator_name, "maria");
        assert_eq!(created.status, EventStatus::Pending);

        Ok(())
    }

    #[tokio::test]
    async fn end_cannot_precede_start() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = test_clock();

        let mut input = event_input("Reuniao", &clock);
        input.ends_at = Some(input.starts_at - chrono::Duration::hours(1));
        let result = create(&db, OWNER, input, "maria", &clock).await;

        assert!(matches!(result, Err(Error::Validation { field: "ends_at", .. })));

        Ok(())
    }

    #[tokio::test]
    async fn list_is_chronological() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = test_clock();

        let mut late = event_input("Depois", &clock);
        late.starts_at += chrono::Duration::days(2);
        create(&db, OWNER, late, "maria", &clock).await?;
        create(&db, OWNER, event_input("Antes", &clock), "maria", &clock).await?;

        let events = list(&db, OWNER).await?;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "Antes");
        assert_eq!(events[1].title, "Depois");

        Ok(())
    }

    #[tokio::test]
    async fn update_and_delete_are_owner_scoped() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = test_clock();

        let created = create(&db, OWNER, event_input("Reuniao", &clock), "maria", &clock).await?;

        let result = update(
            &db,
            OTHER_OWNER,
            created.id,
            event_input("Alterada", &clock),
            "maria",
            &clock,
        )
        .await;
        assert!(matches!(result, Err(Error::NotFound { entity: "event" })));

        let updated = update(
            &db,
            OWNER,
            created.id,
            event_input("Alterada", &clock),
            "maria",
            &clock,
        )
        .await?;
        assert_eq!(updated.title, "Alterada");

        assert!(matches!(
            delete(&db, OTHER_OWNER, created.id).await,
            Err(Error::NotFound { entity: "event" })
        ));
        assert_eq!(delete(&db, OWNER, created.id).await?, created.id);

        Ok(())
    }
}
