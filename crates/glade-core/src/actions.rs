//! Non-movement action application.
//!
//! Actions run strictly after movement, in `entity_id` order, against the
//! post-move world. Each submitted action yields exactly one
//! [`ActionRecord`]; contention (a depleted object) is reported per entity,
//! never treated as a server error.
//!
//! Object counters live in string-encoded state fields
//! (`"berry_count" -> "3"`). Decoded values are cached for the duration of
//! the action phase so sequential collectors pay the parse cost once and
//! later actors see depleted state.

use std::collections::BTreeMap;

use glade_types::{
    ActionRecord, EntityId, Intent, IntentKind, ObjectChange, ObjectId, Utterance,
};
use glade_world::World;
use tracing::{debug, warn};

/// Everything the action phase produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOutcome {
    /// One record per submitted non-movement action, in `entity_id` order.
    pub records: Vec<ActionRecord>,
    /// Object state changes, in application order.
    pub object_changes: Vec<ObjectChange>,
    /// Utterances spoken this tick, surfaced in next tick's observations.
    pub utterances: Vec<Utterance>,
}

/// Decoded object counters, keyed by `(object_id, field)`.
type CountCache = BTreeMap<(ObjectId, String), u32>;

/// Apply every non-movement intent to the world.
///
/// `intents` is the drained queue for the tick; movement intents are
/// ignored here (the resolver already handled them). Iteration order over
/// the map is `entity_id` order, which is the tie-break for sequential
/// collection from a shared object.
pub fn apply_actions(world: &mut World, intents: &BTreeMap<EntityId, Intent>) -> ActionOutcome {
    let mut outcome = ActionOutcome::default();
    let mut counts: CountCache = CountCache::new();

    for (entity_id, intent) in intents {
        if world.get_entity(entity_id).is_none() {
            // Validated at submission; a vanished entity simply waits.
            continue;
        }
        match intent {
            Intent::Move { .. } => {}
            Intent::Collect {
                object_id,
                item_type,
                quantity,
            } => {
                apply_collect(
                    world,
                    &mut counts,
                    &mut outcome,
                    entity_id,
                    object_id,
                    item_type,
                    *quantity,
                );
            }
            Intent::Eat {
                item_type,
                quantity,
            } => apply_eat(world, &mut outcome, entity_id, item_type, *quantity),
            Intent::Say { text, channel } => {
                apply_say(world, &mut outcome, entity_id, text, channel);
            }
            Intent::Pickup { .. } | Intent::Use { .. } => {
                outcome.records.push(ActionRecord {
                    entity_id: entity_id.clone(),
                    action_type: intent.kind(),
                    success: false,
                    details: Some(String::from("not_implemented")),
                });
            }
            Intent::Wait => {
                outcome.records.push(ActionRecord {
                    entity_id: entity_id.clone(),
                    action_type: IntentKind::Wait,
                    success: true,
                    details: None,
                });
            }
        }
    }

    outcome
}

/// Transfer items from a co-located object into the actor's inventory.
fn apply_collect(
    world: &mut World,
    counts: &mut CountCache,
    outcome: &mut ActionOutcome,
    entity_id: &EntityId,
    object_id: &ObjectId,
    item_type: &str,
    quantity: u32,
) {
    let field = format!("{item_type}_count");

    let failure = |detail: &str| ActionRecord {
        entity_id: entity_id.clone(),
        action_type: IntentKind::Collect,
        success: false,
        details: Some(detail.to_owned()),
    };

    let Some(actor_position) = world.get_entity(entity_id).map(|e| e.position) else {
        outcome.records.push(failure("unknown_entity"));
        return;
    };
    let Some(object) = world.get_object(object_id) else {
        outcome.records.push(failure("unknown_object"));
        return;
    };
    if object.position != actor_position {
        outcome.records.push(failure("not_colocated"));
        return;
    }

    let cache_key = (object_id.clone(), field.clone());
    let available = match counts.get(&cache_key) {
        Some(count) => *count,
        None => {
            let Some(raw) = object.state.get(&field) else {
                outcome.records.push(failure("unknown_item"));
                return;
            };
            let Ok(parsed) = raw.parse::<u32>() else {
                warn!(object_id = %object_id, field, raw, "Unparseable object counter");
                outcome.records.push(failure("unknown_item"));
                return;
            };
            counts.insert(cache_key.clone(), parsed);
            parsed
        }
    };

    let Some(remaining) = available.checked_sub(quantity) else {
        outcome.records.push(failure("undersupplied"));
        return;
    };

    let change = match world.update_object_field(object_id, &field, remaining.to_string()) {
        Ok(change) => change,
        Err(err) => {
            warn!(object_id = %object_id, error = %err, "Collect failed to update object");
            outcome.records.push(failure("unknown_object"));
            return;
        }
    };
    if let Err(err) = world.inventory_add(entity_id, item_type, quantity) {
        // Roll the counter back; the transfer must be all-or-nothing.
        let _ = world.update_object_field(object_id, &field, available.to_string());
        warn!(entity_id = %entity_id, error = %err, "Collect failed to credit inventory");
        outcome.records.push(failure("inventory_full"));
        return;
    }

    counts.insert(cache_key, remaining);
    debug!(
        entity_id = %entity_id,
        object_id = %object_id,
        item_type,
        quantity,
        remaining,
        "Collected"
    );
    outcome.object_changes.push(change);
    outcome.records.push(ActionRecord {
        entity_id: entity_id.clone(),
        action_type: IntentKind::Collect,
        success: true,
        details: None,
    });
}

/// Consume items from the actor's own inventory.
fn apply_eat(
    world: &mut World,
    outcome: &mut ActionOutcome,
    entity_id: &EntityId,
    item_type: &str,
    quantity: u32,
) {
    match world.inventory_remove(entity_id, item_type, quantity) {
        Ok(_) => {
            debug!(entity_id = %entity_id, item_type, quantity, "Ate");
            outcome.records.push(ActionRecord {
                entity_id: entity_id.clone(),
                action_type: IntentKind::Eat,
                success: true,
                details: None,
            });
        }
        Err(_) => {
            outcome.records.push(ActionRecord {
                entity_id: entity_id.clone(),
                action_type: IntentKind::Eat,
                success: false,
                details: Some(String::from("undersupplied")),
            });
        }
    }
}

/// Record an utterance at the speaker's post-move position.
fn apply_say(
    world: &World,
    outcome: &mut ActionOutcome,
    entity_id: &EntityId,
    text: &str,
    channel: &str,
) {
    let Some(position) = world.get_entity(entity_id).map(|e| e.position) else {
        return;
    };
    outcome.utterances.push(Utterance {
        entity_id: entity_id.clone(),
        position,
        text: text.to_owned(),
        channel: channel.to_owned(),
    });
    outcome.records.push(ActionRecord {
        entity_id: entity_id.clone(),
        action_type: IntentKind::Say,
        success: true,
        details: None,
    });
}
