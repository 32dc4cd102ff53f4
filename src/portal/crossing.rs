//! Resident tracking and the crossing protocol.
//!
//! A body becomes resident when it overlaps a portal's trigger volume. Every frame each
//! linked portal compares the side each resident is on with the side it was on last
//! frame. A change of side teleports the body through the link once and hands it to the
//! linked portal. Otherwise the body's clone is posed on the far side.
use avian3d::prelude::*;
use bevy::prelude::*;

use super::components::Portal;
use super::components::ResidentTravelers;
use crate::actor::SlicePlanes;
use crate::actor::Teleported;
use crate::actor::Traveler;
use crate::actor::TravelerClone;
use crate::actor::teleport;
use crate::math::Side;
use crate::traits::TransformExt;

/// A traveler started overlapping a portal, or was handed to it by a crossing
#[derive(EntityEvent, Debug, Clone, Copy)]
pub struct TravelerEntered {
    pub entity: Entity,
    pub portal: Entity,
}

/// A traveler is no longer resident at a portal
#[derive(EntityEvent, Debug, Clone, Copy)]
pub struct TravelerExited {
    pub entity: Entity,
    pub portal: Entity,
}

/// Picks the (portal, traveler) pair out of a collision. Colliders on child entities
/// resolve to the body that owns them.
fn portal_and_traveler(
    colliders: [(Entity, Option<Entity>); 2],
    portals: &Query<(&Portal, &mut ResidentTravelers)>,
    travelers: &Query<(), With<Traveler>>,
) -> Option<(Entity, Entity)> {
    let [(collider1, body1), (collider2, body2)] = colliders;
    let traveler1 = body1.unwrap_or(collider1);
    let traveler2 = body2.unwrap_or(collider2);

    if portals.contains(collider1) && travelers.contains(traveler2) {
        Some((collider1, traveler2))
    } else if portals.contains(collider2) && travelers.contains(traveler1) {
        Some((collider2, traveler1))
    } else {
        None
    }
}

pub fn track_residents(
    mut commands: Commands,
    mut started: MessageReader<CollisionStart>,
    mut ended: MessageReader<CollisionEnd>,
    mut portals: Query<(&Portal, &mut ResidentTravelers)>,
    travelers: Query<(), With<Traveler>>,
) {
    for event in started.read() {
        let Some((portal_entity, traveler)) = portal_and_traveler(
            [(event.collider1, event.body1), (event.collider2, event.body2)],
            &portals,
            &travelers,
        ) else {
            continue;
        };
        let Ok((portal, mut residents)) = portals.get_mut(portal_entity) else {
            continue;
        };
        // an unlinked portal only records the overlap, linking announces it later
        if residents.insert(traveler) && portal.linked.is_some() {
            commands.trigger(TravelerEntered {
                entity: traveler,
                portal: portal_entity,
            });
        }
    }

    for event in ended.read() {
        let Some((portal_entity, traveler)) = portal_and_traveler(
            [(event.collider1, event.body1), (event.collider2, event.body2)],
            &portals,
            &travelers,
        ) else {
            continue;
        };
        if let Ok((_, mut residents)) = portals.get_mut(portal_entity)
            && residents.remove(traveler)
        {
            commands.trigger(TravelerExited {
                entity: traveler,
                portal: portal_entity,
            });
        }
    }
}

struct HandOff {
    traveler: Entity,
    from:     Entity,
    to:       Entity,
}

pub fn cross_portals(
    mut commands: Commands,
    mut portals: Query<(Entity, &Portal, &Transform, &mut ResidentTravelers)>,
    partners: Query<&Transform, With<Portal>>,
    mut travelers: Query<
        (
            &mut Transform,
            &mut Traveler,
            Option<&mut LinearVelocity>,
            Option<&mut AngularVelocity>,
        ),
        Without<Portal>,
    >,
    mut clones: Query<&mut Transform, (With<TravelerClone>, Without<Traveler>, Without<Portal>)>,
) {
    // applied after every portal has run so nobody is processed twice in a frame
    let mut hand_offs = Vec::new();

    for (entity, portal, transform, mut residents) in &mut portals {
        let Some(linked) = portal.linked else {
            continue;
        };
        let Ok(linked_transform) = partners.get(linked) else {
            continue;
        };

        let mut departed = Vec::new();
        for traveler_entity in residents.iter() {
            let Ok((mut traveler_transform, mut traveler, mut velocity, mut angular_velocity)) =
                travelers.get_mut(traveler_entity)
            else {
                departed.push(traveler_entity);
                continue;
            };

            let current = Side::of_point(traveler_transform.translation, transform);
            let previous = traveler.previous_side(entity).unwrap_or(current);
            let destination = traveler_transform.through_portal(transform, linked_transform);

            traveler.slices = SlicePlanes::across(current, transform, linked_transform);

            if traveler.should_teleport(previous, current) {
                traveler.was_teleported = true;
                teleport(
                    &mut traveler_transform,
                    destination,
                    velocity.as_deref_mut(),
                    angular_velocity.as_deref_mut(),
                    transform.rotation,
                    linked_transform.rotation,
                );
                // the body already stands at the linked portal, cut it there
                let landed = Side::of_point(traveler_transform.translation, linked_transform);
                traveler.slices = SlicePlanes::across(landed, linked_transform, transform);
                if let Some(clone) = traveler.clone
                    && let Ok(mut clone_transform) = clones.get_mut(clone)
                {
                    *clone_transform = traveler_transform.through_portal(linked_transform, transform);
                }
                commands.trigger(Teleported {
                    entity: traveler_entity,
                    from:   entity,
                    to:     linked,
                });
                traveler.forget(entity);
                departed.push(traveler_entity);
                hand_offs.push(HandOff {
                    traveler: traveler_entity,
                    from:     entity,
                    to:       linked,
                });
                continue;
            }

            traveler.was_teleported = false;
            traveler.set_previous_side(entity, current);
            if let Some(clone) = traveler.clone
                && let Ok(mut clone_transform) = clones.get_mut(clone)
            {
                *clone_transform = destination;
            }
        }

        for traveler in departed {
            residents.remove(traveler);
        }
    }

    for hand_off in hand_offs {
        if let Ok((_, _, _, mut residents)) = portals.get_mut(hand_off.to)
            && residents.insert(hand_off.traveler)
        {
            commands.trigger(TravelerEntered {
                entity: hand_off.traveler,
                portal: hand_off.to,
            });
        }
        debug!(
            "handed traveler {} from portal {} to {}",
            hand_off.traveler, hand_off.from, hand_off.to
        );
    }
}
