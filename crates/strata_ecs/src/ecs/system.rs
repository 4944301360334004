//! # Systems
//!
//! A system is a persistent, stateful behaviour bound to one signature.
//! The manager owns one instance of every declared system kind and visits
//! it once per matching entity on [`Manager::update_system`].
//!
//! Systems have no ordering between them; the caller decides which
//! `update_system` calls run and in what order.

use super::bitset::Bits;
use super::fetch::{ColumnPass, Row};
use super::manager::Manager;
use super::schema::{Schema, SignatureOf, SystemOf};

/// Per-entity behaviour over the components of `Signature`.
///
/// ```rust,ignore
/// #[derive(Default)]
/// struct Mover {
///     moved: usize,
/// }
///
/// impl System<Game> for Mover {
///     type Signature = Moving;
///     type Args = f32;
///
///     fn update(&mut self, dt: &mut f32, (pos, vel): Row<'_, Game, Moving>) {
///         for axis in 0..3 {
///             pos.0[axis] += vel.0[axis] * *dt;
///         }
///         self.moved += 1;
///     }
/// }
/// ```
pub trait System<S: Schema>: Default + 'static {
    /// Signature an entity must match to be visited.
    type Signature: SignatureOf<S>;

    /// Per-call arguments, shared by every visit of one update.
    type Args;

    /// Visits one matching entity with its components, in schema order.
    fn update(&mut self, args: &mut Self::Args, row: Row<'_, S, Self::Signature>);
}

impl<S: Schema> Manager<S> {
    /// Runs system `X` over every entity in `[0, size)` matching its
    /// signature, ascending.
    ///
    /// # Returns
    ///
    /// The number of entities visited.
    pub fn update_system<X: SystemOf<S>>(&mut self, args: &mut X::Args) -> usize {
        let mask = S::info().signature_mask(<X::Signature as SignatureOf<S>>::INDEX);
        let mut pass = ColumnPass::<S, <X::Signature as SignatureOf<S>>::Components>::begin(
            &mut self.storage,
        );

        let mut visited = 0;
        for slot in 0..self.size {
            if !self.entities.signature(slot).contains(mask) {
                continue;
            }
            let (storage, row) = pass.split(self.entities.data_index(slot));
            X::instance_mut(storage).update(args, row);
            visited += 1;
        }
        visited
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    struct Position([f32; 2]);

    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    struct Velocity([f32; 2]);

    #[allow(dead_code)]
    struct Frozen;

    #[derive(Default)]
    struct Mover {
        visits: usize,
    }

    impl System<World> for Mover {
        type Signature = Moving;
        type Args = f32;

        fn update(&mut self, dt: &mut f32, (pos, vel): Row<'_, World, Moving>) {
            pos.0[0] += vel.0[0] * *dt;
            pos.0[1] += vel.0[1] * *dt;
            self.visits += 1;
        }
    }

    #[derive(Default)]
    struct Counter;

    impl System<World> for Counter {
        type Signature = Parked;
        type Args = Vec<usize>;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        fn update(&mut self, seen: &mut Vec<usize>, (pos,): Row<'_, World, Parked>) {
            seen.push(pos.0[0] as usize);
        }
    }

    crate::schema! {
        struct World {
            components { position: Position, velocity: Velocity }
            tags { Frozen }
            signatures {
                Moving = [Position, Velocity] + [];
                Parked = [Position] + [Frozen];
            }
            systems { mover: Mover, counter: Counter }
        }
    }

    fn world() -> Manager<World> {
        let mut manager = Manager::<World>::new().unwrap();
        for i in 0..4u8 {
            let slot = manager.create_entity().unwrap();
            manager.add_component(slot, Position([f32::from(i), 0.0])).unwrap();
            if i < 2 {
                manager.add_component(slot, Velocity([1.0, 2.0])).unwrap();
            } else {
                manager.add_tag::<Frozen>(slot).unwrap();
            }
        }
        manager.refresh();
        manager
    }

    #[test]
    fn test_update_system_visits_matches() {
        let mut manager = world();
        let visited = manager.update_system::<Mover>(&mut 0.5);

        assert_eq!(visited, 2);
        assert_eq!(manager.system::<Mover>().visits, 2);
        assert_eq!(
            manager.get_component::<Position>(1usize).unwrap(),
            &Position([1.5, 1.0])
        );
        assert_eq!(
            manager.get_component::<Position>(2usize).unwrap(),
            &Position([2.0, 0.0])
        );
    }

    #[test]
    fn test_system_state_persists() {
        let mut manager = world();
        manager.update_system::<Mover>(&mut 1.0);
        manager.update_system::<Mover>(&mut 1.0);
        assert_eq!(manager.system::<Mover>().visits, 4);

        manager.system_mut::<Mover>().visits = 0;
        assert_eq!(manager.system::<Mover>().visits, 0);
    }

    #[test]
    fn test_args_are_forwarded() {
        let mut manager = world();
        let mut seen = Vec::new();
        assert_eq!(manager.update_system::<Counter>(&mut seen), 2);
        assert_eq!(seen, vec![2, 3]);
    }

    #[test]
    fn test_matches_system() {
        let manager = world();
        assert!(manager.matches_system::<Mover>(0usize));
        assert!(!manager.matches_system::<Counter>(0usize));
        assert!(manager.matches_system::<Counter>(3usize));
    }

    #[test]
    fn test_system_signatures_in_info() {
        let info = World::info();
        assert_eq!(info.system_count(), 2);
        assert_eq!(info.system_signature(0), Some(0));
        assert_eq!(info.system_signature(1), Some(1));
        assert_eq!(info.format_bits(info.signature_mask(1)), "101");
    }

    #[test]
    fn test_clone_resets_systems() {
        let mut manager = world();
        manager.update_system::<Mover>(&mut 1.0);
        let copy = manager.clone();
        assert_eq!(copy.system::<Mover>().visits, 0);
        assert_eq!(
            copy.get_component::<Position>(0usize).unwrap(),
            manager.get_component::<Position>(0usize).unwrap()
        );
    }
}
