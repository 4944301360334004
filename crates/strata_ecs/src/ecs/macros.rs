//! # Schema Declaration
//!
//! The [`schema!`](crate::schema) macro resolves a universe of kinds at
//! compile time. Everything a manager needs to know about its kinds
//! (ids, bit positions, signature masks, column layout) is derived here;
//! nothing is registered at runtime.

/// Declares a schema: the storage struct of a manager plus the ids of every
/// kind it knows.
///
/// ```rust,ignore
/// #[derive(Clone, Default)]
/// pub struct Position(pub [f32; 3]);
/// #[derive(Clone, Default)]
/// pub struct Velocity(pub [f32; 3]);
/// pub struct Frozen;
///
/// #[derive(Default)]
/// pub struct Mover;
///
/// strata_ecs::schema! {
///     /// Game entities.
///     pub struct Game {
///         components { position: Position, velocity: Velocity }
///         tags { Frozen }
///         signatures {
///             Moving = [Position, Velocity] + [];
///             Parked = [Position] + [Frozen];
///         }
///         systems { mover: Mover }
///     }
/// }
/// ```
///
/// - Components are numbered in declaration order; the field name is the
///   name of the column.
/// - Tags are numbered in declaration order; their bits follow the
///   component bits.
/// - Each signature becomes a unit struct implementing `SignatureOf`. Its
///   component list must follow schema order.
/// - Each system type must implement `System<Schema>`; the field holds the
///   manager's instance.
///
/// All four blocks are required; write `tags {}` for an empty list.
#[macro_export]
macro_rules! schema {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            components { $($cfield:ident : $cty:ty),* $(,)? }
            tags { $($tag:ty),* $(,)? }
            signatures { $($sig:ident = [$($sc:ty),* $(,)?] + [$($st:ty),* $(,)?];)* }
            systems { $($xfield:ident : $xty:ty),* $(,)? }
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                #[doc = concat!("Column of `", stringify!($cty), "` payloads.")]
                $cfield: ::std::vec::Vec<$cty>,
            )*
            $(
                #[doc = concat!("Instance of `", stringify!($xty), "`.")]
                $xfield: $xty,
            )*
        }

        $(
            #[doc = concat!("Signature `", stringify!($sig), "` of [`", stringify!($name), "`].")]
            #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
            $vis struct $sig;
        )*

        impl $crate::Schema for $name {
            type Bits = $crate::Bitset<{
                $crate::words_for(
                    0usize $(+ $crate::__schema_one!($cty))* $(+ $crate::__schema_one!($tag))*
                )
            }>;

            const COMPONENT_COUNT: usize = 0usize $(+ $crate::__schema_one!($cty))*;
            const TAG_COUNT: usize = 0usize $(+ $crate::__schema_one!($tag))*;
            const SIGNATURE_COUNT: usize = 0usize $(+ $crate::__schema_one!($sig))*;
            const SYSTEM_COUNT: usize = 0usize $(+ $crate::__schema_one!($xty))*;

            fn info() -> &'static $crate::SchemaInfo<Self::Bits> {
                static INFO: ::std::sync::OnceLock<
                    $crate::SchemaInfo<<$name as $crate::Schema>::Bits>,
                > = ::std::sync::OnceLock::new();
                INFO.get_or_init(|| {
                    $crate::SchemaInfo::new(
                        ::std::vec![$(stringify!($cty)),*],
                        ::std::vec![$(stringify!($tag)),*],
                        ::std::vec![$((stringify!($sig), $crate::signature_mask::<$name, $sig>())),*],
                        ::std::vec![$((
                            stringify!($xty),
                            <<$xty as $crate::System<$name>>::Signature as $crate::SignatureOf<$name>>::INDEX,
                        )),*],
                    )
                })
            }

            fn new_storage() -> Self {
                Self {
                    $($cfield: ::std::vec::Vec::new(),)*
                    $($xfield: ::std::default::Default::default(),)*
                }
            }

            #[allow(unused_variables)]
            fn reserve_columns(
                &mut self,
                capacity: usize,
            ) -> ::std::result::Result<(), ::std::collections::TryReserveError> {
                $($crate::reserve_column(&mut self.$cfield, capacity)?;)*
                ::std::result::Result::Ok(())
            }

            #[allow(unused_variables)]
            fn resize_columns(&mut self, capacity: usize) {
                $(self.$cfield.resize_with(capacity, ::std::default::Default::default);)*
            }

            fn clone_columns(&self) -> Self {
                Self {
                    $($cfield: ::std::clone::Clone::clone(&self.$cfield),)*
                    $($xfield: ::std::default::Default::default(),)*
                }
            }

            #[allow(unused_variables)]
            fn visit_components(
                &self,
                data_index: usize,
                signature: &Self::Bits,
                f: &mut dyn FnMut($crate::ComponentInfo, &dyn ::std::any::Any),
            ) {
                $(
                    let index = <$cty as $crate::ComponentOf<$name>>::INDEX;
                    if $crate::Bits::read(signature, index) {
                        f(
                            $crate::ComponentInfo::of::<$cty>(index, stringify!($cty)),
                            &self.$cfield[data_index],
                        );
                    }
                )*
            }

            #[allow(unused_variables)]
            fn visit_components_mut(
                &mut self,
                data_index: usize,
                signature: &Self::Bits,
                f: &mut dyn FnMut($crate::ComponentInfo, &mut dyn ::std::any::Any),
            ) {
                $(
                    let index = <$cty as $crate::ComponentOf<$name>>::INDEX;
                    if $crate::Bits::read(signature, index) {
                        f(
                            $crate::ComponentInfo::of::<$cty>(index, stringify!($cty)),
                            &mut self.$cfield[data_index],
                        );
                    }
                )*
            }
        }

        $crate::__schema_components!($name; 0usize; $($cfield : $cty),*);
        $crate::__schema_tags!($name; 0usize; $($tag),*);
        $crate::__schema_signatures!($name; 0usize; $($sig [$($sc),*] [$($st),*]);*);
        $crate::__schema_systems!($name; 0usize; $($xfield : $xty),*);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __schema_one {
    ($($any:tt)*) => {
        1usize
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __schema_components {
    ($schema:ident; $index:expr;) => {};
    ($schema:ident; $index:expr; $field:ident : $ty:ty $(, $rfield:ident : $rty:ty)*) => {
        impl $crate::ComponentOf<$schema> for $ty {
            const INDEX: usize = $index;

            #[inline]
            fn column(storage: &$schema) -> &[Self] {
                &storage.$field
            }

            #[inline]
            fn column_mut(storage: &mut $schema) -> &mut ::std::vec::Vec<Self> {
                &mut storage.$field
            }
        }

        $crate::__schema_components!($schema; $index + 1usize; $($rfield : $rty),*);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __schema_tags {
    ($schema:ident; $index:expr;) => {};
    ($schema:ident; $index:expr; $tag:ty $(, $rest:ty)*) => {
        impl $crate::TagOf<$schema> for $tag {
            const INDEX: usize = $index;
        }

        $crate::__schema_tags!($schema; $index + 1usize; $($rest),*);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __schema_signatures {
    ($schema:ident; $index:expr;) => {};
    (
        $schema:ident; $index:expr;
        $sig:ident [$($c:ty),*] [$($t:ty),*]
        $(; $rsig:ident [$($rc:ty),*] [$($rt:ty),*])*
    ) => {
        impl $crate::SignatureOf<$schema> for $sig {
            const INDEX: usize = $index;
            type Components = ($($c,)*);
            type Tags = ($($t,)*);
        }

        $crate::__schema_ordered!($schema; $($c),*);
        $crate::__schema_signatures!($schema; $index + 1usize; $($rsig [$($rc),*] [$($rt),*]);*);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __schema_ordered {
    ($schema:ident;) => {};
    ($schema:ident; $last:ty) => {};
    ($schema:ident; $first:ty, $second:ty $(, $rest:ty)*) => {
        const _: () = ::core::assert!(
            <$first as $crate::ComponentOf<$schema>>::INDEX
                < <$second as $crate::ComponentOf<$schema>>::INDEX,
            "signature components must follow schema order without repeats"
        );

        $crate::__schema_ordered!($schema; $second $(, $rest)*);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __schema_systems {
    ($schema:ident; $index:expr;) => {};
    ($schema:ident; $index:expr; $field:ident : $ty:ty $(, $rfield:ident : $rty:ty)*) => {
        impl $crate::SystemOf<$schema> for $ty {
            const INDEX: usize = $index;

            #[inline]
            fn instance(storage: &$schema) -> &Self {
                &storage.$field
            }

            #[inline]
            fn instance_mut(storage: &mut $schema) -> &mut Self {
                &mut storage.$field
            }
        }

        $crate::__schema_systems!($schema; $index + 1usize; $($rfield : $rty),*);
    };
}
