// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registered conversion functions.
//!
//! [`Marshalers`] (encode) and [`Unmarshalers`] (decode) are immutable tables
//! built once before the first conversion and shared by reference count.
//! Each table holds:
//!
//! - functions keyed by concrete type, matched first;
//! - functions keyed by a [`Capability`], tested in registration order.
//!
//! ```ignore
//! use rowmap::dispatch::{marshal_func, Marshalers};
//!
//! let upper = marshal_func(|s: &String| Ok::<_, rowmap::BoxError>(s.to_uppercase().into()));
//! let ms = Marshalers::merge([upper, other]);
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, Strategy};
use crate::value::Value;

/// A set of types sharing a trait, usable as a registration key.
///
/// [`Capability::Target`] is the trait object type handed to the registered
/// function; [`Capability::cast`] decides whether a value satisfies it.
/// Use [`capability!`](crate::capability) to declare one.
pub trait Capability: 'static {
    type Target: ?Sized + 'static;

    fn cast(value: &dyn Any) -> Option<&Self::Target>;

    fn cast_mut(value: &mut dyn Any) -> Option<&mut Self::Target>;

    fn name() -> &'static str {
        std::any::type_name::<Self::Target>()
    }
}

/// Declare a [`Capability`] from a trait object type and its implementors.
///
/// ```ignore
/// trait Shouty { fn shout(&self) -> String; }
///
/// rowmap::capability!(pub ShoutyCap => dyn Shouty: [Name, Title]);
/// ```
#[macro_export]
macro_rules! capability {
    ($(#[$meta:meta])* $vis:vis $name:ident => $target:ty : [$($ty:ty),* $(,)?]) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        $vis struct $name;

        impl $crate::dispatch::Capability for $name {
            type Target = $target;

            fn cast(
                value: &dyn ::core::any::Any,
            ) -> ::core::option::Option<&Self::Target> {
                $(
                    if let ::core::option::Option::Some(v) = value.downcast_ref::<$ty>() {
                        return ::core::option::Option::Some(v as &$target);
                    }
                )*
                ::core::option::Option::None
            }

            fn cast_mut(
                value: &mut dyn ::core::any::Any,
            ) -> ::core::option::Option<&mut Self::Target> {
                $(
                    if value.is::<$ty>() {
                        return value.downcast_mut::<$ty>().map(|v| v as &mut $target);
                    }
                )*
                ::core::option::Option::None
            }
        }
    };
}

type EncodeFn = Arc<dyn Fn(&dyn Any) -> Option<Result<Vec<u8>, BoxError>> + Send + Sync>;
type DecodeFn = Arc<dyn Fn(&[u8], &mut dyn Any) -> Option<Result<(), BoxError>> + Send + Sync>;

/// Concrete-type entries plus ordered capability entries.
struct Table<F> {
    types: HashMap<TypeId, (&'static str, F)>,
    capabilities: Vec<(TypeId, &'static str, F)>,
}

impl<F> Default for Table<F> {
    fn default() -> Self {
        Self {
            types: HashMap::new(),
            capabilities: Vec::new(),
        }
    }
}

impl<F: Clone> Table<F> {
    /// Earlier tables win for equal keys.
    fn merge<'a>(tables: impl IntoIterator<Item = &'a Table<F>>) -> Self
    where
        F: 'a,
    {
        let mut out = Table::default();
        for table in tables {
            for (id, entry) in &table.types {
                out.types.entry(*id).or_insert_with(|| entry.clone());
            }
            for (id, name, f) in &table.capabilities {
                if out.capabilities.iter().all(|(existing, _, _)| existing != id) {
                    out.capabilities.push((*id, *name, f.clone()));
                }
            }
        }
        out
    }

    fn len(&self) -> usize {
        self.types.len() + self.capabilities.len()
    }

    fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.types.values().map(|(name, _)| *name).collect();
        names.sort_unstable();
        names.extend(self.capabilities.iter().map(|(_, name, _)| *name));
        names
    }
}

fn assert_constrained<C: Capability>() {
    let target = TypeId::of::<C::Target>();
    assert!(
        target != TypeId::of::<dyn Any>()
            && target != TypeId::of::<dyn Any + Send>()
            && target != TypeId::of::<dyn Any + Send + Sync>(),
        "cannot register a conversion for the unconstrained capability {}",
        C::name()
    );
}

// ============================================================================
// Encode side
// ============================================================================

/// Immutable table of encode functions.
#[derive(Clone, Default)]
pub struct Marshalers {
    table: Arc<Table<EncodeFn>>,
}

impl Marshalers {
    /// Merge tables into one. For equal keys the entry listed first wins.
    pub fn merge(list: impl IntoIterator<Item = Marshalers>) -> Self {
        let list: Vec<Marshalers> = list.into_iter().collect();
        Self {
            table: Arc::new(Table::merge(list.iter().map(|m| m.table.as_ref()))),
        }
    }

    /// `self` merged with `other`; `self` wins on conflicts.
    #[must_use]
    pub fn with(self, other: Marshalers) -> Self {
        Self::merge([self, other])
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the first matching entry: exact type, then capabilities in order.
    pub(crate) fn marshal(&self, value: &dyn Value) -> Option<(Strategy, Result<Vec<u8>, BoxError>)> {
        let any = value.as_any();
        if let Some((_, f)) = self.table.types.get(&Any::type_id(any)) {
            if let Some(result) = f(any) {
                return Some((Strategy::Function, result));
            }
        }
        self.table
            .capabilities
            .iter()
            .find_map(|(_, _, f)| f(any))
            .map(|result| (Strategy::Capability, result))
    }
}

impl fmt::Debug for Marshalers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Marshalers")
            .field("entries", &self.table.names())
            .finish()
    }
}

/// Register an encode function for the concrete type `T`.
pub fn marshal_func<T, F, E>(f: F) -> Marshalers
where
    T: Any,
    F: Fn(&T) -> Result<Vec<u8>, E> + Send + Sync + 'static,
    E: Into<BoxError>,
{
    let call: EncodeFn = Arc::new(move |any: &dyn Any| {
        any.downcast_ref::<T>().map(|v| f(v).map_err(Into::<BoxError>::into))
    });
    let mut table = Table::default();
    table
        .types
        .insert(TypeId::of::<T>(), (std::any::type_name::<T>(), call));
    Marshalers {
        table: Arc::new(table),
    }
}

/// Register an encode function for every value satisfying capability `C`.
///
/// # Panics
///
/// Panics when `C::Target` is `dyn Any`: every type would match.
pub fn marshal_capability<C, F, E>(f: F) -> Marshalers
where
    C: Capability,
    F: Fn(&C::Target) -> Result<Vec<u8>, E> + Send + Sync + 'static,
    E: Into<BoxError>,
{
    assert_constrained::<C>();
    let call: EncodeFn =
        Arc::new(move |any: &dyn Any| C::cast(any).map(|v| f(v).map_err(Into::<BoxError>::into)));
    let mut table = Table::default();
    table.capabilities.push((TypeId::of::<C>(), C::name(), call));
    Marshalers {
        table: Arc::new(table),
    }
}

// ============================================================================
// Decode side
// ============================================================================

/// Immutable table of decode functions.
#[derive(Clone, Default)]
pub struct Unmarshalers {
    table: Arc<Table<DecodeFn>>,
}

impl Unmarshalers {
    /// Merge tables into one. For equal keys the entry listed first wins.
    pub fn merge(list: impl IntoIterator<Item = Unmarshalers>) -> Self {
        let list: Vec<Unmarshalers> = list.into_iter().collect();
        Self {
            table: Arc::new(Table::merge(list.iter().map(|u| u.table.as_ref()))),
        }
    }

    /// `self` merged with `other`; `self` wins on conflicts.
    #[must_use]
    pub fn with(self, other: Unmarshalers) -> Self {
        Self::merge([self, other])
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the first matching entry: exact type, then capabilities in order.
    pub(crate) fn unmarshal(&self, data: &[u8], value: &mut dyn Value) -> Option<Result<(), BoxError>> {
        let any = value.as_any_mut();
        let id = Any::type_id(&*any);
        if let Some((_, f)) = self.table.types.get(&id) {
            if let Some(result) = f(data, &mut *any) {
                return Some(result);
            }
        }
        for (_, _, f) in &self.table.capabilities {
            if let Some(result) = f(data, &mut *any) {
                return Some(result);
            }
        }
        None
    }
}

impl fmt::Debug for Unmarshalers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unmarshalers")
            .field("entries", &self.table.names())
            .finish()
    }
}

/// Register a decode function for the concrete type `T`.
pub fn unmarshal_func<T, F, E>(f: F) -> Unmarshalers
where
    T: Any,
    F: Fn(&[u8], &mut T) -> Result<(), E> + Send + Sync + 'static,
    E: Into<BoxError>,
{
    let call: DecodeFn = Arc::new(move |data: &[u8], any: &mut dyn Any| {
        any.downcast_mut::<T>().map(|v| f(data, v).map_err(Into::<BoxError>::into))
    });
    let mut table = Table::default();
    table
        .types
        .insert(TypeId::of::<T>(), (std::any::type_name::<T>(), call));
    Unmarshalers {
        table: Arc::new(table),
    }
}

/// Register a decode function for every value satisfying capability `C`.
///
/// # Panics
///
/// Panics when `C::Target` is `dyn Any`: every type would match.
pub fn unmarshal_capability<C, F, E>(f: F) -> Unmarshalers
where
    C: Capability,
    F: Fn(&[u8], &mut C::Target) -> Result<(), E> + Send + Sync + 'static,
    E: Into<BoxError>,
{
    assert_constrained::<C>();
    let call: DecodeFn = Arc::new(move |data: &[u8], any: &mut dyn Any| {
        C::cast_mut(any).map(|v| f(data, v).map_err(Into::<BoxError>::into))
    });
    let mut table = Table::default();
    table.capabilities.push((TypeId::of::<C>(), C::name(), call));
    Unmarshalers {
        table: Arc::new(table),
    }
}
