//! Opaque ID newtypes for all model entities.
//!
//! Each ID is a thin `u32` wrapper that is `Copy`, `Hash`, and
//! `Serialize`/`Deserialize`. IDs are created by [`Pool::push`](crate::pool::Pool::push)
//! and used for O(1) lookup.

use crate::pool::PoolId;
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl PoolId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a signal in the design.
    SignalId
);

define_id!(
    /// Opaque, copyable ID for an enumerated type in the design.
    EnumTypeId
);

define_id!(
    /// Opaque, copyable ID for a memory or ROM in the design.
    MemoryId
);

define_id!(
    /// Opaque, copyable ID for a callable (function/procedure) descriptor.
    CallableId
);

define_id!(
    /// Opaque, copyable ID for an expression node in a process's pool.
    ExprId
);
