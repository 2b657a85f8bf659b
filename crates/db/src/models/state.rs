//! State helper enums mapping to SMALLSERIAL/SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_states` database table, and therefore also the
//! constants in `ridepool_core::lifecycle`.

use ridepool_core::types::StateId;

macro_rules! define_state_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database state ID.
            pub fn id(self) -> StateId {
                self as StateId
            }
        }

        impl From<$name> for StateId {
            fn from(value: $name) -> Self {
                value as StateId
            }
        }
    };
}

define_state_enum! {
    /// Track lifecycle state.
    TrackState {
        WaitingPassenger = 1,
        WaitingDeparture = 2,
        Active = 3,
        Finished = 4,
    }
}

define_state_enum! {
    /// Participant (user) lifecycle state.
    UserState {
        Free = 1,
        OnTrackWaiting = 2,
        OnTrack = 3,
    }
}
