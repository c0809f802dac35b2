//! Macros for port error enums.
//!
//! `define_port_error!` derives `thiserror::Error` and adds one snake_case
//! constructor per variant. Struct-variant fields accept `impl Into<T>` so
//! adapters can pass `&str` where a `String` is stored.
//!
//! `define_store_error!` is the fixed shape shared by the room, booking and
//! settings stores: an unreachable store becomes `service_unavailable`, a
//! failed statement becomes `internal_error`.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            #[doc = concat!("Construct [`Self::", stringify!($variant), "`].")]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        ::paste::paste! {
            #[doc = concat!("Construct [`Self::", stringify!($variant), "`].")]
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                Self::$variant { $($field: $field.into()),* }
            }
        }
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

macro_rules! define_store_error {
    ($(#[$outer:meta])* pub enum $name:ident => $store:literal) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            /// The store could not be reached.
            #[error("{} connection failed: {message}", $store)]
            Connection { message: String },
            /// A statement failed while executing.
            #[error("{} query failed: {message}", $store)]
            Query { message: String },
        }

        impl $name {
            $crate::domain::ports::define_port_error!(@ctor Connection { message: String });
            $crate::domain::ports::define_port_error!(@ctor Query { message: String });
        }

        impl From<$name> for $crate::domain::Error {
            fn from(error: $name) -> Self {
                match error {
                    $name::Connection { message } => {
                        Self::service_unavailable(format!("{} unavailable: {message}", $store))
                    }
                    $name::Query { message } => {
                        Self::internal(format!("{} error: {message}", $store))
                    }
                }
            }
        }
    };
}

pub(crate) use define_port_error;
pub(crate) use define_store_error;
