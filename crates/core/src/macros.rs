// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Boilerplate-reduction macros shared across the workspace.

/// Generate a `Display` impl from a match over unit-ish enum variants.
///
/// ```ignore
/// simple_display! {
///     JobStatus {
///         Pending => "pending",
///         Running => "running",
///     }
/// }
/// ```
#[macro_export]
macro_rules! simple_display {
    ($ty:ident { $($variant:pat => $text:expr),+ $(,)? }) => {
        impl ::std::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                let s = match self {
                    $($variant => $text),+
                };
                write!(f, "{s}")
            }
        }
    };
}

/// Generate a test-only builder struct with fluent setters around a plain struct literal.
///
/// `into` fields accept `impl Into<T>`; `set` fields are assigned as-is; `option` fields
/// wrap the value in `Some(...)` automatically.
#[macro_export]
macro_rules! builder {
    (
        pub struct $builder:ident => $target:ident {
            into { $($into_field:ident : $into_ty:ty = $into_default:expr),* $(,)? }
            set { $($set_field:ident : $set_ty:ty = $set_default:expr),* $(,)? }
            option { $($opt_field:ident : $opt_ty:ty = $opt_default:expr),* $(,)? }
        }
    ) => {
        #[derive(Clone)]
        pub struct $builder {
            $($into_field: $into_ty,)*
            $($set_field: $set_ty,)*
            $($opt_field: Option<$opt_ty>,)*
        }

        impl Default for $builder {
            fn default() -> Self {
                Self {
                    $($into_field: $into_default.into(),)*
                    $($set_field: $set_default,)*
                    $($opt_field: $opt_default,)*
                }
            }
        }

        impl $builder {
            pub fn new() -> Self {
                Self::default()
            }

            $(
                pub fn $into_field(mut self, value: impl Into<$into_ty>) -> Self {
                    self.$into_field = value.into();
                    self
                }
            )*

            $(
                pub fn $set_field(mut self, value: $set_ty) -> Self {
                    self.$set_field = value;
                    self
                }
            )*

            $(
                pub fn $opt_field(mut self, value: impl Into<$opt_ty>) -> Self {
                    self.$opt_field = Some(value.into());
                    self
                }
            )*

            pub fn build(self) -> $target {
                $target {
                    $($into_field: self.$into_field,)*
                    $($set_field: self.$set_field,)*
                    $($opt_field: self.$opt_field,)*
                }
            }
        }
    };
}

/// Generate fluent `with_*` setters on an existing struct (non-builder, in-place style).
#[macro_export]
macro_rules! setters {
    ($ty:ident { $($field:ident : $fty:ty),+ $(,)? }) => {
        impl $ty {
            $(
                pub fn $field(mut self, value: impl Into<$fty>) -> Self {
                    self.$field = value.into();
                    self
                }
            )+
        }
    };
}
