//! Miscellaneous stuff (especially macros) which is used across the crate and needed a home

/// Generates builder-style setters: `name(args) => field = value` becomes a `pub fn name(mut self, args) -> Self`.
macro_rules! setters {
    ( $(
        $( #[$attr:meta] )*
        $name:ident $( ( $($pname:ident: $ptype:ty),* $(,)? ) )?  => $field:ident = $value:expr
    ),* $(,)? ) => {
        $(
            $( #[$attr] )*
            pub fn $name(mut self $( , $( $pname: $ptype ),* )?) -> Self {
                self.$field = $value;
                self
            }
        )*
    };
}

pub(crate) use setters;
