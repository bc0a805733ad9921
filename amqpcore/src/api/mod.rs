//! Application facing API of the engine.

// setters of argument structs, chained and ended with `finish()`
macro_rules! impl_chainable_setter {
    ($($field:ident: $typ:ty),+) => {
        $(
            pub fn $field(&mut self, $field: $typ) -> &mut Self {
                self.$field = $field;
                self
            }
        )+

        pub fn finish(&mut self) -> Self {
            self.clone()
        }
    };
}

pub mod callbacks;
pub mod channel;
pub mod connection;
pub mod deferred;
pub mod error;
pub mod message;
pub mod security;
