//! Entity types stored by docapi, one per collection.
//!
//! Every entity carries an optional `_id` document identity that the store
//! fills in on creation. Optional fields are skipped when absent, so a full
//! replace with a field unset clears it from the stored document.

mod doujin;
mod log;
mod setting;
mod stats;
mod user;

pub use doujin::{Doujin, Source};
pub use log::{Log, LogLevel};
pub use setting::Setting;
pub use stats::Stats;
pub use user::User;

/// Implements `store::Document` for a struct with an `id: Option<String>`
/// field.
macro_rules! impl_document {
    ($($entity:ty),+ $(,)?) => {
        $(
            impl store::Document for $entity {
                fn id(&self) -> Option<&str> {
                    self.id.as_deref()
                }

                fn set_id(&mut self, id: String) {
                    self.id = Some(id);
                }
            }
        )+
    };
}

impl_document!(User, Log, Setting, Stats, Doujin);
