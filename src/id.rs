//! String-backed identifiers for end uses, sectors, technologies and submodels.
//!
//! IDs are cheap to clone, so the same end use or technology can key many maps at once. Input
//! tables refer to IDs by name and are checked against the collections read earlier.
use anyhow::{Context, Result};
use indexmap::{IndexMap, IndexSet};
use std::borrow::Borrow;
use std::fmt::Display;
use std::hash::Hash;

/// Anything usable as an ID: hashable, printable and looked up by its name
pub trait IDLike: Eq + Hash + Borrow<str> + Clone + Display + From<String> {}
impl<T> IDLike for T where T: Eq + Hash + Borrow<str> + Clone + Display + From<String> {}

/// Define one or more ID newtypes wrapping a shared string
macro_rules! define_id_type {
    ($($name:ident),+ $(,)?) => {$(
        /// The name of an entity in the model
        #[derive(
            Clone,
            std::hash::Hash,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            serde::Deserialize,
            serde::Serialize,
            Debug,
        )]
        pub struct $name(pub std::rc::Rc<str>);

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self(name.into())
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self(name.into())
            }
        }
    )+};
}
pub(crate) use define_id_type;

define_id_type!(EnduseID, SectorID, TechnologyID, SubmodelID);

/// Indicates that the struct has an ID field
pub trait HasID<ID: IDLike> {
    /// Get the struct's ID
    fn get_id(&self) -> &ID;
}

/// Implement the `HasID` trait for the given type, assuming it has a field called `id`
macro_rules! define_id_getter {
    ($t:ty, $id_ty:ty) => {
        impl crate::id::HasID<$id_ty> for $t {
            fn get_id(&self) -> &$id_ty {
                &self.id
            }
        }
    };
}
pub(crate) use define_id_getter;

/// A collection of known IDs which names read from input files are checked against
pub trait IDCollection<ID: IDLike> {
    /// Look up an ID by name, returning a copy of the stored ID or an error if it is unknown
    fn get_id_by_str(&self, id: &str) -> Result<ID>;
}

/// Copy a found ID, or report the name as unknown
fn found_or_unknown<ID: IDLike>(found: Option<&ID>, name: &str) -> Result<ID> {
    found
        .cloned()
        .with_context(|| format!("Unknown ID {name} found"))
}

impl<ID: IDLike> IDCollection<ID> for IndexSet<ID> {
    fn get_id_by_str(&self, id: &str) -> Result<ID> {
        found_or_unknown(self.get(id), id)
    }
}

impl<ID: IDLike, V> IDCollection<ID> for IndexMap<ID, V> {
    fn get_id_by_str(&self, id: &str) -> Result<ID> {
        found_or_unknown(self.get_key_value(id).map(|(key, _)| key), id)
    }
}
