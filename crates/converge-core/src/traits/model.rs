// # Resource Models
//
// A model is the resolved, immutable view of a resource at one point in time.
// Up to two exist per identity in a run: the observed (INITIAL) model and the
// declared (DESIRED) model. Models are stored type-erased in the
// `CoinStore`; the resource kind that produced one casts it back with
// [`model_as`].

use crate::diagnostics::Location;
use crate::error::{Error, Result};
use std::any::Any;
use std::fmt::Debug;

/// Anything that can point back to its declaration
pub trait Describable {
    /// Where this was declared
    fn loc(&self) -> &Location;

    /// One-line description for logs, e.g. `dreamhost.CNAME[blog.example.com]`
    fn short_description(&self) -> String;
}

/// Snapshot of a resource's attributes
pub trait Model: Describable + Debug + Send + Sync + 'static {
    /// Access to the concrete type
    fn as_any(&self) -> &dyn Any;
}

/// Cast a stored model back to its concrete type
///
/// A mismatch means some other resource kind bound this identity, which is
/// an [`Error::Invariant`], never a user error.
pub fn model_as<T: Model>(model: &dyn Model) -> Result<&T> {
    model.as_any().downcast_ref::<T>().ok_or_else(|| {
        Error::invariant(format!(
            "{} is not a {}",
            model.short_description(),
            std::any::type_name::<T>()
        ))
    })
}
